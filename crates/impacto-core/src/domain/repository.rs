//! Repository trait for the entity store
//!
//! The store is the local cache the resolver consults before going remote.
//! Saves are upserts by id (last writer wins); deletes cascade downwards
//! from domains to features to components.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{Component, Domain, Feature};

/// Keyed holder of domain, feature and component records
#[async_trait]
pub trait DomainRepository: Send + Sync {
    // ========== Domain Operations ==========

    /// List all domains
    async fn get_all_domains(&self) -> Result<Vec<Domain>>;

    /// Get a domain by ID
    async fn get_domain_by_id(&self, id: &str) -> Result<Option<Domain>>;

    /// Domains whose name contains `pattern`, ignoring case
    async fn get_domains_by_name_pattern(&self, pattern: &str) -> Result<Vec<Domain>>;

    /// Insert or replace a domain
    async fn save_domain(&self, domain: Domain) -> Result<Domain>;

    /// Delete a domain together with its features and their components
    async fn delete_domain(&self, id: &str) -> Result<bool>;

    // ========== Feature Operations ==========

    async fn get_all_features(&self) -> Result<Vec<Feature>>;

    async fn get_feature_by_id(&self, id: &str) -> Result<Option<Feature>>;

    async fn get_features_by_domain_id(&self, domain_id: &str) -> Result<Vec<Feature>>;

    async fn get_features_by_name_pattern(&self, pattern: &str) -> Result<Vec<Feature>>;

    async fn save_feature(&self, feature: Feature) -> Result<Feature>;

    /// Delete a feature together with its components
    async fn delete_feature(&self, id: &str) -> Result<bool>;

    // ========== Component Operations ==========

    async fn get_all_components(&self) -> Result<Vec<Component>>;

    async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>>;

    async fn get_components_by_feature_id(&self, feature_id: &str) -> Result<Vec<Component>>;

    async fn get_components_by_name_pattern(&self, pattern: &str) -> Result<Vec<Component>>;

    async fn save_component(&self, component: Component) -> Result<Component>;

    /// Delete a component; its code/test references are left dangling
    async fn delete_component(&self, id: &str) -> Result<bool>;

    // ========== Statistics ==========

    async fn get_stats(&self) -> Result<StoreStats>;
}

/// Entity counts held by a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub domain_count: usize,
    pub feature_count: usize,
    pub component_count: usize,
}

impl StoreStats {
    pub fn is_empty(&self) -> bool {
        self.domain_count == 0 && self.feature_count == 0 && self.component_count == 0
    }
}

/// Case-insensitive substring match used by name-pattern lookups
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}
