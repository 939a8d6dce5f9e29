//! In-memory entity store
//!
//! Process-lifetime cache for the knowledge graph. All three maps sit behind
//! one lock so a cascading delete never exposes a feature whose domain is
//! already gone.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Component, Domain, DomainRepository, Feature, StoreStats, name_matches};
use crate::error::Result;

#[derive(Debug, Default)]
struct Tables {
    domains: BTreeMap<String, Domain>,
    features: BTreeMap<String, Feature>,
    components: BTreeMap<String, Component>,
}

impl Tables {
    fn remove_feature_cascade(&mut self, id: &str) -> bool {
        let removed = self.features.remove(id).is_some();
        let before = self.components.len();
        self.components.retain(|_, c| c.feature_id != id);
        let cascaded = before - self.components.len();
        if cascaded > 0 {
            debug!(feature_id = %id, components = cascaded, "Cascaded feature delete");
        }
        removed
    }
}

/// Thread-safe in-memory implementation of [`DomainRepository`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryDomainRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDomainRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn get_all_domains(&self) -> Result<Vec<Domain>> {
        Ok(self.tables.read().await.domains.values().cloned().collect())
    }

    async fn get_domain_by_id(&self, id: &str) -> Result<Option<Domain>> {
        Ok(self.tables.read().await.domains.get(id).cloned())
    }

    async fn get_domains_by_name_pattern(&self, pattern: &str) -> Result<Vec<Domain>> {
        Ok(self
            .tables
            .read()
            .await
            .domains
            .values()
            .filter(|d| name_matches(&d.name, pattern))
            .cloned()
            .collect())
    }

    async fn save_domain(&self, domain: Domain) -> Result<Domain> {
        self.tables
            .write()
            .await
            .domains
            .insert(domain.id.clone(), domain.clone());
        Ok(domain)
    }

    async fn delete_domain(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.domains.remove(id).is_some();

        let owned: Vec<String> = tables
            .features
            .values()
            .filter(|f| f.domain_id == id)
            .map(|f| f.id.clone())
            .collect();
        for feature_id in &owned {
            tables.remove_feature_cascade(feature_id);
        }

        debug!(domain_id = %id, removed, features = owned.len(), "Deleted domain");
        Ok(removed || !owned.is_empty())
    }

    async fn get_all_features(&self) -> Result<Vec<Feature>> {
        Ok(self.tables.read().await.features.values().cloned().collect())
    }

    async fn get_feature_by_id(&self, id: &str) -> Result<Option<Feature>> {
        Ok(self.tables.read().await.features.get(id).cloned())
    }

    async fn get_features_by_domain_id(&self, domain_id: &str) -> Result<Vec<Feature>> {
        Ok(self
            .tables
            .read()
            .await
            .features
            .values()
            .filter(|f| f.domain_id == domain_id)
            .cloned()
            .collect())
    }

    async fn get_features_by_name_pattern(&self, pattern: &str) -> Result<Vec<Feature>> {
        Ok(self
            .tables
            .read()
            .await
            .features
            .values()
            .filter(|f| name_matches(&f.name, pattern))
            .cloned()
            .collect())
    }

    async fn save_feature(&self, feature: Feature) -> Result<Feature> {
        self.tables
            .write()
            .await
            .features
            .insert(feature.id.clone(), feature.clone());
        Ok(feature)
    }

    async fn delete_feature(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.remove_feature_cascade(id);
        debug!(feature_id = %id, removed, "Deleted feature");
        Ok(removed)
    }

    async fn get_all_components(&self) -> Result<Vec<Component>> {
        Ok(self
            .tables
            .read()
            .await
            .components
            .values()
            .cloned()
            .collect())
    }

    async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>> {
        Ok(self.tables.read().await.components.get(id).cloned())
    }

    async fn get_components_by_feature_id(&self, feature_id: &str) -> Result<Vec<Component>> {
        Ok(self
            .tables
            .read()
            .await
            .components
            .values()
            .filter(|c| c.feature_id == feature_id)
            .cloned()
            .collect())
    }

    async fn get_components_by_name_pattern(&self, pattern: &str) -> Result<Vec<Component>> {
        Ok(self
            .tables
            .read()
            .await
            .components
            .values()
            .filter(|c| name_matches(&c.name, pattern))
            .cloned()
            .collect())
    }

    async fn save_component(&self, component: Component) -> Result<Component> {
        self.tables
            .write()
            .await
            .components
            .insert(component.id.clone(), component.clone());
        Ok(component)
    }

    async fn delete_component(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().await.components.remove(id).is_some();
        debug!(component_id = %id, removed, "Deleted component");
        Ok(removed)
    }

    async fn get_stats(&self) -> Result<StoreStats> {
        let tables = self.tables.read().await;
        Ok(StoreStats {
            domain_count: tables.domains.len(),
            feature_count: tables.features.len(),
            component_count: tables.components.len(),
        })
    }
}

/// Keep the first occurrence of every id, preserving order
pub(crate) fn dedup_by_id<T, F>(items: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(id_of(item).to_string()))
        .collect()
}
