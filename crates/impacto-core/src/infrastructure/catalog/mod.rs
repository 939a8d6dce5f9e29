//! Secondary component/feature catalog
//!
//! The catalog is best effort: implementations never surface transport
//! errors, they degrade to the built-in table instead.

mod client;
mod fallback;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::HttpComponentCatalog;
pub use fallback::{StaticCatalog, fallback_components, fallback_features};

/// Component record as served by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogComponent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub component_type: String,
}

/// Feature record as served by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFeature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: Vec<String>,
}

/// Read-only view of the secondary catalog
#[async_trait]
pub trait ComponentCatalog: Send + Sync {
    async fn get_all_components(&self) -> Vec<CatalogComponent>;

    async fn get_component_by_id(&self, id: &str) -> Option<CatalogComponent>;

    async fn get_all_component_names(&self) -> Vec<String>;

    async fn get_all_features(&self) -> Vec<CatalogFeature>;

    async fn get_feature_by_id(&self, id: &str) -> Option<CatalogFeature>;

    async fn get_all_feature_names(&self) -> Vec<String>;
}
