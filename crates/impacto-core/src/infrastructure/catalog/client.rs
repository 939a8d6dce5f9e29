//! HTTP client for the secondary catalog service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SecondaryConfig;
use crate::error::{Error, Result};

use super::fallback::{fallback_components, fallback_features};
use super::{CatalogComponent, CatalogFeature, ComponentCatalog};

/// Catalog client that falls back to the built-in table on any failure
#[derive(Debug, Clone)]
pub struct HttpComponentCatalog {
    http_client: HttpClient,
    base_url: String,
}

impl HttpComponentCatalog {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(Error::Network)?;
        let base_url: String = base_url.into();

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SecondaryConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Querying catalog service");
        let body = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(body)
    }

    async fn fetch_or<T, F>(&self, path: &str, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.fetch(path).await {
            Ok(body) => body,
            Err(e) => {
                warn!(path, error = %e, "Catalog service unavailable; using built-in catalog");
                fallback()
            }
        }
    }
}

#[async_trait]
impl ComponentCatalog for HttpComponentCatalog {
    async fn get_all_components(&self) -> Vec<CatalogComponent> {
        self.fetch_or("/api/components", fallback_components).await
    }

    async fn get_component_by_id(&self, id: &str) -> Option<CatalogComponent> {
        let path = format!("/api/components/{id}");
        self.fetch_or(&path, || {
            fallback_components().into_iter().find(|c| c.id == id)
        })
        .await
    }

    async fn get_all_component_names(&self) -> Vec<String> {
        self.fetch_or("/api/components/names", || {
            fallback_components().into_iter().map(|c| c.name).collect()
        })
        .await
    }

    async fn get_all_features(&self) -> Vec<CatalogFeature> {
        self.fetch_or("/api/features", fallback_features).await
    }

    async fn get_feature_by_id(&self, id: &str) -> Option<CatalogFeature> {
        let path = format!("/api/features/{id}");
        self.fetch_or(&path, || {
            fallback_features().into_iter().find(|f| f.id == id)
        })
        .await
    }

    async fn get_all_feature_names(&self) -> Vec<String> {
        self.fetch_or("/api/features/names", || {
            fallback_features().into_iter().map(|f| f.name).collect()
        })
        .await
    }
}
