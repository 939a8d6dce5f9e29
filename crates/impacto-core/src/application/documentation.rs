//! Entities derived from remote documentation and the secondary catalog
//!
//! Nothing here touches the store. Every call goes back to the sources;
//! caching is the resolver's job.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    Component, DEFAULT_DOMAIN_ID, DEFAULT_FEATURE_ID, DocumentationExtractor, Domain, Feature,
    name_matches,
};
use crate::error::Result;
use crate::infrastructure::catalog::{CatalogComponent, ComponentCatalog};
use crate::infrastructure::dedup_by_id;
use crate::infrastructure::remote::{DocEntry, KnowledgeSource, Tool};

/// Remote-backed lookups of domains, features and components
#[derive(Clone)]
pub struct DocumentationService {
    source: Arc<dyn KnowledgeSource>,
    catalog: Arc<dyn ComponentCatalog>,
    extractor: DocumentationExtractor,
}

impl std::fmt::Debug for DocumentationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentationService").finish_non_exhaustive()
    }
}

/// Merge documentation-derived components with catalog components
///
/// Documentation wins. A catalog entry is appended only when its lowercased
/// id is not already present; catalog entries take `owner` as their feature.
pub fn merge_components(
    documented: Vec<Component>,
    catalog: Vec<CatalogComponent>,
    owner: &str,
) -> Vec<Component> {
    let mut merged = dedup_by_id(documented, |c| c.id.as_str());
    let mut seen: HashSet<String> = merged.iter().map(|c| c.id.clone()).collect();

    for entry in catalog {
        let id = entry.id.to_lowercase();
        if seen.insert(id.clone()) {
            merged.push(Component::new(id, entry.name, entry.description, owner));
        }
    }
    merged
}

fn digest(entries: &[DocEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("## {}\n\n{}", e.tool_name, e.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl DocumentationService {
    pub fn new(source: Arc<dyn KnowledgeSource>, catalog: Arc<dyn ComponentCatalog>) -> Self {
        Self {
            source,
            catalog,
            extractor: DocumentationExtractor::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn ComponentCatalog> {
        &self.catalog
    }

    /// Tools offered by the documentation source
    pub async fn tools(&self) -> Result<Vec<Tool>> {
        self.source.list_tools().await
    }

    /// All documentation for `term`, concatenated
    async fn documentation(&self, term: &str) -> Result<String> {
        let entries = self.source.search_documentation(term).await?;
        debug!(term, entries = entries.len(), "Fetched documentation");
        Ok(entries
            .into_iter()
            .map(|e| e.content)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    // ========== Domains ==========

    pub async fn domains(&self) -> Result<Vec<Domain>> {
        info!("Fetching all domains from documentation");
        let doc = self.documentation("domain").await?;
        Ok(self.extractor.extract_domains(&doc))
    }

    pub async fn domain_by_id(&self, id: &str) -> Result<Option<Domain>> {
        let doc = self.documentation(&format!("domain {id}")).await?;
        Ok(self
            .extractor
            .extract_domains(&doc)
            .into_iter()
            .find(|d| d.id == id))
    }

    pub async fn domains_by_name_pattern(&self, pattern: &str) -> Result<Vec<Domain>> {
        let doc = self.documentation(&format!("domain {pattern}")).await?;
        Ok(self
            .extractor
            .extract_domains(&doc)
            .into_iter()
            .filter(|d| name_matches(&d.name, pattern))
            .collect())
    }

    // ========== Features ==========

    /// Features owned by the first documented domain, else the default domain
    pub async fn features(&self) -> Result<Vec<Feature>> {
        info!("Fetching all features from documentation");
        let doc = self.documentation("feature").await?;
        let owner = self
            .domains()
            .await?
            .into_iter()
            .next()
            .map(|d| d.id)
            .unwrap_or_else(|| DEFAULT_DOMAIN_ID.to_string());
        Ok(self.extractor.extract_features(&doc, &owner))
    }

    pub async fn feature_by_id(&self, id: &str) -> Result<Option<Feature>> {
        let doc = self.documentation(&format!("feature {id}")).await?;
        Ok(self
            .extractor
            .extract_features(&doc, DEFAULT_DOMAIN_ID)
            .into_iter()
            .find(|f| f.id == id))
    }

    pub async fn features_by_domain_id(&self, domain_id: &str) -> Result<Vec<Feature>> {
        Ok(self
            .features()
            .await?
            .into_iter()
            .filter(|f| f.domain_id == domain_id)
            .collect())
    }

    pub async fn features_by_name_pattern(&self, pattern: &str) -> Result<Vec<Feature>> {
        let doc = self.documentation(&format!("feature {pattern}")).await?;
        Ok(self
            .extractor
            .extract_features(&doc, DEFAULT_DOMAIN_ID)
            .into_iter()
            .filter(|f| name_matches(&f.name, pattern))
            .collect())
    }

    // ========== Components ==========

    async fn component_owner(&self) -> Result<String> {
        Ok(self
            .features()
            .await?
            .into_iter()
            .next()
            .map(|f| f.id)
            .unwrap_or_else(|| DEFAULT_FEATURE_ID.to_string()))
    }

    /// Documented components merged with the catalog
    pub async fn components(&self) -> Result<Vec<Component>> {
        info!("Fetching all components from documentation and catalog");
        let doc = self.documentation("component").await?;
        let owner = self.component_owner().await?;
        let documented = self.extractor.extract_components(&doc, &owner);
        let catalog = self.catalog.get_all_components().await;

        let documented_count = documented.len();
        let catalog_count = catalog.len();
        let merged = merge_components(documented, catalog, &owner);
        debug!(
            documented = documented_count,
            catalog = catalog_count,
            merged = merged.len(),
            "Merged component sources"
        );
        Ok(merged)
    }

    /// Catalog first, then documentation
    pub async fn component_by_id(&self, id: &str) -> Result<Option<Component>> {
        if let Some(entry) = self.catalog.get_component_by_id(id).await {
            let owner = self.component_owner().await?;
            return Ok(Some(Component::new(
                entry.id.to_lowercase(),
                entry.name,
                entry.description,
                owner,
            )));
        }

        let doc = self.documentation(&format!("component {id}")).await?;
        Ok(self
            .extractor
            .extract_components(&doc, DEFAULT_FEATURE_ID)
            .into_iter()
            .find(|c| c.id == id))
    }

    pub async fn components_by_feature_id(&self, feature_id: &str) -> Result<Vec<Component>> {
        Ok(self
            .components()
            .await?
            .into_iter()
            .filter(|c| c.feature_id == feature_id)
            .collect())
    }

    pub async fn components_by_name_pattern(&self, pattern: &str) -> Result<Vec<Component>> {
        Ok(self
            .components()
            .await?
            .into_iter()
            .filter(|c| name_matches(&c.name, pattern))
            .collect())
    }

    // ========== Raw documentation ==========

    pub async fn search_domain_documentation(&self, name: &str) -> Result<String> {
        let entries = self.source.search_documentation(&format!("domain {name}")).await?;
        Ok(digest(&entries))
    }

    pub async fn search_feature_documentation(&self, name: &str) -> Result<String> {
        let entries = self.source.search_documentation(&format!("feature {name}")).await?;
        Ok(digest(&entries))
    }

    pub async fn search_component_documentation(&self, name: &str) -> Result<String> {
        let entries = self
            .source
            .search_documentation(&format!("component {name}"))
            .await?;
        Ok(digest(&entries))
    }

    /// Digest for an arbitrary term
    pub async fn search(&self, term: &str) -> Result<String> {
        let entries = self.source.search_documentation(term).await?;
        Ok(digest(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infrastructure::catalog::StaticCatalog;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers searches from a fixed term → documentation table
    struct ScriptedSource {
        answers: HashMap<String, String>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(answers: &[(&str, &str)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KnowledgeSource for ScriptedSource {
        async fn list_tools(&self) -> Result<Vec<Tool>> {
            Ok(vec![Tool {
                name: "docs".to_string(),
                description: String::new(),
                input_schema: None,
            }])
        }

        async fn search_documentation(&self, term: &str) -> Result<Vec<DocEntry>> {
            self.queries.lock().unwrap().push(term.to_string());
            Ok(self
                .answers
                .get(term)
                .map(|content| {
                    vec![DocEntry {
                        tool_name: "docs".to_string(),
                        content: content.clone(),
                    }]
                })
                .unwrap_or_default())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KnowledgeSource for FailingSource {
        async fn list_tools(&self) -> Result<Vec<Tool>> {
            Err(Error::RemoteTimeout(30_000))
        }

        async fn search_documentation(&self, _term: &str) -> Result<Vec<DocEntry>> {
            Err(Error::RemoteTimeout(30_000))
        }
    }

    fn service(source: ScriptedSource) -> DocumentationService {
        DocumentationService::new(Arc::new(source), Arc::new(StaticCatalog))
    }

    #[test]
    fn test_merge_prefers_documentation() {
        let documented = vec![Component::new("auth", "Auth from docs", "docs", "f")];
        let catalog = vec![
            CatalogComponent {
                id: "auth".into(),
                name: "Authentication".into(),
                description: "catalog".into(),
                component_type: "Security".into(),
            },
            CatalogComponent {
                id: "Search".into(),
                name: "Search".into(),
                description: String::new(),
                component_type: "Core".into(),
            },
        ];

        let merged = merge_components(documented, catalog, "owner");
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].description, "docs");
        assert_eq!(merged[1].id, "search");
        assert_eq!(merged[1].feature_id, "owner");
    }

    #[test]
    fn test_merge_normalizes_case() {
        let documented = vec![Component::new(
            crate::domain::slugify("Auth-Service"),
            "Auth-Service",
            "",
            "f",
        )];
        let catalog = vec![
            CatalogComponent {
                id: "AUTH-SERVICE".into(),
                name: "Auth".into(),
                description: String::new(),
                component_type: String::new(),
            },
            CatalogComponent {
                id: "Billing".into(),
                name: "Billing".into(),
                description: String::new(),
                component_type: String::new(),
            },
            CatalogComponent {
                id: "billing".into(),
                name: "Billing again".into(),
                description: String::new(),
                component_type: String::new(),
            },
        ];

        let merged = merge_components(documented, catalog, "f");
        let ids: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["auth-service", "billing"]);
    }

    #[tokio::test]
    async fn test_features_take_first_documented_domain() {
        let service = service(ScriptedSource::new(&[
            ("domain", "# Billing Domain\nMoney.\n# Identity Service\nUsers."),
            ("feature", "## Invoice Feature\nSends invoices."),
        ]));

        let features = service.features().await.unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "invoice-feature");
        assert_eq!(features[0].domain_id, "billing-domain");
    }

    #[tokio::test]
    async fn test_default_owners_when_nothing_is_documented() {
        let service = service(ScriptedSource::new(&[(
            "component",
            "## Ledger Component\nBooks entries.",
        )]));

        let features = service.features().await.unwrap();
        assert!(features.is_empty());

        let components = service.components().await.unwrap();
        assert_eq!(components.len(), 16);
        assert_eq!(components[0].id, "ledger-component");
        assert!(components.iter().all(|c| c.feature_id == DEFAULT_FEATURE_ID));
    }

    #[tokio::test]
    async fn test_component_by_id_asks_catalog_first() {
        let source = ScriptedSource::new(&[(
            "component billing-engine-component",
            "## Billing-Engine Component\nPosts charges.",
        )]);
        let service = service(source);

        let from_catalog = service.component_by_id("payment").await.unwrap().unwrap();
        assert_eq!(from_catalog.name, "Payment Processing");
        assert_eq!(from_catalog.feature_id, DEFAULT_FEATURE_ID);

        let from_docs = service
            .component_by_id("billing-engine-component")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from_docs.description, "Posts charges.");

        assert!(service.component_by_id("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_domain_lookups_use_targeted_terms() {
        let source = ScriptedSource::new(&[
            ("domain billing-domain", "# Billing Domain\nMoney."),
            ("domain bill", "# Billing Domain\nMoney.\n# Shipping Domain\nBoxes."),
        ]);
        let service = service(source);

        let found = service.domain_by_id("billing-domain").await.unwrap().unwrap();
        assert_eq!(found.description, "Money.");

        let matches = service.domains_by_name_pattern("bill").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Billing Domain");
    }

    #[tokio::test]
    async fn test_digest_format() {
        let service = service(ScriptedSource::new(&[("feature export", "Exports CSV.")]));
        let digest = service.search_feature_documentation("export").await.unwrap();
        assert_eq!(digest, "## docs\n\nExports CSV.");
        assert_eq!(service.search("unknown").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_source_failures_propagate() {
        let service = DocumentationService::new(Arc::new(FailingSource), Arc::new(StaticCatalog));
        assert!(matches!(
            service.domains().await.unwrap_err(),
            Error::RemoteTimeout(_)
        ));
        assert!(service.components().await.is_err());
    }
}
