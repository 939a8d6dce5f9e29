//! Impacto Core Integration Tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use impacto_core::{
    Error, Result,
    application::{DocumentationService, DomainResolver, MappingFile},
    domain::{CodeEntityKind, Component, Domain, DomainRepository, Feature, TestEntityKind},
    infrastructure::InMemoryDomainRepository,
    infrastructure::catalog::{CatalogComponent, CatalogFeature, ComponentCatalog, StaticCatalog},
    infrastructure::remote::{DocEntry, KnowledgeSource, Tool},
};

/// Documentation source answering from a fixed table and counting searches
#[derive(Default)]
struct CountingSource {
    answers: HashMap<String, String>,
    searches: AtomicUsize,
}

impl CountingSource {
    fn with(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(term, doc)| (term.to_string(), doc.to_string()))
                .collect(),
            searches: AtomicUsize::new(0),
        }
    }

    fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeSource for CountingSource {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(vec![Tool {
            name: "docs".to_string(),
            description: "Project documentation".to_string(),
            input_schema: None,
        }])
    }

    async fn search_documentation(&self, term: &str) -> Result<Vec<DocEntry>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
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

/// Source whose every call fails like a wedged tool
struct TimedOutSource;

#[async_trait]
impl KnowledgeSource for TimedOutSource {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        Err(Error::RemoteTimeout(30_000))
    }

    async fn search_documentation(&self, _term: &str) -> Result<Vec<DocEntry>> {
        Err(Error::RemoteTimeout(30_000))
    }
}

/// Catalog serving a fixed component list
struct FixedCatalog(Vec<CatalogComponent>);

#[async_trait]
impl ComponentCatalog for FixedCatalog {
    async fn get_all_components(&self) -> Vec<CatalogComponent> {
        self.0.clone()
    }

    async fn get_component_by_id(&self, id: &str) -> Option<CatalogComponent> {
        self.0.iter().find(|c| c.id == id).cloned()
    }

    async fn get_all_component_names(&self) -> Vec<String> {
        self.0.iter().map(|c| c.name.clone()).collect()
    }

    async fn get_all_features(&self) -> Vec<CatalogFeature> {
        Vec::new()
    }

    async fn get_feature_by_id(&self, _id: &str) -> Option<CatalogFeature> {
        None
    }

    async fn get_all_feature_names(&self) -> Vec<String> {
        Vec::new()
    }
}

fn catalog_component(id: &str, name: &str) -> CatalogComponent {
    CatalogComponent {
        id: id.to_string(),
        name: name.to_string(),
        description: "from catalog".to_string(),
        component_type: "Core".to_string(),
    }
}

fn resolver_with(
    source: Arc<dyn KnowledgeSource>,
    catalog: Arc<dyn ComponentCatalog>,
) -> (DomainResolver<InMemoryDomainRepository>, Arc<InMemoryDomainRepository>) {
    let repository = Arc::new(InMemoryDomainRepository::new());
    let resolver = DomainResolver::new(
        repository.clone(),
        DocumentationService::new(source, catalog),
    );
    (resolver, repository)
}

#[tokio::test]
async fn test_cache_aside_reads_do_not_repeat_remote_calls() {
    let source = Arc::new(CountingSource::with(&[(
        "domain",
        "# Billing Domain\nMoney in and out.\n## Identity Service\nUsers.",
    )]));
    let (resolver, repository) = resolver_with(source.clone(), Arc::new(StaticCatalog));

    let first = resolver.get_all_domains().await.unwrap();
    assert_eq!(first.len(), 2);
    let calls_after_first = source.searches();
    assert!(calls_after_first > 0);

    let second = resolver.get_all_domains().await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(source.searches(), calls_after_first);
    assert_eq!(repository.get_stats().await.unwrap().domain_count, 2);
}

#[tokio::test]
async fn test_empty_remote_results_are_not_cached() {
    let source = Arc::new(CountingSource::default());
    let (resolver, _) = resolver_with(source.clone(), Arc::new(StaticCatalog));

    assert!(resolver.get_all_domains().await.unwrap().is_empty());
    assert!(resolver.get_all_domains().await.unwrap().is_empty());
    assert_eq!(source.searches(), 2);
}

#[tokio::test]
async fn test_component_merge_deduplicates_on_normalized_id() {
    let source = Arc::new(CountingSource::with(&[(
        "component",
        "## Auth Component\nDocs win.\n## Auth-Service\nCase only.",
    )]));
    // "## Auth-Service" has the "service" keyword, so it is extracted as auth-service
    let catalog = Arc::new(FixedCatalog(vec![
        catalog_component("auth-component", "Authentication"),
        catalog_component("AUTH-SERVICE", "Auth service"),
        catalog_component("search", "Search"),
    ]));
    let (resolver, _) = resolver_with(source, catalog);

    let components = resolver.get_all_components().await.unwrap();
    let ids: Vec<&str> = components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["auth-component", "auth-service", "search"]);

    let auth = components.iter().find(|c| c.id == "auth-component").unwrap();
    assert_eq!(auth.description, "Docs win.");
}

#[tokio::test]
async fn test_catalog_duplicate_of_documented_id_is_dropped() {
    let source = Arc::new(CountingSource::with(&[("component", "## Auth\n")]));
    let catalog = Arc::new(FixedCatalog(vec![catalog_component("auth", "Authentication")]));
    let (resolver, _) = resolver_with(source, catalog.clone());

    // "Auth" carries no keyword, so documentation yields nothing and the catalog entry stays
    let components = resolver.get_all_components().await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].description, "from catalog");

    let merged = impacto_core::application::merge_components(
        vec![Component::new("auth", "Auth Module", "documented", "f")],
        catalog.get_all_components().await,
        "f",
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].description, "documented");
}

#[tokio::test]
async fn test_delete_domain_cascades_through_resolver() {
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    resolver
        .create_domain(Domain::new("billing", "Billing", "Money"))
        .await
        .unwrap();
    resolver
        .create_feature(Feature::new("invoicing", "Invoicing", "", "billing"))
        .await
        .unwrap();
    resolver
        .create_component(Component::new("pdf-gen", "PDF Generation", "", "invoicing"))
        .await
        .unwrap();

    assert!(resolver.delete_domain("billing").await.unwrap());

    let repository = resolver.repository();
    assert!(repository.get_domain_by_id("billing").await.unwrap().is_none());
    assert!(repository.get_feature_by_id("invoicing").await.unwrap().is_none());
    assert!(repository.get_component_by_id("pdf-gen").await.unwrap().is_none());
}

#[tokio::test]
async fn test_owners_resolve_by_id() {
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    resolver
        .create_domain(Domain::new("finance", "Finance", ""))
        .await
        .unwrap();
    let billing = resolver
        .create_domain(Domain::new("billing", "Billing", "").with_parent("finance"))
        .await
        .unwrap();
    let invoicing = resolver
        .create_feature(Feature::new("invoicing", "Invoicing", "", "billing"))
        .await
        .unwrap();
    let pdf = resolver
        .create_component(Component::new("pdf-gen", "PDF Generation", "", "invoicing"))
        .await
        .unwrap();

    let feature = resolver.feature_of(&pdf).await.unwrap().unwrap();
    assert_eq!(feature.id, "invoicing");
    let domain = resolver.domain_of(&invoicing).await.unwrap().unwrap();
    assert_eq!(domain.id, "billing");
    let parent = resolver.parent_of(&billing).await.unwrap().unwrap();
    assert_eq!(parent.id, "finance");

    // renaming the owner is visible through the id link
    resolver
        .update_domain(Domain::new("billing", "Billing & Invoices", ""))
        .await
        .unwrap();
    let domain = resolver.domain_of(&invoicing).await.unwrap().unwrap();
    assert_eq!(domain.name, "Billing & Invoices");

    let orphan = Component::new("mailer", "Mailer", "", "default-feature");
    assert!(resolver.feature_of(&orphan).await.unwrap().is_none());
}

#[tokio::test]
async fn test_component_documentation_digest() {
    let source = Arc::new(CountingSource::with(&[(
        "component pdf-gen",
        "Renders invoices as PDF.",
    )]));
    let (resolver, _) = resolver_with(source, Arc::new(StaticCatalog));

    let digest = resolver
        .documentation()
        .search_component_documentation("pdf-gen")
        .await
        .unwrap();
    assert_eq!(digest, "## docs\n\nRenders invoices as PDF.");

    let empty = resolver
        .documentation()
        .search_feature_documentation("unknown")
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_associations_are_copy_on_write() {
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));
    let original = resolver
        .create_component(Component::new("pdf-gen", "PDF Generation", "", "invoicing"))
        .await
        .unwrap();

    let updated = resolver
        .associate_code_entity_with_component("com.acme.PdfWriter", "pdf-gen", 0.75)
        .await
        .unwrap();
    let updated = resolver
        .associate_test_entity_with_component("PdfWriterTest", &updated.id, 1.5)
        .await
        .unwrap();

    assert!(original.code_entities.is_empty());
    assert_eq!(updated.code_entities.len(), 1);
    assert_eq!(updated.code_entities[0].entity_type, CodeEntityKind::Class);
    assert_eq!(updated.code_entities[0].confidence, 0.75);
    assert_eq!(updated.test_entities[0].entity_type, TestEntityKind::TestClass);
    assert_eq!(updated.test_entities[0].confidence, 1.5);

    let stored = resolver.get_component_by_id("pdf-gen").await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_associating_with_missing_component_is_not_found() {
    let (resolver, repository) =
        resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    let err = resolver
        .associate_code_entity_with_component("Foo", "no-such-component", 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(err.code(), "E200");
    assert!(repository.get_stats().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reverse_lookup_tolerates_dangling_references() {
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    resolver
        .create_domain(Domain::new("billing", "Billing", ""))
        .await
        .unwrap();
    resolver
        .create_feature(Feature::new("invoicing", "Invoicing", "", "billing"))
        .await
        .unwrap();
    // owner feature never created
    resolver
        .create_component(Component::new("orphan", "Orphan", "", "ghost-feature"))
        .await
        .unwrap();
    for id in ["pdf-gen", "mailer"] {
        resolver
            .create_component(Component::new(id, id, "", "invoicing"))
            .await
            .unwrap();
    }
    for id in ["pdf-gen", "mailer", "orphan"] {
        resolver
            .associate_code_entity_with_component("com.acme.Shared", id, 1.0)
            .await
            .unwrap();
    }

    assert!(resolver.delete_component("pdf-gen").await.unwrap());

    let components = resolver
        .get_components_for_code_entity("com.acme.Shared")
        .await
        .unwrap();
    let ids: Vec<&str> = components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["mailer", "orphan"]);

    let features = resolver
        .get_features_for_code_entity("com.acme.Shared")
        .await
        .unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].id, "invoicing");

    let domains = resolver
        .get_domains_for_code_entity("com.acme.Shared")
        .await
        .unwrap();
    assert_eq!(domains.len(), 1);
    assert_eq!(domains[0].id, "billing");

    assert!(
        resolver
            .get_components_for_test_entity("com.acme.Shared")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_import_creates_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("impacto.yaml");
    std::fs::write(
        &path,
        r#"
domainMappings:
  - domainId: search
    pathPatterns: ["**/search/**"]
    featureMappings:
      - featureId: indexing
        componentMappings:
          - componentId: new-search-index
          - componentId: payment
"#,
    )
    .unwrap();

    let (resolver, repository) =
        resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));
    let summary = resolver.import_from_config(&path).await.unwrap();

    assert_eq!(summary.domains_created, 1);
    assert_eq!(summary.features_created, 1);
    assert_eq!(summary.components_created, 1);
    assert_eq!(summary.components_existing, 1);

    let component = repository
        .get_component_by_id("new-search-index")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(component.name, "New Search Index");
    assert_eq!(component.description, "Component created from configuration");
    assert_eq!(component.feature_id, "indexing");

    let feature = repository.get_feature_by_id("indexing").await.unwrap().unwrap();
    assert_eq!(feature.domain_id, "search");
    assert_eq!(feature.description, "Feature created from configuration");

    let domain = repository.get_domain_by_id("search").await.unwrap().unwrap();
    assert_eq!(domain.name, "Search");

    // catalog hit keeps its catalog name
    let payment = repository.get_component_by_id("payment").await.unwrap().unwrap();
    assert_eq!(payment.name, "Payment Processing");
}

#[tokio::test]
async fn test_import_failures_are_config_io() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    let err = resolver
        .import_from_config(&dir.path().join("missing.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigIo { .. }));

    let path = dir.path().join("ok.yaml");
    std::fs::write(&path, "domainMappings:\n  - domainId: billing\n").unwrap();
    let (resolver, _) = resolver_with(Arc::new(TimedOutSource), Arc::new(StaticCatalog));
    let err = resolver.import_from_config(&path).await.unwrap_err();
    match err {
        Error::ConfigIo { source, .. } => {
            assert!(source.to_string().contains("timed out"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_export_writes_path_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.yaml");
    let (resolver, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));

    resolver
        .create_domain(Domain::new("billing", "Billing Domain", ""))
        .await
        .unwrap();
    resolver
        .create_feature(Feature::new("invoicing", "Invoice Runs", "", "billing"))
        .await
        .unwrap();
    resolver
        .create_component(Component::new("pdf-gen", "PDF Generation", "", "invoicing"))
        .await
        .unwrap();

    let written = resolver.export_to_config(&path).await.unwrap();
    assert_eq!(written, 1);

    let mapping = MappingFile::read(&path).unwrap();
    let domain = &mapping.domain_mappings[0];
    assert_eq!(domain.path_patterns, vec!["**/billing-domain/**"]);
    let feature = &domain.feature_mappings[0];
    assert_eq!(feature.path_patterns, vec!["**/invoice-runs/**"]);
    assert_eq!(
        feature.component_mappings[0].path_patterns,
        vec!["**/pdf-generation/**"]
    );

    // a fresh resolver re-imports the export without creating anything new
    let (fresh, _) = resolver_with(Arc::new(CountingSource::default()), Arc::new(StaticCatalog));
    fresh
        .create_domain(Domain::new("billing", "Billing Domain", ""))
        .await
        .unwrap();
    fresh
        .create_feature(Feature::new("invoicing", "Invoice Runs", "", "billing"))
        .await
        .unwrap();
    fresh
        .create_component(Component::new("pdf-gen", "PDF Generation", "", "invoicing"))
        .await
        .unwrap();
    let summary = fresh.import_from_config(&path).await.unwrap();
    assert_eq!(summary.created(), 0);
    assert_eq!(summary.existing(), 3);
}

#[tokio::test]
async fn test_remote_failures_propagate_from_cache_aside_reads() {
    let (resolver, _) = resolver_with(Arc::new(TimedOutSource), Arc::new(StaticCatalog));

    let err = resolver.get_all_features().await.unwrap_err();
    assert!(matches!(err, Error::RemoteTimeout(30_000)));
    assert!(resolver.get_component_by_id("unknown").await.is_err());

    // catalog hits still need the owner lookup, which also fails
    assert!(resolver.get_component_by_id("payment").await.is_err());
}

#[tokio::test]
async fn test_store_hits_never_reach_a_failing_source() {
    let (resolver, _) = resolver_with(Arc::new(TimedOutSource), Arc::new(StaticCatalog));
    resolver
        .create_feature(Feature::new("invoicing", "Invoicing", "", "billing"))
        .await
        .unwrap();

    assert_eq!(resolver.get_all_features().await.unwrap().len(), 1);
    assert!(resolver.get_feature_by_id("invoicing").await.unwrap().is_some());
    assert_eq!(
        resolver
            .get_features_by_name_pattern("voic")
            .await
            .unwrap()
            .len(),
        1
    );
}
