//! Cache-aside resolver over the entity store and the remote sources
//!
//! Reads consult the store first. On an empty result the documentation
//! service is asked, everything it returns is written back, and the fresh
//! result is returned. Empty remote answers are not remembered, so the next
//! read on an empty store goes remote again. Remote failures on this path
//! reach the caller unchanged.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    CodeEntityKind, CodeEntityReference, Component, Domain, DomainRepository, EntityKind, Feature,
    StoreStats, TestEntityKind, TestEntityReference, placeholder_component, placeholder_domain,
    placeholder_feature,
};
use crate::error::{Error, Result};
use crate::infrastructure::InMemoryDomainRepository;
use crate::infrastructure::catalog::HttpComponentCatalog;
use crate::infrastructure::remote::RemoteKnowledgeClient;

use super::documentation::DocumentationService;
use super::mapping::{
    ComponentMapping, DomainMapping, FeatureMapping, ImportSummary, MappingFile, path_pattern_for,
};

/// Which side of a component's associations a reverse query scans
#[derive(Debug, Clone, Copy)]
enum Association {
    Code,
    Test,
}

impl Association {
    fn matches(self, component: &Component, entity_id: &str) -> bool {
        match self {
            Self::Code => component.references_code_entity(entity_id),
            Self::Test => component.references_test_entity(entity_id),
        }
    }
}

/// Resolves domains, features and components for callers
pub struct DomainResolver<R: DomainRepository> {
    repository: Arc<R>,
    documentation: DocumentationService,
}

impl DomainResolver<InMemoryDomainRepository> {
    /// Wire an in-memory store to the configured remote tool and catalog
    pub fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        let source = RemoteKnowledgeClient::from_config(&config.remote);
        let catalog = HttpComponentCatalog::from_config(&config.secondary)?;
        Ok(Self::new(
            Arc::new(InMemoryDomainRepository::new()),
            DocumentationService::new(Arc::new(source), Arc::new(catalog)),
        ))
    }
}

impl<R: DomainRepository> DomainResolver<R> {
    pub fn new(repository: Arc<R>, documentation: DocumentationService) -> Self {
        Self {
            repository,
            documentation,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn documentation(&self) -> &DocumentationService {
        &self.documentation
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.repository.get_stats().await
    }

    async fn write_back_domains(&self, domains: Vec<Domain>) -> Result<Vec<Domain>> {
        for domain in &domains {
            self.repository.save_domain(domain.clone()).await?;
        }
        Ok(domains)
    }

    async fn write_back_features(&self, features: Vec<Feature>) -> Result<Vec<Feature>> {
        for feature in &features {
            self.repository.save_feature(feature.clone()).await?;
        }
        Ok(features)
    }

    async fn write_back_components(&self, components: Vec<Component>) -> Result<Vec<Component>> {
        for component in &components {
            self.repository.save_component(component.clone()).await?;
        }
        Ok(components)
    }

    // ========== Domain Reads ==========

    pub async fn get_all_domains(&self) -> Result<Vec<Domain>> {
        let domains = self.repository.get_all_domains().await?;
        if !domains.is_empty() {
            debug!(count = domains.len(), "Domains served from store");
            return Ok(domains);
        }

        info!("No domains in store, fetching from documentation");
        let fetched = self.documentation.domains().await?;
        self.write_back_domains(fetched).await
    }

    pub async fn get_domain_by_id(&self, id: &str) -> Result<Option<Domain>> {
        if let Some(domain) = self.repository.get_domain_by_id(id).await? {
            return Ok(Some(domain));
        }

        info!(domain_id = %id, "Domain not in store, fetching from documentation");
        let fetched = self.documentation.domain_by_id(id).await?;
        if let Some(domain) = &fetched {
            self.repository.save_domain(domain.clone()).await?;
        }
        Ok(fetched)
    }

    pub async fn get_domains_by_name_pattern(&self, pattern: &str) -> Result<Vec<Domain>> {
        let domains = self.repository.get_domains_by_name_pattern(pattern).await?;
        if !domains.is_empty() {
            return Ok(domains);
        }

        info!(pattern, "No matching domains in store, fetching from documentation");
        let fetched = self.documentation.domains_by_name_pattern(pattern).await?;
        self.write_back_domains(fetched).await
    }

    // ========== Feature Reads ==========

    pub async fn get_all_features(&self) -> Result<Vec<Feature>> {
        let features = self.repository.get_all_features().await?;
        if !features.is_empty() {
            debug!(count = features.len(), "Features served from store");
            return Ok(features);
        }

        info!("No features in store, fetching from documentation");
        let fetched = self.documentation.features().await?;
        self.write_back_features(fetched).await
    }

    pub async fn get_feature_by_id(&self, id: &str) -> Result<Option<Feature>> {
        if let Some(feature) = self.repository.get_feature_by_id(id).await? {
            return Ok(Some(feature));
        }

        info!(feature_id = %id, "Feature not in store, fetching from documentation");
        let fetched = self.documentation.feature_by_id(id).await?;
        if let Some(feature) = &fetched {
            self.repository.save_feature(feature.clone()).await?;
        }
        Ok(fetched)
    }

    pub async fn get_features_by_domain_id(&self, domain_id: &str) -> Result<Vec<Feature>> {
        let features = self.repository.get_features_by_domain_id(domain_id).await?;
        if !features.is_empty() {
            return Ok(features);
        }

        info!(domain_id = %domain_id, "No features for domain in store, fetching from documentation");
        let fetched = self.documentation.features_by_domain_id(domain_id).await?;
        self.write_back_features(fetched).await
    }

    pub async fn get_features_by_name_pattern(&self, pattern: &str) -> Result<Vec<Feature>> {
        let features = self.repository.get_features_by_name_pattern(pattern).await?;
        if !features.is_empty() {
            return Ok(features);
        }

        info!(pattern, "No matching features in store, fetching from documentation");
        let fetched = self.documentation.features_by_name_pattern(pattern).await?;
        self.write_back_features(fetched).await
    }

    // ========== Component Reads ==========

    pub async fn get_all_components(&self) -> Result<Vec<Component>> {
        let components = self.repository.get_all_components().await?;
        if !components.is_empty() {
            debug!(count = components.len(), "Components served from store");
            return Ok(components);
        }

        info!("No components in store, fetching from documentation and catalog");
        let fetched = self.documentation.components().await?;
        self.write_back_components(fetched).await
    }

    pub async fn get_component_by_id(&self, id: &str) -> Result<Option<Component>> {
        if let Some(component) = self.repository.get_component_by_id(id).await? {
            return Ok(Some(component));
        }

        info!(component_id = %id, "Component not in store, fetching from catalog and documentation");
        let fetched = self.documentation.component_by_id(id).await?;
        if let Some(component) = &fetched {
            self.repository.save_component(component.clone()).await?;
        }
        Ok(fetched)
    }

    pub async fn get_components_by_feature_id(&self, feature_id: &str) -> Result<Vec<Component>> {
        let components = self
            .repository
            .get_components_by_feature_id(feature_id)
            .await?;
        if !components.is_empty() {
            return Ok(components);
        }

        info!(feature_id = %feature_id, "No components for feature in store, fetching from documentation");
        let fetched = self.documentation.components_by_feature_id(feature_id).await?;
        self.write_back_components(fetched).await
    }

    pub async fn get_components_by_name_pattern(&self, pattern: &str) -> Result<Vec<Component>> {
        let components = self
            .repository
            .get_components_by_name_pattern(pattern)
            .await?;
        if !components.is_empty() {
            return Ok(components);
        }

        info!(pattern, "No matching components in store, fetching from documentation");
        let fetched = self.documentation.components_by_name_pattern(pattern).await?;
        self.write_back_components(fetched).await
    }

    // ========== Parent Lookups ==========

    /// Owning domain of a feature, if the store knows it
    pub async fn domain_of(&self, feature: &Feature) -> Result<Option<Domain>> {
        self.repository.get_domain_by_id(&feature.domain_id).await
    }

    /// Owning feature of a component, if the store knows it
    pub async fn feature_of(&self, component: &Component) -> Result<Option<Feature>> {
        self.repository.get_feature_by_id(&component.feature_id).await
    }

    /// Parent of a nested domain
    pub async fn parent_of(&self, domain: &Domain) -> Result<Option<Domain>> {
        match &domain.parent_id {
            Some(parent_id) => self.repository.get_domain_by_id(parent_id).await,
            None => Ok(None),
        }
    }

    // ========== Mutations ==========

    pub async fn create_domain(&self, domain: Domain) -> Result<Domain> {
        info!(domain_id = %domain.id, "Creating domain");
        self.repository.save_domain(domain).await
    }

    pub async fn update_domain(&self, domain: Domain) -> Result<Domain> {
        debug!(domain_id = %domain.id, "Updating domain");
        self.repository.save_domain(domain).await
    }

    pub async fn delete_domain(&self, id: &str) -> Result<bool> {
        info!(domain_id = %id, "Deleting domain");
        self.repository.delete_domain(id).await
    }

    pub async fn create_feature(&self, feature: Feature) -> Result<Feature> {
        info!(feature_id = %feature.id, "Creating feature");
        self.repository.save_feature(feature).await
    }

    pub async fn update_feature(&self, feature: Feature) -> Result<Feature> {
        debug!(feature_id = %feature.id, "Updating feature");
        self.repository.save_feature(feature).await
    }

    pub async fn delete_feature(&self, id: &str) -> Result<bool> {
        info!(feature_id = %id, "Deleting feature");
        self.repository.delete_feature(id).await
    }

    pub async fn create_component(&self, component: Component) -> Result<Component> {
        info!(component_id = %component.id, "Creating component");
        self.repository.save_component(component).await
    }

    pub async fn update_component(&self, component: Component) -> Result<Component> {
        debug!(component_id = %component.id, "Updating component");
        self.repository.save_component(component).await
    }

    pub async fn delete_component(&self, id: &str) -> Result<bool> {
        info!(component_id = %id, "Deleting component");
        self.repository.delete_component(id).await
    }

    async fn require_component(&self, component_id: &str) -> Result<Component> {
        self.get_component_by_id(component_id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Component, component_id))
    }

    /// Record that a code entity belongs to a component
    ///
    /// The reference is tagged `Class`; confidence is stored as given.
    pub async fn associate_code_entity_with_component(
        &self,
        code_entity_id: &str,
        component_id: &str,
        confidence: f64,
    ) -> Result<Component> {
        let component = self.require_component(component_id).await?;
        let reference = CodeEntityReference::new(code_entity_id, CodeEntityKind::default())
            .with_confidence(confidence);

        info!(
            component_id = %component_id,
            code_entity_id = %code_entity_id,
            confidence,
            "Associating code entity"
        );
        self.repository
            .save_component(component.with_code_entity(reference))
            .await
    }

    /// Record that a test entity covers a component
    ///
    /// The reference is tagged `TestClass`; confidence is stored as given.
    pub async fn associate_test_entity_with_component(
        &self,
        test_entity_id: &str,
        component_id: &str,
        confidence: f64,
    ) -> Result<Component> {
        let component = self.require_component(component_id).await?;
        let reference = TestEntityReference::new(test_entity_id, TestEntityKind::default())
            .with_confidence(confidence);

        info!(
            component_id = %component_id,
            test_entity_id = %test_entity_id,
            confidence,
            "Associating test entity"
        );
        self.repository
            .save_component(component.with_test_entity(reference))
            .await
    }

    // ========== Reverse Queries ==========

    async fn components_with(&self, association: Association, entity_id: &str) -> Result<Vec<Component>> {
        Ok(self
            .get_all_components()
            .await?
            .into_iter()
            .filter(|c| association.matches(c, entity_id))
            .collect())
    }

    async fn owning_features(&self, components: &[Component]) -> Result<Vec<Feature>> {
        let mut seen = HashSet::new();
        let mut features = Vec::new();
        for component in components {
            if !seen.insert(component.feature_id.as_str()) {
                continue;
            }
            match self.repository.get_feature_by_id(&component.feature_id).await? {
                Some(feature) => features.push(feature),
                None => debug!(feature_id = %component.feature_id, "Skipping unknown owning feature"),
            }
        }
        Ok(features)
    }

    async fn owning_domains(&self, features: &[Feature]) -> Result<Vec<Domain>> {
        let mut seen = HashSet::new();
        let mut domains = Vec::new();
        for feature in features {
            if !seen.insert(feature.domain_id.as_str()) {
                continue;
            }
            match self.repository.get_domain_by_id(&feature.domain_id).await? {
                Some(domain) => domains.push(domain),
                None => debug!(domain_id = %feature.domain_id, "Skipping unknown owning domain"),
            }
        }
        Ok(domains)
    }

    pub async fn get_components_for_code_entity(&self, entity_id: &str) -> Result<Vec<Component>> {
        self.components_with(Association::Code, entity_id).await
    }

    pub async fn get_features_for_code_entity(&self, entity_id: &str) -> Result<Vec<Feature>> {
        let components = self.components_with(Association::Code, entity_id).await?;
        self.owning_features(&components).await
    }

    pub async fn get_domains_for_code_entity(&self, entity_id: &str) -> Result<Vec<Domain>> {
        let components = self.components_with(Association::Code, entity_id).await?;
        let features = self.owning_features(&components).await?;
        self.owning_domains(&features).await
    }

    pub async fn get_components_for_test_entity(&self, entity_id: &str) -> Result<Vec<Component>> {
        self.components_with(Association::Test, entity_id).await
    }

    pub async fn get_features_for_test_entity(&self, entity_id: &str) -> Result<Vec<Feature>> {
        let components = self.components_with(Association::Test, entity_id).await?;
        self.owning_features(&components).await
    }

    pub async fn get_domains_for_test_entity(&self, entity_id: &str) -> Result<Vec<Domain>> {
        let components = self.components_with(Association::Test, entity_id).await?;
        let features = self.owning_features(&components).await?;
        self.owning_domains(&features).await
    }

    // ========== Import / Export ==========

    /// Load a mapping file, creating placeholders for unknown ids
    ///
    /// Every failure, remote ones included, comes back as `ConfigIo`.
    pub async fn import_from_config(&self, path: &Path) -> Result<ImportSummary> {
        info!(path = %path.display(), "Importing mapping file");
        match self.import_mappings(path).await {
            Ok(summary) => {
                info!(
                    path = %path.display(),
                    created = summary.created(),
                    existing = summary.existing(),
                    "Import complete"
                );
                Ok(summary)
            }
            Err(e) => Err(wrap_config_io(path, e)),
        }
    }

    async fn import_mappings(&self, path: &Path) -> Result<ImportSummary> {
        let mapping = MappingFile::read(path)?;
        let mut summary = ImportSummary::default();

        for domain_mapping in &mapping.domain_mappings {
            let domain = match self.get_domain_by_id(&domain_mapping.domain_id).await? {
                Some(domain) => {
                    summary.domains_existing += 1;
                    domain
                }
                None => {
                    summary.domains_created += 1;
                    placeholder_domain(&domain_mapping.domain_id)
                }
            };

            for feature_mapping in &domain_mapping.feature_mappings {
                let feature = match self.get_feature_by_id(&feature_mapping.feature_id).await? {
                    Some(feature) => {
                        summary.features_existing += 1;
                        feature
                    }
                    None => {
                        summary.features_created += 1;
                        placeholder_feature(&feature_mapping.feature_id, &domain.id)
                    }
                };

                for component_mapping in &feature_mapping.component_mappings {
                    let component =
                        match self.get_component_by_id(&component_mapping.component_id).await? {
                            Some(component) => {
                                summary.components_existing += 1;
                                component
                            }
                            None => {
                                summary.components_created += 1;
                                placeholder_component(&component_mapping.component_id, &feature.id)
                            }
                        };
                    self.update_component(component).await?;
                }

                self.update_feature(feature).await?;
            }

            self.update_domain(domain).await?;
        }

        Ok(summary)
    }

    /// Write every domain → feature → component chain as a mapping file
    ///
    /// Returns the number of domains written.
    pub async fn export_to_config(&self, path: &Path) -> Result<usize> {
        info!(path = %path.display(), "Exporting mapping file");
        match self.export_mappings(path).await {
            Ok(count) => {
                info!(path = %path.display(), domains = count, "Export complete");
                Ok(count)
            }
            Err(e) => Err(wrap_config_io(path, e)),
        }
    }

    async fn export_mappings(&self, path: &Path) -> Result<usize> {
        let domains = self.get_all_domains().await?;
        let features = self.get_all_features().await?;
        let components = self.get_all_components().await?;

        let domain_mappings: Vec<DomainMapping> = domains
            .iter()
            .map(|domain| DomainMapping {
                domain_id: domain.id.clone(),
                path_patterns: vec![path_pattern_for(&domain.name)],
                package_patterns: Vec::new(),
                feature_mappings: features
                    .iter()
                    .filter(|f| f.domain_id == domain.id)
                    .map(|feature| FeatureMapping {
                        feature_id: feature.id.clone(),
                        path_patterns: vec![path_pattern_for(&feature.name)],
                        package_patterns: Vec::new(),
                        component_mappings: components
                            .iter()
                            .filter(|c| c.feature_id == feature.id)
                            .map(|component| ComponentMapping {
                                component_id: component.id.clone(),
                                path_patterns: vec![path_pattern_for(&component.name)],
                                package_patterns: Vec::new(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let count = domain_mappings.len();
        MappingFile { domain_mappings }.write(path)?;
        Ok(count)
    }
}

fn wrap_config_io(path: &Path, error: Error) -> Error {
    match error {
        Error::ConfigIo { .. } => error,
        other => Error::config_io(path, other),
    }
}
