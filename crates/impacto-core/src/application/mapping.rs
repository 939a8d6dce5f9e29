//! Mapping file: domain → feature → component ids with path patterns
//!
//! Human-authored YAML, also produced by export. Keys are camelCase.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::slugify;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFile {
    #[serde(default)]
    pub domain_mappings: Vec<DomainMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMapping {
    pub domain_id: String,
    #[serde(default)]
    pub path_patterns: Vec<String>,
    #[serde(default)]
    pub package_patterns: Vec<String>,
    #[serde(default)]
    pub feature_mappings: Vec<FeatureMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMapping {
    pub feature_id: String,
    #[serde(default)]
    pub path_patterns: Vec<String>,
    #[serde(default)]
    pub package_patterns: Vec<String>,
    #[serde(default)]
    pub component_mappings: Vec<ComponentMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMapping {
    pub component_id: String,
    #[serde(default)]
    pub path_patterns: Vec<String>,
    #[serde(default)]
    pub package_patterns: Vec<String>,
}

/// Glob matching everything under a directory named after `name`
pub fn path_pattern_for(name: &str) -> String {
    format!("**/{}/**", slugify(name))
}

impl MappingFile {
    /// Read and parse a mapping file; any failure is a `ConfigIo` error
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::config_io(path, e))?;
        serde_yaml::from_str(&contents).map_err(|e| Error::config_io(path, e))
    }

    /// Serialize and write a mapping file; any failure is a `ConfigIo` error
    pub fn write(&self, path: &Path) -> Result<()> {
        let contents = serde_yaml::to_string(self).map_err(|e| Error::config_io(path, e))?;
        fs::write(path, contents).map_err(|e| Error::config_io(path, e))
    }

    pub fn feature_count(&self) -> usize {
        self.domain_mappings
            .iter()
            .map(|d| d.feature_mappings.len())
            .sum()
    }

    pub fn component_count(&self) -> usize {
        self.domain_mappings
            .iter()
            .flat_map(|d| &d.feature_mappings)
            .map(|f| f.component_mappings.len())
            .sum()
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub domains_created: usize,
    pub domains_existing: usize,
    pub features_created: usize,
    pub features_existing: usize,
    pub components_created: usize,
    pub components_existing: usize,
}

impl ImportSummary {
    pub fn created(&self) -> usize {
        self.domains_created + self.features_created + self.components_created
    }

    pub fn existing(&self) -> usize {
        self.domains_existing + self.features_existing + self.components_existing
    }
}
