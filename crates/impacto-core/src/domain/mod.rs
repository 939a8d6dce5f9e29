//! Domain layer
//!
//! The business knowledge graph (domain → feature → component → code/test
//! references), the store contract, and the documentation extractor that
//! turns free text into candidate entities.

mod entity;
mod extractor;
mod repository;

pub use entity::{
    CodeEntityKind, CodeEntityReference, Component, DEFAULT_DOMAIN_ID, DEFAULT_FEATURE_ID,
    Domain, EntityKind, Feature, TestEntityKind, TestEntityReference, humanize, slugify,
};
pub use extractor::{
    Candidate, DocumentationExtractor, placeholder, placeholder_component, placeholder_domain,
    placeholder_feature,
};
pub use repository::{DomainRepository, StoreStats, name_matches};
