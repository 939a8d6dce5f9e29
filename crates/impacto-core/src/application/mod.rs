//! Application layer
//!
//! The documentation service turns remote text and catalog data into
//! entities; the resolver layers the store on top and owns mutations,
//! reverse queries and mapping file import/export.

mod documentation;
mod mapping;
mod resolver;

pub use documentation::{DocumentationService, merge_components};
pub use mapping::{
    ComponentMapping, DomainMapping, FeatureMapping, ImportSummary, MappingFile, path_pattern_for,
};
pub use resolver::DomainResolver;
