//! Impacto Core Library
//!
//! Resolves the business knowledge graph used to map code changes to
//! business concepts:
//! - Entity model (domain → feature → component → code/test references)
//! - In-memory entity store with cascading deletes
//! - Remote documentation tool client (JSON over stdio, per-call process)
//! - Heuristic markdown extraction of domains, features and components
//! - Secondary HTTP catalog with a built-in fallback
//! - Cache-aside resolver, reverse lookups and mapping file import/export

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::{DocumentationService, DomainResolver, ImportSummary};
    pub use crate::config::Config;
    pub use crate::domain::{Component, Domain, DomainRepository, EntityKind, Feature};
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::InMemoryDomainRepository;
    pub use crate::infrastructure::catalog::ComponentCatalog;
    pub use crate::infrastructure::remote::KnowledgeSource;
}
