//! Remote documentation source
//!
//! The documentation tool is an external process speaking one JSON request
//! and one JSON response over its standard streams.

mod client;
pub mod protocol;

use async_trait::async_trait;

use crate::error::Result;

pub use client::RemoteKnowledgeClient;
pub use protocol::{DocEntry, Tool};

/// Source of free-text documentation about the system
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Tools the source can be queried through
    async fn list_tools(&self) -> Result<Vec<Tool>>;

    /// Ask every tool about `term`, keeping the non-blank answers
    ///
    /// Fails only when tool discovery fails; a failing tool is skipped.
    async fn search_documentation(&self, term: &str) -> Result<Vec<DocEntry>>;
}
