//! Infrastructure layer
//!
//! Adapters behind the domain traits: the in-memory store, the subprocess
//! documentation client and the HTTP catalog.

pub mod catalog;
pub mod remote;
mod store;

pub(crate) use store::dedup_by_id;
pub use store::InMemoryDomainRepository;
