//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **storage**: directory-of-JSON-files [`KeyValueStore`](crate::domain::ports::KeyValueStore)
//!   with atomic replacement
//! - **documents**: HTTP and in-memory [`DocumentStore`](crate::domain::ports::DocumentStore)s
//! - **identity**: accounts and session kept in the key-value store
//!
//! Adapters translate between domain types and their medium. They contain
//! no business logic.

pub mod documents;
pub mod identity;
pub mod storage;
