//! Document store adapters for remote mode.
//!
//! [`HttpDocumentStore`] talks to the hosted document API;
//! [`InMemoryDocumentStore`] emulates it in-process.

mod dto;
mod http_store;
mod in_memory;

pub use http_store::{HttpDocumentConfig, HttpDocumentStore};
pub use in_memory::InMemoryDocumentStore;
