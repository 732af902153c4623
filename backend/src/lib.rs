//! Campus hub library: entity store, mutation gateway and sync backends.
//!
//! The domain layer owns entities and their transitions; outbound adapters
//! persist them to local files or a remote document store; the app layer
//! picks one backend per session from configuration.

pub mod app;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(feature = "test-support")]
pub mod test_support;
