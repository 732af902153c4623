//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod entity_backend;
mod identity_provider;
mod key_value_store;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    Document, DocumentFields, DocumentStore, DocumentStoreError, SnapshotStream,
};
pub use entity_backend::{AttachReport, EntityBackend, Transition};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FixtureIdentityProvider, IdentityProvider, IdentityProviderError, TemporaryPassword,
};
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{FixtureKeyValueStore, KeyValueStore, KeyValueStoreError};
