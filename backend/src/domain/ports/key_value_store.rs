//! Port for the string key-value persistence used in local mode.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// Reading or writing the backing medium failed.
        Io { key: String, message: String } => "storage failed for {key}: {message}",
        /// The key cannot be mapped onto the backing medium.
        InvalidKey { key: String } => "invalid storage key: {key}",
    }
}

/// Synchronous string store keyed by collection storage keys.
///
/// Writes replace the whole value. Implementations must make a completed
/// `set` durable before returning, so a crash never leaves half a value
/// behind.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct FixtureKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl FixtureKeyValueStore {
    /// Store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store.entries().insert(key.into(), value.into());
        store
    }

    /// Every key currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for FixtureKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fixture_store_replaces_and_removes_values() {
        let store = FixtureKeyValueStore::with_entry("uniconnect_help", "[]");
        store.set("uniconnect_help", "[1]").expect("set");
        assert_eq!(store.get("uniconnect_help").expect("get").as_deref(), Some("[1]"));

        store.remove("uniconnect_help").expect("remove");
        store.remove("uniconnect_help").expect("second remove");
        assert!(store.get("uniconnect_help").expect("get").is_none());
    }

    #[rstest]
    fn io_errors_name_the_key() {
        let err = KeyValueStoreError::io("uniconnect_posts", "disk full");
        assert_eq!(err.to_string(), "storage failed for uniconnect_posts: disk full");
    }
}
