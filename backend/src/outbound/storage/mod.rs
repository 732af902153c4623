//! File-backed key-value storage for local mode.
//!
//! Each key lives in its own `<key>.json` file inside one data directory.
//! Access goes through a capability-scoped [`cap_std::fs::Dir`], so keys can
//! never escape the directory, and every write replaces the file atomically
//! (see [`atomic_write`]).

mod atomic_write;

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

use self::atomic_write::replace_atomically;

const FILE_EXTENSION: &str = "json";

/// [`KeyValueStore`] over a directory of JSON files.
#[derive(Debug)]
pub struct FileKeyValueStore {
    root: Utf8PathBuf,
    dir: Dir,
}

impl FileKeyValueStore {
    /// Open `root`, creating it first when missing.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self, KeyValueStoreError> {
        let root = root.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| KeyValueStoreError::io(root.as_str(), error.to_string()))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| KeyValueStoreError::io(root.as_str(), error.to_string()))?;
        debug!(root = %root, "opened file key-value store");
        Ok(Self { root, dir })
    }

    /// Directory holding the store's files.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// File name for `key`.
///
/// Keys are restricted to ASCII letters, digits, `_`, `-` and inner dots so
/// one key maps to exactly one file directly inside the data directory.
fn file_name(key: &str) -> Result<String, KeyValueStoreError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    let valid = !key.is_empty()
        && key.chars().all(allowed)
        && !key.starts_with('.')
        && !key.ends_with('.')
        && !key.contains("..");
    if valid {
        Ok(format!("{key}.{FILE_EXTENSION}"))
    } else {
        Err(KeyValueStoreError::invalid_key(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let name = file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(KeyValueStoreError::io(key, error.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key)?;
        replace_atomically(&self.dir, &name, value.as_bytes())
            .map_err(|error| KeyValueStoreError::io(key, error.to_string()))?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(KeyValueStoreError::io(key, error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct OpenStore {
        store: FileKeyValueStore,
        _temp: TempDir,
    }

    #[fixture]
    fn open_store() -> OpenStore {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().join("data")).expect("utf-8 path");
        OpenStore {
            store: FileKeyValueStore::open(root).expect("open store"),
            _temp: temp,
        }
    }

    #[rstest]
    fn values_survive_reopening(open_store: OpenStore) {
        open_store
            .store
            .set("uniconnect_posts", r#"[{"id":"p1"}]"#)
            .expect("set");

        let reopened = FileKeyValueStore::open(open_store.store.root()).expect("reopen");
        assert_eq!(
            reopened.get("uniconnect_posts").expect("get").as_deref(),
            Some(r#"[{"id":"p1"}]"#)
        );
        assert!(open_store.store.root().join("uniconnect_posts.json").is_file());
    }

    #[rstest]
    fn set_replaces_without_leaving_temporary_files(open_store: OpenStore) {
        let store = &open_store.store;
        store.set("uniconnect_help", "[]").expect("first write");
        store.set("uniconnect_help", "[1,2]").expect("second write");

        assert_eq!(store.get("uniconnect_help").expect("get").as_deref(), Some("[1,2]"));
        let names: Vec<String> = std::fs::read_dir(store.root())
            .expect("list")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["uniconnect_help.json"]);
    }

    #[rstest]
    fn missing_keys_read_as_none_and_remove_cleanly(open_store: OpenStore) {
        let store = &open_store.store;
        assert!(store.get("uniconnect_sell").expect("get").is_none());
        store.remove("uniconnect_sell").expect("remove missing");
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case(".hidden")]
    #[case("nested/key")]
    #[case("trailing.")]
    fn rejects_keys_that_do_not_name_one_file(open_store: OpenStore, #[case] key: &str) {
        let err = open_store.store.set(key, "[]").expect_err("invalid key");
        assert!(matches!(err, KeyValueStoreError::InvalidKey { .. }));
    }

    #[rstest]
    fn quarantine_keys_are_valid() {
        assert_eq!(
            file_name("uniconnect_posts.corrupt").expect("valid"),
            "uniconnect_posts.corrupt.json"
        );
    }
}
