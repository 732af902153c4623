//! Test utilities for the campus hub crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled with the `test-support` feature.

pub mod clock {
    //! Deterministic clocks.

    use std::sync::{Mutex, MutexGuard};

    use chrono::{DateTime, Local, TimeDelta, Utc};
    use mockable::Clock;

    /// Clock that moves forward by a fixed step on every reading, so records
    /// created in sequence get strictly increasing timestamps.
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: TimeDelta,
    }

    impl SteppingClock {
        pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }

        /// Reading the next call to [`Clock::utc`] will return.
        pub fn peek(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }

        fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
            match self.next.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut next = self.lock_clock();
            let now = *next;
            *next = now + self.step;
            now
        }
    }
}

pub mod documents {
    //! Document store wrappers that force interleavings.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use crate::domain::ports::{
        Document, DocumentFields, DocumentStore, DocumentStoreError, SnapshotStream,
    };
    use crate::domain::{CollectionName, CollectionOrdering, EntityId};

    /// Wraps a store so the first `parties` point reads all return before
    /// any of them does.
    ///
    /// Two concurrent read-modify-write cycles then both see the same
    /// revision, which is exactly the window in which a last-write-wins
    /// update gets lost. Later reads pass straight through.
    pub struct RendezvousDocumentStore<D> {
        inner: Arc<D>,
        barrier: Barrier,
        parties: usize,
        reads: AtomicUsize,
    }

    impl<D> RendezvousDocumentStore<D> {
        pub fn new(inner: Arc<D>, parties: usize) -> Self {
            Self {
                inner,
                barrier: Barrier::new(parties),
                parties,
                reads: AtomicUsize::new(0),
            }
        }

        pub fn inner(&self) -> &Arc<D> {
            &self.inner
        }

        /// Point reads served so far.
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<D: DocumentStore> DocumentStore for RendezvousDocumentStore<D> {
        async fn add(
            &self,
            collection: CollectionName,
            fields: DocumentFields,
        ) -> Result<Document, DocumentStoreError> {
            self.inner.add(collection, fields).await
        }

        async fn get(
            &self,
            collection: CollectionName,
            id: &EntityId,
        ) -> Result<Option<Document>, DocumentStoreError> {
            let result = self.inner.get(collection, id).await;
            if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
                self.barrier.wait().await;
            }
            result
        }

        async fn update(
            &self,
            collection: CollectionName,
            id: &EntityId,
            fields: DocumentFields,
            expected_revision: Option<u64>,
        ) -> Result<Document, DocumentStoreError> {
            self.inner
                .update(collection, id, fields, expected_revision)
                .await
        }

        async fn delete(
            &self,
            collection: CollectionName,
            id: &EntityId,
        ) -> Result<(), DocumentStoreError> {
            self.inner.delete(collection, id).await
        }

        async fn subscribe(
            &self,
            collection: CollectionName,
            ordering: CollectionOrdering,
        ) -> Result<SnapshotStream, DocumentStoreError> {
            self.inner.subscribe(collection, ordering).await
        }
    }
}

pub mod data_dir {
    //! Temporary data directories backed by the file key-value store.

    use std::sync::Arc;

    use camino::{Utf8Path, Utf8PathBuf};
    use tempfile::TempDir;

    use crate::outbound::storage::FileKeyValueStore;

    /// A data directory removed when dropped.
    pub struct TempDataDir {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    impl TempDataDir {
        pub fn new() -> Self {
            let temp = match TempDir::new() {
                Ok(temp) => temp,
                Err(error) => panic!("temp dir: {error}"),
            };
            let path = match Utf8PathBuf::from_path_buf(temp.path().join("campus-hub")) {
                Ok(path) => path,
                Err(path) => panic!("temp dir is not UTF-8: {}", path.display()),
            };
            Self { _temp: temp, path }
        }

        pub fn path(&self) -> &Utf8Path {
            &self.path
        }

        /// Open a fresh key-value store over the directory, as a new process
        /// would.
        pub fn open_store(&self) -> Arc<FileKeyValueStore> {
            match FileKeyValueStore::open(&self.path) {
                Ok(store) => Arc::new(store),
                Err(error) => panic!("open store at {}: {error}", self.path),
            }
        }
    }

    impl Default for TempDataDir {
        fn default() -> Self {
            Self::new()
        }
    }
}
