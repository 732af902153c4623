//! Session composition: one entity store, one backend, one gateway.
//!
//! The store mode is chosen once from [`HubSettings`]. Remote mode checks
//! its credentials before any adapter is built and never falls back to
//! local mode.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::domain::ports::{
    AttachReport, DocumentStore, EntityBackend, IdentityProvider, KeyValueStore,
};
use crate::domain::{
    AccountService, CollectionName, CollectionView, EntityStore, Error, LocalEntityBackend,
    MutationGateway, RemoteEntityBackend, SessionContext, StoreMode, WriteConsistency,
};
use crate::outbound::documents::{HttpDocumentConfig, HttpDocumentStore};
use crate::outbound::identity::LocalIdentityProvider;
use crate::outbound::storage::FileKeyValueStore;

use super::settings::HubSettings;

/// Everything a session needs, wired for one store mode.
pub struct Hub {
    store: Arc<EntityStore>,
    gateway: MutationGateway<dyn EntityBackend>,
    accounts: AccountService<dyn IdentityProvider>,
}

impl Hub {
    /// Build the hub described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when remote mode lacks credentials or
    /// the consistency setting is unknown, and an internal error when the
    /// data directory cannot be opened.
    pub fn from_settings(settings: &HubSettings, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let mode = settings.store_mode();
        let remote = match mode {
            StoreMode::Remote => Some((
                settings.remote_credentials()?,
                settings.write_consistency()?,
            )),
            StoreMode::Local => None,
        };
        let data_dir = settings.data_dir()?;
        let kv = Arc::new(FileKeyValueStore::open(&data_dir).map_err(|err| {
            Error::internal(err.to_string()).with_details(json!({ "dataDir": data_dir.as_str() }))
        })?);

        let hub = match remote {
            None => Self::local(kv, clock),
            Some((credentials, consistency)) => {
                let config = HttpDocumentConfig::new(
                    credentials.endpoint,
                    credentials.project_id,
                    credentials.api_key,
                    settings.poll_interval(),
                );
                let documents = HttpDocumentStore::new(config).map_err(|err| {
                    Error::configuration(format!("cannot build the HTTP client: {err}"))
                })?;
                Self::remote(kv, Arc::new(documents), consistency, clock)
            }
        };
        info!(mode = ?mode, data_dir = %data_dir, "hub built");
        Ok(hub)
    }

    /// Local-mode hub over `kv`, which also holds accounts and the session.
    pub fn local<K>(kv: Arc<K>, clock: Arc<dyn Clock>) -> Self
    where
        K: KeyValueStore + 'static,
    {
        let store = Arc::new(EntityStore::new(StoreMode::Local));
        let backend = Arc::new(LocalEntityBackend::new(Arc::clone(&store), Arc::clone(&kv)));
        Self::assemble(store, backend, kv, clock)
    }

    /// Remote-mode hub over `documents`; accounts stay in `kv`.
    pub fn remote<K, D>(
        kv: Arc<K>,
        documents: Arc<D>,
        consistency: WriteConsistency,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        K: KeyValueStore + 'static,
        D: DocumentStore + 'static,
    {
        let store = Arc::new(EntityStore::new(StoreMode::Remote));
        let backend = Arc::new(RemoteEntityBackend::new(
            Arc::clone(&store),
            documents,
            consistency,
        ));
        Self::assemble(store, backend, kv, clock)
    }

    fn assemble<K>(
        store: Arc<EntityStore>,
        backend: Arc<dyn EntityBackend>,
        kv: Arc<K>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        K: KeyValueStore + 'static,
    {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(kv, Arc::clone(&clock)));
        Self {
            gateway: MutationGateway::new(Arc::clone(&store), backend, clock),
            accounts: AccountService::new(identity),
            store,
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.store.mode()
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn gateway(&self) -> &MutationGateway<dyn EntityBackend> {
        &self.gateway
    }

    pub fn accounts(&self) -> &AccountService<dyn IdentityProvider> {
        &self.accounts
    }

    /// Session of the signed-in user.
    pub async fn session(&self) -> Result<SessionContext, Error> {
        self.accounts.session().await
    }

    /// Attach the backend and, in remote mode, wait for the first snapshot
    /// of every subscribed collection.
    ///
    /// A failed wait cancels the subscriptions again, so the hub is left
    /// detached.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::ServiceUnavailable`](crate::domain::ErrorCode)
    /// when a snapshot does not arrive within `wait`, and
    /// [`ErrorCode::Conflict`](crate::domain::ErrorCode) when the remote
    /// backend is already attached.
    pub async fn attach(&self, wait: Duration) -> Result<AttachReport, Error> {
        let receivers: Vec<_> = CollectionName::all()
            .map(|collection| (collection, self.store.watch(collection)))
            .collect();
        let report = self.gateway.backend().attach().await?;
        for (collection, error) in &report.load_failures {
            warn!(%collection, error = %error, "collection unavailable");
        }
        if self.mode() == StoreMode::Local {
            return Ok(report);
        }
        if let Err(err) = first_snapshots(&report, receivers, wait).await {
            self.detach().await;
            return Err(err);
        }
        Ok(report)
    }

    /// Stop live updates.
    pub async fn detach(&self) {
        self.gateway.backend().detach().await;
    }
}

/// Wait until every collection that attached cleanly has seen a snapshot.
async fn first_snapshots(
    report: &AttachReport,
    mut receivers: Vec<(CollectionName, watch::Receiver<CollectionView>)>,
    wait: Duration,
) -> Result<(), Error> {
    let deadline = Instant::now() + wait;
    receivers.retain(|(collection, _)| {
        !report
            .load_failures
            .iter()
            .any(|(failed, _)| failed == collection)
    });
    for (collection, receiver) in &mut receivers {
        match timeout_at(deadline, receiver.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Err(Error::internal("entity store closed")),
            Err(_) => {
                return Err(Error::service_unavailable(format!(
                    "no snapshot of {collection} within {}ms",
                    wait.as_millis()
                ))
                .with_details(json!({ "collection": collection })));
            }
        }
    }
    Ok(())
}
