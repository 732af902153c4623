//! Reqwest-backed document store adapter.
//!
//! Talks to a REST document API laid out as
//! `{endpoint}/v1/projects/{project}/collections/{collection}/documents[/{id}]`.
//! Requests authenticate with an `x-api-key` header; conditional patches
//! send the expected revision in `If-Match`. Live queries are emulated by
//! polling the ordered listing and emitting a snapshot whenever it changes.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::{ApiErrorDto, DocumentDto, DocumentListDto, FieldsBody, RevisionConflictDto};
use crate::domain::ports::{
    Document, DocumentFields, DocumentStore, DocumentStoreError, SnapshotStream,
};
use crate::domain::{CollectionName, CollectionOrdering, EntityId};

const API_KEY_HEADER: &str = "x-api-key";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`HttpDocumentStore`].
#[derive(Clone)]
pub struct HttpDocumentConfig {
    pub endpoint: Url,
    pub project_id: String,
    pub api_key: Zeroizing<String>,
    /// Delay between listing polls of a live query.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl HttpDocumentConfig {
    pub fn new(
        endpoint: Url,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            endpoint,
            project_id: project_id.into(),
            api_key: Zeroizing::new(api_key.into()),
            poll_interval,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Remote [`DocumentStore`] over HTTP.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    endpoint: Url,
    project_id: String,
    api_key: Zeroizing<String>,
    poll_interval: Duration,
}

impl HttpDocumentStore {
    /// Build an adapter with a client bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpDocumentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            project_id: config.project_id,
            api_key: config.api_key,
            poll_interval: config.poll_interval.max(Duration::from_millis(50)),
        })
    }

    fn documents_url(&self, collection: CollectionName) -> Result<Url, DocumentStoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| DocumentStoreError::rejected("endpoint cannot carry a path"))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "collections",
                collection.as_str(),
                "documents",
            ]);
        Ok(url)
    }

    fn document_url(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<Url, DocumentStoreError> {
        let mut url = self.documents_url(collection)?;
        url.path_segments_mut()
            .map_err(|()| DocumentStoreError::rejected("endpoint cannot carry a path"))?
            .push(id.as_ref());
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn list(
        &self,
        collection: CollectionName,
        ordering: CollectionOrdering,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let url = self.documents_url(collection)?;
        let response = self
            .request(Method::GET, url)
            .query(&[
                ("orderBy", ordering.field),
                ("direction", ordering.direction.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        let listing: DocumentListDto = decode(&body)?;
        listing
            .into_documents()
            .map_err(DocumentStoreError::decode)
    }
}

async fn success_body(response: Response) -> Result<Vec<u8>, DocumentStoreError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if status.is_success() {
        Ok(body.to_vec())
    } else {
        Err(map_status_error(status, body.as_ref()))
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, DocumentStoreError> {
    serde_json::from_slice(body)
        .map_err(|error| DocumentStoreError::decode(format!("invalid JSON payload: {error}")))
}

fn decode_document(body: &[u8]) -> Result<Document, DocumentStoreError> {
    decode::<DocumentDto>(body)?
        .into_document()
        .map_err(DocumentStoreError::decode)
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn add(
        &self,
        collection: CollectionName,
        fields: DocumentFields,
    ) -> Result<Document, DocumentStoreError> {
        let url = self.documents_url(collection)?;
        let response = self
            .request(Method::POST, url)
            .json(&FieldsBody { fields: &fields })
            .send()
            .await
            .map_err(map_transport_error)?;
        let document = decode_document(&success_body(response).await?)?;
        debug!(%collection, id = %document.id, "document created remotely");
        Ok(document)
    }

    async fn get(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode_document(&success_body(response).await?).map(Some)
    }

    async fn update(
        &self,
        collection: CollectionName,
        id: &EntityId,
        fields: DocumentFields,
        expected_revision: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        let url = self.document_url(collection, id)?;
        let mut request = self
            .request(Method::PATCH, url)
            .json(&FieldsBody { fields: &fields });
        if let Some(revision) = expected_revision {
            request = request.header(reqwest::header::IF_MATCH, revision.to_string());
        }
        let response = request.send().await.map_err(map_transport_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(DocumentStoreError::not_found(
                collection.as_str(),
                id.as_ref(),
            )),
            StatusCode::PRECONDITION_FAILED => {
                let body = response.bytes().await.map_err(map_transport_error)?;
                let current = match serde_json::from_slice::<RevisionConflictDto>(&body) {
                    Ok(conflict) => conflict.current_revision.to_string(),
                    Err(error) => {
                        warn!(%collection, %id, %error, "conflict answer carried no revision");
                        "unknown".to_owned()
                    }
                };
                Err(DocumentStoreError::revision_mismatch(
                    expected_revision.unwrap_or_default(),
                    current,
                ))
            }
            _ => decode_document(&success_body(response).await?),
        }
    }

    async fn delete(
        &self,
        collection: CollectionName,
        id: &EntityId,
    ) -> Result<(), DocumentStoreError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocumentStoreError::not_found(
                collection.as_str(),
                id.as_ref(),
            ));
        }
        success_body(response).await.map(drop)
    }

    async fn subscribe(
        &self,
        collection: CollectionName,
        ordering: CollectionOrdering,
    ) -> Result<SnapshotStream, DocumentStoreError> {
        // Fail fast on an unusable endpoint instead of on the first poll.
        self.documents_url(collection)?;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let state = PollState {
            store: self.clone(),
            ticker,
            last: None,
        };
        let snapshots = stream::unfold(state, move |mut state| async move {
            loop {
                state.ticker.tick().await;
                match state.store.list(collection, ordering).await {
                    Ok(documents) if state.last.as_ref() == Some(&documents) => {}
                    Ok(documents) => {
                        state.last = Some(documents.clone());
                        return Some((Ok(documents), state));
                    }
                    Err(error) => {
                        warn!(%collection, %error, "document poll failed");
                        return Some((Err(error), state));
                    }
                }
            }
        });
        Ok(snapshots.boxed())
    }
}

struct PollState {
    store: HttpDocumentStore,
    ticker: tokio::time::Interval,
    last: Option<Vec<Document>>,
}

fn map_transport_error(error: reqwest::Error) -> DocumentStoreError {
    if error.is_timeout() {
        DocumentStoreError::timeout(error.to_string())
    } else {
        DocumentStoreError::connection(error.to_string())
    }
}

/// Map a non-success answer using the API's error envelope when present.
fn map_status_error(status: StatusCode, body: &[u8]) -> DocumentStoreError {
    let code = status.as_u16();
    let message = match api_error_reason(body) {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    };
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DocumentStoreError::timeout(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DocumentStoreError::rejected(format!("{message} (check the project id and API key)"))
        }
        StatusCode::TOO_MANY_REQUESTS => DocumentStoreError::connection(message),
        _ if status.is_client_error() => DocumentStoreError::rejected(message),
        _ => DocumentStoreError::connection(message),
    }
}

/// `status: message` from an `{"error": {...}}` body, if it has one.
fn api_error_reason(body: &[u8]) -> Option<String> {
    let envelope: ApiErrorDto = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(error) => {
            debug!(%error, len = body.len(), "error answer is not an API envelope");
            return None;
        }
    };
    let detail = envelope.error?;
    match (detail.status, detail.message) {
        (Some(status), Some(message)) => Some(format!("{status}: {message}")),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}
