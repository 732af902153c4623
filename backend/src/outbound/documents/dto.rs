//! Wire shapes of the document API.

use serde::{Deserialize, Serialize};

use crate::domain::EntityId;
use crate::domain::ports::{Document, DocumentFields};

#[derive(Debug, Deserialize)]
pub(super) struct DocumentDto {
    pub(super) id: String,
    pub(super) revision: u64,
    #[serde(default)]
    pub(super) fields: DocumentFields,
}

#[derive(Debug, Deserialize)]
pub(super) struct DocumentListDto {
    #[serde(default)]
    pub(super) documents: Vec<DocumentDto>,
}

/// Body of create and patch requests.
#[derive(Debug, Serialize)]
pub(super) struct FieldsBody<'a> {
    pub(super) fields: &'a DocumentFields,
}

/// Error envelope of non-success answers: `{"error": {"status", "message"}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDto {
    #[serde(default)]
    pub(super) error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDetail {
    #[serde(default)]
    pub(super) status: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

/// Body of a `412 Precondition Failed` answer to a conditional patch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RevisionConflictDto {
    pub(super) current_revision: u64,
}

impl DocumentDto {
    pub(super) fn into_document(self) -> Result<Document, String> {
        let id = EntityId::new(&self.id).map_err(|err| format!("document id {:?}: {err}", self.id))?;
        Ok(Document {
            id,
            revision: self.revision,
            fields: self.fields,
        })
    }
}

impl DocumentListDto {
    pub(super) fn into_documents(self) -> Result<Vec<Document>, String> {
        self.documents
            .into_iter()
            .map(DocumentDto::into_document)
            .collect()
    }
}
