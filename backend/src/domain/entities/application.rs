//! Applications to feed posts that accept them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, UserId};

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A student's application to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Application {
    pub id: EntityId,
    pub post_id: EntityId,
    pub student_id: UserId,
    pub student_name: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub year: String,
    pub course: String,
    pub email: String,
}

/// User-supplied part of a new application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplicationDraft {
    pub post_id: EntityId,
    pub year: String,
    pub course: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Application {
    pub(super) fn create(
        draft: ApplicationDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let email = match draft.email.as_deref().or(actor.email.as_deref()) {
            Some(email) => require_text("email", email)?,
            None => return Err(Error::invalid_request("email is required to apply")),
        };
        Ok(Self {
            id,
            post_id: draft.post_id,
            student_id: actor.id.clone(),
            student_name: actor.display_name.clone(),
            status: ApplicationStatus::Pending,
            applied_at: now,
            year: require_text("year", &draft.year)?,
            course: require_text("course", &draft.course)?,
            email,
        })
    }

    /// Record a review decision.
    ///
    /// Only pending applications can be decided. Repeating the decision
    /// already recorded succeeds without change.
    pub fn decide(&mut self, decision: ApplicationStatus) -> Result<(), Error> {
        if decision == ApplicationStatus::Pending {
            return Err(Error::invalid_request("an application cannot be reset to pending"));
        }
        match self.status {
            ApplicationStatus::Pending => {
                self.status = decision;
                Ok(())
            }
            current if current == decision => Ok(()),
            _ => Err(Error::conflict("application has already been decided")
                .with_details(serde_json::json!({ "status": self.status }))),
        }
    }
}

impl Record for Application {
    const COLLECTION: CollectionName = CollectionName::Applications;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.student_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.applied_at
    }

    fn is_open(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
