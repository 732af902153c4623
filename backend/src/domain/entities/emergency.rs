//! Emergency alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, MemberList, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyKind {
    Fire,
    Medical,
    Security,
    Other,
}

/// An emergency alert raised on campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Emergency {
    pub id: EntityId,
    pub message: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: EmergencyKind,
    pub reported_by: UserId,
    pub reporter_name: String,
    #[serde(default)]
    pub respondents: MemberList,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmergencyDraft {
    pub message: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: EmergencyKind,
}

impl Emergency {
    pub(super) fn create(
        draft: EmergencyDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        Ok(Self {
            id,
            message: require_text("message", &draft.message)?,
            location: require_text("location", &draft.location)?,
            kind: draft.kind,
            reported_by: actor.id.clone(),
            reporter_name: actor.display_name.clone(),
            respondents: MemberList::default(),
            created_at: now,
        })
    }

    /// Record `responder`. Returns whether the list changed.
    pub fn respond(&mut self, responder: &UserId) -> bool {
        self.respondents.insert(responder.clone())
    }
}

impl Record for Emergency {
    const COLLECTION: CollectionName = CollectionName::Emergency;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.reported_by
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
