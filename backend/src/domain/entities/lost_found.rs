//! Lost and found reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_text, require_text, require_title, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, MemberList, UserId};

/// Whether the reporter lost or found the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostFoundKind {
    Lost,
    Found,
}

/// A lost or found item report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LostFoundItem {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub item_type: LostFoundKind,
    pub location: String,
    #[serde(default)]
    pub category: Option<String>,
    pub reporter_id: UserId,
    pub reporter_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub reporter_phone: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub notified_users: MemberList,
    pub resolved: bool,
    #[serde(alias = "reportedAt")]
    pub created_at: DateTime<Utc>,
}

/// User-supplied part of a new report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LostFoundDraft {
    pub title: String,
    pub description: String,
    pub item_type: LostFoundKind,
    pub location: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub reporter_phone: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl LostFoundItem {
    pub(super) fn create(
        draft: LostFoundDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        Ok(Self {
            id,
            title: require_title(&draft.title)?,
            description: require_text("description", &draft.description)?,
            item_type: draft.item_type,
            location: require_text("location", &draft.location)?,
            category: optional_text(draft.category),
            reporter_id: actor.id.clone(),
            reporter_name: actor.display_name.clone(),
            contact_email: optional_text(draft.contact_email).or_else(|| actor.email.clone()),
            reporter_phone: optional_text(draft.reporter_phone),
            images: draft.images,
            notified_users: MemberList::default(),
            resolved: false,
            created_at: now,
        })
    }

    /// Mark the report resolved. Repeating is a no-op.
    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Add `user` to the notified list. Returns whether the list changed.
    pub fn notify(&mut self, user: &UserId) -> bool {
        self.notified_users.insert(user.clone())
    }
}

impl Record for LostFoundItem {
    const COLLECTION: CollectionName = CollectionName::LostFound;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.reporter_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_open(&self) -> bool {
        !self.resolved
    }
}
