//! Campus feed posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_text, require_text, require_title, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, UserId, UserRole};

/// Kind of feed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Hackathon,
    Freshers,
    Flashmob,
    Placement,
    Internship,
    Topper,
    Others,
}

/// A post on the campus feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub posted_by: UserId,
    pub poster_name: String,
    pub role: UserRole,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub apply_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub college: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// User-supplied part of a new post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    #[serde(default)]
    pub apply_enabled: bool,
    #[serde(default)]
    pub image: Option<String>,
}

/// Owner edit of a post; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_enabled: Option<bool>,
}

impl Post {
    pub(super) fn create(
        draft: PostDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        Ok(Self {
            id,
            title: require_title(&draft.title)?,
            description: require_text("description", &draft.description)?,
            posted_by: actor.id.clone(),
            poster_name: actor.display_name.clone(),
            role: actor.role,
            kind: draft.kind,
            apply_enabled: draft.apply_enabled,
            created_at: now,
            college: actor.college.clone(),
            image: optional_text(draft.image),
        })
    }

    /// Apply an owner edit. Validation runs before anything changes.
    pub fn edit(&mut self, edit: &PostEdit) -> Result<(), Error> {
        let title = edit.title.as_deref().map(require_title).transpose()?;
        let description = edit
            .description
            .as_deref()
            .map(|text| require_text("description", text))
            .transpose()?;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(apply_enabled) = edit.apply_enabled {
            self.apply_enabled = apply_enabled;
        }
        Ok(())
    }
}

impl Record for Post {
    const COLLECTION: CollectionName = CollectionName::Posts;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.posted_by
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
