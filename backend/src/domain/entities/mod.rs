//! Campus entities, their drafts and the collection-tagged wrappers.
//!
//! Every entity kind is a closed struct that rejects unknown fields, so a
//! record that does not match its collection's shape never reaches the
//! store. [`Entity`] and [`EntityDraft`] tag those structs with the
//! collection they belong to.

mod application;
mod borrow;
mod emergency;
mod hackathon;
mod help;
mod lost_found;
mod marketplace;
mod post;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub use self::application::{Application, ApplicationDraft, ApplicationStatus};
pub use self::borrow::{BorrowDraft, BorrowItem, BorrowKind, BorrowStatus};
pub use self::emergency::{Emergency, EmergencyDraft, EmergencyKind};
pub use self::hackathon::{Hackathon, HackathonDraft, HackathonStatus};
pub use self::help::{HelpDraft, HelpRequest, HelpStatus};
pub use self::lost_found::{LostFoundDraft, LostFoundItem, LostFoundKind};
pub use self::marketplace::{Condition, MarketplaceDraft, MarketplaceItem};
pub use self::post::{Post, PostDraft, PostEdit, PostKind};

use super::{Actor, CollectionName, EntityId, Error, UserId};

/// Maximum length of a title, in characters.
pub const TITLE_MAX: usize = 80;

/// Behaviour shared by every entity kind.
pub trait Record {
    /// Collection the kind lives in.
    const COLLECTION: CollectionName;

    /// Identifier, unique within the collection.
    fn id(&self) -> &EntityId;

    /// Replace the identifier, used when a remote store assigns one.
    fn set_id(&mut self, id: EntityId);

    /// Creator, or current owner for transferable items.
    fn owner_id(&self) -> &UserId;

    /// Value of the collection's ordering field.
    fn order_key(&self) -> DateTime<Utc>;

    /// Whether the record still accepts the collection's main action.
    fn is_open(&self) -> bool {
        true
    }
}

/// One entity tagged with its collection.
///
/// Serialises as the bare entity object. Decoding needs the collection, see
/// [`Entity::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Post(Post),
    Application(Application),
    Borrow(BorrowItem),
    Marketplace(MarketplaceItem),
    LostFound(LostFoundItem),
    Help(HelpRequest),
    Emergency(Emergency),
    Hackathon(Hackathon),
}

macro_rules! each_entity {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Entity::Post($inner) => $body,
            Entity::Application($inner) => $body,
            Entity::Borrow($inner) => $body,
            Entity::Marketplace($inner) => $body,
            Entity::LostFound($inner) => $body,
            Entity::Help($inner) => $body,
            Entity::Emergency($inner) => $body,
            Entity::Hackathon($inner) => $body,
        }
    };
}

impl Entity {
    /// Decode a JSON object as an entity of `collection`.
    ///
    /// # Examples
    /// ```
    /// use campus_hub::domain::{CollectionName, Entity};
    /// use serde_json::json;
    ///
    /// let rejected = Entity::decode(CollectionName::Help, json!({ "id": "h1", "unexpected": true }));
    /// assert!(rejected.is_err());
    /// ```
    pub fn decode(collection: CollectionName, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match collection {
            CollectionName::Posts => Self::Post(serde_json::from_value(value)?),
            CollectionName::Applications => Self::Application(serde_json::from_value(value)?),
            CollectionName::Borrow => Self::Borrow(serde_json::from_value(value)?),
            CollectionName::Marketplace => Self::Marketplace(serde_json::from_value(value)?),
            CollectionName::LostFound => Self::LostFound(serde_json::from_value(value)?),
            CollectionName::Help => Self::Help(serde_json::from_value(value)?),
            CollectionName::Emergency => Self::Emergency(serde_json::from_value(value)?),
            CollectionName::Hackathons => Self::Hackathon(serde_json::from_value(value)?),
        })
    }

    /// Decode a stored document: its identifier plus its remaining fields.
    pub fn from_fields(
        collection: CollectionName,
        id: &EntityId,
        fields: Map<String, Value>,
    ) -> Result<Self, serde_json::Error> {
        let mut object = fields;
        object.insert("id".to_owned(), Value::String(id.to_string()));
        Self::decode(collection, Value::Object(object))
    }

    /// The entity's fields without its identifier.
    pub fn to_fields(&self) -> Result<Map<String, Value>, Error> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut object)) => {
                object.remove("id");
                Ok(object)
            }
            Ok(_) => Err(Error::internal("entity did not serialise to an object")),
            Err(err) => Err(Error::internal(format!("failed to serialise entity: {err}"))),
        }
    }

    /// Collection the entity belongs to.
    pub fn collection(&self) -> CollectionName {
        match self {
            Self::Post(_) => Post::COLLECTION,
            Self::Application(_) => Application::COLLECTION,
            Self::Borrow(_) => BorrowItem::COLLECTION,
            Self::Marketplace(_) => MarketplaceItem::COLLECTION,
            Self::LostFound(_) => LostFoundItem::COLLECTION,
            Self::Help(_) => HelpRequest::COLLECTION,
            Self::Emergency(_) => Emergency::COLLECTION,
            Self::Hackathon(_) => Hackathon::COLLECTION,
        }
    }

    /// Identifier, unique within the collection.
    pub fn id(&self) -> &EntityId {
        each_entity!(self, inner => inner.id())
    }

    /// Replace the identifier.
    pub fn set_id(&mut self, id: EntityId) {
        each_entity!(self, inner => inner.set_id(id))
    }

    /// Creator, or current owner for transferable items.
    pub fn owner_id(&self) -> &UserId {
        each_entity!(self, inner => inner.owner_id())
    }

    /// Value of the collection's ordering field.
    pub fn order_key(&self) -> DateTime<Utc> {
        each_entity!(self, inner => inner.order_key())
    }

    /// Whether the entity is still active: unsold, unresolved, available,
    /// pending or not yet completed, depending on its kind.
    pub fn is_open(&self) -> bool {
        each_entity!(self, inner => inner.is_open())
    }
}

/// User-supplied part of a new entity, tagged with its collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDraft {
    Post(PostDraft),
    Application(ApplicationDraft),
    Borrow(BorrowDraft),
    Marketplace(MarketplaceDraft),
    LostFound(LostFoundDraft),
    Help(HelpDraft),
    Emergency(EmergencyDraft),
    Hackathon(HackathonDraft),
}

impl EntityDraft {
    /// Decode a JSON object as a draft for `collection`.
    pub fn decode(collection: CollectionName, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match collection {
            CollectionName::Posts => Self::Post(serde_json::from_value(value)?),
            CollectionName::Applications => Self::Application(serde_json::from_value(value)?),
            CollectionName::Borrow => Self::Borrow(serde_json::from_value(value)?),
            CollectionName::Marketplace => Self::Marketplace(serde_json::from_value(value)?),
            CollectionName::LostFound => Self::LostFound(serde_json::from_value(value)?),
            CollectionName::Help => Self::Help(serde_json::from_value(value)?),
            CollectionName::Emergency => Self::Emergency(serde_json::from_value(value)?),
            CollectionName::Hackathons => Self::Hackathon(serde_json::from_value(value)?),
        })
    }

    /// Collection the draft creates an entity in.
    pub fn collection(&self) -> CollectionName {
        match self {
            Self::Post(_) => CollectionName::Posts,
            Self::Application(_) => CollectionName::Applications,
            Self::Borrow(_) => CollectionName::Borrow,
            Self::Marketplace(_) => CollectionName::Marketplace,
            Self::LostFound(_) => CollectionName::LostFound,
            Self::Help(_) => CollectionName::Help,
            Self::Emergency(_) => CollectionName::Emergency,
            Self::Hackathon(_) => CollectionName::Hackathons,
        }
    }

    /// Validate the draft and stamp identity, ownership and creation time.
    pub fn into_entity(
        self,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Entity, Error> {
        Ok(match self {
            Self::Post(draft) => Entity::Post(Post::create(draft, id, actor, now)?),
            Self::Application(draft) => {
                Entity::Application(Application::create(draft, id, actor, now)?)
            }
            Self::Borrow(draft) => Entity::Borrow(BorrowItem::create(draft, id, actor, now)?),
            Self::Marketplace(draft) => {
                Entity::Marketplace(MarketplaceItem::create(draft, id, actor, now)?)
            }
            Self::LostFound(draft) => {
                Entity::LostFound(LostFoundItem::create(draft, id, actor, now)?)
            }
            Self::Help(draft) => Entity::Help(HelpRequest::create(draft, id, actor, now)?),
            Self::Emergency(draft) => {
                Entity::Emergency(Emergency::create(draft, id, actor, now)?)
            }
            Self::Hackathon(draft) => {
                Entity::Hackathon(Hackathon::create(draft, id, actor, now)?)
            }
        })
    }
}

/// Require a non-blank text field, returning it trimmed.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be blank"))
            .with_details(serde_json::json!({ "field": field })));
    }
    Ok(trimmed.to_owned())
}

/// Require a non-blank title of at most [`TITLE_MAX`] characters.
pub(crate) fn require_title(value: &str) -> Result<String, Error> {
    let title = require_text("title", value)?;
    if title.chars().count() > TITLE_MAX {
        return Err(Error::invalid_request(format!(
            "title must be at most {TITLE_MAX} characters"
        ))
        .with_details(serde_json::json!({ "field": "title" })));
    }
    Ok(title)
}

/// Trim optional text, dropping values that are blank.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! Shared builders for entity tests.

    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::{Actor, UserId, UserRole};

    pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(crate) fn actor(id: &str) -> Actor {
        Actor::new(UserId::new(id).expect("user id"), format!("User {id}"), UserRole::Student)
            .with_college("North Campus Institute")
    }
}

#[cfg(test)]
mod tests;
