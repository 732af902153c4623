//! Simple filtered queries over a collection's ordered view.
//!
//! A filter never reorders: it keeps the entities that match, in the order
//! the store shows them.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::entities::{BorrowKind, EmergencyKind, LostFoundKind, PostKind};
use super::{CollectionName, Entity, Error};

/// Kind restriction, typed by the collection it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    Post(PostKind),
    Borrow(BorrowKind),
    LostFound(LostFoundKind),
    Emergency(EmergencyKind),
    /// Help requests carry a free-text category, compared case-insensitively.
    HelpCategory(String),
}

impl KindFilter {
    /// Parse `raw` as a kind of `collection`.
    ///
    /// # Errors
    ///
    /// Returns an invalid request error when the collection has no kinds or
    /// `raw` names none of them.
    pub fn parse(collection: CollectionName, raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        match collection {
            CollectionName::Posts => parse_kind(collection, raw).map(Self::Post),
            CollectionName::Borrow => parse_kind(collection, raw).map(Self::Borrow),
            CollectionName::LostFound => parse_kind(collection, raw).map(Self::LostFound),
            CollectionName::Emergency => parse_kind(collection, raw).map(Self::Emergency),
            CollectionName::Help if !raw.is_empty() => Ok(Self::HelpCategory(raw.to_owned())),
            _ => Err(Error::invalid_request(format!(
                "{collection} cannot be filtered by kind"
            ))
            .with_details(json!({ "collection": collection, "kind": raw }))),
        }
    }

    fn matches(&self, entity: &Entity) -> bool {
        match (self, entity) {
            (Self::Post(kind), Entity::Post(post)) => post.kind == *kind,
            (Self::Borrow(kind), Entity::Borrow(item)) => item.kind == *kind,
            (Self::LostFound(kind), Entity::LostFound(item)) => item.item_type == *kind,
            (Self::Emergency(kind), Entity::Emergency(alert)) => alert.kind == *kind,
            (Self::HelpCategory(category), Entity::Help(help)) => {
                help.category.eq_ignore_ascii_case(category)
            }
            _ => false,
        }
    }
}

fn parse_kind<T: DeserializeOwned>(collection: CollectionName, raw: &str) -> Result<T, Error> {
    serde_json::from_value(Value::String(raw.to_lowercase())).map_err(|_| {
        Error::invalid_request(format!("unknown {collection} kind: {raw}"))
            .with_details(json!({ "collection": collection, "kind": raw }))
    })
}

/// Predicate over the entities of one collection.
///
/// # Examples
/// ```
/// use campus_hub::domain::{CollectionName, EntityFilter};
///
/// let filter = EntityFilter::new(CollectionName::LostFound)
///     .open_only()
///     .with_kind("found")
///     .expect("lost-and-found items have kinds");
/// assert!(filter.is_open_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFilter {
    collection: CollectionName,
    open_only: bool,
    kind: Option<KindFilter>,
}

impl EntityFilter {
    /// Filter that keeps every entity of `collection`.
    pub const fn new(collection: CollectionName) -> Self {
        Self {
            collection,
            open_only: false,
            kind: None,
        }
    }

    /// Keep only entities that are still open, see [`Entity::is_open`].
    #[must_use]
    pub const fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    /// Keep only entities of the named kind.
    ///
    /// # Errors
    ///
    /// See [`KindFilter::parse`].
    pub fn with_kind(mut self, raw: &str) -> Result<Self, Error> {
        self.kind = Some(KindFilter::parse(self.collection, raw)?);
        Ok(self)
    }

    pub const fn collection(&self) -> CollectionName {
        self.collection
    }

    pub const fn is_open_only(&self) -> bool {
        self.open_only
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        entity.collection() == self.collection
            && (!self.open_only || entity.is_open())
            && self.kind.as_ref().is_none_or(|kind| kind.matches(entity))
    }

    /// The matching entities of `view`, in view order.
    pub fn select(&self, view: &[Entity]) -> Vec<Entity> {
        view.iter()
            .filter(|entity| self.matches(entity))
            .cloned()
            .collect()
    }
}
