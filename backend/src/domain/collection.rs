//! Collection names, entity identifiers and display ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Error;

/// One named collection of entities.
///
/// Each collection maps to one local storage key and one remote document
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Posts,
    Applications,
    Borrow,
    Marketplace,
    LostFound,
    Help,
    Emergency,
    Hackathons,
}

impl CollectionName {
    /// Every collection, in attach order.
    pub const ALL: [Self; 8] = [
        Self::Posts,
        Self::Applications,
        Self::Borrow,
        Self::Marketplace,
        Self::LostFound,
        Self::Help,
        Self::Emergency,
        Self::Hackathons,
    ];

    /// Every collection, in attach order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter()
    }

    /// Stable name used by remote stores and the CLI.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Applications => "applications",
            Self::Borrow => "borrow",
            Self::Marketplace => "marketplace",
            Self::LostFound => "lostfound",
            Self::Help => "help",
            Self::Emergency => "emergency",
            Self::Hackathons => "hackathons",
        }
    }

    /// Local persistence key holding the serialised collection.
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Posts => "uniconnect_posts",
            Self::Applications => "uniconnect_applications",
            Self::Borrow => "uniconnect_borrow",
            Self::Marketplace => "uniconnect_sell",
            Self::LostFound => "uniconnect_lostfound",
            Self::Help => "uniconnect_help",
            Self::Emergency => "uniconnect_emergency",
            Self::Hackathons => "uniconnect_hackathons",
        }
    }

    /// Display ordering of the collection.
    ///
    /// Everything is newest first except hackathons, which are listed by
    /// start date, soonest first.
    pub const fn ordering(self) -> CollectionOrdering {
        match self {
            Self::Hackathons => CollectionOrdering {
                field: "startDate",
                direction: SortDirection::Ascending,
            },
            Self::Applications => CollectionOrdering {
                field: "appliedAt",
                direction: SortDirection::Descending,
            },
            _ => CollectionOrdering {
                field: "createdAt",
                direction: SortDirection::Descending,
            },
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_lowercase();
        Self::all()
            .find(|c| c.as_str() == normalised)
            .ok_or_else(|| Error::invalid_request(format!("unknown collection: {value}")))
    }
}

/// Sort direction of a collection's ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Short form used in remote queries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// The field and direction a collection is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionOrdering {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Validation errors for [`EntityId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityIdValidationError {
    Empty,
    Padded,
    ContainsSlash,
}

impl fmt::Display for EntityIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "entity id must not be empty"),
            Self::Padded => write!(f, "entity id must not have surrounding whitespace"),
            Self::ContainsSlash => write!(f, "entity id must not contain '/'"),
        }
    }
}

impl std::error::Error for EntityIdValidationError {}

/// Identifier of an entity, unique within its collection.
///
/// Local mode generates identifiers; remote stores assign their own.
/// Identifiers end up in URL paths so `/` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and construct an identifier.
    pub fn new(id: impl AsRef<str>) -> Result<Self, EntityIdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(id: String) -> Result<Self, EntityIdValidationError> {
        if id.is_empty() {
            return Err(EntityIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(EntityIdValidationError::Padded);
        }
        if id.contains('/') {
            return Err(EntityIdValidationError::ContainsSlash);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn storage_keys_are_unique() {
        let keys: HashSet<_> = CollectionName::all().map(CollectionName::storage_key).collect();
        assert_eq!(keys.len(), CollectionName::ALL.len());
    }

    #[rstest]
    #[case(CollectionName::Marketplace, "uniconnect_sell")]
    #[case(CollectionName::LostFound, "uniconnect_lostfound")]
    #[case(CollectionName::Hackathons, "uniconnect_hackathons")]
    fn storage_keys_keep_portal_names(#[case] collection: CollectionName, #[case] key: &str) {
        assert_eq!(collection.storage_key(), key);
    }

    #[rstest]
    fn hackathons_order_by_start_date_ascending() {
        let ordering = CollectionName::Hackathons.ordering();
        assert_eq!(ordering.field, "startDate");
        assert_eq!(ordering.direction, SortDirection::Ascending);
    }

    #[rstest]
    #[case(CollectionName::Posts)]
    #[case(CollectionName::Emergency)]
    #[case(CollectionName::Borrow)]
    fn feeds_order_newest_first(#[case] collection: CollectionName) {
        let ordering = collection.ordering();
        assert_eq!(ordering.field, "createdAt");
        assert_eq!(ordering.direction, SortDirection::Descending);
    }

    #[rstest]
    #[case("posts", CollectionName::Posts)]
    #[case(" LostFound ", CollectionName::LostFound)]
    #[case("hackathons", CollectionName::Hackathons)]
    fn parses_collection_names(#[case] raw: &str, #[case] expected: CollectionName) {
        assert_eq!(raw.parse::<CollectionName>().expect("known collection"), expected);
    }

    #[rstest]
    fn rejects_unknown_collection_names() {
        assert!("sell".parse::<CollectionName>().is_err());
    }

    #[rstest]
    fn collection_names_serialise_like_as_str() {
        for collection in CollectionName::all() {
            let json = serde_json::to_value(collection).expect("serialise");
            assert_eq!(json, serde_json::json!(collection.as_str()));
        }
    }

    #[rstest]
    #[case("", EntityIdValidationError::Empty)]
    #[case("abc ", EntityIdValidationError::Padded)]
    #[case("a/b", EntityIdValidationError::ContainsSlash)]
    fn entity_id_rejects_invalid_values(
        #[case] raw: &str,
        #[case] expected: EntityIdValidationError,
    ) {
        assert_eq!(EntityId::new(raw), Err(expected));
    }

    #[rstest]
    fn entity_ids_accept_store_assigned_values() {
        let id = EntityId::new("1718030000000").expect("numeric ids are valid");
        assert_eq!(id.to_string(), "1718030000000");
    }
}
