//! Lend and give-away listings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_text, require_text, require_title, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, UserId};

/// Lending state of an item.
///
/// `Returned` only appears in older data and is treated as available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Available,
    Borrowed,
    Returned,
}

impl BorrowStatus {
    /// Whether the item can be borrowed or claimed.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available | Self::Returned)
    }
}

/// Whether the owner lends the item or gives it away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowKind {
    #[default]
    Borrow,
    Give,
}

/// An item offered for lending or as a give-away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BorrowItem {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub owner_id: UserId,
    pub owner_name: String,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub borrower_id: Option<UserId>,
    #[serde(default)]
    pub borrower_name: Option<String>,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
    #[serde(default)]
    pub available_to: Option<NaiveDate>,
    pub status: BorrowStatus,
    #[serde(default)]
    pub is_friend_only: bool,
    #[serde(rename = "type")]
    pub kind: BorrowKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub borrow_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
}

/// User-supplied part of a new listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BorrowDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
    #[serde(default)]
    pub available_to: Option<NaiveDate>,
    #[serde(default)]
    pub is_friend_only: bool,
    #[serde(rename = "type", default)]
    pub kind: BorrowKind,
}

impl BorrowItem {
    pub(super) fn create(
        draft: BorrowDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if let (Some(from), Some(to)) = (draft.available_from, draft.available_to) {
            if to < from {
                return Err(Error::invalid_request(
                    "availableTo must not be before availableFrom",
                )
                .with_details(serde_json::json!({ "field": "availableTo" })));
            }
        }
        Ok(Self {
            id,
            title: require_title(&draft.title)?,
            description: require_text("description", &draft.description)?,
            category: optional_text(draft.category),
            owner_id: actor.id.clone(),
            owner_name: actor.display_name.clone(),
            owner_email: actor.email.clone(),
            owner_phone: optional_text(draft.owner_phone),
            borrower_id: None,
            borrower_name: None,
            price: draft.price,
            available_from: draft.available_from,
            available_to: draft.available_to,
            status: BorrowStatus::Available,
            is_friend_only: draft.is_friend_only,
            kind: draft.kind,
            created_at: now,
            borrow_date: None,
            return_date: None,
        })
    }

    /// Lend the item to `borrower`.
    pub fn lend_to(&mut self, borrower: &Actor, now: DateTime<Utc>) -> Result<(), Error> {
        if self.kind != BorrowKind::Borrow {
            return Err(Error::conflict("give-away items are claimed, not borrowed"));
        }
        if !self.status.is_available() {
            return Err(Error::conflict("item is already borrowed"));
        }
        self.status = BorrowStatus::Borrowed;
        self.borrower_id = Some(borrower.id.clone());
        self.borrower_name = Some(borrower.display_name.clone());
        self.borrow_date = Some(now);
        self.return_date = None;
        Ok(())
    }

    /// Mark the item returned and available again.
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != BorrowStatus::Borrowed {
            return Err(Error::conflict("item is not borrowed"));
        }
        self.status = BorrowStatus::Available;
        self.borrower_id = None;
        self.borrower_name = None;
        self.return_date = Some(now);
        Ok(())
    }

    /// Transfer a give-away item to `claimant`. The item stays available.
    pub fn transfer_to(&mut self, claimant: &Actor) -> Result<(), Error> {
        if self.kind != BorrowKind::Give {
            return Err(Error::conflict("only give-away items can be claimed"));
        }
        if !self.status.is_available() {
            return Err(Error::conflict("item is not available"));
        }
        self.owner_id = claimant.id.clone();
        self.owner_name = claimant.display_name.clone();
        self.owner_email = claimant.email.clone();
        self.owner_phone = None;
        self.status = BorrowStatus::Available;
        Ok(())
    }

    /// Whether `user` currently holds the item.
    pub fn is_borrowed_by(&self, user: &UserId) -> bool {
        self.borrower_id.as_ref() == Some(user)
    }
}

impl Record for BorrowItem {
    const COLLECTION: CollectionName = CollectionName::Borrow;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_open(&self) -> bool {
        self.status.is_available()
    }
}
