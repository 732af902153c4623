//! Items for sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_text, require_text, require_title, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, UserId};

/// Condition of an item for sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

/// An item listed on the campus marketplace.
///
/// `is_sold` is terminal: no operation clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarketplaceItem {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub category: Option<String>,
    pub condition: Condition,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_id: UserId,
    pub seller_name: String,
    #[serde(default)]
    pub seller_email: Option<String>,
    pub is_sold: bool,
    #[serde(default)]
    pub buyer_id: Option<UserId>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User-supplied part of a new marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarketplaceDraft {
    pub title: String,
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub images: Vec<String>,
}

impl MarketplaceItem {
    pub(super) fn create(
        draft: MarketplaceDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        Ok(Self {
            id,
            title: require_title(&draft.title)?,
            description: require_text("description", &draft.description)?,
            price: draft.price,
            category: optional_text(draft.category),
            condition: draft.condition,
            images: draft.images,
            seller_id: actor.id.clone(),
            seller_name: actor.display_name.clone(),
            seller_email: actor.email.clone(),
            is_sold: false,
            buyer_id: None,
            buyer_name: None,
            created_at: now,
        })
    }

    /// Mark the item sold. Repeating is a no-op.
    pub fn mark_sold(&mut self) {
        self.is_sold = true;
    }

    /// Sell the item to `buyer`.
    pub fn sell_to(&mut self, buyer: &Actor) -> Result<(), Error> {
        if self.is_sold {
            return Err(Error::conflict("item has already been sold"));
        }
        self.is_sold = true;
        self.buyer_id = Some(buyer.id.clone());
        self.buyer_name = Some(buyer.display_name.clone());
        Ok(())
    }
}

impl Record for MarketplaceItem {
    const COLLECTION: CollectionName = CollectionName::Marketplace;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.seller_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_open(&self) -> bool {
        !self.is_sold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_fixtures::{actor, at};
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn item() -> MarketplaceItem {
        let draft = MarketplaceDraft {
            title: "Cycle".to_owned(),
            description: "Single speed, new tyres".to_owned(),
            price: 500,
            category: None,
            condition: Condition::Good,
            images: Vec::new(),
        };
        MarketplaceItem::create(draft, EntityId::new("m1").expect("id"), &actor("seller"), at(3, 12))
            .expect("valid draft")
    }

    #[rstest]
    fn marking_sold_twice_keeps_it_sold(mut item: MarketplaceItem) {
        item.mark_sold();
        item.mark_sold();
        assert!(item.is_sold);
        assert_eq!(item.price, 500);
        assert_eq!(item.condition, Condition::Good);
    }

    #[rstest]
    fn buying_records_the_buyer(mut item: MarketplaceItem) {
        item.sell_to(&actor("buyer")).expect("buy");
        assert!(item.is_sold);
        assert_eq!(item.buyer_id.as_ref().map(AsRef::as_ref), Some("buyer"));
    }

    #[rstest]
    fn buying_a_sold_item_conflicts(mut item: MarketplaceItem) {
        item.mark_sold();
        let err = item.sell_to(&actor("buyer")).expect_err("already sold");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(item.buyer_id.is_none());
    }

    #[rstest]
    fn condition_uses_kebab_case() {
        let json = serde_json::to_value(Condition::LikeNew).expect("serialise");
        assert_eq!(json, serde_json::json!("like-new"));
    }
}
