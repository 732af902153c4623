//! Status-changing operations on existing entities.
//!
//! Each [`EntityPatch`] variant names one transition, which collection it
//! applies to and who may perform it. The gateway checks access against the
//! freshly read entity and then applies the transition, both inside the same
//! read-modify-write step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::{ApplicationStatus, Entity, HackathonStatus, PostEdit};
use super::{Actor, CollectionName, Error, UserId};

/// Who may perform a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The entity's owner.
    Owner,
    /// Anyone except the owner.
    NonOwner,
    /// The owner or the current borrower.
    OwnerOrBorrower,
    /// The owner of the post an application refers to.
    PostOwner,
    /// Any signed-in user.
    Anyone,
}

/// A typed status change, decoded from `{"op": "...", ...}` objects.
///
/// # Examples
/// ```
/// use campus_hub::domain::{CollectionName, EntityPatch};
///
/// let patch: EntityPatch = serde_json::from_str(r#"{"op":"markSold"}"#).expect("patch");
/// assert_eq!(patch.collection(), CollectionName::Marketplace);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EntityPatch {
    Edit(PostEdit),
    Approve,
    Reject,
    Borrow,
    Return,
    Claim,
    MarkSold,
    Buy,
    MarkResolved,
    Notify,
    Resolve,
    OfferHelp,
    Respond,
    Apply,
    Withdraw,
    SetStatus { status: HackathonStatus },
}

impl EntityPatch {
    /// Name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Edit(_) => "edit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Borrow => "borrow",
            Self::Return => "return",
            Self::Claim => "claim",
            Self::MarkSold => "markSold",
            Self::Buy => "buy",
            Self::MarkResolved => "markResolved",
            Self::Notify => "notify",
            Self::Resolve => "resolve",
            Self::OfferHelp => "offerHelp",
            Self::Respond => "respond",
            Self::Apply => "apply",
            Self::Withdraw => "withdraw",
            Self::SetStatus { .. } => "setStatus",
        }
    }

    /// Collection whose entities the patch applies to.
    pub const fn collection(&self) -> CollectionName {
        match self {
            Self::Edit(_) => CollectionName::Posts,
            Self::Approve | Self::Reject => CollectionName::Applications,
            Self::Borrow | Self::Return | Self::Claim => CollectionName::Borrow,
            Self::MarkSold | Self::Buy => CollectionName::Marketplace,
            Self::MarkResolved | Self::Notify => CollectionName::LostFound,
            Self::Resolve | Self::OfferHelp => CollectionName::Help,
            Self::Respond => CollectionName::Emergency,
            Self::Apply | Self::Withdraw | Self::SetStatus { .. } => CollectionName::Hackathons,
        }
    }

    /// Who may perform the patch.
    pub const fn access(&self) -> Access {
        match self {
            Self::Edit(_)
            | Self::MarkSold
            | Self::MarkResolved
            | Self::Resolve
            | Self::SetStatus { .. } => Access::Owner,
            Self::Borrow | Self::Claim | Self::Buy | Self::OfferHelp => Access::NonOwner,
            Self::Return => Access::OwnerOrBorrower,
            Self::Approve | Self::Reject => Access::PostOwner,
            Self::Notify | Self::Respond | Self::Apply | Self::Withdraw => Access::Anyone,
        }
    }

    /// Fail unless the patch targets `collection`.
    pub fn ensure_collection(&self, collection: CollectionName) -> Result<(), Error> {
        if self.collection() == collection {
            return Ok(());
        }
        Err(Error::invalid_request(format!(
            "{} does not apply to {collection}",
            self.name()
        ))
        .with_details(serde_json::json!({
            "op": self.name(),
            "collection": collection,
        })))
    }

    /// Check that `actor` may perform the patch on `entity`.
    ///
    /// `post_owner` must be supplied for [`Access::PostOwner`] patches.
    pub fn authorize(
        &self,
        entity: &Entity,
        actor: &Actor,
        post_owner: Option<&UserId>,
    ) -> Result<(), Error> {
        let is_owner = entity.owner_id() == &actor.id;
        let allowed = match self.access() {
            Access::Owner => is_owner,
            Access::NonOwner => !is_owner,
            Access::OwnerOrBorrower => match entity {
                Entity::Borrow(item) => is_owner || item.is_borrowed_by(&actor.id),
                _ => is_owner,
            },
            Access::PostOwner => {
                let Some(owner) = post_owner else {
                    return Err(Error::internal(format!(
                        "{} requires the owner of the referenced post",
                        self.name()
                    )));
                };
                owner == &actor.id
            }
            Access::Anyone => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::forbidden(format!("you may not {} this item", self.name()))
                .with_details(serde_json::json!({ "op": self.name(), "id": entity.id() })))
        }
    }

    /// Apply the transition to `entity`.
    ///
    /// On error the entity is left unchanged.
    pub fn apply(&self, entity: &mut Entity, actor: &Actor, now: DateTime<Utc>) -> Result<(), Error> {
        match (self, entity) {
            (Self::Edit(edit), Entity::Post(post)) => post.edit(edit),
            (Self::Approve, Entity::Application(application)) => {
                application.decide(ApplicationStatus::Approved)
            }
            (Self::Reject, Entity::Application(application)) => {
                application.decide(ApplicationStatus::Rejected)
            }
            (Self::Borrow, Entity::Borrow(item)) => item.lend_to(actor, now),
            (Self::Return, Entity::Borrow(item)) => item.mark_returned(now),
            (Self::Claim, Entity::Borrow(item)) => item.transfer_to(actor),
            (Self::MarkSold, Entity::Marketplace(item)) => {
                item.mark_sold();
                Ok(())
            }
            (Self::Buy, Entity::Marketplace(item)) => item.sell_to(actor),
            (Self::MarkResolved, Entity::LostFound(item)) => {
                item.mark_resolved();
                Ok(())
            }
            (Self::Notify, Entity::LostFound(item)) => {
                item.notify(&actor.id);
                Ok(())
            }
            (Self::Resolve, Entity::Help(request)) => {
                request.resolve();
                Ok(())
            }
            (Self::OfferHelp, Entity::Help(request)) => request.offer_help(&actor.id).map(drop),
            (Self::Respond, Entity::Emergency(alert)) => {
                alert.respond(&actor.id);
                Ok(())
            }
            (Self::Apply, Entity::Hackathon(hackathon)) => hackathon.apply(&actor.id).map(drop),
            (Self::Withdraw, Entity::Hackathon(hackathon)) => {
                hackathon.withdraw(&actor.id);
                Ok(())
            }
            (Self::SetStatus { status }, Entity::Hackathon(hackathon)) => {
                hackathon.advance_status(*status)
            }
            (patch, entity) => Err(Error::invalid_request(format!(
                "{} does not apply to {}",
                patch.name(),
                entity.collection()
            ))),
        }
    }
}
