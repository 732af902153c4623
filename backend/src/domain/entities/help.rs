//! Requests for help from other students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, MemberList, UserId};

/// State of a help request. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpStatus {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelpRequest {
    pub id: EntityId,
    pub request: String,
    pub category: String,
    pub requester_id: UserId,
    pub requester_name: String,
    #[serde(default)]
    pub helpers_notified: MemberList,
    pub status: HelpStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelpDraft {
    pub request: String,
    pub category: String,
}

impl HelpRequest {
    pub(super) fn create(
        draft: HelpDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        Ok(Self {
            id,
            request: require_text("request", &draft.request)?,
            category: require_text("category", &draft.category)?,
            requester_id: actor.id.clone(),
            requester_name: actor.display_name.clone(),
            helpers_notified: MemberList::default(),
            status: HelpStatus::Pending,
            created_at: now,
        })
    }

    pub fn resolve(&mut self) {
        self.status = HelpStatus::Resolved;
    }

    /// Volunteer `helper`. Rejected once the request is resolved.
    pub fn offer_help(&mut self, helper: &UserId) -> Result<bool, Error> {
        if self.status == HelpStatus::Resolved {
            return Err(Error::conflict("help request is already resolved"));
        }
        Ok(self.helpers_notified.insert(helper.clone()))
    }
}

impl Record for HelpRequest {
    const COLLECTION: CollectionName = CollectionName::Help;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.requester_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_open(&self) -> bool {
        self.status == HelpStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_fixtures::{actor, at};
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> HelpRequest {
        let draft = HelpDraft {
            request: "Need notes for DBMS unit 3".to_owned(),
            category: "academics".to_owned(),
        };
        HelpRequest::create(draft, EntityId::new("h1").expect("id"), &actor("u1"), at(6, 20))
            .expect("valid draft")
    }

    #[rstest]
    fn offers_are_deduplicated(mut request: HelpRequest) {
        let helper = UserId::new("u2").expect("id");
        assert!(request.offer_help(&helper).expect("offer"));
        assert!(!request.offer_help(&helper).expect("repeat offer"));
        assert_eq!(request.helpers_notified.len(), 1);
    }

    #[rstest]
    fn resolved_requests_refuse_offers(mut request: HelpRequest) {
        request.resolve();
        let err = request
            .offer_help(&UserId::new("u2").expect("id"))
            .expect_err("resolved");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(request.status, HelpStatus::Resolved);
    }
}
