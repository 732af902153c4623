//! Hackathons and their applicant lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{optional_text, require_text, require_title, Record};
use crate::domain::{Actor, CollectionName, EntityId, Error, MemberList, UserId};

/// Lifecycle of a hackathon. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HackathonStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// A hackathon announced by an organiser.
///
/// ## Invariants
/// - `applicants` holds each user at most once after [`Hackathon::apply`].
/// - Once `max_participants` is reached, new applicants are refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Hackathon {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub theme: String,
    pub prizes: String,
    pub organizer_id: UserId,
    pub organizer_name: String,
    #[serde(default)]
    pub organizer_email: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub applicants: MemberList,
    pub status: HackathonStatus,
    pub created_at: DateTime<Utc>,
}

/// User-supplied part of a new hackathon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HackathonDraft {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub prizes: String,
    #[serde(default)]
    pub max_participants: Option<u32>,
}

impl Hackathon {
    pub(super) fn create(
        draft: HackathonDraft,
        id: EntityId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        if draft.end_date < draft.start_date {
            return Err(Error::invalid_request("endDate must not be before startDate")
                .with_details(serde_json::json!({ "field": "endDate" })));
        }
        if draft.max_participants == Some(0) {
            return Err(Error::invalid_request("maxParticipants must be positive")
                .with_details(serde_json::json!({ "field": "maxParticipants" })));
        }
        Ok(Self {
            id,
            title: require_title(&draft.title)?,
            description: require_text("description", &draft.description)?,
            start_date: draft.start_date,
            end_date: draft.end_date,
            location: require_text("location", &draft.location)?,
            theme: optional_text(Some(draft.theme)).unwrap_or_default(),
            prizes: optional_text(Some(draft.prizes)).unwrap_or_default(),
            organizer_id: actor.id.clone(),
            organizer_name: actor.display_name.clone(),
            organizer_email: actor.email.clone(),
            max_participants: draft.max_participants,
            applicants: MemberList::default(),
            status: HackathonStatus::Upcoming,
            created_at: now,
        })
    }

    /// Add `user` to the applicants.
    ///
    /// Applying again succeeds without change. New applicants are refused
    /// once the hackathon is completed or full.
    pub fn apply(&mut self, user: &UserId) -> Result<bool, Error> {
        if self.applicants.contains(user) {
            return Ok(false);
        }
        if self.status == HackathonStatus::Completed {
            return Err(Error::conflict("hackathon has already finished"));
        }
        if let Some(max) = self.max_participants {
            if self.applicants.len() >= max as usize {
                return Err(Error::conflict("hackathon is full")
                    .with_details(serde_json::json!({ "maxParticipants": max })));
            }
        }
        Ok(self.applicants.insert(user.clone()))
    }

    /// Remove every occurrence of `user` from the applicants.
    pub fn withdraw(&mut self, user: &UserId) -> bool {
        self.applicants.remove(user)
    }

    /// Move the lifecycle forward. Setting the current status is a no-op.
    pub fn advance_status(&mut self, status: HackathonStatus) -> Result<(), Error> {
        if status < self.status {
            return Err(Error::conflict(format!(
                "hackathon status cannot move back to {}",
                status_name(status)
            )));
        }
        self.status = status;
        Ok(())
    }
}

fn status_name(status: HackathonStatus) -> &'static str {
    match status {
        HackathonStatus::Upcoming => "upcoming",
        HackathonStatus::Ongoing => "ongoing",
        HackathonStatus::Completed => "completed",
    }
}

impl Record for Hackathon {
    const COLLECTION: CollectionName = CollectionName::Hackathons;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn owner_id(&self) -> &UserId {
        &self.organizer_id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.start_date
    }

    fn is_open(&self) -> bool {
        self.status != HackathonStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_fixtures::{actor, at};
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    fn user(raw: &str) -> UserId {
        UserId::new(raw).expect("user id")
    }

    fn draft(max_participants: Option<u32>) -> HackathonDraft {
        HackathonDraft {
            title: "Build for campus".to_owned(),
            description: "24 hours of hacking".to_owned(),
            start_date: at(20, 9),
            end_date: at(21, 9),
            location: "Main auditorium".to_owned(),
            theme: "Sustainability".to_owned(),
            prizes: "Rs 50,000".to_owned(),
            max_participants,
        }
    }

    #[fixture]
    fn hackathon() -> Hackathon {
        Hackathon::create(draft(None), EntityId::new("hk1").expect("id"), &actor("org"), at(1, 9))
            .expect("valid draft")
    }

    #[rstest]
    fn end_before_start_is_rejected() {
        let mut reversed = draft(None);
        reversed.end_date = at(19, 9);
        let err = Hackathon::create(reversed, EntityId::random(), &actor("org"), at(1, 9))
            .expect_err("reversed dates");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn apply_then_withdraw(mut hackathon: Hackathon) {
        hackathon.apply(&user("u1")).expect("apply");
        assert_eq!(hackathon.applicants.as_slice(), &[user("u1")]);
        hackathon.withdraw(&user("u1"));
        assert!(hackathon.applicants.is_empty());
    }

    #[rstest]
    fn applying_twice_keeps_one_entry(mut hackathon: Hackathon) {
        assert!(hackathon.apply(&user("u1")).expect("apply"));
        assert!(!hackathon.apply(&user("u1")).expect("repeat apply"));
        assert_eq!(hackathon.applicants.len(), 1);
    }

    #[rstest]
    fn full_hackathons_refuse_new_applicants() {
        let mut small = Hackathon::create(
            draft(Some(1)),
            EntityId::random(),
            &actor("org"),
            at(1, 9),
        )
        .expect("valid draft");
        small.apply(&user("u1")).expect("first seat");
        let err = small.apply(&user("u2")).expect_err("full");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(!small.apply(&user("u1")).expect("existing applicant"));
    }

    #[rstest]
    fn completed_hackathons_refuse_new_applicants(mut hackathon: Hackathon) {
        hackathon
            .advance_status(HackathonStatus::Completed)
            .expect("complete");
        let err = hackathon.apply(&user("u1")).expect_err("finished");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    fn status_only_moves_forward(mut hackathon: Hackathon) {
        hackathon.advance_status(HackathonStatus::Ongoing).expect("start");
        hackathon.advance_status(HackathonStatus::Ongoing).expect("repeat");
        let err = hackathon
            .advance_status(HackathonStatus::Upcoming)
            .expect_err("backwards");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(hackathon.status, HackathonStatus::Ongoing);
    }

    #[rstest]
    fn orders_by_start_date(hackathon: Hackathon) {
        assert_eq!(hackathon.order_key(), at(20, 9));
    }
}
