//! Generated content seed types.
//!
//! These types are independent of backend domain types; the backend turns
//! them into drafts at the point of use so seeded content passes the same
//! validation as user input.

use serde::{Deserialize, Serialize};

/// Announcement category for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKindSeed {
    /// Hackathon announcement.
    Hackathon,
    /// Freshers' event.
    Freshers,
    /// Flash mob.
    Flashmob,
    /// Placement drive.
    Placement,
    /// Internship opening.
    Internship,
    /// Topper recognition.
    Topper,
    /// Anything else.
    Others,
}

impl PostKindSeed {
    /// Every post kind, in a fixed order.
    pub const ALL: [Self; 7] = [
        Self::Hackathon,
        Self::Freshers,
        Self::Flashmob,
        Self::Placement,
        Self::Internship,
        Self::Topper,
        Self::Others,
    ];

    /// Whether students may apply to posts of this kind.
    #[must_use]
    pub const fn accepts_applications(self) -> bool {
        matches!(self, Self::Hackathon | Self::Placement | Self::Internship)
    }
}

/// Condition of a generated marketplace listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionSeed {
    /// Unused.
    New,
    /// Barely used.
    LikeNew,
    /// Used with light wear.
    Good,
    /// Visible wear.
    Fair,
    /// Heavily used.
    Poor,
}

impl ConditionSeed {
    /// Every condition, in a fixed order.
    pub const ALL: [Self; 5] = [Self::New, Self::LikeNew, Self::Good, Self::Fair, Self::Poor];
}

/// A generated announcement post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSeed {
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Announcement category.
    pub kind: PostKindSeed,
    /// Whether the post accepts applications.
    pub apply_enabled: bool,
    /// College the post belongs to.
    pub college: String,
}

/// A generated marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSeed {
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: String,
    /// Asking price in whole currency units.
    pub price: u32,
    /// Item condition.
    pub condition: ConditionSeed,
}

/// A generated hackathon listing.
///
/// Dates are relative so the consumer can anchor them to its own clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackathonSeed {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Event theme.
    pub theme: String,
    /// Venue.
    pub location: String,
    /// Prize summary.
    pub prizes: String,
    /// Days from the anchor date until the event starts.
    pub starts_in_days: u32,
    /// Event length in days, at least one.
    pub duration_days: u32,
    /// Optional participant cap.
    pub max_participants: Option<u32>,
}

/// Everything generated for one seed definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoContent {
    /// Generated announcement posts.
    pub posts: Vec<PostSeed>,
    /// Generated marketplace listings.
    pub listings: Vec<ListingSeed>,
    /// Generated hackathons.
    pub hackathons: Vec<HackathonSeed>,
}

impl DemoContent {
    /// Total number of generated records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len() + self.listings.len() + self.hackathons.len()
    }

    /// Whether nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
