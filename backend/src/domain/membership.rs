//! Set-valued user lists (applicants, respondents, notified users).

use serde::{Deserialize, Serialize};

use super::UserId;

/// Ordered list of user identifiers with set semantics.
///
/// ## Invariants
/// - [`MemberList::insert`] never introduces a duplicate.
/// - [`MemberList::remove`] removes every occurrence, so lists decoded from
///   older data that already held duplicates are cleaned up on withdraw.
///
/// # Examples
/// ```
/// use campus_hub::domain::{MemberList, UserId};
///
/// let u1 = UserId::new("u1").expect("user id");
/// let mut applicants = MemberList::default();
/// assert!(applicants.insert(u1.clone()));
/// assert!(!applicants.insert(u1.clone()));
/// assert_eq!(applicants.len(), 1);
/// assert!(applicants.remove(&u1));
/// assert!(applicants.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberList(Vec<UserId>);

impl MemberList {
    /// Add `user` unless already present. Returns whether the list changed.
    pub fn insert(&mut self, user: UserId) -> bool {
        if self.0.contains(&user) {
            return false;
        }
        self.0.push(user);
        true
    }

    /// Remove every occurrence of `user`. Returns whether the list changed.
    pub fn remove(&mut self, user: &UserId) -> bool {
        let before = self.0.len();
        self.0.retain(|member| member != user);
        self.0.len() != before
    }

    /// Whether `user` is a member.
    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    /// Members as a slice.
    pub fn as_slice(&self) -> &[UserId] {
        &self.0
    }
}

impl FromIterator<UserId> for MemberList {
    fn from_iter<T: IntoIterator<Item = UserId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
