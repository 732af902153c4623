//! User identity, profile and the acting-user context.
//!
//! The signed-in user is never held in a global. Callers resolve a
//! [`SessionContext`] from the identity provider and hand the resulting
//! [`Actor`] to every gateway operation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Error;

/// Validation errors returned by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    PaddedId,
    InvalidEmail,
    NonCollegeEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::PaddedId => write!(f, "user id must not have surrounding whitespace"),
            Self::InvalidEmail => write!(f, "email address is malformed"),
            Self::NonCollegeEmail => write!(
                f,
                "please use a valid college email (.edu, .edu.in, .ac.in)"
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier.
///
/// Identity providers own the format; the domain only requires a non-empty
/// string without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::PaddedId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Campus role chosen at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Faculty,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => f.write_str("student"),
            Self::Faculty => f.write_str("faculty"),
        }
    }
}

/// Domains accepted as college addresses.
const COLLEGE_EMAIL_SUFFIXES: [&str; 3] = [".edu", ".edu.in", ".ac.in"];

/// A college e-mail address.
///
/// ## Invariants
/// - Exactly one `@` with non-empty local and domain parts.
/// - The domain ends with `.edu`, `.edu.in` or `.ac.in` (case-insensitive).
///
/// # Examples
/// ```
/// use campus_hub::domain::CollegeEmail;
///
/// assert!(CollegeEmail::new("ada@cs.example.edu").is_ok());
/// assert!(CollegeEmail::new("ada@example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollegeEmail(String);

impl CollegeEmail {
    /// Validate and construct a college address.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let trimmed = email.trim();
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        let lowered = trimmed.to_lowercase();
        if !COLLEGE_EMAIL_SUFFIXES
            .iter()
            .any(|suffix| lowered.ends_with(suffix))
        {
            return Err(UserValidationError::NonCollegeEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Part before the `@`, used as a fallback display name.
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }

    /// Case-insensitive comparison key.
    pub fn normalised(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for CollegeEmail {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CollegeEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CollegeEmail> for String {
    fn from(value: CollegeEmail) -> Self {
        value.0
    }
}

impl TryFrom<String> for CollegeEmail {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Profile of a signed-up user, as persisted by identity providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: CollegeEmail,
    pub college: String,
    pub role: UserRole,
    pub department: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
    pub profile_complete: bool,
}

impl UserProfile {
    /// Blank profile created at sign-up.
    pub fn new(uid: UserId, email: CollegeEmail, role: UserRole, created_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            name: String::new(),
            email,
            college: String::new(),
            role,
            department: String::new(),
            branch: String::new(),
            year: (role == UserRole::Student).then(String::new),
            created_at,
            profile_complete: false,
        }
    }

    /// Merge the supplied fields and mark the profile complete.
    pub fn apply_update(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            name,
            college,
            department,
            branch,
            year,
        } = update;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(college) = college {
            self.college = college;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(branch) = branch {
            self.branch = branch;
        }
        if year.is_some() {
            self.year = year;
        }
        self.profile_complete = true;
    }

    /// The acting-user view of this profile.
    pub fn actor(&self) -> Actor {
        let display_name = if self.name.trim().is_empty() {
            self.email.local_part().to_owned()
        } else {
            self.name.trim().to_owned()
        };
        Actor {
            id: self.uid.clone(),
            display_name,
            email: Some(self.email.to_string()),
            role: self.role,
            college: self.college.clone(),
        }
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

/// The user on whose behalf a gateway operation runs.
///
/// Ownership fields of new entities are copied from the actor, and
/// owner-restricted transitions compare against [`Actor::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub display_name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub college: String,
}

impl Actor {
    /// Build an actor without a backing profile, mainly for seeding and tests.
    pub fn new(id: UserId, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: None,
            role,
            college: String::new(),
        }
    }

    /// Attach the actor's college.
    pub fn with_college(mut self, college: impl Into<String>) -> Self {
        self.college = college.into();
        self
    }
}

/// Explicit session context passed to callers instead of ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    actor: Option<Actor>,
}

impl SessionContext {
    /// Context with no signed-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a signed-in user.
    pub fn signed_in(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// The signed-in user, if any.
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// The signed-in user, or [`ErrorCode::Unauthorized`](super::ErrorCode).
    pub fn require_actor(&self) -> Result<&Actor, Error> {
        self.actor
            .as_ref()
            .ok_or_else(|| Error::unauthorized("sign in to continue"))
    }
}
