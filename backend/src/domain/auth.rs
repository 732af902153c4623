//! Sign-in and sign-up credentials.
//!
//! Inbound adapters build these from raw strings so that identity providers
//! only ever see a validated college address and a non-trivial password.

use std::fmt;

use zeroize::Zeroizing;

use super::{CollegeEmail, UserRole, UserValidationError};

/// Shortest password accepted at sign-up.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Errors returned when credential inputs are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// The e-mail address is malformed or not a college address.
    Email(UserValidationError),
    /// Password was empty.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_CHARS`].
    ShortPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) => write!(f, "{err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::ShortPassword => write!(
                f,
                "password must be at least {PASSWORD_MIN_CHARS} characters"
            ),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated e-mail and password pair.
///
/// ## Invariants
/// - `email` is a valid college address.
/// - `password` is non-empty and kept verbatim, whitespace included. It is
///   wiped from memory on drop.
///
/// # Examples
/// ```
/// use campus_hub::domain::Credentials;
///
/// let creds = Credentials::try_from_parts("ada@north.edu", "hunter22").expect("valid");
/// assert_eq!(creds.email().as_ref(), "ada@north.edu");
/// assert!(Credentials::try_from_parts("ada@gmail.com", "hunter22").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: CollegeEmail,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Validate raw sign-in inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = CollegeEmail::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &CollegeEmail {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up request: credentials plus the chosen role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    credentials: Credentials,
    role: UserRole,
}

impl SignUpRequest {
    /// Validate a sign-up, additionally enforcing the minimum password length.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Self, CredentialsValidationError> {
        let credentials = Credentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(CredentialsValidationError::ShortPassword);
        }
        Ok(Self { credentials, role })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn role(&self) -> UserRole {
        self.role
    }
}
