//! Port for account management and the signed-in session.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{CollegeEmail, Credentials, ProfileUpdate, SignUpRequest, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Sign-up for an address that already has an account.
        AccountExists { email: String } => "an account already exists for {email}",
        /// Wrong address or password.
        InvalidCredentials => "invalid email or password",
        /// Password reset for an address without an account.
        UnknownAccount { email: String } => "no account exists for {email}",
        /// The operation needs a signed-in user.
        NotSignedIn => "no user is signed in",
        /// The backing store failed.
        Storage { message: String } => "identity storage failed: {message}",
        /// Stored account data could not be decoded.
        Corrupt { message: String } => "identity data is corrupt: {message}",
    }
}

/// One-off password issued by a reset. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryPassword(Zeroizing<String>);

impl TemporaryPassword {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The password text, for showing to the account holder once.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for TemporaryPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemporaryPassword(<redacted>)")
    }
}

/// Accounts, credentials and the current session.
///
/// Signing up also signs the new user in. The session persists until
/// [`IdentityProvider::sign_out`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account with a blank profile and sign it in.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile, IdentityProviderError>;

    /// Check credentials and sign the account in.
    async fn sign_in(&self, credentials: &Credentials)
    -> Result<UserProfile, IdentityProviderError>;

    /// Replace the password of `email` with a random temporary one.
    async fn reset_password(
        &self,
        email: &CollegeEmail,
    ) -> Result<TemporaryPassword, IdentityProviderError>;

    /// End the current session. Signing out twice succeeds.
    async fn sign_out(&self) -> Result<(), IdentityProviderError>;

    /// Profile of the signed-in user, if any.
    async fn current_user(&self) -> Result<Option<UserProfile>, IdentityProviderError>;

    /// Merge `update` into the signed-in user's profile.
    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, IdentityProviderError>;
}

/// Provider with a fixed signed-in user and no accounts.
///
/// Useful where a session is needed but identity behaviour is not under
/// test.
#[derive(Debug, Clone, Default)]
pub struct FixtureIdentityProvider {
    profile: Option<UserProfile>,
}

impl FixtureIdentityProvider {
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile, IdentityProviderError> {
        Err(IdentityProviderError::account_exists(
            request.credentials().email().to_string(),
        ))
    }

    async fn sign_in(
        &self,
        _credentials: &Credentials,
    ) -> Result<UserProfile, IdentityProviderError> {
        Err(IdentityProviderError::invalid_credentials())
    }

    async fn reset_password(
        &self,
        email: &CollegeEmail,
    ) -> Result<TemporaryPassword, IdentityProviderError> {
        Err(IdentityProviderError::unknown_account(email.to_string()))
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<UserProfile>, IdentityProviderError> {
        Ok(self.profile.clone())
    }

    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, IdentityProviderError> {
        let mut profile = self
            .profile
            .clone()
            .ok_or_else(IdentityProviderError::not_signed_in)?;
        profile.apply_update(update.clone());
        Ok(profile)
    }
}
