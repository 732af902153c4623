//! Account use-cases over an [`IdentityProvider`].
//!
//! The service is where the signed-in profile turns into the explicit
//! [`SessionContext`] that gateway calls take.

use std::sync::Arc;

use tracing::info;

use super::ports::{IdentityProvider, IdentityProviderError, TemporaryPassword};
use super::{CollegeEmail, Credentials, Error, ProfileUpdate, SessionContext, SignUpRequest, UserProfile};

pub struct AccountService<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for AccountService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> AccountService<P>
where
    P: IdentityProvider + ?Sized,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile, Error> {
        let profile = self
            .provider
            .sign_up(request)
            .await
            .map_err(map_identity_error)?;
        info!(uid = %profile.uid, role = %profile.role, "account created");
        Ok(profile)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<UserProfile, Error> {
        let profile = self
            .provider
            .sign_in(credentials)
            .await
            .map_err(map_identity_error)?;
        info!(uid = %profile.uid, "signed in");
        Ok(profile)
    }

    pub async fn reset_password(&self, email: &CollegeEmail) -> Result<TemporaryPassword, Error> {
        self.provider
            .reset_password(email)
            .await
            .map_err(map_identity_error)
    }

    pub async fn sign_out(&self) -> Result<(), Error> {
        self.provider.sign_out().await.map_err(map_identity_error)
    }

    pub async fn current_profile(&self) -> Result<Option<UserProfile>, Error> {
        self.provider.current_user().await.map_err(map_identity_error)
    }

    /// Merge `update` into the signed-in profile and mark it complete.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, Error> {
        self.provider
            .update_profile(update)
            .await
            .map_err(map_identity_error)
    }

    /// Session for the signed-in user, anonymous when nobody is signed in.
    pub async fn session(&self) -> Result<SessionContext, Error> {
        Ok(self
            .current_profile()
            .await?
            .map_or_else(SessionContext::anonymous, |profile| {
                SessionContext::signed_in(profile.actor())
            }))
    }
}

fn map_identity_error(error: IdentityProviderError) -> Error {
    let message = error.to_string();
    match error {
        IdentityProviderError::AccountExists { .. } => Error::conflict(message),
        IdentityProviderError::InvalidCredentials | IdentityProviderError::NotSignedIn => {
            Error::unauthorized(message)
        }
        IdentityProviderError::UnknownAccount { .. } => Error::not_found(message),
        IdentityProviderError::Storage { .. } => Error::internal(message),
        IdentityProviderError::Corrupt { .. } => Error::parse(message),
    }
}
