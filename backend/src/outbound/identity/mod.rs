//! Identity provider persisted in the local key-value store.
//!
//! Accounts live under `uniconnect_users` as a JSON array of profiles with
//! their password digests; the signed-in profile lives under
//! `uniconnect_user`. Both keys sit next to the entity collections, so a
//! local session survives restarts.

mod password;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, KeyValueStore, KeyValueStoreError, TemporaryPassword,
};
use crate::domain::{CollegeEmail, Credentials, ProfileUpdate, SignUpRequest, UserId, UserProfile};

use self::password::{PasswordDigest, temporary_password};

/// Key holding every account.
pub const ACCOUNTS_KEY: &str = "uniconnect_users";
/// Key holding the signed-in profile.
pub const SESSION_KEY: &str = "uniconnect_user";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    #[serde(flatten)]
    profile: UserProfile,
    password: PasswordDigest,
}

/// [`IdentityProvider`] over a [`KeyValueStore`].
pub struct LocalIdentityProvider<K> {
    kv: Arc<K>,
    clock: Arc<dyn Clock>,
    accounts_lock: Mutex<()>,
}

impl<K> LocalIdentityProvider<K>
where
    K: KeyValueStore,
{
    pub fn new(kv: Arc<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            accounts_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.accounts_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_accounts(&self) -> Result<Vec<AccountRecord>, IdentityProviderError> {
        let Some(raw) = self.kv.get(ACCOUNTS_KEY).map_err(map_kv_error)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .map_err(|err| IdentityProviderError::corrupt(format!("{ACCOUNTS_KEY}: {err}")))
    }

    fn store_accounts(&self, accounts: &[AccountRecord]) -> Result<(), IdentityProviderError> {
        let raw = serde_json::to_string(accounts)
            .map_err(|err| IdentityProviderError::storage(err.to_string()))?;
        self.kv.set(ACCOUNTS_KEY, &raw).map_err(map_kv_error)
    }

    fn load_session(&self) -> Result<Option<UserProfile>, IdentityProviderError> {
        let Some(raw) = self.kv.get(SESSION_KEY).map_err(map_kv_error)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| IdentityProviderError::corrupt(format!("{SESSION_KEY}: {err}")))
    }

    fn store_session(&self, profile: &UserProfile) -> Result<(), IdentityProviderError> {
        let raw = serde_json::to_string(profile)
            .map_err(|err| IdentityProviderError::storage(err.to_string()))?;
        self.kv.set(SESSION_KEY, &raw).map_err(map_kv_error)
    }
}

fn same_address(record: &AccountRecord, email: &CollegeEmail) -> bool {
    record.profile.email.normalised() == email.normalised()
}

fn map_kv_error(error: KeyValueStoreError) -> IdentityProviderError {
    IdentityProviderError::storage(error.to_string())
}

#[async_trait]
impl<K> IdentityProvider for LocalIdentityProvider<K>
where
    K: KeyValueStore,
{
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile, IdentityProviderError> {
        let credentials = request.credentials();
        let _guard = self.lock();
        let mut accounts = self.load_accounts()?;
        if accounts
            .iter()
            .any(|record| same_address(record, credentials.email()))
        {
            return Err(IdentityProviderError::account_exists(
                credentials.email().to_string(),
            ));
        }
        let profile = UserProfile::new(
            UserId::random(),
            credentials.email().clone(),
            request.role(),
            self.clock.utc(),
        );
        accounts.push(AccountRecord {
            profile: profile.clone(),
            password: PasswordDigest::create(credentials.password()),
        });
        self.store_accounts(&accounts)?;
        self.store_session(&profile)?;
        info!(uid = %profile.uid, "local account created");
        Ok(profile)
    }

    async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<UserProfile, IdentityProviderError> {
        let profile = {
            let _guard = self.lock();
            self.load_accounts()?
                .into_iter()
                .find(|record| {
                    same_address(record, credentials.email())
                        && record.password.matches(credentials.password())
                })
                .map(|record| record.profile)
        };
        let Some(profile) = profile else {
            warn!("local sign-in rejected");
            return Err(IdentityProviderError::invalid_credentials());
        };
        self.store_session(&profile)?;
        Ok(profile)
    }

    async fn reset_password(
        &self,
        email: &CollegeEmail,
    ) -> Result<TemporaryPassword, IdentityProviderError> {
        let _guard = self.lock();
        let mut accounts = self.load_accounts()?;
        let record = accounts
            .iter_mut()
            .find(|record| same_address(record, email))
            .ok_or_else(|| IdentityProviderError::unknown_account(email.to_string()))?;
        let temporary = temporary_password();
        record.password = PasswordDigest::create(&temporary);
        let uid = record.profile.uid.clone();
        self.store_accounts(&accounts)?;
        info!(%uid, "password reset");
        Ok(TemporaryPassword::new(temporary.as_str()))
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        self.kv.remove(SESSION_KEY).map_err(map_kv_error)
    }

    async fn current_user(&self) -> Result<Option<UserProfile>, IdentityProviderError> {
        self.load_session()
    }

    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, IdentityProviderError> {
        let mut profile = self
            .load_session()?
            .ok_or_else(IdentityProviderError::not_signed_in)?;
        profile.apply_update(update.clone());

        let _guard = self.lock();
        let mut accounts = self.load_accounts()?;
        if let Some(record) = accounts
            .iter_mut()
            .find(|record| record.profile.uid == profile.uid)
        {
            record.profile = profile.clone();
            self.store_accounts(&accounts)?;
        }
        self.store_session(&profile)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::domain::ports::FixtureKeyValueStore;
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    type Provider = LocalIdentityProvider<FixtureKeyValueStore>;

    #[fixture]
    fn kv() -> Arc<FixtureKeyValueStore> {
        Arc::new(FixtureKeyValueStore::default())
    }

    fn provider(kv: &Arc<FixtureKeyValueStore>) -> Provider {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .returning(|| Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).single().expect("time"));
        LocalIdentityProvider::new(Arc::clone(kv), Arc::new(clock))
    }

    fn sign_up_request(email: &str) -> SignUpRequest {
        SignUpRequest::try_from_parts(email, "hunter22", UserRole::Student).expect("valid")
    }

    #[rstest]
    #[tokio::test]
    async fn sign_up_signs_in_and_survives_restart(kv: Arc<FixtureKeyValueStore>) {
        let created = provider(&kv)
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect("sign up");
        assert!(!created.profile_complete);

        let restarted = provider(&kv);
        assert_eq!(restarted.current_user().await.expect("current"), Some(created));
    }

    #[rstest]
    #[tokio::test]
    async fn addresses_are_unique_ignoring_case(kv: Arc<FixtureKeyValueStore>) {
        let provider = provider(&kv);
        provider
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect("first");
        let err = provider
            .sign_up(&sign_up_request("ADA@north.edu"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, IdentityProviderError::AccountExists { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn sign_in_checks_the_password(kv: Arc<FixtureKeyValueStore>) {
        let provider = provider(&kv);
        provider
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect("sign up");
        provider.sign_out().await.expect("sign out");

        let wrong = Credentials::try_from_parts("ada@north.edu", "hunter23").expect("valid");
        assert_eq!(
            provider.sign_in(&wrong).await.expect_err("wrong password"),
            IdentityProviderError::InvalidCredentials
        );
        assert!(provider.current_user().await.expect("current").is_none());

        let right = Credentials::try_from_parts("ada@north.edu", "hunter22").expect("valid");
        provider.sign_in(&right).await.expect("sign in");
        assert!(provider.current_user().await.expect("current").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn reset_replaces_the_password(kv: Arc<FixtureKeyValueStore>) {
        let provider = provider(&kv);
        provider
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect("sign up");
        let email = CollegeEmail::new("ada@north.edu").expect("email");

        let temporary = provider.reset_password(&email).await.expect("reset");
        let old = Credentials::try_from_parts("ada@north.edu", "hunter22").expect("valid");
        assert!(provider.sign_in(&old).await.is_err());
        let new = Credentials::try_from_parts("ada@north.edu", temporary.expose()).expect("valid");
        provider.sign_in(&new).await.expect("temporary password works");

        let unknown = CollegeEmail::new("bob@north.edu").expect("email");
        assert!(matches!(
            provider.reset_password(&unknown).await,
            Err(IdentityProviderError::UnknownAccount { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn profile_updates_reach_session_and_account(kv: Arc<FixtureKeyValueStore>) {
        let provider = provider(&kv);
        provider
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect("sign up");
        let update = ProfileUpdate {
            name: Some("Ada Lovelace".to_owned()),
            college: Some("North Campus Institute".to_owned()),
            ..ProfileUpdate::default()
        };

        let updated = provider.update_profile(&update).await.expect("update");
        assert!(updated.profile_complete);
        assert_eq!(updated.actor().display_name, "Ada Lovelace");

        provider.sign_out().await.expect("sign out");
        let credentials = Credentials::try_from_parts("ada@north.edu", "hunter22").expect("valid");
        let signed_in = provider.sign_in(&credentials).await.expect("sign in");
        assert_eq!(signed_in.name, "Ada Lovelace");
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_account_data_is_reported() {
        let kv = Arc::new(FixtureKeyValueStore::with_entry(ACCOUNTS_KEY, "{not json"));
        let err = provider(&kv)
            .sign_up(&sign_up_request("ada@north.edu"))
            .await
            .expect_err("corrupt");
        assert!(matches!(err, IdentityProviderError::Corrupt { .. }));
    }
}
