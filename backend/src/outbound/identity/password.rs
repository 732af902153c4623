//! Salted password digests and temporary passwords.

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const SALT_BYTES: usize = 16;
const TEMPORARY_PASSWORD_CHARS: usize = 12;

/// Stored form of a password: hex salt plus hex SHA-256 of salt and password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordDigest {
    salt: String,
    digest: String,
}

impl PasswordDigest {
    /// Digest `password` under a fresh random salt.
    pub(super) fn create(password: &str) -> Self {
        let salt: [u8; SALT_BYTES] = thread_rng().r#gen();
        Self {
            salt: hex::encode(salt),
            digest: digest(&salt, password),
        }
    }

    /// Whether `password` produces the stored digest.
    ///
    /// The comparison visits every byte whatever the first mismatch.
    pub(super) fn matches(&self, password: &str) -> bool {
        let (Ok(salt), Ok(stored)) = (hex::decode(&self.salt), hex::decode(&self.digest)) else {
            return false;
        };
        let computed = raw_digest(&salt, password);
        stored.len() == computed.len()
            && stored
                .iter()
                .zip(computed.iter())
                .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
                == 0
    }
}

fn raw_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn digest(salt: &[u8], password: &str) -> String {
    hex::encode(raw_digest(salt, password))
}

/// Random alphanumeric password handed out by a reset.
pub(super) fn temporary_password() -> Zeroizing<String> {
    Zeroizing::new(
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TEMPORARY_PASSWORD_CHARS)
            .map(char::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_verify_only_the_original_password() {
        let stored = PasswordDigest::create("hunter22");
        assert!(stored.matches("hunter22"));
        assert!(!stored.matches("hunter23"));
        assert!(!stored.matches(""));
    }

    #[test]
    fn salts_differ_between_digests() {
        let first = PasswordDigest::create("hunter22");
        let second = PasswordDigest::create("hunter22");
        assert_ne!(first, second);
        assert_eq!(first.digest.len(), 64);
    }

    #[test]
    fn corrupt_salts_never_match() {
        let stored = PasswordDigest {
            salt: "zz".to_owned(),
            digest: String::new(),
        };
        assert!(!stored.matches(""));
    }

    #[test]
    fn digests_differing_in_one_byte_do_not_match() {
        let mut stored = PasswordDigest::create("hunter22");
        let mut bytes = hex::decode(&stored.digest).expect("hex digest");
        bytes[31] ^= 0x01;
        stored.digest = hex::encode(bytes);
        assert!(!stored.matches("hunter22"));

        stored.digest.truncate(62);
        assert!(!stored.matches("hunter22"));
    }

    #[test]
    fn temporary_passwords_are_alphanumeric() {
        let password = temporary_password();
        assert_eq!(password.len(), TEMPORARY_PASSWORD_CHARS);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
