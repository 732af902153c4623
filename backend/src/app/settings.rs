//! Hub configuration loaded via OrthoConfig.
//!
//! Values come from `CAMPUS_HUB_*` environment variables, a config file or
//! command-line flags. The store mode is read once when the hub is built
//! and holds for the whole session.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::domain::{DEFAULT_CAS_ATTEMPTS, Error, StoreMode, WriteConsistency};

const DEFAULT_DATA_DIR: &str = ".campus-hub";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Configuration values for one hub session.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CAMPUS_HUB")]
pub struct HubSettings {
    /// Use the remote document store instead of local files.
    #[ortho_config(default = false)]
    pub use_remote: bool,
    /// Directory for local collections and the signed-in session.
    pub data_dir: Option<PathBuf>,
    /// Base URL of the remote document API.
    pub remote_endpoint: Option<String>,
    /// API key sent with every remote request.
    pub remote_api_key: Option<String>,
    /// Remote project holding the collections.
    pub remote_project_id: Option<String>,
    /// `last-write-wins` (default) or `compare-and-swap`.
    pub write_consistency: Option<String>,
    /// Attempt budget for compare-and-swap updates.
    pub cas_max_attempts: Option<u32>,
    /// Delay between polls of remote live queries.
    pub poll_interval_ms: Option<u64>,
}

/// Complete remote connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub endpoint: Url,
    pub api_key: String,
    pub project_id: String,
}

impl HubSettings {
    pub fn store_mode(&self) -> StoreMode {
        StoreMode::from_flag(self.use_remote)
    }

    /// Data directory, falling back to `.campus-hub`.
    pub fn data_dir(&self) -> Result<Utf8PathBuf, Error> {
        let path = self
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Utf8PathBuf::from_path_buf(path).map_err(|path| {
            Error::configuration("data directory must be valid UTF-8")
                .with_details(json!({ "dataDir": path.to_string_lossy() }))
        })
    }

    pub fn write_consistency(&self) -> Result<WriteConsistency, Error> {
        let attempts = self.cas_max_attempts.unwrap_or(DEFAULT_CAS_ATTEMPTS);
        self.write_consistency
            .as_deref()
            .map_or(Ok(WriteConsistency::LastWriteWins), |raw| {
                WriteConsistency::from_setting(raw, attempts)
            })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Endpoint, key and project for remote mode.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming every missing value, or when the
    /// endpoint is not an absolute HTTP(S) URL.
    pub fn remote_credentials(&self) -> Result<RemoteCredentials, Error> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let endpoint = present(&self.remote_endpoint);
        let api_key = present(&self.remote_api_key);
        let project_id = present(&self.remote_project_id);

        let (Some(endpoint), Some(api_key), Some(project_id)) = (endpoint, api_key, project_id)
        else {
            let missing: Vec<&str> = [
                ("remote_endpoint", &self.remote_endpoint),
                ("remote_api_key", &self.remote_api_key),
                ("remote_project_id", &self.remote_project_id),
            ]
            .into_iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(name, _)| name)
            .collect();
            return Err(
                Error::configuration("remote mode needs an endpoint, API key and project id")
                    .with_details(json!({ "missing": missing })),
            );
        };

        let endpoint = Url::parse(&endpoint).map_err(|err| {
            Error::configuration(format!("remote endpoint is not a valid URL: {err}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(Error::configuration(
                "remote endpoint must be an http or https URL",
            ));
        }
        Ok(RemoteCredentials {
            endpoint,
            api_key,
            project_id,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for hub configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use crate::domain::ErrorCode;
    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "CAMPUS_HUB_USE_REMOTE",
        "CAMPUS_HUB_DATA_DIR",
        "CAMPUS_HUB_REMOTE_ENDPOINT",
        "CAMPUS_HUB_REMOTE_API_KEY",
        "CAMPUS_HUB_REMOTE_PROJECT_ID",
        "CAMPUS_HUB_WRITE_CONSISTENCY",
        "CAMPUS_HUB_CAS_MAX_ATTEMPTS",
        "CAMPUS_HUB_POLL_INTERVAL_MS",
    ];

    fn load_from_empty_args() -> HubSettings {
        HubSettings::load_from_iter([OsString::from("campus-hub")]).expect("config should load")
    }

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|var| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == var)
                    .map(|(_, value)| (*value).to_owned());
                (*var, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_select_local_mode() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.store_mode(), StoreMode::Local);
        assert_eq!(settings.data_dir().expect("dir"), Utf8PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            settings.write_consistency().expect("consistency"),
            WriteConsistency::LastWriteWins
        );
        assert_eq!(settings.poll_interval(), Duration::from_millis(2_000));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("CAMPUS_HUB_USE_REMOTE", "true"),
            ("CAMPUS_HUB_REMOTE_ENDPOINT", "https://docs.example.test"),
            ("CAMPUS_HUB_REMOTE_API_KEY", "k-123"),
            ("CAMPUS_HUB_REMOTE_PROJECT_ID", "north-campus"),
            ("CAMPUS_HUB_WRITE_CONSISTENCY", "compare-and-swap"),
            ("CAMPUS_HUB_CAS_MAX_ATTEMPTS", "3"),
            ("CAMPUS_HUB_POLL_INTERVAL_MS", "500"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.store_mode(), StoreMode::Remote);
        assert_eq!(
            settings.write_consistency().expect("consistency"),
            WriteConsistency::CompareAndSwap { max_attempts: 3 }
        );
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
        let credentials = settings.remote_credentials().expect("complete");
        assert_eq!(credentials.project_id, "north-campus");
        assert_eq!(credentials.endpoint.as_str(), "https://docs.example.test/");
    }

    #[rstest]
    fn missing_remote_values_are_named() {
        let _guard = lock_env(env_with(&[
            ("CAMPUS_HUB_USE_REMOTE", "true"),
            ("CAMPUS_HUB_REMOTE_ENDPOINT", "https://docs.example.test"),
            ("CAMPUS_HUB_REMOTE_API_KEY", "   "),
        ]));

        let err = load_from_empty_args()
            .remote_credentials()
            .expect_err("incomplete");
        assert_eq!(err.code(), ErrorCode::Configuration);
        assert_eq!(
            err.details().expect("details")["missing"],
            serde_json::json!(["remote_api_key", "remote_project_id"])
        );
    }

    #[rstest]
    #[case("ftp://docs.example.test")]
    #[case("not a url")]
    fn endpoints_must_be_http_urls(#[case] endpoint: &str) {
        let settings = HubSettings {
            use_remote: true,
            data_dir: None,
            remote_endpoint: Some(endpoint.to_owned()),
            remote_api_key: Some("k".to_owned()),
            remote_project_id: Some("p".to_owned()),
            write_consistency: None,
            cas_max_attempts: None,
            poll_interval_ms: None,
        };
        let err = settings.remote_credentials().expect_err("bad endpoint");
        assert_eq!(err.code(), ErrorCode::Configuration);
    }
}
