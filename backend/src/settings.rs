//! Application settings loaded via OrthoConfig.
//!
//! Every value is optional on the wire; accessors apply defaults. Without a
//! database URL the relational ports fall back to fixtures, and without a
//! Redis URL snapshots live in process memory.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ReasoningRetryConfig;
use crate::outbound::reasoning::{AzureReasoningConfig, DEFAULT_API_VERSION};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REASONING_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 86_400;

/// Settings values that cannot be turned into runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("bind address `{value}` is not a socket address")]
    BindAddr { value: String },
    #[error("reasoning endpoint `{value}` is not a URL")]
    ReasoningEndpoint { value: String },
    #[error("reasoning settings are incomplete; missing {missing}")]
    IncompleteReasoning { missing: String },
}

/// Process configuration with the `ENRICHMENT_` environment prefix.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ENRICHMENT")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL for extractions and reference tables.
    pub database_url: Option<String>,
    /// Redis URL for the snapshot cache.
    pub redis_url: Option<String>,
    /// Azure OpenAI resource endpoint.
    pub reasoning_endpoint: Option<String>,
    pub reasoning_deployment: Option<String>,
    pub reasoning_api_version: Option<String>,
    pub reasoning_api_key: Option<String>,
    pub reasoning_timeout_secs: Option<u64>,
    pub reasoning_max_attempts: Option<u32>,
    /// Expiry applied to every snapshot key.
    pub snapshot_ttl_secs: Option<u64>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .field("reasoning_endpoint", &self.reasoning_endpoint)
            .field("reasoning_deployment", &self.reasoning_deployment)
            .field("reasoning_api_version", &self.reasoning_api_version)
            .field(
                "reasoning_api_key",
                &self.reasoning_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("reasoning_timeout_secs", &self.reasoning_timeout_secs)
            .field("reasoning_max_attempts", &self.reasoning_max_attempts)
            .field("snapshot_ttl_secs", &self.snapshot_ttl_secs)
            .finish()
    }
}

impl AppSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn reasoning_api_version(&self) -> &str {
        self.reasoning_api_version
            .as_deref()
            .unwrap_or(DEFAULT_API_VERSION)
    }

    pub fn reasoning_timeout(&self) -> Duration {
        Duration::from_secs(
            self.reasoning_timeout_secs
                .unwrap_or(DEFAULT_REASONING_TIMEOUT_SECS),
        )
    }

    pub fn reasoning_retry(&self) -> ReasoningRetryConfig {
        ReasoningRetryConfig {
            max_attempts: self
                .reasoning_max_attempts
                .unwrap_or(DEFAULT_REASONING_MAX_ATTEMPTS)
                .max(1),
            ..ReasoningRetryConfig::default()
        }
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(
            self.snapshot_ttl_secs
                .unwrap_or(DEFAULT_SNAPSHOT_TTL_SECS)
                .max(1),
        )
    }

    /// Reasoning adapter configuration.
    ///
    /// Returns `Ok(None)` when no reasoning setting is present, so the service
    /// runs with the echoing fixture. A partial set is an error.
    pub fn reasoning_config(&self) -> Result<Option<AzureReasoningConfig>, SettingsError> {
        let required = [
            ("reasoning_endpoint", self.reasoning_endpoint.as_deref()),
            ("reasoning_deployment", self.reasoning_deployment.as_deref()),
            ("reasoning_api_key", self.reasoning_api_key.as_deref()),
        ];
        let present = |value: Option<&str>| value.is_some_and(|v| !v.trim().is_empty());
        if required.iter().all(|(_, value)| !present(*value)) {
            return Ok(None);
        }
        let missing: Vec<_> = required
            .iter()
            .filter(|(_, value)| !present(*value))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(SettingsError::IncompleteReasoning {
                missing: missing.join(", "),
            });
        }

        let (Some(endpoint), Some(deployment), Some(api_key)) = (
            self.reasoning_endpoint.as_deref(),
            self.reasoning_deployment.as_deref(),
            self.reasoning_api_key.as_deref(),
        ) else {
            return Ok(None);
        };
        let endpoint = Url::parse(endpoint).map_err(|_| SettingsError::ReasoningEndpoint {
            value: endpoint.to_owned(),
        })?;

        Ok(Some(AzureReasoningConfig {
            endpoint,
            deployment: deployment.trim().to_owned(),
            api_version: self.reasoning_api_version().to_owned(),
            api_key: Zeroizing::new(api_key.to_owned()),
            timeout: self.reasoning_timeout(),
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "ENRICHMENT_BIND_ADDR",
        "ENRICHMENT_DATABASE_URL",
        "ENRICHMENT_REDIS_URL",
        "ENRICHMENT_REASONING_ENDPOINT",
        "ENRICHMENT_REASONING_DEPLOYMENT",
        "ENRICHMENT_REASONING_API_VERSION",
        "ENRICHMENT_REASONING_API_KEY",
        "ENRICHMENT_REASONING_TIMEOUT_SECS",
        "ENRICHMENT_REASONING_MAX_ATTEMPTS",
        "ENRICHMENT_SNAPSHOT_TTL_SECS",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("reference-enrichment")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url.is_none());
        assert!(settings.redis_url.is_none());
        assert_eq!(settings.reasoning_timeout(), Duration::from_secs(30));
        assert_eq!(settings.reasoning_retry().max_attempts, 3);
        assert_eq!(settings.snapshot_ttl(), Duration::from_secs(86_400));
        assert!(settings.reasoning_config().expect("no reasoning").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("ENRICHMENT_BIND_ADDR", "127.0.0.1:9000"),
            ("ENRICHMENT_REDIS_URL", "redis://cache:6379"),
            ("ENRICHMENT_REASONING_ENDPOINT", "https://example.openai.azure.com/"),
            ("ENRICHMENT_REASONING_DEPLOYMENT", "gpt-4o"),
            ("ENRICHMENT_REASONING_API_KEY", "secret"),
            ("ENRICHMENT_REASONING_MAX_ATTEMPTS", "5"),
            ("ENRICHMENT_SNAPSHOT_TTL_SECS", "600"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().expect("addr").port(), 9000);
        assert_eq!(settings.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(settings.reasoning_retry().max_attempts, 5);
        assert_eq!(settings.snapshot_ttl(), Duration::from_secs(600));

        let reasoning = settings
            .reasoning_config()
            .expect("valid reasoning")
            .expect("reasoning configured");
        assert_eq!(reasoning.deployment, "gpt-4o");
        assert_eq!(reasoning.api_version, DEFAULT_API_VERSION);
        assert_eq!(reasoning.api_key.as_str(), "secret");
        assert!(!format!("{settings:?}").contains("secret"));
    }

    #[rstest]
    fn partial_reasoning_settings_are_rejected() {
        let _guard = lock_env(env_with(&[(
            "ENRICHMENT_REASONING_ENDPOINT",
            "https://example.openai.azure.com/",
        )]));

        let err = load_from_empty_args()
            .reasoning_config()
            .err()
            .expect("incomplete");
        assert_eq!(
            err,
            SettingsError::IncompleteReasoning {
                missing: "reasoning_deployment, reasoning_api_key".to_owned()
            }
        );
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let _guard = lock_env(env_with(&[("ENRICHMENT_BIND_ADDR", "localhost")]));
        assert!(matches!(
            load_from_empty_args().bind_addr(),
            Err(SettingsError::BindAddr { .. })
        ));
    }
}
