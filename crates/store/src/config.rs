use validator::Validate;

use crate::error::StoreError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tracker connection settings.
#[derive(Debug, Clone, Validate)]
pub struct TrackerConfig {
    /// Base URL of the tracker server, e.g. `https://studio.example.com`.
    #[validate(url)]
    pub server_url: String,
    #[validate(length(min = 1))]
    pub api_user: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `TRACKER_SERVER_URL`   | yes      | --      |
    /// | `TRACKER_API_USER`     | yes      | --      |
    /// | `TRACKER_API_KEY`      | yes      | --      |
    /// | `TRACKER_TIMEOUT_SECS` | no       | `30`    |
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StoreError::Config(format!("{key} is required")))
        };

        let timeout_secs = match lookup("TRACKER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                StoreError::Config("TRACKER_TIMEOUT_SECS must be a valid u64".into())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            server_url: required("TRACKER_SERVER_URL")?,
            api_user: required("TRACKER_API_USER")?,
            api_key: required("TRACKER_API_KEY")?,
            timeout_secs,
        };
        config
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Endpoint that accepts batched operations.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.server_url.trim_end_matches('/'))
    }
}
