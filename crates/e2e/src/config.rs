//! Scenario run configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Configuration for a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Gateway base URL, without a trailing slash
    pub base_url: String,

    /// Seeded admin account
    pub admin: AdminCredentials,

    /// Password used for every account the run registers
    pub user_password: String,

    /// Guardian address sent with the under-13 consent request
    pub guardian_contact: String,

    /// Per-request timeout
    pub request_timeout_ms: u64,

    /// Grading observation after a submission is acknowledged
    pub grading_poll: PollPolicy,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            admin: AdminCredentials::default(),
            user_password: "password123".to_string(),
            guardian_contact: "parent@test.com".to_string(),
            request_timeout_ms: 30_000,
            grading_poll: PollPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: "admin@techvaultkids.io".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// Bounded poll: at most `max_attempts` probes, `interval_ms` apart
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_ms: 2_000,
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl ScenarioConfig {
    /// Load configuration from a TOML file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.grading_poll.max_attempts == 0 {
            return Err(E2eError::Config(
                "grading_poll.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
