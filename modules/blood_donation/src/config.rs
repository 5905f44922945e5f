use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::cooldown::{DEFAULT_COOLDOWN_DAYS, MAX_COOLDOWN_DAYS};
use crate::infra::session::MIN_SECRET_LEN;

/// Configuration for the blood_donation module (`modules.blood_donation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BloodDonationConfig {
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: u32,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_units_per_request")]
    pub max_units_per_request: u32,
    /// Relative paths resolve under the app home directory.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_session_file")]
    pub session_file: String,
    /// Explicit signing secret for session tokens. When unset, a random one
    /// is generated on first use and kept in `session_secret_file`.
    #[serde(default)]
    pub session_secret: Option<String>,
    #[serde(default = "default_session_secret_file")]
    pub session_secret_file: String,
    /// When unset, notifications only go to the log.
    #[serde(default)]
    pub notifications_base_url: Option<String>,
}

impl Default for BloodDonationConfig {
    fn default() -> Self {
        Self {
            cooldown_days: default_cooldown_days(),
            min_password_length: default_min_password_length(),
            max_units_per_request: default_max_units_per_request(),
            store_path: default_store_path(),
            session_file: default_session_file(),
            session_secret: None,
            session_secret_file: default_session_secret_file(),
            notifications_base_url: None,
        }
    }
}

impl BloodDonationConfig {
    /// Reject values the module cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_days > MAX_COOLDOWN_DAYS {
            bail!(
                "cooldown_days = {} exceeds the maximum of {MAX_COOLDOWN_DAYS}",
                self.cooldown_days
            );
        }
        if self.max_units_per_request == 0 {
            bail!("max_units_per_request must be at least 1");
        }
        if self.min_password_length == 0 {
            bail!("min_password_length must be at least 1");
        }
        if let Some(secret) = &self.session_secret {
            if secret.len() < MIN_SECRET_LEN {
                bail!("session_secret must be at least {MIN_SECRET_LEN} bytes");
            }
        }
        Ok(())
    }
}

fn default_cooldown_days() -> u32 {
    DEFAULT_COOLDOWN_DAYS
}

fn default_min_password_length() -> usize {
    6
}

fn default_max_units_per_request() -> u32 {
    20
}

fn default_store_path() -> String {
    "data/bloodlink.json".to_string()
}

fn default_session_file() -> String {
    "session.token".to_string()
}

fn default_session_secret_file() -> String {
    "session.secret".to_string()
}
