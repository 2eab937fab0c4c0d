use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_ADAPTOR_URL;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdaptorConfig {
    /// Base url; batches go to `{url}/events`
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_in_ms: u64,

    /// Log batches instead of delivering them
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_in_ms: default_timeout(),
            dry_run: false,
        }
    }
}

impl AdaptorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().trim_matches('/').is_empty() {
            return Err(Error::InvalidConfig("adaptor url cannot be empty".into()));
        }

        if self.timeout_in_ms == 0 {
            return Err(Error::InvalidConfig("adaptor timeout_in_ms must be > 0".into()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }
}

fn default_url() -> String {
    DEFAULT_ADAPTOR_URL.to_string()
}

fn default_timeout() -> u64 {
    60_000
}
