use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_KEY_PREFIX;
use crate::filter::RequiredKeys;
use crate::Error;
use crate::Result;

/// Lowest accepted poll interval
pub const MIN_POLL_INTERVAL_IN_MS: u64 = 1000;

/// How registry state is observed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObserveMode {
    /// Full state re-read on a timer, diffed against the previous read
    #[default]
    Poll,
    /// Subscription to per-key changes
    Watch,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Metadata keys a service must carry to be observed
    #[serde(default)]
    pub required_keys: Vec<String>,

    #[serde(default)]
    pub mode: ObserveMode,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_in_ms: u64,

    /// Deadline of one full state read
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_in_ms: u64,

    /// Key prefix registry objects live under
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// YAML document backing the file store
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default = "default_file_refresh_interval")]
    pub file_refresh_interval_in_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            required_keys: Vec::new(),
            mode: ObserveMode::default(),
            poll_interval_in_ms: default_poll_interval(),
            poll_timeout_in_ms: default_poll_timeout(),
            prefix: default_prefix(),
            file_path: None,
            file_refresh_interval_in_ms: default_file_refresh_interval(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        self.required_keys()?;

        if self.poll_interval_in_ms < MIN_POLL_INTERVAL_IN_MS {
            return Err(Error::InvalidConfig(format!(
                "poll_interval_in_ms must be at least {MIN_POLL_INTERVAL_IN_MS}, got {}",
                self.poll_interval_in_ms
            )));
        }

        if self.poll_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig("poll_timeout_in_ms must be > 0".into()));
        }

        if self.file_refresh_interval_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "file_refresh_interval_in_ms must be > 0".into(),
            ));
        }

        if let Some(path) = &self.file_path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("file_path cannot be empty".into()));
            }
        }

        Ok(())
    }

    pub fn required_keys(&self) -> Result<RequiredKeys> {
        RequiredKeys::new(&self.required_keys)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_in_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_in_ms)
    }

    pub fn file_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.file_refresh_interval_in_ms)
    }
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_poll_timeout() -> u64 {
    60_000
}

fn default_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_file_refresh_interval() -> u64 {
    1000
}
