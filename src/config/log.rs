use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Debug level instead of info, unless `RUST_LOG` says otherwise
    #[serde(default)]
    pub verbose: bool,

    /// Directory receiving a daily rolling `reader.log`
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("log_dir cannot be empty".into()));
            }
            if dir.is_file() {
                return Err(Error::InvalidConfig(format!(
                    "log_dir {} is a file",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    pub fn default_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
