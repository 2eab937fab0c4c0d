//! Reader configuration.
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Type defaults
//! 2. The TOML file named by `CONFIG_PATH`
//! 3. Environment variables such as `READER__REGISTRY__MODE=watch`
//!
//! Loading never validates; call [`ReaderConfig::validate`] once all
//! overrides are applied.

mod adaptor;
mod log;
mod monitoring;
mod registry;

pub use adaptor::*;
pub use log::*;
pub use monitoring::*;
pub use registry::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::utils::parse_adaptor_url;
use crate::utils::sanitize_prefix;
use crate::Result;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Prefix of configuration environment variables
const ENV_PREFIX: &str = "READER";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReaderConfig {
    /// Registry being observed and how
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Where event batches are delivered
    #[serde(default)]
    pub adaptor: AdaptorConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("registry.required_keys")
}

impl ReaderConfig {
    /// Loads defaults, the `CONFIG_PATH` file and the environment, without
    /// validation.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers another file on top of the current values. Environment
    /// variables still take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and normalises the key prefix and the adaptor
    /// url.
    pub fn validate(mut self) -> Result<Self> {
        self.registry.validate()?;
        self.adaptor.validate()?;
        self.log.validate()?;
        self.monitoring.validate()?;

        self.registry.prefix = sanitize_prefix(&self.registry.prefix);
        self.adaptor.url = parse_adaptor_url(&self.adaptor.url)?;

        Ok(self)
    }
}
