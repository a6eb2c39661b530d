//! Runtime settings of the byte counter.
//!
//! Settings are layered, each layer overriding the previous one:
//! built-in defaults, an optional TOML file named by `CONFIG_PATH`, then
//! `BYTES_COUNTER__SECTION__FIELD` environment variables. Loading never
//! validates; callers finish with [`CounterConfig::validate`].
mod coordinator;
mod serializer;
pub use coordinator::*;
pub use serializer::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix, e.g. `BYTES_COUNTER__COORDINATOR__DEBOUNCE_DELAY_MS`
pub const ENV_PREFIX: &str = "BYTES_COUNTER";

/// Settings for every component, one section each.
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct CounterConfig {
    /// Debounce behavior of the size coordinator
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    /// Built-in body host used for composite containers
    #[serde(default)]
    pub serializer: SerializerConfig,
}

impl Debug for CounterConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CounterConfig")
            .field("coordinator", &self.coordinator)
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl CounterConfig {
    /// Merges defaults, the `CONFIG_PATH` file (required if the variable is
    /// set) and `BYTES_COUNTER__*` variables.
    ///
    /// ```ignore
    /// std::env::set_var("BYTES_COUNTER__COORDINATOR__DEBOUNCE_DELAY_MS", "25");
    /// let cfg = CounterConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut layers = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(path) = env::var("CONFIG_PATH") {
            layers = layers.add_source(File::with_name(&path).required(true));
        }

        let merged: Self = layers.add_source(env_source()).build()?.try_deserialize()?;
        Ok(merged)
    }

    /// Layers the file at `path` over `self`. Environment variables are
    /// re-applied on top so they keep the last word.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let merged: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(merged)
    }

    /// Checks every section, handing the settings back when all pass.
    pub fn validate(self) -> Result<Self> {
        self.coordinator.validate()?;
        self.serializer.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
