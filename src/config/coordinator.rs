use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Upper bound for the debounce delay
pub const MAX_DEBOUNCE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoordinatorConfig {
    /// Delay between a value change and its computation, in milliseconds.
    /// `0` waits only for the next scheduling opportunity.
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: default_debounce_delay_ms(),
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.debounce_delay_ms > MAX_DEBOUNCE_DELAY_MS {
            return Err(Error::Config(ConfigError::Message(format!(
                "debounce_delay_ms {} exceeds the {}ms limit",
                self.debounce_delay_ms, MAX_DEBOUNCE_DELAY_MS
            ))));
        }
        Ok(())
    }

    /// `None` means yield once instead of sleeping.
    pub fn debounce_delay(&self) -> Option<Duration> {
        match self.debounce_delay_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn default_debounce_delay_ms() -> u64 {
    0
}
