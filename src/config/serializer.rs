use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// RFC 2046 limits a multipart boundary to 70 characters
pub const MAX_BOUNDARY_LEN: usize = 70;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SerializerConfig {
    /// Whether the built-in body host is available. When disabled, composite
    /// containers fail to serialize as they would on a host without the
    /// capability.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Fixed leading part of generated multipart boundaries
    #[serde(default = "default_boundary_prefix")]
    pub boundary_prefix: String,

    /// Number of random characters appended to the prefix
    #[serde(default = "default_boundary_length")]
    pub boundary_length: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            boundary_prefix: default_boundary_prefix(),
            boundary_length: default_boundary_length(),
        }
    }
}

impl SerializerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.boundary_prefix.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "boundary_prefix cannot be empty".into(),
            )));
        }

        if let Some(c) = self.boundary_prefix.chars().find(|c| !is_boundary_char(*c)) {
            return Err(Error::Config(ConfigError::Message(format!(
                "boundary_prefix contains invalid character {c:?}"
            ))));
        }

        if self.boundary_length == 0 {
            return Err(Error::Config(ConfigError::Message(
                "boundary_length must be > 0".into(),
            )));
        }

        if self.boundary_prefix.len() + self.boundary_length > MAX_BOUNDARY_LEN {
            return Err(Error::Config(ConfigError::Message(format!(
                "boundary of {} characters exceeds {MAX_BOUNDARY_LEN}",
                self.boundary_prefix.len() + self.boundary_length
            ))));
        }

        Ok(())
    }
}

/// RFC 2046 `bcharsnospace`
fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=?".contains(c)
}

fn default_enabled() -> bool {
    true
}
fn default_boundary_prefix() -> String {
    "----BytesCounterBoundary".to_string()
}
fn default_boundary_length() -> usize {
    16
}
