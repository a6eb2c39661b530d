//! Error hierarchy for byte counting.
//!
//! Encoding never fails. The only fallible paths are configuration loading,
//! file-backed blobs, runtime discovery and the composite serializer, whose
//! failures are caught at the coordinator boundary and turned into
//! [`crate::SizeEvent::ComputationError`] notifications.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Composite container serialization failures
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// Filesystem failures while inspecting file-backed blobs
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The coordinator was built outside of a tokio runtime
    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),
}

/// Failures of the host body capability, classified by the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// The host refused to build a message body from the container shape
    #[error("Host cannot build a message body from this container: {reason}")]
    UnsupportedBody { reason: HostError },

    /// The host built the body but cannot materialize it into bytes
    #[error("Host cannot read message bodies into bytes")]
    UnsupportedBodyRead,

    /// Materialization started and was rejected by the host
    #[error("Reading the message body failed: {source}")]
    BodyReadFailure {
        #[source]
        source: HostError,
    },
}

impl SerializeError {
    /// Short stable label, used as a metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            SerializeError::UnsupportedBody { .. } => "unsupported_body",
            SerializeError::UnsupportedBodyRead => "unsupported_body_read",
            SerializeError::BodyReadFailure { .. } => "body_read_failure",
        }
    }
}

/// Diagnostic reported by a [`crate::BodyHost`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}
