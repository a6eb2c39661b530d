//! Composite container serialization through a host body capability.
//!
//! A [`Composite`] has no intrinsic byte representation: its size is the
//! length of the message body a host produces for it. The host is injected as
//! a [`BodyHost`] so environments lacking the capability degrade through
//! [`SerializeError`] instead of feature checks in the sizing path.
mod native_host;
pub use native_host::*;


use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::encoder;
use crate::Composite;
use crate::FixedBuffer;
use crate::HostError;
use crate::SerializeError;

/// One piece of an outbound body, materialized in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPart {
    Bytes(Vec<u8>),
    /// Read from disk when the body is materialized
    File(PathBuf),
}

/// Request-like body built by a host from a composite container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundBody {
    pub content_type: String,
    pub parts: Vec<BodyPart>,
}

impl OutboundBody {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            parts: Vec::new(),
        }
    }

    pub fn from_bytes(
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            parts: vec![BodyPart::Bytes(bytes)],
        }
    }

    /// Appends in-memory bytes, merging with a trailing in-memory part.
    pub fn push_bytes(
        &mut self,
        bytes: &[u8],
    ) {
        if let Some(BodyPart::Bytes(last)) = self.parts.last_mut() {
            last.extend_from_slice(bytes);
        } else {
            self.parts.push(BodyPart::Bytes(bytes.to_vec()));
        }
    }

    pub fn push_file(
        &mut self,
        path: PathBuf,
    ) {
        self.parts.push(BodyPart::File(path));
    }
}

/// Host capability: build an outbound message body from a container and
/// asynchronously materialize it into bytes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BodyHost: Send + Sync + 'static {
    /// Wraps `composite` into an outbound body.
    ///
    /// # Errors
    /// Returns a [`HostError`] when the host rejects the container shape.
    fn build_body(
        &self,
        composite: &Composite,
    ) -> std::result::Result<OutboundBody, HostError>;

    /// Whether bodies built by this host can be read back as bytes.
    fn can_read_body(&self) -> bool;

    /// Materializes `body` into a buffer.
    ///
    /// No timeout is applied by callers; a host that never completes stalls
    /// only the computation awaiting it.
    async fn read_body(
        &self,
        body: OutboundBody,
    ) -> std::result::Result<FixedBuffer, HostError>;
}

/// Turns composite containers into byte counts through an injected host.
#[derive(Clone)]
pub struct CompositeSerializer {
    host: Arc<dyn BodyHost>,
}

impl CompositeSerializer {
    pub fn new(host: Arc<dyn BodyHost>) -> Self {
        Self { host }
    }

    /// Builds and materializes the body for `composite`.
    ///
    /// This is the only suspension point of byte counting.
    pub async fn serialize(
        &self,
        composite: &Composite,
    ) -> std::result::Result<FixedBuffer, SerializeError> {
        let body = self
            .host
            .build_body(composite)
            .map_err(|reason| SerializeError::UnsupportedBody { reason })?;

        if !self.host.can_read_body() {
            return Err(SerializeError::UnsupportedBodyRead);
        }

        debug!(
            "materializing {} body with {} part(s)",
            body.content_type,
            body.parts.len()
        );
        self.host
            .read_body(body)
            .await
            .map_err(|source| SerializeError::BodyReadFailure { source })
    }

    /// Byte length of the body the host produces for `composite`.
    pub async fn byte_length(
        &self,
        composite: &Composite,
    ) -> std::result::Result<u64, SerializeError> {
        let buffer = self.serialize(composite).await?;
        Ok(encoder::buffer_bytes(&buffer))
    }
}
