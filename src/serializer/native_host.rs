use std::borrow::Cow;

use async_trait::async_trait;
use tracing::trace;

use super::BodyHost;
use super::BodyPart;
use super::OutboundBody;
use crate::Composite;
use crate::CompositeKind;
use crate::FixedBuffer;
use crate::FormEntry;
use crate::HostError;
use crate::Result;
use crate::SerializerConfig;

pub const URLENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Boundary alphabet: a subset of the RFC 2046 `bchars` safe to generate.
const BOUNDARY_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// In-process body host.
///
/// Form containers become `multipart/form-data`, query containers become
/// `application/x-www-form-urlencoded`. File-backed blobs are streamed from
/// disk when the body is read.
#[derive(Debug, Clone)]
pub struct NativeBodyHost {
    boundary_prefix: String,
    boundary_length: usize,
}

impl NativeBodyHost {
    /// # Errors
    /// Returns [`crate::Error::Config`] when the boundary settings fail
    /// [`SerializerConfig::validate`].
    pub fn new(config: &SerializerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            boundary_prefix: config.boundary_prefix.clone(),
            boundary_length: config.boundary_length,
        })
    }

    fn next_boundary(&self) -> String {
        let len = self.boundary_length;
        format!("{}{}", self.boundary_prefix, nanoid::nanoid!(len, &BOUNDARY_ALPHABET))
    }

    fn build_multipart(
        &self,
        composite: &Composite,
    ) -> OutboundBody {
        let boundary = self.next_boundary();
        let mut body = OutboundBody::new(format!("multipart/form-data; boundary={boundary}"));

        for (name, entry) in composite.entries() {
            let name = normalize_line_breaks(name);
            body.push_bytes(format!("--{boundary}\r\n").as_bytes());
            match entry {
                FormEntry::Text(value) => {
                    body.push_bytes(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape_header_value(&name)
                        )
                        .as_bytes(),
                    );
                    body.push_bytes(normalize_line_breaks(value).as_bytes());
                }
                FormEntry::File { filename, blob } => {
                    body.push_bytes(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            escape_header_value(&name),
                            escape_header_value(filename),
                            blob.media_type()
                                .filter(|t| !t.is_empty())
                                .unwrap_or(DEFAULT_FILE_CONTENT_TYPE)
                        )
                        .as_bytes(),
                    );
                    match (blob.bytes(), blob.path()) {
                        (Some(bytes), _) => body.push_bytes(bytes),
                        (None, Some(path)) => body.push_file(path.to_path_buf()),
                        (None, None) => {}
                    }
                }
            }
            body.push_bytes(b"\r\n");
        }
        body.push_bytes(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    fn build_urlencoded(
        &self,
        composite: &Composite,
    ) -> std::result::Result<OutboundBody, HostError> {
        let mut encoded = String::new();
        for (name, entry) in composite.entries() {
            let FormEntry::Text(value) = entry else {
                return Err(HostError::new(format!(
                    "query containers only carry text entries, `{name}` is a file"
                )));
            };
            if !encoded.is_empty() {
                encoded.push('&');
            }
            urlencode_into(&mut encoded, name);
            encoded.push('=');
            urlencode_into(&mut encoded, value);
        }
        Ok(OutboundBody::from_bytes(
            URLENCODED_CONTENT_TYPE,
            encoded.into_bytes(),
        ))
    }
}

impl Default for NativeBodyHost {
    fn default() -> Self {
        let config = SerializerConfig::default();
        Self {
            boundary_prefix: config.boundary_prefix,
            boundary_length: config.boundary_length,
        }
    }
}

#[async_trait]
impl BodyHost for NativeBodyHost {
    fn build_body(
        &self,
        composite: &Composite,
    ) -> std::result::Result<OutboundBody, HostError> {
        match composite.kind() {
            CompositeKind::Form => Ok(self.build_multipart(composite)),
            CompositeKind::Query => self.build_urlencoded(composite),
        }
    }

    fn can_read_body(&self) -> bool {
        true
    }

    async fn read_body(
        &self,
        body: OutboundBody,
    ) -> std::result::Result<FixedBuffer, HostError> {
        let mut buffer = Vec::new();
        for part in body.parts {
            match part {
                BodyPart::Bytes(bytes) => buffer.extend_from_slice(&bytes),
                BodyPart::File(path) => {
                    trace!("reading body part from {}", path.display());
                    let bytes = tokio::fs::read(&path).await.map_err(|e| {
                        HostError::new(format!("failed to read {}: {e}", path.display()))
                    })?;
                    buffer.extend_from_slice(&bytes);
                }
            }
        }
        Ok(FixedBuffer::from(buffer))
    }
}

/// A host without the body capability. Every construction is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBodyHost;

#[async_trait]
impl BodyHost for NoBodyHost {
    fn build_body(
        &self,
        _composite: &Composite,
    ) -> std::result::Result<OutboundBody, HostError> {
        Err(HostError::new("message bodies are not supported by this host"))
    }

    fn can_read_body(&self) -> bool {
        false
    }

    async fn read_body(
        &self,
        _body: OutboundBody,
    ) -> std::result::Result<FixedBuffer, HostError> {
        Err(HostError::new("message bodies are not supported by this host"))
    }
}

/// Rewrites bare CR and bare LF as CRLF, as multipart form entries require
/// for names and text values.
pub(crate) fn normalize_line_breaks(input: &str) -> Cow<'_, str> {
    if !input.contains(['\r', '\n']) {
        return Cow::Borrowed(input);
    }
    let mut normalized = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                normalized.push_str("\r\n");
            }
            '\n' => normalized.push_str("\r\n"),
            c => normalized.push(c),
        }
    }
    Cow::Owned(normalized)
}

/// Escapes `"`, CR and LF in multipart header parameters.
pub(crate) fn escape_header_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// `application/x-www-form-urlencoded` byte serializer.
pub(crate) fn urlencode_into(
    out: &mut String,
    input: &str,
) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &byte in input.as_bytes() {
        match byte {
            b'*' | b'-' | b'.' | b'_' | b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(HEX[(byte >> 4) as usize] as char);
                out.push(HEX[(byte & 0x0F) as usize] as char);
            }
        }
    }
}
