//! The tracked value and its payload kinds.
//!
//! [`Value`] is an explicit tagged union: every kind the coordinator knows how
//! to size is a variant, and a single dispatch function maps the tag to the
//! encoder or the composite serializer.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Result;

/// Discriminant of a [`Value`], used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Absent,
    Text,
    Binary,
    FixedBuffer,
    Composite,
    Other,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Absent => "absent",
            ValueKind::Text => "text",
            ValueKind::Binary => "binary",
            ValueKind::FixedBuffer => "fixed_buffer",
            ValueKind::Composite => "composite",
            ValueKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Nothing set, or explicitly emptied
    #[default]
    Absent,
    Text(Text),
    Binary(Blob),
    FixedBuffer(FixedBuffer),
    Composite(Composite),
    /// Sized through its string form
    Other(Scalar),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Absent => ValueKind::Absent,
            Value::Text(_) => ValueKind::Text,
            Value::Binary(_) => ValueKind::Binary,
            Value::FixedBuffer(_) => ValueKind::FixedBuffer,
            Value::Composite(_) => ValueKind::Composite,
            Value::Other(_) => ValueKind::Other,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Text::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Text::from(s.as_str()))
    }
}

impl From<Text> for Value {
    fn from(t: Text) -> Self {
        Value::Text(t)
    }
}

impl From<Blob> for Value {
    fn from(b: Blob) -> Self {
        Value::Binary(b)
    }
}

impl From<FixedBuffer> for Value {
    fn from(b: FixedBuffer) -> Self {
        Value::FixedBuffer(b)
    }
}

impl From<Composite> for Value {
    fn from(c: Composite) -> Self {
        Value::Composite(c)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Other(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Other(Scalar::Integer(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Other(Scalar::Float(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Other(Scalar::Boolean(b))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Absent)
    }
}

//------------------------------------------------------------------------------
// Text

/// A string held as raw UTF-16 code units.
///
/// Unpaired surrogates are representable, which `String` cannot express.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Text(Vec<u16>);

impl Text {
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self(units)
    }

    pub fn code_units(&self) -> &[u16] {
        &self.0
    }

    /// Number of UTF-16 code units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

impl fmt::Debug for Text {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Text({:?})", String::from_utf16_lossy(&self.0))
    }
}

//------------------------------------------------------------------------------
// Binary

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlobSource {
    Memory(Arc<[u8]>),
    /// Content stays on disk until a host serializes it
    File(PathBuf),
}

/// Byte-bearing object that reports its own size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    size: u64,
    media_type: Option<String>,
    source: BlobSource,
}

impl Blob {
    /// Concatenates `parts` into an in-memory blob.
    pub fn from_parts<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut data = Vec::new();
        for part in parts {
            data.extend_from_slice(part.as_ref());
        }
        Self {
            size: data.len() as u64,
            media_type: None,
            source: BlobSource::Memory(data.into()),
        }
    }

    /// A blob backed by a file on disk. Only the metadata is read here.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }
        Ok(Self {
            size: metadata.len(),
            media_type: None,
            source: BlobSource::File(path.to_path_buf()),
        })
    }

    pub fn with_media_type(
        mut self,
        media_type: impl Into<String>,
    ) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// In-memory content, `None` for file-backed blobs.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.source {
            BlobSource::Memory(data) => Some(data.as_ref()),
            BlobSource::File(_) => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            BlobSource::Memory(_) => None,
            BlobSource::File(path) => Some(path.as_path()),
        }
    }
}

//------------------------------------------------------------------------------
// FixedBuffer

/// Pre-allocated byte region. Its length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedBuffer(Box<[u8]>);

impl FixedBuffer {
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len].into_boxed_slice())
    }

    pub fn byte_length(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for FixedBuffer {
    fn from(v: Vec<u8>) -> Self {
        Self(v.into_boxed_slice())
    }
}

impl From<&[u8]> for FixedBuffer {
    fn from(v: &[u8]) -> Self {
        Self(v.into())
    }
}

//------------------------------------------------------------------------------
// Composite

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Form-like container, may carry files
    Form,
    /// Query-string-like container, text entries only
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEntry {
    Text(String),
    File { filename: String, blob: Blob },
}

/// Ordered multi-field container.
///
/// Its byte representation depends on how a host encodes it, so it can only
/// be sized through a [`crate::BodyHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    kind: CompositeKind,
    entries: Vec<(String, FormEntry)>,
}

impl Composite {
    pub fn form() -> Self {
        Self {
            kind: CompositeKind::Form,
            entries: Vec::new(),
        }
    }

    pub fn query() -> Self {
        Self {
            kind: CompositeKind::Query,
            entries: Vec::new(),
        }
    }

    /// Builds a query container from name/value pairs.
    pub fn query_from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = Self::query();
        for (k, v) in pairs {
            query.append(k, v);
        }
        query
    }

    pub fn append(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.entries.push((name.into(), FormEntry::Text(value.into())));
        self
    }

    pub fn append_file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        blob: Blob,
    ) -> &mut Self {
        self.entries.push((
            name.into(),
            FormEntry::File {
                filename: filename.into(),
                blob,
            },
        ));
        self
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn entries(&self) -> &[(String, FormEntry)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//------------------------------------------------------------------------------
// Other

/// Scalar that is sized through its string form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for Scalar {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Float(n) => f.write_str(&number_to_string(*n)),
            Scalar::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Number-to-string conversion of ECMAScript `Number::toString`.
///
/// Shortest round-trip digits, plain notation for decimal exponents in
/// `-7..21`, `d.ddde±x` otherwise. Both zeros print as `0`.
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // `{:e}` yields the shortest digits, e.g. `1.5e-7`
    let sci = format!("{n:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let e = point - 1;
        let sign = if e < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{sign}{}", e.abs())
        } else {
            format!("{lead}.{rest}e{sign}{}", e.abs())
        }
    }
}
