//! Synchronous byte-length computation for values that know their own size.
//!
//! Nothing here allocates or fails. Text is measured as the UTF-8 length of a
//! UTF-16 sequence without re-encoding it.

use crate::Blob;
use crate::FixedBuffer;
use crate::Value;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// UTF-8 byte length of a UTF-16 code unit sequence.
///
/// The count starts at the number of code units. Units in `0x80..=0x7FF` add
/// one byte, units in `0x800..=0xFFFF` add two. A surrogate pair is one 4-byte
/// code point: the high surrogate adds its two bytes and the low surrogate
/// that completes it is skipped.
///
/// Unpaired surrogates are counted like any other unit of the 3-byte range.
pub fn text_bytes(units: &[u16]) -> u64 {
    let mut size = units.len() as u64;
    let mut i = 0;
    while i < units.len() {
        let code = units[i];
        match code {
            0x80..=0x7FF => size += 1,
            0x800..=0xFFFF => size += 2,
            _ => {}
        }
        if HIGH_SURROGATES.contains(&code)
            && units.get(i + 1).is_some_and(|next| LOW_SURROGATES.contains(next))
        {
            // trail surrogate already accounted for
            i += 1;
        }
        i += 1;
    }
    size
}

/// [`text_bytes`] over the UTF-16 form of `s`.
pub fn str_bytes(s: &str) -> u64 {
    let units: Vec<u16> = s.encode_utf16().collect();
    text_bytes(&units)
}

/// The blob's reported size.
pub fn binary_bytes(blob: &Blob) -> u64 {
    blob.size()
}

/// Allocated length of the buffer, whatever it holds.
pub fn buffer_bytes(buffer: &FixedBuffer) -> u64 {
    buffer.byte_length() as u64
}

/// Size of every value kind that can be measured without a host.
///
/// Returns `None` for composite containers.
pub fn measure_sync(value: &Value) -> Option<u64> {
    match value {
        Value::Absent => Some(0),
        Value::Text(text) => Some(text_bytes(text.code_units())),
        Value::Binary(blob) => Some(binary_bytes(blob)),
        Value::FixedBuffer(buffer) => Some(buffer_bytes(buffer)),
        Value::Other(scalar) => Some(str_bytes(&scalar.to_string())),
        Value::Composite(_) => None,
    }
}
