//! Byte-length computation for values held in several encodings.
//!
//! - [`encoder`]: synchronous sizes of text (UTF-8 length of UTF-16 code
//!   units), blobs and fixed buffers
//! - [`CompositeSerializer`]: asynchronous sizes of form-like containers via an
//!   injected [`BodyHost`]
//! - [`SizeCoordinator`]: debounced, staleness-checked recomputation with
//!   [`SizeEvent`] notifications
mod config;
mod coordinator;
pub mod encoder;
mod errors;
pub mod metrics;
mod serializer;
mod value;

pub use config::*;
pub use coordinator::*;
pub use errors::*;
pub use serializer::*;
pub use value::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
