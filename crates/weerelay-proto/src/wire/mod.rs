//! Wire format modules (frames + typed objects).
//!
//! This module hosts the two layers of the relay's binary stream:
//! - Frames: `[u32 length][u8 compression flag][body]`, zlib when flagged.
//! - Objects: a sequence of `[3-byte tag][value]` encodings inside each body,
//!   preceded by a length-prefixed message id.
//!
//! All parsers are panic-free: malformed input is reported as `RelayError`
//! instead of panicking or indexing raw buffers, keeping the client resilient
//! to corrupt or truncated relay traffic.

pub mod frame;
pub mod hdata;
pub mod message;
pub mod object;

#[cfg(test)]
pub(crate) mod testenc;

pub use frame::{Frame, FrameReader};
pub use hdata::{Hdata, HdataEntry, HdataSchema};
pub use message::{decode_message, Message};
pub use object::{Object, Pointer, Tag};
