//! Message decoding: one frame body -> id + ordered objects.

use bytes::Buf;

use crate::error::Result;
use crate::wire::object::{self, Object};

/// A fully decoded frame body.
///
/// `id` is the request identifier echoed by the relay, or a well-known event
/// name for unsolicited traffic; an empty id means an unsolicited message
/// with no event name.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub objects: Vec<Object>,
}

impl Message {
    /// The first object, which for most replies/events is the only one.
    pub fn first(&self) -> Option<&Object> {
        self.objects.first()
    }
}

/// Decode a decompressed frame body. Any length mismatch or truncation fails
/// the whole message; no partial message is returned.
pub fn decode_message(payload: &[u8]) -> Result<Message> {
    let mut buf = payload;
    // A null id collapses to empty: both mean "unsolicited".
    let id = object::read_string(&mut buf)?.unwrap_or_default();
    let mut objects = Vec::new();
    while buf.has_remaining() {
        let tag = object::read_tag(&mut buf)?;
        objects.push(object::decode_object(tag, &mut buf)?);
    }
    Ok(Message { id, objects })
}
