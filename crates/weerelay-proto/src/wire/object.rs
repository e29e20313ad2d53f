//! Typed object decoding (panic-free).
//!
//! Every object on the wire is a 3-byte type tag followed by that type's
//! value encoding. Decoding is strictly sequential: each value consumes
//! exactly its own bytes, leaving the cursor positioned on the next tag.
//!
//! Parsing rules:
//! - Never index (`buf[0]`) — always use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.
//! - An unknown tag is a decode failure, not a silent skip.

use std::fmt;

use bytes::Buf;

use crate::error::{RelayError, Result};
use crate::wire::hdata::{self, Hdata};

/// Nested containers (hashtable/array/hdata) beyond this depth are rejected.
const MAX_DEPTH: u8 = 32;

/// The closed set of 3-character wire type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Chr,
    Int,
    Lon,
    Str,
    Buf,
    Ptr,
    Tim,
    Htb,
    Hda,
    Inf,
    Inl,
    Arr,
}

/// Tag <-> wire-code table. Must contain every tag; keeping the mapping in
/// one table means decode and diagnostics can never disagree.
static TAG_TABLE: [(Tag, &[u8; 3]); 12] = [
    (Tag::Chr, b"chr"),
    (Tag::Int, b"int"),
    (Tag::Lon, b"lon"),
    (Tag::Str, b"str"),
    (Tag::Buf, b"buf"),
    (Tag::Ptr, b"ptr"),
    (Tag::Tim, b"tim"),
    (Tag::Htb, b"htb"),
    (Tag::Hda, b"hda"),
    (Tag::Inf, b"inf"),
    (Tag::Inl, b"inl"),
    (Tag::Arr, b"arr"),
];

impl Tag {
    /// Resolve a 3-byte wire code.
    pub fn from_wire(code: [u8; 3]) -> Result<Tag> {
        for (tag, wire) in TAG_TABLE.iter() {
            if **wire == code {
                return Ok(*tag);
            }
        }
        Err(RelayError::Decode(format!(
            "unknown type tag: {}",
            String::from_utf8_lossy(&code)
        )))
    }

    /// The 3-byte wire code for this tag.
    pub fn as_wire(self) -> &'static [u8; 3] {
        match self {
            Tag::Chr => b"chr",
            Tag::Int => b"int",
            Tag::Lon => b"lon",
            Tag::Str => b"str",
            Tag::Buf => b"buf",
            Tag::Ptr => b"ptr",
            Tag::Tim => b"tim",
            Tag::Htb => b"htb",
            Tag::Hda => b"hda",
            Tag::Inf => b"inf",
            Tag::Inl => b"inl",
            Tag::Arr => b"arr",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(self.as_wire()).unwrap_or("???"))
    }
}

/// An opaque relay-side object identifier (hex digits, no `0x` prefix on the
/// wire). The value `"0"` is the null pointer, meaning "root".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer(String);

impl Pointer {
    pub fn null() -> Pointer {
        Pointer("0".to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == "0" || self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Pointer {
    fn from(s: &str) -> Pointer {
        Pointer(s.to_string())
    }
}

impl From<String> for Pointer {
    fn from(s: String) -> Pointer {
        Pointer(s)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

/// A decoded wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Char(i8),
    Int(i32),
    Long(i64),
    /// Nullable: length `0xFFFFFFFF` on the wire denotes absence, distinct
    /// from the empty string.
    Str(Option<String>),
    /// Nullable, same sentinel as `Str`.
    Buffer(Option<Vec<u8>>),
    Pointer(Pointer),
    /// Seconds since epoch.
    Time(u64),
    /// Ordered key/value pairs with declared element types.
    Hashtable(Vec<(Object, Object)>),
    /// Ordered elements of one declared type.
    Array(Vec<Object>),
    Hdata(Hdata),
    Info {
        name: Option<String>,
        value: Option<String>,
    },
    /// A named list of items, each item an ordered list of typed variables.
    Infolist {
        name: Option<String>,
        items: Vec<Vec<(String, Object)>>,
    },
}

impl Object {
    pub fn as_char(&self) -> Option<i8> {
        match self {
            Object::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Object::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Object::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Non-null string contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Str(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Object::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<u64> {
        match self {
            Object::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hashtable(&self) -> Option<&[(Object, Object)]> {
        match self {
            Object::Hashtable(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_hdata(&self) -> Option<&Hdata> {
        match self {
            Object::Hdata(h) => Some(h),
            _ => None,
        }
    }
}

/// Read a 3-byte type tag.
pub fn read_tag(buf: &mut impl Buf) -> Result<Tag> {
    if buf.remaining() < 3 {
        return Err(RelayError::Decode("truncated type tag".into()));
    }
    let code = [buf.get_u8(), buf.get_u8(), buf.get_u8()];
    Tag::from_wire(code)
}

/// Decode one value of the given type, consuming exactly its own bytes.
pub fn decode_object(tag: Tag, buf: &mut impl Buf) -> Result<Object> {
    decode_at_depth(tag, buf, 0)
}

/// Depth-threaded entry point for container decoders in sibling modules.
pub(crate) fn decode_object_at(tag: Tag, buf: &mut impl Buf, depth: u8) -> Result<Object> {
    decode_at_depth(tag, buf, depth)
}

fn decode_at_depth(tag: Tag, buf: &mut impl Buf, depth: u8) -> Result<Object> {
    if depth > MAX_DEPTH {
        return Err(RelayError::Decode("object nesting too deep".into()));
    }
    match tag {
        Tag::Chr => {
            if buf.remaining() < 1 {
                return Err(RelayError::Decode("truncated char".into()));
            }
            Ok(Object::Char(buf.get_i8()))
        }
        Tag::Int => {
            if buf.remaining() < 4 {
                return Err(RelayError::Decode("truncated int".into()));
            }
            Ok(Object::Int(buf.get_i32()))
        }
        Tag::Lon => Ok(Object::Long(read_long(buf)?)),
        Tag::Str => Ok(Object::Str(read_string(buf)?)),
        Tag::Buf => Ok(Object::Buffer(read_buffer(buf)?)),
        Tag::Ptr => Ok(Object::Pointer(read_pointer(buf)?)),
        Tag::Tim => Ok(Object::Time(read_time(buf)?)),
        Tag::Htb => decode_hashtable(buf, depth),
        Tag::Arr => decode_array(buf, depth),
        Tag::Hda => Ok(Object::Hdata(hdata::decode_hdata(buf, depth)?)),
        Tag::Inf => {
            let name = read_string(buf)?;
            let value = read_string(buf)?;
            Ok(Object::Info { name, value })
        }
        Tag::Inl => decode_infolist(buf, depth),
    }
}

/// `[u32 length | 0xFFFFFFFF for null][bytes]`, UTF-8.
pub fn read_string(buf: &mut impl Buf) -> Result<Option<String>> {
    match read_buffer(buf)? {
        None => Ok(None),
        Some(raw) => String::from_utf8(raw)
            .map(Some)
            .map_err(|e| RelayError::Decode(format!("invalid utf-8 string: {e}"))),
    }
}

/// `[u32 length | 0xFFFFFFFF for null][bytes]`, raw.
pub fn read_buffer(buf: &mut impl Buf) -> Result<Option<Vec<u8>>> {
    if buf.remaining() < 4 {
        return Err(RelayError::Decode("truncated length prefix".into()));
    }
    let len = buf.get_u32();
    if len == u32::MAX {
        return Ok(None);
    }
    let len = len as usize;
    if buf.remaining() < len {
        return Err(RelayError::Decode(format!(
            "length prefix {len} exceeds remaining {}",
            buf.remaining()
        )));
    }
    Ok(Some(buf.copy_to_bytes(len).to_vec()))
}

/// `[u8 length][ASCII bytes]` — the compact form used by lon/ptr/tim.
fn read_small_string(buf: &mut impl Buf, what: &str) -> Result<String> {
    if buf.remaining() < 1 {
        return Err(RelayError::Decode(format!("truncated {what}")));
    }
    let len = buf.get_u8() as usize;
    if buf.remaining() < len {
        return Err(RelayError::Decode(format!("truncated {what}")));
    }
    String::from_utf8(buf.copy_to_bytes(len).to_vec())
        .map_err(|e| RelayError::Decode(format!("non-ascii {what}: {e}")))
}

/// Signed decimal transmitted as a length-prefixed string.
pub fn read_long(buf: &mut impl Buf) -> Result<i64> {
    let s = read_small_string(buf, "long")?;
    s.parse::<i64>()
        .map_err(|e| RelayError::Decode(format!("invalid long {s:?}: {e}")))
}

/// Hex identifier transmitted as a length-prefixed string; `"0"` is null.
pub fn read_pointer(buf: &mut impl Buf) -> Result<Pointer> {
    let s = read_small_string(buf, "pointer")?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RelayError::Decode(format!("invalid pointer {s:?}")));
    }
    Ok(Pointer::from(s))
}

/// Epoch seconds transmitted as a length-prefixed decimal string.
pub fn read_time(buf: &mut impl Buf) -> Result<u64> {
    let s = read_small_string(buf, "time")?;
    s.parse::<u64>()
        .map_err(|e| RelayError::Decode(format!("invalid time {s:?}: {e}")))
}

/// Element counts are declared up front; a count larger than the bytes left
/// on the wire cannot be honest, so reject it before allocating.
pub(crate) fn read_count(buf: &mut impl Buf, what: &str) -> Result<usize> {
    if buf.remaining() < 4 {
        return Err(RelayError::Decode(format!("truncated {what} count")));
    }
    let count = buf.get_i32();
    if count < 0 {
        return Err(RelayError::Decode(format!("negative {what} count: {count}")));
    }
    let count = count as usize;
    if count > buf.remaining() {
        return Err(RelayError::Decode(format!(
            "{what} count {count} exceeds remaining {} bytes",
            buf.remaining()
        )));
    }
    Ok(count)
}

fn decode_hashtable(buf: &mut impl Buf, depth: u8) -> Result<Object> {
    let key_tag = read_tag(buf)?;
    let value_tag = read_tag(buf)?;
    let count = read_count(buf, "hashtable")?;
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let key = decode_at_depth(key_tag, buf, depth + 1)?;
        let value = decode_at_depth(value_tag, buf, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(Object::Hashtable(pairs))
}

fn decode_array(buf: &mut impl Buf, depth: u8) -> Result<Object> {
    let elem_tag = read_tag(buf)?;
    let count = read_count(buf, "array")?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(decode_at_depth(elem_tag, buf, depth + 1)?);
    }
    Ok(Object::Array(items))
}

fn decode_infolist(buf: &mut impl Buf, depth: u8) -> Result<Object> {
    let name = read_string(buf)?;
    let item_count = read_count(buf, "infolist item")?;
    let mut items = Vec::with_capacity(item_count);
    for _ in 0..item_count {
        let var_count = read_count(buf, "infolist variable")?;
        let mut vars = Vec::with_capacity(var_count);
        for _ in 0..var_count {
            let var_name = read_string(buf)?
                .ok_or_else(|| RelayError::Decode("null infolist variable name".into()))?;
            let tag = read_tag(buf)?;
            vars.push((var_name, decode_at_depth(tag, buf, depth + 1)?));
        }
        items.push(vars);
    }
    Ok(Object::Infolist { name, items })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::wire::testenc::*;

    fn decode_one(tag: Tag, bytes: &[u8]) -> Object {
        let mut buf = bytes;
        let obj = decode_object(tag, &mut buf).expect("decode");
        assert_eq!(buf.remaining(), 0, "cursor must land exactly at the end");
        obj
    }

    #[test]
    fn int_is_big_endian_signed() {
        assert_eq!(decode_one(Tag::Int, &[0, 0, 0, 42]), Object::Int(42));
        assert_eq!(
            decode_one(Tag::Int, &[0xFF, 0xFF, 0xFF, 0xFE]),
            Object::Int(-2)
        );
    }

    #[test]
    fn long_round_trips_negative_values() {
        let mut raw = Vec::new();
        put_long(&mut raw, -1234567890123);
        assert_eq!(decode_one(Tag::Lon, &raw), Object::Long(-1234567890123));
    }

    #[test]
    fn null_string_is_distinct_from_empty() {
        let mut null = Vec::new();
        put_str(&mut null, None);
        assert_eq!(decode_one(Tag::Str, &null), Object::Str(None));

        let mut empty = Vec::new();
        put_str(&mut empty, Some(""));
        assert_eq!(
            decode_one(Tag::Str, &empty),
            Object::Str(Some(String::new()))
        );
    }

    #[test]
    fn null_buffer_sentinel() {
        let mut raw = Vec::new();
        put_buf(&mut raw, None);
        assert_eq!(decode_one(Tag::Buf, &raw), Object::Buffer(None));
    }

    #[test]
    fn pointer_null_is_root() {
        let mut raw = Vec::new();
        put_ptr(&mut raw, "0");
        match decode_one(Tag::Ptr, &raw) {
            Object::Pointer(p) => assert!(p.is_null()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pointer_rejects_non_hex() {
        let mut raw = Vec::new();
        put_small(&mut raw, "xyz!");
        let mut buf = &raw[..];
        let err = decode_object(Tag::Ptr, &mut buf).unwrap_err();
        assert_eq!(err.kind().as_str(), "DECODE");
    }

    #[test]
    fn time_parses_epoch_seconds() {
        let mut raw = Vec::new();
        put_time(&mut raw, 1321993456);
        assert_eq!(decode_one(Tag::Tim, &raw), Object::Time(1321993456));
    }

    #[test]
    fn hashtable_preserves_pair_order() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"str");
        raw.extend_from_slice(b"str");
        raw.extend_from_slice(&2i32.to_be_bytes());
        put_str(&mut raw, Some("b"));
        put_str(&mut raw, Some("2"));
        put_str(&mut raw, Some("a"));
        put_str(&mut raw, Some("1"));
        let obj = decode_one(Tag::Htb, &raw);
        let pairs = obj.as_hashtable().unwrap();
        assert_eq!(pairs[0].0.as_str(), Some("b"));
        assert_eq!(pairs[1].0.as_str(), Some("a"));
    }

    #[test]
    fn array_of_strings_allows_nulls() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"str");
        raw.extend_from_slice(&3i32.to_be_bytes());
        put_str(&mut raw, Some("abc"));
        put_str(&mut raw, None);
        put_str(&mut raw, Some("de"));
        let obj = decode_one(Tag::Arr, &raw);
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Str(Some("abc".into())),
                Object::Str(None),
                Object::Str(Some("de".into())),
            ])
        );
    }

    #[test]
    fn info_pair_round_trip() {
        let mut raw = Vec::new();
        put_str(&mut raw, Some("version"));
        put_str(&mut raw, Some("4.1.2"));
        assert_eq!(
            decode_one(Tag::Inf, &raw),
            Object::Info {
                name: Some("version".into()),
                value: Some("4.1.2".into()),
            }
        );
    }

    #[test]
    fn infolist_round_trip() {
        let mut raw = Vec::new();
        put_str(&mut raw, Some("buffer"));
        raw.extend_from_slice(&1i32.to_be_bytes()); // one item
        raw.extend_from_slice(&2i32.to_be_bytes()); // two variables
        put_str(&mut raw, Some("name"));
        raw.extend_from_slice(b"str");
        put_str(&mut raw, Some("core.weechat"));
        put_str(&mut raw, Some("number"));
        raw.extend_from_slice(b"int");
        raw.extend_from_slice(&1i32.to_be_bytes());
        let obj = decode_one(Tag::Inl, &raw);
        match obj {
            Object::Infolist { name, items } => {
                assert_eq!(name.as_deref(), Some("buffer"));
                assert_eq!(items.len(), 1);
                assert_eq!(items[0][0].0, "name");
                assert_eq!(items[0][1].1, Object::Int(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_a_decode_error() {
        let err = Tag::from_wire(*b"xxx").unwrap_err();
        assert_eq!(err.kind().as_str(), "DECODE");
    }

    #[test]
    fn dishonest_count_is_rejected_before_allocation() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"str");
        raw.extend_from_slice(&0x7FFF_FFFFi32.to_be_bytes());
        let mut buf = &raw[..];
        let err = decode_object(Tag::Arr, &mut buf).unwrap_err();
        assert_eq!(err.kind().as_str(), "DECODE");
    }

    #[test]
    fn truncated_string_is_a_decode_error() {
        let raw = [0u8, 0, 0, 10, b'h', b'i'];
        let mut buf = &raw[..];
        let err = decode_object(Tag::Str, &mut buf).unwrap_err();
        assert_eq!(err.kind().as_str(), "DECODE");
    }
}
