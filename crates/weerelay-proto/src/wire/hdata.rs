//! HData decoding: a declared schema followed by same-shaped records.
//!
//! The wire declares the pointer path and the field list once, then repeats
//! bare entries: one pointer per path segment, then one value per declared
//! key. Entries reference the schema by index, so field names are parsed a
//! single time per message rather than per entry.

use bytes::Buf;

use crate::error::{RelayError, Result};
use crate::wire::object::{self, Object, Pointer, Tag};

/// Declared shape shared by every entry of an hdata.
#[derive(Debug, Clone, PartialEq)]
pub struct HdataSchema {
    /// Type names along the pointer path, e.g. `["buffer", "lines", "line"]`.
    pub path: Vec<String>,
    /// Field name + wire type, in declared order.
    pub keys: Vec<(String, Tag)>,
}

impl HdataSchema {
    /// Parse the `"a/b/c"` path and `"name1:typ1,name2:typ2"` key strings.
    pub fn parse(path: &str, keys: &str) -> Result<HdataSchema> {
        if path.is_empty() {
            return Err(RelayError::Decode("empty hdata path".into()));
        }
        let path: Vec<String> = path.split('/').map(str::to_string).collect();

        let mut parsed = Vec::new();
        for spec in keys.split(',').filter(|s| !s.is_empty()) {
            let (name, typ) = spec
                .split_once(':')
                .ok_or_else(|| RelayError::Decode(format!("malformed hdata key {spec:?}")))?;
            let code: [u8; 3] = typ
                .as_bytes()
                .try_into()
                .map_err(|_| RelayError::Decode(format!("malformed hdata key type {typ:?}")))?;
            parsed.push((name.to_string(), Tag::from_wire(code)?));
        }
        Ok(HdataSchema {
            path,
            keys: parsed,
        })
    }

    /// Index of a field by name.
    pub fn key_index(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|(k, _)| k == name)
    }
}

/// One record: exactly `path.len()` pointers and `keys.len()` values, in
/// declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct HdataEntry {
    pub pointers: Vec<Pointer>,
    pub values: Vec<Object>,
}

/// A structured record object: schema plus its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Hdata {
    pub schema: HdataSchema,
    pub entries: Vec<HdataEntry>,
}

impl Hdata {
    /// Look up a field of `entry` by name via the schema index.
    pub fn field<'a>(&self, entry: &'a HdataEntry, name: &str) -> Option<&'a Object> {
        self.schema
            .key_index(name)
            .and_then(|idx| entry.values.get(idx))
    }
}

pub(crate) fn decode_hdata(buf: &mut impl Buf, depth: u8) -> Result<Hdata> {
    let path = object::read_string(buf)?
        .ok_or_else(|| RelayError::Decode("null hdata path".into()))?;
    let keys = object::read_string(buf)?.unwrap_or_default();
    let schema = HdataSchema::parse(&path, &keys)?;

    let count = object::read_count(buf, "hdata entry")?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let mut pointers = Vec::with_capacity(schema.path.len());
        for _ in 0..schema.path.len() {
            pointers.push(object::read_pointer(buf)?);
        }
        let mut values = Vec::with_capacity(schema.keys.len());
        for (_, tag) in &schema.keys {
            values.push(object::decode_object_at(*tag, buf, depth + 1)?);
        }
        entries.push(HdataEntry { pointers, values });
    }
    Ok(Hdata { schema, entries })
}
