use std::fmt;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::scalar::{decode_scalar, ScalarValue};

/// A response decoded by the registry.
///
/// Fields keep the order of the response layout. Remainder fields that were
/// empty on the wire are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    name: &'static str,
    frame_id: u8,
    fields: Vec<(&'static str, Bytes)>,
}

impl DecodedPacket {
    pub fn new(name: &'static str, frame_id: u8) -> Self {
        Self {
            name,
            frame_id,
            fields: Vec::new(),
        }
    }

    /// Append a decoded field.
    pub fn with_field(mut self, name: &'static str, value: impl Into<Bytes>) -> Self {
        self.push_field(name, value.into());
        self
    }

    pub(crate) fn push_field(&mut self, name: &'static str, value: Bytes) {
        self.fields.push((name, value));
    }

    /// Response name, e.g. `startup_sync`.
    pub fn id(&self) -> &'static str {
        self.name
    }

    /// Whether this packet is the named response.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Sequence number echoed by the module.
    pub fn frame_id(&self) -> u8 {
        self.frame_id
    }

    pub fn get(&self, field: &str) -> Option<&Bytes> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// First byte of a field, the usual shape of status and state values.
    pub fn get_u8(&self, field: &str) -> Option<u8> {
        self.get(field).and_then(|value| value.first().copied())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Bytes)> + '_ {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    /// Typed attribute value of a packet carrying `attrib_type` and `attrib_value`.
    ///
    /// `Ok(None)` when the packet has no `attrib_type` field.
    pub fn attribute_value(&self) -> Result<Option<ScalarValue>> {
        let Some(type_tag) = self.get_u8("attrib_type") else {
            return Ok(None);
        };
        let raw = self.get("attrib_value").map(Bytes::as_ref).unwrap_or(&[]);
        decode_scalar(type_tag, raw).map(Some)
    }
}

impl fmt::Display for DecodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.frame_id)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={}", hex::encode(value))?;
        }
        Ok(())
    }
}

impl Serialize for DecodedPacket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("id", self.name)?;
        map.serialize_entry("frame_id", &self.frame_id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &hex::encode(value))?;
        }
        map.end()
    }
}
