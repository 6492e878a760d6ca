use bytes::Bytes;
use serde::Serialize;

use crate::constants::attribute_type as ty;
use crate::error::{Result, SchemaError};

/// A ZCL attribute value converted from its wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScalarValue {
    Null,
    Unsigned(u64),
    Signed(i64),
    /// Value of a type tag without a numeric interpretation, passed through unchanged.
    Raw(#[serde(serialize_with = "serialize_raw")] Bytes),
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Signed(value) => write!(f, "{value}"),
            Self::Raw(raw) => f.write_str(&hex::encode(raw)),
        }
    }
}

fn serialize_raw<S>(raw: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(raw))
}

#[derive(Clone, Copy)]
enum Signedness {
    Unsigned,
    Signed,
}

/// Width and signedness of the numeric attribute types.
fn numeric_kind(type_tag: u8) -> Option<(usize, Signedness)> {
    use Signedness::{Signed, Unsigned};

    Some(match type_tag {
        ty::BOOL | ty::DATA8 | ty::BITMAP8 | ty::UINT8 | ty::ENUM8 => (1, Unsigned),
        ty::DATA16 | ty::BITMAP16 | ty::UINT16 | ty::ENUM16 => (2, Unsigned),
        ty::DATA24 | ty::BITMAP24 | ty::UINT24 => (3, Unsigned),
        ty::DATA32 | ty::BITMAP32 | ty::UINT32 => (4, Unsigned),
        ty::UINT40 => (5, Unsigned),
        ty::UINT48 => (6, Unsigned),
        ty::UINT56 => (7, Unsigned),
        ty::DATA64 | ty::BITMAP64 | ty::UINT64 => (8, Unsigned),
        ty::INT8 => (1, Signed),
        ty::INT16 => (2, Signed),
        ty::INT24 => (3, Signed),
        ty::INT32 => (4, Signed),
        ty::INT40 => (5, Signed),
        ty::INT48 => (6, Signed),
        ty::INT56 => (7, Signed),
        ty::INT64 => (8, Signed),
        _ => return None,
    })
}

/// Byte width of a numeric attribute type, `Some(0)` for null, `None` when
/// the tag has no fixed width.
pub fn attribute_width(type_tag: u8) -> Option<usize> {
    if type_tag == ty::NULL {
        return Some(0);
    }
    numeric_kind(type_tag).map(|(width, _)| width)
}

/// Convert a little-endian attribute value according to its type tag.
pub fn decode_scalar(type_tag: u8, raw: &[u8]) -> Result<ScalarValue> {
    if type_tag == ty::NULL {
        return Ok(ScalarValue::Null);
    }

    let Some((width, signedness)) = numeric_kind(type_tag) else {
        return Ok(ScalarValue::Raw(Bytes::copy_from_slice(raw)));
    };
    if raw.len() != width {
        return Err(SchemaError::ScalarLengthMismatch {
            type_tag,
            expected: width,
            actual: raw.len(),
        });
    }

    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(raw);
    let unsigned = u64::from_le_bytes(buf);

    Ok(match signedness {
        Signedness::Unsigned => ScalarValue::Unsigned(unsigned),
        Signedness::Signed => {
            let shift = 64 - 8 * width as u32;
            ScalarValue::Signed(((unsigned << shift) as i64) >> shift)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_types_are_little_endian() {
        assert_eq!(decode_scalar(ty::UINT8, &[0xFE]).unwrap(), ScalarValue::Unsigned(254));
        assert_eq!(
            decode_scalar(ty::UINT16, &[0x34, 0x12]).unwrap(),
            ScalarValue::Unsigned(0x1234)
        );
        assert_eq!(
            decode_scalar(ty::BITMAP24, &[0x01, 0x02, 0x03]).unwrap(),
            ScalarValue::Unsigned(0x030201)
        );
        assert_eq!(
            decode_scalar(ty::DATA64, &[0xFF; 8]).unwrap(),
            ScalarValue::Unsigned(u64::MAX)
        );
        assert_eq!(decode_scalar(ty::ENUM8, &[0x04]).unwrap(), ScalarValue::Unsigned(4));
    }

    #[test]
    fn bool_reads_as_unsigned() {
        assert_eq!(decode_scalar(ty::BOOL, &[0x01]).unwrap(), ScalarValue::Unsigned(1));
    }

    #[test]
    fn signed_types_sign_extend() {
        assert_eq!(decode_scalar(ty::INT8, &[0xFF]).unwrap(), ScalarValue::Signed(-1));
        // 0x0960 = 2400 (24.00 degrees)
        assert_eq!(
            decode_scalar(ty::INT16, &[0x60, 0x09]).unwrap(),
            ScalarValue::Signed(2400)
        );
        assert_eq!(
            decode_scalar(ty::INT16, &[0x00, 0x80]).unwrap(),
            ScalarValue::Signed(i64::from(i16::MIN))
        );
        assert_eq!(
            decode_scalar(ty::INT24, &[0xFE, 0xFF, 0xFF]).unwrap(),
            ScalarValue::Signed(-2)
        );
        assert_eq!(
            decode_scalar(ty::INT64, &i64::MIN.to_le_bytes()).unwrap(),
            ScalarValue::Signed(i64::MIN)
        );
    }

    #[test]
    fn null_and_unknown_tags() {
        assert_eq!(decode_scalar(ty::NULL, &[]).unwrap(), ScalarValue::Null);
        assert_eq!(
            decode_scalar(0x42, b"abc").unwrap(),
            ScalarValue::Raw(Bytes::from_static(b"abc"))
        );
    }

    #[test]
    fn wrong_width_is_rejected() {
        let err = decode_scalar(ty::UINT32, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ScalarLengthMismatch {
                type_tag: ty::UINT32,
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn widths() {
        assert_eq!(attribute_width(ty::NULL), Some(0));
        assert_eq!(attribute_width(ty::INT16), Some(2));
        assert_eq!(attribute_width(ty::UINT48), Some(6));
        assert_eq!(attribute_width(0x42), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(ScalarValue::Signed(-5).to_string(), "-5");
        assert_eq!(ScalarValue::Null.to_string(), "null");
        assert_eq!(ScalarValue::Raw(Bytes::from_static(&[0xAB, 0x01])).to_string(), "ab01");
    }
}
