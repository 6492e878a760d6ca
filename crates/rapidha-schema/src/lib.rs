//! Command and response schema registry for the RapidHA serial API.
//!
//! Commands are encoded from a name plus named field values; responses are
//! decoded by their 2-byte id into a [`DecodedPacket`]. Both directions are
//! driven by the static tables in [`catalog`], validated once when a
//! [`Registry`] is built.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod field;
pub mod packet;
pub mod registry;
pub mod scalar;

pub use error::{Result, SchemaError};
pub use field::{CommandSpec, FieldLength, FieldSpec, ResponseSpec};
pub use packet::DecodedPacket;
pub use registry::{CommandArgs, EncodedCommand, Registry};
pub use scalar::{attribute_width, decode_scalar, ScalarValue};
