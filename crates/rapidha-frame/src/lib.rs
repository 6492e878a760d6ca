//! Start-marker framing with additive checksums for the RapidHA serial protocol.
//!
//! Every frame on the wire is laid out as:
//! - A 1-byte start marker (`0xF1`)
//! - A 2-byte packet id, a 1-byte sequence number and a 1-byte field length
//! - `length` bytes of packet fields
//! - A 2-byte little-endian checksum: the 16-bit sum of id through fields
//!
//! Incoming bytes are assembled one at a time by a [`FrameAssembler`], which is
//! generic over the [`FrameRules`] of a protocol. [`ApiFrameRules`] supplies the
//! RapidHA rules.

pub mod assembler;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use assembler::{FrameAssembler, FrameRules, FrameState};
pub use codec::{
    checksum, encode_frame, parse_frame, verify_checksum, ApiFrameAssembler, ApiFrameRules, Frame,
    FrameConfig, CHECKSUM_SIZE, HEADER_SIZE, START_BYTE,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, ReadEvent};
pub use writer::FrameWriter;
