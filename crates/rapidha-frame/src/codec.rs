use bytes::{BufMut, Bytes, BytesMut};

use crate::assembler::{FrameAssembler, FrameRules};
use crate::error::{FrameError, Result};

/// Start marker preceding every frame.
pub const START_BYTE: u8 = 0xF1;

/// Frame header: start (1) + id (2) + sequence (1) + length (1) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Trailing checksum size.
pub const CHECKSUM_SIZE: usize = 2;

/// Offset of the field-length byte within a raw frame (counting the marker).
const LENGTH_OFFSET: usize = 4;

/// A received frame, start marker and checksum stripped.
///
/// `data` holds the id, sequence, length and field bytes the checksum covers.
/// Its length always agrees with the length byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Wrap already-verified frame data (id through fields).
    ///
    /// Fails with [`FrameError::LengthMismatch`] when `data` is shorter than
    /// the id, sequence and length bytes or disagrees with its length byte.
    pub fn from_data(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let header = HEADER_SIZE - 1;
        let expected = match data.get(LENGTH_OFFSET - 1) {
            Some(&len) => header + usize::from(len),
            None => header,
        };
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Checksummed bytes: id, sequence, length and fields.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Owned handle to the checksummed bytes.
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Two-byte packet id.
    pub fn id(&self) -> [u8; 2] {
        [self.data[0], self.data[1]]
    }

    /// Sequence number (frame id) of this frame.
    pub fn sequence(&self) -> u8 {
        self.data[2]
    }

    /// Field bytes following the length byte.
    pub fn fields(&self) -> &[u8] {
        &self.data[HEADER_SIZE - 1..]
    }

    /// Checksum of this frame, as it appears on the wire.
    pub fn checksum(&self) -> [u8; 2] {
        checksum(&self.data).to_le_bytes()
    }

    /// The total wire size of this frame (marker + data + checksum).
    pub fn wire_size(&self) -> usize {
        1 + self.data.len() + CHECKSUM_SIZE
    }
}

/// 16-bit wrapping sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte)))
}

/// Whether `received` (little-endian, as on the wire) is the checksum of `data`.
pub fn verify_checksum(data: &[u8], received: [u8; 2]) -> bool {
    checksum(data).to_le_bytes() == received
}

/// Encode a payload for transmission.
///
/// The payload already carries id, sequence, length, fields and checksum;
/// framing only prefixes the start marker.
///
/// Wire format:
/// ```text
/// ┌────────┬──────────┬─────┬─────┬──────────────┬──────────────┐
/// │ 0xF1   │ Id (2B)  │ Seq │ Len │ Fields       │ Checksum     │
/// │        │          │     │     │ (Len bytes)  │ (2B LE)      │
/// └────────┴──────────┴─────┴─────┴──────────────┴──────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(1 + payload.len());
    dst.put_u8(START_BYTE);
    dst.put_slice(payload);
}

/// Parse one complete raw frame, marker included, and verify its checksum.
pub fn parse_frame(raw: &[u8]) -> Result<Frame> {
    if raw.len() < HEADER_SIZE + CHECKSUM_SIZE {
        return Err(FrameError::LengthMismatch {
            expected: HEADER_SIZE + CHECKSUM_SIZE,
            actual: raw.len(),
        });
    }
    if raw[0] != START_BYTE {
        return Err(FrameError::InvalidStart(raw[0]));
    }

    let field_len = usize::from(raw[LENGTH_OFFSET]);
    let expected = HEADER_SIZE + field_len + CHECKSUM_SIZE;
    if raw.len() != expected {
        return Err(FrameError::LengthMismatch {
            expected,
            actual: raw.len(),
        });
    }

    let data = &raw[1..HEADER_SIZE + field_len];
    let received = [raw[expected - 2], raw[expected - 1]];
    if !verify_checksum(data, received) {
        return Err(FrameError::Checksum {
            computed: checksum(data),
            received: u16::from_le_bytes(received),
        });
    }

    Frame::from_data(Bytes::copy_from_slice(data))
}

/// Framing rules of the RapidHA serial API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiFrameRules;

impl FrameRules for ApiFrameRules {
    type Frame = Frame;

    fn start_marker(&self) -> u8 {
        START_BYTE
    }

    fn remaining(&self, raw: &[u8]) -> usize {
        let mut total = HEADER_SIZE + CHECKSUM_SIZE;
        if raw.len() > LENGTH_OFFSET {
            total += usize::from(raw[LENGTH_OFFSET]);
        }
        total.saturating_sub(raw.len())
    }

    fn parse(&self, raw: &[u8]) -> Result<Option<Frame>> {
        // Zero-length frames carry no fields and are treated as line noise.
        if raw.len() > LENGTH_OFFSET && raw[LENGTH_OFFSET] == 0 {
            return Ok(None);
        }
        parse_frame(raw).map(Some)
    }
}

/// Byte-at-a-time assembler for RapidHA frames.
pub type ApiFrameAssembler = FrameAssembler<ApiFrameRules>;

/// Configuration for frame reading.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Sleep between polls when the transport has no byte ready. Default: 10 ms.
    pub idle_backoff: std::time::Duration,
    /// Upper bound for blocking [`FrameReader::read_frame`](crate::FrameReader::read_frame) calls.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            idle_backoff: std::time::Duration::from_millis(10),
            read_timeout: None,
        }
    }
}
