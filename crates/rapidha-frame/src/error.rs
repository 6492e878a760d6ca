use std::time::Duration;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not begin with the start marker.
    #[error("invalid start marker 0x{0:02x} (expected 0xf1)")]
    InvalidStart(u8),

    /// The raw frame length disagrees with its length byte.
    #[error("frame length mismatch ({actual} bytes, header declares {expected})")]
    LengthMismatch { expected: usize, actual: usize },

    /// The trailing checksum does not match the frame contents.
    #[error("invalid checksum (computed 0x{computed:04x}, received 0x{received:04x})")]
    Checksum { computed: u16, received: u16 },

    /// A transport error occurred while reading or writing frames.
    #[error("frame transport error: {0}")]
    Transport(#[from] rapidha_transport::TransportError),

    /// No complete frame arrived before the read timeout.
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, FrameError>;
