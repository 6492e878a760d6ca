use std::time::Duration;

/// Errors that can occur while driving a RapidHA module.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] rapidha_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] rapidha_frame::FrameError),

    /// Command encoding or response decoding error.
    #[error("schema error: {0}")]
    Schema(#[from] rapidha_schema::SchemaError),

    /// No matching response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The reader thread could not be started.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The device has been halted.
    #[error("device halted")]
    Halted,
}

pub type Result<T> = std::result::Result<T, DeviceError>;
