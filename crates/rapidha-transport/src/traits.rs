use crate::error::Result;

/// A bidirectional byte stream to a RapidHA module.
///
/// The read direction is driven by a single reader thread while any number of
/// caller threads write, so every method takes `&self`. Implementations keep
/// the two directions independent: a write never waits on a pending read.
pub trait Transport: Send + Sync {
    /// Number of received bytes that can be read without waiting.
    fn bytes_available(&self) -> Result<usize>;

    /// Read one byte without blocking.
    ///
    /// Returns `Ok(None)` when no byte is currently available.
    fn read_byte(&self) -> Result<Option<u8>>;

    /// Write every byte of `bytes` (blocking until accepted by the device).
    fn write_all(&self, bytes: &[u8]) -> Result<()>;

    /// Close the transport. Later reads and writes fail with
    /// [`TransportError::Closed`](crate::TransportError::Closed).
    fn close(&self) -> Result<()>;

    /// Whether [`close`](Transport::close) has been called.
    fn is_closed(&self) -> bool;
}
