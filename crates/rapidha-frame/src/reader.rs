use std::sync::Arc;
use std::time::Instant;

use rapidha_transport::Transport;

use crate::assembler::FrameState;
use crate::codec::{ApiFrameAssembler, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Outcome of one [`FrameReader::poll`] step.
#[derive(Debug)]
pub enum ReadEvent {
    /// No byte was available on the transport.
    Idle,
    /// A byte was consumed but no frame completed.
    Pending,
    /// A verified frame completed.
    Frame(Frame),
    /// A frame completed but was discarded (bad checksum or length).
    Dropped(FrameError),
}

/// Reads frames from a [`Transport`] one byte at a time.
///
/// Each poll consumes at most one byte, so callers can interleave polling with
/// cooperative shutdown checks.
pub struct FrameReader<T: ?Sized> {
    transport: Arc<T>,
    assembler: ApiFrameAssembler,
    config: FrameConfig,
}

impl<T: Transport + ?Sized> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_config(transport, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(transport: Arc<T>, config: FrameConfig) -> Self {
        Self {
            transport,
            assembler: ApiFrameAssembler::default(),
            config,
        }
    }

    /// Pull at most one byte from the transport and advance assembly.
    pub fn poll(&mut self) -> Result<ReadEvent> {
        let byte = match self.transport.read_byte()? {
            Some(byte) => byte,
            None => return Ok(ReadEvent::Idle),
        };

        Ok(match self.assembler.feed(byte) {
            FrameState::NeedsMore => ReadEvent::Pending,
            FrameState::Complete(frame) => ReadEvent::Frame(frame),
            FrameState::Invalid(err) => ReadEvent::Dropped(err),
        })
    }

    /// Read the next verified frame (blocking).
    ///
    /// Invalid frames are skipped. Sleeps `idle_backoff` whenever the transport
    /// is idle and gives up with [`FrameError::Timeout`] after `read_timeout`.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let deadline = self
            .config
            .read_timeout
            .map(|timeout| (Instant::now() + timeout, timeout));

        loop {
            match self.poll()? {
                ReadEvent::Frame(frame) => return Ok(frame),
                ReadEvent::Pending | ReadEvent::Dropped(_) => continue,
                ReadEvent::Idle => {
                    if let Some((deadline, timeout)) = deadline {
                        if Instant::now() >= deadline {
                            return Err(FrameError::Timeout(timeout));
                        }
                    }
                    std::thread::sleep(self.config.idle_backoff);
                }
            }
        }
    }

    /// Drop any partially assembled frame.
    pub fn reset(&mut self) {
        self.assembler.reset();
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rapidha_transport::{MemoryTransport, TransportError};

    use super::*;
    use crate::codec::{checksum, START_BYTE};

    fn wire(data: &[u8]) -> Vec<u8> {
        let mut raw = vec![START_BYTE];
        raw.extend_from_slice(data);
        raw.extend_from_slice(&checksum(data).to_le_bytes());
        raw
    }

    fn quick_config() -> FrameConfig {
        FrameConfig {
            idle_backoff: Duration::from_millis(1),
            read_timeout: Some(Duration::from_millis(50)),
        }
    }

    #[test]
    fn read_single_frame() {
        let transport = Arc::new(MemoryTransport::new());
        transport.push_inbound(&wire(&[0x55, 0x80, 0x03, 0x01, 0x00]));

        let mut reader = FrameReader::with_config(transport, quick_config());
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.id(), [0x55, 0x80]);
        assert_eq!(frame.sequence(), 3);
    }

    #[test]
    fn read_multiple_frames_in_order() {
        let transport = Arc::new(MemoryTransport::new());
        for seq in 1..=3u8 {
            transport.push_inbound(&wire(&[0x55, 0x80, seq, 0x01, 0x00]));
        }

        let mut reader = FrameReader::with_config(transport, quick_config());
        for seq in 1..=3u8 {
            assert_eq!(reader.read_frame().unwrap().sequence(), seq);
        }
    }

    #[test]
    fn read_skips_corrupt_frame() {
        let transport = Arc::new(MemoryTransport::new());
        let mut corrupt = wire(&[0x55, 0x80, 0x01, 0x01, 0x00]);
        corrupt[5] = 0x7F;
        transport.push_inbound(&corrupt);
        transport.push_inbound(&wire(&[0x55, 0x80, 0x02, 0x01, 0x00]));

        let mut reader = FrameReader::with_config(transport, quick_config());
        assert_eq!(reader.read_frame().unwrap().sequence(), 2);
    }

    #[test]
    fn poll_reports_each_step() {
        let transport = Arc::new(MemoryTransport::new());
        let mut reader = FrameReader::with_config(Arc::clone(&transport), quick_config());

        assert!(matches!(reader.poll().unwrap(), ReadEvent::Idle));

        let raw = wire(&[0x55, 0x80, 0x01, 0x01, 0x00]);
        transport.push_inbound(&raw);
        for _ in 0..raw.len() - 1 {
            assert!(matches!(reader.poll().unwrap(), ReadEvent::Pending));
        }
        assert!(matches!(reader.poll().unwrap(), ReadEvent::Frame(_)));
    }

    #[test]
    fn poll_reports_dropped_frame() {
        let transport = Arc::new(MemoryTransport::new());
        let mut raw = wire(&[0x55, 0x80, 0x01, 0x01, 0x00]);
        let last = raw.len() - 1;
        raw[last] = raw[last].wrapping_add(1);
        transport.push_inbound(&raw);

        let mut reader = FrameReader::with_config(transport, quick_config());
        let mut dropped = false;
        for _ in 0..raw.len() {
            if let ReadEvent::Dropped(FrameError::Checksum { .. }) = reader.poll().unwrap() {
                dropped = true;
            }
        }
        assert!(dropped);
    }

    #[test]
    fn read_times_out_when_idle() {
        let transport = Arc::new(MemoryTransport::new());
        let mut reader = FrameReader::with_config(transport, quick_config());

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Timeout(_)));
    }

    #[test]
    fn closed_transport_propagates() {
        let transport = Arc::new(MemoryTransport::new());
        transport.close().unwrap();
        let mut reader = FrameReader::with_config(transport, quick_config());

        let err = reader.poll().unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    #[test]
    fn reads_through_trait_object() {
        let memory = Arc::new(MemoryTransport::new());
        memory.push_inbound(&wire(&[0x01, 0x09, 0x04, 0x01, 0x01]));
        let transport: Arc<dyn Transport> = memory;

        let mut reader = FrameReader::with_config(transport, quick_config());
        assert_eq!(reader.read_frame().unwrap().id(), [0x01, 0x09]);
    }
}
