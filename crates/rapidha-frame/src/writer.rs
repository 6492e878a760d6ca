use std::sync::Arc;

use bytes::BytesMut;
use rapidha_transport::Transport;
use tracing::trace;

use crate::codec::encode_frame;
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Writes complete frames to a [`Transport`].
pub struct FrameWriter<T: ?Sized> {
    transport: Arc<T>,
    buf: BytesMut,
}

impl<T: Transport + ?Sized> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Frame an encoded command payload and write it (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, &mut self.buf);
        trace!(len = self.buf.len(), "writing frame");
        self.transport.write_all(&self.buf)?;
        Ok(())
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use rapidha_transport::{MemoryTransport, TransportError};

    use super::*;
    use crate::codec::{checksum, parse_frame, START_BYTE};
    use crate::error::FrameError;
    use crate::reader::FrameReader;

    fn payload(data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        out.extend_from_slice(&checksum(data).to_le_bytes());
        out
    }

    #[test]
    fn send_writes_marker_and_payload() {
        let transport = Arc::new(MemoryTransport::new());
        let mut writer = FrameWriter::new(Arc::clone(&transport));

        let encoded = payload(&[0x55, 0x00, 0x01, 0x00]);
        writer.send(&encoded).unwrap();

        let written = transport.take_written();
        assert_eq!(written[0], START_BYTE);
        assert_eq!(&written[1..], encoded.as_slice());
        assert_eq!(parse_frame(&written).unwrap().id(), [0x55, 0x00]);
    }

    #[test]
    fn consecutive_sends_do_not_share_bytes() {
        let transport = Arc::new(MemoryTransport::new());
        let mut writer = FrameWriter::new(Arc::clone(&transport));

        writer.send(&payload(&[0x55, 0x03, 0x01, 0x00])).unwrap();
        writer.send(&payload(&[0x01, 0x08, 0x02, 0x00])).unwrap();

        let written = transport.take_written();
        assert_eq!(written.len(), 14);
        assert_eq!(parse_frame(&written[..7]).unwrap().sequence(), 1);
        assert_eq!(parse_frame(&written[7..]).unwrap().sequence(), 2);
    }

    #[test]
    fn writer_output_reads_back() {
        let outbound = Arc::new(MemoryTransport::new());
        let mut writer = FrameWriter::new(Arc::clone(&outbound));
        writer.send(&payload(&[0x01, 0x09, 0x05, 0x01, 0x01])).unwrap();

        let inbound = Arc::new(MemoryTransport::new());
        inbound.push_inbound(&outbound.take_written());
        let mut reader = FrameReader::with_config(
            inbound,
            crate::codec::FrameConfig {
                idle_backoff: std::time::Duration::from_millis(1),
                read_timeout: Some(std::time::Duration::from_millis(50)),
            },
        );
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.sequence(), 5);
        assert_eq!(frame.fields(), &[0x01]);
    }

    #[test]
    fn closed_transport_fails_send() {
        let transport = Arc::new(MemoryTransport::new());
        transport.close().unwrap();
        let mut writer = FrameWriter::new(transport);

        let err = writer.send(&payload(&[0x55, 0x00, 0x01, 0x00])).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }
}
