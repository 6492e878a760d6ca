use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-memory transport: bytes pushed with [`push_inbound`](Self::push_inbound)
/// are read back by the driver, bytes the driver writes are captured.
///
/// Used to drive the protocol stack without hardware.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: Mutex<VecDeque<u8>>,
    outbound: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if received from the module.
    pub fn push_inbound(&self, bytes: &[u8]) {
        lock(&self.inbound).extend(bytes.iter().copied());
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.outbound).clone()
    }

    /// Drain and return everything written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.outbound))
    }
}

impl Transport for MemoryTransport {
    fn bytes_available(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(lock(&self.inbound).len())
    }

    fn read_byte(&self) -> Result<Option<u8>> {
        self.ensure_open()?;
        Ok(lock(&self.inbound).pop_front())
    }

    fn write_all(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        lock(&self.outbound).extend_from_slice(bytes);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl MemoryTransport {
    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn reads_inbound_in_order() {
        let transport = MemoryTransport::new();
        transport.push_inbound(&[0xF1, 0x55, 0x21]);

        assert_eq!(transport.bytes_available().unwrap(), 3);
        assert_eq!(transport.read_byte().unwrap(), Some(0xF1));
        assert_eq!(transport.read_byte().unwrap(), Some(0x55));
        assert_eq!(transport.read_byte().unwrap(), Some(0x21));
        assert_eq!(transport.read_byte().unwrap(), None);
    }

    #[test]
    fn captures_writes() {
        let transport = MemoryTransport::new();
        transport.write_all(b"abc").unwrap();
        transport.write_all(b"de").unwrap();

        assert_eq!(transport.written(), b"abcde");
        assert_eq!(transport.take_written(), b"abcde");
        assert!(transport.written().is_empty());
    }

    #[test]
    fn closed_transport_rejects_io() {
        let transport = MemoryTransport::new();
        transport.close().unwrap();

        assert!(transport.is_closed());
        assert!(matches!(transport.read_byte(), Err(TransportError::Closed)));
        assert!(matches!(
            transport.write_all(b"x"),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn concurrent_reader_and_writer() {
        let transport = Arc::new(MemoryTransport::new());
        transport.push_inbound(&[7; 128]);

        let reader = {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || {
                let mut count = 0;
                while let Some(byte) = transport.read_byte().unwrap() {
                    assert_eq!(byte, 7);
                    count += 1;
                }
                count
            })
        };

        for _ in 0..64 {
            transport.write_all(&[1]).unwrap();
        }

        assert_eq!(reader.join().unwrap(), 128);
        assert_eq!(transport.written().len(), 64);
    }
}
