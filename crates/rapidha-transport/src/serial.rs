use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

type Port = Box<dyn serialport::SerialPort>;

/// Serial line settings applied when a port is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second. Default: 115200.
    pub baud_rate: u32,
    /// Upper bound on a single blocking read or write.
    pub timeout: Duration,
    /// Discard bytes buffered by the driver before this process opened the port.
    pub flush_on_open: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: SerialPort::DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(100),
            flush_on_open: true,
        }
    }
}

/// Serial port configured for 8N1 without flow control.
///
/// The port is split into a read half and a write half (`try_clone`) so the
/// reader thread never holds up a command being written.
pub struct SerialPort {
    reader: Mutex<Option<Port>>,
    writer: Mutex<Option<Port>>,
    closed: AtomicBool,
    path: PathBuf,
}

impl SerialPort {
    /// Default line speed for RapidHA modules.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Open and configure the serial device at `path`.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |source| TransportError::Open {
            path: path.clone(),
            source,
        };

        let reader = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(open_error)?;

        if config.flush_on_open {
            reader.clear(ClearBuffer::All).map_err(open_error)?;
        }
        let writer = reader.try_clone().map_err(open_error)?;

        info!(?path, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
            path,
        })
    }

    /// Device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn with_port<T>(half: &Mutex<Option<Port>>, op: impl FnOnce(&mut Port) -> Result<T>) -> Result<T> {
    let mut guard = lock(half);
    match guard.as_mut() {
        Some(port) => op(port),
        None => Err(TransportError::Closed),
    }
}

fn lock(half: &Mutex<Option<Port>>) -> MutexGuard<'_, Option<Port>> {
    half.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for SerialPort {
    fn bytes_available(&self) -> Result<usize> {
        with_port(&self.reader, |port| {
            let count = port.bytes_to_read().map_err(std::io::Error::from)?;
            Ok(usize::try_from(count).unwrap_or(usize::MAX))
        })
    }

    fn read_byte(&self) -> Result<Option<u8>> {
        with_port(&self.reader, |port| {
            if port.bytes_to_read().map_err(std::io::Error::from)? == 0 {
                return Ok(None);
            }
            let mut byte = [0u8; 1];
            match port.read(&mut byte) {
                Ok(1) => Ok(Some(byte[0])),
                Ok(_) => Ok(None),
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    Ok(None)
                }
                Err(err) => Err(TransportError::Io(err)),
            }
        })
    }

    fn write_all(&self, bytes: &[u8]) -> Result<()> {
        with_port(&self.writer, |port| {
            port.write_all(bytes)?;
            port.flush()?;
            Ok(())
        })
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let reader = lock(&self.reader).take();
        let writer = lock(&self.writer).take();
        if reader.is_some() || writer.is_some() {
            debug!(path = ?self.path, "closed serial port");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
