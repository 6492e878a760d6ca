use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rapidha_frame::{FrameConfig, FrameError, FrameReader, ReadEvent};
use rapidha_schema::Registry;
use rapidha_transport::{Transport, TransportError};
use tracing::{debug, trace, warn, Span};

use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, Result};

/// Background thread turning transport bytes into dispatched packets.
///
/// Frames are decoded and dispatched in arrival order; every callback for
/// one packet runs before the next byte is read. Bad frames are logged and
/// skipped. The loop ends only when stopped.
pub struct ReaderLoop<T: ?Sized> {
    reader: FrameReader<T>,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    stop: Arc<AtomicBool>,
}

impl<T: Transport + ?Sized + 'static> ReaderLoop<T> {
    pub fn new(
        transport: Arc<T>,
        registry: Arc<Registry>,
        dispatcher: Arc<Dispatcher>,
        config: FrameConfig,
    ) -> Self {
        Self {
            reader: FrameReader::with_config(transport, config),
            registry,
            dispatcher,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the loop on a named thread; all events are emitted inside `span`.
    pub fn spawn(self, thread_name: &str, span: Span) -> Result<ReaderHandle> {
        let stop = Arc::clone(&self.stop);
        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let _entered = span.enter();
                self.run();
            })
            .map_err(DeviceError::Spawn)?;

        Ok(ReaderHandle {
            stop,
            thread: Some(thread),
        })
    }

    /// Run on the current thread until the stop flag is set.
    pub fn run(mut self) {
        debug!("reader loop started");
        while !self.stop.load(Ordering::SeqCst) {
            self.step();
        }
        debug!("reader loop stopped");
    }

    /// Consume at most one byte and act on it.
    pub fn step(&mut self) {
        let backoff = self.reader.config().idle_backoff;
        match self.reader.poll() {
            Ok(ReadEvent::Idle) => thread::sleep(backoff),
            Ok(ReadEvent::Pending) => {}
            Ok(ReadEvent::Frame(frame)) => match self.registry.decode_response(frame.data()) {
                Ok(packet) => {
                    trace!(packet = %packet, "received");
                    let invoked = self.dispatcher.dispatch(&packet);
                    if invoked == 0 {
                        debug!(id = packet.id(), "no handler matched packet");
                    }
                }
                Err(err) => warn!(error = %err, "dropping undecodable frame"),
            },
            Ok(ReadEvent::Dropped(err)) => warn!(error = %err, "dropping corrupt frame"),
            Err(FrameError::Transport(TransportError::Closed)) => {
                trace!("transport closed");
                thread::sleep(backoff);
            }
            Err(err) => {
                warn!(error = %err, "transport read failed");
                thread::sleep(backoff);
            }
        }
    }

    /// Flag that stops this loop, for callers driving [`run`](Self::run) themselves.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

/// Handle to a running [`ReaderLoop`] thread.
#[derive(Debug)]
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    /// Ask the loop to exit after its current iteration.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stop the loop and wait for the thread to exit.
    ///
    /// Called from the reader thread itself (inside a callback), this only
    /// sets the stop flag.
    pub fn shutdown(&mut self) {
        self.stop();
        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == thread::current().id() {
            return;
        }
        if thread.join().is_err() {
            warn!("reader thread panicked");
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use rapidha_frame::{checksum, START_BYTE};
    use rapidha_schema::DecodedPacket;
    use rapidha_transport::MemoryTransport;

    use super::*;

    fn wire(data: &[u8]) -> Vec<u8> {
        let mut raw = vec![START_BYTE];
        raw.extend_from_slice(data);
        raw.extend_from_slice(&checksum(data).to_le_bytes());
        raw
    }

    fn quick() -> FrameConfig {
        FrameConfig {
            idle_backoff: Duration::from_millis(1),
            read_timeout: None,
        }
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn collecting(dispatcher: &Dispatcher) -> Arc<Mutex<Vec<DecodedPacket>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.register(
            "collect",
            move |_: &str, packet: &DecodedPacket| sink.lock().unwrap().push(packet.clone()),
            |_: &DecodedPacket| true,
        );
        seen
    }

    #[test]
    fn garbage_then_frame_yields_one_packet() {
        let transport = Arc::new(MemoryTransport::new());
        let registry = Arc::new(Registry::standard().unwrap());
        let dispatcher = Arc::new(Dispatcher::new());
        let seen = collecting(&dispatcher);

        transport.push_inbound(&[0x00, 0x13, 0x37, 0xFF]);
        transport.push_inbound(&wire(&[0x55, 0x21, 0x04, 0x02, 0x00, 0x02]));

        let mut handle = ReaderLoop::new(Arc::clone(&transport), registry, dispatcher, quick())
            .spawn("reader-test", Span::none())
            .expect("reader should start");

        wait_for(|| !seen.lock().unwrap().is_empty());
        handle.shutdown();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id(), "startup_sync");
        assert_eq!(seen[0].frame_id(), 4);
        assert!(!handle.is_running());
    }

    #[test]
    fn bad_frames_do_not_stop_the_loop() {
        let transport = Arc::new(MemoryTransport::new());
        let registry = Arc::new(Registry::standard().unwrap());
        let dispatcher = Arc::new(Dispatcher::new());
        let seen = collecting(&dispatcher);

        let mut corrupt = wire(&[0x55, 0x80, 0x01, 0x01, 0x00]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x5A;
        transport.push_inbound(&corrupt);
        // unknown response id
        transport.push_inbound(&wire(&[0x77, 0x77, 0x02, 0x01, 0x00]));
        // command echo
        transport.push_inbound(&wire(&[0x01, 0x01, 0x03, 0x01, 0x00]));
        // overlong status response
        transport.push_inbound(&wire(&[0x55, 0x80, 0x04, 0x04, 0x00, 0x00, 0x00, 0x00]));
        transport.push_inbound(&wire(&[0x55, 0x80, 0x05, 0x01, 0x00]));

        let mut handle = ReaderLoop::new(Arc::clone(&transport), registry, dispatcher, quick())
            .spawn("reader-test", Span::none())
            .expect("reader should start");

        wait_for(|| !seen.lock().unwrap().is_empty());
        handle.shutdown();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].frame_id(), 5);
    }

    #[test]
    fn closed_transport_keeps_loop_alive_until_stopped() {
        let transport = Arc::new(MemoryTransport::new());
        transport.close().unwrap();

        let mut handle = ReaderLoop::new(
            transport,
            Arc::new(Registry::standard().unwrap()),
            Arc::new(Dispatcher::new()),
            quick(),
        )
        .spawn("reader-test", Span::none())
        .expect("reader should start");

        thread::sleep(Duration::from_millis(20));
        assert!(handle.is_running());
        handle.shutdown();
        assert!(!handle.is_running());
    }

    #[test]
    fn step_drives_loop_on_caller_thread() {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Arc::new(Dispatcher::new());
        let seen = collecting(&dispatcher);
        let mut data = vec![0x01, 0x09, 0x01, 0x10, 0x01, 0x00, 0x0B, 0x34, 0x12, 0x00, 0x00];
        data.extend_from_slice(&[0x00; 8]);
        data.push(0x00);
        let raw = wire(&data);
        transport.push_inbound(&raw);

        let mut reader = ReaderLoop::new(
            transport,
            Arc::new(Registry::standard().unwrap()),
            dispatcher,
            quick(),
        );
        for _ in 0..raw.len() {
            reader.step();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get_u8("network_status"), Some(0x01));
        assert_eq!(seen[0].get_u8("channel"), Some(0x0B));
    }
}
