use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rapidha_frame::FrameWriter;
use rapidha_schema::constants::{cluster_type, trust_event};
use rapidha_schema::{CommandArgs, DecodedPacket, EncodedCommand, Registry};
use rapidha_transport::Transport;
use tracing::{debug, error, info, warn, Span};

use crate::config::DeviceConfig;
use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, Result};
use crate::reader::{ReaderHandle, ReaderLoop};
use crate::startup::{next_step, DeviceState};
use crate::sync::{call_sync, Synchronous};
use crate::timer::Timer;

/// Registration name of the bring-up handler.
pub const STARTUP_HANDLER: &str = "startup";
/// Registration name of the join-window handler.
pub const JOIN_HANDLER: &str = "network_device_trust_response";
/// Registration name of the persistent leave handler.
pub const LEAVE_HANDLER: &str = "leave_network";

/// Controller of one RapidHA module.
///
/// Owns the reader thread, the dispatch bus and the bring-up state machine.
/// Cloning yields another handle to the same module.
#[derive(Clone)]
pub struct RapidHaDevice {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    writer: Mutex<FrameWriter<dyn Transport>>,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    state: Mutex<DeviceState>,
    network_state: Mutex<Option<DecodedPacket>>,
    join_timer: Mutex<Option<Timer>>,
    /// Bumped by every join window; a timer only closes its own window.
    join_window: Arc<AtomicU64>,
    reader: Mutex<Option<ReaderHandle>>,
    config: DeviceConfig,
    span: Span,
}

impl RapidHaDevice {
    /// Create a controller without starting the reader or the bring-up.
    pub fn new(transport: Arc<dyn Transport>, config: DeviceConfig, span: Span) -> Result<Self> {
        let registry = Arc::new(Registry::standard()?);
        Ok(Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(FrameWriter::new(Arc::clone(&transport))),
                transport,
                registry,
                dispatcher: Arc::new(Dispatcher::new()),
                state: Mutex::new(DeviceState::WaitingStartupSync),
                network_state: Mutex::new(None),
                join_timer: Mutex::new(None),
                join_window: Arc::new(AtomicU64::new(0)),
                reader: Mutex::new(None),
                config,
                span,
            }),
        })
    }

    /// Create a controller, register the bring-up handler and start reading.
    pub fn start(transport: Arc<dyn Transport>, config: DeviceConfig, span: Span) -> Result<Self> {
        let device = Self::new(transport, config, span)?;
        device.setup_configuration();
        device.start_reader()?;
        Ok(device)
    }

    /// Spawn the reader thread. No-op while one is running.
    pub fn start_reader(&self) -> Result<()> {
        let mut reader = lock(&self.inner.reader);
        if reader.as_ref().is_some_and(ReaderHandle::is_running) {
            return Ok(());
        }
        if self.inner.transport.is_closed() {
            return Err(DeviceError::Halted);
        }

        let handle = ReaderLoop::new(
            Arc::clone(&self.inner.transport),
            Arc::clone(&self.inner.registry),
            Arc::clone(&self.inner.dispatcher),
            self.inner.config.frame.clone(),
        )
        .spawn(&self.inner.config.reader_thread_name, self.inner.span.clone())?;
        *reader = Some(handle);
        Ok(())
    }

    /// (Re)start the bring-up handshake from [`DeviceState::WaitingStartupSync`].
    pub fn setup_configuration(&self) {
        let _entered = self.inner.span.enter();
        *lock(&self.inner.state) = DeviceState::WaitingStartupSync;

        let device = Arc::downgrade(&self.inner);
        self.inner.dispatcher.unregister(STARTUP_HANDLER);
        self.inner.dispatcher.register(
            STARTUP_HANDLER,
            move |_: &str, packet: &DecodedPacket| {
                if let Some(inner) = device.upgrade() {
                    inner.on_startup_packet(packet);
                }
            },
            |_: &DecodedPacket| true,
        );
        debug!("bring-up handler registered");
    }

    /// Encode and send a catalog command. Returns what was sent.
    pub fn send_command(&self, name: &str, args: &CommandArgs) -> Result<EncodedCommand> {
        self.inner.send_command(name, args)
    }

    /// Open a join window and call `callback` for the first device that joins.
    ///
    /// Replaces any previous join window. The handler is dropped when the
    /// window closes without a join.
    pub fn add_device<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&str, &DecodedPacket) + Send + Sync + 'static,
    {
        let _entered = self.inner.span.enter();
        let dispatcher = &self.inner.dispatcher;

        let mut slot = lock(&self.inner.join_timer);
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let window = self.inner.join_window.fetch_add(1, Ordering::SeqCst) + 1;
        dispatcher.unregister(JOIN_HANDLER);

        let bus = Arc::downgrade(dispatcher);
        dispatcher.register(
            JOIN_HANDLER,
            move |name: &str, packet: &DecodedPacket| {
                if let Some(bus) = bus.upgrade() {
                    bus.unregister(JOIN_HANDLER);
                }
                callback(name, packet);
            },
            |packet: &DecodedPacket| {
                packet.is("network_device_trust_response")
                    && packet
                        .get_u8("event")
                        .is_some_and(|event| event != trust_event::DEVICE_LEFT)
            },
        );

        let bus = Arc::downgrade(dispatcher);
        let current = Arc::clone(&self.inner.join_window);
        let timer = Timer::start("join-window", self.inner.config.join_window, move || {
            // A newer window owns the handler now.
            if current.load(Ordering::SeqCst) != window {
                return;
            }
            if let Some(bus) = bus.upgrade() {
                if bus.unregister(JOIN_HANDLER) > 0 {
                    info!("join window closed without a new device");
                }
            }
        })?;
        *slot = Some(timer);
        drop(slot);

        self.send_command("permit_join", &CommandArgs::new())?;
        info!(window = ?self.inner.config.join_window, "join window opened");
        Ok(())
    }

    /// Call `callback` every time a device leaves the network.
    pub fn leave_network_handler<F>(&self, callback: F)
    where
        F: Fn(&str, &DecodedPacket) + Send + Sync + 'static,
    {
        self.inner.dispatcher.register(LEAVE_HANDLER, callback, |packet: &DecodedPacket| {
            packet.is("network_device_trust_response")
                && packet.get_u8("event") == Some(trust_event::DEVICE_LEFT)
        });
    }

    /// Restore module defaults and run the bring-up again.
    ///
    /// Every registration is dropped, including ones added by callers.
    pub fn reconfigure(&self) -> Result<()> {
        let _entered = self.inner.span.enter();
        info!("reconfiguring module");
        self.inner.dispatcher.clear();
        if let Some(timer) = lock(&self.inner.join_timer).take() {
            timer.cancel();
        }
        self.send_command("restore_defaults", &CommandArgs::new())?;
        self.setup_configuration();
        Ok(())
    }

    /// Whether the bring-up reached [`DeviceState::NetworkUp`].
    pub fn network(&self) -> bool {
        self.state() == DeviceState::NetworkUp
    }

    pub fn state(&self) -> DeviceState {
        *lock(&self.inner.state)
    }

    /// Most recent `network_status_response` seen during bring-up.
    pub fn network_state(&self) -> Option<DecodedPacket> {
        lock(&self.inner.network_state).clone()
    }

    /// Stop the reader thread, cancel timers and close the transport.
    pub fn halt(&self) -> Result<()> {
        let _entered = self.inner.span.enter();
        if let Some(mut reader) = lock(&self.inner.reader).take() {
            reader.shutdown();
        }
        if let Some(timer) = lock(&self.inner.join_timer).take() {
            timer.cancel();
        }
        self.inner.transport.close()?;
        info!("device halted");
        Ok(())
    }

    /// Ask a remote node for one attribute. The value arrives as a
    /// `read_zcl_attribute_response`.
    pub fn read_attribute(
        &self,
        node: [u8; 2],
        endpoint: u8,
        cluster: [u8; 2],
        attribute: [u8; 2],
    ) -> Result<()> {
        let args = CommandArgs::new()
            .with("node", node.to_vec())
            .with("endpoint", vec![endpoint])
            .with("cluster", cluster.to_vec())
            .with("is_server", vec![cluster_type::SERVER])
            .with("attrib_count", vec![0x01])
            .with("attrib_ids", attribute.to_vec());
        self.send_command("read_zcl_attribute", &args).map(|_| ())
    }

    /// Write one attribute of a remote node; `value` is in wire order.
    pub fn write_attribute(
        &self,
        node: [u8; 2],
        endpoint: u8,
        cluster: [u8; 2],
        attribute: [u8; 2],
        type_tag: u8,
        value: &[u8],
    ) -> Result<()> {
        let mut record = Vec::with_capacity(3 + value.len());
        record.extend_from_slice(&attribute);
        record.push(type_tag);
        record.extend_from_slice(value);

        let args = CommandArgs::new()
            .with("node", node.to_vec())
            .with("endpoint", vec![endpoint])
            .with("cluster", cluster.to_vec())
            .with("is_server", vec![cluster_type::SERVER])
            .with("attrib_count", vec![0x01])
            .with("attrib_value", record);
        self.send_command("write_zcl_attribute", &args).map(|_| ())
    }

    /// Run `operation` and wait for a packet matching `predicate`.
    pub fn call_sync<O, P>(&self, operation: O, predicate: P, timeout: Duration) -> Result<DecodedPacket>
    where
        O: FnOnce() -> Result<()>,
        P: Fn(&DecodedPacket) -> bool + Send + Sync + 'static,
    {
        call_sync(
            &self.inner.dispatcher,
            operation,
            predicate,
            timeout,
            self.inner.config.sync_poll_interval,
        )
    }

    /// Blocking request/response front end with the configured timeout.
    pub fn sync(&self) -> Synchronous<'_> {
        Synchronous::new(self)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }
}

impl fmt::Debug for RapidHaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapidHaDevice")
            .field("state", &self.state())
            .field("handlers", &self.inner.dispatcher.names())
            .finish()
    }
}

impl Inner {
    fn send_command(&self, name: &str, args: &CommandArgs) -> Result<EncodedCommand> {
        // Encoding under the writer lock keeps sequence numbers in wire order.
        let mut writer = lock(&self.writer);
        let encoded = self.registry.encode_command(name, args)?;
        writer.send(&encoded.bytes)?;
        debug!(command = encoded.name, sequence = encoded.sequence, "sent command");
        Ok(encoded)
    }

    fn on_startup_packet(&self, packet: &DecodedPacket) {
        let mut state = lock(&self.state);
        if state.tracks_network_status() && packet.is("network_status_response") {
            *lock(&self.network_state) = Some(packet.clone());
        }

        let Some(step) = next_step(*state, packet, self.registry.last_sequence()) else {
            return;
        };
        if let Some(command) = step.send {
            if let Err(err) = self.send_command(command.name(), &command.args()) {
                error!(command = command.name(), error = %err, "bring-up command failed");
                return;
            }
        }

        info!(from = %*state, to = %step.next, "bring-up state changed");
        *state = step.next;
        if step.next == DeviceState::NetworkUp {
            self.dispatcher.unregister(STARTUP_HANDLER);
            info!("network up");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.join_timer).take() {
            timer.cancel();
        }
        if lock(&self.reader).is_some() && !self.transport.is_closed() {
            warn!("device dropped without halt");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    use rapidha_frame::{checksum, parse_frame, Frame, FrameConfig, START_BYTE};
    use rapidha_transport::MemoryTransport;

    use super::*;

    fn wire(data: &[u8]) -> Vec<u8> {
        let mut raw = vec![START_BYTE];
        raw.extend_from_slice(data);
        raw.extend_from_slice(&checksum(data).to_le_bytes());
        raw
    }

    fn response(id: [u8; 2], frame_id: u8, fields: &[u8]) -> Vec<u8> {
        let mut data = vec![id[0], id[1], frame_id, fields.len() as u8];
        data.extend_from_slice(fields);
        wire(&data)
    }

    fn startup_sync(frame_id: u8, running: u8, config: u8) -> Vec<u8> {
        response([0x55, 0x21], frame_id, &[running, config])
    }

    fn status(frame_id: u8) -> Vec<u8> {
        response([0x55, 0x80], frame_id, &[0x00])
    }

    fn network_status(frame_id: u8, up: bool) -> Vec<u8> {
        let mut fields = vec![u8::from(up), 0x00, 0x0B, 0x00, 0x00, 0x34, 0x12];
        fields.extend_from_slice(&[0x00; 8]);
        fields.push(0x00);
        response([0x01, 0x09], frame_id, &fields)
    }

    fn trust(event: u8) -> Vec<u8> {
        let mut fields = vec![0x34, 0x12];
        fields.extend_from_slice(&[0x11; 8]);
        fields.extend_from_slice(&[event, 0x00, 0x00]);
        response([0x01, 0x10], 0, &fields)
    }

    fn quick_config() -> DeviceConfig {
        DeviceConfig {
            sync_poll_interval: Duration::from_millis(5),
            frame: FrameConfig {
                idle_backoff: Duration::from_millis(1),
                read_timeout: None,
            },
            ..DeviceConfig::default()
        }
    }

    fn frames(bytes: &[u8]) -> Vec<Frame> {
        let mut out = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let len = 5 + usize::from(rest[4]) + 2;
            out.push(parse_frame(&rest[..len]).expect("host frames should be valid"));
            rest = &rest[len..];
        }
        out
    }

    fn sent_names(device: &RapidHaDevice, bytes: &[u8]) -> Vec<&'static str> {
        frames(bytes)
            .iter()
            .map(|frame| {
                device
                    .registry()
                    .command_names()
                    .find(|name| device.registry().command(name).and_then(|c| c.id()) == Some(frame.id()))
                    .unwrap_or("?")
            })
            .collect()
    }

    fn wait_for(what: &str, condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn factory_module_bring_up_forms_network() {
        let transport = Arc::new(MemoryTransport::new());
        // Sequence numbers the host will use: reset 1, serial_ack 2,
        // host_startup_ready 3, device_type_write 4, clear_endpoint_config 5,
        // add_endpoint 6, add_attribute_to_cluster 7, startup_sync 8, form_network 9.
        for packet in [
            startup_sync(0, 0x00, 0x00),
            startup_sync(0, 0x00, 0x00),
            status(2),
            startup_sync(0, 0x00, 0x00),
            status(4),
            status(5),
            status(6),
            status(7),
            network_status(0, false),
            network_status(0, true),
        ] {
            transport.push_inbound(&packet);
        }

        let device = RapidHaDevice::start(transport.clone(), quick_config(), Span::none())
            .expect("device should start");
        wait_for("network up", || device.network());

        let written = transport.take_written();
        assert_eq!(
            sent_names(&device, &written),
            vec![
                "reset",
                "serial_ack",
                "host_startup_ready",
                "device_type_write",
                "clear_endpoint_config",
                "add_endpoint",
                "add_attribute_to_cluster",
                "startup_sync",
                "form_network",
            ]
        );

        let sent = frames(&written);
        let form = &sent[8];
        assert_eq!(form.sequence(), 9);
        assert_eq!(
            u32::from_le_bytes([form.fields()[0], form.fields()[1], form.fields()[2], form.fields()[3]]),
            0x03FF_F800
        );

        assert!(!device.dispatcher().contains(STARTUP_HANDLER));
        assert_eq!(
            device.network_state().and_then(|packet| packet.get_u8("network_status")),
            Some(0x01)
        );
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn running_module_skips_configuration() {
        let transport = Arc::new(MemoryTransport::new());
        for packet in [
            startup_sync(0, 0x01, 0x02),
            startup_sync(0, 0x01, 0x02),
            status(2),
            startup_sync(0, 0x01, 0x02),
            network_status(0, true),
        ] {
            transport.push_inbound(&packet);
        }

        let device = RapidHaDevice::start(transport.clone(), quick_config(), Span::none())
            .expect("device should start");
        wait_for("network up", || device.network());

        assert_eq!(
            sent_names(&device, &transport.take_written()),
            vec!["reset", "serial_ack", "host_startup_ready", "startup_sync"]
        );
        assert!(device.dispatcher().is_empty());
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn join_window_delivers_first_join_only() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");
        device.start_reader().expect("reader should start");

        let joins = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&joins);
        device
            .add_device(move |_: &str, _: &DecodedPacket| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("join window should open");

        let sent = frames(&transport.take_written());
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id(), [0x01, 0x03]);
        assert_eq!(sent[0].fields(), &[0x3C]);

        // A leave event does not complete the join.
        transport.push_inbound(&trust(0x03));
        transport.push_inbound(&trust(0x01));
        transport.push_inbound(&trust(0x01));
        wait_for("join", || joins.load(Ordering::SeqCst) > 0);
        wait_for("inbound drained", || transport.bytes_available().unwrap_or(0) == 0);
        thread::sleep(Duration::from_millis(20));

        assert_eq!(joins.load(Ordering::SeqCst), 1);
        assert!(!device.dispatcher().contains(JOIN_HANDLER));
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn join_window_expires() {
        let transport = Arc::new(MemoryTransport::new());
        let config = DeviceConfig {
            join_window: Duration::from_millis(30),
            ..quick_config()
        };
        let device = RapidHaDevice::new(transport, config, Span::none()).expect("device should build");

        device
            .add_device(|_: &str, _: &DecodedPacket| {})
            .expect("join window should open");
        assert!(device.dispatcher().contains(JOIN_HANDLER));

        wait_for("join window to close", || !device.dispatcher().contains(JOIN_HANDLER));
    }

    #[test]
    fn reopening_join_window_keeps_one_handler() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport, quick_config(), Span::none())
            .expect("device should build");

        for _ in 0..2 {
            device
                .add_device(|_: &str, _: &DecodedPacket| {})
                .expect("join window should open");
        }

        assert_eq!(device.dispatcher().names(), vec![JOIN_HANDLER.to_string()]);
    }

    #[test]
    fn reopened_window_outlives_the_first_deadline() {
        let transport = Arc::new(MemoryTransport::new());
        let config = DeviceConfig {
            join_window: Duration::from_millis(200),
            ..quick_config()
        };
        let device = RapidHaDevice::new(transport, config, Span::none()).expect("device should build");

        device
            .add_device(|_: &str, _: &DecodedPacket| {})
            .expect("first window should open");
        thread::sleep(Duration::from_millis(120));
        device
            .add_device(|_: &str, _: &DecodedPacket| {})
            .expect("second window should open");

        // Past the first window's deadline, inside the second one.
        thread::sleep(Duration::from_millis(130));
        assert!(device.dispatcher().contains(JOIN_HANDLER));

        wait_for("second window to close", || !device.dispatcher().contains(JOIN_HANDLER));
    }

    #[test]
    fn needs_endpoint_config_bring_up_waits_in_network_down() {
        let transport = Arc::new(MemoryTransport::new());
        // Host sequence numbers: reset 1, serial_ack 2, host_startup_ready 3,
        // clear_endpoint_config 4, add_endpoint 5, add_attribute_to_cluster 6,
        // startup_sync 7, form_network 8.
        for packet in [
            startup_sync(0, 0x00, 0x01),
            startup_sync(0, 0x00, 0x01),
            status(2),
            startup_sync(0, 0x00, 0x01),
            status(4),
            status(5),
            status(6),
            network_status(0, false),
        ] {
            transport.push_inbound(&packet);
        }

        let device = RapidHaDevice::start(transport.clone(), quick_config(), Span::none())
            .expect("device should start");
        wait_for("network down", || device.state() == DeviceState::NetworkDown);

        let written = transport.take_written();
        assert_eq!(
            sent_names(&device, &written),
            vec![
                "reset",
                "serial_ack",
                "host_startup_ready",
                "clear_endpoint_config",
                "add_endpoint",
                "add_attribute_to_cluster",
                "startup_sync",
                "form_network",
            ]
        );
        let forms: Vec<Frame> = frames(&written)
            .into_iter()
            .filter(|frame| frame.id() == [0x01, 0x01])
            .collect();
        assert_eq!(forms.len(), 1);
        assert_eq!(&forms[0].fields()[..4], &[0x00, 0xF8, 0xFF, 0x03]);
        assert!(device.dispatcher().contains(STARTUP_HANDLER));
        assert_eq!(
            device.network_state().and_then(|packet| packet.get_u8("network_status")),
            Some(0x00)
        );

        transport.push_inbound(&network_status(0, true));
        wait_for("network up", || device.network());

        assert_eq!(device.state(), DeviceState::NetworkUp);
        assert!(!device.dispatcher().contains(STARTUP_HANDLER));
        assert!(transport.take_written().is_empty());
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn leave_handler_is_persistent() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");
        device.start_reader().expect("reader should start");

        let leaves = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&leaves);
        device.leave_network_handler(move |name: &str, _: &DecodedPacket| {
            assert_eq!(name, LEAVE_HANDLER);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        transport.push_inbound(&trust(0x03));
        transport.push_inbound(&trust(0x01));
        transport.push_inbound(&trust(0x03));
        wait_for("two leaves", || leaves.load(Ordering::SeqCst) == 2);
        assert!(device.dispatcher().contains(LEAVE_HANDLER));
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn reconfigure_restores_defaults_and_restarts() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");
        device.leave_network_handler(|_: &str, _: &DecodedPacket| {});

        device.reconfigure().expect("reconfigure should succeed");

        assert_eq!(device.state(), DeviceState::WaitingStartupSync);
        assert_eq!(device.dispatcher().names(), vec![STARTUP_HANDLER.to_string()]);
        let sent = frames(&transport.take_written());
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id(), [0x55, 0x10]);
    }

    #[test]
    fn attribute_helpers_encode_records() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");

        device
            .read_attribute([0x34, 0x12], 0x01, [0x01, 0x02], [0x1C, 0x00])
            .expect("read should send");
        device
            .write_attribute([0x34, 0x12], 0x01, [0x01, 0x02], [0x1C, 0x00], 0x30, &[0x04])
            .expect("write should send");

        let sent = frames(&transport.take_written());
        assert_eq!(sent[0].id(), [0x05, 0x30]);
        assert_eq!(sent[0].fields(), &[0x34, 0x12, 0x01, 0x01, 0x02, 0x01, 0x01, 0x1C, 0x00]);
        assert_eq!(sent[1].id(), [0x05, 0x32]);
        assert_eq!(
            sent[1].fields(),
            &[0x34, 0x12, 0x01, 0x01, 0x02, 0x01, 0x01, 0x1C, 0x00, 0x30, 0x04]
        );
    }

    #[test]
    fn sync_module_info_round_trip() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");
        device.start_reader().expect("reader should start");

        let mut info = vec![0x01, 0x02, 0x03, 0x00, 0x00];
        info.extend_from_slice(&[0xAB; 8]);
        info.extend_from_slice(&[0x01, 0x02]);
        let inbound = Arc::clone(&transport);
        let responder = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            inbound.push_inbound(&response([0x55, 0x03], 1, &info));
        });

        let packet = device.sync().module_info().expect("module info should arrive");
        responder.join().expect("responder should finish");
        assert_eq!(packet.get_u8("major_firmware_version"), Some(0x01));
        assert!(device.dispatcher().is_empty());
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn sync_read_attribute_waits_for_matching_attribute() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::new(transport.clone(), quick_config(), Span::none())
            .expect("device should build");
        device.start_reader().expect("reader should start");

        let attribute_response = |attribute: [u8; 2], value: u8| {
            let mut fields = vec![0x34, 0x12, 0x01, 0x01, 0x02, 0x01];
            fields.extend_from_slice(&attribute);
            fields.extend_from_slice(&[0x00, 0x30, value]);
            response([0x05, 0x31], 0, &fields)
        };
        let other = attribute_response([0x12, 0x00], 0x07);
        let wanted = attribute_response([0x1C, 0x00], 0x04);
        let inbound = Arc::clone(&transport);
        let responder = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            inbound.push_inbound(&other);
            inbound.push_inbound(&wanted);
        });

        let packet = device
            .sync()
            .read_attribute([0x34, 0x12], 0x01, [0x01, 0x02], [0x1C, 0x00])
            .expect("attribute should arrive");
        responder.join().expect("responder should finish");

        assert_eq!(
            packet.attribute_value().expect("value should decode"),
            Some(rapidha_schema::ScalarValue::Unsigned(4))
        );
        assert!(device.dispatcher().is_empty());
        device.halt().expect("halt should succeed");
    }

    #[test]
    fn halt_closes_transport_and_blocks_restart() {
        let transport = Arc::new(MemoryTransport::new());
        let device = RapidHaDevice::start(transport.clone(), quick_config(), Span::none())
            .expect("device should start");

        device.halt().expect("halt should succeed");
        assert!(transport.is_closed());
        assert!(matches!(device.start_reader(), Err(DeviceError::Halted)));
        assert!(matches!(
            device.send_command("reset", &CommandArgs::new()),
            Err(DeviceError::Frame(_))
        ));
    }
}
