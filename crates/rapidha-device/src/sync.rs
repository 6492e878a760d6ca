use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rapidha_schema::{CommandArgs, DecodedPacket};
use tracing::debug;

use crate::device::RapidHaDevice;
use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, Result};

static NEXT_SYNC_ID: AtomicU64 = AtomicU64::new(1);

/// Run `operation` and block until a packet matching `predicate` arrives.
///
/// A one-shot handler with a unique `sync-<n>` name is registered before the
/// operation runs and is gone when this returns, whatever the outcome.
pub fn call_sync<O, P>(
    dispatcher: &Arc<Dispatcher>,
    operation: O,
    predicate: P,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<DecodedPacket>
where
    O: FnOnce() -> Result<()>,
    P: Fn(&DecodedPacket) -> bool + Send + Sync + 'static,
{
    let name = format!("sync-{}", NEXT_SYNC_ID.fetch_add(1, Ordering::Relaxed));
    let slot: Arc<Mutex<Option<DecodedPacket>>> = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&slot);
    let bus = Arc::downgrade(dispatcher);
    dispatcher.register(
        name.clone(),
        move |name: &str, packet: &DecodedPacket| {
            if let Some(bus) = bus.upgrade() {
                bus.unregister(name);
            }
            let mut slot = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if slot.is_none() {
                *slot = Some(packet.clone());
            }
        },
        predicate,
    );

    if let Err(err) = operation() {
        dispatcher.unregister(&name);
        return Err(err);
    }

    let deadline = Instant::now() + timeout;
    loop {
        let received = slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(packet) = received {
            return Ok(packet);
        }

        let now = Instant::now();
        if now >= deadline {
            dispatcher.unregister(&name);
            debug!(handler = %name, ?timeout, "synchronous request timed out");
            return Err(DeviceError::Timeout(timeout));
        }
        thread::sleep(poll_interval.min(deadline - now));
    }
}

/// Blocking front end over a [`RapidHaDevice`]: each call sends a command and
/// waits for the response selected by a predicate.
#[derive(Debug, Clone, Copy)]
pub struct Synchronous<'a> {
    device: &'a RapidHaDevice,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a> Synchronous<'a> {
    pub(crate) fn new(device: &'a RapidHaDevice) -> Self {
        let config = device.config();
        Self {
            device,
            timeout: config.sync_timeout,
            poll_interval: config.sync_poll_interval,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `name` and wait for the first packet matching `predicate`.
    pub fn command<P>(&self, name: &str, args: &CommandArgs, predicate: P) -> Result<DecodedPacket>
    where
        P: Fn(&DecodedPacket) -> bool + Send + Sync + 'static,
    {
        call_sync(
            self.device.dispatcher(),
            || self.device.send_command(name, args).map(|_| ()),
            predicate,
            self.timeout,
            self.poll_interval,
        )
    }

    /// Send `name` and wait for the response called `response`.
    pub fn request(&self, name: &str, args: &CommandArgs, response: &'static str) -> Result<DecodedPacket> {
        self.command(name, args, move |packet: &DecodedPacket| packet.is(response))
    }

    pub fn module_info(&self) -> Result<DecodedPacket> {
        self.request("module_info", &CommandArgs::new(), "module_info_response")
    }

    pub fn network_status(&self) -> Result<DecodedPacket> {
        self.request("network_status", &CommandArgs::new(), "network_status_response")
    }

    /// Read one attribute of a remote node and wait for its value.
    pub fn read_attribute(
        &self,
        node: [u8; 2],
        endpoint: u8,
        cluster: [u8; 2],
        attribute: [u8; 2],
    ) -> Result<DecodedPacket> {
        call_sync(
            self.device.dispatcher(),
            || self.device.read_attribute(node, endpoint, cluster, attribute),
            move |packet: &DecodedPacket| {
                packet.is("read_zcl_attribute_response")
                    && packet.get("node").is_some_and(|value| value[..] == node)
                    && packet
                        .get("attribute")
                        .is_some_and(|value| value[..] == attribute)
            },
            self.timeout,
            self.poll_interval,
        )
    }
}
