use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rapidha_schema::DecodedPacket;
use tracing::trace;

/// Handler invoked with the registration name and the matching packet.
pub type Callback = dyn Fn(&str, &DecodedPacket) + Send + Sync;

/// Filter deciding whether a registration sees a packet.
pub type Predicate = dyn Fn(&DecodedPacket) -> bool + Send + Sync;

struct Registration {
    key: u64,
    name: String,
    callback: Arc<Callback>,
    predicate: Arc<Predicate>,
}

/// Name-keyed fan-out of decoded packets to handlers.
///
/// Names need not be unique: unregistering a name removes every registration
/// carrying it. Callbacks run without the registration lock held, so they may
/// register and unregister freely, themselves included.
#[derive(Default)]
pub struct Dispatcher {
    registrations: Mutex<Vec<Arc<Registration>>>,
    next_key: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration.
    pub fn register<C, P>(&self, name: impl Into<String>, callback: C, predicate: P)
    where
        C: Fn(&str, &DecodedPacket) + Send + Sync + 'static,
        P: Fn(&DecodedPacket) -> bool + Send + Sync + 'static,
    {
        let registration = Registration {
            key: self.next_key.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            callback: Arc::new(callback),
            predicate: Arc::new(predicate),
        };
        trace!(name = %registration.name, "registering handler");
        self.lock().push(Arc::new(registration));
    }

    /// Remove every registration with this name. Returns how many were removed.
    pub fn unregister(&self, name: &str) -> usize {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.name != name);
        let removed = before - registrations.len();
        if removed > 0 {
            trace!(name, removed, "unregistered handler");
        }
        removed
    }

    /// Remove all registrations.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether at least one registration carries this name.
    pub fn contains(&self, name: &str) -> bool {
        self.lock()
            .iter()
            .any(|registration| registration.name == name)
    }

    /// Registration names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|registration| registration.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver a packet to every matching registration, in registration order.
    ///
    /// Works on a snapshot taken at entry. A registration removed by an
    /// earlier callback of the same pass is skipped; one added during the
    /// pass first sees the next packet. Returns the number of callbacks run.
    pub fn dispatch(&self, packet: &DecodedPacket) -> usize {
        let snapshot: Vec<Arc<Registration>> = self.lock().clone();

        let mut invoked = 0;
        for registration in snapshot {
            if !self.is_live(registration.key) {
                continue;
            }
            if (registration.predicate)(packet) {
                (registration.callback)(&registration.name, packet);
                invoked += 1;
            }
        }
        invoked
    }

    fn is_live(&self, key: u64) -> bool {
        self.lock()
            .iter()
            .any(|registration| registration.key == key)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Registration>>> {
        self.registrations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("names", &self.names())
            .finish()
    }
}
