//! Reference-counted registry mapping `(port, baud)` to a single shared
//! [`zdt_transport::Bus`]. Mirrors a process-wide shared-interfaces table:
//! the first caller to acquire a key opens the transport; the last caller
//! to release it closes the transport. No two entries ever reference the
//! same physical port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::{debug, info};
use zdt_transport::Bus;
use zdt_types::Error;

/// Identifies one physical SLCAN gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusKey {
    pub port: String,
    pub baud: u32,
}

impl BusKey {
    pub fn new(port: impl Into<String>, baud: u32) -> Self {
        Self { port: port.into(), baud }
    }
}

struct Entry {
    bus: Arc<Mutex<Bus>>,
    refcount: usize,
}

static REGISTRY: Lazy<Mutex<HashMap<BusKey, Entry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide handle manager for shared SLCAN transports. Stateless by
/// design: all state lives in the static registry so that every
/// `BusCoordinator` (and every clone of one) observes the same transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusCoordinator;

impl BusCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Returns the shared transport for `key`, opening it if this is the
    /// first acquire, and incrementing its refcount otherwise.
    pub fn acquire(&self, key: &BusKey, open_timeout: Duration) -> Result<Arc<Mutex<Bus>>, Error> {
        self.acquire_with(key, || Bus::open(&key.port, key.baud, open_timeout))
    }

    /// Like [`acquire`](Self::acquire), but takes the opener as a closure so
    /// callers (and tests) can supply a transport without touching a real
    /// serial port.
    pub fn acquire_with(
        &self,
        key: &BusKey,
        open: impl FnOnce() -> Result<Bus, Error>,
    ) -> Result<Arc<Mutex<Bus>>, Error> {
        let mut registry = REGISTRY.lock().expect("bus registry poisoned");
        if let Some(entry) = registry.get_mut(key) {
            entry.refcount += 1;
            debug!(port = %key.port, baud = key.baud, refcount = entry.refcount, "acquired shared transport");
            return Ok(entry.bus.clone());
        }

        let bus = open()?;
        let handle = Arc::new(Mutex::new(bus));
        info!(port = %key.port, baud = key.baud, "opened new shared transport");
        registry.insert(
            key.clone(),
            Entry {
                bus: handle.clone(),
                refcount: 1,
            },
        );
        Ok(handle)
    }

    /// Decrements the refcount for `key`; closes and removes the transport
    /// once it reaches zero. Releasing a key that was never acquired (or
    /// already fully released) is a no-op.
    pub fn release(&self, key: &BusKey) {
        let mut registry = REGISTRY.lock().expect("bus registry poisoned");
        let Some(entry) = registry.get_mut(key) else {
            return;
        };
        entry.refcount = entry.refcount.saturating_sub(1);
        debug!(port = %key.port, baud = key.baud, refcount = entry.refcount, "released shared transport");
        if entry.refcount == 0 {
            if let Some(entry) = registry.remove(key) {
                entry.bus.lock().expect("bus mutex poisoned").close();
                info!(port = %key.port, baud = key.baud, "closed shared transport");
            }
        }
    }

    /// Returns the current refcount for `key`, or `None` if not open.
    pub fn refcount(&self, key: &BusKey) -> Option<usize> {
        REGISTRY.lock().expect("bus registry poisoned").get(key).map(|e| e.refcount)
    }

    /// Force-closes every open transport, regardless of refcount. Intended
    /// for process shutdown.
    pub fn close_all(&self) {
        let mut registry = REGISTRY.lock().expect("bus registry poisoned");
        for (key, entry) in registry.drain() {
            entry.bus.lock().expect("bus mutex poisoned").close();
            info!(port = %key.port, baud = key.baud, "closed shared transport (close_all)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, Write};

    struct NullSerial;
    impl Read for NullSerial {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }
    impl Write for NullSerial {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn mock_open() -> Result<Bus, Error> {
        Ok(Bus::from_io(Box::new(NullSerial)))
    }

    #[test]
    fn one_handle_is_shared_across_acquires() {
        let key = BusKey::new("mock-bus-a", 500_000);
        let coordinator = BusCoordinator::new();
        coordinator.close_all();

        let a = coordinator.acquire_with(&key, mock_open).unwrap();
        let b = coordinator.acquire_with(&key, mock_open).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(coordinator.refcount(&key), Some(2));

        coordinator.release(&key);
        assert_eq!(coordinator.refcount(&key), Some(1));
        coordinator.release(&key);
        assert_eq!(coordinator.refcount(&key), None);
    }

    #[test]
    fn release_of_unknown_key_is_a_no_op() {
        let key = BusKey::new("mock-bus-never-opened", 500_000);
        let coordinator = BusCoordinator::new();
        coordinator.release(&key);
        assert_eq!(coordinator.refcount(&key), None);
    }
}
