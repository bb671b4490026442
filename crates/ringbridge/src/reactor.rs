use crate::adapter::RingDevice;
use crate::error::SyncError;
use crate::notify::RingNotifier;
use crate::system::SyncFlags;
use ringbridge_core::Direction;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// Notifier that wakes async tasks. A ring that happens while nobody waits
/// is remembered, so the next `ready()` returns immediately.
#[derive(Debug, Default)]
pub struct AsyncDoorbell {
    notify: Notify,
    rings: AtomicU64,
}

impl AsyncDoorbell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ready(&self) {
        self.notify.notified().await;
    }

    pub fn rings(&self) -> u64 {
        self.rings.load(Ordering::Acquire)
    }
}

impl RingNotifier for AsyncDoorbell {
    fn notify(&self) {
        self.rings.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_one();
    }
}

/// Sync RX until at least one slot is available to the consumer, parking on
/// `doorbell` in between. Returns the ring's `avail`.
pub async fn wait_rx(device: &dyn RingDevice, doorbell: &AsyncDoorbell) -> Result<u32, SyncError> {
    loop {
        device.sync(Direction::Rx, SyncFlags::empty())?;
        let avail = device.ring(Direction::Rx).avail();
        if avail > 0 {
            return Ok(avail);
        }
        doorbell.ready().await;
    }
}

/// Sync TX until at least `want` slots are free for the producer.
pub async fn wait_tx(
    device: &dyn RingDevice,
    doorbell: &AsyncDoorbell,
    want: u32,
) -> Result<u32, SyncError> {
    loop {
        device.sync(Direction::Tx, SyncFlags::empty())?;
        let avail = device.ring(Direction::Tx).avail();
        if avail >= want {
            return Ok(avail);
        }
        doorbell.ready().await;
    }
}
