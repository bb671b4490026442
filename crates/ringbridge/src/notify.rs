use std::sync::atomic::{AtomicU64, Ordering};

/// Wakes whatever waits for ring readiness (a poller, a select loop, an
/// async task). Called from capture and completion context, so it must not
/// block.
pub trait RingNotifier: Send + Sync {
    fn notify(&self);
}

/// Notifier that only counts how often it was rung.
#[derive(Debug, Default)]
pub struct Doorbell {
    rings: AtomicU64,
}

impl Doorbell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rings(&self) -> u64 {
        self.rings.load(Ordering::Acquire)
    }
}

impl RingNotifier for Doorbell {
    fn notify(&self) {
        self.rings.fetch_add(1, Ordering::AcqRel);
    }
}
