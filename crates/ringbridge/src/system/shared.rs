use crate::notify::RingNotifier;
use crate::packet::PacketBuf;
use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// State the capture hook shares with RX sync.
///
/// The hook only pushes and RX sync only pops; `queued` bounds the FIFO
/// so concurrent hooks cannot overshoot the capacity. A packet is refused
/// only when the FIFO already holds more than `capacity` packets.
pub(crate) struct RxShared {
    queue: SegQueue<PacketBuf>,
    queued: AtomicUsize,
    capacity: usize,
    pending: AtomicBool,
    dropped: AtomicU64,
    oversized: AtomicU64,
}

impl RxShared {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: SegQueue::new(),
            queued: AtomicUsize::new(0),
            capacity,
            pending: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            oversized: AtomicU64::new(0),
        }
    }

    /// Hands the packet back if the FIFO already holds more than
    /// `capacity` packets.
    pub(crate) fn try_push(&self, packet: PacketBuf) -> Result<(), PacketBuf> {
        let capacity = self.capacity;
        let reserved = self
            .queued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n <= capacity).then_some(n + 1));
        if reserved.is_err() {
            return Err(packet);
        }
        self.queue.push(packet);
        Ok(())
    }

    pub(crate) fn pop(&self) -> Option<PacketBuf> {
        let packet = self.queue.pop()?;
        self.queued.fetch_sub(1, Ordering::AcqRel);
        Some(packet)
    }

    /// Drop everything still queued, returning how many packets went.
    pub(crate) fn purge(&self) -> usize {
        let mut purged = 0;
        while self.pop().is_some() {
            purged += 1;
        }
        purged
    }

    pub(crate) fn len(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    pub(crate) fn set_pending(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn clear_pending(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oversized(&self) {
        self.oversized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn oversized(&self) -> u64 {
        self.oversized.load(Ordering::Relaxed)
    }
}

/// Count of transmitted frames not yet seen by TX sync.
///
/// Only two operations exist: completion context increments by one, TX sync
/// reads and resets.
#[derive(Debug, Default)]
pub struct CompletionCounter {
    completed: AtomicU32,
}

impl CompletionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub fn take(&self) -> u32 {
        self.completed.swap(0, Ordering::AcqRel)
    }
}

/// State the completion handles share with TX sync.
pub(crate) struct TxShared {
    completed: CompletionCounter,
    notifier: Arc<dyn RingNotifier>,
}

impl TxShared {
    pub(crate) fn new(notifier: Arc<dyn RingNotifier>) -> Self {
        Self {
            completed: CompletionCounter::new(),
            notifier,
        }
    }

    pub(crate) fn complete(&self) {
        self.completed.increment();
        self.notifier.notify();
    }

    pub(crate) fn take_completed(&self) -> u32 {
        self.completed.take()
    }
}
