use crate::error::{RingViolation, SyncError};
use crate::notify::RingNotifier;
use crate::packet::PacketBuf;
use crate::stack::{RxHook, RxVerdict};
use crate::system::shared::RxShared;
use crate::system::{SyncFlags, SyncReport};
use log::{trace, warn};
use ringbridge_core::{Kring, RingIdx, SlotFlags};
use std::sync::Arc;

/// Capture hook: steals every inbound packet from the host stack and parks
/// it in the RX FIFO until the next RX sync.
pub(crate) struct RxBridge {
    shared: Arc<RxShared>,
    notifier: Arc<dyn RingNotifier>,
    max_len: usize,
}

impl RxBridge {
    pub(crate) fn new(shared: Arc<RxShared>, notifier: Arc<dyn RingNotifier>, max_len: usize) -> Self {
        Self {
            shared,
            notifier,
            max_len,
        }
    }
}

impl RxHook for RxBridge {
    fn on_receive(&self, packet: PacketBuf) -> RxVerdict {
        // Would never fit a slot.
        if packet.len() > self.max_len {
            self.shared.record_oversized();
            return RxVerdict::Dropped;
        }
        match self.shared.try_push(packet) {
            Ok(()) => {
                self.shared.set_pending();
                self.notifier.notify();
                RxVerdict::Queued
            }
            Err(_packet) => {
                self.shared.record_drop();
                RxVerdict::Dropped
            }
        }
    }
}

/// RX kring plus the import cursor: the next slot RX sync fills.
///
/// Invariant: `hw_avail == distance(hw_cur, import_cursor)`.
pub(crate) struct RxKring {
    name: String,
    kring: Kring,
    shared: Arc<RxShared>,
    import_cursor: RingIdx,
    no_pendintr: bool,
    reinits: u64,
}

impl RxKring {
    pub(crate) fn new(name: String, kring: Kring, shared: Arc<RxShared>, no_pendintr: bool) -> Self {
        let import_cursor = kring.hw_cur();
        Self {
            name,
            kring,
            shared,
            import_cursor,
            no_pendintr,
            reinits: 0,
        }
    }

    /// Start over with an empty ring and a fresh FIFO.
    pub(crate) fn reset(&mut self, shared: Arc<RxShared>) {
        self.kring.reset();
        self.shared = shared;
        self.import_cursor = self.kring.hw_cur();
    }

    pub(crate) fn kring(&self) -> &Kring {
        &self.kring
    }

    pub(crate) fn shared(&self) -> &Arc<RxShared> {
        &self.shared
    }

    pub(crate) fn import_cursor(&self) -> RingIdx {
        self.import_cursor
    }

    pub(crate) fn reinits(&self) -> u64 {
        self.reinits
    }

    pub(crate) fn sync(&mut self, flags: SyncFlags) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        let lim = self.kring.lim();
        let raw_cur = self.kring.ring().cur();
        let Some(cur) = self.kring.idx(raw_cur) else {
            return Err(self.reinit(RingViolation::CursorOutOfRange { cur: raw_cur, lim }));
        };

        if self.no_pendintr || flags.contains(SyncFlags::FORCE_READ) || self.shared.is_pending() {
            // Cleared before draining so a capture racing with the loop
            // leaves the flag set for the next sync.
            self.shared.clear_pending();
            let (imported, violation) = self.import();
            report.imported = imported;
            if let Some(violation) = violation {
                return Err(self.reinit(violation));
            }
        }

        report.released = self.release(cur)?;
        trace!(
            "{} rxsync: imported {} released {} hw_cur {} hw_avail {}",
            self.name,
            report.imported,
            report.released,
            self.kring.hw_cur().get(),
            self.kring.hw_avail()
        );
        Ok(report)
    }

    /// Move FIFO packets into slots, stopping one short of `hw_cur` so the
    /// import cursor never runs into slots the consumer still holds.
    fn import(&mut self) -> (u32, Option<RingViolation>) {
        let ring = self.kring.ring();
        let pool = self.kring.pool();
        let slot_flags = self.kring.slot_flags();
        let stop = self.kring.hw_cur().prev();

        let mut j = self.import_cursor;
        let mut n = 0;
        let mut violation = None;
        while j != stop {
            let slot = ring.slot(j);
            // SAFETY: slots from the import cursor up to hw_cur - 1 belong to
            // the kernel side; the consumer only sees them once avail is
            // published by `release`.
            let Some(buf) = (unsafe { pool.buffer_mut(slot.buf_idx) }) else {
                violation = Some(RingViolation::InvalidBuffer {
                    slot: j.get(),
                    buf_idx: slot.buf_idx,
                });
                break;
            };
            let Some(packet) = self.shared.pop() else {
                break;
            };
            let len = packet.len().min(buf.len());
            buf[..len].copy_from_slice(&packet.data()[..len]);
            ring.set_slot_len(j, len as u16);
            ring.set_slot_flags(j, slot_flags);
            j = j.next();
            n += 1;
        }

        if n > 0 {
            self.import_cursor = j;
            let hw_avail = self.kring.hw_avail() + n;
            self.kring.set_hw_avail(hw_avail);
        }
        (n, violation)
    }

    /// Take back the slots the consumer moved past (minus the ones it
    /// reserves) and publish the new `avail`.
    fn release(&mut self, cur: RingIdx) -> Result<u32, SyncError> {
        let ring = self.kring.ring_handle();
        let lim = self.kring.lim();
        let reserved = ring.reserved();
        let avail = ring.avail();

        if reserved > 0 && reserved.saturating_add(avail) > lim {
            ring.set_reserved(0);
            return Err(self.reinit(RingViolation::ReservedOverflow { reserved, avail }));
        }

        let hw_cur = self.kring.hw_cur();
        let hw_avail = self.kring.hw_avail();
        let target = cur.retreat(reserved);
        let released = hw_cur.distance_to(target);
        if released > hw_avail {
            return Err(self.reinit(RingViolation::CursorOverrun { released, hw_avail }));
        }
        let remaining = hw_avail - released;
        if reserved > remaining {
            return Err(self.reinit(RingViolation::CursorOverrun {
                released: released + reserved,
                hw_avail,
            }));
        }

        if released > 0 {
            for idx in hw_cur.until(target) {
                ring.clear_slot_flags(idx, SlotFlags::BUF_CHANGED);
            }
            self.kring.set_hw_cur(target);
            self.kring.set_hw_avail(remaining);
        }
        ring.set_avail(remaining - reserved);
        Ok(released)
    }

    fn reinit(&mut self, violation: RingViolation) -> SyncError {
        let repaired = self.kring.reinit();
        self.reinits += 1;
        warn!(
            "{} {} ring reinit: {} ({} problems found)",
            self.name,
            self.kring.direction(),
            violation,
            repaired
        );
        SyncError::Reinit { violation, repaired }
    }
}
