use crate::error::{RingViolation, SyncError};
use crate::packet::{TxBuf, TxCompletion};
use crate::stack::{HostStack, XmitOutcome};
use crate::system::shared::TxShared;
use crate::system::{SyncFlags, SyncReport};
use log::{debug, trace, warn};
use ringbridge_core::{Kring, NetmapRing, RingIdx, SlotFlags};
use std::sync::Arc;

/// TX kring plus the completion state shared with in-flight frames.
pub(crate) struct TxKring {
    name: String,
    kring: Kring,
    shared: Arc<TxShared>,
    priority: u32,
    soft_failures: u64,
    reinits: u64,
}

impl TxKring {
    pub(crate) fn new(name: String, kring: Kring, shared: Arc<TxShared>, priority: u32) -> Self {
        Self {
            name,
            kring,
            shared,
            priority,
            soft_failures: 0,
            reinits: 0,
        }
    }

    /// Start over with all slots free. Frames still in flight from before
    /// report into the old `shared` and are never counted here.
    pub(crate) fn reset(&mut self, shared: Arc<TxShared>) {
        self.kring.reset();
        self.shared = shared;
    }

    pub(crate) fn kring(&self) -> &Kring {
        &self.kring
    }

    pub(crate) fn soft_failures(&self) -> u64 {
        self.soft_failures
    }

    pub(crate) fn reinits(&self) -> u64 {
        self.reinits
    }

    pub(crate) fn sync<S: HostStack + ?Sized>(
        &mut self,
        stack: &S,
        _flags: SyncFlags,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        if !stack.carrier_ok() {
            trace!("{} txsync: carrier down", self.name);
            return Ok(report);
        }

        let ring = self.kring.ring_handle();
        // Read the producer cursor once; everything below works against this
        // snapshot even if the producer keeps going.
        let raw_cur = ring.cur();
        let lim = self.kring.lim();
        let Some(snapshot) = self.kring.idx(raw_cur) else {
            return Err(self.reinit(RingViolation::CursorOutOfRange { cur: raw_cur, lim }));
        };

        let hw_avail = self.kring.hw_avail();
        let pending = self.kring.hw_cur().distance_to(snapshot);
        if pending > hw_avail {
            return Err(self.reinit(RingViolation::CursorOverrun {
                released: pending,
                hw_avail,
            }));
        }

        let (sent, violation) = self.transmit(stack, &ring, snapshot);
        report.sent = sent;
        if let Some(violation) = violation {
            return Err(self.reinit(violation));
        }

        let completed = self.shared.take_completed();
        if completed > 0 {
            let hw_avail = self.kring.hw_avail() + completed;
            self.kring.set_hw_avail(hw_avail);
            ring.add_avail(completed);
        }
        report.completed = completed;

        trace!(
            "{} txsync: sent {} completed {} hw_cur {} hw_avail {}",
            self.name,
            report.sent,
            report.completed,
            self.kring.hw_cur().get(),
            self.kring.hw_avail()
        );
        Ok(report)
    }

    /// Copy every released slot up to `end` into a stack frame and submit it.
    /// Progress is committed to the kring even when the pass ends on a
    /// violation, so submitted slots are never sent twice.
    fn transmit<S: HostStack + ?Sized>(
        &mut self,
        stack: &S,
        ring: &NetmapRing,
        end: RingIdx,
    ) -> (u32, Option<RingViolation>) {
        let pool = self.kring.pool();
        let buf_size = pool.buf_size();

        let mut j = self.kring.hw_cur();
        let mut sent = 0;
        let mut violation = None;
        while j != end {
            let slot = ring.slot(j);
            // SAFETY: the producer released every slot between hw_cur and
            // the snapshot; they belong to the kernel side until hw_cur
            // moves past them.
            let Some(buf) = (unsafe { pool.buffer(slot.buf_idx) }) else {
                violation = Some(RingViolation::InvalidBuffer {
                    slot: j.get(),
                    buf_idx: slot.buf_idx,
                });
                break;
            };
            if slot.len as u32 > buf_size {
                violation = Some(RingViolation::OversizedSlot {
                    slot: j.get(),
                    len: slot.len,
                    max: buf_size,
                });
                break;
            }

            let len = slot.len as usize;
            let Some(mut frame) = stack.alloc_tx_frame(len) else {
                violation = Some(RingViolation::AllocFailed { len });
                break;
            };
            frame.clear();
            frame.extend_from_slice(&buf[..len]);
            let tx = TxBuf::new(frame, self.priority, TxCompletion::new(self.shared.clone()));

            match stack.queue_xmit(tx) {
                XmitOutcome::Sent => {}
                XmitOutcome::Busy(tx) => {
                    tx.discard();
                    self.soft_failures += 1;
                    debug!(
                        "{} txsync: send path busy at slot {} ({} sent this pass)",
                        self.name,
                        j.get(),
                        sent
                    );
                    break;
                }
                XmitOutcome::Failed(tx, err) => {
                    tx.discard();
                    violation = Some(RingViolation::XmitFailed(err));
                    break;
                }
            }

            ring.clear_slot_flags(j, SlotFlags::REPORT | SlotFlags::BUF_CHANGED);
            j = j.next();
            sent += 1;
        }

        if sent > 0 {
            let hw_avail = self.kring.hw_avail() - sent;
            self.kring.set_hw_cur(j);
            self.kring.set_hw_avail(hw_avail);
        }
        (sent, violation)
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
