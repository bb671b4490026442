use crate::mem::BufferPool;
use crate::ring::{NetmapRing, RingIdx, SlotFlags};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Tx,
    Rx,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Tx => f.write_str("TX"),
            Direction::Rx => f.write_str("RX"),
        }
    }
}

/// Kernel-side shadow of one ring.
///
/// `hw_cur` is the next slot the kernel side will drain (TX) or hand back
/// from the consumer (RX); `hw_avail` counts free slots (TX) or slots holding
/// fresh packets (RX). Only the sync path for this direction mutates it.
pub struct Kring {
    direction: Direction,
    ring: Arc<NetmapRing>,
    pool: Arc<BufferPool>,
    hw_cur: RingIdx,
    hw_avail: u32,
    slot_flags: SlotFlags,
}

impl Kring {
    pub fn new(direction: Direction, ring: Arc<NetmapRing>, pool: Arc<BufferPool>) -> Self {
        let hw_cur = RingIdx::zero(ring.num_slots());
        let mut kring = Self {
            direction,
            ring,
            pool,
            hw_cur,
            hw_avail: 0,
            slot_flags: SlotFlags::empty(),
        };
        kring.reset();
        kring
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn ring(&self) -> &NetmapRing {
        &self.ring
    }

    pub fn ring_handle(&self) -> Arc<NetmapRing> {
        self.ring.clone()
    }

    #[inline]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    #[inline]
    pub fn num_slots(&self) -> u32 {
        self.ring.num_slots()
    }

    #[inline]
    pub fn lim(&self) -> u32 {
        self.ring.lim()
    }

    #[inline]
    pub fn idx(&self, pos: u32) -> Option<RingIdx> {
        self.ring.idx(pos)
    }

    #[inline]
    pub fn hw_cur(&self) -> RingIdx {
        self.hw_cur
    }

    #[inline]
    pub fn set_hw_cur(&mut self, cur: RingIdx) {
        debug_assert_eq!(cur.num_slots(), self.num_slots());
        self.hw_cur = cur;
    }

    #[inline]
    pub fn hw_avail(&self) -> u32 {
        self.hw_avail
    }

    #[inline]
    pub fn set_hw_avail(&mut self, avail: u32) {
        debug_assert!(avail <= self.lim());
        self.hw_avail = avail;
    }

    /// Flags stamped on every slot the kernel side fills.
    #[inline]
    pub fn slot_flags(&self) -> SlotFlags {
        self.slot_flags
    }

    pub fn set_slot_flags(&mut self, flags: SlotFlags) {
        self.slot_flags = flags;
    }

    /// Bring kring and ring to the state of a freshly registered interface:
    /// nothing received, nothing in flight.
    pub fn reset(&mut self) {
        self.hw_cur = RingIdx::zero(self.num_slots());
        self.hw_avail = match self.direction {
            Direction::Rx => 0,
            Direction::Tx => self.lim(),
        };
        for idx in (0..self.num_slots()).filter_map(|pos| self.ring.idx(pos)) {
            self.ring.set_slot_len(idx, 0);
            self.ring.set_slot_flags(idx, SlotFlags::empty());
        }
        self.ring.set_reserved(0);
        self.ring.set_cur(0);
        self.ring.set_avail(self.hw_avail);
    }

    /// Recover from a protocol violation by the consumer.
    ///
    /// Slots naming an invalid buffer get the sentinel buffer and a zero
    /// length, oversized lengths are zeroed, and the consumer-visible
    /// `cur`/`avail`/`reserved` are restored from the kernel-side shadow
    /// rather than reset to empty, so slots still owned by the kernel side
    /// stay out of the consumer's window.
    /// Returns how many problems were found.
    pub fn reinit(&mut self) -> u32 {
        let ring = &*self.ring;
        let buf_size = self.pool.buf_size();
        let mut errors = 0;

        if ring.cur() > self.lim() {
            errors += 1;
        }
        for idx in (0..self.num_slots()).filter_map(|pos| ring.idx(pos)) {
            let slot = ring.slot(idx);
            if !self.pool.is_valid(slot.buf_idx) {
                errors += 1;
                ring.set_buf_idx(idx, 0);
                ring.set_slot_len(idx, 0);
            } else if slot.len as u32 > buf_size {
                errors += 1;
                ring.set_slot_len(idx, 0);
            }
        }

        ring.set_reserved(0);
        ring.set_cur(self.hw_cur.get());
        ring.set_avail(self.hw_avail);
        errors
    }
}

impl std::fmt::Debug for Kring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kring")
            .field("direction", &self.direction)
            .field("hw_cur", &self.hw_cur.get())
            .field("hw_avail", &self.hw_avail)
            .field("ring", &self.ring)
            .finish()
    }
}
