use bitflags::bitflags;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SlotFlags: u16 {
        /// The consumer swapped the buffer index since the last sync.
        const BUF_CHANGED = 0x0001;
        /// Ask for a completion report on this slot.
        const REPORT = 0x0002;
        /// Forward the slot to the host stack instead of the NIC.
        const FORWARD = 0x0004;
    }
}

/// Value copy of one ring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetmapSlot {
    pub buf_idx: u32,
    pub len: u16,
    pub flags: SlotFlags,
}

/// In-memory representation of a slot. Same layout as the classic
/// `struct netmap_slot { uint32_t buf_idx; uint16_t len; uint16_t flags; }`,
/// but every field is an atomic so both sides can touch it through `&`.
#[repr(C)]
pub(crate) struct SlotCell {
    buf_idx: AtomicU32,
    len: AtomicU16,
    flags: AtomicU16,
}

impl SlotCell {
    #[inline]
    pub(crate) fn load(&self) -> NetmapSlot {
        NetmapSlot {
            buf_idx: self.buf_idx.load(Ordering::Relaxed),
            len: self.len.load(Ordering::Relaxed),
            flags: SlotFlags::from_bits_retain(self.flags.load(Ordering::Relaxed)),
        }
    }

    #[inline]
    pub(crate) fn store(&self, slot: NetmapSlot) {
        self.buf_idx.store(slot.buf_idx, Ordering::Relaxed);
        self.len.store(slot.len, Ordering::Relaxed);
        self.flags.store(slot.flags.bits(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_buf_idx(&self, idx: u32) {
        self.buf_idx.store(idx, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_len(&self, len: u16) {
        self.len.store(len, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_flags(&self, flags: SlotFlags) {
        self.flags.store(flags.bits(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn clear_flags(&self, flags: SlotFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::Relaxed);
    }
}
