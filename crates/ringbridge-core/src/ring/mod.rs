pub mod client;
pub mod index;
pub mod slot;

pub use client::RingClient;
pub use index::RingIdx;
pub use slot::{NetmapSlot, SlotFlags};

use memmap2::{MmapMut, MmapOptions};
use slot::SlotCell;
use std::io;
use std::mem;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[repr(C)]
struct RingHeader {
    num_slots: AtomicU32,
    buf_size: AtomicU32,
    cur: AtomicU32,
    avail: AtomicU32,
    reserved: AtomicU32,
    flags: AtomicU32,
}

const HEADER_LEN: usize = mem::size_of::<RingHeader>();

/// One direction of the shared ring: a header (`cur`, `avail`, `reserved`)
/// followed by `num_slots` slots, living in an anonymous mapping that both
/// the kernel side and the consumer side reference.
///
/// The header is the only synchronization point between the two sides.
/// Writers publish with `Release` and readers observe with `Acquire`, so
/// slot and buffer contents written before a cursor update are visible to
/// whoever reads that cursor.
pub struct NetmapRing {
    mmap: MmapMut,
    num_slots: u32,
    buf_size: u32,
    client_claimed: AtomicBool,
}

impl NetmapRing {
    pub(crate) fn new(num_slots: u32, buf_size: u32) -> io::Result<Self> {
        if num_slots < 2 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "ring needs at least 2 slots"));
        }
        let len = HEADER_LEN + (num_slots as usize) * mem::size_of::<SlotCell>();
        let mmap = MmapOptions::new().len(len).map_anon()?;

        let ring = Self {
            mmap,
            num_slots,
            buf_size,
            client_claimed: AtomicBool::new(false),
        };
        let header = ring.header();
        header.num_slots.store(num_slots, Ordering::Relaxed);
        header.buf_size.store(buf_size, Ordering::Relaxed);
        Ok(ring)
    }

    #[inline]
    fn header(&self) -> &RingHeader {
        // SAFETY: the mapping is page aligned, zero filled and at least
        // HEADER_LEN bytes long; all-zero is a valid RingHeader.
        unsafe { &*(self.mmap.as_ptr() as *const RingHeader) }
    }

    #[inline]
    fn cells(&self) -> &[SlotCell] {
        // SAFETY: the slot array directly follows the header, is 4-byte
        // aligned and was sized for num_slots cells at creation.
        unsafe {
            slice::from_raw_parts(
                self.mmap.as_ptr().add(HEADER_LEN) as *const SlotCell,
                self.num_slots as usize,
            )
        }
    }

    #[inline]
    fn cell(&self, idx: RingIdx) -> &SlotCell {
        debug_assert_eq!(idx.num_slots(), self.num_slots);
        &self.cells()[idx.get() as usize]
    }

    #[inline]
    pub fn num_slots(&self) -> u32 {
        self.num_slots
    }

    /// Highest valid slot position.
    #[inline]
    pub fn lim(&self) -> u32 {
        self.num_slots - 1
    }

    #[inline]
    pub fn buf_size(&self) -> u32 {
        self.buf_size
    }

    #[inline]
    pub fn idx(&self, pos: u32) -> Option<RingIdx> {
        RingIdx::new(pos, self.num_slots)
    }

    #[inline]
    pub fn cur(&self) -> u32 {
        self.header().cur.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_cur(&self, cur: u32) {
        self.header().cur.store(cur, Ordering::Release);
    }

    #[inline]
    pub fn avail(&self) -> u32 {
        self.header().avail.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_avail(&self, avail: u32) {
        self.header().avail.store(avail, Ordering::Release);
    }

    #[inline]
    pub fn add_avail(&self, n: u32) {
        self.header().avail.fetch_add(n, Ordering::AcqRel);
    }

    #[inline]
    pub fn reserved(&self) -> u32 {
        self.header().reserved.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_reserved(&self, reserved: u32) {
        self.header().reserved.store(reserved, Ordering::Release);
    }

    #[inline]
    pub fn slot(&self, idx: RingIdx) -> NetmapSlot {
        self.cell(idx).load()
    }

    #[inline]
    pub fn set_slot(&self, idx: RingIdx, slot: NetmapSlot) {
        self.cell(idx).store(slot);
    }

    #[inline]
    pub fn set_buf_idx(&self, idx: RingIdx, buf_idx: u32) {
        self.cell(idx).set_buf_idx(buf_idx);
    }

    #[inline]
    pub fn set_slot_len(&self, idx: RingIdx, len: u16) {
        self.cell(idx).set_len(len);
    }

    #[inline]
    pub fn set_slot_flags(&self, idx: RingIdx, flags: SlotFlags) {
        self.cell(idx).set_flags(flags);
    }

    #[inline]
    pub fn clear_slot_flags(&self, idx: RingIdx, flags: SlotFlags) {
        self.cell(idx).clear_flags(flags);
    }

    pub(crate) fn try_claim(&self) -> bool {
        self.client_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_claim(&self) {
        self.client_claimed.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for NetmapRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetmapRing")
            .field("num_slots", &self.num_slots)
            .field("cur", &self.cur())
            .field("avail", &self.avail())
            .field("reserved", &self.reserved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_is_zeroed() {
        let ring = NetmapRing::new(8, 2048).unwrap();
        assert_eq!(ring.cur(), 0);
        assert_eq!(ring.avail(), 0);
        assert_eq!(ring.reserved(), 0);
        assert_eq!(ring.lim(), 7);
        for pos in 0..8 {
            assert_eq!(ring.slot(ring.idx(pos).unwrap()), NetmapSlot::default());
        }
    }

    #[test]
    fn test_rejects_single_slot_ring() {
        assert!(NetmapRing::new(1, 2048).is_err());
    }

    #[test]
    fn test_slot_fields_are_independent() {
        let ring = NetmapRing::new(4, 2048).unwrap();
        let idx = ring.idx(3).unwrap();
        ring.set_buf_idx(idx, 42);
        ring.set_slot_len(idx, 60);
        ring.set_slot_flags(idx, SlotFlags::REPORT | SlotFlags::BUF_CHANGED);
        ring.clear_slot_flags(idx, SlotFlags::REPORT);

        let slot = ring.slot(idx);
        assert_eq!(slot.buf_idx, 42);
        assert_eq!(slot.len, 60);
        assert_eq!(slot.flags, SlotFlags::BUF_CHANGED);
    }

    #[test]
    fn test_single_client_claim() {
        let ring = NetmapRing::new(4, 2048).unwrap();
        assert!(ring.try_claim());
        assert!(!ring.try_claim());
        ring.release_claim();
        assert!(ring.try_claim());
    }
}
