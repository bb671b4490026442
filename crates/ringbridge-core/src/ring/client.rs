use crate::mem::BufferPool;
use crate::ring::NetmapRing;
use std::io;
use std::sync::Arc;

/// Consumer-side view of one ring, doing what a userspace program does
/// between two syncs: fill slots at `cur` on a TX ring, drain slots at
/// `cur` on an RX ring.
///
/// Only one client can hold a ring at a time; the claim is released on
/// drop. The client only touches the slots the ring currently grants to the
/// consumer (`cur .. cur + avail`).
pub struct RingClient {
    ring: Arc<NetmapRing>,
    pool: Arc<BufferPool>,
}

impl RingClient {
    /// Returns `None` if another client already holds the ring.
    pub fn claim(ring: Arc<NetmapRing>, pool: Arc<BufferPool>) -> Option<Self> {
        if !ring.try_claim() {
            return None;
        }
        Some(Self { ring, pool })
    }

    pub fn ring(&self) -> &NetmapRing {
        &self.ring
    }

    #[inline]
    pub fn cur(&self) -> u32 {
        self.ring.cur()
    }

    #[inline]
    pub fn avail(&self) -> u32 {
        self.ring.avail()
    }

    /// Keep the last `n` consumed RX slots out of the next release.
    pub fn set_reserved(&mut self, n: u32) {
        self.ring.set_reserved(n);
    }

    /// Copy `payload` into the slot at `cur` and hand it to the kernel side.
    /// The packet leaves on the next TX sync.
    pub fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let avail = self.ring.avail();
        if avail == 0 {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no free TX slot"));
        }
        if payload.len() > self.pool.buf_size() as usize {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "payload larger than a ring buffer"));
        }
        let cur = self
            .ring
            .idx(self.ring.cur())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "cursor out of range"))?;
        let slot = self.ring.slot(cur);

        // SAFETY: slot `cur` is inside the consumer-owned window (avail > 0)
        // and this client is the only consumer of the ring.
        let buf = unsafe { self.pool.buffer_mut(slot.buf_idx) }
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "slot names an invalid buffer"))?;
        buf[..payload.len()].copy_from_slice(payload);

        self.ring.set_slot_len(cur, payload.len() as u16);
        self.ring.set_cur(cur.next().get());
        self.ring.set_avail(avail - 1);
        Ok(())
    }

    /// Copy out the packet at `cur` and release the slot. Returns `None` when
    /// nothing is available or the slot names an invalid buffer.
    pub fn recv(&mut self) -> Option<Vec<u8>> {
        let avail = self.ring.avail();
        if avail == 0 {
            return None;
        }
        let cur = self.ring.idx(self.ring.cur())?;
        let slot = self.ring.slot(cur);

        // SAFETY: as in `send`, the slot belongs to the consumer window.
        let buf = unsafe { self.pool.buffer(slot.buf_idx) }?;
        let len = (slot.len as usize).min(buf.len());
        let data = buf[..len].to_vec();

        self.ring.set_cur(cur.next().get());
        self.ring.set_avail(avail - 1);
        Some(data)
    }
}

impl Drop for RingClient {
    fn drop(&mut self) {
        self.ring.release_claim();
    }
}
