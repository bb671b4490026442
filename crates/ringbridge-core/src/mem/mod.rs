pub mod layout;
pub mod pool;

pub use layout::{BufferLayout, MemLayout};
pub use pool::BufferPool;

use crate::ring::{NetmapRing, NetmapSlot, SlotFlags};
use crate::Direction;
use std::io;
use std::sync::Arc;

/// Buffer indices below this value are never handed to a slot.
pub const RESERVED_BUFFERS: u32 = 2;

/// Largest buffer a slot can describe (`len` is 16 bits wide).
pub const MAX_BUF_SIZE: u32 = u16::MAX as u32;

/// Everything one adapter shares with its consumer: the buffer pool and one
/// TX and one RX ring whose slots each own a distinct pool buffer.
pub struct NetmapMemory {
    pool: Arc<BufferPool>,
    tx: Arc<NetmapRing>,
    rx: Arc<NetmapRing>,
}

impl NetmapMemory {
    pub fn new(layout: MemLayout) -> io::Result<Self> {
        if layout.buf_size == 0 || layout.buf_size > MAX_BUF_SIZE {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "buffer size out of range"));
        }
        let pool = Arc::new(BufferPool::new(layout.buffers())?);
        let tx = NetmapRing::new(layout.tx_slots, layout.buf_size)?;
        let rx = NetmapRing::new(layout.rx_slots, layout.buf_size)?;

        assign_buffers(&tx, RESERVED_BUFFERS);
        assign_buffers(&rx, RESERVED_BUFFERS + layout.tx_slots);

        Ok(Self {
            pool,
            tx: Arc::new(tx),
            rx: Arc::new(rx),
        })
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn ring(&self, direction: Direction) -> &Arc<NetmapRing> {
        match direction {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        }
    }
}

fn assign_buffers(ring: &NetmapRing, first: u32) {
    for pos in 0..ring.num_slots() {
        if let Some(idx) = ring.idx(pos) {
            ring.set_slot(
                idx,
                NetmapSlot {
                    buf_idx: first + pos,
                    len: 0,
                    flags: SlotFlags::empty(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_slot_owns_a_distinct_valid_buffer() {
        let mem = NetmapMemory::new(MemLayout::new(2048, 8, 16)).unwrap();
        let mut seen = HashSet::new();
        for direction in [Direction::Tx, Direction::Rx] {
            let ring = mem.ring(direction);
            for pos in 0..ring.num_slots() {
                let buf_idx = ring.slot(ring.idx(pos).unwrap()).buf_idx;
                assert!(mem.pool().is_valid(buf_idx));
                assert!(seen.insert(buf_idx), "buffer {} assigned twice", buf_idx);
            }
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_rejects_oversized_buffers() {
        assert!(NetmapMemory::new(MemLayout::new(70_000, 8, 8)).is_err());
    }
}
