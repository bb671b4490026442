/// Geometry of the buffer pool: `buf_count` buffers of `buf_size` bytes,
/// laid out back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub buf_size: u32,
    pub buf_count: u32,
}

impl BufferLayout {
    pub fn new(buf_size: u32, buf_count: u32) -> Self {
        Self { buf_size, buf_count }
    }

    pub fn size(&self) -> usize {
        (self.buf_size as usize) * (self.buf_count as usize)
    }

    #[inline]
    pub fn idx_to_offset(&self, idx: u32) -> Option<usize> {
        if idx >= self.buf_count {
            return None;
        }
        Some((idx as usize) * (self.buf_size as usize))
    }
}

/// Sizes of everything the memory allocator hands out for one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemLayout {
    pub buf_size: u32,
    pub tx_slots: u32,
    pub rx_slots: u32,
}

impl MemLayout {
    pub fn new(buf_size: u32, tx_slots: u32, rx_slots: u32) -> Self {
        Self {
            buf_size,
            tx_slots,
            rx_slots,
        }
    }

    pub fn buffers(&self) -> BufferLayout {
        BufferLayout::new(
            self.buf_size,
            super::RESERVED_BUFFERS + self.tx_slots + self.rx_slots,
        )
    }
}
