use super::layout::BufferLayout;
use super::RESERVED_BUFFERS;
use memmap2::{MmapMut, MmapOptions};
use std::io;
use std::ptr::NonNull;
use std::slice;

/// Packet buffers shared by every ring of an adapter, addressed by index.
///
/// Index 0 is the sentinel "invalid buffer" and index 1 is reserved; a slot
/// naming either of them, or an index past the end of the pool, is a
/// protocol error.
pub struct BufferPool {
    #[allow(dead_code)]
    mmap: MmapMut,
    base: NonNull<u8>,
    layout: BufferLayout,
}

// SAFETY: the pool never hands out references on its own; every access goes
// through the unsafe accessors below whose callers own the buffer.
unsafe impl Send for BufferPool {}
unsafe impl Sync for BufferPool {}

impl BufferPool {
    pub fn new(layout: BufferLayout) -> io::Result<Self> {
        if layout.buf_count <= RESERVED_BUFFERS || layout.buf_size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty buffer pool"));
        }
        let mut mmap = MmapOptions::new().len(layout.size()).map_anon()?;
        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;
        Ok(Self { mmap, base, layout })
    }

    #[inline]
    pub fn buf_size(&self) -> u32 {
        self.layout.buf_size
    }

    #[inline]
    pub fn total_buffers(&self) -> u32 {
        self.layout.buf_count
    }

    #[inline]
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// True if `idx` names a real packet buffer.
    #[inline]
    pub fn is_valid(&self, idx: u32) -> bool {
        idx >= RESERVED_BUFFERS && idx < self.layout.buf_count
    }

    /// # Safety
    /// The caller must own buffer `idx` under the ring protocol: nobody
    /// writes it for the lifetime of the returned slice.
    #[inline]
    pub unsafe fn buffer(&self, idx: u32) -> Option<&[u8]> {
        if !self.is_valid(idx) {
            return None;
        }
        let offset = self.layout.idx_to_offset(idx)?;
        Some(slice::from_raw_parts(
            self.base.as_ptr().add(offset),
            self.layout.buf_size as usize,
        ))
    }

    /// # Safety
    /// The caller must own buffer `idx` exclusively under the ring protocol
    /// for the lifetime of the returned slice.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn buffer_mut(&self, idx: u32) -> Option<&mut [u8]> {
        if !self.is_valid(idx) {
            return None;
        }
        let offset = self.layout.idx_to_offset(idx)?;
        Some(slice::from_raw_parts_mut(
            self.base.as_ptr().add(offset),
            self.layout.buf_size as usize,
        ))
    }
}
