//! Shared-memory ring ABI: slots, buffer pool and the kernel-side ring
//! shadow that sync routines operate on.

pub mod kring;
pub mod mem;
pub mod ring;

pub use kring::{Direction, Kring};
pub use mem::{BufferLayout, BufferPool, MemLayout, NetmapMemory};
pub use ring::{NetmapRing, NetmapSlot, RingClient, RingIdx, SlotFlags};
