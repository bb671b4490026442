pub mod rx;
pub mod shared;
pub mod tx;

pub use shared::CompletionCounter;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SyncFlags: u32 {
        /// Import queued packets even if no capture is pending.
        const FORCE_READ = 0x1;
    }
}

/// What one sync call moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// RX: packets copied from the FIFO into slots.
    pub imported: u32,
    /// RX: slots handed back by the consumer.
    pub released: u32,
    /// TX: slots submitted to the host stack.
    pub sent: u32,
    /// TX: completions turned back into free slots.
    pub completed: u32,
}

impl SyncReport {
    pub fn is_idle(&self) -> bool {
        *self == SyncReport::default()
    }
}
