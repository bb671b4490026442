use std::io;
use thiserror::Error;

/// A consumer-side protocol violation (or an unrecoverable transmit path
/// failure) detected during sync. Always answered by a ring reinit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingViolation {
    #[error("cursor {cur} out of range (lim {lim})")]
    CursorOutOfRange { cur: u32, lim: u32 },

    #[error("slot {slot} names invalid buffer {buf_idx}")]
    InvalidBuffer { slot: u32, buf_idx: u32 },

    #[error("slot {slot} length {len} exceeds buffer size {max}")]
    OversizedSlot { slot: u32, len: u16, max: u32 },

    #[error("invalid reserve/avail {reserved}/{avail}")]
    ReservedOverflow { reserved: u32, avail: u32 },

    #[error("consumer released {released} slots but only {hw_avail} were granted")]
    CursorOverrun { released: u32, hw_avail: u32 },

    #[error("transmit buffer allocation failed ({len} bytes)")]
    AllocFailed { len: usize },

    #[error("transmit failed: {0}")]
    XmitFailed(StackError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("ring reinitialized after {violation} ({repaired} problems found)")]
    Reinit { violation: RingViolation, repaired: u32 },

    #[error("adapter is not in ring mode")]
    NotEnabled,
}

impl SyncError {
    pub fn violation(&self) -> Option<&RingViolation> {
        match self {
            SyncError::Reinit { violation, .. } => Some(violation),
            SyncError::NotEnabled => None,
        }
    }
}

/// Failures reported by the host network stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("receive handler already registered on {0}")]
    HandlerBusy(String),

    #[error("device {0} is down")]
    DeviceDown(String),

    #[error("driver error {0}")]
    Driver(i32),
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("interface {0} already has a ring adapter")]
    AlreadyAttached(String),

    #[error("interface {0} has no ring adapter")]
    NotAttached(String),

    #[error("adapter for {0} is already in ring mode")]
    AlreadyEnabled(String),

    #[error("failed to install receive hook: {0}")]
    HookInstall(#[from] StackError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}
