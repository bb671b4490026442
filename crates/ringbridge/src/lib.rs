//! Netmap-style ring I/O for interfaces without native ring support.
//!
//! A [`GenericAdapter`] sits between a [`HostStack`] and a pair of shared
//! memory rings: received packets are captured into a bounded FIFO and
//! copied into RX slots on sync, and slots released on the TX ring are
//! turned into stack frames whose completions free the slots again.

pub mod adapter;
pub mod builder;
pub mod config;
pub mod error;
pub mod notify;
pub mod packet;
pub mod registry;
pub mod stack;
pub mod system;

#[cfg(feature = "async")]
pub mod reactor;

#[cfg(feature = "simulator")]
pub mod simulator;

pub use adapter::{AdapterState, AdapterStats, GenericAdapter, KringStatus, RingDevice};
pub use builder::AdapterBuilder;
pub use config::AdapterConfig;
pub use error::{AdapterError, RingViolation, StackError, SyncError};
pub use notify::{Doorbell, RingNotifier};
pub use packet::{PacketBuf, TxBuf, TxCompletion};
pub use stack::{HostStack, RxHook, RxVerdict, XmitOutcome};
pub use system::{CompletionCounter, SyncFlags, SyncReport};

pub use ringbridge_core;
pub use ringbridge_core::{Direction, RingClient, SlotFlags};
