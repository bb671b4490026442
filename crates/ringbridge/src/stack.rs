use crate::adapter::RingDevice;
use crate::error::StackError;
use crate::packet::{PacketBuf, TxBuf};
use std::sync::Arc;

/// What the capture hook did with a packet. Either way the packet is
/// consumed and never continues up the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxVerdict {
    Queued,
    Dropped,
}

/// Receive handler installed on the host interface while it is in ring mode.
/// Called once per inbound packet from whatever context the stack delivers
/// in; implementations must not block.
pub trait RxHook: Send + Sync {
    fn on_receive(&self, packet: PacketBuf) -> RxVerdict;
}

/// Result of handing a frame to the stack's send path.
#[derive(Debug)]
pub enum XmitOutcome {
    /// The stack owns the frame and will drop it once transmitted.
    Sent,
    /// Transient backpressure (queue full); the frame is handed back.
    Busy(TxBuf),
    /// The send path is broken; the frame is handed back.
    Failed(TxBuf, StackError),
}

/// The packet-oriented network stack of an interface without native ring
/// support.
pub trait HostStack: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Link state. TX sync makes no progress while this is false.
    fn carrier_ok(&self) -> bool;

    fn register_rx_handler(&self, hook: Arc<dyn RxHook>) -> Result<(), StackError>;

    fn unregister_rx_handler(&self);

    /// Toggle the interface's "in ring mode" capability bit.
    fn set_ring_capable(&self, enabled: bool);

    /// Allocate storage for an outgoing frame of `len` bytes without
    /// blocking. `None` means the allocation failed.
    fn alloc_tx_frame(&self, len: usize) -> Option<Vec<u8>> {
        let mut frame = Vec::new();
        frame.try_reserve_exact(len).ok()?;
        Some(frame)
    }

    fn queue_xmit(&self, buf: TxBuf) -> XmitOutcome;

    /// Drivers with their own ring support return their device here and the
    /// emulation is skipped.
    fn native_device(&self) -> Option<Arc<dyn RingDevice>> {
        None
    }
}
