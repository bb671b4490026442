//! In-process host stack for driving an adapter without a real interface.

use crate::error::StackError;
use crate::packet::{PacketBuf, TxBuf};
use crate::stack::{HostStack, RxHook, RxVerdict, XmitOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A frame that left through the simulated wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimFrame {
    pub data: Vec<u8>,
    pub priority: u32,
}

/// Simulated network interface.
///
/// Accepted frames sit in a device queue until [`SimStack::complete`] drops
/// them onto the wire, which is when their completions fire.
pub struct SimStack {
    name: String,
    carrier: AtomicBool,
    ring_capable: AtomicBool,
    hook: Mutex<Option<Arc<dyn RxHook>>>,
    tx_queue: Mutex<VecDeque<TxBuf>>,
    tx_capacity: AtomicUsize,
    wire: Mutex<Vec<SimFrame>>,
    fail_alloc: AtomicBool,
    fail_xmit: Mutex<Option<StackError>>,
    fail_hook: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimStack {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            carrier: AtomicBool::new(true),
            ring_capable: AtomicBool::new(false),
            hook: Mutex::new(None),
            tx_queue: Mutex::new(VecDeque::new()),
            tx_capacity: AtomicUsize::new(usize::MAX),
            wire: Mutex::new(Vec::new()),
            fail_alloc: AtomicBool::new(false),
            fail_xmit: Mutex::new(None),
            fail_hook: AtomicBool::new(false),
        }
    }

    /// Deliver a packet as if it arrived on the interface. Returns `None`
    /// when no capture hook is installed (the packet goes to the normal
    /// stack, which here means nowhere).
    pub fn inject(&self, data: &[u8]) -> Option<RxVerdict> {
        // Call outside the lock; the hook may be swapped concurrently.
        let hook = lock(&self.hook).clone()?;
        Some(hook.on_receive(PacketBuf::from_slice(data)))
    }

    pub fn set_carrier(&self, up: bool) {
        self.carrier.store(up, Ordering::Release);
    }

    /// Frames the device queue accepts before reporting busy.
    pub fn set_tx_capacity(&self, capacity: usize) {
        self.tx_capacity.store(capacity, Ordering::Release);
    }

    pub fn fail_alloc(&self, fail: bool) {
        self.fail_alloc.store(fail, Ordering::Release);
    }

    /// Make every submission fail with `err` until cleared with `None`.
    pub fn fail_xmit(&self, err: Option<StackError>) {
        *lock(&self.fail_xmit) = err;
    }

    pub fn fail_hook_install(&self, fail: bool) {
        self.fail_hook.store(fail, Ordering::Release);
    }

    pub fn queued_tx(&self) -> usize {
        lock(&self.tx_queue).len()
    }

    /// Put up to `n` queued frames on the wire, firing their completions.
    /// Returns how many went out.
    pub fn complete(&self, n: usize) -> usize {
        let mut done = 0;
        while done < n {
            let Some(buf) = lock(&self.tx_queue).pop_front() else {
                break;
            };
            lock(&self.wire).push(SimFrame {
                data: buf.data().to_vec(),
                priority: buf.priority(),
            });
            drop(buf);
            done += 1;
        }
        done
    }

    pub fn complete_all(&self) -> usize {
        self.complete(usize::MAX)
    }

    /// Take everything sent so far.
    pub fn take_wire(&self) -> Vec<SimFrame> {
        std::mem::take(&mut *lock(&self.wire))
    }

    pub fn hook_installed(&self) -> bool {
        lock(&self.hook).is_some()
    }

    pub fn ring_capable(&self) -> bool {
        self.ring_capable.load(Ordering::Acquire)
    }
}

impl HostStack for SimStack {
    fn name(&self) -> &str {
        &self.name
    }

    fn carrier_ok(&self) -> bool {
        self.carrier.load(Ordering::Acquire)
    }

    fn register_rx_handler(&self, hook: Arc<dyn RxHook>) -> Result<(), StackError> {
        if self.fail_hook.load(Ordering::Acquire) {
            return Err(StackError::Driver(-16));
        }
        let mut slot = lock(&self.hook);
        if slot.is_some() {
            return Err(StackError::HandlerBusy(self.name.clone()));
        }
        *slot = Some(hook);
        Ok(())
    }

    fn unregister_rx_handler(&self) {
        lock(&self.hook).take();
    }

    fn set_ring_capable(&self, enabled: bool) {
        self.ring_capable.store(enabled, Ordering::Release);
    }

    fn alloc_tx_frame(&self, len: usize) -> Option<Vec<u8>> {
        if self.fail_alloc.load(Ordering::Acquire) {
            return None;
        }
        Some(Vec::with_capacity(len))
    }

    fn queue_xmit(&self, buf: TxBuf) -> XmitOutcome {
        if let Some(err) = lock(&self.fail_xmit).clone() {
            return XmitOutcome::Failed(buf, err);
        }
        let mut queue = lock(&self.tx_queue);
        if queue.len() >= self.tx_capacity.load(Ordering::Acquire) {
            return XmitOutcome::Busy(buf);
        }
        queue.push_back(buf);
        XmitOutcome::Sent
    }
}
