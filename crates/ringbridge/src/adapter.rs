use crate::config::AdapterConfig;
use crate::error::{AdapterError, SyncError};
use crate::notify::RingNotifier;
use crate::stack::HostStack;
use crate::system::rx::{RxBridge, RxKring};
use crate::system::shared::{RxShared, TxShared};
use crate::system::tx::TxKring;
use crate::system::{SyncFlags, SyncReport};
use log::{debug, warn};
use ringbridge_core::{Direction, Kring, MemLayout, NetmapMemory, NetmapRing, RingClient};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// A device that can run in ring mode: either a driver with native ring
/// support or the emulation in [`GenericAdapter`]. Picked once at attach
/// time; callers only ever see this interface.
pub trait RingDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Enter (`true`) or leave (`false`) ring mode.
    fn register(&self, enable: bool) -> Result<(), AdapterError>;

    /// Reconcile one direction's kring with its ring. At most one sync per
    /// direction runs at a time.
    fn sync(&self, direction: Direction, flags: SyncFlags) -> Result<SyncReport, SyncError>;

    fn memory(&self) -> &NetmapMemory;

    fn is_enabled(&self) -> bool;

    fn ring(&self, direction: Direction) -> Arc<NetmapRing> {
        self.memory().ring(direction).clone()
    }

    /// Claim the consumer side of one ring.
    fn client(&self, direction: Direction) -> Option<RingClient> {
        RingClient::claim(self.ring(direction), self.memory().pool().clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

/// Kernel-side view of one kring, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KringStatus {
    pub hw_cur: u32,
    pub hw_avail: u32,
    /// RX only: next slot the import fills.
    pub import_cursor: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    /// Packets waiting in the receive FIFO.
    pub rx_queued: usize,
    /// Captures dropped because the FIFO was full.
    pub rx_dropped: u64,
    /// Captures dropped because they could not fit a buffer.
    pub rx_oversized: u64,
    /// Packets discarded from the FIFO when ring mode was left.
    pub rx_purged: u64,
    pub rx_reinits: u64,
    /// TX passes cut short by send-path backpressure.
    pub tx_soft_failures: u64,
    pub tx_reinits: u64,
}

/// Ring-mode emulation for a host interface without native support.
///
/// Packets from the host stack are captured into a FIFO and copied into RX
/// slots on RX sync; TX sync copies released slots into stack frames and
/// returns slots to the producer as the stack reports completions.
pub struct GenericAdapter<S: HostStack> {
    stack: Arc<S>,
    config: AdapterConfig,
    memory: NetmapMemory,
    state: RwLock<AdapterState>,
    rx: Mutex<RxKring>,
    tx: Mutex<TxKring>,
    rx_notifier: Arc<dyn RingNotifier>,
    tx_notifier: Arc<dyn RingNotifier>,
    rx_purged: AtomicU64,
}

impl<S: HostStack> GenericAdapter<S> {
    pub fn new(
        stack: Arc<S>,
        config: AdapterConfig,
        rx_notifier: Arc<dyn RingNotifier>,
        tx_notifier: Arc<dyn RingNotifier>,
    ) -> Result<Self, AdapterError> {
        config.validate()?;
        let memory = NetmapMemory::new(MemLayout::new(
            config.buf_size,
            config.num_tx_desc,
            config.num_rx_desc,
        ))?;
        let name = stack.name().to_string();

        let mut rx_kring = Kring::new(
            Direction::Rx,
            memory.ring(Direction::Rx).clone(),
            memory.pool().clone(),
        );
        rx_kring.set_slot_flags(config.rx_slot_flags);
        let tx_kring = Kring::new(
            Direction::Tx,
            memory.ring(Direction::Tx).clone(),
            memory.pool().clone(),
        );

        let rx = RxKring::new(
            name.clone(),
            rx_kring,
            Arc::new(RxShared::new(config.rx_queue_capacity)),
            config.no_pendintr,
        );
        let tx = TxKring::new(
            name,
            tx_kring,
            Arc::new(TxShared::new(tx_notifier.clone())),
            config.tx_priority,
        );

        Ok(Self {
            stack,
            config,
            memory,
            state: RwLock::new(AdapterState::Disabled),
            rx: Mutex::new(rx),
            tx: Mutex::new(tx),
            rx_notifier,
            tx_notifier,
            rx_purged: AtomicU64::new(0),
        })
    }

    pub fn stack(&self) -> &Arc<S> {
        &self.stack
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn state(&self) -> AdapterState {
        *self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enable(&self) -> Result<(), AdapterError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state == AdapterState::Enabled {
            return Err(AdapterError::AlreadyEnabled(self.stack.name().to_string()));
        }
        *state = AdapterState::Enabling;

        // The hook may fire as soon as it is registered, so the FIFO and
        // both krings must be ready before that.
        let rx_shared = Arc::new(RxShared::new(self.config.rx_queue_capacity));
        self.lock_rx().reset(rx_shared.clone());
        self.lock_tx().reset(Arc::new(TxShared::new(self.tx_notifier.clone())));

        let hook = Arc::new(RxBridge::new(
            rx_shared,
            self.rx_notifier.clone(),
            self.config.buf_size as usize,
        ));
        if let Err(err) = self.stack.register_rx_handler(hook) {
            warn!("{}: receive hook registration failed: {}", self.stack.name(), err);
            *state = AdapterState::Disabled;
            return Err(err.into());
        }
        self.stack.set_ring_capable(true);

        *state = AdapterState::Enabled;
        debug!("{}: ring mode enabled", self.stack.name());
        Ok(())
    }

    pub fn disable(&self) -> Result<(), AdapterError> {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state != AdapterState::Enabled {
            debug!("{}: disable while {:?}, nothing to do", self.stack.name(), *state);
            return Ok(());
        }
        *state = AdapterState::Disabling;

        self.stack.unregister_rx_handler();
        let purged = self.lock_rx().shared().purge();
        self.rx_purged.fetch_add(purged as u64, Ordering::Relaxed);
        self.stack.set_ring_capable(false);

        *state = AdapterState::Disabled;
        debug!("{}: ring mode disabled, {} queued packets purged", self.stack.name(), purged);
        Ok(())
    }

    pub fn kring_status(&self, direction: Direction) -> KringStatus {
        match direction {
            Direction::Rx => {
                let rx = self.lock_rx();
                KringStatus {
                    hw_cur: rx.kring().hw_cur().get(),
                    hw_avail: rx.kring().hw_avail(),
                    import_cursor: Some(rx.import_cursor().get()),
                }
            }
            Direction::Tx => {
                let tx = self.lock_tx();
                KringStatus {
                    hw_cur: tx.kring().hw_cur().get(),
                    hw_avail: tx.kring().hw_avail(),
                    import_cursor: None,
                }
            }
        }
    }

    pub fn stats(&self) -> AdapterStats {
        let (rx_queued, rx_dropped, rx_oversized, rx_reinits) = {
            let rx = self.lock_rx();
            let shared = rx.shared();
            (shared.len(), shared.dropped(), shared.oversized(), rx.reinits())
        };
        let (tx_soft_failures, tx_reinits) = {
            let tx = self.lock_tx();
            (tx.soft_failures(), tx.reinits())
        };
        AdapterStats {
            rx_queued,
            rx_dropped,
            rx_oversized,
            rx_purged: self.rx_purged.load(Ordering::Relaxed),
            rx_reinits,
            tx_soft_failures,
            tx_reinits,
        }
    }

    fn lock_rx(&self) -> MutexGuard<'_, RxKring> {
        self.rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_tx(&self) -> MutexGuard<'_, TxKring> {
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: HostStack> RingDevice for GenericAdapter<S> {
    fn name(&self) -> &str {
        self.stack.name()
    }

    fn register(&self, enable: bool) -> Result<(), AdapterError> {
        if enable {
            self.enable()
        } else {
            self.disable()
        }
    }

    fn sync(&self, direction: Direction, flags: SyncFlags) -> Result<SyncReport, SyncError> {
        // Held for the whole sync so enable/disable cannot run underneath.
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state != AdapterState::Enabled {
            return Err(SyncError::NotEnabled);
        }
        match direction {
            Direction::Rx => self.lock_rx().sync(flags),
            Direction::Tx => self.lock_tx().sync(&*self.stack, flags),
        }
    }

    fn memory(&self) -> &NetmapMemory {
        &self.memory
    }

    fn is_enabled(&self) -> bool {
        self.state() == AdapterState::Enabled
    }
}
