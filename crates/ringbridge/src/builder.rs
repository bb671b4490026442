use crate::adapter::{GenericAdapter, RingDevice};
use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::notify::{Doorbell, RingNotifier};
use crate::registry;
use crate::stack::HostStack;
use ringbridge_core::SlotFlags;
use std::sync::Arc;

pub struct AdapterBuilder<S: HostStack> {
    stack: Arc<S>,
    config: AdapterConfig,
    rx_notifier: Option<Arc<dyn RingNotifier>>,
    tx_notifier: Option<Arc<dyn RingNotifier>>,
}

impl<S: HostStack> AdapterBuilder<S> {
    pub fn new(stack: Arc<S>) -> Self {
        Self {
            stack,
            config: AdapterConfig::default(),
            rx_notifier: None,
            tx_notifier: None,
        }
    }

    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn num_tx_desc(mut self, n: u32) -> Self {
        self.config.num_tx_desc = n;
        self
    }

    pub fn num_rx_desc(mut self, n: u32) -> Self {
        self.config.num_rx_desc = n;
        self
    }

    pub fn buf_size(mut self, size: u32) -> Self {
        self.config.buf_size = size;
        self
    }

    pub fn rx_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.rx_queue_capacity = capacity;
        self
    }

    pub fn no_pendintr(mut self, enabled: bool) -> Self {
        self.config.no_pendintr = enabled;
        self
    }

    pub fn tx_priority(mut self, priority: u32) -> Self {
        self.config.tx_priority = priority;
        self
    }

    pub fn rx_slot_flags(mut self, flags: SlotFlags) -> Self {
        self.config.rx_slot_flags = flags;
        self
    }

    pub fn rx_notifier(mut self, notifier: Arc<dyn RingNotifier>) -> Self {
        self.rx_notifier = Some(notifier);
        self
    }

    pub fn tx_notifier(mut self, notifier: Arc<dyn RingNotifier>) -> Self {
        self.tx_notifier = Some(notifier);
        self
    }

    /// Build the emulated adapter without registering it anywhere.
    pub fn build(self) -> Result<GenericAdapter<S>, AdapterError> {
        let rx_notifier = self
            .rx_notifier
            .unwrap_or_else(|| Arc::new(Doorbell::new()));
        let tx_notifier = self
            .tx_notifier
            .unwrap_or_else(|| Arc::new(Doorbell::new()));
        GenericAdapter::new(self.stack, self.config, rx_notifier, tx_notifier)
    }

    /// Attach to the interface through the global registry. A driver with
    /// native ring support is used as is; otherwise the emulated adapter is
    /// built.
    pub fn attach(self) -> Result<Arc<dyn RingDevice>, AdapterError> {
        if let Some(native) = self.stack.native_device() {
            return registry::attach_device(native);
        }
        let adapter: Arc<dyn RingDevice> = Arc::new(self.build()?);
        registry::attach_device(adapter)
    }
}
