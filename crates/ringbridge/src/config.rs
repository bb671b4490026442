use crate::error::AdapterError;
use ringbridge_core::mem::MAX_BUF_SIZE;
use ringbridge_core::SlotFlags;

/// Ring size for emulated adapters. It has no relation to the NIC's own
/// descriptor rings.
pub const DEFAULT_NUM_DESC: u32 = 256;
pub const DEFAULT_BUF_SIZE: u32 = 2048;
/// Receive FIFO threshold: the capture hook drops a packet only when the
/// FIFO already holds more than this many, so at most one extra packet is
/// ever queued.
pub const DEFAULT_RX_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_TX_PRIORITY: u32 = 100;

const MIN_BUF_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterConfig {
    pub num_tx_desc: u32,
    pub num_rx_desc: u32,
    pub buf_size: u32,
    pub rx_queue_capacity: usize,
    /// Import queued packets on every RX sync, not only when a capture is
    /// pending or the caller forces a read.
    pub no_pendintr: bool,
    /// Priority stamped on every transmitted frame.
    pub tx_priority: u32,
    /// Flags set on every slot filled by RX sync.
    pub rx_slot_flags: SlotFlags,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            num_tx_desc: DEFAULT_NUM_DESC,
            num_rx_desc: DEFAULT_NUM_DESC,
            buf_size: DEFAULT_BUF_SIZE,
            rx_queue_capacity: DEFAULT_RX_QUEUE_CAPACITY,
            no_pendintr: true,
            tx_priority: DEFAULT_TX_PRIORITY,
            rx_slot_flags: SlotFlags::empty(),
        }
    }
}

impl AdapterConfig {
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.num_tx_desc < 2 || self.num_rx_desc < 2 {
            return Err(AdapterError::InvalidConfiguration(format!(
                "rings need at least 2 slots (tx {}, rx {})",
                self.num_tx_desc, self.num_rx_desc
            )));
        }
        if !(MIN_BUF_SIZE..=MAX_BUF_SIZE).contains(&self.buf_size) {
            return Err(AdapterError::InvalidConfiguration(format!(
                "buffer size {} outside {}..={}",
                self.buf_size, MIN_BUF_SIZE, MAX_BUF_SIZE
            )));
        }
        if self.rx_queue_capacity == 0 {
            return Err(AdapterError::InvalidConfiguration(
                "receive queue capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AdapterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_rings_and_buffers() {
        let config = AdapterConfig {
            num_rx_desc: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AdapterConfig {
            buf_size: 16,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AdapterConfig {
            rx_queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
