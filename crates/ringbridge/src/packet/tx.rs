use crate::system::shared::TxShared;
use std::fmt;
use std::sync::Arc;

/// Completion credit for one submitted frame.
///
/// Dropping an armed handle reports the frame as transmitted: it bumps the
/// TX completion counter and rings the TX notifier. This is the only way
/// completions reach TX sync.
pub struct TxCompletion {
    shared: Option<Arc<TxShared>>,
}

impl TxCompletion {
    pub(crate) fn new(shared: Arc<TxShared>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    /// Release the handle without reporting a completion.
    pub fn disarm(mut self) {
        self.shared = None;
    }

    pub fn is_armed(&self) -> bool {
        self.shared.is_some()
    }
}

impl Drop for TxCompletion {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.complete();
        }
    }
}

impl fmt::Debug for TxCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxCompletion")
            .field("armed", &self.is_armed())
            .finish()
    }
}

/// A frame built by TX sync from one ring slot, on its way to the host
/// stack's send path. The stack owns it after a successful submission and
/// signals completion by dropping it.
#[derive(Debug)]
pub struct TxBuf {
    data: Vec<u8>,
    priority: u32,
    completion: Option<TxCompletion>,
}

impl TxBuf {
    pub(crate) fn new(data: Vec<u8>, priority: u32, completion: TxCompletion) -> Self {
        Self {
            data,
            priority,
            completion: Some(completion),
        }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Free the frame without reporting a completion (the stack refused it).
    pub fn discard(mut self) {
        if let Some(completion) = self.completion.take() {
            completion.disarm();
        }
    }
}
