//! Process-wide table of attached ring devices, keyed by interface name.

use crate::adapter::{GenericAdapter, RingDevice};
use crate::builder::AdapterBuilder;
use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::stack::HostStack;
use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

lazy_static! {
    static ref DEVICES: Mutex<HashMap<String, Arc<dyn RingDevice>>> = Mutex::new(HashMap::new());
}

fn devices() -> MutexGuard<'static, HashMap<String, Arc<dyn RingDevice>>> {
    DEVICES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Attach ring support to `stack`: its native device if it has one, else a
/// [`GenericAdapter`] built from `config`.
pub fn attach<S: HostStack>(
    stack: Arc<S>,
    config: AdapterConfig,
) -> Result<Arc<dyn RingDevice>, AdapterError> {
    AdapterBuilder::new(stack).config(config).attach()
}

pub fn attach_device(device: Arc<dyn RingDevice>) -> Result<Arc<dyn RingDevice>, AdapterError> {
    let mut devices = devices();
    let name = device.name().to_string();
    if devices.contains_key(&name) {
        return Err(AdapterError::AlreadyAttached(name));
    }
    devices.insert(name.clone(), device.clone());
    debug!("{}: ring device attached", name);
    Ok(device)
}

pub fn lookup(name: &str) -> Option<Arc<dyn RingDevice>> {
    devices().get(name).cloned()
}

/// Leave ring mode if needed and forget the device.
pub fn detach(name: &str) -> Result<(), AdapterError> {
    let device = devices()
        .remove(name)
        .ok_or_else(|| AdapterError::NotAttached(name.to_string()))?;
    device.register(false)?;
    debug!("{}: ring device detached", name);
    Ok(())
}

/// Attach an already built emulated adapter.
pub fn attach_generic<S: HostStack>(
    adapter: GenericAdapter<S>,
) -> Result<Arc<GenericAdapter<S>>, AdapterError> {
    let adapter = Arc::new(adapter);
    attach_device(adapter.clone())?;
    Ok(adapter)
}

#[cfg(all(test, feature = "simulator"))]
mod tests {
    use super::*;
    use crate::simulator::SimStack;

    #[test]
    fn test_attach_lookup_detach() {
        let stack = Arc::new(SimStack::new("reg-test0"));
        let device = attach(stack.clone(), AdapterConfig::default()).unwrap();
        assert_eq!(device.name(), "reg-test0");
        assert!(lookup("reg-test0").is_some());

        let err = attach(stack, AdapterConfig::default()).err().unwrap();
        assert!(matches!(err, AdapterError::AlreadyAttached(_)));

        detach("reg-test0").unwrap();
        assert!(lookup("reg-test0").is_none());
        assert!(matches!(detach("reg-test0"), Err(AdapterError::NotAttached(_))));
    }

    #[test]
    fn test_detach_leaves_ring_mode() {
        let stack = Arc::new(SimStack::new("reg-test1"));
        let adapter = attach_generic(AdapterBuilder::new(stack.clone()).build().unwrap()).unwrap();
        adapter.enable().unwrap();
        assert!(stack.hook_installed());

        detach("reg-test1").unwrap();
        assert!(!stack.hook_installed());
        assert!(!adapter.is_enabled());
    }
}
