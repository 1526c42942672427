use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::SIGINT;
use signal_hook::low_level::unregister;
use signal_hook::SigId;

/// Shared cancellation flag
///
/// The single piece of process-wide mutable state in the system. The solve
/// loop polls it at the start of every residual evaluation; anything may set
/// it (a signal handler, another thread, a test).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Scoped SIGINT → cancellation binding
///
/// Registers a handler that sets the flag on SIGINT and unregisters it on
/// drop, so the binding cannot outlive the solve it guards regardless of the
/// exit path taken.
pub struct SignalGuard {
    sig_id: Option<SigId>,
}

impl SignalGuard {
    /// Bind SIGINT to the given flag for the lifetime of the guard
    pub fn install(flag: &CancelFlag) -> Result<Self, String> {
        let sig_id = signal_hook::flag::register(SIGINT, Arc::clone(&flag.flag))
            .map_err(|e| format!("Failed to install interrupt handler: {}", e))?;
        Ok(Self {
            sig_id: Some(sig_id),
        })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Some(id) = self.sig_id.take() {
            unregister(id);
        }
    }
}
