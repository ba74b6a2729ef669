//! Global lockdown gate for mutating operations.
//!
//! A single process-wide flag, flipped by the one toggle operation and read
//! by every mutating entry point before it touches any collaborator store.
//! Toggling also propagates to the backing store's own write-protection
//! switch as defense in depth; if that propagation fails, the in-process
//! gate still enforces the block.
//!
//! The gate is an explicit, passed-in object rather than a hidden global,
//! so independent engine instances can coexist (and be tested) in one
//! process.

use crate::application::ports::WriteProtection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The uniform refusal every mutating call receives while the gate is
/// locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockdownActive;

impl std::fmt::Display for LockdownActive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("service unavailable: lockdown active, system is read-only")
    }
}

impl std::error::Error for LockdownActive {}

/// Two-state switch between normal operation and read-only lockdown.
pub struct AccessGate {
    lockdown_active: AtomicBool,
    store: Option<Arc<dyn WriteProtection>>,
}

impl AccessGate {
    /// Create an unlocked gate with no backing-store propagation.
    pub fn new() -> Self {
        Self {
            lockdown_active: AtomicBool::new(false),
            store: None,
        }
    }

    /// Create an unlocked gate that propagates toggles to the backing
    /// store's write-protection switch.
    pub fn with_store(store: Arc<dyn WriteProtection>) -> Self {
        Self {
            lockdown_active: AtomicBool::new(false),
            store: Some(store),
        }
    }

    /// Flip lockdown on or off.
    ///
    /// The in-process flag is set first, so the block is enforced even if
    /// store propagation fails; the store failure is logged, not fatal.
    pub fn set_lockdown(&self, enabled: bool) {
        self.lockdown_active.store(enabled, Ordering::Release);
        tracing::info!(enabled, "lockdown toggled");

        if let Some(store) = &self.store {
            if let Err(error) = store.set_read_only(enabled) {
                tracing::warn!(
                    %error,
                    "store write-protection propagation failed; in-process gate still enforces lockdown"
                );
            }
        }
    }

    /// Whether lockdown is currently active.
    pub fn is_locked(&self) -> bool {
        self.lockdown_active.load(Ordering::Acquire)
    }

    /// Guard for mutating entry points.
    pub fn check_mutable(&self) -> Result<(), LockdownActive> {
        if self.is_locked() {
            Err(LockdownActive)
        } else {
            Ok(())
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("lockdown_active", &self.is_locked())
            .field("store", &self.store.as_ref().map(|_| "<write-protection>"))
            .finish()
    }
}
