//! Contract-violation reporting.
//!
//! Misusing the emulated API (resuming a thread that was never created
//! suspended, changing the priority of a running thread, passing unsupported
//! creation flags, freeing an unallocated TLS index) is a programming error
//! rather than a recoverable condition. Violations are always logged. If an
//! [`AssertHook`] is installed it receives the violation; otherwise a
//! `debug_assert!` fires, which panics in debug builds and is a no-op in
//! release builds. The failing call still returns an error either way.

use crate::emulation::ThreadId;
use std::sync::Arc;
use thiserror::Error;

/// Replacement for the default debug assertion.
pub type AssertHook = Arc<dyn Fn(&ContractViolation) + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("unsupported creation flags {bits:#x} (only CREATE_SUSPENDED is supported)")]
    InvalidCreationFlags { bits: u32 },

    #[error("ResumeThread on {0}, which is not in the suspended state")]
    ResumeNotSuspended(ThreadId),

    #[error("SetThreadPriority on {0}, which is not in the suspended state")]
    PriorityNotSuspended(ThreadId),

    #[error("TLS index {0} is not allocated")]
    InvalidTlsIndex(u32),
}

pub(crate) fn report(hook: Option<&AssertHook>, violation: &ContractViolation) {
    log::error!("Contract violation: {}", violation);

    match hook {
        Some(hook) => hook(violation),
        None => debug_assert!(false, "{}", violation),
    }
}
