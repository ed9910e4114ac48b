//! Manual-reset waitable signal used as the completion object of emulated threads.
//!
//! A [`CompletionSignal`] plays the part of a Win32 event handle. Each value is
//! one owner of the shared state; [`CompletionSignal::duplicate`] creates a new,
//! independent owner the same way `DuplicateHandle` does, and dropping (or
//! [`CompletionSignal::close`]) releases only that owner. The state lives until
//! the last owner is gone.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct SignalState {
    signaled: Mutex<bool>,
    cond: Condvar,
}

/// Waitable signal that is set at most once and stays set.
///
/// Only the crate sets it, when an emulated thread's start routine returns;
/// holders outside the crate can wait on it but not signal it.
///
/// ```compile_fail
/// let signal = thread_emulation::CompletionSignal::new();
/// signal.set();
/// ```
pub struct CompletionSignal {
    state: Arc<SignalState>,
}

impl CompletionSignal {
    /// Create a new, unsignalled object with a single owner
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                signaled: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    /// Create another owner of the same signal
    pub fn duplicate(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }

    /// Set the signal and wake every waiter.
    ///
    /// Returns `false` if the signal was already set.
    pub(crate) fn set(&self) -> bool {
        let mut signaled = self.state.signaled.lock();
        if *signaled {
            return false;
        }
        *signaled = true;
        self.state.cond.notify_all();
        true
    }

    pub fn is_set(&self) -> bool {
        *self.state.signaled.lock()
    }

    /// Block until the signal is set
    pub fn wait(&self) {
        let mut signaled = self.state.signaled.lock();
        while !*signaled {
            self.state.cond.wait(&mut signaled);
        }
    }

    /// Block until the signal is set or `timeout` elapses.
    ///
    /// Returns `true` if the signal was observed set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_deadline(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    /// Block until the signal is set or `deadline` passes
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        let mut signaled = self.state.signaled.lock();
        while !*signaled {
            if self.state.cond.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }

    /// Number of live owners of this signal
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    /// Whether two values own the same underlying signal
    pub fn same_object(&self, other: &CompletionSignal) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Release this owner
    pub fn close(self) {
        drop(self);
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("signaled", &self.is_set())
            .field("owners", &self.owner_count())
            .finish()
    }
}
