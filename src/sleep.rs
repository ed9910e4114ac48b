//! `Sleep` / `SleepEx` without a blocking sleep primitive.
//!
//! The calling context waits, with a timeout, on a process-wide wait object
//! that nothing ever sets. The wait therefore always times out, which blocks
//! the caller for the requested duration without spinning.

use crate::signal::CompletionSignal;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Timeout value that never expires
pub const INFINITE: u32 = u32::MAX;

static SLEEP_OBJECT: OnceLock<CompletionSignal> = OnceLock::new();

/// The never-signalled wait object, created on first use.
///
/// Concurrent first callers all observe the same instance; it lives until
/// process exit.
fn sleep_object() -> &'static CompletionSignal {
    wait_object_in(&SLEEP_OBJECT, || {
        log::trace!("Creating sleep wait object");
        CompletionSignal::new()
    })
}

/// The object held by `slot`, running `create` only if the slot is empty
fn wait_object_in<F>(slot: &OnceLock<CompletionSignal>, create: F) -> &CompletionSignal
where
    F: FnOnce() -> CompletionSignal,
{
    slot.get_or_init(create)
}

/// Block the calling context for `milliseconds`
pub fn sleep(milliseconds: u32) {
    sleep_ex(milliseconds, false);
}

/// Block the calling context for `milliseconds`.
///
/// `0` yields the rest of the time slice and [`INFINITE`] never returns.
/// `alertable` is accepted for API parity; there is no APC delivery to be
/// woken by, so alertable sleeps always run their full duration.
pub fn sleep_ex(milliseconds: u32, alertable: bool) {
    log::trace!(
        "Sleeping for {} ms (alertable: {})",
        milliseconds,
        alertable
    );

    if milliseconds == 0 {
        thread::yield_now();
        return;
    }

    let object = sleep_object();
    if milliseconds == INFINITE {
        object.wait();
        return;
    }

    let signaled = object.wait_timeout(Duration::from_millis(u64::from(milliseconds)));
    debug_assert!(!signaled, "sleep wait object was signalled");
}
