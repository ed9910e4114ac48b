//! # thread-emulation
//!
//! Emulates a subset of the Win32 threading API on top of a cooperative,
//! priority-tiered work scheduler that has no thread handles, no
//! suspend/resume and no blocking sleep.
//!
//! ## Quick Start
//!
//! ```no_run
//! use thread_emulation::*;
//! use std::time::Duration;
//!
//! let emulation = ThreadEmulation::new(ThreadEmulationDesc::default())?;
//!
//! // Nothing runs until the thread is resumed.
//! let handle = emulation.create_thread(
//!     |name: &'static str| println!("hello from {}", name),
//!     "mixer",
//!     CreationFlags::CREATE_SUSPENDED,
//! )?;
//! emulation.set_thread_priority(&handle, THREAD_PRIORITY_HIGHEST)?;
//! emulation.resume_thread(&handle)?;
//!
//! assert!(handle.wait_timeout(Duration::from_secs(1)));
//! handle.close();
//!
//! sleep(10);
//! # Ok::<(), ThreadEmulationError>(())
//! ```
//!
//! ## Supported
//!
//! - `CreateThread` returning a handle that can be waited on, then closed
//! - `CREATE_SUSPENDED` and `ResumeThread`
//! - `SetThreadPriority` while suspended, with three tiers (negative, zero, positive)
//! - `Sleep` / `SleepEx`
//! - Thread-local storage (`TlsAlloc`, `TlsFree`, `TlsGetValue`, `TlsSetValue`)
//!
//! ## Differences from Win32
//!
//! - No `ExitThread` or `TerminateThread`; return from the start routine to exit
//! - No `SuspendThread`, so resuming only applies to threads created suspended
//! - No thread identifier, affinity or exit-code APIs
//! - Failures return errors rather than setting a last-error code
//!
//! ## Key Components
//!
//! - **[`ThreadEmulation`]**: the emulated API and its suspended-thread table
//! - **[`WorkScheduler`]**: trait for the scheduler emulated threads run on
//! - **[`ThreadPool`]**: default scheduler with one queue per priority tier
//! - **[`CompletionSignal`]**: waitable object behind every [`ThreadHandle`]
//!
//! The free functions at the crate root ([`create_thread`], [`resume_thread`],
//! …) act on a process-wide instance created on first use, or configured up
//! front with [`install`].

pub mod assert;
pub mod config;
pub mod emulation;
pub mod error;
pub mod events;
pub mod pool;
pub mod priority;
pub mod scheduler;
pub mod signal;
pub mod sleep;
pub mod table;
pub mod tls;

pub use assert::{AssertHook, ContractViolation};
pub use config::{TLS_MINIMUM_AVAILABLE, ThreadEmulationDesc, ThreadPoolConfig};
pub use emulation::{CreationFlags, ThreadEmulation, ThreadHandle, ThreadId};
pub use error::{Result, ThreadEmulationError};
pub use events::EmulationEvent;
pub use pool::ThreadPool;
pub use priority::{
    THREAD_PRIORITY_ABOVE_NORMAL, THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST,
    THREAD_PRIORITY_IDLE, THREAD_PRIORITY_LOWEST, THREAD_PRIORITY_NORMAL,
    THREAD_PRIORITY_TIME_CRITICAL, WorkItemOptions, WorkItemPriority,
};
pub use scheduler::{WorkItem, WorkScheduler};
pub use signal::CompletionSignal;
pub use sleep::{INFINITE, sleep, sleep_ex};
pub use tls::{TlsIndex, TlsValue};

use std::sync::OnceLock;

static GLOBAL: OnceLock<ThreadEmulation> = OnceLock::new();

/// Configure the process-wide instance before anything uses it.
///
/// # Errors
///
/// `Configuration` if the instance already exists, or any error from creating
/// its thread pool.
pub fn install(desc: ThreadEmulationDesc) -> Result<&'static ThreadEmulation> {
    if GLOBAL.get().is_some() {
        return Err(ThreadEmulationError::Configuration(
            "thread emulation is already initialized".into(),
        ));
    }

    let emulation = ThreadEmulation::new(desc)?;
    GLOBAL.set(emulation).map_err(|_| {
        ThreadEmulationError::Configuration("thread emulation is already initialized".into())
    })?;
    global()
}

/// The process-wide instance, created with default settings on first use
pub fn global() -> Result<&'static ThreadEmulation> {
    if let Some(emulation) = GLOBAL.get() {
        return Ok(emulation);
    }

    let emulation = ThreadEmulation::new(ThreadEmulationDesc::default())?;
    if GLOBAL.set(emulation).is_err() {
        // Another caller initialized first; ours is dropped and its pool shut down.
        log::debug!("Discarding redundant thread emulation instance");
    }

    GLOBAL.get().ok_or_else(|| {
        ThreadEmulationError::Configuration("thread emulation is unavailable".into())
    })
}

/// `CreateThread` on the process-wide instance
pub fn create_thread<F, P>(start_routine: F, parameter: P, flags: CreationFlags) -> Result<ThreadHandle>
where
    F: FnOnce(P) + Send + 'static,
    P: Send + 'static,
{
    global()?.create_thread(start_routine, parameter, flags)
}

/// `ResumeThread` on the process-wide instance
pub fn resume_thread(handle: &ThreadHandle) -> Result<u32> {
    global()?.resume_thread(handle)
}

/// `SetThreadPriority` on the process-wide instance
pub fn set_thread_priority(handle: &ThreadHandle, priority: i32) -> Result<()> {
    global()?.set_thread_priority(handle, priority)
}

/// `TlsAlloc` on the process-wide instance
pub fn tls_alloc() -> Result<TlsIndex> {
    global()?.tls_alloc()
}

/// `TlsFree` on the process-wide instance
pub fn tls_free(index: TlsIndex) -> Result<()> {
    global()?.tls_free(index)
}

/// `TlsGetValue` on the process-wide instance
pub fn tls_get_value(index: TlsIndex) -> Result<Option<TlsValue>> {
    global()?.tls_get_value(index)
}

/// `TlsSetValue` on the process-wide instance
pub fn tls_set_value(index: TlsIndex, value: Option<TlsValue>) -> Result<()> {
    global()?.tls_set_value(index, value)
}
