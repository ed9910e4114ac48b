//! Configuration for thread emulation

use crate::assert::AssertHook;
use crate::error::{Result, ThreadEmulationError};
use std::sync::Arc;

/// Minimum number of TLS slots Win32 guarantees to every process.
pub const TLS_MINIMUM_AVAILABLE: u32 = 64;

/// Configuration for the default [`ThreadPool`](crate::pool::ThreadPool) scheduler.
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads servicing the three priority queues
    pub worker_count: usize,
    /// Prefix for worker thread names; the worker index is appended
    pub thread_name_prefix: String,
    /// Stack size for each worker, or the platform default when `None`
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            thread_name_prefix: "thread-emulation-worker".to_string(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ThreadEmulationError::Configuration(
                "worker_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level description of a [`ThreadEmulation`](crate::ThreadEmulation) instance.
#[derive(Clone)]
pub struct ThreadEmulationDesc {
    pub pool: ThreadPoolConfig,
    /// Capacity of the emulated TLS index space
    pub max_tls_slots: u32,
    /// Queue [`EmulationEvent`](crate::events::EmulationEvent)s for `poll_events`
    pub emit_events: bool,
    /// Called on contract violations instead of `debug_assert!`
    pub assert_hook: Option<AssertHook>,
}

impl Default for ThreadEmulationDesc {
    fn default() -> Self {
        Self {
            pool: ThreadPoolConfig::default(),
            max_tls_slots: TLS_MINIMUM_AVAILABLE,
            emit_events: false,
            assert_hook: None,
        }
    }
}

impl std::fmt::Debug for ThreadEmulationDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadEmulationDesc")
            .field("pool", &self.pool)
            .field("max_tls_slots", &self.max_tls_slots)
            .field("emit_events", &self.emit_events)
            .field("assert_hook", &self.assert_hook.is_some())
            .finish()
    }
}

impl ThreadEmulationDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(mut self, pool: ThreadPoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn max_tls_slots(mut self, slots: u32) -> Self {
        self.max_tls_slots = slots;
        self
    }

    pub fn emit_events(mut self, enable: bool) -> Self {
        self.emit_events = enable;
        self
    }

    pub fn assert_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&crate::assert::ContractViolation) + Send + Sync + 'static,
    {
        self.assert_hook = Some(Arc::new(hook));
        self
    }
}
