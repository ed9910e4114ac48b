//! Error types for thread emulation

use crate::emulation::ThreadId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadEmulationError {
    #[error("Work submission failed: {0}")]
    SubmitFailed(String),

    #[error("Thread {0} is not in the suspended state")]
    NotSuspended(ThreadId),

    #[error("No thread-local storage indexes available")]
    TlsOutOfIndexes,

    #[error("Invalid thread-local storage index: {0}")]
    InvalidTlsIndex(u32),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ThreadEmulationError>;
