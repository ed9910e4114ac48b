//! Lifecycle events for emulated threads

use crate::assert::ContractViolation;
use crate::emulation::ThreadId;
use crate::priority::WorkItemPriority;

#[derive(Debug, Clone, PartialEq)]
pub enum EmulationEvent {
    ThreadCreated {
        thread_id: ThreadId,
        suspended: bool,
    },
    PriorityChanged {
        thread_id: ThreadId,
        priority: WorkItemPriority,
    },
    ThreadResumed {
        thread_id: ThreadId,
    },
    ThreadStarted {
        thread_id: ThreadId,
        priority: WorkItemPriority,
    },
    ThreadCompleted {
        thread_id: ThreadId,
    },
    SubmitFailed {
        thread_id: ThreadId,
        error: String,
    },
    ContractViolation {
        violation: ContractViolation,
    },
}

impl EmulationEvent {
    pub fn thread_id(&self) -> Option<ThreadId> {
        match self {
            Self::ThreadCreated { thread_id, .. }
            | Self::PriorityChanged { thread_id, .. }
            | Self::ThreadResumed { thread_id }
            | Self::ThreadStarted { thread_id, .. }
            | Self::ThreadCompleted { thread_id }
            | Self::SubmitFailed { thread_id, .. } => Some(*thread_id),
            Self::ContractViolation { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::SubmitFailed { .. } | Self::ContractViolation { .. }
        )
    }
}
