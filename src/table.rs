use crate::emulation::ThreadId;
use crate::priority::WorkItemPriority;
use crate::scheduler::Job;
use crate::signal::CompletionSignal;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A thread created with `CREATE_SUSPENDED` that has not been resumed yet
pub struct PendingThread {
    /// Start routine with its parameter already bound
    pub(crate) start: Job,
    /// Dispatch-side owner of the completion signal
    pub(crate) completion: CompletionSignal,
    pub(crate) priority: WorkItemPriority,
}

impl PendingThread {
    pub(crate) fn new(start: Job, completion: CompletionSignal) -> Self {
        Self {
            start,
            completion,
            priority: WorkItemPriority::Normal,
        }
    }

    pub fn priority(&self) -> WorkItemPriority {
        self.priority
    }
}

impl std::fmt::Debug for PendingThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingThread")
            .field("completion", &self.completion)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Suspended threads keyed by id.
///
/// An entry exists exactly while its thread is suspended: `insert` happens on
/// suspended creation, `set_priority` is the only mutation, and `take` on resume
/// removes it for good. The lock is held only inside these methods, so callers
/// never run user code or submit work while holding it.
#[derive(Default)]
pub struct ThreadHandleTable {
    pending: Mutex<HashMap<ThreadId, PendingThread>>,
}

impl ThreadHandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, id: ThreadId, thread: PendingThread) {
        let previous = self.pending.lock().insert(id, thread);
        debug_assert!(previous.is_none(), "duplicate thread id {}", id);
    }

    /// Remove and return the entry for `id`
    pub(crate) fn take(&self, id: ThreadId) -> Option<PendingThread> {
        self.pending.lock().remove(&id)
    }

    /// Returns `false` if `id` is not pending
    pub(crate) fn set_priority(&self, id: ThreadId, priority: WorkItemPriority) -> bool {
        match self.pending.lock().get_mut(&id) {
            Some(thread) => {
                thread.priority = priority;
                true
            }
            None => false,
        }
    }

    pub fn priority(&self, id: ThreadId) -> Option<WorkItemPriority> {
        self.pending.lock().get(&id).map(PendingThread::priority)
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.pending.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
