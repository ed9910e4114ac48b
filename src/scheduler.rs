use crate::error::Result;
use crate::priority::{WorkItemOptions, WorkItemPriority};

/// A unit of work accepted by a [`WorkScheduler`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Priority-tagged unit of work submitted for asynchronous execution
pub struct WorkItem {
    pub priority: WorkItemPriority,
    pub options: WorkItemOptions,
    pub job: Job,
}

impl WorkItem {
    pub fn new<F>(job: F, priority: WorkItemPriority, options: WorkItemOptions) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            priority,
            options,
            job: Box::new(job),
        }
    }

    /// Execute the job on the calling context
    pub fn run(self) {
        (self.job)()
    }
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("priority", &self.priority)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Trait for the cooperative scheduler that emulated threads run on.
///
/// The emulation never owns a dedicated OS thread per emulated thread; it hands
/// each started thread to a scheduler as a [`WorkItem`] and lets the scheduler
/// decide which context runs it. [`ThreadPool`](crate::pool::ThreadPool) is the
/// default implementation, but embedders can supply their own, e.g. to route
/// work onto an engine's existing job system.
///
/// # Example
///
/// ```ignore
/// use thread_emulation::scheduler::{WorkItem, WorkScheduler};
/// use thread_emulation::error::Result;
///
/// struct Inline;
///
/// impl WorkScheduler for Inline {
///     fn submit(&self, item: WorkItem) -> Result<()> {
///         item.run();
///         Ok(())
///     }
/// }
/// ```
pub trait WorkScheduler: Send + Sync {
    /// Queue `item` for execution.
    ///
    /// # Errors
    ///
    /// Returns `ThreadEmulationError::SubmitFailed` if the scheduler cannot
    /// accept work. A rejected item must be dropped without running.
    fn submit(&self, item: WorkItem) -> Result<()>;
}
