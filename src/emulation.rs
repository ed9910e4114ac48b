//! `CreateThread`, `ResumeThread` and `SetThreadPriority` on top of a [`WorkScheduler`].
//!
//! An emulated thread is a single work item. Creating one allocates a
//! [`CompletionSignal`] and duplicates it: the caller's copy lives in the
//! returned [`ThreadHandle`], the other copy travels with the work item and is
//! set, then released, once the start routine returns. Either side may be
//! released first.
//!
//! Threads created with [`CreationFlags::CREATE_SUSPENDED`] are parked in the
//! [`ThreadHandleTable`] until [`ThreadEmulation::resume_thread`] takes them out
//! and submits them. Their priority can only be changed while they are parked,
//! because the scheduler offers no way to re-prioritise queued or running work.

use crate::assert::{self, ContractViolation};
use crate::config::ThreadEmulationDesc;
use crate::error::{Result, ThreadEmulationError};
use crate::events::EmulationEvent;
use crate::pool::ThreadPool;
use crate::priority::{WorkItemOptions, WorkItemPriority};
use crate::scheduler::{Job, WorkItem, WorkScheduler};
use crate::signal::CompletionSignal;
use crate::table::{PendingThread, ThreadHandleTable};
use crate::tls::{TlsIndex, TlsRegistry, TlsValue};
use bitflags::bitflags;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

bitflags! {
    /// `dwCreationFlags` accepted by [`ThreadEmulation::create_thread`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CreationFlags: u32 {
        const CREATE_SUSPENDED = 0x0000_0004;
    }
}

/// Opaque identity of an emulated thread.
///
/// Only used to find a suspended thread's table entry; waiting goes through the
/// handle's own signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(Uuid);

impl ThreadId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ThreadId({})", self.0)
    }
}

/// Caller-owned handle to an emulated thread.
///
/// Becomes signalled when the start routine returns. Dropping the handle (or
/// calling [`ThreadHandle::close`]) releases only the caller's reference; the
/// thread still runs and signals its own copy.
///
/// The handle is wait-only; its completion signal is not reachable from
/// outside the crate.
///
/// ```compile_fail
/// # use thread_emulation::*;
/// # let emulation = ThreadEmulation::new(ThreadEmulationDesc::default()).unwrap();
/// let handle = emulation
///     .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
///     .unwrap();
/// handle.completion_signal();
/// ```
#[derive(Debug)]
pub struct ThreadHandle {
    id: ThreadId,
    completion: CompletionSignal,
}

impl ThreadHandle {
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Block until the thread has finished
    pub fn wait(&self) {
        self.completion.wait();
    }

    /// Returns `true` if the thread finished within `timeout`
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.completion.wait_timeout(timeout)
    }

    pub fn is_signaled(&self) -> bool {
        self.completion.is_set()
    }

    /// Another independently closable handle to the same thread
    pub fn duplicate(&self) -> ThreadHandle {
        ThreadHandle {
            id: self.id,
            completion: self.completion.duplicate(),
        }
    }

    pub(crate) fn completion_signal(&self) -> &CompletionSignal {
        &self.completion
    }

    pub fn close(self) {
        drop(self);
    }
}

/// Win32 thread emulation over a cooperative scheduler
pub struct ThreadEmulation {
    desc: ThreadEmulationDesc,
    scheduler: Arc<dyn WorkScheduler>,
    table: ThreadHandleTable,
    tls: Arc<TlsRegistry>,
    event_sender: Option<Sender<EmulationEvent>>,
    event_receiver: Receiver<EmulationEvent>,
}

impl ThreadEmulation {
    /// Create an emulation backed by its own [`ThreadPool`]
    pub fn new(desc: ThreadEmulationDesc) -> Result<Self> {
        let pool = ThreadPool::new(desc.pool.clone())?;
        Ok(Self::with_scheduler(desc, Arc::new(pool)))
    }

    /// Create an emulation that submits work to `scheduler`
    pub fn with_scheduler(desc: ThreadEmulationDesc, scheduler: Arc<dyn WorkScheduler>) -> Self {
        let (sender, event_receiver) = crossbeam_channel::unbounded();
        let event_sender = desc.emit_events.then_some(sender);
        let tls = Arc::new(TlsRegistry::new(desc.max_tls_slots));

        Self {
            desc,
            scheduler,
            table: ThreadHandleTable::new(),
            tls,
            event_sender,
            event_receiver,
        }
    }

    /// Create an emulated thread running `start_routine(parameter)`.
    ///
    /// With [`CreationFlags::CREATE_SUSPENDED`] nothing runs until
    /// [`resume_thread`](Self::resume_thread); otherwise the thread is submitted
    /// at normal priority before this returns. Unsupported flag bits are a
    /// contract violation and are otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `SubmitFailed` if the scheduler rejects the thread. Both copies of
    /// the completion signal are released in that case.
    pub fn create_thread<F, P>(
        &self,
        start_routine: F,
        parameter: P,
        flags: CreationFlags,
    ) -> Result<ThreadHandle>
    where
        F: FnOnce(P) + Send + 'static,
        P: Send + 'static,
    {
        let unsupported = flags.bits() & !CreationFlags::CREATE_SUSPENDED.bits();
        if unsupported != 0 {
            self.report_violation(ContractViolation::InvalidCreationFlags { bits: unsupported });
        }
        let suspended = flags.contains(CreationFlags::CREATE_SUSPENDED);

        let id = ThreadId::new();
        let completion = CompletionSignal::new();
        let internal = completion.duplicate();
        let start: Job = Box::new(move || start_routine(parameter));

        self.emit(EmulationEvent::ThreadCreated {
            thread_id: id,
            suspended,
        });

        if suspended {
            self.table.insert(id, PendingThread::new(start, internal));
            log::debug!("Created suspended thread {}", id);
        } else {
            self.dispatch(id, start, internal, WorkItemPriority::Normal)?;
            log::debug!("Created and started thread {}", id);
        }

        Ok(ThreadHandle { id, completion })
    }

    /// Start a thread that was created suspended.
    ///
    /// Returns the previous suspend count, which is always 0 here.
    ///
    /// # Errors
    ///
    /// `NotSuspended` (after reporting a contract violation) if the thread was
    /// never suspended or has already been resumed. `SubmitFailed` if the
    /// scheduler rejects it; the thread is then gone from the table, its
    /// internal signal copy is released and the handle never becomes signalled.
    pub fn resume_thread(&self, handle: &ThreadHandle) -> Result<u32> {
        let id = handle.id();
        let Some(pending) = self.table.take(id) else {
            self.report_violation(ContractViolation::ResumeNotSuspended(id));
            return Err(ThreadEmulationError::NotSuspended(id));
        };

        log::debug!("Resuming thread {} at {} priority", id, pending.priority);
        self.emit(EmulationEvent::ThreadResumed { thread_id: id });

        self.dispatch(id, pending.start, pending.completion, pending.priority)?;
        Ok(0)
    }

    /// Set the priority of a suspended thread.
    ///
    /// Negative values run low, zero normal, positive high.
    ///
    /// # Errors
    ///
    /// `NotSuspended` (after reporting a contract violation) if the thread is
    /// not suspended.
    pub fn set_thread_priority(&self, handle: &ThreadHandle, priority: i32) -> Result<()> {
        let id = handle.id();
        let tier = WorkItemPriority::from_thread_priority(priority);

        if !self.table.set_priority(id, tier) {
            self.report_violation(ContractViolation::PriorityNotSuspended(id));
            return Err(ThreadEmulationError::NotSuspended(id));
        }

        log::debug!("Thread {} priority set to {} ({})", id, tier, priority);
        self.emit(EmulationEvent::PriorityChanged {
            thread_id: id,
            priority: tier,
        });
        Ok(())
    }

    pub fn tls_alloc(&self) -> Result<TlsIndex> {
        self.tls.alloc()
    }

    pub fn tls_free(&self, index: TlsIndex) -> Result<()> {
        self.check_tls(self.tls.free(index))
    }

    pub fn tls_get_value(&self, index: TlsIndex) -> Result<Option<TlsValue>> {
        self.check_tls(self.tls.get_value(index))
    }

    /// Store `value` for the calling emulated thread; `None` clears the slot
    pub fn tls_set_value(&self, index: TlsIndex, value: Option<TlsValue>) -> Result<()> {
        self.check_tls(self.tls.set_value(index, value))
    }

    /// Whether `handle` refers to a thread that is still suspended
    pub fn is_pending(&self, handle: &ThreadHandle) -> bool {
        self.table.contains(handle.id())
    }

    /// Number of threads created suspended and not yet resumed
    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    /// Drain queued events; always empty unless `emit_events` is enabled
    pub fn poll_events(&self) -> Vec<EmulationEvent> {
        self.event_receiver.try_iter().collect()
    }

    pub fn desc(&self) -> &ThreadEmulationDesc {
        &self.desc
    }

    pub fn tls_registry(&self) -> &TlsRegistry {
        &self.tls
    }

    /// Submit a started thread. Never called with the table lock held.
    fn dispatch(
        &self,
        id: ThreadId,
        start: Job,
        completion: CompletionSignal,
        priority: WorkItemPriority,
    ) -> Result<()> {
        let events = self.event_sender.clone();
        let tls = Arc::clone(&self.tls);

        let job = move || {
            // Declared first so it drops last: TLS values are gone before waiters wake.
            let _completion = CompletionGuard {
                id,
                signal: completion,
                events: events.clone(),
            };
            let _tls = tls.enter_context();

            if let Some(events) = &events {
                let _ = events.send(EmulationEvent::ThreadStarted {
                    thread_id: id,
                    priority,
                });
            }
            log::trace!("Thread {} running at {} priority", id, priority);
            start();
        };

        self.scheduler
            .submit(WorkItem::new(job, priority, WorkItemOptions::TimeSliced))
            .inspect_err(|e| {
                log::warn!("Failed to start thread {}: {}", id, e);
                self.emit(EmulationEvent::SubmitFailed {
                    thread_id: id,
                    error: e.to_string(),
                });
            })
    }

    fn check_tls<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ThreadEmulationError::InvalidTlsIndex(index)) = &result {
            self.report_violation(ContractViolation::InvalidTlsIndex(*index));
        }
        result
    }

    fn report_violation(&self, violation: ContractViolation) {
        self.emit(EmulationEvent::ContractViolation {
            violation: violation.clone(),
        });
        assert::report(self.desc.assert_hook.as_ref(), &violation);
    }

    fn emit(&self, event: EmulationEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

/// Sets, then releases, the dispatch copy of a thread's completion signal.
///
/// Runs on drop so the handle is signalled even if the start routine unwinds.
struct CompletionGuard {
    id: ThreadId,
    signal: CompletionSignal,
    events: Option<Sender<EmulationEvent>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let first = self.signal.set();
        debug_assert!(first, "thread {} signalled twice", self.id);
        log::debug!("Thread {} completed", self.id);

        if let Some(events) = &self.events {
            let _ = events.send(EmulationEvent::ThreadCompleted { thread_id: self.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThreadPoolConfig;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Holds submitted items until the test runs them
    #[derive(Default)]
    struct RecordingScheduler {
        items: Mutex<Vec<WorkItem>>,
        reject: std::sync::atomic::AtomicBool,
    }

    impl RecordingScheduler {
        fn submitted(&self) -> Vec<(WorkItemPriority, WorkItemOptions)> {
            self.items
                .lock()
                .iter()
                .map(|item| (item.priority, item.options))
                .collect()
        }

        fn run_all(&self) {
            let items = std::mem::take(&mut *self.items.lock());
            for item in items {
                item.run();
            }
        }

        fn reject_submissions(&self) {
            self.reject.store(true, Ordering::SeqCst);
        }
    }

    impl WorkScheduler for RecordingScheduler {
        fn submit(&self, item: WorkItem) -> Result<()> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(ThreadEmulationError::SubmitFailed("rejected".into()));
            }
            self.items.lock().push(item);
            Ok(())
        }
    }

    fn recorded() -> (ThreadEmulation, Arc<RecordingScheduler>, Arc<Mutex<Vec<ContractViolation>>>) {
        let violations = Arc::new(Mutex::new(Vec::new()));
        let seen = violations.clone();
        let scheduler = Arc::new(RecordingScheduler::default());
        let desc = ThreadEmulationDesc::new()
            .emit_events(true)
            .assert_hook(move |v| seen.lock().push(v.clone()));
        let emulation = ThreadEmulation::with_scheduler(desc, scheduler.clone());
        (emulation, scheduler, violations)
    }

    fn counting_routine(counter: Arc<AtomicUsize>) -> (impl FnOnce(usize) + Send + 'static, usize) {
        (
            move |step: usize| {
                counter.fetch_add(step, Ordering::SeqCst);
            },
            1,
        )
    }

    #[test]
    fn test_suspended_create_does_no_work() {
        let (emulation, scheduler, _) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::CREATE_SUSPENDED)
            .unwrap();

        assert!(scheduler.submitted().is_empty());
        scheduler.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(emulation.is_pending(&handle));
        assert!(!handle.is_signaled());
    }

    #[test]
    fn test_immediate_create_submits_normal_time_sliced() {
        let (emulation, scheduler, _) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::empty())
            .unwrap();

        assert_eq!(
            scheduler.submitted(),
            vec![(WorkItemPriority::Normal, WorkItemOptions::TimeSliced)]
        );
        assert!(!emulation.is_pending(&handle));

        scheduler.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_signaled());
    }

    #[test]
    fn test_resume_runs_exactly_once() {
        let (emulation, scheduler, _) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::CREATE_SUSPENDED)
            .unwrap();
        assert_eq!(emulation.resume_thread(&handle).unwrap(), 0);
        scheduler.run_all();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.wait_timeout(Duration::from_millis(0)));

        let completions = emulation
            .poll_events()
            .into_iter()
            .filter(|e| matches!(e, EmulationEvent::ThreadCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_double_resume_fails() {
        let (emulation, scheduler, violations) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::CREATE_SUSPENDED)
            .unwrap();
        emulation.resume_thread(&handle).unwrap();

        let second = emulation.resume_thread(&handle);
        assert!(matches!(second, Err(ThreadEmulationError::NotSuspended(id)) if id == handle.id()));
        assert_eq!(
            *violations.lock(),
            vec![ContractViolation::ResumeNotSuspended(handle.id())]
        );

        scheduler.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resume_of_running_thread_fails() {
        let (emulation, _, violations) = recorded();
        let handle = emulation
            .create_thread(|_: ()| {}, (), CreationFlags::empty())
            .unwrap();

        assert!(emulation.resume_thread(&handle).is_err());
        assert_eq!(violations.lock().len(), 1);
    }

    #[test]
    fn test_priority_only_settable_while_pending() {
        let (emulation, _, violations) = recorded();
        let handle = emulation
            .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
            .unwrap();

        assert!(emulation.set_thread_priority(&handle, 2).is_ok());
        emulation.resume_thread(&handle).unwrap();

        assert!(matches!(
            emulation.set_thread_priority(&handle, 2),
            Err(ThreadEmulationError::NotSuspended(_))
        ));
        assert_eq!(
            *violations.lock(),
            vec![ContractViolation::PriorityNotSuspended(handle.id())]
        );
    }

    #[test]
    fn test_priority_mapping_reaches_scheduler() {
        let (emulation, scheduler, _) = recorded();

        for priority in [-7, 0, 3] {
            let handle = emulation
                .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
                .unwrap();
            emulation.set_thread_priority(&handle, priority).unwrap();
            emulation.resume_thread(&handle).unwrap();
        }

        let tiers: Vec<WorkItemPriority> = scheduler.submitted().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            tiers,
            vec![
                WorkItemPriority::Low,
                WorkItemPriority::Normal,
                WorkItemPriority::High
            ]
        );
    }

    #[test]
    fn test_last_priority_wins() {
        let (emulation, scheduler, _) = recorded();
        let handle = emulation
            .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
            .unwrap();

        emulation.set_thread_priority(&handle, 1).unwrap();
        emulation.set_thread_priority(&handle, -1).unwrap();
        emulation.resume_thread(&handle).unwrap();

        assert_eq!(scheduler.submitted()[0].0, WorkItemPriority::Low);
    }

    #[test]
    fn test_invalid_flags_reported() {
        let (emulation, scheduler, violations) = recorded();
        let flags = CreationFlags::from_bits_retain(0x0001_0000);

        let handle = emulation.create_thread(|_: ()| {}, (), flags).unwrap();

        assert_eq!(
            *violations.lock(),
            vec![ContractViolation::InvalidCreationFlags { bits: 0x0001_0000 }]
        );
        // Unknown bits are ignored, so the thread starts immediately.
        assert_eq!(scheduler.submitted().len(), 1);
        assert!(!emulation.is_pending(&handle));
    }

    #[test]
    fn test_submit_failure_releases_signal() {
        let (emulation, scheduler, _) = recorded();
        scheduler.reject_submissions();

        let result = emulation.create_thread(|_: ()| {}, (), CreationFlags::empty());
        assert!(matches!(result, Err(ThreadEmulationError::SubmitFailed(_))));
        assert_eq!(emulation.pending_count(), 0);
    }

    #[test]
    fn test_resume_submit_failure_closes_internal_copy() {
        let (emulation, scheduler, _) = recorded();
        let handle = emulation
            .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
            .unwrap();
        assert_eq!(handle.completion_signal().owner_count(), 2);

        scheduler.reject_submissions();
        assert!(matches!(
            emulation.resume_thread(&handle),
            Err(ThreadEmulationError::SubmitFailed(_))
        ));

        assert!(!emulation.is_pending(&handle));
        assert_eq!(handle.completion_signal().owner_count(), 1);
        assert!(!handle.is_signaled());
        assert!(emulation.poll_events().iter().any(EmulationEvent::is_error));
    }

    #[test]
    fn test_handle_unsignalled_until_routine_returns() {
        let (emulation, scheduler, _) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::CREATE_SUSPENDED)
            .unwrap();
        let observer = handle.duplicate();

        // Nothing the caller holds can complete the thread ahead of its routine.
        assert!(!observer.wait_timeout(Duration::from_millis(0)));
        emulation.resume_thread(&handle).unwrap();
        assert!(!handle.is_signaled());

        scheduler.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(observer.wait_timeout(Duration::from_millis(0)));

        let completions = emulation
            .poll_events()
            .into_iter()
            .filter(|e| matches!(e, EmulationEvent::ThreadCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_handle_independence() {
        let (emulation, scheduler, _) = recorded();
        let calls = Arc::new(AtomicUsize::new(0));
        let (routine, param) = counting_routine(calls.clone());

        let handle = emulation
            .create_thread(routine, param, CreationFlags::empty())
            .unwrap();
        let observer = handle.duplicate();
        handle.close();

        scheduler.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(observer.is_signaled());
        // Dispatch released its copy after signalling.
        assert_eq!(observer.completion_signal().owner_count(), 1);
    }

    #[test]
    fn test_event_sequence_for_suspended_thread() {
        let (emulation, scheduler, _) = recorded();
        let handle = emulation
            .create_thread(|_: ()| {}, (), CreationFlags::CREATE_SUSPENDED)
            .unwrap();
        emulation.set_thread_priority(&handle, 1).unwrap();
        emulation.resume_thread(&handle).unwrap();
        scheduler.run_all();

        let id = handle.id();
        assert_eq!(
            emulation.poll_events(),
            vec![
                EmulationEvent::ThreadCreated {
                    thread_id: id,
                    suspended: true
                },
                EmulationEvent::PriorityChanged {
                    thread_id: id,
                    priority: WorkItemPriority::High
                },
                EmulationEvent::ThreadResumed { thread_id: id },
                EmulationEvent::ThreadStarted {
                    thread_id: id,
                    priority: WorkItemPriority::High
                },
                EmulationEvent::ThreadCompleted { thread_id: id },
            ]
        );
    }

    #[test]
    fn test_tls_is_fresh_per_emulated_thread() {
        let (emulation, scheduler, _) = recorded();
        let emulation = Arc::new(emulation);
        let index = emulation.tls_alloc().unwrap();
        emulation.tls_set_value(index, Some(Arc::new(1u32))).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for value in [2u32, 3u32] {
            let inner = emulation.clone();
            let seen = seen.clone();
            emulation
                .create_thread(
                    move |value: u32| {
                        let before = inner.tls_get_value(index).unwrap().is_some();
                        inner.tls_set_value(index, Some(Arc::new(value))).unwrap();
                        seen.lock().push(before);
                    },
                    value,
                    CreationFlags::empty(),
                )
                .unwrap();
        }

        // The recording scheduler runs both threads on this OS thread.
        scheduler.run_all();
        assert_eq!(*seen.lock(), vec![false, false]);

        let own = emulation.tls_get_value(index).unwrap().unwrap();
        assert_eq!(own.downcast_ref::<u32>(), Some(&1));
    }

    #[test]
    fn test_tls_free_of_unallocated_index_reported() {
        let (emulation, _, violations) = recorded();
        let index = emulation.tls_alloc().unwrap();
        emulation.tls_free(index).unwrap();

        assert!(emulation.tls_free(index).is_err());
        assert_eq!(
            *violations.lock(),
            vec![ContractViolation::InvalidTlsIndex(index.index())]
        );
    }

    #[test]
    fn test_thread_pool_end_to_end() {
        let desc = ThreadEmulationDesc::new().pool(ThreadPoolConfig::new().worker_count(2));
        let emulation = ThreadEmulation::new(desc).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<ThreadHandle> = (0..8)
            .map(|i| {
                let (routine, param) = counting_routine(calls.clone());
                let flags = if i % 2 == 0 {
                    CreationFlags::CREATE_SUSPENDED
                } else {
                    CreationFlags::empty()
                };
                emulation.create_thread(routine, param, flags).unwrap()
            })
            .collect();

        for handle in handles.iter().step_by(2) {
            emulation.set_thread_priority(handle, -1).unwrap();
            emulation.resume_thread(handle).unwrap();
        }

        for handle in &handles {
            assert!(handle.wait_timeout(Duration::from_secs(5)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(emulation.pending_count(), 0);
    }

    #[test]
    fn test_panicking_routine_still_signals() {
        let desc = ThreadEmulationDesc::new().pool(ThreadPoolConfig::new().worker_count(1));
        let emulation = ThreadEmulation::new(desc).unwrap();

        let handle = emulation
            .create_thread(|_: ()| panic!("routine failure"), (), CreationFlags::empty())
            .unwrap();

        assert!(handle.wait_timeout(Duration::from_secs(5)));
    }
}
