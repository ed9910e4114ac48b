//! Default [`WorkScheduler`]: a fixed set of worker threads fed by one queue per
//! priority tier.
//!
//! Workers always drain the high queue before the normal queue and the normal
//! queue before the low queue. When every queue is empty a worker blocks on a
//! [`crossbeam_channel::Select`] over all three, so idle workers cost nothing.
//! A job runs to completion once started; there is no preemption between
//! tiers, only ordering of what gets picked next.
//!
//! Workers are shared and never dedicated to one job, so every item is run as
//! if it were [`WorkItemOptions::TimeSliced`] whatever options it carries.

use crate::config::ThreadPoolConfig;
use crate::error::{Result, ThreadEmulationError};
use crate::priority::WorkItemOptions;
use crate::scheduler::{Job, WorkItem, WorkScheduler};
use crossbeam_channel::{Receiver, Select, Sender, TryRecvError};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

const TIER_COUNT: usize = 3;

pub struct ThreadPool {
    config: ThreadPoolConfig,
    /// One sender per tier, indexed by `WorkItemPriority::queue_index`. `None` once shut down.
    senders: RwLock<Option<[Sender<Job>; TIER_COUNT]>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    is_running: Arc<AtomicBool>,
    jobs_completed: Arc<AtomicUsize>,
}

impl ThreadPool {
    /// Create the pool and start its workers
    pub fn new(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let (high_tx, high_rx) = crossbeam_channel::unbounded();
        let (normal_tx, normal_rx) = crossbeam_channel::unbounded();
        let (low_tx, low_rx) = crossbeam_channel::unbounded();
        let receivers = [high_rx, normal_rx, low_rx];

        let pool = Self {
            config,
            senders: RwLock::new(Some([high_tx, normal_tx, low_tx])),
            workers: Mutex::new(Vec::new()),
            is_running: Arc::new(AtomicBool::new(true)),
            jobs_completed: Arc::new(AtomicUsize::new(0)),
        };

        for id in 0..pool.config.worker_count {
            let receivers = receivers.clone();
            let jobs_completed = pool.jobs_completed.clone();

            let mut builder =
                thread::Builder::new().name(format!("{}-{}", pool.config.thread_name_prefix, id));
            if let Some(stack_size) = pool.config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            // On failure `pool` is dropped here, which closes the queues and joins
            // the workers started so far.
            let handle = builder.spawn(move || Self::run_loop(id, receivers, jobs_completed))?;
            pool.workers.lock().push(handle);
        }

        log::debug!(
            "Thread pool started with {} workers",
            pool.config.worker_count
        );
        Ok(pool)
    }

    /// Stop accepting work, let queued jobs finish and join every worker
    pub fn shutdown(&self) {
        if self.senders.write().take().is_none() {
            return;
        }
        self.is_running.store(false, Ordering::Release);

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for handle in workers {
            // A job that drops its own pool must not join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::error!("Thread pool worker exited abnormally");
            }
        }
        log::debug!("Thread pool shut down");
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Number of jobs that have finished running, including ones that panicked
    pub fn jobs_completed(&self) -> usize {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Number of jobs waiting in any queue
    pub fn queued_jobs(&self) -> usize {
        self.senders
            .read()
            .as_ref()
            .map(|senders| senders.iter().map(Sender::len).sum())
            .unwrap_or(0)
    }

    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    fn run_loop(id: usize, receivers: [Receiver<Job>; TIER_COUNT], jobs_completed: Arc<AtomicUsize>) {
        while let Some(job) = Self::next_job(&receivers) {
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                log::error!("Job panicked on thread pool worker {}", id);
            }
            jobs_completed.fetch_add(1, Ordering::Relaxed);
        }
        log::trace!("Thread pool worker {} exiting", id);
    }

    /// Pick the next job, highest tier first. Returns `None` once every queue
    /// is both closed and empty.
    fn next_job(receivers: &[Receiver<Job>; TIER_COUNT]) -> Option<Job> {
        loop {
            let mut disconnected = 0;
            for receiver in receivers {
                match receiver.try_recv() {
                    Ok(job) => return Some(job),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => disconnected += 1,
                }
            }
            if disconnected == TIER_COUNT {
                return None;
            }

            let mut select = Select::new();
            for receiver in receivers {
                select.recv(receiver);
            }
            // Only wakes us; the job itself is taken by the priority scan above.
            select.ready();
        }
    }
}

impl WorkScheduler for ThreadPool {
    fn submit(&self, item: WorkItem) -> Result<()> {
        let senders = self.senders.read();
        let senders = senders.as_ref().ok_or_else(|| {
            ThreadEmulationError::SubmitFailed("thread pool is shut down".into())
        })?;

        if item.options != WorkItemOptions::TimeSliced {
            log::trace!(
                "Running {:?} work item as time-sliced at {} priority",
                item.options,
                item.priority
            );
        }

        senders[item.priority.queue_index()]
            .send(item.job)
            .map_err(|e| {
                ThreadEmulationError::SubmitFailed(format!("thread pool queue closed: {}", e))
            })
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
