//! Prune Scheduler
//!
//! Shared pool of named worker threads running fixed-rate prune tasks.
//!
//! One scheduler is meant to be created per process and handed to every
//! timed cache that needs background pruning. Each registered task gets its
//! own [`PruneHandle`], so caches cancel their schedule independently, while
//! shutting the scheduler down stops every task at once.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Worker pool size used by [`PruneScheduler::new`].
pub const DEFAULT_PRUNE_WORKERS: usize = 16;

/// Longest supported prune period (one year). Larger delays are clamped to it.
pub const MAX_PRUNE_DELAY_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// A task registered with the scheduler.
pub type PruneTask = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct JobState {
    started: AtomicBool,
    cancelled: AtomicBool,
    runs: AtomicU64,
}

// == Prune Handle ==
/// Cancellable handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct PruneHandle {
    abort: AbortHandle,
    state: Arc<JobState>,
}

impl PruneHandle {
    /// Cancels the schedule.
    ///
    /// Best effort: a run already in progress finishes, no further run starts.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Returns true once the task loop has stopped for any reason.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }

    /// Number of completed invocations, including ones that panicked.
    pub fn run_count(&self) -> u64 {
        self.state.runs.load(Ordering::SeqCst)
    }
}

struct Job {
    task: PruneTask,
    abort: AbortHandle,
    state: Arc<JobState>,
}

impl Job {
    fn is_live(&self) -> bool {
        !self.state.cancelled.load(Ordering::SeqCst) && !self.abort.is_finished()
    }
}

struct Pool {
    runtime: Option<Runtime>,
    shutdown_tx: watch::Sender<bool>,
    jobs: Vec<Job>,
}

impl Pool {
    /// Cancels every job and returns the tasks whose first run never started.
    fn abort_all(&mut self) -> Vec<PruneTask> {
        let mut pending = Vec::new();
        for job in self.jobs.drain(..) {
            let never_started = !job.state.started.load(Ordering::SeqCst)
                && !job.state.cancelled.load(Ordering::SeqCst);
            job.state.cancelled.store(true, Ordering::SeqCst);
            job.abort.abort();
            if never_started {
                pending.push(job.task);
            }
        }
        pending
    }

    /// Signals every job loop to stop and releases the workers without blocking.
    /// A prune already executing on a worker runs to completion.
    fn close(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.close();
    }
}

enum PoolState {
    Idle,
    Running(Pool),
    ShutDown,
}

struct Inner {
    workers: usize,
    /// Thread name counter, kept across pool re-creations
    thread_seq: Arc<AtomicUsize>,
    state: Mutex<PoolState>,
}

impl Inner {
    fn build_pool(&self) -> Result<Pool> {
        let seq = Arc::clone(&self.thread_seq);
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.workers)
            .thread_name_fn(move || {
                format!("prune-timer-{}", seq.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .enable_time()
            .build()
            .map_err(|e| CacheError::SchedulerStart(e.to_string()))?;
        let (shutdown_tx, _) = watch::channel(false);

        info!(workers = self.workers, "Prune scheduler pool created");
        Ok(Pool {
            runtime: Some(runtime),
            shutdown_tx,
            jobs: Vec::new(),
        })
    }
}

// == Prune Scheduler ==
/// Cloneable handle to a shared prune worker pool.
///
/// The pool is created lazily on the first [`schedule`](Self::schedule).
#[derive(Clone)]
pub struct PruneScheduler {
    inner: Arc<Inner>,
}

impl PruneScheduler {
    /// Creates a scheduler with [`DEFAULT_PRUNE_WORKERS`] workers.
    pub fn new() -> Self {
        Self::with_workers(DEFAULT_PRUNE_WORKERS)
    }

    /// Creates a scheduler with `workers` threads (at least one).
    pub fn with_workers(workers: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                workers: workers.max(1),
                thread_seq: Arc::new(AtomicUsize::new(0)),
                state: Mutex::new(PoolState::Idle),
            }),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_workers(config.prune_workers)
    }

    // == Schedule ==
    /// Registers a fixed-rate task: first run after `delay_ms`, then every `delay_ms`.
    ///
    /// A run that panics is logged and does not stop later runs. A delay of 0
    /// is treated as 1 ms; delays above [`MAX_PRUNE_DELAY_MS`] are clamped.
    ///
    /// # Errors
    /// - `SchedulerShutdown` after [`shutdown`](Self::shutdown) or
    ///   [`shutdown_now`](Self::shutdown_now), until [`create`](Self::create) is called
    /// - `SchedulerStart` if the worker pool cannot be started
    pub fn schedule<F>(&self, task: F, delay_ms: u64) -> Result<PruneHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task: PruneTask = Arc::new(task);
        let mut state = self.inner.state.lock();
        if matches!(*state, PoolState::Idle) {
            *state = PoolState::Running(self.inner.build_pool()?);
        }
        let PoolState::Running(pool) = &mut *state else {
            return Err(CacheError::SchedulerShutdown);
        };
        let Some(runtime) = pool.runtime.as_ref() else {
            return Err(CacheError::SchedulerShutdown);
        };

        let period = Duration::from_millis(delay_ms.clamp(1, MAX_PRUNE_DELAY_MS));
        let job_state = Arc::new(JobState::default());
        let join = runtime.spawn(run_fixed_rate(
            Arc::clone(&task),
            period,
            Arc::clone(&job_state),
            pool.shutdown_tx.subscribe(),
        ));
        let abort = join.abort_handle();

        pool.jobs.retain(Job::is_live);
        pool.jobs.push(Job {
            task,
            abort: abort.clone(),
            state: Arc::clone(&job_state),
        });
        debug!(period_ms = period.as_millis() as u64, "Scheduled prune task");

        Ok(PruneHandle {
            abort,
            state: job_state,
        })
    }

    // == Lifecycle ==
    /// (Re)creates the worker pool.
    ///
    /// An existing pool is shut down immediately first, discarding its tasks.
    pub fn create(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        let previous = std::mem::replace(&mut *state, PoolState::Idle);
        if let PoolState::Running(mut pool) = previous {
            let discarded = pool.abort_all().len();
            warn!(discarded, "Prune scheduler pool replaced");
        }
        *state = PoolState::Running(self.inner.build_pool()?);
        Ok(())
    }

    /// Stops accepting tasks and stops every schedule. Runs in progress finish.
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), PoolState::ShutDown);
        if let PoolState::Running(pool) = previous {
            info!(tasks = pool.jobs.len(), "Prune scheduler shut down");
        }
    }

    /// Stops immediately, returning the tasks whose first run never started.
    pub fn shutdown_now(&self) -> Vec<PruneTask> {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), PoolState::ShutDown);
        match previous {
            PoolState::Running(mut pool) => {
                let pending = pool.abort_all();
                info!(pending = pending.len(), "Prune scheduler shut down now");
                pending
            }
            _ => Vec::new(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(*self.inner.state.lock(), PoolState::ShutDown)
    }

    /// Returns true while a worker pool exists.
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.state.lock(), PoolState::Running(_))
    }

    /// Number of schedules that are neither cancelled nor stopped.
    pub fn active_tasks(&self) -> usize {
        match &*self.inner.state.lock() {
            PoolState::Running(pool) => pool.jobs.iter().filter(|job| job.is_live()).count(),
            _ => 0,
        }
    }

    pub fn workers(&self) -> usize {
        self.inner.workers
    }
}

impl Default for PruneScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PruneScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            PoolState::Idle => "idle",
            PoolState::Running(_) => "running",
            PoolState::ShutDown => "shut down",
        };
        f.debug_struct("PruneScheduler")
            .field("workers", &self.inner.workers)
            .field("state", &state)
            .finish()
    }
}

async fn run_fixed_rate(
    task: PruneTask,
    period: Duration,
    state: Arc<JobState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if state.cancelled.load(Ordering::SeqCst) || *shutdown.borrow() {
            break;
        }

        state.started.store(true, Ordering::SeqCst);
        if panic::catch_unwind(AssertUnwindSafe(|| (*task)())).is_err() {
            error!("Scheduled prune task panicked; next run stays scheduled");
        }
        state.runs.fetch_add(1, Ordering::SeqCst);
    }
}
