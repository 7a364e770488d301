//! Clock and Scheduler Module
//!
//! Time source and delayed-callback registration used by the cache engine.
//! Both are injectable so expiry and revalidation can be driven by virtual
//! time in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

// == Clock ==
/// Source of the current (monotonic) time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Scheduler ==
/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run after `delay`.
    ///
    /// The returned handle cancels the task if it has not started yet.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle;
}

// == Timer Handle ==
/// Cancellation handle for a scheduled task.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    fn new(cancelled: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        Self { cancelled, task }
    }

    /// Cancels the scheduled task. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Scheduler backed by `tokio::time::sleep` on spawned tasks.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::Acquire) {
                task.await;
            }
        });

        TimerHandle::new(cancelled, Some(join))
    }
}

// == Manual Clock ==
struct PendingTask {
    due: Instant,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: BoxFuture<'static, ()>,
}

#[derive(Default)]
struct ManualState {
    elapsed: Duration,
    next_seq: u64,
    pending: Vec<PendingTask>,
}

/// Virtual clock that is also a scheduler.
///
/// Time only moves when [`ManualClock::advance`] is called, which then runs
/// every task that has come due, in due order. Tasks scheduled while
/// advancing run in the same call if they fall inside the advanced window.
///
/// # Example
/// ```ignore
/// let clock = Arc::new(ManualClock::new());
/// let cache: Cache<String> = CacheBuilder::new(config)
///     .clock(clock.clone())
///     .scheduler(clock.clone())
///     .build();
/// clock.advance(Duration::from_secs(10)).await;
/// ```
pub struct ManualClock {
    start: Instant,
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock frozen at the current real instant.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Number of scheduled tasks that are neither run nor cancelled.
    pub fn pending(&self) -> usize {
        self.lock()
            .pending
            .iter()
            .filter(|p| !p.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Moves time forward by `by`, running every task that comes due.
    pub async fn advance(&self, by: Duration) {
        let target = {
            let mut state = self.lock();
            state.elapsed += by;
            self.start + state.elapsed
        };

        while let Some(task) = self.next_due(target) {
            task.await;
        }
    }

    fn next_due(&self, target: Instant) -> Option<BoxFuture<'static, ()>> {
        let mut state = self.lock();
        state
            .pending
            .retain(|p| !p.cancelled.load(Ordering::Acquire));

        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        Some(state.pending.swap_remove(index).task)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // Test utility: a poisoned lock means a task already panicked
        self.state.lock().expect("manual clock mutex poisoned")
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.lock().elapsed
    }
}

impl Scheduler for ManualClock {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.lock();
        let due = self.start + state.elapsed + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(PendingTask {
            due,
            seq,
            cancelled: cancelled.clone(),
            task,
        });

        TimerHandle::new(cancelled, None)
    }
}
