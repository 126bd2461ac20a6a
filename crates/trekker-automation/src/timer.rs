use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// Opaque identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Result of waiting for a cancelled task to wind down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiescence {
    /// The task has exited and nothing is in flight
    Stopped,
    /// An invocation was still running when the grace period ran out
    GraceElapsed,
    /// The handle was not registered (already completed or cancelled)
    Unknown,
}

/// Type of timer
#[derive(Debug, Clone, Copy)]
enum TimerType {
    /// Fires once after `delay` and unregisters itself
    OneShot { delay: Duration },
    /// Fires every `interval` until cancelled
    Recurring { interval: Duration },
}

/// A registered task with metadata
struct ScheduledTask {
    name: String,
    timer_type: TimerType,
    cancel_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

#[derive(Default)]
struct TimerInner {
    tasks: Mutex<HashMap<TimerHandle, ScheduledTask>>,
    next_id: AtomicU64,
}

impl TimerInner {
    fn tasks(&self) -> MutexGuard<'_, HashMap<TimerHandle, ScheduledTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Schedules cancellable one-shot and recurring tasks on the tokio runtime.
///
/// Clones share the same task set. Each task runs on its own driver task, and
/// every invocation is spawned separately so an error or panic in one never
/// reaches the scheduler or the other tasks. The internal lock is never held
/// while a task body runs, so task bodies may schedule or cancel freely.
///
/// Scheduling must happen from within a tokio runtime.
#[derive(Clone, Default)]
pub struct TimerService {
    inner: Arc<TimerInner>,
}

impl TimerService {
    /// Create a new timer service
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run once after `delay`
    pub fn schedule_once<Fut>(
        &self,
        name: impl Into<String>,
        delay: Duration,
        task: Fut,
    ) -> TimerHandle
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let handle = self.next_handle();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let inner = Arc::downgrade(&self.inner);
        let task_name = name.clone();

        // Registration happens under the lock so the task cannot unregister first
        let mut tasks = self.inner.tasks();
        let join = tokio::spawn(async move {
            drive_once(handle, &task_name, delay, task, cancel_rx).await;
            if let Some(inner) = inner.upgrade() {
                inner.tasks().remove(&handle);
            }
        });
        debug!(target: "timer", "Scheduled one-shot {} ({:?}) in {:?}", name, handle, delay);
        tasks.insert(
            handle,
            ScheduledTask {
                name,
                timer_type: TimerType::OneShot { delay },
                cancel_tx,
                join,
            },
        );
        handle
    }

    /// Schedule `task` to run every `interval`, first firing one interval from now.
    ///
    /// Invocations never overlap: a slow invocation pushes the next one back
    /// instead of running alongside it.
    pub fn schedule_repeating<F, Fut>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        task: F,
    ) -> TimerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let handle = self.next_handle();
        let interval = interval.max(Duration::from_millis(1));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task_name = name.clone();

        let mut tasks = self.inner.tasks();
        let join = tokio::spawn(async move {
            drive_recurring(handle, &task_name, interval, task, cancel_rx).await;
        });
        debug!(target: "timer", "Scheduled recurring {} ({:?}) every {:?}", name, handle, interval);
        tasks.insert(
            handle,
            ScheduledTask {
                name,
                timer_type: TimerType::Recurring { interval },
                cancel_tx,
                join,
            },
        );
        handle
    }

    /// Prevent any future invocation for `handle`.
    ///
    /// An invocation that is already running is left to finish. Returns false
    /// when the handle was already completed or cancelled.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let removed = self.inner.tasks().remove(&handle);
        match removed {
            Some(task) => {
                let _ = task.cancel_tx.send(true);
                debug!(target: "timer", "Cancelled {} ({:?}, {:?})", task.name, handle, task.timer_type);
                true
            }
            None => false,
        }
    }

    /// Cancel `handle`, then wait up to `grace` for an in-flight invocation to finish
    pub async fn cancel_and_wait(&self, handle: TimerHandle, grace: Duration) -> Quiescence {
        let removed = self.inner.tasks().remove(&handle);
        let Some(task) = removed else {
            return Quiescence::Unknown;
        };
        let _ = task.cancel_tx.send(true);
        debug!(target: "timer", "Cancelled {} ({:?}), waiting up to {:?}", task.name, handle, grace);

        match time::timeout(grace, task.join).await {
            Ok(_) => Quiescence::Stopped,
            Err(_) => {
                warn!(
                    target: "timer",
                    "{} ({:?}) still running after {:?} grace period",
                    task.name,
                    handle,
                    grace
                );
                Quiescence::GraceElapsed
            }
        }
    }

    /// Whether `handle` is still registered
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.inner.tasks().contains_key(&handle)
    }

    /// Get the number of registered tasks
    pub fn active_count(&self) -> usize {
        self.inner.tasks().len()
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

async fn drive_once<Fut>(
    handle: TimerHandle,
    name: &str,
    delay: Duration,
    task: Fut,
    mut cancel_rx: watch::Receiver<bool>,
) where
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::select! {
        biased;
        _ = cancel_rx.changed() => return,
        _ = time::sleep(delay) => {}
    }
    if *cancel_rx.borrow() {
        return;
    }
    run_invocation(handle, name, task).await;
}

async fn drive_recurring<F, Fut>(
    handle: TimerHandle,
    name: &str,
    interval: Duration,
    mut task: F,
    mut cancel_rx: watch::Receiver<bool>,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if *cancel_rx.borrow() {
            break;
        }
        run_invocation(handle, name, task()).await;
    }
    debug!(target: "timer", "Recurring {} ({:?}) exited", name, handle);
}

/// Run one invocation on its own task so failures stay contained
async fn run_invocation<Fut>(handle: TimerHandle, name: &str, task: Fut)
where
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(target: "timer", "Task {} ({:?}) failed: {:#}", name, handle, e);
        }
        Err(e) if e.is_panic() => {
            error!(target: "timer", "Task {} ({:?}) panicked: {}", name, handle, e);
        }
        Err(e) => {
            warn!(target: "timer", "Task {} ({:?}) was aborted: {}", name, handle, e);
        }
    }
}
