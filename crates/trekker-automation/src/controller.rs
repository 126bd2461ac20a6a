use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::AutomationConfig;
use crate::error::{AutomationError, GatewayError};
use crate::gateway::ActionGateway;
use crate::timer::{Quiescence, TimerHandle, TimerService};

/// Autowalk state
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AutomationState {
    /// No movement task registered
    Idle,
    /// Movement task registered and firing
    Walking,
    /// Movement task removed while a reaction runs or a resume is pending
    Suspended,
}

/// Counters describing what autowalk has done so far
#[derive(Debug, Default)]
pub struct AutomationStats {
    /// Movement commands the gateway accepted
    pub moves_issued: AtomicU64,
    /// Movement cycles abandoned because a gateway call failed
    pub move_failures: AtomicU64,
    /// Reactions started by suspends
    pub reactions_run: AtomicU64,
    /// Reactions abandoned because a gateway call failed
    pub reaction_failures: AtomicU64,
    /// Cool-downs that elapsed and restarted autowalk
    pub resumes_fired: AtomicU64,
}

impl AutomationStats {
    pub fn moves_issued(&self) -> u64 {
        self.moves_issued.load(Ordering::SeqCst)
    }

    pub fn reactions_run(&self) -> u64 {
        self.reactions_run.load(Ordering::SeqCst)
    }

    pub fn resumes_fired(&self) -> u64 {
        self.resumes_fired.load(Ordering::SeqCst)
    }

    /// Print statistics to the log
    pub fn print(&self) {
        info!(
            target: "automation",
            "Moves: {} (failed: {}) | Reactions: {} (failed: {}) | Resumes: {}",
            self.moves_issued.load(Ordering::SeqCst),
            self.move_failures.load(Ordering::SeqCst),
            self.reactions_run.load(Ordering::SeqCst),
            self.reaction_failures.load(Ordering::SeqCst),
            self.resumes_fired.load(Ordering::SeqCst),
        );
    }
}

/// Mutable controller state, only touched under `ControllerInner::state`
#[derive(Debug)]
struct ControllerState {
    state: AutomationState,
    movement: Option<TimerHandle>,
    resume: Option<TimerHandle>,
    /// Flips to true once the most recently removed movement task has wound down
    settling: Option<watch::Receiver<bool>>,
    /// Bumped on every transition that invalidates a scheduled resume
    generation: u64,
}

struct ControllerInner {
    config: AutomationConfig,
    gateway: Arc<dyn ActionGateway>,
    timers: TimerService,
    state: Mutex<ControllerState>,
    /// Serializes suspends so only one reaction runs at a time
    reaction_gate: tokio::sync::Mutex<()>,
    stats: Arc<AutomationStats>,
}

impl ControllerInner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the autowalk task and the suspend/resume protocol.
///
/// The state lock is held only around transitions; gateway calls, reactions
/// and waits for in-flight movement all happen with it released.
#[derive(Clone)]
pub struct AutomationController {
    inner: Arc<ControllerInner>,
}

impl AutomationController {
    pub fn new(
        config: AutomationConfig,
        gateway: Arc<dyn ActionGateway>,
        timers: TimerService,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                gateway,
                timers,
                state: Mutex::new(ControllerState {
                    state: AutomationState::Idle,
                    movement: None,
                    resume: None,
                    settling: None,
                    generation: 0,
                }),
                reaction_gate: tokio::sync::Mutex::new(()),
                stats: Arc::new(AutomationStats::default()),
            }),
        }
    }

    pub fn state(&self) -> AutomationState {
        self.inner.lock_state().state
    }

    pub fn stats(&self) -> Arc<AutomationStats> {
        self.inner.stats.clone()
    }

    pub fn timers(&self) -> &TimerService {
        &self.inner.timers
    }

    /// Begin autowalking. Does nothing if already walking.
    pub fn start(&self) -> Result<(), AutomationError> {
        let mut st = self.inner.lock_state();
        self.start_locked(&mut st)
    }

    fn start_locked(&self, st: &mut ControllerState) -> Result<(), AutomationError> {
        if st.state == AutomationState::Walking {
            debug!(target: "automation", "Autowalk already running");
            return Ok(());
        }

        if let Some(handle) = st.movement {
            error!(
                target: "automation",
                "Movement task {:?} still registered while {}",
                handle,
                st.state
            );
            return Err(AutomationError::StateViolation(format!(
                "movement task {:?} still registered while {}",
                handle, st.state
            )));
        }

        // An explicit start supersedes a pending resume
        if let Some(resume) = st.resume.take() {
            self.inner.timers.cancel(resume);
        }
        st.generation += 1;

        let interval = self.inner.config.walk_interval();
        let step = self.inner.config.step;
        let gateway = self.inner.gateway.clone();
        let stats = self.inner.stats.clone();
        let handle = self.inner.timers.schedule_repeating("autowalk", interval, move || {
            walk_step(gateway.clone(), step, stats.clone())
        });

        st.movement = Some(handle);
        st.state = AutomationState::Walking;
        info!(target: "automation", "Autowalk started (every {:?}, step {})", interval, step);
        Ok(())
    }

    /// Stop autowalking and wait (bounded) for an in-flight movement to finish.
    ///
    /// Also drops any pending resume. If a suspend is still waiting for the
    /// movement it removed, this waits for that too. Calling this while idle
    /// does nothing.
    pub async fn stop(&self) {
        let (stopped_here, movement, previous) = {
            let mut st = self.inner.lock_state();
            let previous = st.settling.clone();
            if st.state == AutomationState::Idle && st.movement.is_none() && st.resume.is_none()
            {
                (false, None, previous)
            } else {
                if let Some(resume) = st.resume.take() {
                    self.inner.timers.cancel(resume);
                }
                st.generation += 1;
                st.state = AutomationState::Idle;
                (true, take_movement(&mut st), previous)
            }
        };

        if let Some((handle, settled_tx)) = movement {
            self.quiesce(handle).await;
            let _ = settled_tx.send(true);
        }
        if let Some(previous) = previous {
            self.wait_settled(previous).await;
        }

        if stopped_here {
            info!(target: "automation", "Autowalk stopped");
        } else {
            debug!(target: "automation", "Autowalk already stopped");
        }
    }

    /// Interrupt autowalk, run `reaction`, then resume after the cool-down.
    ///
    /// Only one resume is ever pending: a suspend that arrives while another
    /// is pending replaces it, so the cool-down counts from the latest
    /// reaction. Refused with [`AutomationError::NotRunning`] while idle, in
    /// which case `reaction` is not run.
    pub async fn suspend_for<F, Fut>(&self, reason: &str, reaction: F) -> Result<(), AutomationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), GatewayError>>,
    {
        let _gate = self.inner.reaction_gate.lock().await;

        let movement = {
            let mut st = self.inner.lock_state();
            if st.state == AutomationState::Idle {
                debug!(target: "automation", "Ignoring suspend ({}) while idle", reason);
                return Err(AutomationError::NotRunning);
            }
            if let Some(resume) = st.resume.take() {
                debug!(target: "automation", "Superseding pending resume {:?}", resume);
                self.inner.timers.cancel(resume);
            }
            st.generation += 1;
            st.state = AutomationState::Suspended;
            take_movement(&mut st)
        };

        if let Some((handle, settled_tx)) = movement {
            info!(target: "automation", "Suspending autowalk: {}", reason);
            self.quiesce(handle).await;
            let _ = settled_tx.send(true);
        }

        self.inner.stats.reactions_run.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = reaction().await {
            self.inner.stats.reaction_failures.fetch_add(1, Ordering::SeqCst);
            warn!(target: "automation", "Reaction ({}) abandoned: {}", reason, e);
        }

        let mut st = self.inner.lock_state();
        if st.state != AutomationState::Suspended {
            debug!(
                target: "automation",
                "Autowalk became {} during reaction ({}), not scheduling resume",
                st.state,
                reason
            );
            return Ok(());
        }
        if let Some(resume) = st.resume.take() {
            self.inner.timers.cancel(resume);
        }

        let generation = st.generation;
        let controller = Arc::downgrade(&self.inner);
        let cooldown = self.inner.config.cooldown();
        let handle = self
            .inner
            .timers
            .schedule_once("resume", cooldown, async move {
                resume(controller, generation);
                Ok(())
            });
        st.resume = Some(handle);
        info!(target: "automation", "Resuming autowalk in {:?}", cooldown);
        Ok(())
    }

    /// Wait, bounded by the stop grace, for a movement removed elsewhere to wind down
    async fn wait_settled(&self, mut settled_rx: watch::Receiver<bool>) {
        let grace = self.inner.config.stop_grace();
        let settled = time::timeout(grace, async move {
            // A dropped sender means its waiter went away; nothing left to wait for
            let _ = settled_rx.wait_for(|settled| *settled).await;
        })
        .await;
        if settled.is_err() {
            warn!(
                target: "automation",
                "Movement removed by a suspend still in flight after {:?}, continuing anyway",
                grace
            );
        }
    }

    async fn quiesce(&self, movement: TimerHandle) {
        let grace = self.inner.config.stop_grace();
        match self.inner.timers.cancel_and_wait(movement, grace).await {
            Quiescence::Stopped => {
                debug!(target: "automation", "Movement task {:?} stopped", movement);
            }
            Quiescence::GraceElapsed => {
                warn!(
                    target: "automation",
                    "Movement still in flight after {:?}, continuing anyway",
                    grace
                );
            }
            Quiescence::Unknown => {
                debug!(target: "automation", "Movement task {:?} already gone", movement);
            }
        }
    }
}

/// Remove the movement handle and publish a fresh settling signal for it
fn take_movement(st: &mut ControllerState) -> Option<(TimerHandle, watch::Sender<bool>)> {
    let handle = st.movement.take()?;
    let (settled_tx, settled_rx) = watch::channel(false);
    st.settling = Some(settled_rx);
    Some((handle, settled_tx))
}

/// Resume callback fired by the cool-down timer
fn resume(inner: Weak<ControllerInner>, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let controller = AutomationController { inner };
    let mut st = controller.inner.lock_state();

    if st.state != AutomationState::Suspended || st.generation != generation {
        debug!(
            target: "automation",
            "Stale resume (generation {}, now {} at {}) ignored",
            generation,
            st.state,
            st.generation
        );
        return;
    }

    st.resume = None;
    controller
        .inner
        .stats
        .resumes_fired
        .fetch_add(1, Ordering::SeqCst);
    info!(target: "automation", "Cool-down elapsed, resuming autowalk");
    if let Err(e) = controller.start_locked(&mut st) {
        error!(target: "automation", "Failed to resume autowalk: {}", e);
    }
}

/// One autowalk firing: read the position and head `step` further along both axes
async fn walk_step(
    gateway: Arc<dyn ActionGateway>,
    step: i32,
    stats: Arc<AutomationStats>,
) -> anyhow::Result<()> {
    let position = match gateway.get_position().await {
        Ok(position) => position,
        Err(e) => {
            stats.move_failures.fetch_add(1, Ordering::SeqCst);
            warn!(target: "automation", "Could not read position, retrying next cycle: {}", e);
            return Ok(());
        }
    };

    let target = position.offset(step, step);
    match gateway.move_to(target).await {
        Ok(()) => {
            stats.moves_issued.fetch_add(1, Ordering::SeqCst);
            debug!(target: "automation", "Walking from {} to {}", position, target);
        }
        Err(e) => {
            stats.move_failures.fetch_add(1, Ordering::SeqCst);
            warn!(target: "automation", "Move to {} failed, retrying next cycle: {}", target, e);
        }
    }
    Ok(())
}
