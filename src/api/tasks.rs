//! Cancellable recurring tasks on the shared executor

use crate::utils::TaskTiming;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Body of a recurring task. Runs on the blocking pool and may block.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// The two recurring tasks driven by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Map-matched location dispatch
    EnhancedLocation,
    /// Electronic horizon request
    ElectronicHorizon,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::EnhancedLocation => "enhanced-location",
            TaskKind::ElectronicHorizon => "electronic-horizon",
        }
    }
}

/// Handle of a spawned task loop
struct RunningTask {
    token: CancellationToken,
    _join: JoinHandle<()>,
}

/// Per-task state
enum TaskState {
    NotStarted,
    Running(RunningTask),
    Cancelled,
}

/// Observable status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    Running,
    Cancelled,
}

/// Fixed-rate recurring task with an initial delay
pub struct PeriodicTask {
    kind: TaskKind,
    initial_delay: Duration,
    period: Duration,
    state: TaskState,
}

impl PeriodicTask {
    pub fn new(kind: TaskKind, timing: TaskTiming) -> Self {
        Self {
            kind,
            initial_delay: timing.initial_delay(),
            period: timing.period().max(Duration::from_millis(1)),
            state: TaskState::NotStarted,
        }
    }

    /// Spawn the task loop on `runtime`. No-op if already running.
    ///
    /// Ticks never overlap: the next tick waits for the previous body to
    /// finish. Missed ticks are caught up at once, keeping the fixed rate.
    pub fn start(&mut self, runtime: &Handle, tick: TickFn) -> bool {
        if self.is_running() {
            return false;
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let kind = self.kind;
        let initial_delay = self.initial_delay;
        let period = self.period;

        let join = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + initial_delay, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            debug!(task = kind.name(), "Periodic task started");

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let tick = Arc::clone(&tick);
                if let Err(e) = tokio::task::spawn_blocking(move || (*tick)()).await {
                    warn!(task = kind.name(), error = %e, "Periodic tick did not complete");
                }
            }

            debug!(task = kind.name(), "Periodic task stopped");
        });

        self.state = TaskState::Running(RunningTask { token, _join: join });
        true
    }

    /// Cancel the task. Returns without waiting for an in-flight tick, which
    /// may still complete; no tick starts after this returns.
    /// No-op if not running.
    pub fn stop(&mut self) -> bool {
        match std::mem::replace(&mut self.state, TaskState::Cancelled) {
            TaskState::Running(running) => {
                running.token.cancel();
                true
            }
            previous => {
                self.state = previous;
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TaskState::Running(_))
    }

    pub fn status(&self) -> TaskStatus {
        match self.state {
            TaskState::NotStarted => TaskStatus::NotStarted,
            TaskState::Running(_) => TaskStatus::Running,
            TaskState::Cancelled => TaskStatus::Cancelled,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }
}

/// Enhanced-location and electronic-horizon tasks sharing one executor
pub struct PeriodicTaskPair {
    enhanced_location: PeriodicTask,
    electronic_horizon: PeriodicTask,
}

impl PeriodicTaskPair {
    pub fn new(enhanced_location: TaskTiming, electronic_horizon: TaskTiming) -> Self {
        Self {
            enhanced_location: PeriodicTask::new(TaskKind::EnhancedLocation, enhanced_location),
            electronic_horizon: PeriodicTask::new(TaskKind::ElectronicHorizon, electronic_horizon),
        }
    }

    pub fn start(&mut self, kind: TaskKind, runtime: &Handle, tick: TickFn) -> bool {
        self.task_mut(kind).start(runtime, tick)
    }

    pub fn stop(&mut self, kind: TaskKind) -> bool {
        self.task_mut(kind).stop()
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.task(kind).is_running()
    }

    pub fn status(&self, kind: TaskKind) -> TaskStatus {
        self.task(kind).status()
    }

    fn task(&self, kind: TaskKind) -> &PeriodicTask {
        match kind {
            TaskKind::EnhancedLocation => &self.enhanced_location,
            TaskKind::ElectronicHorizon => &self.electronic_horizon,
        }
    }

    fn task_mut(&mut self, kind: TaskKind) -> &mut PeriodicTask {
        match kind {
            TaskKind::EnhancedLocation => &mut self.enhanced_location,
            TaskKind::ElectronicHorizon => &mut self.electronic_horizon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use tokio::runtime::{Builder, Runtime};

    fn runtime() -> Runtime {
        Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn counting_tick() -> (Arc<AtomicUsize>, TickFn) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        (count, Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_task_ticks_after_initial_delay() {
        let rt = runtime();
        let (count, tick) = counting_tick();
        let mut task = PeriodicTask::new(TaskKind::EnhancedLocation, TaskTiming::new(50, 10));

        assert!(task.start(rt.handle(), tick));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        thread::sleep(Duration::from_millis(200));
        assert!(count.load(Ordering::SeqCst) >= 2);
        task.stop();
    }

    #[test]
    fn test_start_twice_spawns_one_loop() {
        let rt = runtime();
        let (count, tick) = counting_tick();
        let mut task = PeriodicTask::new(TaskKind::ElectronicHorizon, TaskTiming::new(0, 1_000));

        assert!(task.start(rt.handle(), Arc::clone(&tick)));
        assert!(!task.start(rt.handle(), tick));
        thread::sleep(Duration::from_millis(100));

        // One immediate tick from a single loop, the next is a second away
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(task.status(), TaskStatus::Running);
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        let rt = runtime();
        let (count, tick) = counting_tick();
        let mut task = PeriodicTask::new(TaskKind::EnhancedLocation, TaskTiming::new(0, 5));

        task.start(rt.handle(), tick);
        thread::sleep(Duration::from_millis(50));
        assert!(task.stop());
        // Allow an in-flight tick to finish
        thread::sleep(Duration::from_millis(20));
        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));

        assert!(after_stop > 0);
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
        assert_eq!(task.status(), TaskStatus::Cancelled);
    }

    #[test]
    fn test_stop_when_not_running_is_noop() {
        let mut task = PeriodicTask::new(TaskKind::EnhancedLocation, TaskTiming::new(0, 5));

        assert!(!task.stop());
        assert_eq!(task.status(), TaskStatus::NotStarted);
    }

    #[test]
    fn test_restart_after_stop() {
        let rt = runtime();
        let (count, tick) = counting_tick();
        let mut pair = PeriodicTaskPair::new(TaskTiming::new(0, 1_000), TaskTiming::new(0, 1_000));

        assert!(pair.start(TaskKind::EnhancedLocation, rt.handle(), Arc::clone(&tick)));
        assert!(pair.stop(TaskKind::EnhancedLocation));
        assert!(!pair.stop(TaskKind::EnhancedLocation));
        assert!(pair.start(TaskKind::EnhancedLocation, rt.handle(), tick));
        thread::sleep(Duration::from_millis(100));

        assert!(pair.is_running(TaskKind::EnhancedLocation));
        assert!(!pair.is_running(TaskKind::ElectronicHorizon));
        assert_eq!(pair.status(TaskKind::ElectronicHorizon), TaskStatus::NotStarted);
        assert!(count.load(Ordering::SeqCst) >= 1);
    }
}
