//! Recurring job scheduler.
//!
//! A `PollScheduler` drives one job on a fixed interval. It is either
//! stopped or running; `start` and `stop` are idempotent and may be called
//! from any task. A cycle that is still in flight when a tick or `run_now`
//! arrives causes that trigger to be skipped.

use chrono::{DateTime, Utc};
use domain::models::LogModule;
use domain::services::SystemLogger;
use domain::DomainError;
use metrics::counter;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A unit of background work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging and metrics).
    fn name(&self) -> &'static str;

    async fn execute(&self) -> Result<(), DomainError>;
}

/// Result of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleOutcome {
    Completed,
    Failed,
    /// A previous cycle was still running.
    Skipped,
}

impl CycleOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Failed => "failed",
            CycleOutcome::Skipped => "skipped",
        }
    }
}

/// Point-in-time view of the scheduler for status endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSnapshot {
    pub running: bool,
    pub interval_secs: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct CycleStats {
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    last_completed_at: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
}

/// State shared between the timer task and `run_now` callers.
struct Runner {
    job: Arc<dyn Job>,
    logger: SystemLogger,
    in_flight: AtomicBool,
    stats: CycleStats,
}

/// Holds the overlap guard for one cycle. Dropping it, including on panic
/// or task abort, releases the guard.
struct InFlight(Arc<Runner>);

impl InFlight {
    fn acquire(runner: &Arc<Runner>) -> Option<Self> {
        runner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(runner)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl Runner {
    /// Trigger one cycle. The cycle runs in its own task that owns the
    /// overlap guard, so it completes and is accounted for even when the
    /// caller stops awaiting it.
    async fn run_cycle(self: &Arc<Self>) -> CycleOutcome {
        let name = self.job.name();

        let Some(guard) = InFlight::acquire(self) else {
            debug!(job = name, "Previous cycle still running, skipping");
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return self.record(CycleOutcome::Skipped);
        };

        let runner = Arc::clone(self);
        match tokio::spawn(async move { runner.execute_guarded(guard).await }).await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(job = name, error = %join_err, "Cycle task aborted");
                self.record(CycleOutcome::Failed)
            }
        }
    }

    async fn execute_guarded(&self, guard: InFlight) -> CycleOutcome {
        let name = self.job.name();
        let start = std::time::Instant::now();
        let job = Arc::clone(&self.job);
        // Run in its own task so a panic is contained to this cycle.
        let result = tokio::spawn(async move { job.execute().await }).await;
        drop(guard);

        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(join_err) => Some(format!("job task aborted: {}", join_err)),
        };

        match failure {
            None => {
                info!(
                    job = name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Job completed successfully"
                );
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut last) = self.stats.last_completed_at.lock() {
                    *last = Some(Utc::now());
                }
                self.record(CycleOutcome::Completed)
            }
            Some(message) => {
                error!(
                    job = name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %message,
                    "Job failed"
                );
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut last) = self.stats.last_error.lock() {
                    *last = Some(message.clone());
                }
                self.logger
                    .error(
                        LogModule::System,
                        format!("Background job {} failed", name),
                        &message,
                        None,
                    )
                    .await;
                self.record(CycleOutcome::Failed)
            }
        }
    }

    fn record(&self, outcome: CycleOutcome) -> CycleOutcome {
        counter!(
            "notification_poll_cycles_total",
            "job" => self.job.name(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        outcome
    }
}

struct Active {
    shutdown_tx: watch::Sender<bool>,
}

/// Drives a single job on a fixed interval.
pub struct PollScheduler {
    runner: Arc<Runner>,
    interval: Duration,
    initial_delay: Duration,
    active: Mutex<Option<Active>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new<J: Job + 'static>(job: J, interval: Duration, logger: SystemLogger) -> Self {
        Self {
            runner: Arc::new(Runner {
                job: Arc::new(job),
                logger,
                in_flight: AtomicBool::new(false),
                stats: CycleStats::default(),
            }),
            interval,
            initial_delay: interval,
            active: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Delay before the first tick. Defaults to one interval.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Begin periodic execution. Returns false if already running.
    pub fn start(&self) -> bool {
        let Ok(mut active) = self.active.lock() else {
            error!("Scheduler state lock poisoned");
            return false;
        };
        if active.is_some() {
            debug!(job = self.runner.job.name(), "Scheduler already running");
            return false;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let runner = Arc::clone(&self.runner);
        let period = self.interval;
        let first_tick = Instant::now() + self.initial_delay;

        let handle = tokio::spawn(async move {
            let name = runner.job.name();
            let mut interval = tokio::time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(job = name, interval_secs = period.as_secs(), "Job scheduled");

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!(job = name, "Job shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        runner.run_cycle().await;
                    }
                }
            }
        });

        *active = Some(Active { shutdown_tx });
        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
        info!(job = self.runner.job.name(), "Scheduler started");
        true
    }

    /// Halt future ticks. An in-flight cycle runs to completion.
    /// Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let Ok(mut active) = self.active.lock() else {
            error!("Scheduler state lock poisoned");
            return false;
        };
        match active.take() {
            Some(Active { shutdown_tx }) => {
                let _ = shutdown_tx.send(true);
                info!(job = self.runner.job.name(), "Scheduler stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    /// Run one cycle immediately, sharing the overlap guard with the timer.
    pub async fn run_now(&self) -> CycleOutcome {
        self.runner.run_cycle().await
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let stats = &self.runner.stats;
        SchedulerSnapshot {
            running: self.is_running(),
            interval_secs: self.interval.as_secs(),
            cycles_completed: stats.completed.load(Ordering::Relaxed),
            cycles_failed: stats.failed.load(Ordering::Relaxed),
            cycles_skipped: stats.skipped.load(Ordering::Relaxed),
            last_completed_at: stats.last_completed_at.lock().ok().and_then(|l| *l),
            last_error: stats.last_error.lock().ok().and_then(|l| l.clone()),
        }
    }

    /// Wait for stopped timer tasks to finish, up to `timeout`.
    pub async fn wait_for_shutdown(&self, timeout: Duration) {
        let handles: Vec<JoinHandle<()>> = match self.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(_) => return,
        };

        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
