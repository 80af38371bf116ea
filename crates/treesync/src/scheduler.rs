//! Periodic, non-reentrant driver for reconciliation passes.
//!
//! ```text
//!            start()                    tick
//!   Idle ------------> Scheduled ----------------> fire()
//!    ^                    |                          |
//!    |      stop()        |         guard held? -- yes --> Skipped
//!    +--------------------+                          |
//!                                                    no
//!                                                    v
//!                                      run pass, release guard on drop
//! ```
//!
//! Each tick spawns its pass as a separate task, so while a slow pass is
//! running later ticks observe the guard and are dropped rather than
//! queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use treesync_fs::LocalFilesystem;
use treesync_sync::{Reconciler, RemoteProxy, SyncError, SyncReport};

use crate::config::{SchedulerConfig, TreesyncConfig};
use crate::error::{Result, TreesyncError};

/// What happened when the trigger fired.
#[derive(Debug)]
pub enum TickOutcome {
    /// A pass was already running; nothing was done.
    Skipped,
    /// The pass ran and every transfer succeeded.
    Completed(SyncReport),
    /// The pass ran and failed (possibly after partial progress).
    Failed(SyncError),
}

impl TickOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped)
    }

    /// Convert into a `Result`, mapping a skipped tick to
    /// [`TreesyncError::PassInProgress`].
    pub fn into_result(self) -> Result<SyncReport> {
        match self {
            TickOutcome::Skipped => Err(TreesyncError::PassInProgress),
            TickOutcome::Completed(report) => Ok(report),
            TickOutcome::Failed(e) => Err(e.into()),
        }
    }
}

/// Holds the in-progress flag for the duration of one pass.
///
/// The flag is cleared on drop, which also covers panics and cancelled
/// futures.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Guarded entry point to a [`Reconciler`].
///
/// At most one pass runs at a time; concurrent calls to [`fire`](Self::fire)
/// return [`TickOutcome::Skipped`].
pub struct SyncTrigger<L: LocalFilesystem, R: RemoteProxy> {
    reconciler: Reconciler<L, R>,
    in_progress: AtomicBool,
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl<L: LocalFilesystem, R: RemoteProxy> SyncTrigger<L, R> {
    pub fn new(reconciler: Reconciler<L, R>) -> Self {
        Self {
            reconciler,
            in_progress: AtomicBool::new(false),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Run a pass unless one is already in flight.
    pub async fn fire(&self) -> TickOutcome {
        let Some(_guard) = PassGuard::try_acquire(&self.in_progress) else {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("sync pass already in progress; skipping");
            return TickOutcome::Skipped;
        };

        match self.reconciler.run().await {
            Ok(report) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                TickOutcome::Completed(report)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, transient = e.is_transient(), "sync pass failed");
                TickOutcome::Failed(e)
            }
        }
    }

    /// Whether a pass currently holds the guard.
    pub fn is_syncing(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn reconciler(&self) -> &Reconciler<L, R> {
        &self.reconciler
    }

    /// Passes that finished without error.
    pub fn completed_passes(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Passes that returned an error.
    pub fn failed_passes(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Firings dropped because a pass was in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Runs a [`SyncTrigger`] on a fixed interval.
///
/// Requires a Tokio runtime. Dropping the scheduler stops the timer; a pass
/// already in flight is allowed to finish.
pub struct SyncScheduler<L, R>
where
    L: LocalFilesystem + 'static,
    R: RemoteProxy + 'static,
{
    trigger: Arc<SyncTrigger<L, R>>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl<L, R> SyncScheduler<L, R>
where
    L: LocalFilesystem + 'static,
    R: RemoteProxy + 'static,
{
    /// Create an idle scheduler around an existing reconciler.
    pub fn new(reconciler: Reconciler<L, R>, config: SchedulerConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(TreesyncError::InvalidConfig(
                "scheduler interval must be non-zero".into(),
            ));
        }
        Ok(Self {
            trigger: Arc::new(SyncTrigger::new(reconciler)),
            interval: config.interval,
            timer: None,
        })
    }

    /// Create an idle scheduler from a full configuration.
    pub fn from_config(local: Arc<L>, remote: Arc<R>, config: TreesyncConfig) -> Result<Self> {
        config.validate()?;
        let reconciler = Reconciler::new(local, remote, config.sync);
        Self::new(reconciler, config.scheduler)
    }

    /// Start ticking. A running timer is stopped first.
    ///
    /// The first tick fires one interval from now.
    pub fn start(&mut self) {
        self.stop();

        let trigger = Arc::clone(&self.trigger);
        let period = self.interval;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let trigger = Arc::clone(&trigger);
                tokio::spawn(async move {
                    trigger.fire().await;
                });
            }
        }));

        info!(interval_ms = period.as_millis() as u64, "sync scheduler started");
    }

    /// Stop ticking. No-op when idle; an in-flight pass runs to completion.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("sync scheduler stopped");
        }
    }

    /// Whether a timer is registered.
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Run one guarded pass now, outside the timer.
    pub async fn run_once(&self) -> TickOutcome {
        self.trigger.fire().await
    }

    pub fn trigger(&self) -> &Arc<SyncTrigger<L, R>> {
        &self.trigger
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<L, R> Drop for SyncScheduler<L, R>
where
    L: LocalFilesystem + 'static,
    R: RemoteProxy + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}
