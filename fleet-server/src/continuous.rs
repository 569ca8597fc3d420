//! Periodic scheduling driver.
//!
//! Re-invokes the batch orchestrator over a rolling window so newly added
//! buses and routes are picked up without manual re-invocation. At most
//! one pass is in flight at a time: a timer tick that fires while a pass
//! is still running is skipped, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::DateRange;
use crate::engine::{EngineError, RunOptions, Scheduler};
use crate::notify::ScheduleEvent;
use crate::store::TransitStore;

/// Snapshot of the driver's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuousStatus {
    pub running: bool,
    pub interval_secs: u64,
    pub window_days: u32,
    pub passes_completed: u64,
    pub ticks_skipped: u64,
}

#[derive(Default)]
struct Stats {
    passes_completed: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Interval driver around [`Scheduler::schedule_all`].
pub struct ContinuousScheduler<S> {
    scheduler: Arc<Scheduler<S>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    in_flight: Arc<AtomicBool>,
    stats: Arc<Stats>,
}

impl<S: TransitStore + 'static> ContinuousScheduler<S> {
    pub fn new(scheduler: Arc<Scheduler<S>>) -> Self {
        Self {
            scheduler,
            handle: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Stats::default()),
        }
    }

    /// Start the timer. Starting an already-running driver is a logged
    /// no-op.
    pub fn start(&self) {
        let mut slot = self.handle.lock().expect("continuous handle lock poisoned");
        if let Some(handle) = slot.as_ref()
            && !handle.is_finished()
        {
            info!("continuous scheduler already running; start ignored");
            return;
        }

        let interval = self.scheduler.config().continuous_interval;
        let window_days = self.scheduler.config().rolling_window_days;
        let scheduler = Arc::clone(&self.scheduler);
        let in_flight = Arc::clone(&self.in_flight);
        let stats = Arc::clone(&self.stats);

        info!(
            interval_secs = interval.as_secs(),
            window_days, "continuous scheduler started"
        );

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the first pass
            // lands one interval after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;

                if in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
                    info!("previous pass still in flight; tick skipped");
                    continue;
                }

                // The pass runs on its own task so the ticker stays on
                // schedule; the in-flight flag is what prevents overlap.
                let scheduler = Arc::clone(&scheduler);
                let in_flight = Arc::clone(&in_flight);
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    run_pass(&scheduler, window_days, &stats).await;
                    in_flight.store(false, Ordering::SeqCst);
                });
            }
        }));
    }

    /// Stop the timer. Stopping a non-running driver is a logged no-op.
    /// A pass already in flight runs to completion.
    pub fn stop(&self) {
        let mut slot = self.handle.lock().expect("continuous handle lock poisoned");
        match slot.take() {
            Some(handle) => {
                handle.abort();
                info!("continuous scheduler stopped");
            }
            None => info!("continuous scheduler not running; stop ignored"),
        }
    }

    pub fn status(&self) -> ContinuousStatus {
        let slot = self.handle.lock().expect("continuous handle lock poisoned");
        let running = slot.as_ref().is_some_and(|h| !h.is_finished());
        ContinuousStatus {
            running,
            interval_secs: self.scheduler.config().continuous_interval.as_secs(),
            window_days: self.scheduler.config().rolling_window_days,
            passes_completed: self.stats.passes_completed.load(Ordering::Relaxed),
            ticks_skipped: self.stats.ticks_skipped.load(Ordering::Relaxed),
        }
    }
}

/// One rolling-window pass: today through today + window.
async fn run_pass<S: TransitStore>(scheduler: &Scheduler<S>, window_days: u32, stats: &Stats) {
    let today = Local::now().date_naive();
    let end = today + chrono::Duration::days(window_days.saturating_sub(1) as i64);
    let Ok(range) = DateRange::new(today, end) else {
        return;
    };

    match scheduler
        .schedule_all(None, &range, RunOptions::default())
        .await
    {
        Ok(summary) => {
            stats.passes_completed.fetch_add(1, Ordering::Relaxed);
            scheduler.notify(ScheduleEvent::RunCompleted {
                total_buses: summary.total_buses,
                scheduled_buses: summary.scheduled_buses,
                total_trips: summary.total_trips,
            });
            info!(
                scheduled = summary.scheduled_buses,
                total = summary.total_buses,
                trips = summary.total_trips,
                "continuous pass completed"
            );
        }
        Err(EngineError::RunInProgress) => {
            stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            info!("manual run in progress; continuous pass skipped");
        }
        Err(e) => warn!(error = %e, "continuous pass failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::store::InMemoryStore;
    use std::time::Duration;

    fn fast_scheduler() -> Arc<Scheduler<InMemoryStore>> {
        let config = EngineConfig {
            continuous_interval: Duration::from_millis(20),
            ..EngineConfig::default()
        };
        Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), config))
    }

    #[tokio::test]
    async fn passes_run_on_the_interval() {
        let driver = ContinuousScheduler::new(fast_scheduler());
        driver.start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        driver.stop();

        let status = driver.status();
        assert!(!status.running);
        assert!(status.passes_completed >= 2);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let driver = ContinuousScheduler::new(fast_scheduler());
        driver.start();
        driver.start(); // logged no-op

        assert!(driver.status().running);
        driver.stop();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let driver = ContinuousScheduler::new(fast_scheduler());
        driver.stop(); // not running: no-op
        driver.start();
        driver.stop();
        driver.stop(); // already stopped: no-op
        assert!(!driver.status().running);
    }

    #[tokio::test]
    async fn ticks_skipped_while_a_pass_is_in_flight() {
        let driver = ContinuousScheduler::new(fast_scheduler());
        // Pin the in-flight flag as if a pass were still running; every
        // tick must be skipped, not queued.
        driver.in_flight.store(true, Ordering::SeqCst);
        driver.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.stop();

        let status = driver.status();
        assert_eq!(status.passes_completed, 0);
        assert!(status.ticks_skipped >= 2);
    }

    #[tokio::test]
    async fn status_reports_configuration() {
        let driver = ContinuousScheduler::new(fast_scheduler());
        let status = driver.status();
        assert!(!status.running);
        assert_eq!(status.window_days, 7);
        assert_eq!(status.interval_secs, 0); // 20ms rounds down
        assert_eq!(status.passes_completed, 0);
    }
}
