//! Multi-day batch orchestration.
//!
//! Runs the daily generator for every (bus, date) pair in scope,
//! parallelized across buses within fixed-size batches. Per-bus failures
//! are isolated; only validation problems and a store that cannot be
//! reached at all abort the run. A cooperative stop flag is checked
//! between batches and between days, never mid-task.

use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tracing::{info, warn};

use crate::domain::{Bus, BusId, DateRange, DepotId, Route, Trip};
use crate::notify::{NotificationSink, ScheduleEvent, TracingSink};
use crate::store::{StoreError, TransitStore};

use super::availability::ReservationLedger;
use super::compat::{CapacityAndFeatures, CompatibilityPolicy};
use super::config::EngineConfig;
use super::generator::{BusDayContext, SkipReason, plan_bus_day};
use super::inventory::Inventory;

/// Errors that abort a scheduling call outright.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Bad input, rejected before any work begins.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The requested bus does not exist in the active fleet.
    #[error("bus {0} not found")]
    BusNotFound(BusId),

    /// A multi-day run is already in flight on this engine.
    #[error("a scheduling run is already in progress")]
    RunInProgress,

    /// The store itself failed; nothing to degrade to.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Observable lifecycle of the engine's multi-day run slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    StopRequested,
    Stopped,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::StopRequested => "stop_requested",
            RunState::Stopped => "stopped",
            RunState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Shared handle to the run state machine.
///
/// Transitions: Idle → Running → (StopRequested →) Stopped | Completed.
/// Terminal states behave like Idle for the next `begin`.
#[derive(Clone, Default)]
pub struct RunControl {
    state: Arc<Mutex<RunState>>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().expect("run state lock poisoned")
    }

    /// Request a cooperative stop. Returns whether a run was active.
    pub fn request_stop(&self) -> bool {
        let mut state = self.state.lock().expect("run state lock poisoned");
        if *state == RunState::Running {
            *state = RunState::StopRequested;
            true
        } else {
            false
        }
    }

    fn begin(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().expect("run state lock poisoned");
        match *state {
            RunState::Running | RunState::StopRequested => Err(EngineError::RunInProgress),
            _ => {
                *state = RunState::Running;
                Ok(())
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.state() == RunState::StopRequested
    }

    fn finish(&self, stopped_early: bool) {
        let mut state = self.state.lock().expect("run state lock poisoned");
        *state = if stopped_early {
            RunState::Stopped
        } else {
            RunState::Completed
        };
    }
}

/// Options for a scheduling run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Generate and count, but persist nothing.
    pub dry_run: bool,
}

/// Per-depot slice of a run summary.
#[derive(Debug, Clone)]
pub struct DepotSummary {
    pub depot_id: DepotId,
    pub depot_name: String,
    pub total_buses: usize,
    pub scheduled_buses: usize,
    pub failed_buses: usize,
    pub trips_created: usize,
}

/// Aggregate result of a multi-day run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_buses: usize,
    pub scheduled_buses: usize,
    pub failed_buses: usize,
    pub total_trips: usize,
    pub depots: Vec<DepotSummary>,
    pub warnings: Vec<String>,
    pub stopped_early: bool,
    pub dry_run: bool,
}

/// Result of scheduling a single bus.
#[derive(Debug, Clone)]
pub struct BusRunOutcome {
    pub bus_id: BusId,
    pub trips_created: usize,
    pub created: Vec<Trip>,
    pub skip: Option<SkipReason>,
}

impl BusRunOutcome {
    pub fn success(&self) -> bool {
        self.skip.is_none()
    }
}

/// The scheduling engine.
///
/// Holds the store, policies, and the run-state machine. Cheap to share:
/// wrap in an `Arc` and clone handles freely.
pub struct Scheduler<S> {
    store: Arc<S>,
    config: EngineConfig,
    compat: Arc<dyn CompatibilityPolicy>,
    sink: Arc<dyn NotificationSink>,
    control: RunControl,
}

impl<S: TransitStore> Scheduler<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            compat: Arc::new(CapacityAndFeatures::default()),
            sink: Arc::new(TracingSink),
            control: RunControl::new(),
        }
    }

    /// Replace the compatibility policy.
    pub fn with_compatibility(mut self, policy: Arc<dyn CompatibilityPolicy>) -> Self {
        self.compat = policy;
        self
    }

    /// Replace the notification sink.
    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub(crate) fn store(&self) -> &S {
        self.store.as_ref()
    }

    pub(crate) fn notify(&self, event: ScheduleEvent) {
        self.sink.notify(event);
    }

    /// Schedule every bus in scope for every day in `range`.
    ///
    /// Multi-day runs are exclusive per engine instance; a second call
    /// while one is active returns [`EngineError::RunInProgress`]. The
    /// store's atomic insert still guards against other writers.
    pub async fn schedule_all(
        &self,
        scope: Option<&DepotId>,
        range: &DateRange,
        options: RunOptions,
    ) -> Result<RunSummary, EngineError> {
        self.control.begin()?;
        let result = self.run(scope, range, options).await;
        match &result {
            Ok(summary) => self.control.finish(summary.stopped_early),
            Err(_) => self.control.finish(false),
        }
        result
    }

    /// Dry-run variant of [`Scheduler::schedule_all`]: same scope rules,
    /// counts only, no writes and no run-slot exclusivity.
    pub async fn preview(
        &self,
        scope: Option<&DepotId>,
        range: &DateRange,
    ) -> Result<RunSummary, EngineError> {
        self.run(scope, range, RunOptions { dry_run: true }).await
    }

    /// Schedule one bus across `range`. Concurrent with other entry
    /// points; conflicts resolve at the store.
    pub async fn schedule_bus(
        &self,
        bus_id: &BusId,
        range: &DateRange,
        options: RunOptions,
    ) -> Result<BusRunOutcome, EngineError> {
        let inventory = Inventory::load(self.store.as_ref(), range, &self.config).await?;

        let located = inventory.buses_by_depot.iter().find_map(|(depot_id, buses)| {
            buses
                .iter()
                .find(|b| &b.id == bus_id)
                .map(|b| (depot_id.clone(), b.clone()))
        });
        let Some((depot_id, bus)) = located else {
            return Err(EngineError::BusNotFound(bus_id.clone()));
        };

        let ledger = ReservationLedger::seeded(&inventory.existing_trips, self.config.min_rest_minutes);
        let outcome = self
            .schedule_one_bus(&bus, &depot_id, &inventory, range, &ledger, options)
            .await;
        Ok(outcome)
    }

    /// Delete scheduled trips in `range`, optionally scoped to a depot.
    pub async fn clear(
        &self,
        range: &DateRange,
        depot: Option<&DepotId>,
    ) -> Result<usize, EngineError> {
        let deleted = self.store.delete_scheduled(range, depot).await?;
        info!(deleted, "cleared scheduled trips");
        Ok(deleted)
    }

    async fn run(
        &self,
        scope: Option<&DepotId>,
        range: &DateRange,
        options: RunOptions,
    ) -> Result<RunSummary, EngineError> {
        let inventory = Inventory::load(self.store.as_ref(), range, &self.config).await?;
        let ledger = ReservationLedger::seeded(&inventory.existing_trips, self.config.min_rest_minutes);

        let mut summary = RunSummary {
            warnings: inventory.warnings.clone(),
            dry_run: options.dry_run,
            ..Default::default()
        };

        info!(
            depots = inventory.depots.len(),
            buses = inventory.total_buses(),
            from = %range.start(),
            to = %range.end(),
            dry_run = options.dry_run,
            "starting scheduling run"
        );

        'depots: for (depot_id, depot) in &inventory.depots {
            if let Some(scope) = scope
                && scope != depot_id
            {
                continue;
            }

            let buses = inventory.buses(depot_id);
            if buses.is_empty() {
                continue;
            }

            let mut depot_summary = DepotSummary {
                depot_id: depot_id.clone(),
                depot_name: depot.name.clone(),
                total_buses: buses.len(),
                scheduled_buses: 0,
                failed_buses: 0,
                trips_created: 0,
            };
            summary.total_buses += buses.len();

            for batch in buses.chunks(self.config.bus_batch_size) {
                if self.control.should_stop() {
                    summary.stopped_early = true;
                    finalize_depot(&mut summary, depot_summary);
                    break 'depots;
                }

                let tasks = batch.iter().map(|bus| {
                    self.schedule_one_bus(bus, depot_id, &inventory, range, &ledger, options)
                });
                for outcome in join_all(tasks).await {
                    if outcome.success() {
                        depot_summary.scheduled_buses += 1;
                        depot_summary.trips_created += outcome.trips_created;
                    } else {
                        depot_summary.failed_buses += 1;
                        if let Some(skip) = outcome.skip {
                            summary
                                .warnings
                                .push(format!("bus {}: {}", outcome.bus_id, skip));
                        }
                    }
                }
            }

            if !summary.stopped_early {
                finalize_depot(&mut summary, depot_summary);
            }
        }

        info!(
            scheduled = summary.scheduled_buses,
            failed = summary.failed_buses,
            trips = summary.total_trips,
            stopped_early = summary.stopped_early,
            "scheduling run finished"
        );

        Ok(summary)
    }

    /// Generate and persist trips for one bus. Infallible by design: every
    /// per-bus problem folds into the outcome instead of aborting a batch.
    async fn schedule_one_bus(
        &self,
        bus: &Bus,
        depot_id: &DepotId,
        inventory: &Inventory,
        range: &DateRange,
        ledger: &ReservationLedger,
        options: RunOptions,
    ) -> BusRunOutcome {
        let routes = inventory.routes(depot_id);
        let compatible: Vec<&Route> = routes
            .iter()
            .filter(|r| self.compat.is_compatible(bus, r))
            .collect();

        let ctx = BusDayContext {
            routes: &compatible,
            drivers: inventory.drivers(depot_id),
            conductors: inventory.conductors(depot_id),
            ledger,
            config: &self.config,
        };

        let mut drafts = Vec::new();
        for date in range.iter() {
            if self.control.should_stop() {
                break;
            }
            match plan_bus_day(bus, depot_id, date, &ctx) {
                Ok(day) => drafts.extend(day),
                Err(skip) => {
                    return BusRunOutcome {
                        bus_id: bus.id.clone(),
                        trips_created: 0,
                        created: Vec::new(),
                        skip: Some(skip),
                    };
                }
            }
        }

        if options.dry_run {
            return BusRunOutcome {
                bus_id: bus.id.clone(),
                trips_created: drafts.len(),
                created: Vec::new(),
                skip: None,
            };
        }

        let created = self.persist_drafts(drafts).await;

        // Post-commit side effects: advisory, never block the outcome.
        if let Some(first) = created.first() {
            if let Err(e) = self.store.set_current_route(&bus.id, &first.route_id).await {
                warn!(bus = %bus.id, error = %e, "failed to stamp current route annotation");
            }
            self.sink.notify(ScheduleEvent::BusScheduled {
                bus: bus.id.clone(),
                trips: created.len(),
                first_date: Some(first.service_date),
            });
        }

        BusRunOutcome {
            bus_id: bus.id.clone(),
            trips_created: created.len(),
            created,
            skip: None,
        }
    }

    /// Insert drafts in batches, tolerating per-batch failures and
    /// per-draft conflict rejections.
    pub(crate) async fn persist_drafts(&self, drafts: Vec<crate::domain::TripDraft>) -> Vec<Trip> {
        let mut created = Vec::new();
        for chunk in drafts.chunks(self.config.insert_batch_size) {
            match self.store.insert_trips(chunk.to_vec()).await {
                Ok(report) => {
                    for rejected in &report.rejected {
                        warn!(
                            bus = %rejected.draft.bus_id,
                            conflict = %rejected.conflict,
                            "trip draft rejected by store"
                        );
                    }
                    created.extend(report.created);
                }
                Err(e) => {
                    warn!(error = %e, batch = chunk.len(), "trip batch insert failed, continuing");
                }
            }
        }
        created
    }
}

fn finalize_depot(summary: &mut RunSummary, depot: DepotSummary) {
    summary.scheduled_buses += depot.scheduled_buses;
    summary.failed_buses += depot.failed_buses;
    summary.total_trips += depot.trips_created;
    summary.depots.push(depot);
}
