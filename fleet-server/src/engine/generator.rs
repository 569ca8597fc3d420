//! Per-bus, per-day trip generation.
//!
//! For one bus and one calendar date: rank the compatible routes, walk them
//! in priority order, pair each chosen route with a free driver and
//! conductor through the reservation ledger, and emit trip drafts until the
//! daily cap is hit or the routes run out. One bus serves a given route at
//! most once per day.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use tracing::trace;

use crate::domain::{AssignmentWindow, Bus, CrewId, CrewMember, DepotId, Route, TripDraft};

use super::availability::{ReservationLedger, TripClaim};
use super::config::EngineConfig;

/// Why a bus produced zero trips. Reported, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No route in the bus's depot passed the compatibility check.
    NoCompatibleRoute,
    /// The depot's driver pool is empty.
    NoDriverAvailable,
    /// The depot's conductor pool is empty.
    NoConductorAvailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoCompatibleRoute => f.write_str("no compatible route"),
            SkipReason::NoDriverAvailable => f.write_str("no driver available"),
            SkipReason::NoConductorAvailable => f.write_str("no conductor available"),
        }
    }
}

/// Inputs shared by every day of one bus's generation.
pub struct BusDayContext<'a> {
    /// Depot routes already found compatible with the bus.
    pub routes: &'a [&'a Route],
    pub drivers: &'a [CrewMember],
    pub conductors: &'a [CrewMember],
    pub ledger: &'a ReservationLedger,
    pub config: &'a EngineConfig,
}

/// Order routes for assignment: configured high-priority names first, ties
/// broken by descending count of active timetable entries.
pub fn rank_routes<'r>(routes: &[&'r Route], high_priority_names: &[String]) -> Vec<&'r Route> {
    let is_high = |route: &Route| {
        let name = route.name.to_lowercase();
        high_priority_names
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
    };

    let mut ranked = routes.to_vec();
    ranked.sort_by(|a, b| {
        is_high(b)
            .cmp(&is_high(a))
            .then_with(|| b.active_timetable_count().cmp(&a.active_timetable_count()))
    });
    ranked
}

/// Generate trip drafts for one bus on one date.
///
/// Returns `Err` only for structurally empty inputs (no compatible routes,
/// no crew in the depot); an `Ok` with zero drafts means nothing was
/// runnable that day, which is not a failure.
pub fn plan_bus_day(
    bus: &Bus,
    depot_id: &DepotId,
    date: NaiveDate,
    ctx: &BusDayContext<'_>,
) -> Result<Vec<TripDraft>, SkipReason> {
    if ctx.routes.is_empty() {
        return Err(SkipReason::NoCompatibleRoute);
    }
    if ctx.drivers.is_empty() {
        return Err(SkipReason::NoDriverAvailable);
    }
    if ctx.conductors.is_empty() {
        return Err(SkipReason::NoConductorAvailable);
    }

    let ranked = rank_routes(ctx.routes, &ctx.config.high_priority_names);

    let mut drafts = Vec::new();
    let mut used_drivers: HashSet<&CrewId> = HashSet::new();
    let mut used_conductors: HashSet<&CrewId> = HashSet::new();

    // Each route appears once in `ranked`, which is what limits a bus to
    // one trip per route per day.
    for route in ranked {
        if drafts.len() >= ctx.config.max_daily_trips_per_bus {
            break;
        }

        let Some(entry) = route.timetable.iter().find(|e| e.runs_on(date)) else {
            continue;
        };

        let window = AssignmentWindow::new(date, entry.departure, entry.arrival);
        if !ctx.ledger.is_bus_free(&bus.id, &window) {
            trace!(bus = %bus.id, route = %route.id, %date, "bus busy in window, skipping route");
            continue;
        }

        let driver = ctx
            .drivers
            .iter()
            .find(|d| !used_drivers.contains(&d.id) && ctx.ledger.is_crew_free(&d.id, &window));
        let conductor = ctx
            .conductors
            .iter()
            .find(|c| !used_conductors.contains(&c.id) && ctx.ledger.is_crew_free(&c.id, &window));

        let (Some(driver), Some(conductor)) = (driver, conductor) else {
            continue;
        };

        let claim = TripClaim {
            bus: &bus.id,
            driver: Some(&driver.id),
            conductor: Some(&conductor.id),
            window,
        };
        // A concurrent bus task may have claimed the crew between the
        // candidate search above and here; the claim re-checks atomically.
        if !ctx.ledger.try_claim(&claim) {
            continue;
        }

        used_drivers.insert(&driver.id);
        used_conductors.insert(&conductor.id);
        drafts.push(TripDraft {
            route_id: route.id.clone(),
            bus_id: bus.id.clone(),
            driver_id: Some(driver.id.clone()),
            conductor_id: Some(conductor.id.clone()),
            depot_id: depot_id.clone(),
            service_date: date,
            start_time: entry.departure,
            end_time: entry.arrival,
            fare: route.fare(),
            capacity: bus.capacity,
        });
    }

    Ok(drafts)
}
