//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::continuous::ContinuousStatus;
use crate::domain::{Trip, TripStatus};
use crate::engine::{BusRunOutcome, DepotSummary, MassOutcome, RunSummary};

/// Request for a multi-day scheduling run.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    /// Restrict the run to one depot
    pub depot_id: Option<String>,

    /// First service date (inclusive)
    pub start_date: NaiveDate,

    /// Last service date (inclusive)
    pub end_date: NaiveDate,

    /// Generate and count, but persist nothing
    #[serde(default)]
    pub dry_run: bool,
}

/// Request for a single-bus run.
#[derive(Debug, Deserialize)]
pub struct BusRunRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub depot_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Request for a mass-scheduling run.
#[derive(Debug, Deserialize)]
pub struct MassRequest {
    pub date: NaiveDate,

    /// Depot ids to include; omitted means all
    pub depot_ids: Option<Vec<String>>,

    pub max_trips_per_route: Option<usize>,

    pub max_trips_per_bus: Option<usize>,

    pub time_gap_minutes: Option<u32>,

    pub auto_assign_crew: Option<bool>,

    pub auto_assign_buses: Option<bool>,
}

/// Request to clear scheduled trips.
#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub depot_id: Option<String>,
}

/// Per-depot slice of a run summary.
#[derive(Debug, Serialize)]
pub struct DepotSummaryResult {
    pub depot_id: String,
    pub depot_name: String,
    pub total_buses: usize,
    pub scheduled_buses: usize,
    pub failed_buses: usize,
    pub trips_created: usize,
}

impl From<DepotSummary> for DepotSummaryResult {
    fn from(s: DepotSummary) -> Self {
        Self {
            depot_id: s.depot_id.to_string(),
            depot_name: s.depot_name,
            total_buses: s.total_buses,
            scheduled_buses: s.scheduled_buses,
            failed_buses: s.failed_buses,
            trips_created: s.trips_created,
        }
    }
}

/// Response for multi-day runs and previews.
#[derive(Debug, Serialize)]
pub struct RunSummaryResponse {
    pub total_buses: usize,
    pub scheduled_buses: usize,
    pub failed_buses: usize,
    pub total_trips: usize,
    pub stopped_early: bool,
    pub dry_run: bool,
    pub depots: Vec<DepotSummaryResult>,
    pub warnings: Vec<String>,
}

impl From<RunSummary> for RunSummaryResponse {
    fn from(s: RunSummary) -> Self {
        Self {
            total_buses: s.total_buses,
            scheduled_buses: s.scheduled_buses,
            failed_buses: s.failed_buses,
            total_trips: s.total_trips,
            stopped_early: s.stopped_early,
            dry_run: s.dry_run,
            depots: s.depots.into_iter().map(Into::into).collect(),
            warnings: s.warnings,
        }
    }
}

/// A created trip in responses.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub id: String,
    pub route_id: String,
    pub bus_id: String,
    pub driver_id: Option<String>,
    pub conductor_id: Option<String>,
    pub depot_id: String,
    pub service_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub fare: f64,
    pub capacity: u32,
    pub available_seats: u32,
    pub booked_seats: u32,
    pub status: &'static str,
}

fn status_str(status: TripStatus) -> &'static str {
    match status {
        TripStatus::Scheduled => "scheduled",
        TripStatus::Running => "running",
        TripStatus::Completed => "completed",
        TripStatus::Cancelled => "cancelled",
        TripStatus::Delayed => "delayed",
    }
}

impl From<&Trip> for TripResult {
    fn from(t: &Trip) -> Self {
        Self {
            id: t.id.to_string(),
            route_id: t.route_id.to_string(),
            bus_id: t.bus_id.to_string(),
            driver_id: t.driver_id.as_ref().map(ToString::to_string),
            conductor_id: t.conductor_id.as_ref().map(ToString::to_string),
            depot_id: t.depot_id.to_string(),
            service_date: t.service_date,
            start_time: t.start_time.to_string(),
            end_time: t.end_time.to_string(),
            fare: t.fare,
            capacity: t.capacity,
            available_seats: t.available_seats,
            booked_seats: t.booked_seats,
            status: status_str(t.status),
        }
    }
}

/// Response for single-bus runs.
#[derive(Debug, Serialize)]
pub struct BusRunResponse {
    pub success: bool,
    pub trips_created: usize,
    pub created_trips: Vec<TripResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<BusRunOutcome> for BusRunResponse {
    fn from(o: BusRunOutcome) -> Self {
        Self {
            success: o.success(),
            trips_created: o.trips_created,
            created_trips: o.created.iter().map(Into::into).collect(),
            reason: o.skip.map(|s| s.to_string()),
        }
    }
}

/// Response for mass-scheduling runs.
#[derive(Debug, Serialize)]
pub struct MassResponse {
    pub trips_created: usize,
    pub buses_assigned: usize,
    pub drivers_assigned: usize,
    pub conductors_assigned: usize,
    /// Fraction of generated drafts that committed, 0.0-1.0
    pub success_rate: f64,
    pub routes_processed: usize,
    pub buses_utilized: usize,
    pub average_trips_per_bus: f64,
    pub warnings: Vec<String>,
}

impl From<MassOutcome> for MassResponse {
    fn from(o: MassOutcome) -> Self {
        Self {
            trips_created: o.trips_created,
            buses_assigned: o.buses_assigned,
            drivers_assigned: o.drivers_assigned,
            conductors_assigned: o.conductors_assigned,
            success_rate: o.success_rate,
            routes_processed: o.routes_processed,
            buses_utilized: o.buses_utilized,
            average_trips_per_bus: o.average_trips_per_bus,
            warnings: o.warnings,
        }
    }
}

/// Response for clear-schedule requests.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

/// Engine run-state snapshot.
#[derive(Debug, Serialize)]
pub struct RunStateResponse {
    pub state: String,
}

/// Response to a stop request.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// Whether a run was active and has been asked to stop
    pub stopping: bool,
}

/// Continuous-driver status.
#[derive(Debug, Serialize)]
pub struct ContinuousStatusResponse {
    pub running: bool,
    pub interval_secs: u64,
    pub window_days: u32,
    pub passes_completed: u64,
    pub ticks_skipped: u64,
}

impl From<ContinuousStatus> for ContinuousStatusResponse {
    fn from(s: ContinuousStatus) -> Self {
        Self {
            running: s.running,
            interval_secs: s.interval_secs,
            window_days: s.window_days,
            passes_completed: s.passes_completed,
            ticks_skipped: s.ticks_skipped,
        }
    }
}

/// Error payload for all failure responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, DayTime, DepotId, RouteId, TripId};

    #[test]
    fn trip_result_stringifies_ids_and_times() {
        let trip = Trip {
            id: TripId::new("TRP-000001"),
            route_id: RouteId::new("R1"),
            bus_id: BusId::new("B1"),
            driver_id: None,
            conductor_id: None,
            depot_id: DepotId::new("DEP1"),
            service_date: NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            start_time: DayTime::parse_hhmm("06:30").unwrap(),
            end_time: DayTime::parse_hhmm("08:00").unwrap(),
            fare: 90.0,
            capacity: 45,
            available_seats: 45,
            booked_seats: 0,
            status: TripStatus::Scheduled,
            created_at: NaiveDate::from_ymd_opt(2026, 8, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        };

        let result = TripResult::from(&trip);
        assert_eq!(result.id, "TRP-000001");
        assert_eq!(result.start_time, "06:30");
        assert_eq!(result.status, "scheduled");
        assert_eq!(result.driver_id, None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["service_date"], "2026-08-04");
        assert_eq!(json["end_time"], "08:00");
    }

    #[test]
    fn run_request_defaults_dry_run_off() {
        let req: RunRequest =
            serde_json::from_str(r#"{"start_date": "2026-08-04", "end_date": "2026-08-05"}"#)
                .unwrap();
        assert!(!req.dry_run);
        assert_eq!(req.depot_id, None);
    }
}
