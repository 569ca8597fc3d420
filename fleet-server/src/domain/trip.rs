//! Trip write model.
//!
//! Trips are created exclusively by the scheduling engine, in `Scheduled`
//! status. The engine never updates or deletes them; booking and operations
//! subsystems mutate them later, and deletion happens only through the
//! explicit clear-schedule operation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ids::{BusId, CrewId, DepotId, RouteId, TripId};
use super::time::{AssignmentWindow, DayTime};

/// Lifecycle status of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Scheduled,
    Running,
    Completed,
    Cancelled,
    Delayed,
}

impl TripStatus {
    /// Whether a trip in this status holds its bus and crew for conflict
    /// purposes. Completed and cancelled trips release their resources.
    pub fn occupies_resources(&self) -> bool {
        matches!(self, TripStatus::Scheduled | TripStatus::Running)
    }
}

/// A trip the engine wants to create. The store assigns the id and stamps
/// creation metadata on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDraft {
    pub route_id: RouteId,
    pub bus_id: BusId,
    pub driver_id: Option<CrewId>,
    pub conductor_id: Option<CrewId>,
    pub depot_id: DepotId,
    pub service_date: NaiveDate,
    pub start_time: DayTime,
    pub end_time: DayTime,
    pub fare: f64,
    pub capacity: u32,
}

impl TripDraft {
    /// The time interval this draft would occupy.
    pub fn window(&self) -> AssignmentWindow {
        AssignmentWindow::new(self.service_date, self.start_time, self.end_time)
    }
}

/// One scheduled service instance of a bus on a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub bus_id: BusId,
    pub driver_id: Option<CrewId>,
    pub conductor_id: Option<CrewId>,
    pub depot_id: DepotId,
    pub service_date: NaiveDate,
    pub start_time: DayTime,
    pub end_time: DayTime,
    pub fare: f64,
    pub capacity: u32,
    pub available_seats: u32,
    pub booked_seats: u32,
    pub status: TripStatus,
    pub created_at: NaiveDateTime,
}

impl Trip {
    /// Materialize a draft into a trip record.
    ///
    /// Seats start fully available; status starts at `Scheduled`.
    pub fn from_draft(id: TripId, draft: TripDraft, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            route_id: draft.route_id,
            bus_id: draft.bus_id,
            driver_id: draft.driver_id,
            conductor_id: draft.conductor_id,
            depot_id: draft.depot_id,
            service_date: draft.service_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            fare: draft.fare,
            capacity: draft.capacity,
            available_seats: draft.capacity,
            booked_seats: 0,
            status: TripStatus::Scheduled,
            created_at,
        }
    }

    /// The time interval this trip occupies.
    pub fn window(&self) -> AssignmentWindow {
        AssignmentWindow::new(self.service_date, self.start_time, self.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TripDraft {
        TripDraft {
            route_id: RouteId::new("R1"),
            bus_id: BusId::new("B1"),
            driver_id: Some(CrewId::new("D1")),
            conductor_id: Some(CrewId::new("C1")),
            depot_id: DepotId::new("DEP1"),
            service_date: NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            start_time: DayTime::parse_hhmm("08:00").unwrap(),
            end_time: DayTime::parse_hhmm("12:00").unwrap(),
            fare: 150.0,
            capacity: 45,
        }
    }

    #[test]
    fn from_draft_initializes_seats_and_status() {
        let created_at = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let trip = Trip::from_draft(TripId::new("T1"), draft(), created_at);

        assert_eq!(trip.status, TripStatus::Scheduled);
        assert_eq!(trip.capacity, 45);
        assert_eq!(trip.available_seats, 45);
        assert_eq!(trip.booked_seats, 0);
        assert_eq!(trip.available_seats, trip.capacity - trip.booked_seats);
    }

    #[test]
    fn occupying_statuses() {
        assert!(TripStatus::Scheduled.occupies_resources());
        assert!(TripStatus::Running.occupies_resources());
        assert!(!TripStatus::Completed.occupies_resources());
        assert!(!TripStatus::Cancelled.occupies_resources());
        assert!(!TripStatus::Delayed.occupies_resources());
    }

    #[test]
    fn draft_and_trip_share_window() {
        let d = draft();
        let trip = Trip::from_draft(
            TripId::new("T1"),
            d.clone(),
            NaiveDate::from_ymd_opt(2026, 8, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        assert_eq!(d.window(), trip.window());
    }
}
