//! Route and timetable read models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{DepotRef, RouteId};
use super::time::{DayTime, day_name};

/// Fare applied when a route has none configured.
pub const DEFAULT_FARE: f64 = 100.0;

/// A recurring or date-bound timetable entry belonging to a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub departure: DayTime,

    pub arrival: DayTime,

    pub active: bool,

    /// Entry is not valid before this date.
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,

    /// Entry is not valid after this date.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,

    /// Lowercase day names ("monday" .. "sunday"); `None` means every day.
    #[serde(default)]
    pub days_of_week: Option<Vec<String>>,

    /// Explicit service dates; `None` means no date restriction.
    #[serde(default)]
    pub service_dates: Option<Vec<NaiveDate>>,
}

impl TimetableEntry {
    /// Whether this entry runs on `date`, honouring the validity window and
    /// any day-of-week or explicit-date restriction.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        if let Some(from) = self.valid_from
            && date < from
        {
            return false;
        }
        if let Some(to) = self.valid_to
            && date > to
        {
            return false;
        }
        if let Some(days) = &self.days_of_week
            && !days.iter().any(|d| d == day_name(date))
        {
            return false;
        }
        if let Some(dates) = &self.service_dates
            && !dates.contains(&date)
        {
            return false;
        }
        true
    }
}

/// A route with its embedded timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,

    /// As-stored depot reference; resolved by the inventory loader.
    pub depot: DepotRef,

    pub name: String,

    /// Route number shown to passengers (e.g. "EKM-104").
    pub number: String,

    #[serde(default)]
    pub base_fare: Option<f64>,

    pub distance_km: f64,

    /// End-to-end running time, used by the slot scheduler to derive end
    /// times.
    pub estimated_duration_mins: u32,

    /// Route requires an air-conditioned bus.
    #[serde(default)]
    pub air_conditioned: bool,

    pub active: bool,

    #[serde(default)]
    pub timetable: Vec<TimetableEntry>,
}

impl Route {
    /// Fare charged on this route.
    pub fn fare(&self) -> f64 {
        self.base_fare.unwrap_or(DEFAULT_FARE)
    }

    /// Number of active timetable entries, the tiebreaker in route ranking.
    pub fn active_timetable_count(&self) -> usize {
        self.timetable.iter().filter(|e| e.active).count()
    }
}
