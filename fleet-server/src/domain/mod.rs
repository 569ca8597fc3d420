//! Domain types for the fleet scheduling engine.
//!
//! This module contains the core domain model types that represent
//! validated fleet data. All types enforce their invariants at construction
//! time, so code that receives these types can trust their validity.

mod bus;
mod crew;
mod depot;
mod ids;
mod route;
mod time;
mod trip;

pub use bus::{Bus, BusType};
pub use crew::{CrewMember, CrewRole};
pub use depot::Depot;
pub use ids::{BusId, CrewId, DepotId, DepotRef, RouteId, TripId};
pub use route::{DEFAULT_FARE, Route, TimetableEntry};
pub use time::{AssignmentWindow, DateRange, DayTime, TimeError, day_name};
pub use trip::{Trip, TripDraft, TripStatus};
