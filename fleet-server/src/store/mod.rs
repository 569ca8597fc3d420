//! Abstract persistence layer.
//!
//! The engine is written against [`TransitStore`] rather than a concrete
//! database, so the scheduling core can be exercised end-to-end against the
//! in-memory implementation in tests and development.
//!
//! The one non-negotiable contract is [`TransitStore::insert_trips`]: the
//! overlap check and the write must happen in a single atomic step per
//! store. Availability checks elsewhere in the engine are advisory
//! pre-filters; this call is the authority that keeps two concurrent
//! scheduling runs from double-booking a bus or crew member.

mod memory;

use std::future::Future;

use crate::domain::{
    Bus, BusId, CrewId, CrewMember, DateRange, Depot, DepotId, Route, RouteId, Trip, TripDraft,
};

pub use memory::{InMemoryStore, SeedData};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Seed data could not be read from disk.
    #[error("failed to read seed data: {0}")]
    Io(#[from] std::io::Error),

    /// Seed data could not be parsed.
    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

/// The resource a rejected draft contended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    Bus(BusId),
    Driver(CrewId),
    Conductor(CrewId),
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Bus(id) => write!(f, "bus {id} already assigned in window"),
            ConflictKind::Driver(id) => write!(f, "driver {id} already assigned in window"),
            ConflictKind::Conductor(id) => write!(f, "conductor {id} already assigned in window"),
        }
    }
}

/// A draft the store refused to insert, with the contended resource.
#[derive(Debug, Clone)]
pub struct RejectedDraft {
    pub draft: TripDraft,
    pub conflict: ConflictKind,
}

/// Outcome of a batched insert: per-draft accept/reject, never all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct InsertReport {
    pub created: Vec<Trip>,
    pub rejected: Vec<RejectedDraft>,
}

impl InsertReport {
    /// Number of drafts submitted in the call.
    pub fn attempted(&self) -> usize {
        self.created.len() + self.rejected.len()
    }
}

/// Read/write interface the scheduling engine runs against.
///
/// Read methods return only operationally active records; an empty result
/// is normal, not an error. `trips_in_range` returns the conflict-relevant
/// set: trips whose status still occupies resources.
pub trait TransitStore: Send + Sync {
    /// All active buses.
    fn buses(&self) -> impl Future<Output = Result<Vec<Bus>, StoreError>> + Send;

    /// All active routes.
    fn routes(&self) -> impl Future<Output = Result<Vec<Route>, StoreError>> + Send;

    /// The depot registry.
    fn depots(&self) -> impl Future<Output = Result<Vec<Depot>, StoreError>> + Send;

    /// All active crew members, drivers and conductors alike.
    fn crew(&self) -> impl Future<Output = Result<Vec<CrewMember>, StoreError>> + Send;

    /// Scheduled/running trips with a service date inside `range`.
    fn trips_in_range(
        &self,
        range: &DateRange,
    ) -> impl Future<Output = Result<Vec<Trip>, StoreError>> + Send;

    /// Atomically conflict-check and insert a batch of drafts.
    ///
    /// Each draft is checked against every persisted resource-occupying
    /// trip *and* against drafts accepted earlier in the same call; a draft
    /// whose assignment window overlaps an existing assignment of its bus,
    /// driver, or conductor is rejected while the remainder commit. The
    /// check and the write are a single critical section.
    fn insert_trips(
        &self,
        drafts: Vec<TripDraft>,
    ) -> impl Future<Output = Result<InsertReport, StoreError>> + Send;

    /// Delete trips in `Scheduled` status inside `range`, optionally scoped
    /// to one depot. Returns the number deleted. Trips in any other status
    /// are never touched.
    fn delete_scheduled(
        &self,
        range: &DateRange,
        depot: Option<&DepotId>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Stamp the advisory `current_route` annotation on a bus.
    fn set_current_route(
        &self,
        bus: &BusId,
        route: &RouteId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
