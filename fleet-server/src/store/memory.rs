//! In-memory store.
//!
//! Holds the whole dataset behind one `RwLock`, which makes the atomic
//! insert contract trivial to honour: the conflict check and the write for
//! a batch happen under a single write guard. Seed data can be loaded from
//! a JSON file for development and tests.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::{
    Bus, BusId, CrewMember, DateRange, Depot, DepotId, Route, RouteId, Trip, TripDraft, TripId,
    TripStatus,
};

use super::{ConflictKind, InsertReport, RejectedDraft, StoreError, TransitStore};

/// Seed dataset, as read from a JSON fixtures file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub depots: Vec<Depot>,
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    #[serde(default)]
    pub trips: Vec<Trip>,
}

#[derive(Debug, Default)]
struct Inner {
    depots: Vec<Depot>,
    buses: Vec<Bus>,
    routes: Vec<Route>,
    crew: Vec<CrewMember>,
    trips: Vec<Trip>,
    next_trip_seq: u64,
}

impl Inner {
    /// First overlap conflict for `draft`, checked against every trip that
    /// still occupies its resources.
    fn find_conflict(&self, draft: &TripDraft) -> Option<ConflictKind> {
        let window = draft.window();
        for trip in self.trips.iter().filter(|t| t.status.occupies_resources()) {
            if !trip.window().overlaps(&window) {
                continue;
            }
            if trip.bus_id == draft.bus_id {
                return Some(ConflictKind::Bus(draft.bus_id.clone()));
            }
            if let (Some(a), Some(b)) = (&trip.driver_id, &draft.driver_id)
                && a == b
            {
                return Some(ConflictKind::Driver(b.clone()));
            }
            if let (Some(a), Some(b)) = (&trip.conductor_id, &draft.conductor_id)
                && a == b
            {
                return Some(ConflictKind::Conductor(b.clone()));
            }
        }
        None
    }

    fn mint_trip_id(&mut self) -> TripId {
        self.next_trip_seq += 1;
        TripId::new(format!("TRP-{:06}", self.next_trip_seq))
    }
}

/// In-memory [`TransitStore`] implementation.
#[derive(Clone, Default, Debug)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `seed`.
    pub fn with_seed(seed: SeedData) -> Self {
        let next_trip_seq = seed.trips.len() as u64;
        Self {
            inner: Arc::new(RwLock::new(Inner {
                depots: seed.depots,
                buses: seed.buses,
                routes: seed.routes,
                crew: seed.crew,
                trips: seed.trips,
                next_trip_seq,
            })),
        }
    }

    /// Load seed data from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&json)?;
        Ok(Self::with_seed(seed))
    }

    /// All trips, regardless of status. Test and inspection helper.
    pub async fn all_trips(&self) -> Vec<Trip> {
        self.inner.read().await.trips.clone()
    }

    /// Look up a bus by id, active or not.
    pub async fn bus(&self, id: &BusId) -> Option<Bus> {
        let inner = self.inner.read().await;
        inner.buses.iter().find(|b| &b.id == id).cloned()
    }
}

impl TransitStore for InMemoryStore {
    async fn buses(&self) -> Result<Vec<Bus>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.buses.iter().filter(|b| b.active).cloned().collect())
    }

    async fn routes(&self) -> Result<Vec<Route>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.routes.iter().filter(|r| r.active).cloned().collect())
    }

    async fn depots(&self) -> Result<Vec<Depot>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.depots.clone())
    }

    async fn crew(&self) -> Result<Vec<CrewMember>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.crew.iter().filter(|c| c.active).cloned().collect())
    }

    async fn trips_in_range(&self, range: &DateRange) -> Result<Vec<Trip>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .trips
            .iter()
            .filter(|t| t.status.occupies_resources() && range.contains(t.service_date))
            .cloned()
            .collect())
    }

    async fn insert_trips(&self, drafts: Vec<TripDraft>) -> Result<InsertReport, StoreError> {
        // One write guard for the whole batch: the conflict check below and
        // the insert are a single critical section.
        let mut inner = self.inner.write().await;
        let mut report = InsertReport::default();
        let now = Utc::now().naive_utc();

        for draft in drafts {
            match inner.find_conflict(&draft) {
                Some(conflict) => report.rejected.push(RejectedDraft { draft, conflict }),
                None => {
                    let id = inner.mint_trip_id();
                    let trip = Trip::from_draft(id, draft, now);
                    // Pushing before the next iteration makes accepted
                    // drafts visible to the checks for the rest of the batch.
                    inner.trips.push(trip.clone());
                    report.created.push(trip);
                }
            }
        }

        Ok(report)
    }

    async fn delete_scheduled(
        &self,
        range: &DateRange,
        depot: Option<&DepotId>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.trips.len();
        inner.trips.retain(|t| {
            let matches = t.status == TripStatus::Scheduled
                && range.contains(t.service_date)
                && depot.is_none_or(|d| &t.depot_id == d);
            !matches
        });
        Ok(before - inner.trips.len())
    }

    async fn set_current_route(&self, bus: &BusId, route: &RouteId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let found = inner.buses.iter_mut().find(|b| &b.id == bus);
        match found {
            Some(b) => {
                b.current_route = Some(route.clone());
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "bus",
                id: bus.to_string(),
            }),
        }
    }
}
