//! In-run conflict detection.
//!
//! The ledger holds every assignment window known to the current scheduling
//! run: windows of persisted trips it was seeded from, plus windows claimed
//! for drafts as they are generated. A claim covers the bus and both crew
//! members in one atomic step, so concurrent per-bus generation inside a
//! run can never hand the same driver two overlapping duties.
//!
//! The ledger is an in-run view only; the store re-checks atomically at
//! insert time, which is what protects against *other* runs.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{AssignmentWindow, BusId, CrewId, Trip};

/// Key for a schedulable resource. Drivers and conductors share the crew
/// id space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ResourceKey {
    Bus(BusId),
    Crew(CrewId),
}

/// A candidate (bus, driver, conductor, window) reservation.
#[derive(Debug)]
pub struct TripClaim<'a> {
    pub bus: &'a BusId,
    pub driver: Option<&'a CrewId>,
    pub conductor: Option<&'a CrewId>,
    pub window: AssignmentWindow,
}

/// Thread-safe registry of claimed assignment windows.
pub struct ReservationLedger {
    windows: Mutex<HashMap<ResourceKey, Vec<AssignmentWindow>>>,
    min_rest_minutes: Option<i64>,
}

impl ReservationLedger {
    /// Create an empty ledger.
    pub fn new(min_rest_minutes: Option<i64>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            min_rest_minutes,
        }
    }

    /// Create a ledger pre-loaded with the windows of persisted trips.
    pub fn seeded(trips: &[Trip], min_rest_minutes: Option<i64>) -> Self {
        let ledger = Self::new(min_rest_minutes);
        {
            let mut windows = ledger.windows.lock().expect("ledger lock poisoned");
            for trip in trips {
                let window = trip.window();
                windows
                    .entry(ResourceKey::Bus(trip.bus_id.clone()))
                    .or_default()
                    .push(window);
                if let Some(driver) = &trip.driver_id {
                    windows
                        .entry(ResourceKey::Crew(driver.clone()))
                        .or_default()
                        .push(window);
                }
                if let Some(conductor) = &trip.conductor_id {
                    windows
                        .entry(ResourceKey::Crew(conductor.clone()))
                        .or_default()
                        .push(window);
                }
            }
        }
        ledger
    }

    /// Whether the bus has no claimed window overlapping `window`.
    pub fn is_bus_free(&self, bus: &BusId, window: &AssignmentWindow) -> bool {
        let windows = self.windows.lock().expect("ledger lock poisoned");
        Self::fits(&windows, &ResourceKey::Bus(bus.clone()), window, None)
    }

    /// Whether the crew member is free for `window`, including the rest-gap
    /// policy when one is configured.
    pub fn is_crew_free(&self, crew: &CrewId, window: &AssignmentWindow) -> bool {
        let windows = self.windows.lock().expect("ledger lock poisoned");
        Self::fits(
            &windows,
            &ResourceKey::Crew(crew.clone()),
            window,
            self.min_rest_minutes,
        )
    }

    /// Atomically check all three resources and, if every one is free,
    /// record the window against each. Returns whether the claim succeeded.
    pub fn try_claim(&self, claim: &TripClaim<'_>) -> bool {
        let mut windows = self.windows.lock().expect("ledger lock poisoned");

        let bus_key = ResourceKey::Bus(claim.bus.clone());
        if !Self::fits(&windows, &bus_key, &claim.window, None) {
            return false;
        }
        for crew in [claim.driver, claim.conductor].into_iter().flatten() {
            let key = ResourceKey::Crew(crew.clone());
            if !Self::fits(&windows, &key, &claim.window, self.min_rest_minutes) {
                return false;
            }
        }

        windows.entry(bus_key).or_default().push(claim.window);
        for crew in [claim.driver, claim.conductor].into_iter().flatten() {
            windows
                .entry(ResourceKey::Crew(crew.clone()))
                .or_default()
                .push(claim.window);
        }
        true
    }

    fn fits(
        windows: &HashMap<ResourceKey, Vec<AssignmentWindow>>,
        key: &ResourceKey,
        candidate: &AssignmentWindow,
        min_rest: Option<i64>,
    ) -> bool {
        let Some(existing) = windows.get(key) else {
            return true;
        };
        existing.iter().all(|w| {
            if w.overlaps(candidate) {
                return false;
            }
            match min_rest {
                Some(rest) => w.rest_gap_minutes(candidate) >= rest,
                None => true,
            }
        })
    }
}
