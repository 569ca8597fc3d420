//! Inventory loading.
//!
//! Pulls the active fleet, routes, and crew from the store and resolves
//! every record to a canonical depot before any scheduling logic sees it.
//! Legacy records reference depots inconsistently (sometimes by id,
//! sometimes by display name), so resolution tries the id first and falls
//! back to a normalized name match; everything downstream joins on
//! `DepotId` only.
//!
//! Crew pools are pre-filtered with a coarse duty-hours heuristic. This is
//! deliberately not the authoritative conflict check; the reservation
//! ledger and the store's atomic insert own that.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::domain::{
    Bus, CrewId, CrewMember, CrewRole, DateRange, Depot, DepotId, DepotRef, Route, Trip,
};
use crate::store::{StoreError, TransitStore};

use super::config::EngineConfig;

/// Resolves as-stored depot references to canonical depot ids.
pub struct DepotResolver {
    by_id: HashMap<String, DepotId>,
    by_name: HashMap<String, DepotId>,
}

impl DepotResolver {
    pub fn new(depots: &[Depot]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for depot in depots {
            by_id.insert(depot.id.as_str().to_string(), depot.id.clone());
            by_name.insert(normalize_name(&depot.name), depot.id.clone());
            by_name.insert(normalize_name(&depot.code), depot.id.clone());
        }
        Self { by_id, by_name }
    }

    /// Canonical id for a reference, trying the id space before the
    /// display-name space.
    pub fn resolve(&self, reference: &DepotRef) -> Option<DepotId> {
        if let Some(id) = self.by_id.get(reference.as_str()) {
            return Some(id.clone());
        }
        self.by_name.get(&normalize_name(reference.as_str())).cloned()
    }
}

/// Case- and whitespace-insensitive form of a depot display name.
fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Everything a scheduling run needs, loaded once and grouped by canonical
/// depot.
pub struct Inventory {
    pub depots: BTreeMap<DepotId, Depot>,
    pub buses_by_depot: BTreeMap<DepotId, Vec<Bus>>,
    pub routes_by_depot: BTreeMap<DepotId, Vec<Route>>,
    pub drivers_by_depot: BTreeMap<DepotId, Vec<CrewMember>>,
    pub conductors_by_depot: BTreeMap<DepotId, Vec<CrewMember>>,

    /// Scheduled/running trips inside the requested range; seeds the
    /// reservation ledger and feeds the crew pre-filter.
    pub existing_trips: Vec<Trip>,

    /// Records dropped during resolution, reported rather than fatal.
    pub warnings: Vec<String>,
}

impl Inventory {
    /// Load and group everything for a run over `range`.
    ///
    /// Empty collections are normal; the caller degrades to a zero-result
    /// summary rather than failing.
    pub async fn load<S: TransitStore>(
        store: &S,
        range: &DateRange,
        config: &EngineConfig,
    ) -> Result<Self, StoreError> {
        let depots = store.depots().await?;
        let buses = store.buses().await?;
        let routes = store.routes().await?;
        let crew = store.crew().await?;
        let existing_trips = store.trips_in_range(range).await?;

        let resolver = DepotResolver::new(&depots);
        let mut warnings = Vec::new();

        let mut buses_by_depot: BTreeMap<DepotId, Vec<Bus>> = BTreeMap::new();
        for bus in buses {
            match resolver.resolve(&bus.depot) {
                Some(depot_id) => buses_by_depot.entry(depot_id).or_default().push(bus),
                None => warnings.push(format!(
                    "bus {} references unknown depot '{}'; skipped",
                    bus.id, bus.depot
                )),
            }
        }

        let mut routes_by_depot: BTreeMap<DepotId, Vec<Route>> = BTreeMap::new();
        for mut route in routes {
            // Only active timetable entries take part in scheduling.
            route.timetable.retain(|e| e.active);
            match resolver.resolve(&route.depot) {
                Some(depot_id) => routes_by_depot.entry(depot_id).or_default().push(route),
                None => warnings.push(format!(
                    "route {} references unknown depot '{}'; skipped",
                    route.id, route.depot
                )),
            }
        }

        let assigned_minutes = assigned_minutes_by_crew(&existing_trips);
        let duty_cap_minutes = config.daily_duty_cap_hours * 60 * range.days();

        let mut drivers_by_depot: BTreeMap<DepotId, Vec<CrewMember>> = BTreeMap::new();
        let mut conductors_by_depot: BTreeMap<DepotId, Vec<CrewMember>> = BTreeMap::new();
        for member in crew {
            let minutes = assigned_minutes.get(&member.id).copied().unwrap_or(0);
            if minutes >= duty_cap_minutes {
                debug!(
                    crew = %member.id,
                    minutes,
                    cap = duty_cap_minutes,
                    "crew member excluded by duty-hours pre-filter"
                );
                continue;
            }
            match resolver.resolve(&member.depot) {
                Some(depot_id) => {
                    let pools = match member.role {
                        CrewRole::Driver => &mut drivers_by_depot,
                        CrewRole::Conductor => &mut conductors_by_depot,
                    };
                    pools.entry(depot_id).or_default().push(member);
                }
                None => warnings.push(format!(
                    "crew member {} references unknown depot '{}'; skipped",
                    member.id, member.depot
                )),
            }
        }

        Ok(Self {
            depots: depots.into_iter().map(|d| (d.id.clone(), d)).collect(),
            buses_by_depot,
            routes_by_depot,
            drivers_by_depot,
            conductors_by_depot,
            existing_trips,
            warnings,
        })
    }

    pub fn buses(&self, depot: &DepotId) -> &[Bus] {
        self.buses_by_depot.get(depot).map_or(&[], Vec::as_slice)
    }

    pub fn routes(&self, depot: &DepotId) -> &[Route] {
        self.routes_by_depot.get(depot).map_or(&[], Vec::as_slice)
    }

    pub fn drivers(&self, depot: &DepotId) -> &[CrewMember] {
        self.drivers_by_depot.get(depot).map_or(&[], Vec::as_slice)
    }

    pub fn conductors(&self, depot: &DepotId) -> &[CrewMember] {
        self.conductors_by_depot.get(depot).map_or(&[], Vec::as_slice)
    }

    pub fn total_buses(&self) -> usize {
        self.buses_by_depot.values().map(Vec::len).sum()
    }
}

/// Total assigned duty minutes per crew member across the loaded trips.
fn assigned_minutes_by_crew(trips: &[Trip]) -> HashMap<CrewId, i64> {
    let mut minutes: HashMap<CrewId, i64> = HashMap::new();
    for trip in trips {
        let duration = trip.window().duration_minutes();
        if let Some(driver) = &trip.driver_id {
            *minutes.entry(driver.clone()).or_default() += duration;
        }
        if let Some(conductor) = &trip.conductor_id {
            *minutes.entry(conductor.clone()).or_default() += duration;
        }
    }
    minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, BusType, DayTime, RouteId, TimetableEntry, TripDraft};
    use crate::store::{InMemoryStore, SeedData};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn depot(id: &str, name: &str, code: &str) -> Depot {
        Depot {
            id: DepotId::new(id),
            name: name.into(),
            code: code.into(),
        }
    }

    fn bus(id: &str, depot: &str) -> Bus {
        Bus {
            id: BusId::new(id),
            depot: DepotRef::new(depot),
            registration: id.into(),
            bus_type: BusType::Ordinary,
            capacity: 45,
            active: true,
            current_route: None,
        }
    }

    fn crew(id: &str, depot: &str, role: CrewRole) -> CrewMember {
        CrewMember {
            id: CrewId::new(id),
            depot: DepotRef::new(depot),
            name: id.into(),
            role,
            active: true,
        }
    }

    fn route(id: &str, depot: &str) -> Route {
        Route {
            id: RouteId::new(id),
            depot: DepotRef::new(depot),
            name: "City".into(),
            number: id.into(),
            base_fare: Some(80.0),
            distance_km: 40.0,
            estimated_duration_mins: 90,
            air_conditioned: false,
            active: true,
            timetable: vec![
                TimetableEntry {
                    departure: DayTime::parse_hhmm("08:00").unwrap(),
                    arrival: DayTime::parse_hhmm("10:00").unwrap(),
                    active: true,
                    valid_from: None,
                    valid_to: None,
                    days_of_week: None,
                    service_dates: None,
                },
                TimetableEntry {
                    departure: DayTime::parse_hhmm("14:00").unwrap(),
                    arrival: DayTime::parse_hhmm("16:00").unwrap(),
                    active: false,
                    valid_from: None,
                    valid_to: None,
                    days_of_week: None,
                    service_dates: None,
                },
            ],
        }
    }

    #[test]
    fn resolver_matches_id_then_name() {
        let depots = vec![depot("DEP1", "Ernakulam Central", "EKM")];
        let resolver = DepotResolver::new(&depots);

        assert_eq!(
            resolver.resolve(&DepotRef::new("DEP1")),
            Some(DepotId::new("DEP1"))
        );
        // Display name, any casing and spacing.
        assert_eq!(
            resolver.resolve(&DepotRef::new("ernakulam  central")),
            Some(DepotId::new("DEP1"))
        );
        // Depot code works too.
        assert_eq!(
            resolver.resolve(&DepotRef::new("ekm")),
            Some(DepotId::new("DEP1"))
        );
        assert_eq!(resolver.resolve(&DepotRef::new("nowhere")), None);
    }

    #[tokio::test]
    async fn groups_mixed_references_into_one_depot() {
        let seed = SeedData {
            depots: vec![depot("DEP1", "Ernakulam Central", "EKM")],
            buses: vec![bus("B1", "DEP1"), bus("B2", "Ernakulam Central")],
            routes: vec![route("R1", "EKM")],
            crew: vec![
                crew("D1", "ernakulam central", CrewRole::Driver),
                crew("C1", "DEP1", CrewRole::Conductor),
            ],
            ..Default::default()
        };
        let store = InMemoryStore::with_seed(seed);
        let range = DateRange::single(date(4));
        let inv = Inventory::load(&store, &range, &EngineConfig::default())
            .await
            .unwrap();

        let id = DepotId::new("DEP1");
        assert_eq!(inv.buses(&id).len(), 2);
        assert_eq!(inv.routes(&id).len(), 1);
        assert_eq!(inv.drivers(&id).len(), 1);
        assert_eq!(inv.conductors(&id).len(), 1);
        assert!(inv.warnings.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_records_become_warnings() {
        let seed = SeedData {
            depots: vec![depot("DEP1", "Central", "CTL")],
            buses: vec![bus("B1", "ghost depot")],
            ..Default::default()
        };
        let store = InMemoryStore::with_seed(seed);
        let range = DateRange::single(date(4));
        let inv = Inventory::load(&store, &range, &EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(inv.total_buses(), 0);
        assert_eq!(inv.warnings.len(), 1);
        assert!(inv.warnings[0].contains("ghost depot"));
    }

    #[tokio::test]
    async fn inactive_timetable_entries_are_dropped() {
        let seed = SeedData {
            depots: vec![depot("DEP1", "Central", "CTL")],
            routes: vec![route("R1", "DEP1")],
            ..Default::default()
        };
        let store = InMemoryStore::with_seed(seed);
        let range = DateRange::single(date(4));
        let inv = Inventory::load(&store, &range, &EngineConfig::default())
            .await
            .unwrap();

        let routes = inv.routes(&DepotId::new("DEP1"));
        assert_eq!(routes[0].timetable.len(), 1);
    }

    #[tokio::test]
    async fn crew_over_duty_cap_is_pre_filtered() {
        let store = InMemoryStore::with_seed(SeedData {
            depots: vec![depot("DEP1", "Central", "CTL")],
            crew: vec![
                crew("D1", "DEP1", CrewRole::Driver),
                crew("D2", "DEP1", CrewRole::Driver),
            ],
            ..Default::default()
        });

        // D1 already carries a 13-hour duty on the single requested day,
        // which exceeds the default 12-hour cap.
        let draft = TripDraft {
            route_id: RouteId::new("R1"),
            bus_id: BusId::new("B1"),
            driver_id: Some(CrewId::new("D1")),
            conductor_id: None,
            depot_id: DepotId::new("DEP1"),
            service_date: date(4),
            start_time: DayTime::parse_hhmm("06:00").unwrap(),
            end_time: DayTime::parse_hhmm("19:00").unwrap(),
            fare: 100.0,
            capacity: 45,
        };
        store.insert_trips(vec![draft]).await.unwrap();

        let range = DateRange::single(date(4));
        let inv = Inventory::load(&store, &range, &EngineConfig::default())
            .await
            .unwrap();

        let drivers = inv.drivers(&DepotId::new("DEP1"));
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].id, CrewId::new("D2"));
    }

    #[tokio::test]
    async fn empty_store_is_not_an_error() {
        let store = InMemoryStore::new();
        let range = DateRange::single(date(4));
        let inv = Inventory::load(&store, &range, &EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(inv.total_buses(), 0);
        assert!(inv.depots.is_empty());
        assert!(inv.existing_trips.is_empty());
    }
}
