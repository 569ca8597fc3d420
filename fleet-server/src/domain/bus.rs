//! Bus read model.

use serde::{Deserialize, Serialize};

use super::ids::{BusId, DepotRef, RouteId};

/// Vehicle category, which determines fare class and AC capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    Ordinary,
    FastPassenger,
    SuperFast,
    SuperDeluxe,
    LowFloorAc,
    Garuda,
}

impl BusType {
    /// Whether this category is an air-conditioned variant.
    pub fn is_air_conditioned(&self) -> bool {
        matches!(self, BusType::LowFloorAc | BusType::Garuda)
    }
}

/// A bus in the fleet.
///
/// Read-only during a scheduling run except for the advisory
/// `current_route` annotation, which the orchestrator stamps as a
/// side effect after persisting trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,

    /// As-stored depot reference; resolved to a canonical depot id by the
    /// inventory loader.
    pub depot: DepotRef,

    /// Registration / fleet number (e.g. "KL-15-A-0042").
    pub registration: String,

    pub bus_type: BusType,

    /// Total seating capacity.
    pub capacity: u32,

    pub active: bool,

    /// Advisory annotation: the route this bus was most recently scheduled
    /// onto. Never consulted by the engine.
    #[serde(default)]
    pub current_route: Option<RouteId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ac_variants() {
        assert!(BusType::LowFloorAc.is_air_conditioned());
        assert!(BusType::Garuda.is_air_conditioned());
        assert!(!BusType::Ordinary.is_air_conditioned());
        assert!(!BusType::SuperFast.is_air_conditioned());
    }

    #[test]
    fn bus_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&BusType::LowFloorAc).unwrap(),
            "\"low_floor_ac\""
        );
        let parsed: BusType = serde_json::from_str("\"fast_passenger\"").unwrap();
        assert_eq!(parsed, BusType::FastPassenger);
    }
}
