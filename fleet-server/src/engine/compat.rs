//! Route–bus compatibility matching.

use crate::domain::{Bus, Route};

/// Decides whether a bus may legally serve a route.
///
/// Pure and side-effect free. The engine takes this as a trait object so
/// deployments can swap the policy without touching the rest of the core.
pub trait CompatibilityPolicy: Send + Sync {
    fn is_compatible(&self, bus: &Bus, route: &Route) -> bool;
}

/// Default policy: seating capacity plus feature requirements.
///
/// A bus qualifies when its capacity meets the route's minimum (a flat
/// default of 30 seats) and, if the route requires air conditioning, the
/// bus type is an AC variant.
#[derive(Debug, Clone)]
pub struct CapacityAndFeatures {
    pub min_capacity: u32,
}

impl CapacityAndFeatures {
    /// Minimum capacity a route demands. Currently a flat policy value;
    /// kept as a method so a per-route derivation can slot in here.
    fn required_capacity(&self, _route: &Route) -> u32 {
        self.min_capacity
    }
}

impl Default for CapacityAndFeatures {
    fn default() -> Self {
        Self { min_capacity: 30 }
    }
}

impl CompatibilityPolicy for CapacityAndFeatures {
    fn is_compatible(&self, bus: &Bus, route: &Route) -> bool {
        if bus.capacity < self.required_capacity(route) {
            return false;
        }
        if route.air_conditioned && !bus.bus_type.is_air_conditioned() {
            return false;
        }
        true
    }
}
