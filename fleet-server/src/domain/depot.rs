//! Depot read model.

use serde::{Deserialize, Serialize};

use super::ids::DepotId;

/// An operational base owning a subset of buses, routes, and crew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depot {
    pub id: DepotId,

    /// Display name (e.g. "Ernakulam Central").
    pub name: String,

    /// Short code (e.g. "EKM").
    pub code: String,
}
