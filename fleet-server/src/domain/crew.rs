//! Crew read model.

use serde::{Deserialize, Serialize};

use super::ids::{CrewId, DepotRef};

/// Duty role of a crew member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewRole {
    Driver,
    Conductor,
}

/// A driver or conductor eligible for duty assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: CrewId,

    /// As-stored depot reference; resolved by the inventory loader.
    pub depot: DepotRef,

    pub name: String,

    pub role: CrewRole,

    pub active: bool,
}
