//! The auto-scheduling engine.
//!
//! One configurable pipeline feeds both entry points: the multi-day batch
//! orchestrator walks route timetables day by day, and the single-date
//! mass scheduler swaps in fixed time slots and crew cycling. Inventory
//! loading, compatibility matching, the reservation ledger, and batched
//! persistence are shared between them.

mod availability;
mod compat;
mod config;
mod generator;
mod inventory;
mod mass;
mod orchestrator;
mod slots;

pub use availability::{ReservationLedger, TripClaim};
pub use compat::{CapacityAndFeatures, CompatibilityPolicy};
pub use config::EngineConfig;
pub use generator::{BusDayContext, SkipReason, plan_bus_day, rank_routes};
pub use inventory::{DepotResolver, Inventory};
pub use mass::{MassOptions, MassOutcome};
pub use orchestrator::{
    BusRunOutcome, DepotSummary, EngineError, RunControl, RunOptions, RunState, RunSummary,
    Scheduler,
};
pub use slots::{SlotWindow, generate_slots};
