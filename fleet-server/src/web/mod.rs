//! Web layer for the scheduling engine.
//!
//! A thin control surface over the engine: multi-day and single-bus runs,
//! previews, mass scheduling, clear, and continuous-driver control.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
