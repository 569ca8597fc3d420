//! Bus fleet auto-scheduling server.
//!
//! Generates conflict-free (bus, route, driver, conductor, time-slot)
//! assignments across a date range at fleet scale, with a single-date mass
//! scheduler and a periodic driver that keeps the schedule rolling.

pub mod continuous;
pub mod domain;
pub mod engine;
pub mod notify;
pub mod store;
pub mod web;
