//! Scheduling engine configuration.

use std::time::Duration;

/// Configuration parameters for the scheduling engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum trips one bus may be given on one calendar day.
    pub max_daily_trips_per_bus: usize,

    /// Buses are processed in batches of this size to bound concurrent
    /// store traffic.
    pub bus_batch_size: usize,

    /// Trip drafts are persisted in batches of this size.
    pub insert_batch_size: usize,

    /// Daily duty-hours ceiling used by the coarse crew pre-filter.
    pub daily_duty_cap_hours: i64,

    /// Name fragments that mark a route as high priority in ranking
    /// (matched case-insensitively against the route name).
    pub high_priority_names: Vec<String>,

    /// First hour of the fixed time-slot window (inclusive).
    pub slot_start_hour: u32,

    /// Last hour of the fixed time-slot window (exclusive).
    pub slot_end_hour: u32,

    /// Minimum rest gap between two duties of the same crew member.
    /// `None` disables rest enforcement; policy pending confirmation.
    pub min_rest_minutes: Option<i64>,

    /// How many days ahead a continuous pass schedules.
    pub rolling_window_days: u32,

    /// Interval between continuous passes.
    pub continuous_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_daily_trips_per_bus: 4,
            bus_batch_size: 100,
            insert_batch_size: 20,
            daily_duty_cap_hours: 12,
            high_priority_names: vec!["express".to_string(), "long distance".to_string()],
            slot_start_hour: 6,
            slot_end_hour: 20,
            min_rest_minutes: None,
            rolling_window_days: 7,
            continuous_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.max_daily_trips_per_bus, 4);
        assert_eq!(config.bus_batch_size, 100);
        assert_eq!(config.insert_batch_size, 20);
        assert_eq!(config.daily_duty_cap_hours, 12);
        assert_eq!(config.slot_start_hour, 6);
        assert_eq!(config.slot_end_hour, 20);
        assert_eq!(config.min_rest_minutes, None);
        assert_eq!(config.rolling_window_days, 7);
        assert_eq!(config.continuous_interval, Duration::from_secs(300));
    }
}
