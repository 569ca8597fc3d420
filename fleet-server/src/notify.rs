//! Post-commit notification events.
//!
//! The engine emits an event after a batch of trips has been persisted;
//! delivery is fire-and-forget and a sink can never fail a scheduling run.
//! Out-of-scope collaborators (email, dashboards) consume these events
//! asynchronously.

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::info;

use crate::domain::{BusId, RouteId};

/// An event emitted by the engine after a successful persistence step.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleEvent {
    /// A bus received trips from a multi-day or single-bus run.
    BusScheduled {
        bus: BusId,
        trips: usize,
        first_date: Option<NaiveDate>,
    },

    /// A route received trips from a mass-scheduling run.
    RouteScheduled {
        route: RouteId,
        trips: usize,
        date: NaiveDate,
    },

    /// A full scheduling pass finished.
    RunCompleted {
        total_buses: usize,
        scheduled_buses: usize,
        total_trips: usize,
    },
}

/// Consumer of schedule events.
///
/// Implementations must not block and must swallow their own failures;
/// the engine ignores whatever happens past this call.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: ScheduleEvent);
}

/// Default sink: writes events to the log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: ScheduleEvent) {
        match event {
            ScheduleEvent::BusScheduled {
                bus,
                trips,
                first_date,
            } => {
                info!(bus = %bus, trips, first_date = ?first_date, "bus scheduled");
            }
            ScheduleEvent::RouteScheduled { route, trips, date } => {
                info!(route = %route, trips, %date, "route scheduled");
            }
            ScheduleEvent::RunCompleted {
                total_buses,
                scheduled_buses,
                total_trips,
            } => {
                info!(
                    scheduled_buses,
                    total_buses, total_trips, "scheduling pass completed"
                );
            }
        }
    }
}

/// Sink that forwards events onto an unbounded channel.
///
/// Useful for wiring an async consumer, and for asserting on emitted
/// events in tests. Sending never blocks; if the receiver is gone the
/// event is dropped silently.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScheduleEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: ScheduleEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.notify(ScheduleEvent::BusScheduled {
            bus: BusId::new("B1"),
            trips: 3,
            first_date: None,
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            ScheduleEvent::BusScheduled {
                bus: BusId::new("B1"),
                trips: 3,
                first_date: None,
            }
        );
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        // Must not panic or error out.
        sink.notify(ScheduleEvent::RunCompleted {
            total_buses: 1,
            scheduled_buses: 1,
            total_trips: 2,
        });
    }
}
