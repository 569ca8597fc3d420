//! Fixed time-of-day slot generation for mass scheduling.

use crate::domain::DayTime;

/// The daily window slots are generated inside.
#[derive(Debug, Clone, Copy)]
pub struct SlotWindow {
    /// First hour, inclusive.
    pub start_hour: u32,
    /// Last hour, exclusive.
    pub end_hour: u32,
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 20,
        }
    }
}

/// Generate departure slots stepping by `gap_minutes` through the window.
///
/// A slot is emitted only when a full gap still fits before the end of the
/// window, so the trailing partial slot is dropped. `gap_minutes == 0`
/// yields no slots rather than looping forever.
pub fn generate_slots(gap_minutes: u32, window: &SlotWindow) -> Vec<DayTime> {
    if gap_minutes == 0 || window.end_hour <= window.start_hour {
        return Vec::new();
    }

    let end = (window.end_hour * 60).min(24 * 60);
    let mut slots = Vec::new();
    let mut minute = window.start_hour * 60;
    while minute + gap_minutes <= end {
        slots.push(DayTime::from_minutes_wrapping(minute as i64));
        minute += gap_minutes;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(slots: &[DayTime]) -> Vec<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn thirty_minute_slots_cover_expected_range() {
        let slots = generate_slots(30, &SlotWindow::default());

        assert_eq!(slots.len(), 28);
        assert_eq!(slots.first().unwrap().to_string(), "06:00");
        assert_eq!(slots[1].to_string(), "06:30");
        assert_eq!(slots.last().unwrap().to_string(), "19:30");
        // Never reaches the end hour.
        assert!(slots.iter().all(|s| s.hour() < 20));
    }

    #[test]
    fn sixty_minute_slots() {
        let slots = generate_slots(60, &SlotWindow::default());
        assert_eq!(
            strings(&slots)[..3],
            ["06:00".to_string(), "07:00".to_string(), "08:00".to_string()]
        );
        assert_eq!(slots.last().unwrap().to_string(), "19:00");
    }

    #[test]
    fn trailing_partial_slot_is_dropped() {
        // 45-minute gap: 19:30 + 45 would pass 20:00, so the last slot is 18:45.
        let slots = generate_slots(45, &SlotWindow::default());
        assert_eq!(slots.last().unwrap().to_string(), "18:45");
    }

    #[test]
    fn zero_gap_yields_nothing() {
        assert!(generate_slots(0, &SlotWindow::default()).is_empty());
    }

    #[test]
    fn inverted_window_yields_nothing() {
        let window = SlotWindow {
            start_hour: 20,
            end_hour: 6,
        };
        assert!(generate_slots(30, &window).is_empty());
    }

    #[test]
    fn custom_window() {
        let window = SlotWindow {
            start_hour: 8,
            end_hour: 10,
        };
        let slots = generate_slots(30, &window);
        assert_eq!(strings(&slots), ["08:00", "08:30", "09:00", "09:30"]);
    }
}
