//! Timestamp generation.

use chrono::{DateTime, Utc};

/// Wall clock that never runs backwards within one instance.
///
/// Readings are NOT deterministic; each call returns the current time,
/// clamped to the previous reading if the system clock stepped back.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clock.
    pub fn now(&mut self) -> DateTime<Utc> {
        self.observe(Utc::now())
    }

    fn observe(&mut self, reading: DateTime<Utc>) -> DateTime<Utc> {
        let value = match self.last {
            Some(last) if reading < last => last,
            _ => reading,
        };
        self.last = Some(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_never_decreases() {
        let mut clock = MonotonicClock::new();
        let start = Utc::now();

        assert_eq!(clock.observe(start), start);
        assert_eq!(clock.observe(start - Duration::seconds(5)), start);

        let later = start + Duration::milliseconds(1);
        assert_eq!(clock.observe(later), later);
    }

    #[test]
    fn test_now_sequence_non_decreasing() {
        let mut clock = MonotonicClock::new();
        let readings: Vec<_> = (0..100).map(|_| clock.now()).collect();
        assert!(readings.windows(2).all(|w| w[0] <= w[1]));
    }
}
