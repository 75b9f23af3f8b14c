//! Load metrics.

use std::time::Duration;

/// Outcome of one successful batch submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Rows acknowledged by the warehouse.
    pub rows: u64,
    /// Time spent in the `execute_batch` call.
    pub duration: Duration,
}

/// Metrics accumulated over the batches of a lot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadMetrics {
    /// Number of rows inserted.
    pub rows_inserted: u64,
    /// Number of batches acknowledged.
    pub batch_count: u64,
    /// Number of batches rejected (each attempt counts).
    pub failed_batches: u64,
    /// Time spent generating data.
    pub generation_duration: Duration,
    /// Time spent inserting data.
    pub insert_duration: Duration,
    /// Wall time for the whole load.
    pub total_duration: Duration,
}

impl LoadMetrics {
    pub fn record_batch(&mut self, report: &BatchReport) {
        self.rows_inserted += report.rows;
        self.batch_count += 1;
        self.insert_duration += report.duration;
    }

    pub fn record_failure(&mut self) {
        self.failed_batches += 1;
    }

    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.rows_inserted as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = LoadMetrics::default();
        for _ in 0..5 {
            metrics.record_batch(&BatchReport {
                rows: 10,
                duration: Duration::from_millis(200),
            });
        }
        metrics.record_failure();
        metrics.total_duration = Duration::from_secs(2);

        assert_eq!(metrics.rows_inserted, 50);
        assert_eq!(metrics.batch_count, 5);
        assert_eq!(metrics.failed_batches, 1);
        assert_eq!(metrics.insert_duration, Duration::from_secs(1));
        assert_eq!(metrics.rows_per_second(), 25.0);
    }

    #[test]
    fn test_rows_per_second_without_duration() {
        assert_eq!(LoadMetrics::default().rows_per_second(), 0.0);
    }
}
