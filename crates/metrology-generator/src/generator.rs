//! Record generator producing one measurement per process step.

use crate::generators::numeric::{generate_defect_count, generate_line_width};
use crate::generators::timestamp::MonotonicClock;
use metrology_core::MetrologyRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Label for a zero-based process step index: `Step_00`, `Step_01`, ...
///
/// Labels sort in step order for indices below 100.
pub fn step_label(index: u32) -> String {
    format!("Step_{index:02}")
}

/// Identifier for a zero-based wafer index: `WAFER_01`, `WAFER_02`, ...
pub fn wafer_id(index: u32) -> String {
    format!("WAFER_{:02}", index + 1)
}

/// Generator of synthetic metrology records.
///
/// Widths and defect counts are drawn from the RNG, so the same seed gives
/// the same measurements. Timestamps always come from the wall clock.
pub struct RecordGenerator<R: Rng = StdRng> {
    rng: R,
    clock: MonotonicClock,
}

impl RecordGenerator<StdRng> {
    /// Create a generator backed by a `StdRng` seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RecordGenerator<R> {
    /// Create a generator drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            clock: MonotonicClock::new(),
        }
    }

    /// Generate exactly `step_count` records for one wafer, steps
    /// `Step_00 .. Step_{step_count-1}` in order.
    pub fn generate(
        &mut self,
        wafer_id: &str,
        lot_id: &str,
        step_count: u32,
    ) -> Vec<MetrologyRecord> {
        let records: Vec<MetrologyRecord> = (0..step_count)
            .map(|step| MetrologyRecord {
                wafer_id: wafer_id.to_string(),
                lot_id: lot_id.to_string(),
                process_step: step_label(step),
                event_timestamp: self.clock.now(),
                line_width_nm: generate_line_width(&mut self.rng),
                defect_count: generate_defect_count(&mut self.rng),
            })
            .collect();

        debug!(
            "Generated {} records for wafer '{}' in lot '{}'",
            records.len(),
            wafer_id,
            lot_id
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::numeric::{DEFECT_COUNT_RANGE, LINE_WIDTH_RANGE_NM};
    use std::collections::HashSet;

    #[test]
    fn test_generate_exact_step_count() {
        let mut generator = RecordGenerator::seeded(42);

        for count in [0, 1, 10, 100] {
            let records = generator.generate("WAFER_01", "LOT_A_2025", count);
            assert_eq!(records.len(), count as usize);
        }
    }

    #[test]
    fn test_step_labels_distinct_and_ordered() {
        let mut generator = RecordGenerator::seeded(7);
        let records = generator.generate("WAFER_01", "LOT_A_2025", 12);

        let labels: Vec<&str> = records.iter().map(|r| r.process_step.as_str()).collect();
        assert_eq!(labels.first(), Some(&"Step_00"));
        assert_eq!(labels.last(), Some(&"Step_11"));

        let unique: HashSet<&str> = labels.iter().copied().collect();
        assert_eq!(unique.len(), labels.len());

        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(sorted, labels);
    }

    #[test]
    fn test_values_in_simulation_ranges() {
        let mut generator = RecordGenerator::seeded(1234);

        for wafer in 0..20 {
            for record in generator.generate(&wafer_id(wafer), "LOT_RANGE", 50) {
                assert!(DEFECT_COUNT_RANGE.contains(&record.defect_count));
                assert!(LINE_WIDTH_RANGE_NM.contains(&record.line_width_nm));
                assert!(record.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_ids_carried_through() {
        let mut generator = RecordGenerator::seeded(42);
        let records = generator.generate("WAFER_05", "LOT_B", 3);

        assert!(records
            .iter()
            .all(|r| r.wafer_id == "WAFER_05" && r.lot_id == "LOT_B"));
    }

    #[test]
    fn test_deterministic_measurements() {
        let mut gen1 = RecordGenerator::seeded(42);
        let mut gen2 = RecordGenerator::seeded(42);

        let a = gen1.generate("WAFER_01", "LOT_A_2025", 10);
        let b = gen2.generate("WAFER_01", "LOT_A_2025", 10);

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.process_step, y.process_step);
            assert_eq!(x.line_width_nm, y.line_width_nm);
            assert_eq!(x.defect_count, y.defect_count);
        }
    }

    #[test]
    fn test_successive_calls_draw_fresh_values() {
        let mut generator = RecordGenerator::seeded(42);

        let first = generator.generate("WAFER_01", "LOT_A_2025", 20);
        let second = generator.generate("WAFER_01", "LOT_A_2025", 20);

        let widths = |records: &[MetrologyRecord]| -> Vec<f64> {
            records.iter().map(|r| r.line_width_nm).collect()
        };
        assert_ne!(widths(&first), widths(&second));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut generator = RecordGenerator::seeded(42);
        let records = generator.generate("WAFER_01", "LOT_A_2025", 50);

        assert!(records
            .windows(2)
            .all(|w| w[0].event_timestamp <= w[1].event_timestamp));
    }

    #[test]
    fn test_label_helpers() {
        assert_eq!(step_label(0), "Step_00");
        assert_eq!(step_label(9), "Step_09");
        assert_eq!(step_label(99), "Step_99");
        assert_eq!(wafer_id(0), "WAFER_01");
        assert_eq!(wafer_id(11), "WAFER_12");
    }
}
