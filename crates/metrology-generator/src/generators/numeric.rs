//! Numeric value generators.

use rand::Rng;
use std::ops::RangeInclusive;

/// Simulated feature width range in nanometres.
pub const LINE_WIDTH_RANGE_NM: RangeInclusive<f64> = 50.5..=51.5;

/// Simulated defects per step.
pub const DEFECT_COUNT_RANGE: RangeInclusive<u32> = 0..=5;

/// Generate a random line width, rounded to 2 decimal places.
///
/// Both ends of the range have 2 decimal places, so rounding never leaves it.
pub fn generate_line_width<R: Rng>(rng: &mut R) -> f64 {
    round_to_hundredths(rng.gen_range(LINE_WIDTH_RANGE_NM))
}

/// Generate a random defect count (inclusive range).
pub fn generate_defect_count<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(DEFECT_COUNT_RANGE)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_line_width() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let value = generate_line_width(&mut rng);
            assert!(LINE_WIDTH_RANGE_NM.contains(&value), "{value} out of range");
            // At most 2 decimal places
            assert!(((value * 100.0) - (value * 100.0).round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_generate_defect_count_covers_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 6];

        for _ in 0..1000 {
            let value = generate_defect_count(&mut rng);
            assert!(DEFECT_COUNT_RANGE.contains(&value));
            seen[value as usize] = true;
        }

        assert!(seen.iter().all(|s| *s), "not every count drawn: {seen:?}");
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(50.5049), 50.5);
        assert_eq!(round_to_hundredths(51.4999), 51.5);
        assert_eq!(round_to_hundredths(50.987), 50.99);
    }
}
