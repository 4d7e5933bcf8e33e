//! Banded table lookup.
//!
//! Both the standard remuneration grades and the withholding tax table are
//! ordered, contiguous bands of `[range_min, range_max)`. A lookup always
//! resolves to exactly one band: values below the table clamp to the first
//! band and values at or above the last `range_max` clamp to the last band.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// A band of a lookup table covering `[range_min, range_max)`.
pub trait RangeBand {
    /// Lowest value in the band (inclusive).
    fn range_min(&self) -> Decimal;
    /// Upper bound (exclusive), or `None` for an open top band.
    fn range_max(&self) -> Option<Decimal>;
}

/// How a value was matched to a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandMatch {
    /// The value lies inside the band.
    Interior,
    /// The value is below the table and was clamped to the first band.
    ClampedLow,
    /// The value is above the table and was clamped to the last band.
    ClampedHigh,
}

/// Finds the band containing `value` in an ordered, contiguous table.
///
/// Returns `None` only for an empty table or a table with gaps; tables
/// loaded through [`crate::config::ConfigLoader`] have neither.
///
/// # Example
///
/// ```
/// use deduction_engine::calculation::{BandMatch, RangeBand, find_band};
/// use rust_decimal::Decimal;
///
/// struct Band(i64, Option<i64>);
///
/// impl RangeBand for Band {
///     fn range_min(&self) -> Decimal { Decimal::from(self.0) }
///     fn range_max(&self) -> Option<Decimal> { self.1.map(Decimal::from) }
/// }
///
/// let bands = [Band(0, Some(100)), Band(100, Some(200))];
/// let (band, matched) = find_band(&bands, Decimal::from(150)).unwrap();
/// assert_eq!(band.0, 100);
/// assert_eq!(matched, BandMatch::Interior);
///
/// let (band, matched) = find_band(&bands, Decimal::from(500)).unwrap();
/// assert_eq!(band.0, 100);
/// assert_eq!(matched, BandMatch::ClampedHigh);
/// ```
pub fn find_band<B: RangeBand>(bands: &[B], value: Decimal) -> Option<(&B, BandMatch)> {
    let first = bands.first()?;
    if value < first.range_min() {
        return Some((first, BandMatch::ClampedLow));
    }

    let index = bands.partition_point(|b| b.range_min() <= value);
    let candidate = &bands[index - 1];

    match candidate.range_max() {
        None => Some((candidate, BandMatch::Interior)),
        Some(max) if value < max => Some((candidate, BandMatch::Interior)),
        Some(_) if index == bands.len() => Some((candidate, BandMatch::ClampedHigh)),
        Some(_) => None,
    }
}

/// Checks that an ordered table starts at zero, has no gaps or overlaps, and
/// only leaves the last band open.
pub fn validate_bands<B: RangeBand>(table: &str, bands: &[B]) -> EngineResult<()> {
    let invalid = |message: String| EngineError::ConfigInvalid {
        message: format!("{}: {}", table, message),
    };

    let first = bands
        .first()
        .ok_or_else(|| invalid("table has no bands".to_string()))?;
    if first.range_min() != Decimal::ZERO {
        return Err(invalid(format!(
            "first band starts at {}, expected 0",
            first.range_min()
        )));
    }

    for (i, band) in bands.iter().enumerate() {
        let is_last = i + 1 == bands.len();
        match (band.range_max(), bands.get(i + 1)) {
            (Some(max), _) if max <= band.range_min() => {
                return Err(invalid(format!(
                    "band starting at {} is empty",
                    band.range_min()
                )));
            }
            (Some(max), Some(next)) if max != next.range_min() => {
                return Err(invalid(format!(
                    "band ending at {} is followed by a band starting at {}",
                    max,
                    next.range_min()
                )));
            }
            (None, _) if !is_last => {
                return Err(invalid(format!(
                    "band starting at {} is open but not last",
                    band.range_min()
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestBand {
        min: i64,
        max: Option<i64>,
    }

    impl RangeBand for TestBand {
        fn range_min(&self) -> Decimal {
            Decimal::from(self.min)
        }

        fn range_max(&self) -> Option<Decimal> {
            self.max.map(Decimal::from)
        }
    }

    fn band(min: i64, max: Option<i64>) -> TestBand {
        TestBand { min, max }
    }

    fn closed_table() -> Vec<TestBand> {
        vec![band(0, Some(100)), band(100, Some(250)), band(250, Some(400))]
    }

    #[test]
    fn test_interior_value_matches_one_band() {
        let bands = closed_table();
        let (found, matched) = find_band(&bands, Decimal::from(120)).unwrap();
        assert_eq!(found.min, 100);
        assert_eq!(matched, BandMatch::Interior);
    }

    #[test]
    fn test_range_min_is_inclusive_and_range_max_exclusive() {
        let bands = closed_table();
        assert_eq!(find_band(&bands, Decimal::from(100)).unwrap().0.min, 100);
        assert_eq!(find_band(&bands, Decimal::from(99)).unwrap().0.min, 0);
        assert_eq!(find_band(&bands, Decimal::from(250)).unwrap().0.min, 250);
    }

    #[test]
    fn test_value_at_ceiling_clamps_to_last_band() {
        let bands = closed_table();
        let (found, matched) = find_band(&bands, Decimal::from(400)).unwrap();
        assert_eq!(found.min, 250);
        assert_eq!(matched, BandMatch::ClampedHigh);
    }

    #[test]
    fn test_value_below_table_clamps_to_first_band() {
        let bands = vec![band(50, Some(100)), band(100, None)];
        let (found, matched) = find_band(&bands, Decimal::from(10)).unwrap();
        assert_eq!(found.min, 50);
        assert_eq!(matched, BandMatch::ClampedLow);
    }

    #[test]
    fn test_open_top_band_is_interior() {
        let bands = vec![band(0, Some(100)), band(100, None)];
        let (found, matched) = find_band(&bands, Decimal::from(1_000_000)).unwrap();
        assert_eq!(found.min, 100);
        assert_eq!(matched, BandMatch::Interior);
    }

    #[test]
    fn test_empty_table_has_no_match() {
        let bands: Vec<TestBand> = vec![];
        assert!(find_band(&bands, Decimal::ONE).is_none());
    }

    #[test]
    fn test_gap_has_no_match() {
        let bands = vec![band(0, Some(100)), band(200, None)];
        assert!(find_band(&bands, Decimal::from(150)).is_none());
    }

    #[test]
    fn test_validate_accepts_contiguous_table() {
        assert!(validate_bands("test", &closed_table()).is_ok());
        assert!(validate_bands("test", &[band(0, Some(10)), band(10, None)]).is_ok());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let result = validate_bands("test", &[band(0, Some(100)), band(200, None)]);
        match result {
            Err(EngineError::ConfigInvalid { message }) => {
                assert!(message.starts_with("test:"));
                assert!(message.contains("200"));
            }
            other => panic!("Expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_overlap() {
        assert!(validate_bands("test", &[band(0, Some(150)), band(100, None)]).is_err());
    }

    #[test]
    fn test_validate_rejects_open_band_before_last() {
        assert!(validate_bands("test", &[band(0, None), band(100, None)]).is_err());
    }

    #[test]
    fn test_validate_rejects_table_not_starting_at_zero() {
        assert!(validate_bands("test", &[band(10, None)]).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_table() {
        let bands: Vec<TestBand> = vec![];
        assert!(validate_bands("test", &bands).is_err());
    }
}
