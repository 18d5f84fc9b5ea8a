//! Grade-cell parsing and weighted averaging.
//!
//! A grade cell holds zero or more segments separated by `" - "`, each of the
//! form `value` or `value(coefficient)` with a comma as decimal separator.
//! Parsing is deliberately best-effort: segments that cannot be read are
//! dropped without surfacing an error.

/// One parsed grade segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GradeEntry {
    pub(crate) value: f64,
    pub(crate) coefficient: f64,
}

const SEGMENT_SEPARATOR: &str = " - ";
const ABSENT_MARKER: &str = "Absent au devoir";
/// Continuous-assessment placeholder code; counts as a 1.
const CCHM_CODE: &str = "CCHM";

/// Parse a raw grade cell into (value, coefficient) pairs.
///
/// Segments containing the absence marker are skipped, `CCHM` maps to 1, and
/// a missing coefficient defaults to 1.0. Unparseable segments are skipped.
pub(crate) fn parse_grade_cell(raw: &str) -> Vec<GradeEntry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut entries = Vec::new();
    for segment in raw.split(SEGMENT_SEPARATOR) {
        if segment.contains(ABSENT_MARKER) {
            continue;
        }

        let (value_part, coefficient_part) = match segment.rsplit_once('(') {
            Some((value, coefficient)) => (value, coefficient.trim_end_matches(')')),
            None => (segment, "1.0"),
        };

        let value_part = value_part.replace(',', ".");
        let value_part = value_part.trim();
        let coefficient_part = coefficient_part.replace(',', ".");
        let coefficient_part = coefficient_part.trim();

        let value = if value_part == CCHM_CODE {
            Ok(1.0)
        } else {
            value_part.parse::<f64>()
        };

        match (value, coefficient_part.parse::<f64>()) {
            (Ok(value), Ok(coefficient)) => entries.push(GradeEntry { value, coefficient }),
            _ => continue,
        }
    }

    entries
}

/// Weighted mean of the entries, skipping zero-coefficient pairs. An empty
/// (or fully skipped) input yields 0.0.
pub(crate) fn weighted_average(entries: &[GradeEntry]) -> f64 {
    let mut total_grade = 0.0;
    let mut total_weight = 0.0;

    for entry in entries {
        if entry.coefficient == 0.0 {
            continue;
        }
        total_grade += entry.value * entry.coefficient;
        total_weight += entry.coefficient;
    }

    if total_weight == 0.0 {
        return 0.0;
    }

    total_grade / total_weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: f64, coefficient: f64) -> GradeEntry {
        GradeEntry { value, coefficient }
    }

    #[test]
    fn empty_cell_yields_nothing() {
        assert!(parse_grade_cell("").is_empty());
        assert!(parse_grade_cell("   ").is_empty());
    }

    #[test]
    fn single_value_defaults_coefficient() {
        assert_eq!(parse_grade_cell("12,5"), vec![entry(12.5, 1.0)]);
    }

    #[test]
    fn value_with_coefficient() {
        assert_eq!(parse_grade_cell("14(2)"), vec![entry(14.0, 2.0)]);
        assert_eq!(parse_grade_cell("9,75(0,5)"), vec![entry(9.75, 0.5)]);
    }

    #[test]
    fn multiple_segments() {
        assert_eq!(
            parse_grade_cell("12(1) - 8,5(2) - 16"),
            vec![entry(12.0, 1.0), entry(8.5, 2.0), entry(16.0, 1.0)]
        );
    }

    #[test]
    fn absence_marker_is_dropped() {
        assert_eq!(parse_grade_cell("Absent au devoir - 11(1)"), vec![entry(11.0, 1.0)]);
        assert!(parse_grade_cell("Absent au devoir").is_empty());
    }

    #[test]
    fn cchm_maps_to_one() {
        assert_eq!(parse_grade_cell("CCHM"), vec![entry(1.0, 1.0)]);
        assert_eq!(parse_grade_cell("CCHM(3)"), vec![entry(1.0, 3.0)]);
    }

    #[test]
    fn unparseable_segments_are_skipped_silently() {
        assert_eq!(parse_grade_cell("abc - 10(2) - 12(x)"), vec![entry(10.0, 2.0)]);
    }

    #[test]
    fn splits_on_last_parenthesis() {
        // The value side may itself contain a parenthesis.
        assert_eq!(parse_grade_cell("10(2"), vec![entry(10.0, 2.0)]);
    }

    #[test]
    fn weighted_average_basic() {
        let entries = vec![entry(10.0, 1.0), entry(14.0, 3.0)];
        assert!((weighted_average(&entries) - 13.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_average_skips_zero_coefficients() {
        let entries = vec![entry(2.0, 0.0), entry(15.0, 2.0)];
        assert!((weighted_average(&entries) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_average_empty_is_zero() {
        assert_eq!(weighted_average(&[]), 0.0);
        assert_eq!(weighted_average(&[entry(12.0, 0.0)]), 0.0);
    }

    #[test]
    fn same_input_same_output() {
        let raw = "12,25(1,5) - Absent au devoir - CCHM(2) - junk";
        assert_eq!(parse_grade_cell(raw), parse_grade_cell(raw));
    }
}
