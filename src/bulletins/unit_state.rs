//! Teaching-unit validation state and per-subject flags.
//!
//! A unit is validated when every present subject average is at least 10.
//! A single average in the 8..10 band may be compensated when nothing in the
//! unit sits below 8; more than one, or any average below 8, fails the unit.

/// Validation state of a teaching unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitState {
    Validated,
    NotValidated,
    Empty,
}

impl UnitState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            UnitState::Validated => "VA",
            UnitState::NotValidated => "NV",
            UnitState::Empty => "R",
        }
    }
}

/// Flag attached to a subject inside a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubjectFlag {
    None,
    /// Average in 8..10 absorbed by the rest of the unit.
    Compensated,
    /// Subject must be retaken.
    Retake,
}

impl SubjectFlag {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SubjectFlag::None => "",
            SubjectFlag::Compensated => "C",
            SubjectFlag::Retake => "R",
        }
    }
}

/// Evaluate a unit from its present subject averages.
///
/// Input is (subject index, average) for every subject of the unit that had a
/// parseable grade cell, in subject order. Returns the unit state plus a flag
/// per input subject, aligned by position.
pub(crate) fn evaluate_unit(averages: &[(usize, f64)]) -> (UnitState, Vec<(usize, SubjectFlag)>) {
    if averages.is_empty() {
        return (UnitState::Empty, Vec::new());
    }

    let below_eight = averages.iter().filter(|(_, avg)| *avg < 8.0).count();
    let in_band = averages
        .iter()
        .filter(|(_, avg)| (8.0..10.0).contains(avg))
        .count();

    if below_eight == 0 && in_band == 0 {
        let flags = averages
            .iter()
            .map(|(index, _)| (*index, SubjectFlag::None))
            .collect();
        return (UnitState::Validated, flags);
    }

    if below_eight == 0 && in_band == 1 {
        let flags = averages
            .iter()
            .map(|(index, avg)| {
                let flag = if (8.0..10.0).contains(avg) {
                    SubjectFlag::Compensated
                } else {
                    SubjectFlag::None
                };
                (*index, flag)
            })
            .collect();
        return (UnitState::Validated, flags);
    }

    let compensable_band = below_eight == 0 && in_band <= 1;
    let flags = averages
        .iter()
        .map(|(index, avg)| {
            let flag = if *avg < 8.0 {
                SubjectFlag::Retake
            } else if (8.0..10.0).contains(avg) {
                if compensable_band {
                    SubjectFlag::Compensated
                } else {
                    SubjectFlag::Retake
                }
            } else {
                SubjectFlag::None
            };
            (*index, flag)
        })
        .collect();

    (UnitState::NotValidated, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_unit() {
        let (state, flags) = evaluate_unit(&[]);
        assert_eq!(state, UnitState::Empty);
        assert_eq!(state.label(), "R");
        assert!(flags.is_empty());
    }

    #[test]
    fn all_above_ten_validates() {
        let (state, flags) = evaluate_unit(&[(1, 12.0), (2, 10.0), (3, 17.5)]);
        assert_eq!(state, UnitState::Validated);
        assert!(flags.iter().all(|(_, flag)| *flag == SubjectFlag::None));
    }

    #[test]
    fn single_band_average_is_compensated() {
        let (state, flags) = evaluate_unit(&[(1, 12.0), (2, 9.0)]);
        assert_eq!(state, UnitState::Validated);
        assert_eq!(flags, vec![(1, SubjectFlag::None), (2, SubjectFlag::Compensated)]);
    }

    #[test]
    fn two_band_averages_fail_the_unit() {
        let (state, flags) = evaluate_unit(&[(1, 9.0), (2, 8.5), (3, 14.0)]);
        assert_eq!(state, UnitState::NotValidated);
        assert_eq!(
            flags,
            vec![
                (1, SubjectFlag::Retake),
                (2, SubjectFlag::Retake),
                (3, SubjectFlag::None)
            ]
        );
    }

    #[test]
    fn below_eight_fails_and_band_becomes_retake() {
        let (state, flags) = evaluate_unit(&[(1, 7.0), (2, 9.0), (3, 13.0)]);
        assert_eq!(state, UnitState::NotValidated);
        assert_eq!(
            flags,
            vec![
                (1, SubjectFlag::Retake),
                (2, SubjectFlag::Retake),
                (3, SubjectFlag::None)
            ]
        );
    }

    #[test]
    fn zero_average_counts_as_present() {
        let (state, flags) = evaluate_unit(&[(1, 0.0)]);
        assert_eq!(state, UnitState::NotValidated);
        assert_eq!(flags, vec![(1, SubjectFlag::Retake)]);
    }

    #[test]
    fn exactly_ten_is_not_in_band() {
        let (state, _) = evaluate_unit(&[(1, 10.0), (2, 10.0)]);
        assert_eq!(state, UnitState::Validated);
    }

    #[test]
    fn exactly_eight_is_in_band() {
        let (state, flags) = evaluate_unit(&[(1, 8.0), (2, 11.0)]);
        assert_eq!(state, UnitState::Validated);
        assert_eq!(flags[0].1, SubjectFlag::Compensated);
    }
}
