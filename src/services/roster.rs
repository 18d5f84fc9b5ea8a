use std::collections::HashMap;

use crate::bulletins::normalize::normalize_key;
use crate::core::duration::format_minutes;
use crate::schemas::ypareo::{AbsenceCollection, GroupCollection, LearnerCollection};

/// Reference data joined across the three Yparéo collections, keyed by the
/// normalized learner name so spreadsheet rows can be matched by text.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    by_name: HashMap<String, LearnerProfile>,
}

#[derive(Debug, Clone)]
pub(crate) struct LearnerProfile {
    pub(crate) code: i64,
    pub(crate) birth_date: String,
    pub(crate) site: String,
    pub(crate) group_code: String,
    pub(crate) group_name: String,
    pub(crate) group_extent: String,
    pub(crate) justified_minutes: i64,
    pub(crate) unjustified_minutes: i64,
    pub(crate) late_minutes: i64,
}

impl LearnerProfile {
    pub(crate) fn justified_label(&self) -> String {
        format_minutes(self.justified_minutes)
    }

    pub(crate) fn unjustified_label(&self) -> String {
        format_minutes(self.unjustified_minutes)
    }

    pub(crate) fn late_label(&self) -> String {
        format_minutes(self.late_minutes)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct AbsenceTotals {
    justified: i64,
    unjustified: i64,
    late: i64,
}

impl Roster {
    pub(crate) fn build(
        learners: &LearnerCollection,
        groups: &GroupCollection,
        absences: &AbsenceCollection,
    ) -> Self {
        let groups_by_code: HashMap<i64, _> =
            groups.values().map(|group| (group.code, group)).collect();

        let mut totals: HashMap<i64, AbsenceTotals> = HashMap::new();
        for absence in absences.values() {
            let entry = totals.entry(absence.learner_code).or_default();
            let minutes = absence.minutes.unwrap_or(0);
            if absence.justified {
                entry.justified += minutes;
            } else if absence.late {
                entry.late += minutes;
            } else {
                entry.unjustified += minutes;
            }
        }

        let mut by_name = HashMap::new();
        for learner in learners.values() {
            let key = normalize_key(&format!("{}{}", learner.last_name, learner.first_name));
            let group = learner
                .group_code()
                .and_then(|code| groups_by_code.get(&code));
            let learner_totals = totals.get(&learner.code).copied().unwrap_or_default();

            by_name.insert(
                key,
                LearnerProfile {
                    code: learner.code,
                    birth_date: learner.birth_date.clone(),
                    site: learner.site_name().unwrap_or_default().to_string(),
                    group_code: group.map(|g| g.code.to_string()).unwrap_or_default(),
                    group_name: group.map(|g| g.name.clone()).unwrap_or_default(),
                    group_extent: group.map(|g| g.extent.clone()).unwrap_or_default(),
                    justified_minutes: learner_totals.justified,
                    unjustified_minutes: learner_totals.unjustified,
                    late_minutes: learner_totals.late,
                },
            );
        }

        Self { by_name }
    }

    pub(crate) fn lookup(&self, student_name: &str) -> Option<&LearnerProfile> {
        self.by_name.get(&normalize_key(student_name))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}
