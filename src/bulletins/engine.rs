//! Placeholder computation for one student bulletin.
//!
//! Takes a parsed spreadsheet row plus the template layout and produces the
//! full name-to-value map the document template binds against: identity
//! fields, per-subject averages and credit awards, per-unit weighted
//! averages with validation state, and the two terminal aggregates.

use std::collections::HashMap;

use crate::bulletins::ects::EctsDefaults;
use crate::bulletins::grades::{parse_grade_cell, weighted_average};
use crate::bulletins::normalize::bulletin_stem;
use crate::bulletins::template::TemplateConfig;
use crate::bulletins::unit_state::evaluate_unit;
use crate::bulletins::workbook::StudentRecord;

/// Grade columns sometimes repeat the header label instead of holding data.
const HEADER_ECHO: &str = "Note";

/// Highest credit slot seeded from the defaults table.
const MAX_CREDIT_SLOT: usize = 16;

/// Deterministic output name for a student's rendered bulletin.
pub(crate) fn bulletin_filename(student_name: &str) -> String {
    format!("{}_bulletin.docx", bulletin_stem(student_name))
}

/// Ceiling-round to two decimals.
fn ceil2(value: f64) -> f64 {
    (value * 100.0).ceil() / 100.0
}

fn format_average(value: f64) -> String {
    if value != 0.0 {
        format!("{value:.2}")
    } else {
        String::new()
    }
}

/// Build the complete placeholder map for one student row.
pub(crate) fn build_placeholders(
    record: &StudentRecord,
    config: &TemplateConfig,
    titles: &[String],
    ects: EctsDefaults<'_>,
    today: &str,
) -> HashMap<String, String> {
    let mut placeholders = HashMap::new();

    placeholders.insert("nomApprenant".to_string(), record.name.clone());
    placeholders.insert("etendugroupe".to_string(), record.group_extent.clone());
    placeholders.insert("dateNaissance".to_string(), record.birth_date.clone());
    placeholders.insert("groupe".to_string(), record.group_name.clone());
    placeholders.insert("campus".to_string(), record.site.clone());
    placeholders.insert("justifiee".to_string(), record.justified.clone());
    placeholders.insert("injustifiee".to_string(), record.unjustified.clone());
    placeholders.insert("retard".to_string(), record.late.clone());
    placeholders.insert("datedujour".to_string(), today.to_string());
    placeholders.insert("appreciations".to_string(), record.appreciations.clone());
    placeholders.insert("CodeApprenant".to_string(), record.code.clone());

    for (key, index) in config.title_layout {
        let title = titles.get(*index).cloned().unwrap_or_default();
        placeholders.insert(key.to_string(), title);
    }

    for slot in 1..=MAX_CREDIT_SLOT {
        if !config.is_hidden(slot) {
            let default = ects.credit(slot).unwrap_or(0);
            placeholders.insert(format!("ECTS{slot}"), default.to_string());
        }
    }

    // Subject averages, 1-based; None when the cell is empty or a header echo.
    let mut subject_averages: Vec<Option<f64>> = vec![None; config.subject_count() + 1];

    for (subject, column) in config.grade_columns.iter().enumerate() {
        let subject = subject + 1;
        let raw = record.grade_cell(*column).trim();

        if raw.is_empty() || raw == HEADER_ECHO {
            placeholders.insert(format!("note{subject}"), String::new());
            placeholders.insert(format!("ECTS{subject}"), String::new());
            continue;
        }

        let average = weighted_average(&parse_grade_cell(raw));
        subject_averages[subject] = Some(average);
        placeholders.insert(format!("note{subject}"), format_average(average));

        let credit = if average > 8.0 && !config.is_hidden(subject) {
            ects.credit(subject).unwrap_or(1).to_string()
        } else if average > 0.0 {
            "0".to_string()
        } else {
            String::new()
        };
        placeholders.insert(format!("ECTS{subject}"), credit);
    }

    for unit in config.units {
        let present: Vec<(usize, f64)> = unit
            .members
            .iter()
            .filter_map(|subject| subject_averages[*subject].map(|avg| (*subject, avg)))
            .collect();

        let (state, flags) = evaluate_unit(&present);
        placeholders.insert(format!("etat{}", unit.state_key), state.label().to_string());

        for subject in unit.members {
            placeholders.entry(format!("etat{subject}")).or_default();
        }
        for (subject, flag) in flags {
            let eligible = !config.is_hidden(subject)
                && subject_averages[subject].is_some_and(|avg| avg != 0.0);
            if eligible {
                placeholders.insert(format!("etat{subject}"), flag.label().to_string());
            }
        }
    }

    let mut total_credits: u32 = 0;
    for unit in config.units {
        let mut weighted_sum = 0.0;
        let mut unit_credits: u32 = 0;

        for subject in unit.credit_members {
            // The formatted two-decimal value feeds the sum, not the raw one.
            let note = placeholders
                .get(&format!("note{subject}"))
                .and_then(|value| value.parse::<f64>().ok())
                .unwrap_or(0.0);
            let credit = placeholders
                .get(&format!("ECTS{subject}"))
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(0);

            if credit != 0 {
                weighted_sum += note * f64::from(credit);
                unit_credits += credit;
            }
        }

        let unit_average = if unit_credits > 0 {
            ceil2(weighted_sum / f64::from(unit_credits))
        } else {
            0.0
        };
        placeholders.insert(format!("moy{}", unit.avg_key), format_average(unit_average));
        let credits_label = if unit_credits != 0 {
            unit_credits.to_string()
        } else {
            String::new()
        };
        placeholders.insert(format!("ECTS{}", unit.avg_key), credits_label);
        total_credits += unit_credits;
    }

    placeholders.insert("moyenneECTS".to_string(), total_credits.to_string());

    let mut overall_sum = 0.0;
    let mut overall_credits: u32 = 0;
    for unit in config.units {
        let average = placeholders
            .get(&format!("moy{}", unit.avg_key))
            .and_then(|value| value.parse::<f64>().ok());
        let credits = placeholders
            .get(&format!("ECTS{}", unit.avg_key))
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|credits| *credits != 0);

        if let Some(credits) = credits {
            if let Some(average) = average {
                overall_sum += average * f64::from(credits);
            }
            overall_credits += credits;
        }
    }
    let overall = if overall_credits > 0 {
        format!("{:.2}", ceil2(overall_sum / f64::from(overall_credits)))
    } else {
        "0".to_string()
    };
    placeholders.insert("moyenne".to_string(), overall);

    // Hidden credit slots never reach the document.
    for subject in config.hidden {
        placeholders.remove(&format!("ECTS{subject}"));
    }

    placeholders
}
