//! Grade-spreadsheet reading.
//!
//! Layout contract: row 0 carries unit and subject titles starting at column
//! 2, row 1 carries column headers, student data starts at row 2. Headers are
//! matched by normalized key so accent or spacing drift in the export does
//! not break extraction.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};

use crate::bulletins::normalize::normalize_key;

const TITLE_START_COLUMN: usize = 2;

const NAME_HEADER: &str = "nom";
const CODE_HEADER: &str = "codeapprenant";
const BIRTH_DATE_HEADER: &str = "datedenaissance";
const SITE_HEADER: &str = "nomsite";
const GROUP_CODE_HEADER: &str = "codegroupe";
const GROUP_NAME_HEADER: &str = "nomgroupe";
const GROUP_EXTENT_HEADER: &str = "etendugroupe";
const JUSTIFIED_HEADER: &str = "absjustifiees";
const UNJUSTIFIED_HEADER: &str = "absinjustifiees";
const LATE_HEADER: &str = "retards";
const APPRECIATIONS_HEADER: &str = "appreciations";

/// One parsed grade spreadsheet.
#[derive(Debug)]
pub(crate) struct GradeSheet {
    titles: Vec<String>,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// One student data row; rows with an empty name or identifier never become
/// a record.
#[derive(Debug, Clone)]
pub(crate) struct StudentRecord {
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) birth_date: String,
    pub(crate) site: String,
    pub(crate) group_code: String,
    pub(crate) group_name: String,
    pub(crate) group_extent: String,
    pub(crate) justified: String,
    pub(crate) unjustified: String,
    pub(crate) late: String,
    pub(crate) appreciations: String,
    cells: Vec<String>,
}

impl StudentRecord {
    /// Raw grade cell at a 0-based spreadsheet column.
    pub(crate) fn grade_cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

impl GradeSheet {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_rows(read_rows(path)?))
    }

    pub(crate) fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let titles = rows
            .first()
            .map(|row| row.iter().skip(TITLE_START_COLUMN).cloned().collect())
            .unwrap_or_default();

        let columns = rows
            .get(1)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, header)| !header.trim().is_empty())
                    .map(|(index, header)| (normalize_key(header), index))
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows.into_iter().skip(2).collect();
        Self { titles, columns, rows }
    }

    /// Title cells from column 2 onward, in column order.
    pub(crate) fn titles(&self) -> &[String] {
        &self.titles
    }

    pub(crate) fn student_records(&self) -> Vec<StudentRecord> {
        self.rows
            .iter()
            .filter_map(|row| self.record_from_row(row))
            .collect()
    }

    fn record_from_row(&self, row: &[String]) -> Option<StudentRecord> {
        let name = self.field(row, NAME_HEADER);
        let code = self.field(row, CODE_HEADER);
        if name.trim().is_empty() || code.trim().is_empty() {
            return None;
        }

        Some(StudentRecord {
            name,
            code,
            birth_date: self.field(row, BIRTH_DATE_HEADER),
            site: self.field(row, SITE_HEADER),
            group_code: self.field(row, GROUP_CODE_HEADER),
            group_name: self.field(row, GROUP_NAME_HEADER),
            group_extent: self.field(row, GROUP_EXTENT_HEADER),
            justified: self.field(row, JUSTIFIED_HEADER),
            unjustified: self.field(row, UNJUSTIFIED_HEADER),
            late: self.field(row, LATE_HEADER),
            appreciations: self.field(row, APPRECIATIONS_HEADER),
            cells: row.to_vec(),
        })
    }

    fn field(&self, row: &[String], header: &str) -> String {
        self.columns
            .get(header)
            .and_then(|index| row.get(*index))
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

/// Read the first sheet of a workbook as string cells.
pub(crate) fn read_rows(path: &Path) -> anyhow::Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook at {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook has no sheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet {sheet_name}"))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Render a spreadsheet cell the way it reads in the export: floats with a
/// zero fraction print as integers.
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) => {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value.as_f64().to_string(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> GradeSheet {
        let titles: Vec<String> = ["", "", "UE 1", "Maths", "Physique"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let headers: Vec<String> = [
            "",
            "CodeApprenant",
            "Nom",
            "DatedeNaissance",
            "NomSite",
            "CodeGroupe",
            "NomGroupe",
            "EtenduGroupe",
            "ABS justifiées",
            "ABS injustifiées",
            "Retards",
            "Appreciations",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let student: Vec<String> = [
            "",
            "4016",
            "DURAND Alice",
            "01/02/1999",
            "Paris",
            "161",
            "M1 MAPI",
            "Promo 2024",
            "3h20",
            "00h00",
            "45 minutes",
            "Bon semestre",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let blank: Vec<String> = vec![String::new(); 12];
        GradeSheet::from_rows(vec![titles, headers, student, blank])
    }

    #[test]
    fn titles_start_at_column_two() {
        assert_eq!(sheet().titles(), &["UE 1", "Maths", "Physique"]);
    }

    #[test]
    fn extracts_student_fields_by_normalized_header() {
        let records = sheet().student_records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "DURAND Alice");
        assert_eq!(record.code, "4016");
        assert_eq!(record.site, "Paris");
        assert_eq!(record.group_extent, "Promo 2024");
        assert_eq!(record.justified, "3h20");
        assert_eq!(record.appreciations, "Bon semestre");
    }

    #[test]
    fn blank_rows_are_skipped() {
        // The fixture's fourth row has no name or code.
        assert_eq!(sheet().student_records().len(), 1);
    }

    #[test]
    fn grade_cell_out_of_range_is_empty() {
        let records = sheet().student_records();
        assert_eq!(records[0].grade_cell(40), "");
        assert_eq!(records[0].grade_cell(2), "DURAND Alice");
    }

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(4016.0)), "4016");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
