//! Population of a bulletin workbook from a raw grade export.
//!
//! The raw Yparéo export carries subject titles on row 4 (1-based) with grade
//! values below them, and no learner reference columns. Population rebuilds
//! the bulletin sheet layout: title row, header row, then one row per student
//! with reference data joined from the roster and the appreciation lifted
//! from the accompanying Word document.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::Context;
use rust_xlsxwriter::Workbook;
use zip::ZipArchive;

use crate::bulletins::normalize::normalize_key;
use crate::bulletins::template::TemplateSignature;
use crate::bulletins::workbook::read_rows;
use crate::services::roster::Roster;

/// Row of the raw export carrying the subject titles, 0-based.
const EXPORT_TITLE_ROW: usize = 3;
/// Column of the student name in the raw export, 0-based.
const EXPORT_NAME_COLUMN: usize = 1;
/// Subject titles repeat every third column starting at C.
const EXPORT_TITLE_STEP: usize = 3;

const GROUP_AVERAGE_MARKER: &str = "moyennedugroupe";

/// Header row of the generated bulletin sheet, in column order after the
/// grade block.
const REFERENCE_HEADERS: &[&str] = &[
    "DatedeNaissance",
    "NomSite",
    "CodeGroupe",
    "NomGroupe",
    "EtenduGroupe",
    "ABS justifiées",
    "ABS injustifiées",
    "Retards",
    "Appreciations",
];

/// One raw grade export, as uploaded.
#[derive(Debug)]
pub(crate) struct RawExport {
    rows: Vec<Vec<String>>,
}

impl RawExport {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_rows(read_rows(path)?))
    }

    pub(crate) fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Title cells sampled every third column, the sequence the classifier
    /// matches against.
    pub(crate) fn classification_titles(&self) -> Vec<String> {
        let Some(titles) = self.rows.get(EXPORT_TITLE_ROW) else {
            return Vec::new();
        };
        (2..titles.len())
            .step_by(EXPORT_TITLE_STEP)
            .map(|column| titles[column].clone())
            .filter(|cell| !cell.trim().is_empty())
            .collect()
    }

    /// Every non-empty title of the title row, keyed by normalized text.
    /// Grade values sit in the same column as their title.
    fn title_columns(&self) -> HashMap<String, usize> {
        self.rows
            .get(EXPORT_TITLE_ROW)
            .map(|titles| {
                titles
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.trim().is_empty())
                    .map(|(column, cell)| (normalize_key(cell), column))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn data_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows.iter().skip(EXPORT_TITLE_ROW + 1)
    }
}

/// Build the populated bulletin sheet rows for one classified export.
pub(crate) fn populate_rows(
    export: &RawExport,
    signature: &TemplateSignature,
    roster: &Roster,
    appreciations: &HashMap<String, String>,
) -> Vec<Vec<String>> {
    let title_columns = export.title_columns();
    let base = 2 + signature.headers.len();
    let width = base + REFERENCE_HEADERS.len();

    let mut title_row = vec![String::new(); 2];
    title_row.extend(signature.headers.iter().map(|h| h.to_string()));

    let mut header_row = vec![String::new(); width];
    header_row[0] = "CodeApprenant".to_string();
    header_row[1] = "Nom".to_string();
    for (offset, header) in REFERENCE_HEADERS.iter().enumerate() {
        header_row[base + offset] = header.to_string();
    }

    let mut rows = vec![title_row, header_row];
    for source in export.data_rows() {
        if is_group_average_row(source) {
            continue;
        }
        let name = source
            .get(EXPORT_NAME_COLUMN)
            .map(|cell| cell.trim())
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let mut row = vec![String::new(); width];
        row[1] = name.to_string();

        for (index, header) in signature.headers.iter().enumerate() {
            if let Some(&column) = title_columns.get(&normalize_key(header)) {
                if let Some(value) = source.get(column) {
                    row[2 + index] = value.clone();
                }
            }
        }

        if let Some(profile) = roster.lookup(name) {
            row[0] = profile.code.to_string();
            row[base] = profile.birth_date.clone();
            row[base + 1] = profile.site.clone();
            row[base + 2] = profile.group_code.clone();
            row[base + 3] = profile.group_name.clone();
            row[base + 4] = profile.group_extent.clone();
            row[base + 5] = profile.justified_label();
            row[base + 6] = profile.unjustified_label();
            row[base + 7] = profile.late_label();
        }
        if let Some(appreciation) = appreciations.get(&normalize_key(name)) {
            row[base + 8] = appreciation.clone();
        }

        rows.push(row);
    }

    rows
}

fn is_group_average_row(row: &[String]) -> bool {
    row.iter().any(|cell| normalize_key(cell).contains(GROUP_AVERAGE_MARKER))
}

/// Write string rows out as a workbook.
pub(crate) fn write_workbook(rows: &[Vec<String>], path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row_index, row) in rows.iter().enumerate() {
        for (column_index, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string(row_index as u32, column_index as u16, cell.as_str())?;
            }
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("writing populated workbook {}", path.display()))?;
    Ok(())
}

/// Pull `name → appreciation` pairs out of the uploaded Word document. Each
/// table row's first cell is the student name, the second the appreciation.
pub(crate) fn extract_appreciations(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading appreciation document {}", path.display()))?;
    appreciations_from_bytes(&bytes)
}

pub(crate) fn appreciations_from_bytes(bytes: &[u8]) -> anyhow::Result<HashMap<String, String>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("opening appreciation document")?;
    let mut entry = archive
        .by_name("word/document.xml")
        .context("appreciation document has no body part")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("reading appreciation document body")?;
    Ok(appreciations_from_xml(&xml))
}

fn appreciations_from_xml(xml: &str) -> HashMap<String, String> {
    let mut appreciations = HashMap::new();
    for row in sections(xml, "w:tr") {
        let mut cells = sections(row, "w:tc").into_iter().map(text_content);
        if let (Some(name), Some(appreciation)) = (cells.next(), cells.next()) {
            let name = name.trim().to_string();
            let appreciation = appreciation.trim().to_string();
            if !name.is_empty() && !appreciation.is_empty() {
                appreciations.insert(normalize_key(&name), appreciation);
            }
        }
    }
    appreciations
}

/// Bodies of every `<tag …>…</tag>` element. Element names that merely share
/// the prefix (`w:tr` vs `w:trPr`) do not match.
fn sections<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        if !after.starts_with('>') && !after.starts_with(' ') && !after.starts_with('/') {
            rest = after;
            continue;
        }
        let Some(body_at) = after.find('>') else { break };
        if after[..body_at].ends_with('/') {
            // Self-closing, no body.
            rest = &after[body_at + 1..];
            continue;
        }
        let body = &after[body_at + 1..];
        let Some(end) = body.find(&close) else { break };
        out.push(&body[..end]);
        rest = &body[end..];
    }

    out
}

fn text_content(fragment: &str) -> String {
    let text = sections(fragment, "w:t").concat();
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulletins::template::{classify, SIGNATURES};
    use crate::bulletins::workbook::GradeSheet;
    use crate::schemas::ypareo::{AbsenceCollection, GroupCollection, LearnerCollection};

    fn signature_named(name: &str) -> &'static TemplateSignature {
        SIGNATURES.iter().find(|signature| signature.name == name).unwrap()
    }

    fn roster() -> Roster {
        let learners: LearnerCollection = serde_json::from_str(
            r#"{"1": {
                "codeApprenant": 4016,
                "nomApprenant": "DURAND",
                "prenomApprenant": "Alice",
                "dateNaissance": "01/02/1999",
                "inscriptions": [{"site": {"nomSite": "Paris"}}],
                "informationsCourantes": {"codeGroupe": 161}
            }}"#,
        )
        .unwrap();
        let groups: GroupCollection = serde_json::from_str(
            r#"{"161": {"codeGroupe": 161, "nomGroupe": "P-M1 MAPI ALT 1", "etenduGroupe": "Promo"}}"#,
        )
        .unwrap();
        let absences: AbsenceCollection = serde_json::from_str(
            r#"{"a": {"codeApprenant": 4016, "duree": 90, "isJustifie": true}}"#,
        )
        .unwrap();
        Roster::build(&learners, &groups, &absences)
    }

    /// Raw export fixture: titles on row 4 every third column, one student
    /// row, one group-average row.
    fn export(signature: &TemplateSignature) -> RawExport {
        let last_column = 2 + EXPORT_TITLE_STEP * (signature.headers.len() - 1);
        let mut title_row = vec![String::new(); last_column + 1];
        for (index, header) in signature.headers.iter().enumerate() {
            title_row[2 + EXPORT_TITLE_STEP * index] = header.to_string();
        }

        let mut student_row = vec![String::new(); last_column + 1];
        student_row[EXPORT_NAME_COLUMN] = "DURAND Alice".to_string();
        // Grade under the second title (first subject of the unit).
        student_row[2 + EXPORT_TITLE_STEP] = "12 - 14(2)".to_string();

        let mut average_row = vec![String::new(); last_column + 1];
        average_row[EXPORT_NAME_COLUMN] = "Moyenne du groupe".to_string();

        let filler = vec![String::new(); last_column + 1];
        RawExport::from_rows(vec![
            filler.clone(),
            filler.clone(),
            filler,
            title_row,
            student_row,
            average_row,
        ])
    }

    #[test]
    fn classification_titles_sample_every_third_column() {
        let signature = signature_named("MAPI");
        let titles = export(signature).classification_titles();
        assert_eq!(titles.len(), signature.headers.len());
        assert_eq!(titles[0], signature.headers[0]);
        assert!(std::ptr::eq(classify(&titles).unwrap(), signature));
    }

    #[test]
    fn populated_rows_join_grades_reference_data_and_appreciations() {
        let signature = signature_named("MAPI");
        let appreciations =
            HashMap::from([(normalize_key("DURAND Alice"), "Très bon semestre".to_string())]);
        let rows = populate_rows(&export(signature), signature, &roster(), &appreciations);

        // Title row, header row, one student row; the average row is dropped.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], signature.headers[0]);
        assert_eq!(rows[1][0], "CodeApprenant");
        assert_eq!(rows[1][1], "Nom");

        let base = 2 + signature.headers.len();
        let student = &rows[2];
        assert_eq!(student[0], "4016");
        assert_eq!(student[1], "DURAND Alice");
        assert_eq!(student[3], "12 - 14(2)");
        assert_eq!(student[base], "01/02/1999");
        assert_eq!(student[base + 1], "Paris");
        assert_eq!(student[base + 5], "1h30");
        assert_eq!(student[base + 8], "Très bon semestre");
    }

    #[test]
    fn unmatched_students_keep_their_grades_without_reference_data() {
        let signature = signature_named("MAPI");
        let mut export = export(signature);
        export.rows[4][EXPORT_NAME_COLUMN] = "INCONNU Jean".to_string();
        let rows = populate_rows(&export, signature, &roster(), &HashMap::new());

        let student = &rows[2];
        assert_eq!(student[0], "");
        assert_eq!(student[3], "12 - 14(2)");
        assert_eq!(student[2 + signature.headers.len()], "");
    }

    #[test]
    fn written_workbook_reads_back_as_a_grade_sheet() {
        let signature = signature_named("MAPI");
        let appreciations = HashMap::new();
        let rows = populate_rows(&export(signature), signature, &roster(), &appreciations);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("populated.xlsx");
        write_workbook(&rows, &path).unwrap();

        let sheet = GradeSheet::open(&path).unwrap();
        assert!(std::ptr::eq(classify(sheet.titles()).unwrap(), signature));
        let records = sheet.student_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "DURAND Alice");
        assert_eq!(records[0].code, "4016");
        assert_eq!(records[0].justified, "1h30");
    }

    #[test]
    fn appreciations_come_from_the_first_two_table_cells() {
        let xml = concat!(
            "<w:document><w:body><w:tbl>",
            "<w:tr><w:trPr><w:cnfStyle/></w:trPr>",
            "<w:tc><w:tcPr><w:tcW/></w:tcPr><w:p><w:r><w:t>DURAND Alice</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t xml:space=\"preserve\">Bon </w:t><w:t>semestre</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>colonne ignorée</w:t></w:r></w:p></w:tc>",
            "</w:tr>",
            "<w:tr><w:tc><w:p><w:t/></w:p></w:tc><w:tc><w:p><w:t>sans nom</w:t></w:p></w:tc></w:tr>",
            "</w:tbl></w:body></w:document>",
        );

        let appreciations = appreciations_from_xml(xml);
        assert_eq!(appreciations.len(), 1);
        assert_eq!(appreciations[&normalize_key("DURAND Alice")], "Bon semestre");
    }

    #[test]
    fn table_text_is_unescaped() {
        let xml = "<w:tr><w:tc><w:t>A &amp; B</w:t></w:tc><w:tc><w:t>S&#233;rieux</w:t></w:tc></w:tr>";
        let appreciations = appreciations_from_xml(xml);
        assert_eq!(appreciations.len(), 1);
        assert!(appreciations.contains_key(&normalize_key("A & B")));
    }
}
