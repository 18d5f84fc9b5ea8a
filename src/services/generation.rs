//! End-to-end bulletin pipeline: classify an uploaded spreadsheet, join it
//! with Yparéo reference data, render one bulletin per student, convert the
//! batch to PDF, import each document upstream, and package the archive.

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::bulletins::archive::write_archive;
use crate::bulletins::convert::{convert_directory, extract_learner_code};
use crate::bulletins::ects::EctsTable;
use crate::bulletins::engine::{build_placeholders, bulletin_filename};
use crate::bulletins::populate::{
    extract_appreciations, populate_rows, write_workbook, RawExport,
};
use crate::bulletins::render::DocxTemplate;
use crate::bulletins::template::classify;
use crate::bulletins::workbook::{GradeSheet, StudentRecord};
use crate::core::state::AppState;
use crate::schemas::ypareo::DocumentImport;
use crate::schemas::ImportFailure;
use crate::services::roster::Roster;
use crate::services::ypareo::{YpareoClient, YpareoError};

const BULLETIN_SUBDIR: &str = "bulletins";
const ARCHIVE_NAME: &str = "bulletins.zip";

#[derive(Debug, thiserror::Error)]
pub(crate) enum GenerationError {
    #[error("no matching template found for the uploaded spreadsheet")]
    UnknownTemplate,
    #[error("failed to fetch Yparéo reference data: {0}")]
    Reference(#[from] YpareoError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug)]
pub(crate) struct GenerationOutcome {
    pub(crate) template_key: &'static str,
    pub(crate) generated: usize,
    pub(crate) zip_path: PathBuf,
    pub(crate) failures: Vec<ImportFailure>,
}

/// Run the whole pipeline for one uploaded spreadsheet.
pub(crate) async fn generate_and_import(
    state: &AppState,
    upload_path: &Path,
) -> Result<GenerationOutcome, GenerationError> {
    let settings = state.settings();

    let sheet = {
        let path = upload_path.to_path_buf();
        blocking(move || GradeSheet::open(&path)).await?
    };

    let signature = classify(sheet.titles()).ok_or(GenerationError::UnknownTemplate)?;
    let config = signature.config;
    tracing::info!(template = config.key, signature = signature.name, "classified upload");

    let ypareo = state.ypareo();
    let roster = fetch_roster(state).await?;
    tracing::debug!(learners = roster.len(), "reference data loaded");

    let ects = EctsTable::load(&settings.paths().ects_json_path)?;
    let template = {
        let path = settings.paths().template_dir.join(config.template_file);
        blocking(move || Ok(DocxTemplate::open(&path)?)).await?
    };

    let out_dir = settings.paths().output_dir.join(BULLETIN_SUBDIR);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let today = OffsetDateTime::now_utc()
        .format(&format_description!("[day]/[month]/[year]"))
        .context("formatting current date")?;

    let records = sheet.student_records();
    let titles = sheet.titles().to_vec();
    let documents = {
        let out_dir = out_dir.clone();
        blocking(move || {
            let defaults = ects.defaults_for(config.ects_key);
            let mut paths = Vec::new();
            for mut record in records {
                enrich_record(&mut record, &roster);
                let placeholders =
                    build_placeholders(&record, config, &titles, defaults, &today);
                let rendered = template
                    .render(&placeholders)
                    .with_context(|| format!("rendering bulletin for {}", record.name))?;
                let path = out_dir.join(bulletin_filename(&record.name));
                std::fs::write(&path, rendered)
                    .with_context(|| format!("writing bulletin {}", path.display()))?;
                paths.push(path);
            }
            Ok(paths)
        })
        .await?
    };
    tracing::info!(count = documents.len(), template = config.key, "bulletins rendered");
    metrics::counter!("bulletins_generated_total").increment(documents.len() as u64);

    let pdfs = {
        let converter = settings.bulletin().converter_bin.clone();
        let dir = out_dir.clone();
        blocking(move || convert_directory(&converter, &dir)).await?
    };

    let mut failures = Vec::new();
    for pdf in &pdfs {
        if let Err(error) = import_bulletin(ypareo, pdf).await {
            tracing::error!(file = %pdf.display(), %error, "bulletin import failed");
            failures.push(ImportFailure {
                file: pdf
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                error: error.to_string(),
            });
        }
    }
    metrics::counter!("bulletin_import_failures_total").increment(failures.len() as u64);

    let zip_path = settings.paths().download_dir.join(ARCHIVE_NAME);
    {
        let pdfs = pdfs.clone();
        let zip_path = zip_path.clone();
        blocking(move || {
            write_archive(&pdfs, &zip_path)?;
            Ok(())
        })
        .await?;
    }

    // Intermediate DOCX files are not part of the deliverable.
    for document in &documents {
        if let Err(error) = std::fs::remove_file(document) {
            tracing::warn!(file = %document.display(), %error, "failed to remove intermediate");
        }
    }

    Ok(GenerationOutcome {
        template_key: config.key,
        generated: documents.len(),
        zip_path,
        failures,
    })
}

/// Populate a bulletin workbook from a raw grade export and an appreciation
/// document, then run the bulletin pipeline over it. Returns the populated
/// workbook path alongside the pipeline outcome.
pub(crate) async fn integrate_and_generate(
    state: &AppState,
    excel_path: &Path,
    word_path: &Path,
) -> Result<(PathBuf, GenerationOutcome), GenerationError> {
    let settings = state.settings();

    let export = {
        let path = excel_path.to_path_buf();
        blocking(move || RawExport::open(&path)).await?
    };
    let signature =
        classify(&export.classification_titles()).ok_or(GenerationError::UnknownTemplate)?;
    tracing::info!(template = signature.config.key, signature = signature.name, "classified raw export");

    let roster = fetch_roster(state).await?;
    let appreciations = {
        let path = word_path.to_path_buf();
        blocking(move || extract_appreciations(&path)).await?
    };
    tracing::debug!(count = appreciations.len(), "appreciations extracted");

    let rows = populate_rows(&export, signature, &roster, &appreciations);
    std::fs::create_dir_all(&settings.paths().output_dir).with_context(|| {
        format!("creating output directory {}", settings.paths().output_dir.display())
    })?;
    let workbook_path = settings
        .paths()
        .output_dir
        .join(format!("{}.xlsx", signature.config.key));
    {
        let path = workbook_path.clone();
        blocking(move || write_workbook(&rows, &path)).await?;
    }
    tracing::info!(workbook = %workbook_path.display(), "populated workbook written");

    let outcome = generate_and_import(state, &workbook_path).await?;
    Ok((workbook_path, outcome))
}

/// The three reference reads run concurrently; any failure aborts the caller.
async fn fetch_roster(state: &AppState) -> Result<Roster, YpareoError> {
    let settings = state.settings();
    let ypareo = state.ypareo();
    let (learners, groups, absences) = tokio::try_join!(
        ypareo.fetch_learners(),
        ypareo.fetch_groups(),
        ypareo.fetch_absences(
            &settings.ypareo().absence_from,
            &settings.ypareo().absence_to
        ),
    )?;
    Ok(Roster::build(&learners, &groups, &absences))
}

/// Fill the row fields the spreadsheet left empty from the reference data.
/// Values already present in the upload win.
fn enrich_record(record: &mut StudentRecord, roster: &Roster) {
    let Some(profile) = roster.lookup(&record.name) else {
        return;
    };

    fill(&mut record.birth_date, &profile.birth_date);
    fill(&mut record.site, &profile.site);
    fill(&mut record.group_code, &profile.group_code);
    fill(&mut record.group_name, &profile.group_name);
    fill(&mut record.group_extent, &profile.group_extent);
    fill(&mut record.justified, &profile.justified_label());
    fill(&mut record.unjustified, &profile.unjustified_label());
    fill(&mut record.late, &profile.late_label());
}

fn fill(target: &mut String, value: &str) {
    if target.trim().is_empty() && !value.is_empty() {
        *target = value.to_string();
    }
}

async fn import_bulletin(ypareo: &YpareoClient, pdf: &Path) -> anyhow::Result<()> {
    let source = pdf.with_extension("docx");
    let learner_code = extract_learner_code(&source)?
        .with_context(|| format!("no learner code found in {}", source.display()))?;

    let content = std::fs::read(pdf)
        .with_context(|| format!("reading converted bulletin {}", pdf.display()))?;
    let payload = DocumentImport {
        content: base64::engine::general_purpose::STANDARD.encode(content),
        document_name: pdf
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime_type: "application/pdf".to_string(),
        extension: "pdf".to_string(),
    };

    ypareo.import_document(learner_code, &payload).await?;
    tracing::info!(learner_code, file = %payload.document_name, "bulletin imported");
    Ok(())
}

async fn blocking<T, F>(task: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .context("blocking pipeline task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::ypareo::{AbsenceCollection, GroupCollection, LearnerCollection};

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
        let absences: AbsenceCollection =
            serde_json::from_str(r#"{"a": {"codeApprenant": 4016, "duree": 90, "isJustifie": true}}"#)
                .unwrap();
        Roster::build(&learners, &groups, &absences)
    }

    fn record(name: &str, birth_date: &str) -> StudentRecord {
        let rows = vec![
            vec![String::new(); 4],
            vec![
                String::new(),
                "CodeApprenant".to_string(),
                "Nom".to_string(),
                "DatedeNaissance".to_string(),
            ],
            vec![
                String::new(),
                "4016".to_string(),
                name.to_string(),
                birth_date.to_string(),
            ],
        ];
        GradeSheet::from_rows(rows).student_records().remove(0)
    }

    #[test]
    fn enrichment_fills_only_empty_fields() {
        let roster = roster();
        let mut record = record("DURAND Alice", "31/12/2000");
        enrich_record(&mut record, &roster);

        // The uploaded value wins over the reference data.
        assert_eq!(record.birth_date, "31/12/2000");
        assert_eq!(record.site, "Paris");
        assert_eq!(record.group_name, "P-M1 MAPI ALT 1");
        assert_eq!(record.justified, "1h30");
        assert_eq!(record.unjustified, "00h00");
    }

    #[test]
    fn unmatched_students_are_left_untouched() {
        let roster = roster();
        let mut record = record("INCONNU Jean", "");
        enrich_record(&mut record, &roster);
        assert_eq!(record.birth_date, "");
        assert_eq!(record.site, "");
    }

    #[tokio::test]
    async fn reference_fetch_failure_aborts_the_whole_run() {
        let _guard = crate::test_support::env_lock().await;
        crate::test_support::set_test_env();
        let settings = crate::core::config::Settings::load().expect("settings");
        let state = crate::test_support::build_state(settings);

        // A classifiable workbook; the unroutable Yparéo endpoint fails first.
        let signature = &crate::bulletins::template::SIGNATURES[0];
        let mut title_row = vec![String::new(); 2];
        title_row.extend(signature.headers.iter().map(|h| h.to_string()));
        let header_row = vec!["CodeApprenant".to_string(), "Nom".to_string()];
        let rows = vec![title_row, header_row];

        let dir = tempfile::tempdir().expect("tempdir");
        let upload = dir.path().join("grades.xlsx");
        write_workbook(&rows, &upload).expect("workbook");

        let error = generate_and_import(&state, &upload).await.unwrap_err();
        assert!(matches!(error, GenerationError::Reference(_)));
    }
}
