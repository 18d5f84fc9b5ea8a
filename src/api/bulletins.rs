//! Spreadsheet upload endpoint driving the full bulletin pipeline, and the
//! download endpoint serving the resulting archive.

use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::GenerateReport;
use crate::services::generation;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

pub(crate) async fn generate_and_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let max_bytes = state.settings().bulletin().max_upload_size_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            file_bytes = Some(read_file_field(&mut field, max_bytes).await?);
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let filename = sanitize_filename(filename.as_deref().unwrap_or("grades.xlsx"));
    validate_spreadsheet_name(&filename)?;

    let upload_path = store_upload(&state, &filename, &file_bytes).await?;
    tracing::info!(file = %filename, size = file_bytes.len(), "spreadsheet received");

    let outcome = generation::generate_and_import(&state, &upload_path).await?;
    Ok(report_response(outcome, None))
}

/// Raw export plus appreciation Word document; populates a bulletin workbook
/// from the pair, then runs the full pipeline over it.
pub(crate) async fn upload_and_integrate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let max_bytes = state.settings().bulletin().max_upload_size_mb * 1024 * 1024;
    let mut excel: Option<(String, Vec<u8>)> = None;
    let mut word: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "excel_file" => {
                let filename =
                    sanitize_filename(field.file_name().unwrap_or("export.xlsx"));
                excel = Some((filename, read_file_field(&mut field, max_bytes).await?));
            }
            "word_file" => {
                let filename =
                    sanitize_filename(field.file_name().unwrap_or("appreciations.docx"));
                word = Some((filename, read_file_field(&mut field, max_bytes).await?));
            }
            _ => {}
        }
    }

    let (excel_name, excel_bytes) =
        excel.ok_or_else(|| ApiError::BadRequest("excel_file is required".to_string()))?;
    let (word_name, word_bytes) =
        word.ok_or_else(|| ApiError::BadRequest("word_file is required".to_string()))?;
    validate_spreadsheet_name(&excel_name)?;
    if !word_name.to_ascii_lowercase().ends_with(".docx") {
        return Err(ApiError::BadRequest(
            "word_file must be a .docx document".to_string(),
        ));
    }

    let excel_path = store_upload(&state, &excel_name, &excel_bytes).await?;
    let word_path = store_upload(&state, &word_name, &word_bytes).await?;
    tracing::info!(export = %excel_name, appreciations = %word_name, "integration pair received");

    let (workbook_path, outcome) =
        generation::integrate_and_generate(&state, &excel_path, &word_path).await?;
    Ok(report_response(outcome, Some(workbook_path.display().to_string())))
}

async fn read_file_field(
    field: &mut axum::extract::multipart::Field<'_>,
    max_bytes: u64,
) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
    {
        let next_size = bytes.len() as u64 + chunk.len() as u64;
        if next_size > max_bytes {
            return Err(ApiError::BadRequest(format!(
                "File size exceeds {}MB limit",
                max_bytes / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn store_upload(
    state: &AppState,
    filename: &str,
    bytes: &[u8],
) -> Result<std::path::PathBuf, ApiError> {
    let upload_dir = state.settings().paths().upload_dir.clone();
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to prepare upload directory"))?;
    // Unique stored name so concurrent uploads with the same filename never clash.
    let stored_name = format!("{}_{}", uuid::Uuid::new_v4(), filename);
    let path = upload_dir.join(&stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to store uploaded file"))?;
    Ok(path)
}

fn report_response(outcome: generation::GenerationOutcome, workbook_path: Option<String>) -> Response {
    let status = if outcome.failures.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    let report = GenerateReport {
        message: if outcome.failures.is_empty() {
            "Bulletins générés et importés avec succès".to_string()
        } else {
            "Bulletins générés, certains imports ont échoué".to_string()
        },
        template: outcome.template_key.to_string(),
        generated: outcome.generated,
        zip_path: outcome.zip_path.display().to_string(),
        workbook_path,
        errors: outcome.failures,
    };

    (status, Json(report)).into_response()
}

pub(crate) async fn download_zip(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    if filename != sanitize_filename(&filename) {
        return Err(ApiError::BadRequest("Invalid archive name".to_string()));
    }

    let path = state.settings().paths().download_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("Archive {filename} introuvable")));
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to read archive")),
    };

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Strip any path components from a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).replace("..", "")
}

fn validate_spreadsheet_name(filename: &str) -> Result<(), ApiError> {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ApiError::BadRequest(
            "Only spreadsheet uploads are accepted (xlsx, xls, xlsm, xlsb, ods)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_path_components() {
        assert_eq!(sanitize_filename("notes.xlsx"), "notes.xlsx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a\\b\\notes.xlsx"), "notes.xlsx");
        assert_eq!(sanitize_filename("..hidden.xlsx"), "hidden.xlsx");
    }

    #[test]
    fn spreadsheet_extensions_enforced() {
        assert!(validate_spreadsheet_name("notes.xlsx").is_ok());
        assert!(validate_spreadsheet_name("notes.ods").is_ok());
        assert!(validate_spreadsheet_name("notes.exe").is_err());
        assert!(validate_spreadsheet_name("notes").is_err());
    }
}
