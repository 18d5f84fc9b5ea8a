//! Manual document import: push one already-produced file into Yparéo for a
//! given learner without going through the spreadsheet pipeline.

use axum::extract::{Multipart, State};
use axum::Json;
use base64::Engine;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::ypareo::DocumentImport;
use crate::schemas::ImportResponse;

pub(crate) async fn import_bulletin(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut document_name: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut extension: Option<String> = None;
    let mut learner_code: Option<u64> = None;
    let max_bytes = state.settings().bulletin().max_upload_size_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
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
                        state.settings().bulletin().max_upload_size_mb
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file_bytes = Some(bytes);
        } else if name == "nomDocument" {
            document_name = Some(read_text(field, "nomDocument").await?);
        } else if name == "mimeType" {
            mime_type = Some(read_text(field, "mimeType").await?);
        } else if name == "extension" {
            extension = Some(read_text(field, "extension").await?);
        } else if name == "codeApprenant" {
            let text = read_text(field, "codeApprenant").await?;
            learner_code = Some(text.trim().parse::<u64>().map_err(|_| {
                ApiError::BadRequest("codeApprenant must be a valid integer".to_string())
            })?);
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let learner_code = learner_code
        .ok_or_else(|| ApiError::BadRequest("codeApprenant is required".to_string()))?;
    let document_name = document_name
        .or(filename)
        .ok_or_else(|| ApiError::BadRequest("nomDocument is required".to_string()))?;
    let mime_type = mime_type.unwrap_or_else(|| "application/pdf".to_string());
    let extension = extension.unwrap_or_else(|| "pdf".to_string());

    let payload = DocumentImport {
        content: base64::engine::general_purpose::STANDARD.encode(file_bytes),
        document_name: document_name.clone(),
        mime_type,
        extension,
    };

    state.ypareo().import_document(learner_code, &payload).await?;
    tracing::info!(learner_code, file = %document_name, "manual bulletin import completed");

    Ok(Json(ImportResponse {
        message: format!("Document {document_name} importé avec succès"),
    }))
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field.text().await.map_err(|_| ApiError::BadRequest(format!("Invalid field {name}")))
}
