use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod ypareo;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}

/// One bulletin that failed to reach the external system.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ImportFailure {
    pub(crate) file: String,
    pub(crate) error: String,
}

/// Outcome of a full generate-and-import run.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateReport {
    pub(crate) message: String,
    pub(crate) template: String,
    pub(crate) generated: usize,
    pub(crate) zip_path: String,
    /// Only the integrate flow produces a populated workbook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) workbook_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) errors: Vec<ImportFailure>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) message: String,
}
