use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    let response =
        RootResponse { message: api.project_name.clone(), version: api.version.clone() };

    Json(response)
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    let paths = state.settings().paths();
    if paths.template_dir.is_dir() {
        components.insert("templates".to_string(), "healthy".to_string());
    } else {
        components.insert("templates".to_string(), "missing".to_string());
        status = "degraded".to_string();
    }

    if paths.ects_json_path.is_file() {
        components.insert("ects_table".to_string(), "healthy".to_string());
    } else {
        components.insert("ects_table".to_string(), "missing".to_string());
        status = "degraded".to_string();
    }

    if state.settings().ypareo().base_url.is_empty() {
        components.insert("ypareo".to_string(), "unconfigured".to_string());
        status = "degraded".to_string();
    } else {
        components.insert("ypareo".to_string(), "configured".to_string());
    }

    Json(HealthResponse { service: "bulletin-api".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
