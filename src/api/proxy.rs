//! Read-only pass-through of the Yparéo endpoints the frontend consumes.
//! Responses are relayed as raw JSON without reshaping.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::core::duration::is_french_date;
use crate::core::state::AppState;

pub(crate) async fn apprenants(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.ypareo().learners_path();
    let payload = state.ypareo().get_json(&path).await?;
    Ok(Json(payload))
}

pub(crate) async fn groupes(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.ypareo().groups_path();
    let payload = state.ypareo().get_json(path).await?;
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbsenceRange {
    date_deb: String,
    date_fin: String,
}

pub(crate) async fn absences(
    State(state): State<AppState>,
    Query(range): Query<AbsenceRange>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !is_french_date(&range.date_deb) || !is_french_date(&range.date_fin) {
        return Err(ApiError::BadRequest(
            "date_deb and date_fin must use the dd-mm-yyyy format".to_string(),
        ));
    }

    let path = state.ypareo().absences_path(&range.date_deb, &range.date_fin);
    let payload = state.ypareo().get_json(&path).await?;
    Ok(Json(payload))
}

pub(crate) async fn code_repertoire(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state.ypareo().repertoires_path();
    let payload = state.ypareo().get_json(path).await?;
    Ok(Json(payload))
}
