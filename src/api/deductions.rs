use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{Deal, DealId, DeductionReason};
use crate::engine::DeductionRequest;
use crate::error::AppError;
use crate::orchestration::DeductionPreview;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    pub additional_invalid: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDeductionBody {
    pub count: u32,
    pub reason: String,
    #[serde(default)]
    pub affected_leads: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    pub results: String,
}

pub async fn preview_deduction(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PreviewBody>,
) -> Result<Json<DeductionPreview>, AppError> {
    let preview = state
        .service
        .preview_deduction(&DealId::new(id), body.additional_invalid)
        .await?;
    Ok(Json(preview))
}

pub async fn apply_deduction(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApplyDeductionBody>,
) -> Result<Json<Deal>, AppError> {
    let reason = DeductionReason::from_str(&body.reason)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let request = DeductionRequest {
        count: body.count,
        reason,
        affected_leads: body.affected_leads,
        note: body.note,
    };
    let deal = state
        .service
        .apply_deduction(&DealId::new(id), request)
        .await?;
    Ok(Json(deal))
}

pub async fn resolve_invalids(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<Deal>, AppError> {
    let deal = state
        .service
        .resolve_invalids(&DealId::new(id), &body.results)
        .await?;
    Ok(Json(deal))
}
