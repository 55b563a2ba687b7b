use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{ClosureMode, ClosureRecord, DealId, WeekStatus};
use crate::engine::{CloseWeekRequest, ClosureConfirmations};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseWeekBody {
    #[serde(default)]
    pub confirmations: ClosureConfirmations,
    pub mode: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub do_not_renew: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseWeekResponse {
    pub status: WeekStatus,
    pub version: u64,
    pub closure: ClosureRecord,
}

pub async fn close_week(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<CloseWeekBody>,
) -> Result<Json<CloseWeekResponse>, AppError> {
    let mode = body
        .mode
        .as_deref()
        .map(ClosureMode::from_str)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let request = CloseWeekRequest {
        confirmations: body.confirmations,
        mode,
        note: body.note,
        do_not_renew: body.do_not_renew,
    };

    let (deal, closure) = state.service.close_week(&DealId::new(id), request).await?;
    Ok(Json(CloseWeekResponse {
        status: deal.status,
        version: deal.version,
        closure,
    }))
}
