use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Deal, DealId, Decimal, WeekStatus};
use crate::engine::{ReconciliationReport, TimelineFilter, WeekOption, WeeklyRollup};
use crate::error::AppError;
use crate::orchestration::TimelineView;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSummary {
    pub id: DealId,
    pub partner: String,
    pub week_number: u32,
    pub total_leads: u32,
    pub invalid: u32,
    pub resolved_invalid: u32,
    pub invalid_rate: Decimal,
    pub final_bill: Decimal,
    pub balance: Decimal,
    pub status: WeekStatus,
    pub version: u64,
}

impl From<&Deal> for DealSummary {
    fn from(deal: &Deal) -> Self {
        Self {
            id: deal.id.clone(),
            partner: deal.partner.clone(),
            week_number: deal.week_number,
            total_leads: deal.total_leads,
            invalid: deal.invalid,
            resolved_invalid: deal.resolved_invalid,
            invalid_rate: deal.invalid_rate().round_dp(2),
            final_bill: deal.final_bill,
            balance: deal.balance,
            status: deal.status,
            version: deal.version,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub date: Option<String>,
    pub amount: Option<String>,
}

pub async fn list_deals(State(state): State<AppState>) -> Result<Json<Vec<DealSummary>>, AppError> {
    let deals = state.service.list_deals().await?;
    Ok(Json(deals.iter().map(DealSummary::from).collect()))
}

pub async fn get_deal(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Deal>, AppError> {
    let deal = state.service.get_deal(&DealId::new(id)).await?;
    Ok(Json(deal))
}

pub async fn get_timeline(
    Path(id): Path<String>,
    Query(params): Query<TimelineQuery>,
    State(state): State<AppState>,
) -> Result<Json<TimelineView>, AppError> {
    let filter = TimelineFilter {
        date_contains: params.date,
        amount_contains: params.amount,
    };
    let view = state.service.timeline(&DealId::new(id), &filter).await?;
    Ok(Json(view))
}

pub async fn get_rollup(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WeeklyRollup>, AppError> {
    let rollup = state.service.rollup(&DealId::new(id)).await?;
    Ok(Json(rollup))
}

pub async fn get_reconciliation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ReconciliationReport>, AppError> {
    let report = state.service.reconcile(&DealId::new(id)).await?;
    Ok(Json(report))
}

pub async fn list_weeks(State(state): State<AppState>) -> Result<Json<Vec<WeekOption>>, AppError> {
    let weeks = state.service.week_options().await?;
    Ok(Json(weeks))
}
