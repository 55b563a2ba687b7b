use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{DealId, Decimal, Payment};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentBody {
    #[serde(alias = "txHash")]
    pub transaction_ref: String,
    pub amount: Decimal,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub deal_id: DealId,
    pub payment: Payment,
    pub balance: Decimal,
    pub version: u64,
}

pub async fn record_payment(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RecordPaymentBody>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let (deal, payment) = state
        .service
        .record_payment(&DealId::new(id), &body.transaction_ref, body.amount, body.date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            deal_id: deal.id,
            payment,
            balance: deal.balance,
            version: deal.version,
        }),
    ))
}
