pub mod closure;
pub mod deals;
pub mod deductions;
pub mod health;
pub mod payments;

use crate::orchestration::BillingService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BillingService>,
}

impl AppState {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/deals", get(deals::list_deals))
        .route("/v1/deals/:id", get(deals::get_deal))
        .route("/v1/deals/:id/timeline", get(deals::get_timeline))
        .route("/v1/deals/:id/rollup", get(deals::get_rollup))
        .route("/v1/deals/:id/reconciliation", get(deals::get_reconciliation))
        .route("/v1/deals/:id/payments", post(payments::record_payment))
        .route(
            "/v1/deals/:id/deductions/preview",
            post(deductions::preview_deduction),
        )
        .route("/v1/deals/:id/deductions", post(deductions::apply_deduction))
        .route(
            "/v1/deals/:id/invalids/resolve",
            post(deductions::resolve_invalids),
        )
        .route("/v1/deals/:id/close", post(closure::close_week))
        .route("/v1/weeks", get(deals::list_weeks))
        .layer(cors)
        .with_state(state)
}
