//! Billing service: the async boundary around the pure engine.
//!
//! Every mutation runs under its deal's lock, works on a snapshot clone and
//! lands through one versioned `commit`. Reads go straight to repository
//! snapshots and never take a lock.

use crate::config::Config;
use crate::domain::{ClosureRecord, Deal, DealId, Decimal, Payment, TimelineEntry};
use crate::engine::timeline::closing_balance;
use crate::engine::{
    self, BillingError, CloseWeekRequest, DeductionImpact, DeductionRequest, ReconciliationReport,
    TimelineFilter, WeekOption, WeeklyRollup,
};
use crate::store::{DealMutation, DealRepository, MutationEvent, StoreError};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Deal not found: {0}")]
    NotFound(DealId),
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A deal's timeline with the balances bracketing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub deal_id: DealId,
    pub opening_balance: Decimal,
    /// Closing balance of the full, unfiltered timeline.
    pub closing_balance: Decimal,
    pub entries: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionPreview {
    #[serde(flatten)]
    pub impact: DeductionImpact,
    pub bill_reduction: Decimal,
    pub threshold_pct: Decimal,
    pub exceeds_threshold: bool,
}

type DealLocks = Mutex<HashMap<DealId, Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct BillingService {
    repo: Arc<dyn DealRepository>,
    locks: Arc<DealLocks>,
    config: Config,
}

impl BillingService {
    pub fn new(repo: Arc<dyn DealRepository>, config: Config) -> Self {
        Self {
            repo,
            locks: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn list_deals(&self) -> Result<Vec<Deal>, ServiceError> {
        let deals = self.repo.list().await?;
        tracing::debug!("Listed {} deals", deals.len());
        Ok(deals)
    }

    pub async fn get_deal(&self, id: &DealId) -> Result<Deal, ServiceError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    pub async fn timeline(
        &self,
        id: &DealId,
        filter: &TimelineFilter,
    ) -> Result<TimelineView, ServiceError> {
        let deal = self.get_deal(id).await?;
        let entries = engine::deal_timeline(&deal).map_err(|e| integrity_fault(&deal, e))?;
        let closing = closing_balance(&entries, deal.opening_balance);
        let entries = if filter.is_empty() {
            entries
        } else {
            engine::filter_timeline(&entries, filter)
        };
        tracing::debug!("Timeline for {}: {} entries", id, entries.len());

        Ok(TimelineView {
            deal_id: deal.id,
            opening_balance: deal.opening_balance,
            closing_balance: closing,
            entries,
        })
    }

    pub async fn rollup(&self, id: &DealId) -> Result<WeeklyRollup, ServiceError> {
        let deal = self.get_deal(id).await?;
        let rollup = engine::rollup_week_with(&deal, &self.config.rollup_policy());
        for issue in &rollup.issues {
            tracing::warn!(
                "Rollup of {} skipped cost for {} on {}: {}",
                id,
                issue.geo,
                issue.date,
                issue.reason
            );
        }
        Ok(rollup)
    }

    pub async fn reconcile(&self, id: &DealId) -> Result<ReconciliationReport, ServiceError> {
        let deal = self.get_deal(id).await?;
        let report = engine::reconcile(&deal).map_err(|e| integrity_fault(&deal, e))?;
        if !report.is_consistent() {
            tracing::warn!(
                "Reconciliation of {} found {} discrepancies",
                id,
                report.discrepancies.len()
            );
        }
        Ok(report)
    }

    pub async fn preview_deduction(
        &self,
        id: &DealId,
        additional_invalid: u32,
    ) -> Result<DeductionPreview, ServiceError> {
        let deal = self.get_deal(id).await?;
        let impact = engine::preview_deduction(&deal, additional_invalid)?;
        let threshold_pct = self.config.invalid_threshold_pct;
        Ok(DeductionPreview {
            bill_reduction: impact.bill_reduction(),
            exceeds_threshold: impact.exceeds_threshold(threshold_pct),
            threshold_pct,
            impact,
        })
    }

    pub async fn apply_deduction(
        &self,
        id: &DealId,
        request: DeductionRequest,
    ) -> Result<Deal, ServiceError> {
        let (deal, ()) = self
            .mutate(id, "apply_deduction", |deal| {
                let updated = engine::apply_deduction(deal, &request, Utc::now())?;
                let event = MutationEvent::DeductionApplied {
                    count: request.count,
                    reason: request.reason,
                };
                Ok((updated, (), Some(event)))
            })
            .await?;
        Ok(deal)
    }

    /// Record a payment dated `date`, or today (UTC) when absent.
    pub async fn record_payment(
        &self,
        id: &DealId,
        transaction_ref: &str,
        amount: Decimal,
        date: Option<NaiveDate>,
    ) -> Result<(Deal, Payment), ServiceError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        self.mutate(id, "record_payment", |deal| {
            let (updated, payment) = engine::record_payment(deal, transaction_ref, amount, date)?;
            let event = MutationEvent::PaymentRecorded {
                transaction_ref: payment.transaction_ref.clone(),
            };
            Ok((updated, payment, Some(event)))
        })
        .await
    }

    pub async fn resolve_invalids(&self, id: &DealId, results: &str) -> Result<Deal, ServiceError> {
        let (deal, ()) = self
            .mutate(id, "resolve_invalids", |deal| {
                let updated = engine::resolve_invalids(deal, results, Utc::now())?;
                let event = MutationEvent::InvalidsResolved { count: deal.invalid };
                Ok((updated, (), Some(event)))
            })
            .await?;
        Ok(deal)
    }

    pub async fn close_week(
        &self,
        id: &DealId,
        request: CloseWeekRequest,
    ) -> Result<(Deal, ClosureRecord), ServiceError> {
        self.mutate(id, "close_week", |deal| {
            let already_closed = deal.is_closed();
            let (closed, record) = engine::close_week(deal, &request, Utc::now())?;
            let event = (!already_closed).then(|| MutationEvent::WeekClosed { mode: record.mode });
            Ok((closed, record, event))
        })
        .await
    }

    pub async fn week_options(&self) -> Result<Vec<WeekOption>, ServiceError> {
        let deals = self.repo.list().await?;
        Ok(engine::week_options(&deals))
    }

    async fn lock_for(&self, id: &DealId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    /// Run `op` on a snapshot of deal `id` under its lock and commit the result.
    ///
    /// `op` returns the new deal, a value for the caller and the event to
    /// journal. No event means nothing changed, so nothing is committed.
    async fn mutate<T, F>(
        &self,
        id: &DealId,
        operation: &'static str,
        op: F,
    ) -> Result<(Deal, T), ServiceError>
    where
        F: FnOnce(&Deal) -> Result<(Deal, T, Option<MutationEvent>), BillingError>,
    {
        // Unknown ids fail before a lock entry exists, so the map only ever
        // holds stored deals.
        self.get_deal(id).await?;
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let current = self.get_deal(id).await?;
        let (updated, value, event) = op(&current).map_err(|e| {
            tracing::warn!("{} rejected for {}: {}", operation, id, e);
            e
        })?;

        let Some(event) = event else {
            tracing::debug!("{} on {} changed nothing", operation, id);
            return Ok((current, value));
        };

        let summary = event.to_string();
        let stored = self
            .repo
            .commit(DealMutation {
                expected_version: current.version,
                deal: updated,
                event,
            })
            .await?;
        tracing::info!(
            "{} committed for {} at version {}: {}",
            operation,
            id,
            stored.version,
            summary
        );
        Ok((stored, value))
    }
}

fn integrity_fault(deal: &Deal, err: BillingError) -> BillingError {
    tracing::warn!("Ledger of {} failed verification: {}", deal.id, err);
    err
}
