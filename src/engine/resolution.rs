//! Invalid-lead resolution: moves pending invalids into the resolved tally.

use super::BillingError;
use crate::domain::{Deal, ResolutionAudit};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Resolve every pending invalid lead of `deal` against verification `results`.
///
/// Bills are untouched; billing already excluded these leads when they were
/// marked invalid.
pub fn resolve_invalids(
    deal: &Deal,
    results: &str,
    now: DateTime<Utc>,
) -> Result<Deal, BillingError> {
    let results = results.trim();
    if results.is_empty() {
        return Err(BillingError::validation("verification results are required"));
    }
    if deal.invalid == 0 {
        return Err(BillingError::validation(format!(
            "{} has no pending invalid leads",
            deal.id
        )));
    }

    let mut updated = deal.clone();
    updated.resolutions.push(ResolutionAudit {
        id: Uuid::new_v4(),
        count: deal.invalid,
        results: results.to_string(),
        recorded_at: now,
    });
    updated.resolved_invalid += deal.invalid;
    updated.invalid = 0;
    Ok(updated)
}
