//! Deal repository abstraction: snapshot reads and versioned commits.

use crate::domain::{ClosureMode, Deal, DealId, DeductionReason};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryRepository;

/// What a committed mutation did, kept alongside the new deal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MutationEvent {
    PaymentRecorded { transaction_ref: String },
    DeductionApplied { count: u32, reason: DeductionReason },
    InvalidsResolved { count: u32 },
    WeekClosed { mode: ClosureMode },
}

impl fmt::Display for MutationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationEvent::PaymentRecorded { transaction_ref } => {
                write!(f, "payment {} recorded", transaction_ref)
            }
            MutationEvent::DeductionApplied { count, reason } => {
                write!(f, "{} leads deducted ({})", count, reason)
            }
            MutationEvent::InvalidsResolved { count } => write!(f, "{} invalids resolved", count),
            MutationEvent::WeekClosed { mode } => write!(f, "week closed ({})", mode),
        }
    }
}

/// A new deal state to persist, guarded by the version it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealMutation {
    pub expected_version: u64,
    pub deal: Deal,
    pub event: MutationEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Deal not found: {0}")]
    NotFound(DealId),

    #[error("Version conflict on {deal_id}: expected {expected}, found {actual}")]
    Conflict {
        deal_id: DealId,
        expected: u64,
        actual: u64,
    },

    #[error("Seed error: {0}")]
    Seed(String),
}

/// Storage of deals.
///
/// `get` and `list` return snapshots. `commit` replaces a deal atomically and
/// must reject a mutation whose `expected_version` is stale.
#[async_trait]
pub trait DealRepository: Send + Sync + fmt::Debug {
    async fn get(&self, id: &DealId) -> Result<Option<Deal>, StoreError>;

    /// All deals, ordered by id.
    async fn list(&self) -> Result<Vec<Deal>, StoreError>;

    /// Persist a mutation and return the stored deal with its new version.
    async fn commit(&self, mutation: DealMutation) -> Result<Deal, StoreError>;
}
