//! In-memory deal repository, optionally seeded from a JSON file.

use super::{DealMutation, DealRepository, MutationEvent, StoreError};
use crate::domain::{Deal, DealId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

/// One accepted commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub deal_id: DealId,
    pub version: u64,
    pub event: MutationEvent,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    deals: BTreeMap<DealId, Deal>,
    journal: Vec<JournalEntry>,
}

/// Repository keeping every deal in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository holding `deals`.
    ///
    /// # Errors
    /// `StoreError::Seed` when two deals share an id.
    pub fn from_deals(deals: Vec<Deal>) -> Result<Self, StoreError> {
        let mut map = BTreeMap::new();
        for deal in deals {
            let id = deal.id.clone();
            if map.insert(id.clone(), deal).is_some() {
                return Err(StoreError::Seed(format!("duplicate deal id {}", id)));
            }
        }
        Ok(Self {
            inner: RwLock::new(Inner {
                deals: map,
                journal: Vec::new(),
            }),
        })
    }

    /// Load a JSON array of deals from `path`.
    pub async fn load_seed(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        let deals: Vec<Deal> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        Self::from_deals(deals)
    }

    /// Accepted commits, oldest first.
    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.inner.read().await.journal.clone()
    }
}

#[async_trait]
impl DealRepository for InMemoryRepository {
    async fn get(&self, id: &DealId) -> Result<Option<Deal>, StoreError> {
        Ok(self.inner.read().await.deals.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Deal>, StoreError> {
        Ok(self.inner.read().await.deals.values().cloned().collect())
    }

    async fn commit(&self, mutation: DealMutation) -> Result<Deal, StoreError> {
        let DealMutation {
            expected_version,
            mut deal,
            event,
        } = mutation;

        let mut inner = self.inner.write().await;
        let current = inner
            .deals
            .get(&deal.id)
            .ok_or_else(|| StoreError::NotFound(deal.id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                deal_id: deal.id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }

        deal.version = expected_version + 1;
        inner.journal.push(JournalEntry {
            deal_id: deal.id.clone(),
            version: deal.version,
            event,
            committed_at: Utc::now(),
        });
        inner.deals.insert(deal.id.clone(), deal.clone());
        Ok(deal)
    }
}
