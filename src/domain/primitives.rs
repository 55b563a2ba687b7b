//! Domain primitives: DealId, Geo, WeekStatus.

use serde::{Deserialize, Serialize};

/// Identifier of one partner-week billing relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub String);

impl DealId {
    /// Create a DealId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        DealId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geography code of a billing line (e.g., "UK", "CA").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geo(pub String);

impl Geo {
    /// Create a Geo from a string.
    pub fn new(geo: impl Into<String>) -> Self {
        Geo(geo.into())
    }

    /// Get the geo code as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Geo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a billing week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekStatus {
    /// Still accepting payments, deductions and resolution.
    #[default]
    Open,
    /// Finalized. Terminal.
    Closed,
}

impl WeekStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, WeekStatus::Closed)
    }
}

impl std::fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStatus::Open => write!(f, "Open"),
            WeekStatus::Closed => write!(f, "Closed"),
        }
    }
}
