//! Audit records produced by committed deductions, resolutions and closures.

use crate::domain::{DealId, Decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Why additional leads were deducted from a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionReason {
    /// Technical issue on our platform.
    Technical,
    /// Leads sent accidentally, e.g. after closure.
    Accidental,
    /// Spam or bot traffic.
    Spam,
    /// Good-faith quality concession.
    Quality,
    /// Disputed quality, usually ending the relationship.
    Disputed,
}

impl DeductionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionReason::Technical => "technical",
            DeductionReason::Accidental => "accidental",
            DeductionReason::Spam => "spam",
            DeductionReason::Quality => "quality",
            DeductionReason::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for DeductionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeductionReason {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "technical" => Ok(DeductionReason::Technical),
            "accidental" => Ok(DeductionReason::Accidental),
            "spam" => Ok(DeductionReason::Spam),
            "quality" => Ok(DeductionReason::Quality),
            "disputed" => Ok(DeductionReason::Disputed),
            other => Err(UnknownVariant {
                kind: "deduction reason",
                value: other.to_string(),
            }),
        }
    }
}

/// How a week is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosureMode {
    #[serde(rename = "zero")]
    ZeroBalance,
    #[serde(rename = "balance")]
    RemainingBalance,
}

impl ClosureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosureMode::ZeroBalance => "zero",
            ClosureMode::RemainingBalance => "balance",
        }
    }
}

impl std::fmt::Display for ClosureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClosureMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zero" | "zero-balance" => Ok(ClosureMode::ZeroBalance),
            "balance" | "remaining-balance" => Ok(ClosureMode::RemainingBalance),
            other => Err(UnknownVariant {
                kind: "closure mode",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// A committed deduction of additional invalid leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionAudit {
    pub id: Uuid,
    pub count: u32,
    pub reason: DeductionReason,
    /// Free-form lead ids/emails documenting the deduction.
    pub affected_leads: String,
    pub note: String,
    pub bill_before: Decimal,
    pub bill_after: Decimal,
    pub recorded_at: DateTime<Utc>,
}

/// A processed batch of pending invalid leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionAudit {
    pub id: Uuid,
    pub count: u32,
    /// Verification results pasted by the operator.
    pub results: String,
    pub recorded_at: DateTime<Utc>,
}

/// Record emitted when a week transitions to Closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureRecord {
    pub id: Uuid,
    pub deal_id: DealId,
    pub mode: ClosureMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub balance_at_closure: Decimal,
    /// Closure with prejudice: the partner is flagged "Do Not Renew".
    #[serde(default)]
    pub do_not_renew: bool,
    pub closed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_parse_and_display() {
        for reason in ["technical", "accidental", "spam", "quality", "disputed"] {
            let parsed = DeductionReason::from_str(reason).unwrap();
            assert_eq!(parsed.to_string(), reason);
        }
        let err = DeductionReason::from_str("boredom").unwrap_err();
        assert_eq!(err.to_string(), "unknown deduction reason: \"boredom\"");
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&DeductionReason::Spam).unwrap();
        assert_eq!(json, "\"spam\"");
    }

    #[test]
    fn test_closure_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&ClosureMode::RemainingBalance).unwrap(),
            "\"balance\""
        );
        assert_eq!(ClosureMode::from_str("zero").unwrap(), ClosureMode::ZeroBalance);
        assert_eq!(
            ClosureMode::from_str("remaining-balance").unwrap(),
            ClosureMode::RemainingBalance
        );
        assert!(ClosureMode::from_str("partial").is_err());
    }
}
