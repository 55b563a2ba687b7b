//! Domain types for the lead-generation billing ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: DealId, Geo, WeekStatus
//! - The Deal aggregate with its payments, day records and sub-deals
//! - Audit records for deductions, resolutions and closures
//! - The timeline entry variant and its stable ordering key

pub mod audit;
pub mod deal;
pub mod decimal;
pub mod entry;
pub mod ordering;
pub mod primitives;

pub use audit::{
    ClosureMode, ClosureRecord, DeductionAudit, DeductionReason, ResolutionAudit, UnknownVariant,
};
pub use deal::{DayRecord, Deal, Payment, SubDeal};
pub use decimal::Decimal;
pub use entry::TimelineEntry;
pub use ordering::{sort_entries_deterministic, TimelineOrderingKey};
pub use primitives::{DealId, Geo, WeekStatus};
