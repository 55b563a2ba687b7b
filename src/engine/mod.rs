//! Pure billing computations over deal snapshots.
//!
//! Nothing here performs I/O. Mutating operations take a `&Deal` and return an
//! updated clone, so a failure never leaves a deal half-written.

pub mod allocation;
pub mod closure;
pub mod cost;
pub mod deduction;
pub mod error;
pub mod payment;
pub mod rate;
pub mod reconcile;
pub mod resolution;
pub mod rollup;
pub mod timeline;
pub mod weeks;

pub use closure::{close_week, unmet_preconditions, CloseWeekRequest, ClosureConfirmations, ClosurePrecondition};
pub use cost::{compute_cost, CostBreakdown};
pub use deduction::{apply_deduction, preview_deduction, DeductionImpact, DeductionRequest};
pub use error::BillingError;
pub use payment::record_payment;
pub use rate::{parse_rate, RateComponents};
pub use reconcile::{reconcile, Discrepancy, ReconciliationCheck, ReconciliationReport};
pub use resolution::resolve_invalids;
pub use rollup::{rollup_week, rollup_week_with, RollupPolicy, WeeklyRollup};
pub use timeline::{build_timeline, build_timeline_from, deal_timeline, filter_timeline, TimelineFilter};
pub use weeks::{week_options, WeekOption};
