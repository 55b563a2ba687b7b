pub mod service;

pub use service::{BillingService, DeductionPreview, ServiceError, TimelineView};
