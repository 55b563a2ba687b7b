pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use domain::{Deal, DealId, Decimal, WeekStatus};
pub use engine::BillingError;
pub use error::AppError;
pub use orchestration::{BillingService, ServiceError};
pub use store::{DealRepository, InMemoryRepository, StoreError};
