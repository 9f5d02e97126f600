//! HTTP handlers for bfhl-service.

pub mod bfhl;
pub mod health;

pub use bfhl::dispatch_operation;
pub use health::{health_check, metrics_endpoint};
