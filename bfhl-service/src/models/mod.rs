//! Request and response models for the bfhl service.

pub mod envelope;
pub mod operation;

pub use envelope::{ApiResponse, OperationOutput};
pub use operation::{Operation, ValidationError};
