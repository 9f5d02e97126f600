//! Success envelope. Failures are rendered by `service_core::error::AppError`.

use serde::Serialize;

/// Uniform success wrapper returned by `/health` and `/bfhl`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub official_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(official_email: impl Into<String>, data: T) -> Self {
        Self {
            is_success: true,
            official_email: official_email.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Health body: success flag and contact email, no data.
    pub fn health(official_email: impl Into<String>) -> Self {
        Self {
            is_success: true,
            official_email: official_email.into(),
            data: None,
        }
    }
}

/// Result of a single operation, serialised as the bare value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    /// Fibonacci terms or the filtered primes.
    Sequence(Vec<u128>),
    /// LCM or HCF.
    Integer(u128),
    /// One-word AI answer.
    Word(String),
}
