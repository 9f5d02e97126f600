//! Operation dispatcher: validated [`Operation`] in, [`OperationOutput`] out.

use crate::models::{Operation, OperationOutput, ValidationError};
use crate::services::math;
use crate::services::metrics;
use crate::services::providers::{ProviderError, TextProvider};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Appended to every AI query.
pub const ONE_WORD_INSTRUCTION: &str = " (Answer in exactly one word)";

/// Message returned to the caller for any provider failure.
pub const PROVIDER_ERROR_MESSAGE: &str = "AI provider integration error";

/// Characters removed from the AI answer.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`',
    '~', '(', ')',
];

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Operation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(e) => AppError::BadRequest(e.to_string()),
            DispatchError::Provider(_) => AppError::Upstream(PROVIDER_ERROR_MESSAGE.to_string()),
            DispatchError::Task(e) => AppError::InternalError(e.into()),
        }
    }
}

#[derive(Clone)]
pub struct OperationDispatcher {
    provider: Arc<dyn TextProvider>,
}

impl OperationDispatcher {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    /// Decode a raw request body and run the operation it names.
    pub async fn handle(&self, body: &[u8]) -> Result<OperationOutput, DispatchError> {
        let operation = Operation::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected request body");
            metrics::record_operation("unknown", "rejected");
            e
        })?;
        self.dispatch(operation).await
    }

    /// Run a validated operation.
    pub async fn dispatch(&self, operation: Operation) -> Result<OperationOutput, DispatchError> {
        let name = operation.name();
        let result = self.execute(operation).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(DispatchError::Validation(e)) => {
                tracing::debug!(operation = name, error = %e, "Operation rejected");
                "rejected"
            }
            Err(DispatchError::Provider(_)) | Err(DispatchError::Task(_)) => "failed",
        };
        metrics::record_operation(name, outcome);

        result
    }

    async fn execute(&self, operation: Operation) -> Result<OperationOutput, DispatchError> {
        match operation {
            Operation::Fibonacci(n) => math::fibonacci(n)
                .map(OperationOutput::Sequence)
                .ok_or_else(|| ValidationError::ResultOverflow("fibonacci").into()),
            Operation::Prime(candidates) => {
                // Trial division on large u64 values can run for seconds.
                let primes = tokio::task::spawn_blocking(move || {
                    candidates
                        .into_iter()
                        .filter(|n| math::is_prime(*n))
                        .map(u128::from)
                        .collect::<Vec<_>>()
                })
                .await?;
                Ok(OperationOutput::Sequence(primes))
            }
            Operation::Lcm(values) => math::lcm_of(&values)
                .map(OperationOutput::Integer)
                .ok_or_else(|| ValidationError::ResultOverflow("lcm").into()),
            Operation::Hcf(values) => Ok(OperationOutput::Integer(math::hcf_of(&values))),
            Operation::Ai(query) => Ok(OperationOutput::Word(self.ask(&query).await?)),
        }
    }

    async fn ask(&self, query: &str) -> Result<String, ProviderError> {
        let provider = self.provider.name();
        let prompt = format!("{}{}", query, ONE_WORD_INSTRUCTION);

        let start = Instant::now();
        let result = self.provider.generate(&prompt).await;
        metrics::record_provider_latency(provider, start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            tracing::error!(provider, error = %e, "AI provider call failed");
            metrics::record_provider_error(provider, e.kind());
            e
        })?;

        tracing::debug!(
            provider,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "AI provider answered"
        );

        Ok(one_word(&response.text))
    }
}

/// First whitespace-delimited token of `raw`, without punctuation.
/// An empty or all-punctuation reply yields an empty string.
pub fn one_word(raw: &str) -> String {
    raw.split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}
