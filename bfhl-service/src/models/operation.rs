//! Request decoding.
//!
//! The body is an object with exactly one operation key. After the key count
//! is checked, the object is decoded through the externally tagged
//! [`RawOperation`] enum and each payload is validated into an [`Operation`].

use serde::Deserialize;
use serde_json::{Number, Value};
use thiserror::Error;

/// Caller errors. The display string is the message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body must be a valid JSON object")]
    MalformedBody,

    #[error("Request must contain exactly one valid operation key")]
    InvalidOperationCount,

    #[error("Unsupported operation")]
    UnsupportedOperation,

    #[error("Invalid input for fibonacci")]
    InvalidFibonacci,

    #[error("Input must be an array for prime check")]
    PrimeNotArray,

    #[error("Input must be an array of numbers for lcm")]
    InvalidLcm,

    #[error("Input must be an array of numbers for hcf")]
    InvalidHcf,

    #[error("AI query must be a valid string")]
    InvalidAiQuery,

    #[error("Result exceeds supported numeric range for {0}")]
    ResultOverflow(&'static str),
}

/// A validated operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Number of terms to generate.
    Fibonacci(u64),
    /// Integral candidates in request order; everything else already dropped.
    Prime(Vec<u64>),
    Lcm(Vec<i128>),
    Hcf(Vec<i128>),
    Ai(String),
}

#[derive(Debug, Deserialize)]
enum RawOperation {
    #[serde(rename = "fibonacci")]
    Fibonacci(Value),
    #[serde(rename = "prime")]
    Prime(Value),
    #[serde(rename = "lcm")]
    Lcm(Value),
    #[serde(rename = "hcf")]
    Hcf(Value),
    #[serde(rename = "AI")]
    Ai(Value),
}

impl Operation {
    /// Decode and validate a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON body.
    pub fn from_value(body: Value) -> Result<Self, ValidationError> {
        let map = match body {
            Value::Object(map) => map,
            _ => return Err(ValidationError::MalformedBody),
        };

        if map.len() != 1 {
            return Err(ValidationError::InvalidOperationCount);
        }

        let raw: RawOperation = serde_json::from_value(Value::Object(map))
            .map_err(|_| ValidationError::UnsupportedOperation)?;

        raw.validate()
    }

    /// Key name as it appears in the request.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Fibonacci(_) => "fibonacci",
            Operation::Prime(_) => "prime",
            Operation::Lcm(_) => "lcm",
            Operation::Hcf(_) => "hcf",
            Operation::Ai(_) => "AI",
        }
    }
}

impl RawOperation {
    fn validate(self) -> Result<Operation, ValidationError> {
        match self {
            RawOperation::Fibonacci(value) => term_count(&value)
                .map(Operation::Fibonacci)
                .ok_or(ValidationError::InvalidFibonacci),
            RawOperation::Prime(Value::Array(items)) => Ok(Operation::Prime(
                items
                    .iter()
                    .filter_map(|v| v.as_number().and_then(integral))
                    .filter_map(|n| u64::try_from(n).ok())
                    .collect(),
            )),
            RawOperation::Prime(_) => Err(ValidationError::PrimeNotArray),
            RawOperation::Lcm(value) => integer_list(&value)
                .map(Operation::Lcm)
                .ok_or(ValidationError::InvalidLcm),
            RawOperation::Hcf(value) => integer_list(&value)
                .map(Operation::Hcf)
                .ok_or(ValidationError::InvalidHcf),
            RawOperation::Ai(Value::String(query)) => Ok(Operation::Ai(query)),
            RawOperation::Ai(_) => Err(ValidationError::InvalidAiQuery),
        }
    }
}

/// Non-negative number of terms; fractions truncate toward zero.
fn term_count(value: &Value) -> Option<u64> {
    let number = value.as_number()?;
    if let Some(n) = number.as_u64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    // `as` saturates, so huge counts land on u64::MAX and fail later on range.
    (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
}

/// Array of at least two integral numbers.
fn integer_list(value: &Value) -> Option<Vec<i128>> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    items
        .iter()
        .map(|v| v.as_number().and_then(integral))
        .collect()
}

/// Integral value of a JSON number. `7.0` counts, `7.5` does not.
fn integral(number: &Number) -> Option<i128> {
    if let Some(n) = number.as_i64() {
        return Some(n.into());
    }
    if let Some(n) = number.as_u64() {
        return Some(n.into());
    }
    let f = number.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= u64::MAX as f64).then(|| f as i128)
}
