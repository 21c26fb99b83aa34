//! Core error types for the reconciliation engine.
//!
//! Most failure modes in this engine are recovered locally (unlinkable
//! flows, non-convergent rate solves) and surface only in the report
//! diagnostics; the types here cover the batch boundary and the report
//! serialization edge.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Report serialization failed: {0}")]
    Serialization(String),
}

/// Validation errors raised against individual records at the batch
/// boundary. A failing record is excluded and counted, never fatal to
/// the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("Field '{field}' must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("Net amount {net} contradicts flow direction '{direction}'")]
    DirectionMismatch { net: Decimal, direction: String },

    #[error("Gross amount {gross} is smaller than |net amount| {net}")]
    GrossBelowNet { gross: Decimal, net: Decimal },

    #[error("Unknown platform label: {0}")]
    UnknownPlatform(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
