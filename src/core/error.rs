//! Error types for rate fetching and conversion.

use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Which side of the API boundary caused a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fault {
    /// The request was invalid, e.g. an unknown currency code.
    Client,
    /// The service or its upstream feed failed.
    Server,
}

impl Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Fault::Client => "client",
                Fault::Server => "server",
            }
        )
    }
}

/// Errors that can occur while fetching rates or converting amounts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConverterError {
    /// The rate feed could not be reached or answered with a non-success status.
    #[error("Failed to fetch exchange rates from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The rate document did not match the expected schema.
    #[error("Failed to parse exchange rate document: {0}")]
    Parse(String),

    /// The requested currency code is not present in the rate table.
    #[error("Conversion to currency {0} is not available!")]
    CurrencyNotFound(String),
}

impl ConverterError {
    pub fn fault(&self) -> Fault {
        match self {
            ConverterError::CurrencyNotFound(_) => Fault::Client,
            ConverterError::Fetch { .. } | ConverterError::Parse(_) => Fault::Server,
        }
    }
}

/// Result type for rate and conversion operations.
pub type ConverterResult<T> = Result<T, ConverterError>;
