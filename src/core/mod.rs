//! Core business logic abstractions

pub mod config;
pub mod converter;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use converter::{CurrencyConverter, convert, list_currencies};
pub use error::{ConverterError, ConverterResult, Fault};
pub use rates::{BASE_CURRENCY, BASE_RATE, CurrencyRate, RateSource, RateTable};
