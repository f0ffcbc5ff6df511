//! Rate table types and the rate source abstraction

use crate::core::error::ConverterResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference currency every rate is expressed against.
pub const BASE_CURRENCY: &str = "EUR";

/// Rate of the base currency against itself.
pub const BASE_RATE: f64 = 1.0;

/// Units of `currency` per one unit of the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub currency: String,
    pub rate: f64,
}

impl CurrencyRate {
    pub fn new(currency: &str, rate: f64) -> Self {
        Self {
            currency: currency.to_string(),
            rate,
        }
    }
}

/// Rates from a single fetch of the feed, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub time: String,
    pub rates: Vec<CurrencyRate>,
}

impl RateTable {
    pub fn new(time: &str, rates: Vec<CurrencyRate>) -> Self {
        Self {
            time: time.to_string(),
            rates,
        }
    }

    /// Appends the base currency entry. The append is unconditional, so a feed
    /// that already lists EUR ends up with two entries; lookups take the first.
    pub fn with_base_currency(mut self) -> Self {
        self.rates.push(CurrencyRate::new(BASE_CURRENCY, BASE_RATE));
        self
    }

    /// Rate of the first entry matching `currency`.
    pub fn rate_of(&self, currency: &str) -> Option<f64> {
        self.rates
            .iter()
            .find(|entry| entry.currency == currency)
            .map(|entry| entry.rate)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.iter().map(|entry| entry.currency.as_str())
    }

    /// The as-of date, when `time` is an ISO `YYYY-MM-DD` date.
    pub fn as_of_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.time, "%Y-%m-%d").ok()
    }
}

/// A capability that produces a fresh rate table on every call.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> ConverterResult<RateTable>;
}
