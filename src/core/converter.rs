//! Currency listing and conversion over a rate table.
use crate::core::error::{ConverterError, ConverterResult};
use crate::core::rates::{RateSource, RateTable};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Currency codes in table order, one per entry.
pub fn list_currencies(table: &RateTable) -> Vec<String> {
    table.currencies().map(str::to_string).collect()
}

/// Converts `amount` minor units of `from` into `to`.
///
/// Both rates are relative to the base currency, so the amount is first
/// brought into the base and then into the target. The result is truncated
/// toward zero, and a currency converted to itself may come back one unit
/// off due to floating point error.
pub fn convert(table: &RateTable, from: &str, to: &str, amount: i64) -> ConverterResult<i64> {
    let from_rate = table
        .rate_of(from)
        .ok_or_else(|| ConverterError::CurrencyNotFound(from.to_string()))?;
    let to_rate = table
        .rate_of(to)
        .ok_or_else(|| ConverterError::CurrencyNotFound(to.to_string()))?;

    let converted = (amount as f64 / from_rate) * to_rate;
    debug!(from_rate, to_rate, converted, "Computed conversion");
    Ok(converted as i64)
}

/// Runs each operation against a freshly fetched rate table.
#[derive(Clone)]
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source }
    }

    #[instrument(name = "AvailableCurrencies", skip(self))]
    pub async fn available_currencies(&self) -> ConverterResult<Vec<String>> {
        let table = self.source.fetch_rates().await?;
        let currencies = list_currencies(&table);
        info!(count = currencies.len(), as_of = %table.time, "Listed currencies");
        Ok(currencies)
    }

    pub async fn convert(&self, from: &str, to: &str, amount: i64) -> ConverterResult<i64> {
        let (converted, _) = self.convert_with_table(from, to, amount).await?;
        Ok(converted)
    }

    /// Converts and hands back the table the result was computed from.
    #[instrument(name = "Convert", skip(self))]
    pub async fn convert_with_table(
        &self,
        from: &str,
        to: &str,
        amount: i64,
    ) -> ConverterResult<(i64, RateTable)> {
        let table = self.source.fetch_rates().await?;
        let converted = convert(&table, from, to, amount)?;
        info!(converted, as_of = %table.time, "Converted amount");
        Ok((converted, table))
    }

    /// The full table behind the operations, for callers that display the as-of time.
    pub async fn rate_table(&self) -> ConverterResult<RateTable> {
        self.source.fetch_rates().await
    }
}

/// Serves a fixed result and counts how often it was asked.
#[cfg(test)]
pub(crate) struct StaticRateSource {
    result: ConverterResult<RateTable>,
    fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl StaticRateSource {
    pub(crate) fn new(table: RateTable) -> Self {
        Self {
            result: Ok(table),
            fetches: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(err: ConverterError) -> Self {
        Self {
            result: Err(err),
            fetches: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rates(&self) -> ConverterResult<RateTable> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.result.clone()
    }
}

#[cfg(test)]
pub(crate) fn sample_table() -> RateTable {
    use crate::core::rates::CurrencyRate;

    RateTable::new(
        "2025-03-20",
        vec![
            CurrencyRate::new("EUR", 1.0),
            CurrencyRate::new("USD", 1.1),
            CurrencyRate::new("PLN", 4.2),
        ],
    )
}
