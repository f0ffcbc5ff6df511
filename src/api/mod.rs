//! Transport-independent operation table.
//!
//! Each operation is registered under its wire name and takes a JSON payload,
//! so any transport (HTTP, RPC, a CLI) can route requests by name without
//! knowing the request and response types.

pub mod server;

use crate::core::converter::CurrencyConverter;
use crate::core::error::{ConverterError, Fault};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub const GET_AVAILABLE_CURRENCIES: &str = "GetAvailableCurrencies";
pub const CONVERT: &str = "Convert";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetAvailableCurrenciesRequest {}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GetAvailableCurrenciesResponse {
    pub currencies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub converted_amount: i64,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Malformed {operation} request: {reason}")]
    MalformedRequest { operation: String, reason: String },

    #[error("Failed to encode {operation} response: {reason}")]
    Encode { operation: String, reason: String },

    #[error(transparent)]
    Converter(#[from] ConverterError),
}

impl DispatchError {
    pub fn fault(&self) -> Fault {
        match self {
            DispatchError::UnknownOperation(_) | DispatchError::MalformedRequest { .. } => {
                Fault::Client
            }
            DispatchError::Encode { .. } => Fault::Server,
            DispatchError::Converter(e) => e.fault(),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// A registered operation: decodes its payload, runs it, encodes the response.
pub type Handler =
    for<'a> fn(&'a CurrencyConverter, Value) -> BoxFuture<'a, DispatchResult<Value>>;

fn decode<T: DeserializeOwned>(operation: &str, payload: Value) -> DispatchResult<T> {
    // Transports without a body hand over null
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|e| DispatchError::MalformedRequest {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

fn encode<T: Serialize>(operation: &str, response: &T) -> DispatchResult<Value> {
    serde_json::to_value(response).map_err(|e| DispatchError::Encode {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

fn get_available_currencies(
    converter: &CurrencyConverter,
    payload: Value,
) -> BoxFuture<'_, DispatchResult<Value>> {
    async move {
        let _request: GetAvailableCurrenciesRequest = decode(GET_AVAILABLE_CURRENCIES, payload)?;
        let currencies = converter.available_currencies().await?;
        encode(
            GET_AVAILABLE_CURRENCIES,
            &GetAvailableCurrenciesResponse { currencies },
        )
    }
    .boxed()
}

fn convert(converter: &CurrencyConverter, payload: Value) -> BoxFuture<'_, DispatchResult<Value>> {
    async move {
        let request: ConvertRequest = decode(CONVERT, payload)?;
        let converted_amount = converter
            .convert(&request.from_currency, &request.to_currency, request.amount)
            .await?;
        encode(CONVERT, &ConvertResponse { converted_amount })
    }
    .boxed()
}

/// Maps operation names to their handlers.
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert(GET_AVAILABLE_CURRENCIES, get_available_currencies);
        handlers.insert(CONVERT, convert);
        Self { handlers }
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(
        &self,
        converter: &CurrencyConverter,
        operation: &str,
        payload: Value,
    ) -> DispatchResult<Value> {
        let handler = self
            .handlers
            .get(operation)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))?;
        debug!(operation, "Dispatching operation");
        handler(converter, payload).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
