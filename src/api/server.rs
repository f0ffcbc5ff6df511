//! HTTP binding for the operation table.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{DispatchError, Dispatcher};
use crate::core::converter::CurrencyConverter;
use crate::core::error::{ConverterError, Fault};

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct ApiServer {
    converter: CurrencyConverter,
    dispatcher: Arc<Dispatcher>,
    bearer_token: Option<Arc<str>>,
}

impl ApiServer {
    pub fn new(converter: CurrencyConverter, bearer_token: Option<String>) -> Self {
        Self {
            converter,
            dispatcher: Arc::new(Dispatcher::new()),
            bearer_token: bearer_token.map(Arc::from),
        }
    }
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub fault: Fault,
    pub message: String,
}

/// Maps dispatch failures to HTTP status codes.
pub struct ApiError(DispatchError);

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DispatchError::UnknownOperation(_) => StatusCode::NOT_FOUND,
            DispatchError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            DispatchError::Encode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Converter(ConverterError::CurrencyNotFound(_)) => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::Converter(ConverterError::Fetch { .. } | ConverterError::Parse(_)) => {
                StatusCode::BAD_GATEWAY
            }
        };
        let body = ErrorBody {
            fault: self.0.fault(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Create the Axum router with all endpoints.
pub fn create_router(server: ApiServer) -> Router {
    let api = Router::new()
        .route("/operations", get(list_operations))
        .route("/api/{operation}", post(dispatch_operation))
        .route_layer(middleware::from_fn_with_state(
            server.clone(),
            require_bearer_token,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .with_state(server)
}

/// Binds `address` and serves until the process is stopped.
pub async fn serve(server: ApiServer, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "Currency API listening");
    axum::serve(listener, create_router(server)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn list_operations(State(server): State<ApiServer>) -> Json<Vec<&'static str>> {
    Json(server.dispatcher.operations())
}

async fn dispatch_operation(
    State(server): State<ApiServer>,
    Path(operation): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| DispatchError::MalformedRequest {
            operation: operation.clone(),
            reason: e.to_string(),
        })?
    };

    let response = server
        .dispatcher
        .dispatch(&server.converter, &operation, payload)
        .await
        .inspect_err(|e| {
            warn!(operation = %operation, error = %e, fault = %e.fault(), "Operation failed")
        })?;
    Ok(Json(response))
}

fn token_matches(presented: Option<&str>, expected: &str) -> bool {
    presented.is_some_and(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
}

async fn require_bearer_token(
    State(server): State<ApiServer>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = server.bearer_token.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if token_matches(presented, expected) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Rejected request without a valid bearer token");
    let body = ErrorBody {
        fault: Fault::Client,
        message: "Missing or invalid bearer token".to_string(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
