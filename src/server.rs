//! HTTP API for checking a single proxy
//!
//! `POST /api/proxy-checker` takes `{type, ip, port, username?, password?}`
//! and answers with the check outcome. Every response on that route carries
//! permissive CORS headers so browser front-ends can call it directly.

use crate::error::CheckError;
use crate::proxy::models::ProbeOutcome;
use crate::proxy::{CheckRequest, CheckerConfig, ProxyChecker};
use crate::Result;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info};

/// Path of the check endpoint
pub const CHECK_PATH: &str = "/api/proxy-checker";

#[derive(Clone)]
struct AppState {
    checker: Arc<ProxyChecker>,
}

/// Body of a 400 response
#[derive(Debug, Serialize)]
pub struct RejectedBody {
    pub status: &'static str,
    pub error: String,
}

/// Geolocation block of a successful check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingData {
    pub up: bool,
    pub internet: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
}

/// Reason block of a failed check
#[derive(Debug, Serialize)]
pub struct FailedData {
    pub up: bool,
    pub reason: String,
}

/// Body of a completed check, working or not
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckBody {
    Working {
        status: &'static str,
        #[serde(rename = "isWorking")]
        is_working: bool,
        data: WorkingData,
    },
    Failed {
        status: &'static str,
        #[serde(rename = "isWorking")]
        is_working: bool,
        data: FailedData,
    },
}

impl From<ProbeOutcome> for CheckBody {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Success(location) => CheckBody::Working {
                status: "success",
                is_working: true,
                data: WorkingData {
                    up: true,
                    internet: true,
                    ip: location.ip,
                    country: location.country,
                    isp: location.isp,
                    city: location.city,
                    region_name: location.region,
                },
            },
            ProbeOutcome::Failure(failure) => CheckBody::Failed {
                status: "fail",
                is_working: false,
                data: FailedData {
                    up: false,
                    reason: failure.message,
                },
            },
        }
    }
}

/// Status code and JSON body for the result of one check
pub fn check_response(
    result: std::result::Result<ProbeOutcome, CheckError>,
) -> (StatusCode, serde_json::Value) {
    let (status, body) = match result {
        Ok(outcome) => {
            let status = if outcome.is_working() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, serde_json::to_value(CheckBody::from(outcome)))
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            serde_json::to_value(RejectedBody {
                status: "fail",
                error: err.to_string(),
            }),
        ),
    };

    (status, body.unwrap_or_default())
}

/// Build the router with the check endpoint and health probe
pub fn build_app(config: CheckerConfig) -> Router {
    let state = AppState {
        checker: Arc::new(ProxyChecker::with_config(config)),
    };

    let check_routes = Router::new()
        .route(
            CHECK_PATH,
            post(check_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ));

    Router::new()
        .merge(check_routes)
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the API on `addr` until the process is stopped
pub async fn serve(addr: SocketAddr, config: CheckerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, timeout = ?config.timeout, target = %config.target_url, "proxy checker listening");
    axum::serve(listener, build_app(config)).await?;

    Ok(())
}

async fn check_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match CheckRequest::from_json(&body).and_then(|request| request.validate()) {
        Ok(endpoint) => Ok(state.checker.check_endpoint(&endpoint).await),
        Err(err) => {
            debug!(error = %err, "rejected proxy check request");
            Err(err)
        }
    };

    let (status, body) = check_response(result);
    (status, Json(body)).into_response()
}

async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "message": "Method not allowed" })),
    )
        .into_response()
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{FailureKind, GeoLocation, ProbeFailure};
    use serde_json::json;

    #[test]
    fn test_working_response_shape() {
        let outcome = ProbeOutcome::Success(GeoLocation {
            ip: Some("203.0.113.7".to_string()),
            country: Some("Canada".to_string()),
            isp: Some("Example ISP".to_string()),
            city: Some("Toronto".to_string()),
            region: Some("Ontario".to_string()),
        });
        let (status, body) = check_response(Ok(outcome));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "isWorking": true,
                "data": {
                    "up": true,
                    "internet": true,
                    "ip": "203.0.113.7",
                    "country": "Canada",
                    "isp": "Example ISP",
                    "city": "Toronto",
                    "regionName": "Ontario"
                }
            })
        );
    }

    #[test]
    fn test_failed_response_shape() {
        let outcome = ProbeOutcome::Failure(ProbeFailure::new(
            FailureKind::TransportRefused,
            "Proxy connection refused.",
        ));
        let (status, body) = check_response(Ok(outcome));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "status": "fail",
                "isWorking": false,
                "data": { "up": false, "reason": "Proxy connection refused." }
            })
        );
    }

    #[test]
    fn test_rejected_response_shape() {
        let (status, body) = check_response(Err(CheckError::InvalidInput));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "status": "fail", "error": "Incomplete proxy details provided" })
        );

        let (status, body) =
            check_response(Err(CheckError::UnsupportedProtocol("ftp".to_string())));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported proxy protocol");
    }
}
