//! Maps probe results onto the outcomes reported to callers
//!
//! Transport errors are matched in a fixed order and the first match wins:
//!
//! | condition                                   | reason                                            |
//! |---------------------------------------------|---------------------------------------------------|
//! | connection reset                            | `Proxy connection timed out.`                     |
//! | connection aborted                          | `Proxy connection timed out.`                     |
//! | timeout (error kind, flag or message text)  | `Proxy connection timed out.`                     |
//! | connection refused or SOCKS connect failure | `Proxy connection refused.`                       |
//! | tunnel or stream-abort signature            | `Connection reset by proxy (protocol mismatch).`  |
//! | anything else                               | the raw error message                             |
//!
//! Callers only see the reason text, so these strings are part of the API.

use crate::error::ProbeError;
use crate::proxy::geo::IpApiResponse;
use crate::proxy::models::{FailureKind, ProbeFailure, ProbeOutcome};
use std::error::Error as StdError;
use std::io::ErrorKind;

pub const TIMEOUT_REASON: &str = "Proxy connection timed out.";
pub const REFUSED_REASON: &str = "Proxy connection refused.";
pub const PROTOCOL_MISMATCH_REASON: &str = "Connection reset by proxy (protocol mismatch).";

/// Lowercase fragments of a refused connection; SOCKS connectors drop the io
/// error and only report that the underlying connection failed
const REFUSED_SIGNATURES: &[&str] = &[
    "connection refused",
    "failed to create underlying connection",
];

/// Lowercase fragments seen when the proxy speaks a different protocol or
/// drops the stream mid-tunnel
const PROTOCOL_MISMATCH_SIGNATURES: &[&str] = &[
    "stream aborted",
    "unsuccessful tunnel",
    "socket hang up",
    "connection closed before message completed",
    "invalid response version",
    "invalid http version",
];

/// Turn the probe result into the single outcome of this check
pub fn classify(result: Result<IpApiResponse, ProbeError>) -> ProbeOutcome {
    match result {
        Ok(payload) if payload.is_fail() => {
            let message = payload.message.as_deref().unwrap_or("unknown error");
            ProbeOutcome::Failure(ProbeFailure::new(
                FailureKind::TargetReportedFailure,
                format!("IP-API check failed: {}", message),
            ))
        }
        Ok(payload) => ProbeOutcome::Success(payload.into_location()),
        Err(err) => ProbeOutcome::Failure(classify_error(&err)),
    }
}

/// Classify a failed probe
pub fn classify_error(err: &ProbeError) -> ProbeFailure {
    match err {
        ProbeError::Deadline(_) => ProbeFailure::new(FailureKind::TransportTimeout, TIMEOUT_REASON),
        ProbeError::Status(_) => {
            ProbeFailure::new(FailureKind::UnknownTransportError, err.to_string())
        }
        ProbeError::Client(source) | ProbeError::Request(source) => classify_transport(source),
    }
}

/// Classify any transport error by walking its source chain
pub fn classify_transport(err: &(dyn StdError + 'static)) -> ProbeFailure {
    let io_kind = sources(err).find_map(|e| e.downcast_ref::<std::io::Error>().map(|io| io.kind()));
    let timed_out = sources(err)
        .any(|e| e.downcast_ref::<reqwest::Error>().is_some_and(reqwest::Error::is_timeout));

    classify_signals(io_kind, timed_out, &chain_message(err))
}

fn classify_signals(io_kind: Option<ErrorKind>, timed_out: bool, message: &str) -> ProbeFailure {
    let lower = message.to_lowercase();

    if io_kind == Some(ErrorKind::ConnectionReset) || lower.contains("connection reset") {
        return ProbeFailure::new(FailureKind::ConnectionReset, TIMEOUT_REASON);
    }
    if io_kind == Some(ErrorKind::ConnectionAborted) || lower.contains("connection aborted") {
        return ProbeFailure::new(FailureKind::TransportTimeout, TIMEOUT_REASON);
    }
    if timed_out
        || io_kind == Some(ErrorKind::TimedOut)
        || lower.contains("timeout")
        || lower.contains("timed out")
    {
        return ProbeFailure::new(FailureKind::TransportTimeout, TIMEOUT_REASON);
    }
    if io_kind == Some(ErrorKind::ConnectionRefused)
        || REFUSED_SIGNATURES
            .iter()
            .any(|signature| lower.contains(signature))
    {
        return ProbeFailure::new(FailureKind::TransportRefused, REFUSED_REASON);
    }
    if PROTOCOL_MISMATCH_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
    {
        return ProbeFailure::new(FailureKind::TransportProtocolMismatch, PROTOCOL_MISMATCH_REASON);
    }

    ProbeFailure::new(FailureKind::UnknownTransportError, message)
}

fn sources<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

/// Messages of the whole chain joined with `: `, skipping repeats
fn chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = String::new();
    for source in sources(err) {
        let text = source.to_string();
        if text.is_empty() || message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}
