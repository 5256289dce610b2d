//! Proxy module for checking a single proxy
//!
//! This module provides functionality for:
//! - Validating raw check requests into proxy endpoints
//! - Routing one probe through the proxy with a protocol-specific transport
//! - Classifying the probe result into a stable set of outcomes
//! - Parsing proxy lines for the command line checker

pub mod checker;
pub mod classifier;
pub mod geo;
pub mod models;
pub mod parser;
pub mod transport;
pub mod user_agent;
pub mod validator;

pub use checker::{CheckerConfig, ProxyChecker};
pub use models::{FailureKind, GeoLocation, ProbeFailure, ProbeOutcome, ProxyAuth, ProxyEndpoint, ProxyType};
pub use transport::{Transport, TransportStrategy};
pub use validator::CheckRequest;
