//! Open Proxy Check - single proxy health check
//!
//! Routes one request through a user-supplied HTTP, HTTPS, SOCKS4 or SOCKS5
//! proxy to an IP geolocation service and reports whether the proxy works,
//! together with the exit address and its location.

pub mod error;
pub mod proxy;
pub mod server;

pub use error::{CheckError, ProbeError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
