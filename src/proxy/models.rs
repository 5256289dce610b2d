//! Proxy data models

use crate::error::CheckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proxy protocol enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyType {
    /// SOCKS proxies are tunnelled, everything else goes through the client's native proxy
    pub fn is_socks(&self) -> bool {
        matches!(self, ProxyType::Socks4 | ProxyType::Socks5)
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for ProxyType {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks4" => Ok(ProxyType::Socks4),
            "socks5" => Ok(ProxyType::Socks5),
            other => Err(CheckError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Proxy authentication credentials
///
/// A username may be supplied on its own, in which case the proxy URL carries
/// `user@` with no password segment.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: Option<String>,
}

impl ProxyAuth {
    pub fn new(username: String, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Percent-encoded `user[:pass]@` prefix for a proxy URL
    pub fn userinfo(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "{}:{}@",
                urlencoding::encode(&self.username),
                urlencoding::encode(password)
            ),
            None => format!("{}@", urlencoding::encode(&self.username)),
        }
    }
}

impl fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A single proxy to check, built fresh from each request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub protocol: ProxyType,
    pub host: String,
    pub port: u16,
    pub auth: Option<ProxyAuth>,
}

impl ProxyEndpoint {
    /// Create a new endpoint without authentication
    pub fn new(protocol: ProxyType, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            auth: None,
        }
    }

    pub fn with_auth(mut self, auth: ProxyAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Proxy authority of the form `protocol://[user[:pass]@]host:port`
    pub fn authority(&self) -> String {
        let auth_part = self.auth.as_ref().map_or(String::new(), ProxyAuth::userinfo);
        format!("{}://{}{}:{}", self.protocol, auth_part, self.host, self.port)
    }

    /// `host:port` without scheme or credentials, safe to log
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.address())
    }
}

/// Geolocation reported by the probe target for the proxy's exit address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GeoLocation {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub isp: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// Category of a failed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportTimeout,
    /// Reported to callers with the timeout wording for compatibility
    ConnectionReset,
    TransportRefused,
    TransportProtocolMismatch,
    TargetReportedFailure,
    UnknownTransportError,
}

/// Failed probe with the caller-facing reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result of checking one proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success(GeoLocation),
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_working(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }
}
