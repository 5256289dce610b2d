//! Input validation for proxy check requests
//!
//! Turns the untrusted request body into a [`ProxyEndpoint`]. Everything here
//! runs before any network activity, so a rejected request never reaches the
//! dispatcher.

use crate::error::CheckError;
use crate::proxy::models::{ProxyAuth, ProxyEndpoint, ProxyType};
use serde::Deserialize;
use serde_json::Value;
use std::net::Ipv6Addr;

/// Raw check request as posted by clients: `{type, ip, port, username?, password?}`
///
/// Fields are kept as loose JSON values because callers send the port both as
/// a number and as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(rename = "type", default)]
    pub proxy_type: Option<Value>,
    #[serde(default)]
    pub ip: Option<Value>,
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

impl CheckRequest {
    pub fn new(proxy_type: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            proxy_type: Some(Value::String(proxy_type.into())),
            ip: Some(Value::String(ip.into())),
            port: Some(Value::from(port)),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.map(Value::String);
        self.password = password.map(Value::String);
        self
    }

    /// Parse a request body; a body that is not a JSON object counts as incomplete
    pub fn from_json(body: &[u8]) -> Result<Self, CheckError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).map_err(|_| CheckError::InvalidInput)
            }
            _ => Err(CheckError::InvalidInput),
        }
    }

    /// Validate the request and build the endpoint to probe
    pub fn validate(&self) -> Result<ProxyEndpoint, CheckError> {
        let (Some(proxy_type), Some(ip), Some(port)) = (
            present(&self.proxy_type),
            present(&self.ip),
            present(&self.port),
        ) else {
            return Err(CheckError::InvalidInput);
        };

        let protocol: ProxyType = match proxy_type {
            Value::String(s) => s.parse()?,
            other => return Err(CheckError::UnsupportedProtocol(other.to_string())),
        };

        let host = parse_host(ip)?;
        let port = parse_port(port)?;

        let mut endpoint = ProxyEndpoint::new(protocol, host, port);
        if let Some(username) = present(&self.username).and_then(text) {
            let password = present(&self.password).and_then(text);
            endpoint = endpoint.with_auth(ProxyAuth::new(username, password));
        }

        Ok(endpoint)
    }
}

/// Presence in the loose sense clients expect: null, false, 0 and "" are missing
fn present(value: &Option<Value>) -> Option<&Value> {
    match value.as_ref()? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_host(value: &Value) -> Result<String, CheckError> {
    let Value::String(raw) = value else {
        return Err(CheckError::InvalidInput);
    };
    let host = raw.trim();

    if host.is_empty()
        || host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '@' | '?' | '#'))
    {
        return Err(CheckError::InvalidInput);
    }

    // Bare IPv6 literals need brackets to survive in a URL authority
    if host.parse::<Ipv6Addr>().is_ok() {
        return Ok(format!("[{}]", host));
    }

    Ok(host.to_string())
}

fn parse_port(value: &Value) -> Result<u16, CheckError> {
    let port = match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };

    match port {
        Some(p) if p > 0 => Ok(p),
        _ => Err(CheckError::InvalidInput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> CheckRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let endpoint = request(json!({"type": "http", "ip": "1.2.3.4", "port": 8080}))
            .validate()
            .unwrap();
        assert_eq!(endpoint, ProxyEndpoint::new(ProxyType::Http, "1.2.3.4", 8080));
    }

    #[test]
    fn test_port_as_string() {
        let endpoint = request(json!({"type": "socks5", "ip": "1.2.3.4", "port": "1080"}))
            .validate()
            .unwrap();
        assert_eq!(endpoint.port, 1080);
        assert_eq!(endpoint.protocol, ProxyType::Socks5);
    }

    #[test]
    fn test_missing_fields_are_invalid_input() {
        for body in [
            json!({"ip": "1.2.3.4", "port": 8080}),
            json!({"type": "http", "port": 8080}),
            json!({"type": "http", "ip": "1.2.3.4"}),
            json!({"type": "", "ip": "1.2.3.4", "port": 8080}),
            json!({"type": "http", "ip": null, "port": 8080}),
            json!({"type": "http", "ip": "1.2.3.4", "port": 0}),
            json!({}),
        ] {
            assert_eq!(
                request(body.clone()).validate(),
                Err(CheckError::InvalidInput),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_missing_fields_win_over_unknown_protocol() {
        let result = request(json!({"type": "ftp", "ip": "1.2.3.4"})).validate();
        assert_eq!(result, Err(CheckError::InvalidInput));
    }

    #[test]
    fn test_unsupported_protocol() {
        let result = request(json!({"type": "FTP", "ip": "1.2.3.4", "port": 21})).validate();
        assert_eq!(result, Err(CheckError::UnsupportedProtocol("ftp".to_string())));

        let result = request(json!({"type": 5, "ip": "1.2.3.4", "port": 21})).validate();
        assert!(matches!(result, Err(CheckError::UnsupportedProtocol(_))));
    }

    #[test]
    fn test_protocol_is_normalized() {
        let endpoint = request(json!({"type": "SOCKS4", "ip": "1.2.3.4", "port": 1080}))
            .validate()
            .unwrap();
        assert_eq!(endpoint.protocol, ProxyType::Socks4);
        assert_eq!(endpoint.authority(), "socks4://1.2.3.4:1080");
    }

    #[test]
    fn test_port_out_of_range() {
        for port in [json!(70000), json!(-1), json!(80.5), json!("abc"), json!("65536")] {
            let result = request(json!({"type": "http", "ip": "1.2.3.4", "port": port})).validate();
            assert_eq!(result, Err(CheckError::InvalidInput));
        }
    }

    #[test]
    fn test_malformed_host() {
        for ip in ["1.2.3.4/path", "user@1.2.3.4", "1.2 .3.4", "   "] {
            let result = request(json!({"type": "http", "ip": ip, "port": 80})).validate();
            assert_eq!(result, Err(CheckError::InvalidInput), "host: {:?}", ip);
        }
    }

    #[test]
    fn test_hostname_and_ipv6_hosts() {
        let endpoint = request(json!({"type": "http", "ip": "proxy.example.com", "port": 3128}))
            .validate()
            .unwrap();
        assert_eq!(endpoint.host, "proxy.example.com");

        let endpoint = request(json!({"type": "http", "ip": "::1", "port": 3128}))
            .validate()
            .unwrap();
        assert_eq!(endpoint.authority(), "http://[::1]:3128");
    }

    #[test]
    fn test_credentials() {
        let endpoint = request(json!({
            "type": "http", "ip": "1.2.3.4", "port": 8080,
            "username": "user", "password": "pass"
        }))
        .validate()
        .unwrap();
        let auth = endpoint.auth.unwrap();
        assert_eq!(auth.username, "user");
        assert_eq!(auth.password.as_deref(), Some("pass"));
    }

    #[test]
    fn test_username_without_password() {
        let endpoint = request(json!({
            "type": "http", "ip": "1.2.3.4", "port": 8080,
            "username": "anon", "password": ""
        }))
        .validate()
        .unwrap();
        assert_eq!(endpoint.authority(), "http://anon@1.2.3.4:8080");
    }

    #[test]
    fn test_password_without_username_is_ignored() {
        let endpoint = request(json!({
            "type": "http", "ip": "1.2.3.4", "port": 8080, "password": "pass"
        }))
        .validate()
        .unwrap();
        assert!(endpoint.auth.is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            CheckRequest::from_json(b"not json"),
            Err(CheckError::InvalidInput)
        ));
        assert!(matches!(
            CheckRequest::from_json(b""),
            Err(CheckError::InvalidInput)
        ));
        let bodies: [&[u8]; 4] = [
            br#"["http","1.2.3.4",8080]"#,
            br#""http://1.2.3.4:8080""#,
            b"null",
            b"42",
        ];
        for body in bodies {
            assert!(
                matches!(CheckRequest::from_json(body), Err(CheckError::InvalidInput)),
                "body: {}",
                String::from_utf8_lossy(body)
            );
        }
        assert!(CheckRequest::from_json(br#"{"type":"http"}"#).is_ok());
    }

    #[test]
    fn test_builder_round_trip_through_validation() {
        let endpoint = CheckRequest::new("https", "10.0.0.1", 443)
            .with_credentials(Some("u".to_string()), Some("p".to_string()))
            .validate()
            .unwrap();
        assert_eq!(endpoint.authority(), "https://u:p@10.0.0.1:443");
    }
}
