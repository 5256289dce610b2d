//! Payload of the IP geolocation service used as probe target

use crate::proxy::models::GeoLocation;
use serde::Deserialize;

/// Default probe target, plain HTTP so no TLS is negotiated through the proxy
pub const DEFAULT_TARGET_URL: &str = "http://ip-api.com/json";

/// Response body of `GET http://ip-api.com/json`
///
/// The service answers 200 for its own failures and signals them through
/// `status: "fail"` plus a `message`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    #[serde(default)]
    pub status: String,
    pub message: Option<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    pub isp: Option<String>,
    pub city: Option<String>,
    pub region_name: Option<String>,
}

impl IpApiResponse {
    pub fn is_fail(&self) -> bool {
        self.status.eq_ignore_ascii_case("fail")
    }

    /// Geolocation fields as reported for the proxy's exit address
    pub fn into_location(self) -> GeoLocation {
        GeoLocation {
            ip: self.query,
            country: self.country,
            isp: self.isp,
            city: self.city,
            region: self.region_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload() {
        let body = r#"{
            "status": "success",
            "country": "Germany",
            "countryCode": "DE",
            "region": "HE",
            "regionName": "Hesse",
            "city": "Frankfurt am Main",
            "isp": "Hetzner Online GmbH",
            "query": "203.0.113.7"
        }"#;
        let response: IpApiResponse = serde_json::from_str(body).unwrap();
        assert!(!response.is_fail());

        let location = response.into_location();
        assert_eq!(location.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(location.country.as_deref(), Some("Germany"));
        assert_eq!(location.isp.as_deref(), Some("Hetzner Online GmbH"));
        assert_eq!(location.city.as_deref(), Some("Frankfurt am Main"));
        assert_eq!(location.region.as_deref(), Some("Hesse"));
    }

    #[test]
    fn test_fail_payload() {
        let body = r#"{"status":"fail","message":"reserved range","query":"10.0.0.1"}"#;
        let response: IpApiResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_fail());
        assert_eq!(response.message.as_deref(), Some("reserved range"));
        assert!(response.into_location().country.is_none());
    }

    #[test]
    fn test_missing_status_is_not_fail() {
        let response: IpApiResponse = serde_json::from_str("{}").unwrap();
        assert!(!response.is_fail());
    }
}
