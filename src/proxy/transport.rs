//! Transport strategies for routing the probe through a proxy
//!
//! Each protocol maps to exactly one strategy, chosen once when the transport
//! is built:
//! - `http`/`https` go through the client's native proxy support. The hop to
//!   the proxy is always plain `http://`, whatever the target scheme.
//! - `socks4`/`socks5` get a SOCKS tunnel built from the full proxy authority,
//!   applied to both HTTP and HTTPS targets.
//!
//! A strategy only ever adds one proxy to a fresh client with environment
//! proxies disabled, so a request can never be tunnelled twice.

use crate::error::ProbeError;
use crate::proxy::checker::CheckerConfig;
use crate::proxy::geo::IpApiResponse;
use crate::proxy::models::{ProxyAuth, ProxyEndpoint};
use crate::proxy::user_agent::random_user_agent;
use reqwest::{Client, ClientBuilder, Proxy as ReqwestProxy};
use tracing::debug;

/// A way of routing client traffic through a proxy
pub trait TransportStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Route every request made by `builder` through the proxy
    fn apply(&self, builder: ClientBuilder) -> reqwest::Result<ClientBuilder>;
}

/// HTTP/HTTPS proxy handled by the client's built-in proxy parameter
#[derive(Debug, Clone)]
pub struct NativeHttpProxy {
    host: String,
    port: u16,
    auth: Option<ProxyAuth>,
}

impl NativeHttpProxy {
    fn proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl TransportStrategy for NativeHttpProxy {
    fn name(&self) -> &'static str {
        "native-http-proxy"
    }

    fn apply(&self, builder: ClientBuilder) -> reqwest::Result<ClientBuilder> {
        let mut proxy = ReqwestProxy::all(self.proxy_url())?;
        if let Some(auth) = &self.auth {
            proxy = proxy.basic_auth(&auth.username, auth.password.as_deref().unwrap_or(""));
        }
        Ok(builder.no_proxy().proxy(proxy))
    }
}

/// SOCKS4/SOCKS5 tunnel built from the proxy authority string
#[derive(Debug, Clone)]
pub struct SocksTunnel {
    authority: String,
}

impl TransportStrategy for SocksTunnel {
    fn name(&self) -> &'static str {
        "socks-tunnel"
    }

    fn apply(&self, builder: ClientBuilder) -> reqwest::Result<ClientBuilder> {
        let proxy = ReqwestProxy::all(&self.authority)?;
        Ok(builder.no_proxy().proxy(proxy))
    }
}

/// Transport for a single probe; never shared between checks
#[derive(Debug, Clone)]
pub enum Transport {
    NativeHttp(NativeHttpProxy),
    Socks(SocksTunnel),
}

impl Transport {
    /// Pick the strategy for the endpoint's protocol
    pub fn for_endpoint(endpoint: &ProxyEndpoint) -> Self {
        if endpoint.protocol.is_socks() {
            Transport::Socks(SocksTunnel {
                authority: endpoint.authority(),
            })
        } else {
            Transport::NativeHttp(NativeHttpProxy {
                host: endpoint.host.clone(),
                port: endpoint.port,
                auth: endpoint.auth.clone(),
            })
        }
    }

    fn strategy(&self) -> &dyn TransportStrategy {
        match self {
            Transport::NativeHttp(strategy) => strategy,
            Transport::Socks(strategy) => strategy,
        }
    }

    pub fn name(&self) -> &'static str {
        self.strategy().name()
    }

    /// Build a fresh client routed through this transport
    pub fn client(&self, config: &CheckerConfig, user_agent: &str) -> Result<Client, ProbeError> {
        let builder = Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout);

        self.strategy()
            .apply(builder)
            .and_then(ClientBuilder::build)
            .map_err(ProbeError::Client)
    }

    /// Issue the probe request and decode the target's payload
    ///
    /// The whole exchange, body included, is bounded by `config.timeout`.
    pub async fn probe(&self, config: &CheckerConfig) -> Result<IpApiResponse, ProbeError> {
        let user_agent = random_user_agent();
        let client = self.client(config, user_agent)?;
        debug!(transport = self.name(), user_agent, target = %config.target_url, "sending probe");

        let exchange = async {
            let response = client.get(&config.target_url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ProbeError::Status(status));
            }
            Ok::<_, ProbeError>(response.json::<IpApiResponse>().await?)
        };

        match tokio::time::timeout(config.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Deadline(config.timeout)),
        }
    }
}
