use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use open_proxy_check::{
    proxy::{parser, CheckerConfig, ProxyChecker, ProxyType},
    server,
};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

/// Check whether a proxy works by routing a geolocation lookup through it
#[derive(Parser)]
#[command(name = "open-proxy-check")]
#[command(about = "Check whether a proxy works by routing a geolocation lookup through it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Timeout in seconds for the whole probe (at least 1)
    #[arg(long, global = true, env = "PROXY_CHECK_TIMEOUT", default_value = "15")]
    timeout: u64,

    /// Geolocation endpoint requested through the proxy
    #[arg(
        long,
        global = true,
        env = "PROXY_CHECK_TARGET_URL",
        default_value = "http://ip-api.com/json"
    )]
    target_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Address to bind the HTTP server to
        #[arg(long, env = "PROXY_CHECK_BIND", default_value = "0.0.0.0")]
        bind: String,
        /// Port to listen on
        #[arg(short, long, env = "PROXY_CHECK_PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Check a single proxy and print the result as JSON
    Check {
        /// Proxy as scheme://[user[:pass]@]host:port, host:port or host:port:user:pass
        proxy: String,
        /// Proxy type used when the proxy has no scheme (http, https, socks4, socks5)
        #[arg(short = 't', long = "type", default_value = "http")]
        proxy_type: String,
        /// Username, overrides the one in the proxy string
        #[arg(short, long)]
        username: Option<String>,
        /// Password, overrides the one in the proxy string
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = CheckerConfig::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_target_url(cli.target_url);

    match cli.command {
        Some(Commands::Serve { bind, port }) => {
            let addr = parse_addr(&bind, port)?;
            server::serve(addr, config).await?;
        }
        None => {
            let addr = parse_addr("0.0.0.0", 3000)?;
            server::serve(addr, config).await?;
        }
        Some(Commands::Check {
            proxy,
            proxy_type,
            username,
            password,
        }) => {
            let default_type: ProxyType = proxy_type.parse().map_err(|_| {
                anyhow!(
                    "Invalid proxy type: {}. Use: http, https, socks4, socks5",
                    proxy_type
                )
            })?;

            let mut request = parser::parse_line(&proxy, default_type)
                .ok_or_else(|| anyhow!("Could not parse proxy: {}", proxy))?;
            if username.is_some() {
                request = request.with_credentials(username, password);
            }

            let checker = ProxyChecker::with_config(config);
            let result = checker.check(&request).await;
            let working = matches!(&result, Ok(outcome) if outcome.is_working());

            let (_, body) = server::check_response(result);
            println!("{}", serde_json::to_string_pretty(&body)?);

            if !working {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address: {}", bind))
}
