use clap::Parser;
use std::fmt;
use std::time::Duration;

use crate::{ProxyError, Result};

/// Command line of the proxy. Wavefront credentials come from the
/// environment.
#[derive(Debug, Parser)]
#[command(name = "wavefront_promql_proxy", version, about = "Serves Prometheus range queries from Wavefront")]
pub struct Args {
    /// Address to bind, e.g. ":9090" or "127.0.0.1:9090"
    #[arg(long = "http", default_value = ":9090")]
    pub http: String,

    /// Amount of time wavefront is earlier, e.g. "30s" or "-1m"
    #[arg(long, default_value = "0s", value_parser = parse_skew, allow_hyphen_values = true)]
    pub skew: f64,

    /// Deadline for a single wavefront request
    #[arg(long = "upstream-timeout", value_parser = humantime::parse_duration)]
    pub upstream_timeout: Option<Duration>,

    /// Reject queries whose grid would exceed this many points per series
    #[arg(long = "max-points")]
    pub max_points: Option<usize>,

    #[arg(long, env = "WAVEFRONT_ADDRESS", hide_env_values = true)]
    pub wavefront_address: String,

    #[arg(long, env = "WAVEFRONT_TOKEN", hide_env_values = true)]
    pub wavefront_token: String,
}

/// Configuration of the proxy, built once at startup.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address to bind the HTTP server to
    pub listen_address: String,

    /// How many seconds the Wavefront clock runs behind ours
    pub skew_seconds: f64,

    /// Optional upper bound on grid points per series; unlimited when unset
    pub max_points: Option<usize>,

    pub wavefront: WavefrontConfig,
}

/// Connection settings for the Wavefront API.
#[derive(Clone, Default)]
pub struct WavefrontConfig {
    pub address: String,
    pub token: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for WavefrontConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavefrontConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_address: ":9090".to_string(),
            skew_seconds: 0.0,
            max_points: None,
            wavefront: WavefrontConfig::default(),
        }
    }
}

impl From<Args> for ProxyConfig {
    fn from(args: Args) -> Self {
        Self {
            listen_address: args.http,
            skew_seconds: args.skew,
            max_points: args.max_points,
            wavefront: WavefrontConfig {
                address: args.wavefront_address,
                token: args.wavefront_token,
                timeout: args.upstream_timeout,
            },
        }
    }
}

impl ProxyConfig {
    /// Load configuration from the command line and environment
    pub fn load() -> Result<Self> {
        let config = Self::from(Args::parse());
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.wavefront.address.trim().is_empty() {
            return Err(ProxyError::Config("WAVEFRONT_ADDRESS must be set".to_string()));
        }

        if self.wavefront.token.is_empty() {
            return Err(ProxyError::Config("WAVEFRONT_TOKEN must be set".to_string()));
        }

        if self.max_points == Some(0) {
            return Err(ProxyError::Config("Max points must be greater than 0".to_string()));
        }

        if !self.skew_seconds.is_finite() {
            return Err(ProxyError::Config("Skew must be finite".to_string()));
        }

        Ok(())
    }

    /// Socket address to bind. A bare ":port" listens on all interfaces.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// Parses a possibly negative human readable duration into seconds.
pub fn parse_skew(raw: &str) -> std::result::Result<f64, String> {
    let raw = raw.trim();
    let (sign, magnitude) = match raw.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if magnitude == "0" {
        return Ok(0.0);
    }
    humantime::parse_duration(magnitude)
        .map(|duration| sign * duration.as_secs_f64())
        .map_err(|e| format!("invalid skew {:?}: {}", raw, e))
}
