use crate::core::ConfigProvider;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

const MIN_TIMEOUT_MS: u64 = 1;
const MAX_TIMEOUT_MS: u64 = 60_000;

/// Resolved settings handed to `PriceRelayService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub upstream_url: Url,
    pub upstream_timeout: Duration,
}

impl RelayConfig {
    pub fn new(bind_addr: SocketAddr, upstream_url: Url, upstream_timeout: Duration) -> Self {
        Self {
            bind_addr,
            upstream_url,
            upstream_timeout,
        }
    }

    pub fn from_provider<C: ConfigProvider + ?Sized>(provider: &C) -> Result<Self> {
        let host = provider.host().trim();
        validate_non_empty_string("host", host)?;
        let ip: IpAddr = host
            .parse()
            .map_err(|e| RelayError::InvalidConfigValueError {
                field: "host".to_string(),
                value: host.to_string(),
                reason: format!("Expected an IP address: {}", e),
            })?;

        let upstream_url = validate_url("upstream_url", provider.upstream_url())?;

        let timeout_ms = provider.upstream_timeout_ms();
        validate_range(
            "upstream_timeout_ms",
            timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;

        Ok(Self::new(
            SocketAddr::new(ip, provider.port()),
            upstream_url,
            Duration::from_millis(timeout_ms),
        ))
    }
}
