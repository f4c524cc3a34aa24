use crate::config::relay::RelayConfig;
use crate::core::upstream::DEFAULT_UPSTREAM_URL;
use crate::core::ConfigProvider;
use crate::utils::{error::Result, logger::LogFormat, validation::Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "btc-price-relay")]
#[command(about = "Relays the current bitcoin price from a coin price API")]
pub struct CliConfig {
    #[arg(long, env = "RELAY_CONFIG", help = "Read relay settings from a TOML file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "RELAY_PORT", default_value = "80")]
    pub port: u16,

    #[arg(long, env = "RELAY_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    #[arg(long, env = "RELAY_UPSTREAM_TIMEOUT_MS", default_value = "5000")]
    pub upstream_timeout_ms: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    fn upstream_timeout_ms(&self) -> u64 {
        self.upstream_timeout_ms
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        RelayConfig::from_provider(self).map(|_| ())
    }
}
