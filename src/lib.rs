pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{RelayConfig, TomlConfig};
pub use core::{relay::PriceRelayService, upstream::HttpPriceSource};
pub use domain::model::{ErrorBody, PriceQuote};
pub use domain::ports::{ConfigProvider, PriceSource};
pub use utils::error::{RelayError, Result, UpstreamError, UpstreamResult};
