#[cfg(feature = "cli")]
pub mod cli;
pub mod relay;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use relay::RelayConfig;
pub use toml_config::TomlConfig;
