use anyhow::Context;
use btc_price_relay::utils::logger;
use btc_price_relay::{CliConfig, PriceRelayService, RelayConfig, TomlConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // The file, when given, also carries logging settings, so it loads before the logger.
    let file_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let verbose = cli.verbose
        || file_config
            .as_ref()
            .and_then(TomlConfig::verbose)
            .unwrap_or(false);
    let log_format = file_config
        .as_ref()
        .and_then(TomlConfig::log_format)
        .unwrap_or(cli.log_format);

    logger::init_logger(verbose, log_format);

    tracing::info!("Starting btc-price-relay");
    if verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let resolved = match &file_config {
        Some(file) => RelayConfig::from_provider(file),
        None => RelayConfig::from_provider(&cli),
    };

    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    PriceRelayService::run(config)
        .await
        .context("price relay stopped with an error")?;

    Ok(())
}
