pub mod cli;
pub mod core;
pub mod providers;

use crate::core::asset::AssetCategory;
use crate::core::config::AppConfig;
use crate::core::currency::{CurrencyConverter, RateConverter};
use crate::providers::backend::HttpInvestmentGateway;
use crate::providers::yahoo_finance::YahooCurrencyProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Snapshot {
        category: Option<AssetCategory>,
    },
    Watch {
        category: Option<AssetCategory>,
        asset: Option<String>,
        amount: Option<f64>,
    },
    Income {
        asset: String,
        amount: String,
    },
    Invest {
        asset: String,
        amount: String,
        phone: String,
    },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Resolves the display currency once. An unreachable rate source degrades
/// to USD rather than failing the command.
async fn resolve_converter(config: &AppConfig) -> Arc<dyn CurrencyConverter> {
    let provider = YahooCurrencyProvider::new(&config.providers.yahoo.base_url);
    match RateConverter::resolve(&provider, &config.currency).await {
        Ok(converter) => Arc::new(converter),
        Err(e) => {
            warn!(currency = %config.currency, error = %e, "Falling back to USD");
            Arc::new(RateConverter::identity())
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("assetpulse starting...");
    let config = load_config(config_path)?;
    let converter = resolve_converter(&config).await;

    match command {
        AppCommand::Snapshot { category } => {
            cli::market::snapshot(&config, converter, category).await
        }
        AppCommand::Watch {
            category,
            asset,
            amount,
        } => cli::market::watch(&config, converter, category, asset.as_deref(), amount).await,
        AppCommand::Income { asset, amount } => cli::income::run(converter, &asset, &amount),
        AppCommand::Invest {
            asset,
            amount,
            phone,
        } => {
            let gateway =
                HttpInvestmentGateway::new(&config.backend.base_url, config.backend.token());
            cli::income::invest(&gateway, converter, &asset, &amount, &phone).await
        }
    }
}
