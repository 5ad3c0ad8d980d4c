use anyhow::Result;
use assetpulse::core::asset::AssetCategory;
use assetpulse::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for assetpulse::AppCommand {
    fn from(cmd: Commands) -> assetpulse::AppCommand {
        match cmd {
            Commands::Snapshot { category } => assetpulse::AppCommand::Snapshot { category },
            Commands::Watch {
                category,
                asset,
                amount,
            } => assetpulse::AppCommand::Watch {
                category,
                asset,
                amount,
            },
            Commands::Income { asset, amount } => assetpulse::AppCommand::Income { asset, amount },
            Commands::Invest {
                asset,
                amount,
                phone,
            } => assetpulse::AppCommand::Invest {
                asset,
                amount,
                phone,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch prices once and print every asset
    Snapshot {
        /// Only show one category (crypto, forex, commodity, equity)
        #[arg(long)]
        category: Option<AssetCategory>,
    },
    /// Live market view, redrawn on every refresh and tick
    Watch {
        #[arg(long)]
        category: Option<AssetCategory>,
        /// Asset id to chart, e.g. bitcoin
        #[arg(long)]
        asset: Option<String>,
        /// Amount to project income for on the charted asset
        #[arg(long, requires = "asset")]
        amount: Option<f64>,
    },
    /// Project income for an investment
    Income { asset: String, amount: String },
    /// Buy an investment through the backend
    Invest {
        asset: String,
        amount: String,
        /// Phone number charged for the purchase
        #[arg(long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => assetpulse::cli::setup::setup_at_path(path),
            None => assetpulse::cli::setup::setup(),
        },
        Some(cmd) => assetpulse::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
