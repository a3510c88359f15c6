mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mallfeed-cli")]
#[command(about = "Operator tooling for the mallfeed AI catalog feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the platform authorization URL for the one-time consent step
    AuthorizeUrl,
    /// Fetch the catalog and write the rendered feed page
    Render {
        /// Output file, or `-` for stdout
        #[arg(long, short)]
        output: PathBuf,
        /// Refresh token to use instead of `MALLFEED_REFRESH_TOKEN`
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Fetch the catalog and print it as JSON
    Products {
        /// Refresh token to use instead of `MALLFEED_REFRESH_TOKEN`
        #[arg(long)]
        refresh_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = mallfeed_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::AuthorizeUrl => commands::authorize_url(&config),
        Commands::Render {
            output,
            refresh_token,
        } => commands::render(&config, &output, refresh_token).await,
        Commands::Products { refresh_token } => {
            commands::products(&config, refresh_token).await
        }
    }
}
