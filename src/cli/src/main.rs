//! A3S Pack CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use a3s_pack_cli::commands::{dispatch, Cli};
use a3s_pack_core::PackConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match PackConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter())),
        )
        .with_target(false)
        .init();

    if let Err(e) = dispatch(cli, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
