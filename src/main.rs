//! BiciMAD forecast - command-line entry point

use clap::Parser;
use bicimad_forecast::cli::{runner, Cli};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bicimad_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    runner(&cli)?;

    Ok(())
}
