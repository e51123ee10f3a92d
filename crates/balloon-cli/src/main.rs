//! Balloon CLI Application

mod cli;
mod commands;

use clap::Parser as _;
use cli::{Cli, Commands};

fn init_tracing() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing: {:?}", e))?;

    Ok(())
}

fn main() -> eyre::Result<()> {
    // Load .env file (fails silently if not found)
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let res = match cli.command {
        Commands::Verify { proof, root, event } => {
            commands::verify(&proof, root, event.as_deref())
        }
        Commands::ConfigSchema => commands::config_schema(),
        Commands::Add { event } => commands::open(cli.config, cli.db, cli.hasher)
            .and_then(|balloon| commands::add(&balloon, &event)),
        Commands::Membership { event, proof_out } => {
            commands::open(cli.config, cli.db, cli.hasher)
                .and_then(|balloon| commands::membership(&balloon, &event, proof_out))
        }
        Commands::Info => commands::open(cli.config, cli.db, cli.hasher)
            .and_then(|balloon| commands::info(&balloon)),
    };

    if let Err(e) = res {
        tracing::error!("Error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
