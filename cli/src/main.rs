mod cli;
mod log;
mod commands;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use cli::{Cli, Commands};
use commands::{collect, dataset, nodes};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    log::print_title("⊙ MASP REWARDS");

    match cli.command {
        // Collection

        Commands::Collect { .. } => {
            collect::handle_collect_command(cli).await?;
        }

        // Nodes

        Commands::Probe { .. } => {
            nodes::handle_probe_command(cli).await?;
        }

        // Dataset

        _ => {
            dataset::handle_dataset_commands(cli).await?;
        }
    }

    Ok(())
}

/// Library logs go to stderr; RUST_LOG overrides the default level.
fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}
