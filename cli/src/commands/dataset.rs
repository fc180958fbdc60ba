use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use masp_api::utils::masp_epoch_of;
use masp_client::RpcClient;
use masp_collector::plan::next_epoch;
use masp_collector::store::{dedup_records, write_records, HistoryStore};

use crate::cli::{Cli, Commands};
use crate::log;

pub async fn handle_dataset_commands(cli: Cli) -> Result<()> {
    let rpc_urls = cli.rpc_urls();
    let store = HistoryStore::new(&cli.data_dir)
        .with_context(|| format!("Cannot open data directory {}", cli.data_dir.display()))?;

    match cli.command {
        Commands::LatestEpoch {} => {
            let cursor = store.scan_cursor()?;
            let next = next_epoch(cursor).with_context(|| {
                format!(
                    "Recorded MASP epoch {} in {} is out of range, the dataset is malformed",
                    u64::MAX,
                    store.dir().display()
                )
            })?;

            log::print_section_header("Recorded History");
            match cursor {
                Some(epoch) => log::print_message(&format!("Latest MASP epoch: {}", epoch)),
                None => log::print_message("Latest MASP epoch: none"),
            }
            log::print_info(&format!("next_masp_epoch={}", next));

            if let Ok(path) = env::var("GITHUB_OUTPUT") {
                write_step_output(Path::new(&path), "next_masp_epoch", next)?;
            }
        }
        Commands::Status {} => {
            let client = RpcClient::new(rpc_urls);
            let height = client.get_latest_height().await?;
            let epoch = client.get_epoch_at_height(height).await?;
            let cursor = store.scan_cursor()?;

            log::print_section_header("Chain");
            log::print_message(&format!("Tip height: {}", height));
            log::print_message(&format!("Epoch: {}", epoch));
            log::print_message(&format!("MASP epoch: {}", masp_epoch_of(epoch)));

            log::print_section_header("Recorded History");
            log::print_message(&format!("Directory: {}", store.dir().display()));
            log::print_count(&format!("Files: {}", store.files()?.len()));
            match cursor {
                Some(c) => {
                    log::print_message(&format!("Latest MASP epoch: {}", c));
                    let behind = masp_epoch_of(epoch).saturating_sub(c);
                    log::print_count(&format!("Epochs behind: {}", behind));
                }
                None => log::print_message("Latest MASP epoch: none"),
            }
            log::print_divider();
        }
        Commands::Compact { output } => {
            let records = store.read_records()?;
            let total = records.len();
            let merged = dedup_records(records);

            write_records(&output, &merged)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            log::print_section_header("Compact");
            log::print_count(&format!("Rows read: {}", total));
            log::print_count(&format!("Duplicates dropped: {}", total - merged.len()));
            log::print_success(&format!("Wrote {} rows to {}", merged.len(), output.display()));

            if output.starts_with(store.dir()) {
                log::print_warning("Output is inside the data directory and will be read by later runs");
            }
        }
        _ => {}
    }

    Ok(())
}

/// Appends `key=value` to a GitHub Actions step output file.
fn write_step_output(path: &Path, key: &str, value: u64) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    writeln!(file, "{}={}", key, value)?;
    Ok(())
}
