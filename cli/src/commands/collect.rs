use anyhow::{bail, Context, Result};
use tokio::time::Duration;

use masp_api::consts::{DEFAULT_PROBE_CONCURRENCY, INDEXER_URLS, RPC_LIST_URL};
use masp_api::types::LookBack;
use masp_client::{IndexerClient, RpcClient};
use masp_collector::collect::{collect_epochs, CollectorConfig};
use masp_collector::nodes::{probe_nodes, select_endpoints};
use masp_collector::plan::ScanPolicy;
use masp_collector::store::HistoryStore;
use masp_collector::tokens::resolve_tokens;

use crate::cli::{Cli, Commands};
use crate::commands::nodes::load_rpc_list;
use crate::log;

pub async fn handle_collect_command(cli: Cli) -> Result<()> {
    let rpc_urls = cli.rpc_urls();

    if let Commands::Collect {
        look_back,
        start_epoch,
        backfill,
        tip_height,
        tokens,
        indexers,
        output,
        delay_ms,
        discover,
    } = cli.command
    {
        let store = HistoryStore::new(&cli.data_dir)
            .with_context(|| format!("Cannot open data directory {}", cli.data_dir.display()))?;

        let cursor = store.scan_cursor()?;
        match cursor {
            Some(epoch) => log::print_message(&format!("Latest recorded MASP epoch: {}", epoch)),
            None => log::print_message(&format!("No recorded epochs in {}", store.dir().display())),
        }

        let endpoints = if discover {
            discover_endpoints(look_back).await?
        } else {
            rpc_urls
        };

        log::print_message(&format!("Connected to: {}", endpoints.join(", ")));
        log::print_message(&format!("Look-back window: {}", look_back));

        let client = RpcClient::new(endpoints);

        let indexer_urls = if indexers.is_empty() {
            INDEXER_URLS.iter().map(|url| url.to_string()).collect()
        } else {
            indexers
        };
        let tokens = resolve_tokens(&IndexerClient::new(indexer_urls), tokens).await;
        log::print_count(&format!("Tokens to query: {}", tokens.len()));

        let config = CollectorConfig {
            look_back,
            policy: ScanPolicy {
                first_run_epochs: backfill,
                floor_epoch: start_epoch,
            },
            tip_height,
            epoch_delay: Duration::from_millis(delay_ms),
        };

        let mut writer = store.writer(output)?;
        let path = writer.path().display().to_string();
        log::print_message(&format!("Writing to: {}", path));

        let summary = collect_epochs(&client, &mut writer, &tokens, cursor, &config)
            .await
            .with_context(|| format!("Collection stopped, rows already in {} are kept", path))?;

        log::print_section_header("Collection");
        log::print_message(&format!("Tip height: {}", summary.tip_height));
        log::print_message(&format!("Tip MASP epoch: {}", summary.tip_epoch));

        match (summary.epochs.first(), summary.epochs.last()) {
            (Some(first), Some(last)) => {
                log::print_success(&format!("Collected MASP epochs {}..={}", first, last));
                log::print_count(&format!("Rows written: {}", summary.rows));
            }
            _ => log::print_info("No new epochs"),
        }

        if let Some(next) = summary.next_cursor() {
            log::print_message(&format!("History now ends at MASP epoch {}", next));
        }
        log::print_divider();
    }

    Ok(())
}

/// Picks public nodes whose look-back covers `look_back`, best first.
async fn discover_endpoints(look_back: LookBack) -> Result<Vec<String>> {
    let urls = load_rpc_list(RPC_LIST_URL).await?;
    let results = probe_nodes(urls, DEFAULT_PROBE_CONCURRENCY).await;
    let endpoints = select_endpoints(&results, look_back);

    if endpoints.is_empty() {
        bail!("No public RPC node serves a look-back of {}", look_back);
    }

    log::print_count(&format!("Usable nodes: {} of {}", endpoints.len(), results.len()));
    Ok(endpoints)
}
