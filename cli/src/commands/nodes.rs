use anyhow::{Context, Result};
use reqwest::Client as HttpClient;

use masp_api::consts::HIGH_LOOK_BACK_BLOCKS;
use masp_client::{fetch_rpc_list, NodeHistory};
use masp_collector::nodes::probe_nodes;

use crate::cli::{Cli, Commands};
use crate::log;

pub async fn handle_probe_command(cli: Cli) -> Result<()> {
    if let Commands::Probe { list_url, concurrency } = cli.command {
        let urls = load_rpc_list(&list_url).await?;
        log::print_count(&format!("Endpoints to test: {}", urls.len()));

        let results = probe_nodes(urls, concurrency).await;

        log::print_section_header("RPC Endpoints by Look-back");
        for result in &results {
            match &result.outcome {
                Ok(NodeHistory::Unlimited) => {
                    log::print_success(&format!("{:<50} all", result.url));
                }
                Ok(NodeHistory::Limited(n)) if *n > HIGH_LOOK_BACK_BLOCKS => {
                    log::print_warning(&format!("{:<50} {} blocks", result.url, n));
                }
                Ok(NodeHistory::Limited(n)) => {
                    log::print_info(&format!("  {:<50} {} blocks", result.url, n));
                }
                Err(e) => {
                    log::print_error(&format!("{:<50} {}", result.url, e));
                }
            }
        }

        let usable = results.iter().filter(|r| r.outcome.is_ok()).count();
        log::print_divider();
        log::print_count(&format!("Responsive nodes: {} of {}", usable, results.len()));
    }

    Ok(())
}

/// Fetches the public RPC list.
pub async fn load_rpc_list(list_url: &str) -> Result<Vec<String>> {
    let http = HttpClient::new();
    fetch_rpc_list(&http, list_url)
        .await
        .with_context(|| format!("Failed to fetch RPC list from {}", list_url))
}
