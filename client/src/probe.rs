use log::{info, warn};
use masp_api::consts::{MASP_ADDRESS, NAM_TOKEN_ADDRESS};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tokio::time::Duration;

use crate::abci::AbciValue;
use crate::error::RpcError;
use crate::rpc::RpcClient;
use crate::utils::{endpoint_url, get_json, RetryPolicy};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Height queried when probing; only archive nodes still serve it.
const PROBE_HEIGHT: u64 = 1;

#[derive(Debug, Deserialize)]
struct RpcListEntry {
    #[serde(rename = "RPC Address")]
    address: String,
}

/// How much history a node is willing to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHistory {
    Unlimited,
    Limited(u64),
}

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub url: String,
    pub outcome: Result<NodeHistory, String>,
}

/// Fetches the list of public RPC endpoints.
pub async fn fetch_rpc_list(http: &HttpClient, list_url: &str) -> Result<Vec<String>, RpcError> {
    info!("Fetching RPC list from {}", list_url);

    let url = endpoint_url(list_url, "", &[])?;
    let entries: Vec<RpcListEntry> = get_json(http, url).await?;

    info!("Found {} RPC endpoints to test", entries.len());
    Ok(entries.into_iter().map(|e| e.address).collect())
}

/// Determines the look-back window of a single endpoint.
///
/// Queries the minted NAM balance at height 1: a value means the node keeps
/// full history, a "Cannot query more than N blocks" refusal yields `N`.
pub async fn probe_endpoint(url: &str) -> ProbeResult {
    let client = RpcClient::new(vec![url.to_string()]).with_retry(RetryPolicy::once(PROBE_TIMEOUT));
    let path = format!("/shell/value/#{}/#{}/balance/minted", MASP_ADDRESS, NAM_TOKEN_ADDRESS);

    info!("Testing endpoint: {}", url);

    let outcome = classify_probe(client.abci_query(&path, Some(PROBE_HEIGHT)).await);

    match &outcome {
        Ok(NodeHistory::Unlimited) => info!("✓ {} - block limit: all", url),
        Ok(NodeHistory::Limited(n)) => info!("✓ {} - block limit: {}", url, n),
        Err(e) => warn!("✗ {}: {}", url, e),
    }

    ProbeResult {
        url: url.to_string(),
        outcome,
    }
}

fn classify_probe(result: Result<AbciValue, RpcError>) -> Result<NodeHistory, String> {
    match result {
        Ok(AbciValue::Present(_)) => Ok(NodeHistory::Unlimited),
        Ok(AbciValue::Missing) => Err("Could not extract block limit".to_string()),
        Err(RpcError::LookBackExceeded { limit, .. }) => Ok(NodeHistory::Limited(limit)),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_probe() {
        assert_eq!(classify_probe(Ok(AbciValue::Present(vec![1]))), Ok(NodeHistory::Unlimited));
        assert_eq!(
            classify_probe(Err(RpcError::LookBackExceeded { height: 1, limit: 100_000 })),
            Ok(NodeHistory::Limited(100_000))
        );
        assert!(classify_probe(Ok(AbciValue::Missing)).is_err());
        assert!(classify_probe(Err(RpcError::Pruned { height: 1, lowest: 9 })).is_err());
    }

    #[test]
    fn test_rpc_list_shape() {
        let entries: Vec<RpcListEntry> = serde_json::from_value(json!([
            { "RPC Address": "https://namada-rpc.example.com", "Team or Contributor Name": "Example" }
        ]))
        .unwrap();

        assert_eq!(entries[0].address, "https://namada-rpc.example.com");
    }
}
