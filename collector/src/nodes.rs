use std::cmp::Reverse;

use futures::stream::{self, StreamExt};
use masp_api::types::LookBack;
use masp_client::{probe_endpoint, NodeHistory, ProbeResult};

/// Probes every endpoint, at most `concurrency` at a time, and ranks them.
pub async fn probe_nodes(urls: Vec<String>, concurrency: usize) -> Vec<ProbeResult> {
    let mut results: Vec<ProbeResult> = stream::iter(urls)
        .map(|url| async move { probe_endpoint(&url).await })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    rank_nodes(&mut results);
    results
}

/// Orders nodes by history kept: unlimited first, then by descending
/// limit, failures last.
pub fn rank_nodes(results: &mut [ProbeResult]) {
    results.sort_by_key(|r| match r.outcome {
        Ok(NodeHistory::Unlimited) => (0, Reverse(u64::MAX)),
        Ok(NodeHistory::Limited(n)) => (1, Reverse(n)),
        Err(_) => (2, Reverse(0)),
    });
}

/// Endpoints able to serve queries `required` blocks behind the tip, best first.
pub fn select_endpoints(results: &[ProbeResult], required: LookBack) -> Vec<String> {
    results
        .iter()
        .filter(|r| match (&r.outcome, required) {
            (Ok(NodeHistory::Unlimited), _) => true,
            (Ok(NodeHistory::Limited(n)), LookBack::Blocks(m)) => *n >= m,
            _ => false,
        })
        .map(|r| r.url.clone())
        .collect()
}
