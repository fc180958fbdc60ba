use std::collections::HashSet;

use log::{info, warn};
use masp_api::consts::NAM_TOKEN_ADDRESS;
use masp_client::IndexerClient;

/// Chooses the tokens to query.
///
/// Explicit tokens win unless all of them are blank; otherwise the indexer
/// list is used, falling back to NAM alone when no indexer answers. Duplicates are dropped since each
/// token yields exactly one row per epoch.
pub async fn resolve_tokens(indexer: &IndexerClient, explicit: Vec<String>) -> Vec<String> {
    if !explicit.is_empty() {
        let explicit = unique(explicit);
        if !explicit.is_empty() {
            return explicit;
        }
        warn!("All given token addresses are blank, asking the indexer instead");
    }

    match indexer.get_token_addresses().await {
        Ok(tokens) if !tokens.is_empty() => {
            info!("Found {} tokens", tokens.len());
            let tokens = unique(tokens);
            if tokens.is_empty() {
                warn!("Indexer returned only blank addresses, using NAM only");
                return vec![NAM_TOKEN_ADDRESS.to_string()];
            }
            tokens
        }
        Ok(_) => {
            warn!("Indexer returned no tokens, using NAM only");
            vec![NAM_TOKEN_ADDRESS.to_string()]
        }
        Err(e) => {
            warn!("Failed to get token list ({}), using NAM only", e);
            vec![NAM_TOKEN_ADDRESS.to_string()]
        }
    }
}

fn unique(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
