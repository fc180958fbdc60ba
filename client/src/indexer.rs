use log::warn;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::RpcError;
use crate::utils::{endpoint_url, get_json, retry, RetryPolicy};

#[derive(Debug, Deserialize)]
struct IndexedToken {
    address: String,
}

/// Client for the Namada indexer REST API.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: HttpClient,
    endpoints: Vec<String>,
    retry: RetryPolicy,
}

impl IndexerClient {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            http: HttpClient::new(),
            endpoints,
            retry: RetryPolicy::default(),
        }
    }

    /// Fetches the addresses of every token known to the chain.
    pub async fn get_token_addresses(&self) -> Result<Vec<String>, RpcError> {
        let total = self.endpoints.len();
        let mut last_error = RpcError::NoEndpoints;

        for (i, base) in self.endpoints.iter().enumerate() {
            let url = endpoint_url(base, "/api/v1/chain/token", &[])?;
            let label = url.to_string();

            let result = retry(&self.retry, &label, || {
                get_json::<Vec<IndexedToken>>(&self.http, url.clone())
            })
            .await;

            match result {
                Ok(tokens) => return Ok(tokens.into_iter().map(|t| t.address).collect()),
                Err(e) => {
                    warn!("Indexer {}/{} ({}) failed: {}", i + 1, total, base, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_list_shape() {
        let tokens: Vec<IndexedToken> = serde_json::from_value(json!([
            { "type": "native", "address": "tnam1q9gr66cvu4hrzm0sd5kmlnjje82gs3xlfg3v6nu7" },
            { "type": "ibc", "address": "tnam1p5z8ruwyu7ha8urhq2l0dhpk2f5dv3ts7uyf2n75", "trace": "transfer/channel-1/uosmo" }
        ]))
        .unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].address, "tnam1p5z8ruwyu7ha8urhq2l0dhpk2f5dv3ts7uyf2n75");
    }
}
