use chrono::DateTime;
use log::{debug, warn};
use masp_api::prelude::*;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::abci::{AbciQueryResult, AbciValue, BlockResult, JsonRpcResponse};
use crate::error::RpcError;
use crate::utils::{endpoint_url, get_json, retry, RetryPolicy};

/// CometBFT RPC client for a Namada chain.
///
/// Holds an ordered list of endpoints; every query is tried against each
/// endpoint in turn until one answers.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: HttpClient,
    endpoints: Vec<String>,
    retry: RetryPolicy,
}

impl RpcClient {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            http: HttpClient::new(),
            endpoints,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Fetches the current tip height.
    pub async fn get_latest_height(&self) -> Result<BlockHeight, RpcError> {
        self.query::<BlockResult, _, _>("/block", &[], None, |url, block| {
            parse_height(url, &block.block.header.height)
        })
        .await
    }

    /// Fetches the header time of the block at `height`.
    pub async fn get_block_time(&self, height: BlockHeight) -> Result<String, RpcError> {
        let params = [("height", height.to_string())];

        self.query::<BlockResult, _, _>("/block", &params, Some(height), |url, block| {
            let time = block.block.header.time;
            DateTime::parse_from_rfc3339(&time).map_err(|e| RpcError::Malformed {
                url: url.to_string(),
                reason: format!("invalid block time '{}': {}", time, e),
            })?;
            Ok(time)
        })
        .await
    }

    /// Fetches the chain epoch of the block at `height`.
    pub async fn get_epoch_at_height(&self, height: BlockHeight) -> Result<u64, RpcError> {
        let path = format!("/shell/epoch_at_height/{}", height);

        self.abci_query_with(&path, None, |url, value| {
            let bytes = match value {
                AbciValue::Present(bytes) => bytes,
                AbciValue::Missing => {
                    return Err(RpcError::Malformed {
                        url: url.to_string(),
                        reason: format!("no epoch returned for height {}", height),
                    })
                }
            };

            decode_option_u64(&bytes)
                .map_err(|source| RpcError::Decode { url: url.to_string(), source })?
                .ok_or_else(|| RpcError::Malformed {
                    url: url.to_string(),
                    reason: format!("height {} has no epoch yet", height),
                })
        })
        .await
    }

    /// Fetches the MASP epoch of the block at `height`.
    pub async fn get_masp_epoch_at_height(&self, height: BlockHeight) -> Result<MaspEpoch, RpcError> {
        let epoch = self.get_epoch_at_height(height).await?;
        Ok(masp_epoch_of(epoch))
    }

    /// Reads one shielded reward parameter of `token` at `height`.
    ///
    /// An absent key reads as zero.
    pub async fn get_token_parameter(
        &self,
        token: &str,
        key: &str,
        height: BlockHeight,
    ) -> Result<u128, RpcError> {
        let path = format!("/shell/value/#{}/#{}/{}", MASP_ADDRESS, token, key);

        self.abci_query_with(&path, Some(height), |url, value| match value {
            AbciValue::Present(bytes) => {
                decode_amount(&bytes).map_err(|source| RpcError::Decode { url: url.to_string(), source })
            }
            AbciValue::Missing => {
                debug!("No {} for {} at height {}, recording 0", key, token, height);
                Ok(0)
            }
        })
        .await
    }

    /// Reads `last_inflation` and `last_locked_amount` of `token` at `height`.
    pub async fn get_token_rewards(&self, token: &str, height: BlockHeight) -> Result<TokenRewards, RpcError> {
        let last_inflation = self.get_token_parameter(token, LAST_INFLATION_KEY, height).await?;
        let last_locked = self.get_token_parameter(token, LAST_LOCKED_KEY, height).await?;

        Ok(TokenRewards { last_inflation, last_locked })
    }

    /// Runs a raw ABCI query, optionally pinned to a historical height.
    pub async fn abci_query(&self, path: &str, height: Option<BlockHeight>) -> Result<AbciValue, RpcError> {
        self.abci_query_with(path, height, |_, value| Ok(value)).await
    }

    async fn abci_query_with<R, M>(
        &self,
        path: &str,
        height: Option<BlockHeight>,
        map: M,
    ) -> Result<R, RpcError>
    where
        M: Fn(&str, AbciValue) -> Result<R, RpcError>,
    {
        let mut params = vec![("path", format!("\"{}\"", path))];
        if let Some(height) = height {
            params.push(("height", height.to_string()));
        }

        self.query::<AbciQueryResult, _, _>("/abci_query", &params, height, |url, result| {
            let value = result.response.classify(url, path, height)?;
            map(url, value)
        })
        .await
    }

    /// Sends a GET to each endpoint in order and returns the first mapped success.
    async fn query<T, R, M>(
        &self,
        path: &str,
        params: &[(&str, String)],
        height: Option<BlockHeight>,
        map: M,
    ) -> Result<R, RpcError>
    where
        T: DeserializeOwned,
        M: Fn(&str, T) -> Result<R, RpcError>,
    {
        let total = self.endpoints.len();
        let mut last_error = RpcError::NoEndpoints;

        for (i, base) in self.endpoints.iter().enumerate() {
            let url = endpoint_url(base, path, params)?;
            let label = url.to_string();

            let result = retry(&self.retry, &label, || {
                get_json::<JsonRpcResponse<T>>(&self.http, url.clone())
            })
            .await
            .and_then(|response| response.into_result(&label, height))
            .and_then(|result| map(&label, result));

            match result {
                Ok(value) => {
                    if i > 0 {
                        debug!("Succeeded with endpoint {}/{}: {}", i + 1, total, base);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Endpoint {}/{} ({}) failed: {}", i + 1, total, base, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn parse_height(url: &str, raw: &str) -> Result<BlockHeight, RpcError> {
    raw.parse().map_err(|_| RpcError::Malformed {
        url: url.to_string(),
        reason: format!("invalid block height '{}'", raw),
    })
}
