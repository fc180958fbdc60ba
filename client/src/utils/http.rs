use reqwest::{Client as HttpClient, Url};
use serde::de::DeserializeOwned;

use crate::error::RpcError;

/// Joins an endpoint base URL with a path and encoded query parameters.
pub fn endpoint_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url, RpcError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };

    url.map_err(|e| RpcError::InvalidUrl(raw, e.to_string()))
}

/// Issues a GET request and decodes the JSON body.
///
/// Bodies that fail to decode on a non-success status are reported as a
/// status error; CometBFT returns JSON-RPC errors with 500 as well, so the
/// body is always tried first.
pub async fn get_json<T: DeserializeOwned>(http: &HttpClient, url: Url) -> Result<T, RpcError> {
    let label = url.to_string();

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| RpcError::Http { url: label.clone(), source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| RpcError::Http { url: label.clone(), source })?;

    match serde_json::from_str::<T>(&body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(RpcError::Status {
            url: label,
            status: status.as_u16(),
        }),
        Err(e) => Err(RpcError::Malformed {
            url: label,
            reason: e.to_string(),
        }),
    }
}
