use masp_api::utils::parse_look_back_limit;
use serde::Deserialize;

use crate::error::RpcError;

/// JSON-RPC envelope returned by CometBFT endpoints.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AbciQueryResult {
    pub response: AbciResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct AbciResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub log: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockResult {
    pub block: Block,
}

#[derive(Debug, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    pub height: String,
    pub time: String,
}

/// Outcome of a storage read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbciValue {
    Present(Vec<u8>),
    Missing,
}

impl<T> JsonRpcResponse<T> {
    /// Unwraps the result, mapping node errors to typed failures.
    pub fn into_result(self, url: &str, height: Option<u64>) -> Result<T, RpcError> {
        if let Some(err) = self.error {
            let detail = err.data.unwrap_or_default();

            if let (Some(height), Some(lowest)) = (height, parse_lowest_height(&detail)) {
                return Err(RpcError::Pruned { height, lowest });
            }

            return Err(RpcError::JsonRpc {
                url: url.to_string(),
                code: err.code,
                message: format!("{} {}", err.message, detail).trim().to_string(),
            });
        }

        self.result.ok_or_else(|| RpcError::Malformed {
            url: url.to_string(),
            reason: "response has neither result nor error".into(),
        })
    }
}

impl AbciResponse {
    /// Interprets the response of an ABCI storage query.
    ///
    /// Code 0 with an empty value and "no value" errors both mean the key is
    /// absent at that height. A look-back refusal carries the node's limit.
    pub fn classify(self, url: &str, path: &str, height: Option<u64>) -> Result<AbciValue, RpcError> {
        let message = format!("{} {}", self.info, self.log).trim().to_string();

        if self.code == 0 {
            return match self.value.as_deref() {
                None | Some("") => Ok(AbciValue::Missing),
                Some(value) => base64::decode(value)
                    .map(AbciValue::Present)
                    .map_err(|e| RpcError::Malformed {
                        url: url.to_string(),
                        reason: format!("invalid base64 value for {}: {}", path, e),
                    }),
            };
        }

        if let Some(limit) = parse_look_back_limit(&message) {
            return Err(RpcError::LookBackExceeded {
                height: height.unwrap_or_default(),
                limit,
            });
        }

        let lowered = message.to_lowercase();
        if lowered.contains("no value") || lowered.contains("not found") {
            return Ok(AbciValue::Missing);
        }

        Err(RpcError::Abci {
            path: path.to_string(),
            code: self.code,
            info: message,
        })
    }
}

/// Extracts `N` from `... lowest height is N`.
fn parse_lowest_height(message: &str) -> Option<u64> {
    const MARKER: &str = "lowest height is ";

    let start = message.find(MARKER)? + MARKER.len();
    message[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "http://node";
    const PATH: &str = "/shell/value/#a/#b/parameters/last_inflation";

    fn response(value: serde_json::Value) -> AbciResponse {
        serde_json::from_value::<JsonRpcResponse<AbciQueryResult>>(value)
            .unwrap()
            .into_result(URL, Some(100))
            .unwrap()
            .response
    }

    #[test]
    fn test_classify_present_value() {
        let resp = response(json!({
            "jsonrpc": "2.0", "id": -1,
            "result": { "response": { "code": 0, "value": "AQI=", "info": "", "log": "" } }
        }));

        assert_eq!(resp.classify(URL, PATH, Some(100)).unwrap(), AbciValue::Present(vec![1, 2]));
    }

    #[test]
    fn test_classify_missing_value() {
        let empty = response(json!({
            "result": { "response": { "code": 0, "value": null } }
        }));
        assert_eq!(empty.classify(URL, PATH, None).unwrap(), AbciValue::Missing);

        let absent = response(json!({
            "result": { "response": { "code": 1, "info": "No value found for key" } }
        }));
        assert_eq!(absent.classify(URL, PATH, None).unwrap(), AbciValue::Missing);
    }

    #[test]
    fn test_classify_look_back_refusal() {
        let resp = response(json!({
            "result": { "response": {
                "code": 1,
                "info": "RPC error: Cannot query more than 100000 blocks in the past"
            } }
        }));

        let err = resp.classify(URL, PATH, Some(42)).unwrap_err();
        assert!(matches!(err, RpcError::LookBackExceeded { height: 42, limit: 100_000 }));
    }

    #[test]
    fn test_classify_other_errors() {
        let resp = response(json!({
            "result": { "response": { "code": 2, "info": "invalid storage key" } }
        }));
        assert!(matches!(resp.classify(URL, PATH, None), Err(RpcError::Abci { code: 2, .. })));

        let garbage = response(json!({
            "result": { "response": { "code": 0, "value": "@@@" } }
        }));
        assert!(matches!(garbage.classify(URL, PATH, None), Err(RpcError::Malformed { .. })));
    }

    #[test]
    fn test_json_rpc_pruned_height() {
        let parsed: JsonRpcResponse<BlockResult> = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": -1,
            "error": {
                "code": -32603,
                "message": "Internal error",
                "data": "height 5 is not available, lowest height is 2000001"
            }
        }))
        .unwrap();

        let err = parsed.into_result(URL, Some(5)).unwrap_err();
        assert!(matches!(err, RpcError::Pruned { height: 5, lowest: 2_000_001 }));
    }

    #[test]
    fn test_json_rpc_block_header() {
        let parsed: JsonRpcResponse<BlockResult> = serde_json::from_value(json!({
            "result": { "block": { "header": {
                "height": "1234567",
                "time": "2025-01-02T03:04:05.123456789Z",
                "chain_id": "namada.5f5de2dd1b88cba30586420"
            } } }
        }))
        .unwrap();

        let block = parsed.into_result(URL, None).unwrap();
        assert_eq!(block.block.header.height, "1234567");
    }
}
