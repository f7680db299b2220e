// crates/rca-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the rca-daemon HTTP endpoint.

use rca_rpc::{JsonRpcRequest, JsonRpcResponse, RPC_PATH};
use serde::de::DeserializeOwned;

/// Full URL of the JSON-RPC route for a daemon base endpoint.
pub fn call_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), RPC_PATH)
}

/// Send a JSON-RPC call to the daemon and return the parsed response.
pub async fn rpc_call(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<JsonRpcResponse, Box<dyn std::error::Error>> {
    let request = JsonRpcRequest {
        method: method.to_string(),
        params,
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(call_url(endpoint))
        .json(&request)
        .send()
        .await?;

    let rpc_response: JsonRpcResponse = resp.json().await?;
    Ok(rpc_response)
}

/// Call `method` and decode the result, turning an error envelope into `Err`.
pub async fn call<T: DeserializeOwned>(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = rpc_call(endpoint, method, params).await?;
    decode(response)
}

fn decode<T: DeserializeOwned>(response: JsonRpcResponse) -> Result<T, Box<dyn std::error::Error>> {
    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "daemon returned an error without a message".to_string());
        return Err(message.into());
    }
    let result = response.result.unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(result)?)
}
