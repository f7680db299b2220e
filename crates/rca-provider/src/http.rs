// crates/rca-provider/src/http.rs
//
// Shared request execution and error mapping for the HTTP-based providers.

use rca_core::ProviderError;
use serde::de::DeserializeOwned;

/// Longest slice of an error body carried into an error message.
const BODY_EXCERPT_LEN: usize = 300;

/// Send a prepared request and decode a JSON response body.
///
/// - send or body-read failure -> `Transport`
/// - non-success status -> `Client`
/// - body that does not decode into `T` -> `EmptyResponse`
pub(crate) async fn post_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport(format!("request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Transport(format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(ProviderError::Client(format!(
            "provider returned {}: {}",
            status,
            excerpt(&body)
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!("Undecodable provider response ({}): {}", e, excerpt(&body));
        ProviderError::EmptyResponse
    })
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
