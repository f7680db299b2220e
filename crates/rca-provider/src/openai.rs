// crates/rca-provider/src/openai.rs
//
// GPT-3.5 through an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use rca_core::{ProviderError, ProviderRequest, RawModelOutput, RcaProvider};
use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, ProviderSettings};
use crate::http::post_json;
use crate::prompt::{rca_prompt, SYSTEM_PROMPT};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// GPT-3.5 chat completions provider.
#[derive(Debug, Clone)]
pub struct Gpt3Provider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    generation: GenerationConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl Gpt3Provider {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, generation: GenerationConfig) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            generation,
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let mut provider = Self::new(
            &settings.endpoint(),
            &settings.model_id(),
            settings.api_key.clone(),
            settings.generation(),
        );
        provider.timeout = Duration::from_secs(settings.timeout_secs);
        provider
    }
}

#[async_trait]
impl RcaProvider for Gpt3Provider {
    fn name(&self) -> &str {
        "gpt3"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<RawModelOutput, ProviderError> {
        let prompt = rca_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        let mut builder = self.client.post(&url).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(model = %self.model, "Requesting chat completion");
        let response: ChatResponse = post_json(builder).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .map(RawModelOutput::new)
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock;

    fn provider(base_url: &str) -> Gpt3Provider {
        Gpt3Provider::new(
            base_url,
            "gpt-3.5-turbo",
            Some("sk-test".to_string()),
            GenerationConfig::gpt3(),
        )
    }

    #[tokio::test]
    async fn invoke_sends_system_and_user_messages() {
        let (base_url, handle) = mock::serve_once(
            200,
            r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Impacts: none"},"finish_reason":"stop"}]}"#,
        )
        .await;

        let request = ProviderRequest::new("API latency spike", &["api".to_string(), "prod".to_string()]);
        let output = provider(&base_url).invoke(&request).await.unwrap();
        assert_eq!(output.text, "Impacts: none");

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(raw.to_lowercase().contains("authorization: bearer sk-test"));

        let body = mock::request_body(&raw);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("API latency spike"));
        assert!(user.contains("api, prod"));
    }

    #[tokio::test]
    async fn generate_fills_sentinels_for_missing_sections() {
        let (base_url, _handle) = mock::serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"RCA Description: Cert expired.\nImpacts:\n- TLS errors"}}]}"#,
        )
        .await;

        let fields = provider(&base_url).generate("TLS errors", &[]).await.unwrap();
        assert_eq!(fields.rca_description, "Cert expired.");
        assert_eq!(fields.probable_causes, "Probable Causes section not found.");
        assert_eq!(fields.impacts, "- TLS errors");
        assert_eq!(
            fields.recommended_actions,
            "Recommended Actions section not found."
        );
    }

    #[tokio::test]
    async fn unauthorized_is_client_error() {
        let (base_url, _handle) = mock::serve_once(
            401,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        )
        .await;
        let result = provider(&base_url)
            .invoke(&ProviderRequest::new("x", &[]))
            .await;
        assert!(matches!(result, Err(ProviderError::Client(_))));
    }

    #[tokio::test]
    async fn connection_error_is_transport_error() {
        let result = provider("http://127.0.0.1:1")
            .invoke(&ProviderRequest::new("x", &[]))
            .await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }

    #[tokio::test]
    async fn null_content_is_empty_response() {
        let (base_url, _handle) = mock::serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )
        .await;
        let result = provider(&base_url)
            .invoke(&ProviderRequest::new("x", &[]))
            .await;
        assert_eq!(result.unwrap_err(), ProviderError::EmptyResponse);
    }
}
