// crates/rca-provider/src/titan.rs
//
// Amazon Titan text model on Bedrock Runtime.
// Calls `POST {endpoint}/model/{model_id}/invoke` authenticated with a
// Bedrock API key sent as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use rca_core::{ProviderError, ProviderRequest, RawModelOutput, RcaProvider};
use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, ProviderSettings};
use crate::http::post_json;
use crate::prompt::rca_prompt;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    input_text: &'a str,
    text_generation_config: TextGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig {
    max_token_count: u32,
    temperature: f32,
    top_p: f32,
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    results: Vec<TitanResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanResult {
    #[serde(default)]
    output_text: Option<String>,
}

/// Titan provider.
#[derive(Debug, Clone)]
pub struct TitanProvider {
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
    generation: GenerationConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl TitanProvider {
    pub fn new(endpoint: &str, model_id: &str, api_key: Option<String>, generation: GenerationConfig) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
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

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.endpoint, self.model_id)
    }
}

#[async_trait]
impl RcaProvider for TitanProvider {
    fn name(&self) -> &str {
        "titan"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<RawModelOutput, ProviderError> {
        let prompt = rca_prompt(request);
        let body = InvokeRequest {
            input_text: &prompt,
            text_generation_config: TextGenerationConfig {
                max_token_count: self.generation.max_tokens,
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                stop_sequences: Vec::new(),
            },
        };

        let mut builder = self
            .client
            .post(self.invoke_url())
            .timeout(self.timeout)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(model = %self.model_id, "Invoking Titan");
        let response: InvokeResponse = post_json(builder).await?;

        response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.output_text)
            .filter(|text| !text.trim().is_empty())
            .map(RawModelOutput::new)
            .ok_or(ProviderError::EmptyResponse)
    }
}
