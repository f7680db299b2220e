// crates/rca-provider/src/config.rs
//
// Provider selection and per-call generation limits.
// Deserialized from the `[provider]` table of the daemon's TOML config.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed sampling limits applied to every generation.
///
/// - `max_tokens`: caps output length.
/// - `temperature`: controls determinism (lower is more focused).
/// - `top_p`: nucleus-sampling cutoff, controls sampling diversity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationConfig {
    pub fn titan() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.5,
            top_p: 0.9,
        }
    }

    pub fn gpt3() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.5,
            top_p: 1.0,
        }
    }
}

/// Which backend drafts the RCA text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Amazon Titan text model on Bedrock.
    Titan,
    /// OpenAI-compatible GPT-3.5 chat completions.
    Gpt3,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Titan => write!(f, "titan"),
            ProviderKind::Gpt3 => write!(f, "gpt3"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "titan" => Ok(ProviderKind::Titan),
            "gpt3" | "gpt-3.5" | "openai" => Ok(ProviderKind::Gpt3),
            other => Err(format!(
                "Unknown provider: {}. Use 'titan' or 'gpt3'.",
                other
            )),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Backend to use.
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Model identifier; defaults per kind.
    #[serde(default)]
    pub model_id: Option<String>,

    /// AWS region for Bedrock.
    #[serde(default = "default_region")]
    pub region: String,

    /// Base URL override (proxies, local gateways, tests).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer credential (Bedrock API key or OpenAI key).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub top_p: Option<f32>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_kind() -> ProviderKind {
    ProviderKind::Titan
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model_id: None,
            region: default_region(),
            endpoint: None,
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    /// Effective generation limits: per-kind defaults overridden by config.
    pub fn generation(&self) -> GenerationConfig {
        let base = match self.kind {
            ProviderKind::Titan => GenerationConfig::titan(),
            ProviderKind::Gpt3 => GenerationConfig::gpt3(),
        };
        GenerationConfig {
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
        }
    }

    pub fn model_id(&self) -> String {
        match (&self.model_id, self.kind) {
            (Some(id), _) => id.clone(),
            (None, ProviderKind::Titan) => "amazon.titan-text-express-v1".to_string(),
            (None, ProviderKind::Gpt3) => "gpt-3.5-turbo".to_string(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> String {
        let url = match (&self.endpoint, self.kind) {
            (Some(url), _) => url.clone(),
            (None, ProviderKind::Titan) => {
                format!("https://bedrock-runtime.{}.amazonaws.com", self.region)
            }
            (None, ProviderKind::Gpt3) => "https://api.openai.com".to_string(),
        };
        url.trim_end_matches('/').to_string()
    }

    /// Apply environment overrides.
    ///
    /// For Titan, `AWS_REGION` replaces the configured region whenever it is
    /// set, and `AWS_BEARER_TOKEN_BEDROCK` fills a missing API key. For
    /// GPT-3.5, `OPENAI_API_KEY` fills a missing API key. A key from the
    /// config file is never replaced.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        match self.kind {
            ProviderKind::Titan => {
                if let Some(region) = lookup("AWS_REGION") {
                    self.region = region;
                }
                if self.api_key.is_none() {
                    self.api_key = lookup("AWS_BEARER_TOKEN_BEDROCK");
                }
            }
            ProviderKind::Gpt3 => {
                if self.api_key.is_none() {
                    self.api_key = lookup("OPENAI_API_KEY");
                }
            }
        }
    }

    /// Reject limits the backends would refuse.
    pub fn validate(&self) -> Result<(), String> {
        let generation = self.generation();
        if generation.max_tokens == 0 {
            return Err("provider.max_tokens must be greater than 0".to_string());
        }
        let max_temperature = match self.kind {
            ProviderKind::Titan => 1.0,
            ProviderKind::Gpt3 => 2.0,
        };
        if !(0.0..=max_temperature).contains(&generation.temperature) {
            return Err(format!(
                "provider.temperature must be within 0.0..={} for {}",
                max_temperature, self.kind
            ));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err("provider.top_p must be within (0.0, 1.0]".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("provider.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
