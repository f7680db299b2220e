// crates/rca-core/src/provider.rs
//
// Transient values exchanged with an LLM provider during one generation.

/// Input to a single generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub description: String,
    pub tags: Vec<String>,
}

impl ProviderRequest {
    pub fn new(description: &str, tags: &[String]) -> Self {
        Self {
            description: description.to_string(),
            tags: tags.to_vec(),
        }
    }

    /// Tags rendered for a prompt: `"storage, prod"`.
    pub fn tag_list(&self) -> String {
        self.tags.join(", ")
    }
}

/// Unparsed model text. Never persisted; dropped after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelOutput {
    pub text: String,
}

impl RawModelOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
