// crates/rca-provider/src/lib.rs
//
// rca-provider: LLM provider adapters for the RCA generation service.
//
// Each adapter implements `rca_core::RcaProvider`. Callers pick one through
// `ProviderSettings` and hold it as `Arc<dyn RcaProvider>`, so the watcher and
// the on-demand path never name a concrete provider.

pub mod config;
pub mod openai;
pub mod prompt;
pub mod titan;

mod http;

use std::sync::Arc;

use rca_core::RcaProvider;

// Re-export key types for ergonomic access from downstream crates.
pub use config::{GenerationConfig, ProviderKind, ProviderSettings};
pub use openai::Gpt3Provider;
pub use titan::TitanProvider;

/// Build the provider selected by `settings`.
///
/// Returns an error if the settings fail validation.
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn RcaProvider>, String> {
    settings.validate()?;

    let provider: Arc<dyn RcaProvider> = match settings.kind {
        ProviderKind::Titan => Arc::new(TitanProvider::from_settings(settings)),
        ProviderKind::Gpt3 => Arc::new(Gpt3Provider::from_settings(settings)),
    };

    tracing::info!(
        "Using {} provider (model {}, max_tokens={}, temperature={}, top_p={})",
        settings.kind,
        settings.model_id(),
        settings.generation().max_tokens,
        settings.generation().temperature,
        settings.generation().top_p
    );

    Ok(provider)
}
