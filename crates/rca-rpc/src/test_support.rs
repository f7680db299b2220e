// crates/rca-rpc/src/test_support.rs
//
// Fixtures shared by the handler and server tests.

use std::sync::Arc;

use async_trait::async_trait;
use rca_core::{ProviderError, ProviderRequest, RawModelOutput, RcaProvider};
use rca_pipeline::RcaGate;
use rca_store::InMemoryStore;

pub const COMPLETE_RCA: &str = "1. RCA Description: disk filled up\n2. Probable Causes:\n- log rotation disabled\n3. Impacts:\n- service downtime\n4. Recommended Actions:\n- enable rotation";

/// Provider that always answers the same way.
pub struct FixedProvider {
    answer: Result<String, ProviderError>,
}

impl FixedProvider {
    pub fn complete() -> Self {
        Self {
            answer: Ok(COMPLETE_RCA.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: Err(ProviderError::Client("403 invalid api key".to_string())),
        }
    }
}

#[async_trait]
impl RcaProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn invoke(&self, _request: &ProviderRequest) -> Result<RawModelOutput, ProviderError> {
        self.answer.clone().map(RawModelOutput::new)
    }
}

pub fn gate_with(store: &Arc<InMemoryStore>, provider: FixedProvider) -> RcaGate {
    RcaGate::new(store.clone(), Arc::new(provider), tracing::Span::none())
}
