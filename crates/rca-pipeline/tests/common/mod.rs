// Shared test fixtures: a scripted provider that counts its calls.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rca_core::{ProviderError, ProviderRequest, RawModelOutput, RcaProvider};

pub const COMPLETE_RCA: &str = "1. RCA Description: disk filled up\n2. Probable Causes:\n- log rotation disabled\n3. Impacts:\n- service downtime\n4. Recommended Actions:\n- enable rotation";

/// Replays scripted responses in order, then falls back to `COMPLETE_RCA`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(responses: Vec<Result<String, ProviderError>>) -> Self {
        let provider = Self::new();
        *provider.script.lock().unwrap() = responses.into_iter().collect();
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RcaProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<RawModelOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(RawModelOutput::new(text)),
            Some(Err(e)) => Err(e),
            None => Ok(RawModelOutput::new(COMPLETE_RCA)),
        }
    }
}
