// crates/rca-pipeline/src/gate.rs
//
// Dedup & persistence gate.
//
// The gate is the only component that writes reports. It checks the report
// collection by natural key before generating, and writes only after the
// provider has produced a full response. The check-then-write is not
// transactional: two concurrent callers may both generate, but the upsert on
// `incident_id` leaves exactly one record.

use std::future::Future;
use std::sync::Arc;

use tracing::{Instrument, Span};

use rca_core::{Incident, RcaError, RcaProvider, RcaReport, ReportStore};

/// Result of [`RcaGate::ensure_generated`].
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// A report already existed; nothing was generated.
    Existing(RcaReport),
    /// A new report was generated and stored.
    Generated(RcaReport),
}

impl GateOutcome {
    pub fn report(&self) -> &RcaReport {
        match self {
            GateOutcome::Existing(report) | GateOutcome::Generated(report) => report,
        }
    }

    pub fn into_report(self) -> RcaReport {
        match self {
            GateOutcome::Existing(report) | GateOutcome::Generated(report) => report,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, GateOutcome::Generated(_))
    }
}

/// Shared by the watcher and the on-demand path.
#[derive(Clone)]
pub struct RcaGate {
    store: Arc<dyn ReportStore>,
    provider: Arc<dyn RcaProvider>,
    span: Span,
}

impl RcaGate {
    /// `span` is the parent of the per-incident span each call opens.
    pub fn new(store: Arc<dyn ReportStore>, provider: Arc<dyn RcaProvider>, span: Span) -> Self {
        Self {
            store,
            provider,
            span,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn exists(&self, incident_id: &str) -> Result<bool, RcaError> {
        self.store.report_exists(incident_id).await
    }

    pub async fn find(&self, incident_id: &str) -> Result<Option<RcaReport>, RcaError> {
        self.store.find_report(incident_id).await
    }

    /// Return the existing report for `incident_id`, or generate and store one.
    ///
    /// `load_incident` is only called when no report exists. A loader that
    /// yields `None` ends in `NotFound`. Provider failures come back as
    /// `RcaError::Generation` and leave the store untouched.
    pub async fn ensure_generated<F, Fut>(
        &self,
        incident_id: &str,
        load_incident: F,
    ) -> Result<GateOutcome, RcaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Incident>, RcaError>>,
    {
        async {
            if let Some(existing) = self.store.find_report(incident_id).await? {
                tracing::debug!("RCA already exists for incident {}; skipping", incident_id);
                return Ok(GateOutcome::Existing(existing));
            }

            let incident = load(incident_id, load_incident).await?;
            let report = self.generate_and_store(&incident).await?;
            Ok::<_, RcaError>(GateOutcome::Generated(report))
        }
        .instrument(self.call_span(incident_id))
        .await
    }

    /// Generate a fresh report and replace whatever is stored for the incident.
    pub async fn regenerate<F, Fut>(
        &self,
        incident_id: &str,
        load_incident: F,
    ) -> Result<RcaReport, RcaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Incident>, RcaError>>,
    {
        async {
            let incident = load(incident_id, load_incident).await?;
            tracing::info!("Regenerating RCA for incident {}", incident_id);
            self.generate_and_store(&incident).await
        }
        .instrument(self.call_span(incident_id))
        .await
    }

    /// Record the confirmed root cause and close the report.
    pub async fn close(&self, incident_id: &str, root_cause: &str) -> Result<RcaReport, RcaError> {
        async {
            let mut report = self.store.find_report(incident_id).await?.ok_or_else(|| {
                RcaError::NotFound(format!("RCA not found for incident: {}", incident_id))
            })?;
            report.close(root_cause);
            self.store.upsert_report(&report).await?;
            tracing::info!("Closed RCA for incident {}", incident_id);
            Ok::<_, RcaError>(report)
        }
        .instrument(self.call_span(incident_id))
        .await
    }

    fn call_span(&self, incident_id: &str) -> Span {
        tracing::info_span!(parent: &self.span, "rca", incident_id = %incident_id)
    }

    async fn generate_and_store(&self, incident: &Incident) -> Result<RcaReport, RcaError> {
        let fields = self
            .provider
            .generate(&incident.description, &incident.tags)
            .await
            .map_err(|e| {
                tracing::warn!(
                    error_kind = e.kind(),
                    "RCA generation failed for incident {}: {}",
                    incident.id,
                    e
                );
                RcaError::Generation(e)
            })?;

        if !fields.is_complete() {
            tracing::warn!(
                "Model output for incident {} is missing sections; storing sentinels",
                incident.id
            );
        }

        let report = RcaReport::open(incident, fields, self.provider.name());
        self.store.upsert_report(&report).await?;
        tracing::info!(
            "Stored RCA {} for incident {} ({})",
            report.id,
            incident.id,
            self.provider.name()
        );
        Ok(report)
    }
}

async fn load<F, Fut>(incident_id: &str, load_incident: F) -> Result<Incident, RcaError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<Incident>, RcaError>>,
{
    load_incident()
        .await?
        .ok_or_else(|| RcaError::NotFound(format!("Incident not found: {}", incident_id)))
}

impl std::fmt::Debug for RcaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcaGate")
            .field("provider", &self.provider.name())
            .finish()
    }
}
