// crates/rca-core/src/lib.rs
//
// rca-core: Core types, traits, and text normalization for the RCA service.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the incident and report data model, the error taxonomy, the
// change-stream type consumed by the watcher, the storage and provider trait
// interfaces, and the response normalizer that turns model text into fields.

pub mod error;
pub mod feed;
pub mod incident;
pub mod normalize;
pub mod provider;
pub mod report;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use rca_core::RcaReport;`

// Data model
pub use incident::Incident;
pub use report::{RcaFields, RcaReport, ReportStatus};

// Change feed types
pub use feed::{subscription, ChangeEvent, ChangeFilter, ChangeStream, OperationType, Subscriber};

// Provider request/response values
pub use provider::{ProviderRequest, RawModelOutput};

// Normalizer
pub use normalize::{extract_sections, normalize, ExtractedSections, Extraction, Section};

// Error types
pub use error::{ProviderError, RcaError};

// Traits
pub use traits::{ChangeFeed, IncidentStore, RcaProvider, ReportStore};
