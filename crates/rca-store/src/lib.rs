// crates/rca-store/src/lib.rs
//
// rca-store: Storage layer for the RCA generation service.
//
// Holds the incident collection and the RCA report collection, and publishes
// a change event for every incident write. `RocksStore` is the durable
// backend used by the daemon; `InMemoryStore` backs tests and ephemeral runs.

pub mod document;
pub mod feed;
pub mod memory;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use feed::ChangeFeedHub;
pub use memory::InMemoryStore;
pub use rocks::RocksStore;
