//! Scan workflow for the ScaneIA service.
//!
//! The "scanner" is a simulation: it reports cosmetic progress for a fixed
//! duration, samples findings from a static template catalog, and asks the
//! text-generation client for a report. No probing of the target occurs.
//! [`ScanEngine`] is the seam where a real scanning backend would plug in.

mod catalog;
mod engine;

pub use catalog::{sample_vulnerabilities, vulnerability_catalog};
pub use engine::{EngineConfig, EngineError, ScanEngine, ScanEvent, progress_phase};
