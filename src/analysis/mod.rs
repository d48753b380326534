//! Tiered paper analysis
//!
//! Each paper may carry up to three independent analyses (basic, deep,
//! consensus). Every (paper, tier) pair runs its own small state machine:
//!
//! ```text
//! absent ──trigger──▶ loading ──ok───▶ ready
//!                       │
//!                       └────err──▶ failed
//!
//! ready | failed ──trigger──▶ loading
//! ```
//!
//! A trigger while `loading` is ignored; tiers never affect one another.

mod orchestrator;
mod record;

pub use orchestrator::{AnalysisOrchestrator, TriggerOutcome};
pub use record::{AnalysisRecord, RecordKey, TierState};
