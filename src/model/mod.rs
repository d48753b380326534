//! Domain records shared by the store, the orchestrator, and the service client

mod analysis;
mod paper;

pub use analysis::{
    AnalysisMeta, BasicAnalysis, Consensus, DeepAnalysis, DivergencePoint, SectionAnalysis, Tier,
    TierPayload,
};
pub use paper::{Note, Paper, PaperStatus};
