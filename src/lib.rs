//! Paperscope: research paper cache, tiered analysis, and graph layout
//!
//! A client-side research state store over a remote paper service.
//!
//! # Core Concepts
//!
//! - **Search session**: one query's paginated, rank-ordered results; a new
//!   query replaces it, "load more" appends to it
//! - **Tiers**: basic, deep, and consensus analyses, each tracked per paper
//!   with its own loading/ready/failed state
//! - **Graph layout**: a force-directed simulation over the paper/analysis
//!   graph, with pan, zoom, and drag applied on top
//!
//! # Example
//!
//! ```no_run
//! use paperscope::{ClientConfig, ResearchDesk};
//!
//! # async fn demo() -> paperscope::PaperscopeResult<()> {
//! let desk = ResearchDesk::connect(ClientConfig::default())?;
//! desk.search("multi-agent systems", None, None).await;
//! desk.analyze("2501.12345", Some("gemini"), None).await;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod desk;
pub mod graph;
pub mod layout;
pub mod mcp;
pub mod model;
pub mod notice;
pub mod service;
pub mod store;

pub use analysis::{AnalysisOrchestrator, AnalysisRecord, TierState, TriggerOutcome};
pub use config::{ClientConfig, ConfigError};
pub use desk::{PaperscopeError, PaperscopeResult, ResearchDesk};
pub use graph::{GraphModel, GraphModelBuilder};
pub use layout::{ForceLayoutEngine, LayoutConfig, LayoutRunner, Viewport};
pub use model::{Note, Paper, PaperStatus, Tier, TierPayload};
pub use notice::{Notice, NoticeBoard, NoticeEmitter, Severity};
pub use service::{HttpResearchService, ResearchService, ServiceError, ServiceResult};
pub use store::{PaperCacheStore, SearchOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
