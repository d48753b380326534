//! Force-directed graph layout.
//!
//! `ForceLayoutEngine` owns node coordinates in simulation space and
//! relaxes them tick by tick. `LayoutRunner` ticks it on a timer and
//! publishes snapshots. `Viewport` and `RenderFrame` map a snapshot to the
//! screen without touching the simulation.

mod config;
mod engine;
mod forces;
mod render;
mod runner;
mod viewport;

pub use config::LayoutConfig;
pub use engine::{ForceLayoutEngine, LayoutSnapshot, Scene, SceneNode};
pub use render::{node_radius, truncate_label, RenderFrame, RenderLink, RenderNode};
pub use runner::LayoutRunner;
pub use viewport::Viewport;
