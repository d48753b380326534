//! Graph model consumed by the layout engine

mod builder;
mod model;

pub use builder::{GraphModelBuilder, DEFAULT_SEED_RADIUS};
pub use model::{GraphEdge, GraphModel, GraphNode, NodeKind, Point};
