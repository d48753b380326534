//! Screen-space frames for drawing

use super::engine::LayoutSnapshot;
use super::viewport::Viewport;
use crate::graph::{NodeKind, Point};
use serde::Serialize;

const PAPER_RADIUS: f64 = 8.0;
const ANALYSIS_RADIUS: f64 = 5.0;
const LABEL_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub center: Point,
    pub radius: f64,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLink {
    pub from: Point,
    pub to: Point,
    pub relation: String,
}

/// Everything needed to draw one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub tick: u64,
    pub settled: bool,
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
}

impl RenderFrame {
    pub fn compose(snapshot: &LayoutSnapshot, viewport: &Viewport) -> Self {
        let scene = &snapshot.scene;
        let screen: Vec<Point> = snapshot.positions.iter().map(|p| viewport.to_screen(*p)).collect();

        let nodes = scene
            .nodes
            .iter()
            .zip(&screen)
            .enumerate()
            .map(|(i, (node, center))| RenderNode {
                id: node.id.clone(),
                label: truncate_label(&node.label),
                kind: node.kind,
                center: *center,
                radius: node_radius(node.kind) * viewport.scale(),
                pinned: snapshot.pinned.contains(&i),
            })
            .collect();

        let links = scene
            .edges
            .iter()
            .filter_map(|e| {
                Some(RenderLink {
                    from: *screen.get(e.source)?,
                    to: *screen.get(e.target)?,
                    relation: e.relation.clone(),
                })
            })
            .collect();

        Self {
            tick: snapshot.tick,
            settled: snapshot.settled,
            nodes,
            links,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub fn node_radius(kind: NodeKind) -> f64 {
    match kind {
        NodeKind::Paper => PAPER_RADIUS,
        NodeKind::Analysis => ANALYSIS_RADIUS,
    }
}

/// Shorten long labels to 30 characters plus an ellipsis.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= LABEL_MAX_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(LABEL_MAX_CHARS).collect();
    short.push_str("...");
    short
}
