//! Resolves a served graph into a `GraphModel`

use super::model::{GraphEdge, GraphModel, GraphNode, NodeKind, Point};
use crate::service::types::{EdgeEndpoint, GraphEdgeData, GraphNodeData, GraphResponse};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::TAU;
use tracing::debug;

/// Default radius of the disc that initial positions are drawn from
pub const DEFAULT_SEED_RADIUS: f64 = 100.0;

/// Builds a `GraphModel` from wire nodes and edges.
///
/// Every endpoint is resolved to a node index exactly once. Edges whose
/// endpoint cannot be resolved are dropped. Each node starts at a random
/// point inside a disc around `center`.
#[derive(Debug, Clone)]
pub struct GraphModelBuilder {
    center: Point,
    seed_radius: f64,
    seed: Option<u64>,
}

impl Default for GraphModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModelBuilder {
    pub fn new() -> Self {
        Self {
            center: Point::ORIGIN,
            seed_radius: DEFAULT_SEED_RADIUS,
            seed: None,
        }
    }

    /// Viewport center in simulation space
    pub fn with_center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    pub fn with_seed_radius(mut self, radius: f64) -> Self {
        self.seed_radius = radius.max(0.0);
        self
    }

    /// Fix the RNG seed so initial positions are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build_response(&self, response: &GraphResponse) -> GraphModel {
        self.build(&response.nodes, &response.edges)
    }

    pub fn build(&self, nodes: &[GraphNodeData], edges: &[GraphEdgeData]) -> GraphModel {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // First occurrence wins when ids repeat
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            by_id.entry(node.id.as_str()).or_insert(i);
        }

        let graph_nodes: Vec<GraphNode> = nodes
            .iter()
            .map(|n| {
                let label = if n.title.is_empty() { n.id.clone() } else { n.title.clone() };
                GraphNode::new(n.id.clone(), label, NodeKind::from_wire(&n.kind))
                    .at(self.seed_position(&mut rng))
            })
            .collect();

        let resolve = |endpoint: &EdgeEndpoint| -> Option<usize> {
            match endpoint {
                EdgeEndpoint::Index(i) => usize::try_from(*i).ok().filter(|i| *i < nodes.len()),
                EdgeEndpoint::Id(id) => by_id.get(id.as_str()).copied(),
                EdgeEndpoint::Node(node) => by_id.get(node.id.as_str()).copied(),
                EdgeEndpoint::Unknown(_) => None,
            }
        };

        let mut dropped = 0usize;
        let graph_edges: Vec<GraphEdge> = edges
            .iter()
            .filter_map(|e| {
                let resolved = resolve(&e.source).zip(resolve(&e.target));
                if resolved.is_none() {
                    dropped += 1;
                }
                let (source, target) = resolved?;
                Some(GraphEdge {
                    source,
                    target,
                    relation: e.relation.clone(),
                    tag: e.tag.clone(),
                })
            })
            .collect();

        if dropped > 0 {
            debug!(dropped, "dropped edges with dangling endpoints");
        }
        GraphModel::new(graph_nodes, graph_edges)
    }

    /// Uniform point in the seed disc
    fn seed_position(&self, rng: &mut StdRng) -> Point {
        let r = self.seed_radius * rng.gen::<f64>().sqrt();
        let theta = rng.gen::<f64>() * TAU;
        self.center + Point::new(r * theta.cos(), r * theta.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{decode, ServiceResponse};

    fn node(id: &str, kind: &str) -> GraphNodeData {
        GraphNodeData {
            id: id.into(),
            title: format!("Title of {}", id),
            kind: kind.into(),
            ..Default::default()
        }
    }

    fn edge(source: EdgeEndpoint, target: EdgeEndpoint) -> GraphEdgeData {
        GraphEdgeData {
            source,
            target,
            relation: "analyzed_by".into(),
            tag: None,
        }
    }

    #[test]
    fn resolves_index_and_embedded_endpoints() {
        let nodes = vec![node("arxiv:1", "paper"), node("analysis_1", "analysis")];
        let edges = vec![
            edge(EdgeEndpoint::Index(0), EdgeEndpoint::Index(1)),
            edge(EdgeEndpoint::Node(node("analysis_1", "analysis")), EdgeEndpoint::Index(0)),
        ];
        let model = GraphModelBuilder::new().with_seed(7).build(&nodes, &edges);

        assert_eq!(model.edge_count(), 2);
        assert_eq!((model.edges()[1].source, model.edges()[1].target), (1, 0));
        assert_eq!(model.nodes()[1].kind, NodeKind::Analysis);
    }

    #[test]
    fn dangling_endpoints_are_dropped() {
        let nodes = vec![node("arxiv:1", "paper"), node("arxiv:2", "paper")];
        let edges = vec![
            edge(EdgeEndpoint::Index(0), EdgeEndpoint::Index(5)),
            edge(EdgeEndpoint::Index(-1), EdgeEndpoint::Index(0)),
            edge(EdgeEndpoint::Node(node("arxiv:404", "paper")), EdgeEndpoint::Index(1)),
            edge(EdgeEndpoint::Index(0), EdgeEndpoint::Index(1)),
        ];
        let model = GraphModelBuilder::new().build(&nodes, &edges);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.edge_count(), 1);
    }

    #[test]
    fn unreadable_endpoints_drop_only_their_edge() {
        let body = serde_json::json!({
            "nodes": [
                { "id": "arxiv:1", "title": "A", "type": "paper" },
                { "id": "analysis_1", "title": "Analysis (gemini)", "type": "analysis" }
            ],
            "edges": [
                { "source": 0, "target": 1, "type": "analyzed_by" },
                { "source": "analysis_1", "target": "arxiv:1", "type": "analyzed_by" },
                { "source": "arxiv:404", "target": 1 },
                { "source": null, "target": 1 },
                { "source": 0.5, "target": 1 },
                { "target": 0 }
            ]
        });
        let graph: GraphResponse = decode(ServiceResponse::classify(body)).unwrap();
        assert_eq!(graph.edges.len(), 6);
        assert_eq!(graph.edges[3].source, EdgeEndpoint::Unknown(serde_json::Value::Null));

        let model = GraphModelBuilder::new().build_response(&graph);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.edge_count(), 2);
        assert_eq!((model.edges()[1].source, model.edges()[1].target), (1, 0));
    }

    #[test]
    fn seeds_positions_inside_radius() {
        let nodes: Vec<_> = (0..50).map(|i| node(&format!("n{}", i), "paper")).collect();
        let center = Point::new(400.0, 300.0);
        let model = GraphModelBuilder::new()
            .with_center(center)
            .with_seed_radius(100.0)
            .with_seed(42)
            .build(&nodes, &[]);

        for n in model.nodes() {
            assert!(n.position.distance(center) <= 100.0 + 1e-9);
        }
        let first = model.nodes()[0].position;
        assert!(model.nodes().iter().any(|n| n.position != first));
    }

    #[test]
    fn same_seed_same_layout() {
        let nodes = vec![node("a", "paper"), node("b", "paper")];
        let a = GraphModelBuilder::new().with_seed(1).build(&nodes, &[]);
        let b = GraphModelBuilder::new().with_seed(1).build(&nodes, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_builds_empty_model() {
        assert!(GraphModelBuilder::new().build(&[], &[]).is_empty());
    }
}
