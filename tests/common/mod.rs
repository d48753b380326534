//! Common test utilities for paperscope scenario tests
//!
//! Helpers for building stores and orchestrators over a `MockService` and
//! for sequencing requests parked behind mock gates.

#![allow(dead_code)]

use paperscope::graph::{GraphEdge, GraphModel, GraphNode, NodeKind, Point};
use paperscope::service::mock::{MockOp, MockService};
use paperscope::service::types::{EdgeEndpoint, GraphEdgeData, GraphNodeData, GraphResponse};
use paperscope::{AnalysisOrchestrator, PaperCacheStore};
use std::sync::Arc;

pub use paperscope::service::mock::numbered_papers;

pub fn store(service: MockService) -> (Arc<MockService>, Arc<PaperCacheStore>) {
    let service = Arc::new(service);
    let store = Arc::new(PaperCacheStore::new(service.clone()));
    (service, store)
}

pub fn orchestrator(service: MockService) -> (Arc<MockService>, Arc<AnalysisOrchestrator>) {
    let service = Arc::new(service);
    let orchestrator = Arc::new(AnalysisOrchestrator::new(service.clone()));
    (service, orchestrator)
}

/// Yield until the mock has seen `n` calls to `op`.
///
/// Used to make sure a spawned request has reached its gate before the
/// test continues.
pub async fn wait_for_calls(service: &MockService, op: MockOp, n: usize) {
    while service.calls(op) < n {
        tokio::task::yield_now().await;
    }
}

pub fn wire_node(id: &str, kind: &str) -> GraphNodeData {
    GraphNodeData {
        id: id.to_string(),
        title: format!("Title of {}", id),
        kind: kind.to_string(),
        ..Default::default()
    }
}

pub fn wire_edge(source: EdgeEndpoint, target: EdgeEndpoint, relation: &str) -> GraphEdgeData {
    GraphEdgeData {
        source,
        target,
        relation: relation.to_string(),
        tag: None,
    }
}

/// Two papers each analyzed once, plus a shared-tag link between the papers.
pub fn small_graph() -> GraphResponse {
    GraphResponse {
        nodes: vec![
            wire_node("arxiv:2501.00001", "paper"),
            wire_node("arxiv:2501.00002", "paper"),
            wire_node("analysis_1", "analysis"),
            wire_node("analysis_2", "analysis"),
        ],
        edges: vec![
            wire_edge(EdgeEndpoint::Index(0), EdgeEndpoint::Index(2), "analyzed_by"),
            wire_edge(EdgeEndpoint::Index(1), EdgeEndpoint::Index(3), "analyzed_by"),
            wire_edge(
                EdgeEndpoint::Node(wire_node("arxiv:2501.00001", "paper")),
                EdgeEndpoint::Node(wire_node("arxiv:2501.00002", "paper")),
                "shared_tag",
            ),
        ],
        ..Default::default()
    }
}

/// A `len`-node chain laid out on a line, for layout tests.
pub fn chain_model(len: usize) -> GraphModel {
    let nodes = (0..len)
        .map(|i| GraphNode::new(format!("n{}", i), format!("Node {}", i), NodeKind::Paper).at(Point::new(i as f64 * 5.0, 0.0)))
        .collect();
    let edges = (1..len)
        .map(|i| GraphEdge {
            source: i - 1,
            target: i,
            relation: "cites".to_string(),
            tag: None,
        })
        .collect();
    GraphModel::new(nodes, edges)
}
