//! Force-directed layout simulation

use super::config::LayoutConfig;
use super::forces::{self, Body, Spring};
use crate::graph::{GraphEdge, GraphModel, NodeKind, Point};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Static part of a laid-out graph. Shared by every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

/// Node positions after one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub tick: u64,
    pub alpha: f64,
    pub settled: bool,
    pub positions: Vec<Point>,
    /// Index of every pinned node
    pub pinned: Vec<usize>,
    #[serde(skip)]
    pub scene: Arc<Scene>,
}

impl LayoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_of(&self, id: &str) -> Option<Point> {
        let index = self.scene.nodes.iter().position(|n| n.id == id)?;
        self.positions.get(index).copied()
    }
}

/// Owns live node coordinates once a `GraphModel` is handed over.
///
/// Each `tick` applies many-body repulsion, link springs, centering, and
/// collision, then integrates velocities. The engine cools as alpha decays
/// and does nothing once settled until a drag reheats it.
#[derive(Debug)]
pub struct ForceLayoutEngine {
    scene: Arc<Scene>,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    config: LayoutConfig,
    center: Point,
    alpha: f64,
    alpha_target: f64,
    ticks: u64,
    rng: StdRng,
}

impl ForceLayoutEngine {
    pub fn new(model: GraphModel, config: LayoutConfig) -> Self {
        let (nodes, edges) = model.into_parts();
        let bodies = nodes.iter().map(|n| Body::at(n.position)).collect::<Vec<_>>();
        let links: Vec<(usize, usize)> = edges.iter().map(|e| (e.source, e.target)).collect();
        let springs = Spring::from_links(bodies.len(), &links);

        let scene = Scene {
            nodes: nodes
                .into_iter()
                .map(|n| SceneNode {
                    id: n.id,
                    label: n.label,
                    kind: n.kind,
                })
                .collect(),
            edges,
        };

        Self {
            scene: Arc::new(scene),
            bodies,
            springs,
            config,
            center: Point::ORIGIN,
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Point the centering force pulls toward
    pub fn with_center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    /// Seed the jiggle RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Advance the simulation one step.
    ///
    /// Returns false, doing nothing, when there are no nodes or the layout
    /// has settled.
    pub fn tick(&mut self) -> bool {
        if self.bodies.is_empty() || self.is_settled() {
            return false;
        }
        let cfg = &self.config;
        self.alpha += (self.alpha_target - self.alpha) * cfg.alpha_decay;

        forces::many_body(
            &mut self.bodies,
            cfg.charge_strength,
            cfg.charge_distance_min,
            self.alpha,
            &mut self.rng,
        );
        forces::link(&mut self.bodies, &self.springs, cfg.link_distance, self.alpha, &mut self.rng);
        forces::center(&mut self.bodies, self.center, cfg.center_strength);
        forces::collide(
            &mut self.bodies,
            cfg.collision_radius,
            cfg.collision_strength,
            &mut self.rng,
        );
        forces::integrate(&mut self.bodies, cfg.velocity_decay);

        self.ticks += 1;
        if self.is_settled() {
            debug!(ticks = self.ticks, nodes = self.bodies.len(), "layout settled");
        }
        true
    }

    /// Tick until settled or `max_ticks` have run. Returns the ticks taken.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let mut n = 0;
        while n < max_ticks && self.tick() {
            n += 1;
        }
        n
    }

    /// Settled once alpha has decayed below `alpha_min` and nothing holds it up.
    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn node_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    pub fn position(&self, index: usize) -> Option<Point> {
        self.bodies.get(index).map(|b| b.position)
    }

    pub fn positions(&self) -> Vec<Point> {
        self.bodies.iter().map(|b| b.position).collect()
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.bodies.get(index).is_some_and(|b| b.pinned.is_some())
    }

    /// Nearest node within `radius` of a simulation-space point
    pub fn node_at(&self, point: Point, radius: f64) -> Option<usize> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (i, b.position.distance(point)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Pin a node at its current position and keep the simulation warm.
    pub fn drag_start(&mut self, index: usize) -> bool {
        let Some(body) = self.bodies.get_mut(index) else {
            return false;
        };
        body.pinned = Some(body.position);
        self.alpha_target = self.config.drag_alpha_target;
        true
    }

    /// Move a pinned node to the pointer.
    pub fn drag_move(&mut self, index: usize, to: Point) -> bool {
        let Some(body) = self.bodies.get_mut(index) else {
            return false;
        };
        if body.pinned.is_none() || !to.is_finite() {
            return false;
        }
        body.pinned = Some(to);
        body.position = to;
        true
    }

    /// Release the pin and reheat so the node settles instead of freezing.
    pub fn drag_end(&mut self, index: usize) -> bool {
        let Some(body) = self.bodies.get_mut(index) else {
            return false;
        };
        if body.pinned.take().is_none() {
            return false;
        }
        if self.bodies.iter().all(|b| b.pinned.is_none()) {
            self.alpha_target = 0.0;
        }
        self.alpha = self.alpha.max(self.config.release_alpha);
        true
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            tick: self.ticks,
            alpha: self.alpha,
            settled: self.is_settled(),
            positions: self.positions(),
            pinned: self
                .bodies
                .iter()
                .enumerate()
                .filter(|(_, b)| b.pinned.is_some())
                .map(|(i, _)| i)
                .collect(),
            scene: Arc::clone(&self.scene),
        }
    }
}
