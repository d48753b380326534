//! Force kernels applied once per tick.
//!
//! Forces write velocities; positions only move during integration. The
//! link and collision kernels look ahead by one step (`position + velocity`)
//! so they see where a body is about to be.

use crate::graph::Point;
use rand::rngs::StdRng;
use rand::Rng;

/// Live simulation state of one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Body {
    pub position: Point,
    pub velocity: Point,
    pub pinned: Option<Point>,
}

impl Body {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            velocity: Point::ORIGIN,
            pinned: None,
        }
    }

    fn ahead(&self) -> Point {
        self.position + self.velocity
    }
}

/// A link with its degree-derived strength and bias precomputed
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spring {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
    /// Share of the correction taken by the target
    pub bias: f64,
}

impl Spring {
    /// Self loops exert no force and are skipped.
    pub fn from_links(node_count: usize, links: &[(usize, usize)]) -> Vec<Spring> {
        let mut degree = vec![0usize; node_count];
        for &(s, t) in links {
            degree[s] += 1;
            degree[t] += 1;
        }
        links
            .iter()
            .filter(|(s, t)| s != t)
            .map(|&(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Spring {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect()
    }
}

/// Tiny random offset used to separate coincident bodies
fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

/// Pairwise many-body force
pub(crate) fn many_body(bodies: &mut [Body], strength: f64, distance_min: f64, alpha: f64, rng: &mut StdRng) {
    let distance_min2 = distance_min * distance_min;
    let n = bodies.len();
    for i in 0..n {
        let mut dv = Point::ORIGIN;
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut d = bodies[j].position - bodies[i].position;
            if d.x == 0.0 {
                d.x = jiggle(rng);
            }
            if d.y == 0.0 {
                d.y = jiggle(rng);
            }
            let mut l = d.x * d.x + d.y * d.y;
            if l < distance_min2 {
                l = (distance_min2 * l).sqrt();
            }
            dv += d * (strength * alpha / l);
        }
        bodies[i].velocity += dv;
    }
}

/// Springs pulling linked bodies toward `distance`
pub(crate) fn link(bodies: &mut [Body], springs: &[Spring], distance: f64, alpha: f64, rng: &mut StdRng) {
    for spring in springs {
        let (source, target) = (bodies[spring.source], bodies[spring.target]);
        let mut d = target.ahead() - source.ahead();
        if d.x == 0.0 {
            d.x = jiggle(rng);
        }
        if d.y == 0.0 {
            d.y = jiggle(rng);
        }
        let l = d.length();
        let correction = d * ((l - distance) / l * alpha * spring.strength);
        bodies[spring.target].velocity = bodies[spring.target].velocity - correction * spring.bias;
        bodies[spring.source].velocity += correction * (1.0 - spring.bias);
    }
}

/// Shift every body so the centroid moves toward `center`
pub(crate) fn center(bodies: &mut [Body], center: Point, strength: f64) {
    if bodies.is_empty() {
        return;
    }
    let mut sum = Point::ORIGIN;
    for b in bodies.iter() {
        sum += b.position;
    }
    let mean = sum * (1.0 / bodies.len() as f64);
    let shift = (mean - center) * strength;
    for b in bodies.iter_mut() {
        b.position = b.position - shift;
    }
}

/// Push apart bodies closer than two radii
pub(crate) fn collide(bodies: &mut [Body], radius: f64, strength: f64, rng: &mut StdRng) {
    let r = radius * 2.0;
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let mut d = bodies[i].ahead() - bodies[j].ahead();
            let mut l = d.x * d.x + d.y * d.y;
            if l >= r * r {
                continue;
            }
            if d.x == 0.0 {
                d.x = jiggle(rng);
                l += d.x * d.x;
            }
            if d.y == 0.0 {
                d.y = jiggle(rng);
                l += d.y * d.y;
            }
            let l = l.sqrt();
            let push = d * ((r - l) / l * strength);
            // Equal radii share the correction evenly
            bodies[i].velocity += push * 0.5;
            bodies[j].velocity = bodies[j].velocity - push * 0.5;
        }
    }
}

/// Apply velocities. Pinned bodies sit at their pin with zero velocity.
pub(crate) fn integrate(bodies: &mut [Body], velocity_decay: f64) {
    for b in bodies.iter_mut() {
        match b.pinned {
            Some(pin) => {
                b.position = pin;
                b.velocity = Point::ORIGIN;
            }
            None => {
                b.velocity = b.velocity * (1.0 - velocity_decay);
                b.position += b.velocity;
            }
        }
    }
}
