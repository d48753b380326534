//! Tunable layout constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation and viewport parameters.
///
/// Alpha is the simulation "temperature": it starts at 1, decays toward
/// `alpha_target` each tick, and the layout counts as settled once it
/// drops below `alpha_min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Rest length of a link
    pub link_distance: f64,
    /// Many-body strength; negative repels
    pub charge_strength: f64,
    /// Distances below this are clamped in the many-body force
    pub charge_distance_min: f64,
    pub collision_radius: f64,
    pub collision_strength: f64,
    pub center_strength: f64,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Alpha target held while a node is dragged
    pub drag_alpha_target: f64,
    /// Alpha floor applied when a drag ends
    pub release_alpha: f64,
    pub tick_interval_ms: u64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: 80.0,
            charge_strength: -120.0,
            charge_distance_min: 1.0,
            collision_radius: 20.0,
            collision_strength: 0.7,
            center_strength: 0.1,
            velocity_decay: 0.4,
            alpha_min,
            // Cools from 1 to alpha_min in 300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
            release_alpha: 0.3,
            tick_interval_ms: 16,
            min_zoom: 0.2,
            max_zoom: 4.0,
        }
    }
}

impl LayoutConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
