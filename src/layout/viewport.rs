//! Pan and zoom

use super::config::LayoutConfig;
use crate::graph::Point;
use serde::Serialize;

/// Translate plus uniform scale, applied only when drawing.
///
/// `screen = world * scale + translate`. Simulation coordinates are never
/// touched by pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    translate: Point,
    scale: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Viewport {
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        let min_zoom = min_zoom.max(f64::EPSILON);
        Self {
            translate: Point::ORIGIN,
            scale: 1.0_f64.clamp(min_zoom, max_zoom.max(min_zoom)),
            min_zoom,
            max_zoom: max_zoom.max(min_zoom),
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.min_zoom, config.max_zoom)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.translate += Point::new(dx, dy);
    }

    /// Multiply the zoom by `factor`, keeping `anchor` (screen space) fixed.
    ///
    /// The resulting scale is clamped to the zoom range.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let world = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(self.min_zoom, self.max_zoom);
        self.translate = anchor - world * self.scale;
    }

    pub fn to_screen(&self, world: Point) -> Point {
        world * self.scale + self.translate
    }

    pub fn to_world(&self, screen: Point) -> Point {
        (screen - self.translate) * (1.0 / self.scale)
    }
}
