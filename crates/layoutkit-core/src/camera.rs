//! View camera: pan/zoom between screen and scene coordinates.
//!
//! The camera zoom is the level of detail the manipulator uses to keep its
//! handles at a constant on-screen size.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// View transform of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Translation offset in screen pixels.
    pub offset: Vec2,
    /// Zoom factor, screen pixels per scene unit.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 32.0,
        }
    }
}

impl Camera {
    /// Create a camera at 100% zoom with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen to scene transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_scene(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn scene_to_screen(&self, scene_point: Point) -> Point {
        self.transform() * scene_point
    }

    /// Level of detail reported to the manipulator.
    pub fn level_of_detail(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to the camera limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping `screen_point` over the same scene point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_scene(screen_point);
        self.zoom = new_zoom;
        self.offset += screen_point - self.scene_to_screen(anchor);
    }
}
