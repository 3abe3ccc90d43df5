//! Manipulator handle geometry and hit-testing.

use crate::config::{TransformConfig, TransformFlags};
use kurbo::{Circle, Point, Rect, Shape, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A manipulator handle.
///
/// Declaration order is the hit-test precedence: the first active handle
/// containing the point wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    TopLeft,
    TopMiddle,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomMiddle,
    BottomRight,
    /// Rotation pivot, offset from the rect center.
    TransformCenter,
    /// Ring around the transform center.
    Rotate,
}

impl Handle {
    /// Every handle, in hit-test order.
    pub const ALL: [Handle; 10] = [
        Handle::TopLeft,
        Handle::TopMiddle,
        Handle::TopRight,
        Handle::MiddleLeft,
        Handle::MiddleRight,
        Handle::BottomLeft,
        Handle::BottomMiddle,
        Handle::BottomRight,
        Handle::TransformCenter,
        Handle::Rotate,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Check if this is one of the eight resize handles.
    pub fn is_resize(self) -> bool {
        !matches!(self, Handle::TransformCenter | Handle::Rotate)
    }

    /// Check if this is a corner handle.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }

    /// Check if this is an edge midpoint handle.
    pub fn is_edge(self) -> bool {
        matches!(
            self,
            Handle::TopMiddle | Handle::MiddleLeft | Handle::MiddleRight | Handle::BottomMiddle
        )
    }

    /// Check if the handle drags the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::MiddleLeft | Handle::BottomLeft)
    }

    /// Check if the handle drags the right edge.
    pub fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::MiddleRight | Handle::BottomRight)
    }

    /// Check if the handle drags the top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopMiddle | Handle::TopRight)
    }

    /// Check if the handle drags the bottom edge.
    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::BottomMiddle | Handle::BottomRight)
    }

    /// The handle that stays fixed while this one is dragged.
    pub fn opposite(self) -> Option<Handle> {
        match self {
            Handle::TopLeft => Some(Handle::BottomRight),
            Handle::TopMiddle => Some(Handle::BottomMiddle),
            Handle::TopRight => Some(Handle::BottomLeft),
            Handle::MiddleLeft => Some(Handle::MiddleRight),
            Handle::MiddleRight => Some(Handle::MiddleLeft),
            Handle::BottomLeft => Some(Handle::TopRight),
            Handle::BottomMiddle => Some(Handle::TopMiddle),
            Handle::BottomRight => Some(Handle::TopLeft),
            Handle::TransformCenter | Handle::Rotate => None,
        }
    }

    /// Anchor point of a resize handle on `rect`.
    pub fn anchor(self, rect: Rect) -> Option<Point> {
        let center = rect.center();
        let point = match self {
            Handle::TopLeft => Point::new(rect.x0, rect.y0),
            Handle::TopMiddle => Point::new(center.x, rect.y0),
            Handle::TopRight => Point::new(rect.x1, rect.y0),
            Handle::MiddleLeft => Point::new(rect.x0, center.y),
            Handle::MiddleRight => Point::new(rect.x1, center.y),
            Handle::BottomLeft => Point::new(rect.x0, rect.y1),
            Handle::BottomMiddle => Point::new(center.x, rect.y1),
            Handle::BottomRight => Point::new(rect.x1, rect.y1),
            Handle::TransformCenter | Handle::Rotate => return None,
        };
        Some(point)
    }

    /// Cursor to show while hovering this handle on `rect`.
    ///
    /// Diagonal cursors swap when the rect is flipped on exactly one axis.
    pub fn cursor(self, rect: Rect) -> CursorKind {
        let same_sign = (rect.width() > 0.0) == (rect.height() > 0.0);
        let (forward, backward) = if same_sign {
            (CursorKind::ResizeForwardDiagonal, CursorKind::ResizeBackwardDiagonal)
        } else {
            (CursorKind::ResizeBackwardDiagonal, CursorKind::ResizeForwardDiagonal)
        };
        match self {
            Handle::TopLeft | Handle::BottomRight => forward,
            Handle::TopRight | Handle::BottomLeft => backward,
            Handle::TopMiddle | Handle::BottomMiddle => CursorKind::ResizeVertical,
            Handle::MiddleLeft | Handle::MiddleRight => CursorKind::ResizeHorizontal,
            Handle::TransformCenter | Handle::Rotate => CursorKind::Cross,
        }
    }
}

/// Pointer cursor feedback for the manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorKind {
    Arrow,
    Move,
    /// `\` diagonal.
    ResizeForwardDiagonal,
    /// `/` diagonal.
    ResizeBackwardDiagonal,
    ResizeVertical,
    ResizeHorizontal,
    Cross,
}

/// Check whether `handle` is live under `flags`.
///
/// Hit-testing, the outline shape and rendering all go through this single
/// predicate.
pub fn is_handle_active(handle: Handle, flags: TransformFlags) -> bool {
    match handle {
        Handle::Rotate | Handle::TransformCenter => flags.rotatable,
        h if h.is_edge() => flags.resizable && !flags.keep_aspect_ratio,
        _ => flags.resizable,
    }
}

/// Size metrics for handles, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMetrics {
    pub size: f64,
    pub hit_margin: f64,
    pub ring_margin: f64,
    pub ring_tolerance: f64,
}

impl Default for HandleMetrics {
    fn default() -> Self {
        Self::from(&TransformConfig::default())
    }
}

impl From<&TransformConfig> for HandleMetrics {
    fn from(config: &TransformConfig) -> Self {
        Self {
            size: config.handle_size,
            hit_margin: config.handle_hit_margin,
            ring_margin: config.rotate_ring_margin,
            ring_tolerance: config.rotate_ring_tolerance,
        }
    }
}

/// Hit region of a single handle, in the manipulator's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleRegion {
    /// Square region (resize handles and the transform center).
    Square(Rect),
    /// Annulus of the rotate handle.
    Ring { center: Point, radius: f64 },
}

impl HandleRegion {
    /// Center of the region.
    pub fn center(&self) -> Point {
        match self {
            HandleRegion::Square(rect) => rect.center(),
            HandleRegion::Ring { center, .. } => *center,
        }
    }

    /// Bounding box of the region.
    pub fn bounds(&self) -> Rect {
        match self {
            HandleRegion::Square(rect) => *rect,
            HandleRegion::Ring { center, radius } => Circle::new(*center, *radius).bounding_box(),
        }
    }
}

/// The ten handle regions computed for one rect, offset and zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleSet {
    regions: [HandleRegion; 10],
    lod: f64,
    metrics: HandleMetrics,
}

impl HandleSet {
    /// Compute every handle region.
    ///
    /// Handle sizes are divided by `lod` so they keep a constant on-screen
    /// size under zoom.
    pub fn compute(rect: Rect, center_offset: Vec2, lod: f64, metrics: HandleMetrics) -> Self {
        let lod = sanitize_lod(lod);
        let s = metrics.size / lod;
        let square = |p: Point| HandleRegion::Square(Rect::from_center_size(p, Size::new(s, s)));

        let pivot = rect.center() + center_offset;
        let radius = rect.width().hypot(rect.height()) / 2.0 + metrics.ring_margin;

        let mut regions = [HandleRegion::Square(Rect::ZERO); 10];
        for handle in Handle::ALL {
            regions[handle.index()] = match handle.anchor(rect) {
                Some(anchor) => square(anchor),
                None if handle == Handle::TransformCenter => square(pivot),
                None => HandleRegion::Ring {
                    center: pivot,
                    radius,
                },
            };
        }
        Self {
            regions,
            lod,
            metrics,
        }
    }

    /// Region of a handle.
    pub fn region(&self, handle: Handle) -> HandleRegion {
        self.regions[handle.index()]
    }

    /// Zoom level the regions were computed for.
    pub fn lod(&self) -> f64 {
        self.lod
    }

    /// Center of the transform-center handle.
    pub fn transform_center(&self) -> Point {
        self.region(Handle::TransformCenter).center()
    }

    /// Iterate over `(handle, region)` pairs in hit-test order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, HandleRegion)> + '_ {
        Handle::ALL.iter().map(move |&h| (h, self.region(h)))
    }

    /// Iterate over the regions that are live under `flags`.
    pub fn active(&self, flags: TransformFlags) -> impl Iterator<Item = (Handle, HandleRegion)> + '_ {
        self.iter().filter(move |(h, _)| is_handle_active(*h, flags))
    }

    /// Find the first active handle containing `point`.
    pub fn hit_test(&self, point: Point, flags: TransformFlags) -> Option<Handle> {
        self.active(flags)
            .find(|(_, region)| self.region_contains(region, point))
            .map(|(handle, _)| handle)
    }

    fn region_contains(&self, region: &HandleRegion, point: Point) -> bool {
        match region {
            HandleRegion::Square(rect) => {
                let margin = self.metrics.hit_margin;
                rect.inflate(margin, margin).contains(point)
            }
            HandleRegion::Ring { center, radius } => {
                let tolerance = self.metrics.ring_tolerance / self.lod;
                (point.distance(*center) - radius).abs() <= tolerance
            }
        }
    }
}

fn sanitize_lod(lod: f64) -> f64 {
    if lod.is_finite() && lod > 0.0 { lod } else { 1.0 }
}
