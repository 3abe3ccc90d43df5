//! The manipulator rectangle.
//!
//! [`TransformRect`] is the proxy the user drags. It owns its own rect,
//! scene position, rotation and transform-center offset and never touches
//! scene items; the broadcaster observes its geometry between pointer
//! samples and pushes the deltas to the selection.
//!
//! The proxy's scene transform is `translate(position) * transform`, where
//! `transform` is always a pure rotation about some local point.

use crate::config::{TransformConfig, TransformFlags};
use crate::decompose::{normalize_degrees, vector_angle};
use crate::error::{TransformError, TransformResult};
use crate::handles::{CursorKind, Handle, HandleMetrics, HandleRegion, HandleSet};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape, Vec2};

/// Zoom changes at or below this do not recompute the handles.
const LOD_EPSILON: f64 = 0.001;
/// Flattening tolerance for the outline path.
const PATH_TOLERANCE: f64 = 0.1;

/// Interaction state of the manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ManipulatorState {
    #[default]
    Idle,
    /// Pointer is down; `None` means inside the rect but not on a handle.
    Pressed(Option<Handle>),
    Resizing(Handle),
    Rotating,
    RepositioningCenter,
    Moving,
}

impl ManipulatorState {
    /// Check if a press is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, ManipulatorState::Idle)
    }

    /// Handle driving the current interaction.
    pub fn handle(&self) -> Option<Handle> {
        match self {
            ManipulatorState::Pressed(handle) => *handle,
            ManipulatorState::Resizing(handle) => Some(*handle),
            ManipulatorState::Rotating => Some(Handle::Rotate),
            ManipulatorState::RepositioningCenter => Some(Handle::TransformCenter),
            ManipulatorState::Idle | ManipulatorState::Moving => None,
        }
    }
}

/// Geometry captured at pointer-down. Every drag is recomputed from it.
#[derive(Debug, Clone, Copy)]
struct PressSnapshot {
    scene_point: Point,
    local_point: Point,
    rect: Rect,
    position: Point,
    transform: Affine,
    rotation_angle: f64,
    center_offset: Vec2,
    lock_aspect: bool,
}

/// The manipulator rectangle with eight resize handles, a rotate ring and
/// a transform-center handle.
#[derive(Debug, Clone)]
pub struct TransformRect {
    rect: Rect,
    position: Point,
    transform: Affine,
    /// Accumulated rotation in degrees, in `[0, 360)`.
    rotation_angle: f64,
    transform_center_offset: Vec2,
    flags: TransformFlags,
    bound_rect: Option<Rect>,
    metrics: HandleMetrics,
    lod: f64,
    handles: HandleSet,
    state: ManipulatorState,
    press: Option<PressSnapshot>,
}

impl Default for TransformRect {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

impl TransformRect {
    /// Create an empty manipulator from a configuration.
    pub fn new(config: &TransformConfig) -> Self {
        let metrics = HandleMetrics::from(config);
        Self {
            rect: Rect::ZERO,
            position: Point::ZERO,
            transform: Affine::IDENTITY,
            rotation_angle: 0.0,
            transform_center_offset: Vec2::ZERO,
            flags: config.flags,
            bound_rect: config.bound_rect,
            metrics,
            lod: 1.0,
            handles: HandleSet::compute(Rect::ZERO, Vec2::ZERO, 1.0, metrics),
            state: ManipulatorState::Idle,
            press: None,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Position of the local origin in scene coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn transform_center_offset(&self) -> Vec2 {
        self.transform_center_offset
    }

    pub fn flags(&self) -> TransformFlags {
        self.flags
    }

    pub fn bound_rect(&self) -> Option<Rect> {
        self.bound_rect
    }

    pub fn lod(&self) -> f64 {
        self.lod
    }

    pub fn handles(&self) -> &HandleSet {
        &self.handles
    }

    pub fn state(&self) -> ManipulatorState {
        self.state
    }

    /// Handle of the current press, if any.
    pub fn pressed_handle(&self) -> Option<Handle> {
        self.state.handle()
    }

    /// Local to scene transform.
    pub fn scene_transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2()) * self.transform
    }

    pub fn map_to_scene(&self, point: Point) -> Point {
        self.scene_transform() * point
    }

    /// Map a scene point into the rect's local coordinates.
    pub fn map_from_scene(&self, point: Point) -> Point {
        // A translated rotation is always invertible.
        self.scene_transform().inverse() * point
    }

    /// Replace the rect and recompute the handles.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
        self.update_handles(false);
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_flags(&mut self, flags: TransformFlags) {
        self.flags = flags;
    }

    pub fn set_movable(&mut self, movable: bool) {
        self.flags.movable = movable;
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.flags.resizable = resizable;
    }

    pub fn set_rotatable(&mut self, rotatable: bool) {
        self.flags.rotatable = rotatable;
    }

    pub fn set_keep_aspect_ratio(&mut self, keep_aspect_ratio: bool) {
        self.flags.keep_aspect_ratio = keep_aspect_ratio;
    }

    pub fn set_bound_rect(&mut self, bound_rect: Option<Rect>) {
        self.bound_rect = bound_rect;
    }

    pub fn set_metrics(&mut self, metrics: HandleMetrics) {
        self.metrics = metrics;
        self.update_handles(false);
    }

    /// Update the zoom level. Returns true if the handles were recomputed.
    pub fn set_lod(&mut self, lod: f64) -> bool {
        let lod = if lod.is_finite() && lod > 0.0 { lod } else { 1.0 };
        if (lod - self.lod).abs() <= LOD_EPSILON {
            return false;
        }
        self.lod = lod;
        self.update_handles(false);
        true
    }

    /// Return to an empty, unrotated rect at the scene origin.
    pub fn reset(&mut self) {
        self.rect = Rect::ZERO;
        self.position = Point::ZERO;
        self.transform = Affine::IDENTITY;
        self.rotation_angle = 0.0;
        self.transform_center_offset = Vec2::ZERO;
        self.state = ManipulatorState::Idle;
        self.press = None;
        self.update_handles(false);
    }

    /// Rotate to an absolute angle about the transform center.
    pub fn set_rotation(&mut self, angle: f64) {
        let pivot = self.rect.center() + self.transform_center_offset;
        self.transform = Affine::rotate_about(angle.to_radians(), pivot);
        self.rotation_angle = normalize_degrees(angle);
        self.update_handles(false);
    }

    pub fn reset_rotation(&mut self) {
        self.transform = Affine::IDENTITY;
        self.rotation_angle = 0.0;
        self.update_handles(false);
    }

    pub fn reset_transform_center(&mut self) {
        self.transform_center_offset = Vec2::ZERO;
        self.update_handles(false);
    }

    /// Scene position of the transform center.
    pub fn transform_center_scene_pos(&self) -> Point {
        self.map_to_scene(self.rect.center() + self.transform_center_offset)
    }

    /// Local position of the handle opposite the pressed one.
    ///
    /// Falls back to the rect center when nothing is pressed or the pressed
    /// handle has no opposite.
    pub fn opposite_handle_pos(&self) -> Point {
        self.pressed_handle()
            .and_then(Handle::opposite)
            .map(|opposite| self.handles.region(opposite).center())
            .unwrap_or_else(|| self.rect.center())
    }

    /// Scene position of [`opposite_handle_pos`](Self::opposite_handle_pos).
    pub fn opposite_handle_scene_pos(&self) -> Point {
        self.map_to_scene(self.opposite_handle_pos())
    }

    /// Check if a scene point lies inside the rect.
    pub fn contains(&self, scene_point: Point) -> bool {
        self.rect.abs().contains(self.map_from_scene(scene_point))
    }

    /// Handle under a scene point, honoring the capability flags.
    pub fn handle_at(&self, scene_point: Point) -> Option<Handle> {
        self.handles.hit_test(self.map_from_scene(scene_point), self.flags)
    }

    /// Cursor to show while hovering a scene point.
    pub fn hover_cursor(&self, scene_point: Point) -> CursorKind {
        match self.handle_at(scene_point) {
            Some(handle) => handle.cursor(self.rect),
            None if self.flags.movable && self.contains(scene_point) => CursorKind::Move,
            None => CursorKind::Arrow,
        }
    }

    /// Outline of the rect plus every active handle, in local coordinates.
    pub fn shape(&self) -> BezPath {
        let mut path = self.rect.abs().to_path(PATH_TOLERANCE);
        for (_, region) in self.handles.active(self.flags) {
            match region {
                HandleRegion::Square(rect) => path.extend(rect.path_elements(PATH_TOLERANCE)),
                HandleRegion::Ring { center, radius } => {
                    path.extend(Circle::new(center, radius).path_elements(PATH_TOLERANCE));
                }
            }
        }
        path
    }

    /// Local area covered by the rect and all of its handles.
    pub fn bounding_rect(&self) -> Rect {
        self.handles
            .iter()
            .fold(self.rect.abs(), |bounds, (_, region)| bounds.union(region.bounds()))
    }

    /// Start an interaction at a scene point.
    ///
    /// Returns true if the press hit a handle, or landed inside the rect of
    /// a movable manipulator. `lock_aspect` keeps the press-time aspect
    /// ratio on corner drags even when the flag is off.
    pub fn pointer_down(&mut self, scene_point: Point, lock_aspect: bool) -> bool {
        let local_point = self.map_from_scene(scene_point);
        let handle = self.handles.hit_test(local_point, self.flags);
        if handle.is_none() && !(self.flags.movable && self.rect.abs().contains(local_point)) {
            return false;
        }

        self.state = ManipulatorState::Pressed(handle);
        self.press = Some(PressSnapshot {
            scene_point,
            local_point,
            rect: self.rect,
            position: self.position,
            transform: self.transform,
            rotation_angle: self.rotation_angle,
            center_offset: self.transform_center_offset,
            lock_aspect,
        });
        log::debug!("Manipulator pressed at {scene_point:?} on {handle:?}");
        true
    }

    /// Continue the interaction. Returns true if the geometry changed.
    pub fn pointer_move(&mut self, scene_point: Point) -> bool {
        let Some(press) = self.press else {
            return false;
        };
        match self.state {
            ManipulatorState::Idle => false,
            ManipulatorState::Pressed(Some(Handle::Rotate)) | ManipulatorState::Rotating => {
                if !self.flags.rotatable {
                    return false;
                }
                self.state = ManipulatorState::Rotating;
                self.rotate_to(scene_point, &press)
            }
            ManipulatorState::Pressed(Some(Handle::TransformCenter))
            | ManipulatorState::RepositioningCenter => {
                if !self.flags.rotatable {
                    return false;
                }
                self.state = ManipulatorState::RepositioningCenter;
                self.reposition_center(scene_point)
            }
            ManipulatorState::Pressed(Some(handle)) | ManipulatorState::Resizing(handle) => {
                if !self.flags.resizable {
                    return false;
                }
                self.state = ManipulatorState::Resizing(handle);
                self.resize_to(handle, scene_point, &press)
            }
            ManipulatorState::Pressed(None) | ManipulatorState::Moving => {
                if !self.flags.movable {
                    return false;
                }
                self.state = ManipulatorState::Moving;
                self.move_to(scene_point, &press)
            }
        }
    }

    /// End the interaction. Returns true if a press was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let was_active = self.state.is_active();
        if was_active {
            log::debug!("Manipulator released from {:?}", self.state);
        }
        self.state = ManipulatorState::Idle;
        self.press = None;
        was_active
    }

    fn resize_to(&mut self, handle: Handle, scene_point: Point, press: &PressSnapshot) -> bool {
        let rect = match self.resized_rect(handle, scene_point, press) {
            Ok(rect) => rect,
            Err(err) => {
                log::trace!("Resize to {scene_point:?} rejected: {err}");
                return false;
            }
        };
        if rect == self.rect {
            return false;
        }

        self.rect = rect;
        let keep_center = self.transform_center_offset != Vec2::ZERO;
        self.update_handles(keep_center);
        true
    }

    /// Rect produced by dragging `handle` to `scene_point`.
    ///
    /// A rect with no width or height is rejected, so the items are never
    /// flattened. A rect whose scene bounds leave the bound rect is rejected
    /// too and the previous rect stays.
    fn resized_rect(&self, handle: Handle, scene_point: Point, press: &PressSnapshot) -> TransformResult<Rect> {
        let delta = self.map_from_scene(scene_point) - press.local_point;
        let keep_aspect = (self.flags.keep_aspect_ratio || press.lock_aspect) && handle.is_corner();
        let rect = if keep_aspect {
            aspect_resize(press.rect, handle, delta).ok_or(TransformError::DegenerateGeometry {
                width: press.rect.width(),
                height: press.rect.height(),
            })?
        } else {
            free_resize(press.rect, handle, delta)
        };

        if rect.width().abs() <= f64::EPSILON || rect.height().abs() <= f64::EPSILON {
            return Err(TransformError::DegenerateGeometry {
                width: rect.width(),
                height: rect.height(),
            });
        }
        if let Some(bound) = self.bound_rect {
            let scene_bounds = self.scene_transform().transform_rect_bbox(rect.abs());
            if !contains_rect(bound, scene_bounds) {
                return Err(TransformError::OutOfBounds);
            }
        }
        Ok(rect)
    }

    fn rotate_to(&mut self, scene_point: Point, press: &PressSnapshot) -> bool {
        let pivot_local = press.rect.center() + press.center_offset;
        let pivot_scene = Affine::translate(press.position.to_vec2()) * press.transform * pivot_local;
        let start = press.scene_point - pivot_scene;
        let current = scene_point - pivot_scene;
        if start.hypot() <= f64::EPSILON || current.hypot() <= f64::EPSILON {
            return false;
        }

        let angle = vector_angle(current) - vector_angle(start);
        self.transform = press.transform * Affine::rotate_about(angle.to_radians(), pivot_local);
        self.rotation_angle = normalize_degrees(press.rotation_angle + angle);
        self.update_handles(false);
        true
    }

    fn reposition_center(&mut self, scene_point: Point) -> bool {
        let offset = self.map_from_scene(scene_point) - self.rect.center();
        if offset == self.transform_center_offset {
            return false;
        }
        self.transform_center_offset = offset;
        self.update_handles(false);
        true
    }

    fn move_to(&mut self, scene_point: Point, press: &PressSnapshot) -> bool {
        let previous = self.position;
        self.position = press.position + (scene_point - press.scene_point);
        if let Some(bound) = self.bound_rect {
            self.clamp_into(bound);
        }
        self.position != previous
    }

    /// Shift the position so the scene bounds sit inside `bound`, per axis.
    fn clamp_into(&mut self, bound: Rect) {
        let bounds = self.scene_transform().transform_rect_bbox(self.rect.abs());
        let mut shift = Vec2::ZERO;
        if bounds.x0 < bound.x0 {
            shift.x += bound.x0 - bounds.x0;
        }
        if bounds.x1 > bound.x1 {
            shift.x += bound.x1 - bounds.x1;
        }
        if bounds.y0 < bound.y0 {
            shift.y += bound.y0 - bounds.y0;
        }
        if bounds.y1 > bound.y1 {
            shift.y += bound.y1 - bounds.y1;
        }
        self.position += shift;
    }

    fn update_handles(&mut self, keep_transform_center: bool) {
        if keep_transform_center {
            self.transform_center_offset = self.handles.transform_center() - self.rect.center();
        }
        self.handles = HandleSet::compute(self.rect, self.transform_center_offset, self.lod, self.metrics);
    }
}

/// Move the edges driven by `handle` by `delta`.
fn free_resize(rect: Rect, handle: Handle, delta: Vec2) -> Rect {
    let mut rect = rect;
    if handle.moves_left() {
        rect.x0 += delta.x;
    }
    if handle.moves_right() {
        rect.x1 += delta.x;
    }
    if handle.moves_top() {
        rect.y0 += delta.y;
    }
    if handle.moves_bottom() {
        rect.y1 += delta.y;
    }
    rect
}

/// Corner resize keeping the aspect ratio of `rect`, anchored at the
/// diagonally opposite corner. `None` if `rect` has no area.
fn aspect_resize(rect: Rect, handle: Handle, delta: Vec2) -> Option<Rect> {
    let (w0, h0) = (rect.width(), rect.height());
    if w0.abs() <= f64::EPSILON || h0.abs() <= f64::EPSILON {
        return None;
    }
    let ratio = w0 / h0;
    let sign_x = if handle.moves_left() { -1.0 } else { 1.0 };
    let width = if sign_x * delta.x > 0.0 {
        w0 + delta.x.abs()
    } else {
        w0 - delta.x.abs()
    };
    let height = width / ratio;

    let rect = match handle {
        Handle::TopLeft => Rect::new(rect.x1 - width, rect.y1 - height, rect.x1, rect.y1),
        Handle::TopRight => Rect::new(rect.x0, rect.y1 - height, rect.x0 + width, rect.y1),
        Handle::BottomLeft => Rect::new(rect.x1 - width, rect.y0, rect.x1, rect.y0 + height),
        Handle::BottomRight => Rect::new(rect.x0, rect.y0, rect.x0 + width, rect.y0 + height),
        _ => return None,
    };
    Some(rect)
}

fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}
