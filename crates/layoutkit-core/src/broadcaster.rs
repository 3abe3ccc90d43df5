//! Pushing manipulator deltas to the selected items.
//!
//! The broadcaster samples the proxy's rect, position and rotation after
//! every pointer move, diffs them against the previous sample and applies
//! the incremental scale, translation and rotation to each item. Items are
//! only ever mutated here.

use crate::decompose::rotation_degrees;
use crate::error::{TransformError, TransformResult};
use crate::proxy::TransformRect;
use crate::scene::{ItemId, SceneGraph, SceneItem};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Notification raised while a transform session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformEvent {
    /// Items were scaled by a resize of the proxy.
    ItemsTransformed(Vec<ItemId>),
    ItemsMoved(Vec<ItemId>),
    ItemsRotated(Vec<ItemId>),
    /// Released after at least one update. Carries every item touched
    /// since the press.
    TransformFinished(Vec<ItemId>),
}

impl TransformEvent {
    pub fn items(&self) -> &[ItemId] {
        match self {
            TransformEvent::ItemsTransformed(items)
            | TransformEvent::ItemsMoved(items)
            | TransformEvent::ItemsRotated(items)
            | TransformEvent::TransformFinished(items) => items,
        }
    }
}

/// Tracks proxy samples across one press/move/release cycle.
#[derive(Debug, Clone, Default)]
pub struct TransformBroadcaster {
    last_rect: Option<Rect>,
    last_position: Option<Point>,
    last_angle: Option<f64>,
    touched: Vec<ItemId>,
}

impl TransformBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every tracker. Called whenever the proxy is refitted.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Take the initial sample at pointer-down.
    pub fn begin(&mut self, proxy: &TransformRect) {
        self.last_rect = Some(proxy.rect());
        self.last_position = Some(proxy.position());
        self.last_angle = Some(proxy.rotation_angle());
        self.touched.clear();
    }

    /// Check if a press is being tracked.
    pub fn is_tracking(&self) -> bool {
        self.last_rect.is_some()
    }

    /// Items touched since the press, in first-touch order.
    pub fn touched(&self) -> &[ItemId] {
        &self.touched
    }

    /// Diff the proxy against the last sample and update `items`.
    ///
    /// Resize, move and rotate deltas are applied in that order. Each kind
    /// that updates at least one item produces one event.
    pub fn sample(&mut self, proxy: &TransformRect, scene: &mut dyn SceneGraph, items: &[ItemId]) -> Vec<TransformEvent> {
        let (Some(last_rect), Some(last_position), Some(last_angle)) =
            (self.last_rect, self.last_position, self.last_angle)
        else {
            return Vec::new();
        };
        let mut events = Vec::new();

        let rect = proxy.rect();
        if rect != last_rect {
            let pivot = proxy.opposite_handle_scene_pos();
            match apply_resize(scene, items, last_rect, rect, pivot, proxy.rotation_angle()) {
                Ok(updated) => self.record(updated, TransformEvent::ItemsTransformed, &mut events),
                Err(err) => log::warn!("Resize skipped: {err}"),
            }
        }

        let position = proxy.position();
        if position != last_position {
            let updated = apply_move(scene, items, position - last_position);
            self.record(updated, TransformEvent::ItemsMoved, &mut events);
        }

        let angle = proxy.rotation_angle();
        if angle != last_angle {
            let pivot = proxy.transform_center_scene_pos();
            let updated = apply_rotate(scene, items, angle - last_angle, pivot);
            self.record(updated, TransformEvent::ItemsRotated, &mut events);
        }

        self.last_rect = Some(rect);
        self.last_position = Some(position);
        self.last_angle = Some(angle);
        events
    }

    /// End the cycle at pointer-up.
    ///
    /// Returns the finished event if any item was touched since the press.
    pub fn finish(&mut self) -> Option<TransformEvent> {
        let touched = std::mem::take(&mut self.touched);
        self.reset();
        if touched.is_empty() {
            return None;
        }
        log::debug!("Transform finished on {} item(s)", touched.len());
        Some(TransformEvent::TransformFinished(touched))
    }

    fn record(
        &mut self,
        updated: Vec<ItemId>,
        event: fn(Vec<ItemId>) -> TransformEvent,
        events: &mut Vec<TransformEvent>,
    ) {
        if updated.is_empty() {
            return;
        }
        for id in &updated {
            if !self.touched.contains(id) {
                self.touched.push(*id);
            }
        }
        events.push(event(updated));
    }
}

/// Scale `items` by the change from `old_rect` to `new_rect` about `pivot`.
///
/// `proxy_rotation` (degrees) orients the scale axes in the scene.
/// Rectangle-native items get a new width and height and are repositioned
/// so the pivot stays put; other items get the scale composed onto their
/// transform. Fails without touching anything if `old_rect` has no area.
pub fn apply_resize(
    scene: &mut dyn SceneGraph,
    items: &[ItemId],
    old_rect: Rect,
    new_rect: Rect,
    pivot: Point,
    proxy_rotation: f64,
) -> TransformResult<Vec<ItemId>> {
    if old_rect.width() == 0.0 || old_rect.height() == 0.0 {
        return Err(TransformError::DegenerateGeometry {
            width: old_rect.width(),
            height: old_rect.height(),
        });
    }
    let scale_x = new_rect.width() / old_rect.width();
    let scale_y = new_rect.height() / old_rect.height();
    log::trace!("Resize delta ({scale_x:.4}, {scale_y:.4}) about {pivot:?}");

    let scene_scale = scale_about(pivot, proxy_rotation, scale_x, scale_y);
    Ok(for_each_item(scene, items, |item| {
        if item.is_rectangle_native() {
            resize_rect_item(item, scale_x, scale_y, pivot)
        } else {
            apply_scene_affine(item, scene_scale);
            true
        }
    }))
}

/// Translate `items` by `delta`.
pub fn apply_move(scene: &mut dyn SceneGraph, items: &[ItemId], delta: Vec2) -> Vec<ItemId> {
    log::trace!("Move delta {delta:?}");
    for_each_item(scene, items, |item| {
        item.set_position(item.position() + delta);
        true
    })
}

/// Rotate `items` by `delta` degrees about the scene point `pivot`.
pub fn apply_rotate(scene: &mut dyn SceneGraph, items: &[ItemId], delta: f64, pivot: Point) -> Vec<ItemId> {
    log::trace!("Rotate delta {delta:.4} about {pivot:?}");
    let rotation = Affine::rotate_about(delta.to_radians(), pivot);
    for_each_item(scene, items, |item| {
        apply_scene_affine(item, rotation);
        true
    })
}

fn for_each_item(
    scene: &mut dyn SceneGraph,
    items: &[ItemId],
    mut update: impl FnMut(&mut dyn SceneItem) -> bool,
) -> Vec<ItemId> {
    let mut updated = Vec::with_capacity(items.len());
    for &id in items {
        match scene.item_mut(id) {
            Some(item) => {
                if update(item) {
                    updated.push(id);
                }
            }
            None => log::warn!("{}", TransformError::UnknownItem(id)),
        }
    }
    updated
}

/// Scene-space scale by `(scale_x, scale_y)` along axes rotated by
/// `rotation` degrees, fixing `pivot`.
fn scale_about(pivot: Point, rotation: f64, scale_x: f64, scale_y: f64) -> Affine {
    let angle = rotation.to_radians();
    Affine::translate(pivot.to_vec2())
        * Affine::rotate(angle)
        * Affine::scale_non_uniform(scale_x, scale_y)
        * Affine::rotate(-angle)
        * Affine::translate(-pivot.to_vec2())
}

/// Compose a scene-space affine map onto an item.
///
/// The linear part goes into the item's transform; the resulting offset
/// goes into its position, leaving the transform's own translation as is.
fn apply_scene_affine(item: &mut dyn SceneItem, scene_map: Affine) {
    let scene = scene_map * item.scene_transform();
    let translation = item.transform().translation();
    let [a, b, c, d, e, f] = scene.as_coeffs();
    item.set_transform(Affine::new([a, b, c, d, translation.x, translation.y]));
    item.set_position((Vec2::new(e, f) - translation).to_point());
}

/// Resize a rectangle-native item in its own frame.
///
/// Local points scale by `(scale_x, scale_y)` about the local origin; the
/// position moves by the pivot's local displacement mapped back through
/// the item's linear part, so the pivot keeps its scene position.
fn resize_rect_item(item: &mut dyn SceneItem, scale_x: f64, scale_y: f64, pivot: Point) -> bool {
    let (Some(rect), Some(local_pivot)) = (item.local_rect(), item.map_from_scene(pivot)) else {
        log::warn!(
            "Item {} has a singular transform (rotation {:.3}), resize skipped",
            item.id(),
            rotation_degrees(item.transform())
        );
        return false;
    };
    item.set_local_rect(Rect::new(
        rect.x0 * scale_x,
        rect.y0 * scale_y,
        rect.x1 * scale_x,
        rect.y1 * scale_y,
    ));
    let displacement = Vec2::new((scale_x - 1.0) * local_pivot.x, (scale_y - 1.0) * local_pivot.y);
    let transform = item.transform();
    let offset = transform * displacement.to_point() - transform * Point::ZERO;
    item.set_position(item.position() - offset);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::{compose, decompose};
    use crate::scene::{MemoryScene, SceneNode};

    const EPS: f64 = 1e-6;

    fn assert_point(actual: Point, expected: Point) {
        assert!(
            (actual - expected).hypot() < EPS,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn scene_with(nodes: Vec<SceneNode>) -> (MemoryScene, Vec<ItemId>) {
        let mut scene = MemoryScene::new();
        let ids: Vec<ItemId> = nodes.into_iter().map(|n| scene.add_item(n)).collect();
        scene.select(&ids);
        (scene, ids)
    }

    #[test]
    fn test_resize_rect_item_about_origin() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 100.0, 50.0)]);
        let updated = apply_resize(
            &mut scene,
            &ids,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(0.0, 0.0, 120.0, 60.0),
            Point::ZERO,
            0.0,
        )
        .unwrap();
        assert_eq!(updated, ids);
        let node = scene.get(ids[0]).unwrap();
        let rect = node.local_rect().unwrap();
        assert!((rect.width() - 120.0).abs() < EPS);
        assert!((rect.height() - 60.0).abs() < EPS);
        assert_eq!(node.position, Point::ZERO);
    }

    #[test]
    fn test_resize_keeps_pivot_on_rotated_rect_item() {
        let node = SceneNode::rectangle(Point::new(40.0, 10.0), 80.0, 30.0).with_transform(compose(1.0, 1.0, 25.0));
        let pivot = node.map_to_scene(Point::new(80.0, 30.0));
        let (mut scene, ids) = scene_with(vec![node]);

        apply_resize(
            &mut scene,
            &ids,
            Rect::new(0.0, 0.0, 80.0, 30.0),
            Rect::new(0.0, 0.0, 40.0, 45.0),
            pivot,
            25.0,
        )
        .unwrap();
        let node = scene.get(ids[0]).unwrap();
        assert_eq!(node.local_rect(), Some(Rect::new(0.0, 0.0, 40.0, 45.0)));
        assert_point(node.map_to_scene(Point::new(40.0, 45.0)), pivot);
    }

    #[test]
    fn test_resize_keeps_pivot_on_generic_item() {
        let node = SceneNode::ellipse(Point::new(10.0, 10.0), 60.0, 40.0).with_transform(compose(1.0, 2.0, -40.0));
        let pivot = node.map_to_scene(Point::new(0.0, 40.0));
        let far = node.map_to_scene(Point::new(60.0, 0.0));
        let (mut scene, ids) = scene_with(vec![node]);

        apply_resize(
            &mut scene,
            &ids,
            Rect::new(0.0, 0.0, 60.0, 80.0),
            Rect::new(0.0, 0.0, 90.0, 40.0),
            pivot,
            -40.0,
        )
        .unwrap();
        let node = scene.get(ids[0]).unwrap();
        assert_point(node.map_to_scene(Point::new(0.0, 40.0)), pivot);
        // The far corner moved along the proxy's axes.
        let moved = node.map_to_scene(Point::new(60.0, 0.0));
        let local_shift = Affine::rotate((40.0f64).to_radians()) * (moved - pivot).to_point();
        let original = Affine::rotate((40.0f64).to_radians()) * (far - pivot).to_point();
        assert!((local_shift.x - original.x * 1.5).abs() < EPS);
        assert!((local_shift.y - original.y * 0.5).abs() < EPS);
        let d = decompose(node.transform).unwrap();
        assert!((d.rotation + 40.0).abs() < EPS);
        assert!((d.scale_x - 1.5).abs() < EPS);
        assert!((d.scale_y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_resize_rotated_generic_item_under_unrotated_proxy_shears() {
        // A non-uniform scale along axes that differ from the item's own
        // leaves a sheared transform. Columns stop being orthogonal.
        let node = SceneNode::ellipse(Point::ZERO, 50.0, 50.0).with_transform(compose(1.0, 1.0, 30.0));
        let (mut scene, ids) = scene_with(vec![node]);
        apply_resize(
            &mut scene,
            &ids,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 200.0, 100.0),
            Point::ZERO,
            0.0,
        )
        .unwrap();
        let [a, b, c, d, _, _] = scene.get(ids[0]).unwrap().transform.as_coeffs();
        let dot = a * c + b * d;
        assert!(dot.abs() > 0.1, "expected shear, columns dot {dot}");
    }

    #[test]
    fn test_resize_degenerate_old_rect() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 10.0, 10.0)]);
        let before = scene.get(ids[0]).cloned();
        let err = apply_resize(
            &mut scene,
            &ids,
            Rect::new(0.0, 0.0, 0.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Point::ZERO,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::DegenerateGeometry { .. }));
        assert_eq!(scene.get(ids[0]).cloned(), before);
    }

    #[test]
    fn test_move_all_items() {
        let (mut scene, ids) = scene_with(vec![
            SceneNode::rectangle(Point::ZERO, 10.0, 10.0),
            SceneNode::ellipse(Point::new(50.0, 5.0), 10.0, 10.0),
        ]);
        let updated = apply_move(&mut scene, &ids, Vec2::new(3.0, -4.0));
        assert_eq!(updated.len(), 2);
        assert_eq!(scene.get(ids[0]).unwrap().position, Point::new(3.0, -4.0));
        assert_eq!(scene.get(ids[1]).unwrap().position, Point::new(53.0, 1.0));
    }

    #[test]
    fn test_rotate_about_external_pivot() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::new(100.0, 0.0), 20.0, 20.0)]);
        apply_rotate(&mut scene, &ids, 90.0, Point::ZERO);
        let node = scene.get(ids[0]).unwrap();
        assert_point(node.map_to_scene(Point::ZERO), Point::new(0.0, 100.0));
        assert!((rotation_degrees(node.transform) - 90.0).abs() < EPS);
    }

    #[test]
    fn test_unknown_items_skipped() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 10.0, 10.0)]);
        let ghost = ItemId::new_v4();
        let updated = apply_move(&mut scene, &[ghost, ids[0]], Vec2::new(1.0, 1.0));
        assert_eq!(updated, vec![ids[0]]);
    }

    #[test]
    fn test_sample_without_begin_is_inert() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 10.0, 10.0)]);
        let mut proxy = TransformRect::default();
        proxy.set_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut broadcaster = TransformBroadcaster::new();
        proxy.set_position(Point::new(5.0, 5.0));
        assert!(broadcaster.sample(&proxy, &mut scene, &ids).is_empty());
        assert_eq!(broadcaster.finish(), None);
    }

    #[test]
    fn test_touched_set_accumulates_across_samples() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 10.0, 10.0)]);
        let mut proxy = TransformRect::default();
        proxy.set_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut broadcaster = TransformBroadcaster::new();
        broadcaster.begin(&proxy);

        proxy.set_position(Point::new(5.0, 0.0));
        let events = broadcaster.sample(&proxy, &mut scene, &ids);
        assert_eq!(events, vec![TransformEvent::ItemsMoved(ids.clone())]);

        // A sample with no change keeps the touched set.
        assert!(broadcaster.sample(&proxy, &mut scene, &ids).is_empty());
        assert_eq!(broadcaster.touched(), ids.as_slice());

        assert_eq!(broadcaster.finish(), Some(TransformEvent::TransformFinished(ids.clone())));
        assert!(!broadcaster.is_tracking());
    }

    #[test]
    fn test_zero_angle_is_tracked() {
        let (mut scene, ids) = scene_with(vec![SceneNode::rectangle(Point::ZERO, 10.0, 10.0)]);
        let mut proxy = TransformRect::default();
        proxy.set_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut broadcaster = TransformBroadcaster::new();
        broadcaster.begin(&proxy);
        proxy.set_rotation(45.0);
        let events = broadcaster.sample(&proxy, &mut scene, &ids);
        assert_eq!(events, vec![TransformEvent::ItemsRotated(ids.clone())]);
        let node = scene.get(ids[0]).unwrap();
        assert!((rotation_degrees(node.transform) - 45.0).abs() < EPS);
    }
}
