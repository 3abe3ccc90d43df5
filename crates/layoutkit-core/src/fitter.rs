//! Fitting the manipulator to the current selection.

use crate::config::TransformConfig;
use crate::decompose::{decompose, decompose_rect, mapped_corners, rotation_degrees, undo_rotation_scale};
use crate::error::{TransformError, TransformResult};
use crate::proxy::TransformRect;
use crate::scene::{ItemId, SceneGraph, SceneItem};
use kurbo::{Point, Rect};

/// Proxy geometry that represents a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionFit {
    /// Local rect of the proxy.
    pub rect: Rect,
    /// Rotation of the proxy about its rect center, in degrees.
    pub rotation: f64,
    /// Scene point the rotated rect center lands on.
    pub scene_center: Point,
    /// Aspect lock to apply for this selection.
    pub keep_aspect_ratio: bool,
}

impl SelectionFit {
    /// Rebuild `proxy` from scratch with this fit.
    ///
    /// The proxy is reset first, so the transform-center offset and any
    /// in-flight press are discarded.
    pub fn apply_to(&self, proxy: &mut TransformRect) {
        proxy.reset();
        proxy.set_keep_aspect_ratio(self.keep_aspect_ratio);
        proxy.set_rect(self.rect);
        proxy.set_rotation(self.rotation);
        // Rotation is about the rect center, which therefore maps to itself.
        proxy.set_position(self.scene_center - self.rect.center().to_vec2());
    }
}

/// Exact fit of a single item.
///
/// The rect is the item's unrotated size in scene units and the rotation
/// is the item's own.
pub fn fit_single(item: &dyn SceneItem, config: &TransformConfig) -> TransformResult<SelectionFit> {
    let transform = item.transform();
    let rect = match item.local_rect() {
        Some(local) => decompose_rect(transform, local)?.0,
        None => {
            let d = decompose(transform)?;
            let corners = mapped_corners(item.scene_transform(), item.bounding_rect());
            let center = item.map_to_scene(item.bounding_rect().center());
            let local = undo_rotation_scale(&corners, center, d.rotation, d.scale_x, d.scale_y)?;
            Rect::new(0.0, 0.0, local.width() * d.scale_x, local.height() * d.scale_y)
        }
    };
    Ok(SelectionFit {
        rect,
        rotation: rotation_degrees(transform),
        scene_center: item.scene_bounding_rect().center(),
        keep_aspect_ratio: config.flags.keep_aspect_ratio,
    })
}

/// Axis-aligned fit of several items.
///
/// The rect is the union of their scene bounding boxes and the proxy stays
/// unrotated. Any member rotated past the configured epsilon forces the
/// aspect lock, since a non-uniform scale would shear it.
pub fn fit_multiple(items: &[&dyn SceneItem], config: &TransformConfig) -> Option<SelectionFit> {
    let (first, rest) = items.split_first()?;
    let union = rest
        .iter()
        .fold(first.scene_bounding_rect(), |rect, item| rect.union(item.scene_bounding_rect()));
    let has_rotation = items
        .iter()
        .any(|item| rotation_degrees(item.transform()).abs() > config.rotation_lock_epsilon);

    Some(SelectionFit {
        rect: union,
        rotation: 0.0,
        scene_center: union.center(),
        keep_aspect_ratio: has_rotation || config.flags.keep_aspect_ratio,
    })
}

/// Fit the items with the given ids.
///
/// Ids missing from the scene are skipped. Returns `None` if nothing is
/// left to fit. A single item whose transform cannot be decomposed falls
/// back to an empty rect at its scene center.
pub fn fit_selection(scene: &dyn SceneGraph, ids: &[ItemId], config: &TransformConfig) -> Option<SelectionFit> {
    let items: Vec<&dyn SceneItem> = ids
        .iter()
        .filter_map(|&id| {
            let item = scene.item(id);
            if item.is_none() {
                log::warn!("{}", TransformError::UnknownItem(id));
            }
            item
        })
        .collect();

    let fit = match items.as_slice() {
        [] => return None,
        [item] => fit_single(*item, config).unwrap_or_else(|err| {
            log::warn!("Cannot fit item {}: {err}", item.id());
            SelectionFit {
                rect: Rect::ZERO,
                rotation: 0.0,
                scene_center: item.scene_bounding_rect().center(),
                keep_aspect_ratio: config.flags.keep_aspect_ratio,
            }
        }),
        many => fit_multiple(many, config)?,
    };
    log::debug!(
        "Fitted {} item(s): rect {:?}, rotation {:.3}",
        items.len(),
        fit.rect,
        fit.rotation
    );
    Some(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::compose;
    use crate::scene::{MemoryScene, SceneNode};
    use kurbo::Affine;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_fit_single_rect_item() {
        let node = SceneNode::rectangle(Point::new(10.0, 20.0), 100.0, 50.0);
        let fit = fit_single(&node, &TransformConfig::default()).unwrap();
        assert_eq!(fit.rect, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(fit.rotation.abs() < EPS);
        assert_eq!(fit.scene_center, Point::new(60.0, 45.0));
    }

    #[test]
    fn test_fit_single_rotated_scaled_rect() {
        let node = SceneNode::rectangle(Point::ZERO, 100.0, 50.0).with_transform(compose(2.0, 1.0, 30.0));
        let fit = fit_single(&node, &TransformConfig::default()).unwrap();
        assert!((fit.rect.width() - 200.0).abs() < EPS);
        assert!((fit.rect.height() - 50.0).abs() < EPS);
        assert!((fit.rotation - 30.0).abs() < EPS);

        let mut proxy = TransformRect::default();
        fit.apply_to(&mut proxy);
        // The proxy outline lands exactly on the item outline.
        for (local, scene) in [
            (Point::new(0.0, 0.0), Point::new(0.0, 0.0)),
            (Point::new(100.0, 50.0), Point::new(200.0, 50.0)),
        ] {
            let expected = node.map_to_scene(local);
            let actual = proxy.map_to_scene(scene);
            assert!((expected - actual).hypot() < EPS, "{expected:?} vs {actual:?}");
        }
    }

    #[test]
    fn test_fit_single_generic_item() {
        let node = SceneNode::ellipse(Point::new(50.0, 50.0), 40.0, 20.0)
            .with_transform(Affine::translate((5.0, 5.0)) * compose(1.5, 3.0, -60.0));
        let fit = fit_single(&node, &TransformConfig::default()).unwrap();
        assert!((fit.rect.width() - 60.0).abs() < EPS);
        assert!((fit.rect.height() - 60.0).abs() < EPS);
        assert!((fit.rotation + 60.0).abs() < EPS);

        let center = node.map_to_scene(Point::new(20.0, 10.0));
        assert!((fit.scene_center - center).hypot() < EPS);
    }

    #[test]
    fn test_fit_single_degenerate_falls_back() {
        let mut scene = MemoryScene::new();
        let id = scene.add_item(
            SceneNode::ellipse(Point::new(5.0, 5.0), 10.0, 10.0).with_transform(Affine::scale_non_uniform(0.0, 1.0)),
        );
        scene.select(&[id]);
        let fit = fit_selection(&scene, &[id], &TransformConfig::default()).unwrap();
        assert_eq!(fit.rect, Rect::ZERO);
        assert!(fit.rotation.abs() < EPS);
    }

    #[test]
    fn test_fit_multiple_union() {
        let a = SceneNode::rectangle(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = SceneNode::rectangle(Point::new(200.0, 0.0), 50.0, 50.0);
        let fit = fit_multiple(&[&a, &b], &TransformConfig::default()).unwrap();
        assert_eq!(fit.rect, Rect::new(0.0, 0.0, 250.0, 50.0));
        assert!(!fit.keep_aspect_ratio);

        let mut proxy = TransformRect::default();
        fit.apply_to(&mut proxy);
        assert_eq!(proxy.position(), Point::ZERO);
        assert_eq!(proxy.rect(), Rect::new(0.0, 0.0, 250.0, 50.0));
    }

    #[test]
    fn test_fit_multiple_rotation_lock() {
        let config = TransformConfig::default();
        let rotated = SceneNode::rectangle(Point::ZERO, 50.0, 50.0).with_transform(compose(1.0, 1.0, 15.0));
        let plain = SceneNode::rectangle(Point::new(100.0, 0.0), 50.0, 50.0);
        assert!(fit_multiple(&[&rotated, &plain], &config).unwrap().keep_aspect_ratio);

        let barely = SceneNode::rectangle(Point::ZERO, 50.0, 50.0).with_transform(compose(1.0, 1.0, 0.05));
        assert!(!fit_multiple(&[&barely, &plain], &config).unwrap().keep_aspect_ratio);
    }

    #[test]
    fn test_fit_selection_skips_unknown_ids() {
        let mut scene = MemoryScene::new();
        let id = scene.add_item(SceneNode::rectangle(Point::ZERO, 10.0, 10.0));
        let fit = fit_selection(&scene, &[ItemId::new_v4(), id], &TransformConfig::default()).unwrap();
        assert_eq!(fit.rect, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(fit_selection(&scene, &[], &TransformConfig::default()).is_none());
    }
}
