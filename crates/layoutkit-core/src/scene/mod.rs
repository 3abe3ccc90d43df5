//! Scene collaborators consumed by the transform engine.
//!
//! The engine never owns items. It reads transforms and bounds through
//! [`SceneItem`] and writes new transforms and positions back; storage,
//! selection bookkeeping and zoom come from a [`SceneGraph`].

mod memory;
mod node;

pub use memory::MemoryScene;
pub use node::{ItemGeometry, SceneNode};

use kurbo::{Affine, Point, Rect};
use uuid::Uuid;

/// Unique identifier for a scene item.
pub type ItemId = Uuid;

/// A transformable item in the scene.
///
/// An item's scene transform is `translate(position) * transform`, with
/// `transform` acting on the item's local coordinates.
pub trait SceneItem {
    fn id(&self) -> ItemId;

    /// Local transform (linear part plus translation).
    fn transform(&self) -> Affine;

    fn set_transform(&mut self, transform: Affine);

    /// Position of the local origin in scene coordinates.
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Bounding rectangle in local coordinates.
    fn bounding_rect(&self) -> Rect;

    /// Native rectangle geometry, if the item is a rectangle.
    fn local_rect(&self) -> Option<Rect> {
        None
    }

    /// Replace the native rectangle geometry. Ignored by non-rectangle items.
    fn set_local_rect(&mut self, _rect: Rect) {}

    /// Check if the item's geometry is a rectangle with its own width and height.
    fn is_rectangle_native(&self) -> bool {
        self.local_rect().is_some()
    }

    /// Local to scene transform.
    fn scene_transform(&self) -> Affine {
        Affine::translate(self.position().to_vec2()) * self.transform()
    }

    /// Axis-aligned bounding box in scene coordinates.
    fn scene_bounding_rect(&self) -> Rect {
        self.scene_transform().transform_rect_bbox(self.bounding_rect())
    }

    fn map_to_scene(&self, point: Point) -> Point {
        self.scene_transform() * point
    }

    /// Map a scene point into local coordinates. `None` if the transform is singular.
    fn map_from_scene(&self, point: Point) -> Option<Point> {
        let scene = self.scene_transform();
        if scene.determinant().abs() <= f64::EPSILON {
            return None;
        }
        Some(scene.inverse() * point)
    }
}

/// Storage and selection provider for the transform engine.
pub trait SceneGraph {
    /// Currently selected item ids, in selection order.
    fn selected_items(&self) -> Vec<ItemId>;

    fn item(&self, id: ItemId) -> Option<&dyn SceneItem>;

    fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn SceneItem>;

    /// Zoom factor of the view.
    fn current_zoom_level(&self) -> f64;
}
