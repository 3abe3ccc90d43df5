//! In-memory scene graph.

use super::{ItemGeometry, ItemId, SceneGraph, SceneItem, SceneNode};
use crate::camera::Camera;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Scene graph holding [`SceneNode`]s, an ordered selection and a view camera.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    items: HashMap<ItemId, SceneNode>,
    /// Back to front.
    z_order: Vec<ItemId>,
    /// Selection order.
    selection: Vec<ItemId>,
    pub camera: Camera,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item and return its id.
    ///
    /// A rectangle whose local rect does not start at the origin has that
    /// offset moved into its position, so rectangle-native items always have
    /// a local rect of `(0, 0, w, h)`.
    pub fn add_item(&mut self, mut node: SceneNode) -> ItemId {
        if let ItemGeometry::Rectangle(rect) = &mut node.geometry {
            let normalized = rect.abs();
            let origin = Vec2::new(normalized.x0, normalized.y0);
            if origin != Vec2::ZERO {
                let linear = node.transform * origin.to_point() - node.transform * Point::ZERO;
                node.position += linear;
                log::debug!("Normalized rect origin {origin:?} of item {}", node.id);
            }
            *rect = Rect::new(0.0, 0.0, normalized.width(), normalized.height());
        }
        let id = node.id;
        if self.items.insert(id, node).is_none() {
            self.z_order.push(id);
        }
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&SceneNode> {
        self.items.get(&id)
    }

    /// Items back to front.
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &SceneNode> {
        self.z_order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the selection. Unknown ids and duplicates are dropped.
    pub fn select(&mut self, ids: &[ItemId]) {
        self.clear_selection();
        for &id in ids {
            self.add_to_selection(id);
        }
    }

    pub fn add_to_selection(&mut self, id: ItemId) {
        if self.items.contains_key(&id) && !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

impl SceneGraph for MemoryScene {
    fn selected_items(&self) -> Vec<ItemId> {
        self.selection.clone()
    }

    fn item(&self, id: ItemId) -> Option<&dyn SceneItem> {
        self.items.get(&id).map(|node| node as &dyn SceneItem)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn SceneItem> {
        self.items.get_mut(&id).map(|node| node as &mut dyn SceneItem)
    }

    fn current_zoom_level(&self) -> f64 {
        self.camera.level_of_detail()
    }
}
