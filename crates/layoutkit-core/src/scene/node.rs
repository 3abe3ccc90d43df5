//! In-memory scene item.

use super::{ItemId, SceneItem};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local geometry of a scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemGeometry {
    /// Rectangle-native geometry, resized through its width and height.
    Rectangle(Rect),
    /// Ellipse inscribed in a rect. Resized through its transform.
    Ellipse(Rect),
    /// Closed polygon. Resized through its transform.
    Polygon(Vec<Point>),
}

impl ItemGeometry {
    /// Local bounding box.
    pub fn bounds(&self) -> Rect {
        match self {
            ItemGeometry::Rectangle(rect) | ItemGeometry::Ellipse(rect) => rect.abs(),
            ItemGeometry::Polygon(points) => points
                .split_first()
                .map(|(first, rest)| {
                    rest.iter()
                        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
                })
                .unwrap_or(Rect::ZERO),
        }
    }
}

/// A scene item stored by [`MemoryScene`](super::MemoryScene).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default = "Uuid::new_v4")]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default = "identity")]
    pub transform: Affine,
    pub geometry: ItemGeometry,
}

fn identity() -> Affine {
    Affine::IDENTITY
}

impl SceneNode {
    pub fn new(position: Point, geometry: ItemGeometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            position,
            transform: Affine::IDENTITY,
            geometry,
        }
    }

    /// Rectangle item with local rect `(0, 0, width, height)`.
    pub fn rectangle(position: Point, width: f64, height: f64) -> Self {
        Self::new(position, ItemGeometry::Rectangle(Rect::new(0.0, 0.0, width, height)))
    }

    pub fn ellipse(position: Point, width: f64, height: f64) -> Self {
        Self::new(position, ItemGeometry::Ellipse(Rect::new(0.0, 0.0, width, height)))
    }

    pub fn polygon(position: Point, points: Vec<Point>) -> Self {
        Self::new(position, ItemGeometry::Polygon(points))
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl SceneItem for SceneNode {
    fn id(&self) -> ItemId {
        self.id
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn bounding_rect(&self) -> Rect {
        self.geometry.bounds()
    }

    fn local_rect(&self) -> Option<Rect> {
        match &self.geometry {
            ItemGeometry::Rectangle(rect) => Some(*rect),
            _ => None,
        }
    }

    fn set_local_rect(&mut self, rect: Rect) {
        if let ItemGeometry::Rectangle(current) = &mut self.geometry {
            *current = rect.abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_is_native() {
        let node = SceneNode::rectangle(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!(node.is_rectangle_native());
        assert_eq!(node.local_rect(), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(node.scene_bounding_rect(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_polygon_bounds() {
        let node = SceneNode::polygon(
            Point::ZERO,
            vec![Point::new(0.0, 10.0), Point::new(30.0, -5.0), Point::new(12.0, 40.0)],
        );
        assert!(!node.is_rectangle_native());
        assert_eq!(node.bounding_rect(), Rect::new(0.0, -5.0, 30.0, 40.0));
    }

    #[test]
    fn test_set_local_rect_ignored_for_ellipse() {
        let mut node = SceneNode::ellipse(Point::ZERO, 10.0, 10.0);
        node.set_local_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(node.bounding_rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_set_local_rect_normalizes() {
        let mut node = SceneNode::rectangle(Point::ZERO, 10.0, 10.0);
        node.set_local_rect(Rect::new(20.0, 0.0, 0.0, 5.0));
        assert_eq!(node.local_rect(), Some(Rect::new(0.0, 0.0, 20.0, 5.0)));
    }

    #[test]
    fn test_map_from_scene_roundtrip() {
        let node = SceneNode::rectangle(Point::new(5.0, 5.0), 10.0, 10.0)
            .with_transform(Affine::rotate(0.5) * Affine::scale(2.0));
        let local = Point::new(3.0, 7.0);
        let back = node.map_from_scene(node.map_to_scene(local)).unwrap();
        assert!((back.x - local.x).abs() < 1e-9);
        assert!((back.y - local.y).abs() < 1e-9);
    }

    #[test]
    fn test_map_from_scene_singular() {
        let node = SceneNode::ellipse(Point::ZERO, 10.0, 10.0).with_transform(Affine::scale_non_uniform(0.0, 1.0));
        assert!(node.map_from_scene(Point::ZERO).is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{ "geometry": { "Rectangle": { "x0": 0.0, "y0": 0.0, "x1": 4.0, "y1": 2.0 } } }"#;
        let node: SceneNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.transform, Affine::IDENTITY);
        assert_eq!(node.position, Point::ZERO);
    }
}
