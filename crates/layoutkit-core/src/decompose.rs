//! Affine decomposition into scale and rotation.
//!
//! Items never store scale or rotation separately. The linear part of the
//! item's `Affine` is the single source of truth and these functions derive
//! `(scale_x, scale_y, rotation)` from it on demand, or build a transform
//! back from them. Shear is not supported: a sheared map decomposes into the
//! column norms and the angle of the first column, which is lossy.

use crate::error::{TransformError, TransformResult};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Scale factors at or below this magnitude make a decomposition undefined.
pub const SCALE_EPSILON: f64 = 1e-9;

/// Scale and rotation extracted from a linear map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Norm of the first column.
    pub scale_x: f64,
    /// Norm of the second column.
    pub scale_y: f64,
    /// Rotation in degrees, in (-180, 180].
    pub rotation: f64,
}

impl Decomposition {
    /// The identity decomposition.
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        rotation: 0.0,
    };

    /// Build the linear map `rotate(rotation) * scale(scale_x, scale_y)`.
    pub fn to_affine(&self) -> Affine {
        compose(self.scale_x, self.scale_y, self.rotation)
    }
}

/// Rotation of the linear part of `affine`, in degrees.
pub fn rotation_degrees(affine: Affine) -> f64 {
    let [a, b, _, _, _, _] = affine.as_coeffs();
    b.atan2(a).to_degrees()
}

/// Euclidean norms of the two columns of the linear part of `affine`.
pub fn scale_factors(affine: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    (a.hypot(b), c.hypot(d))
}

/// Decompose the linear part of `affine`. Translation is ignored.
pub fn decompose(affine: Affine) -> TransformResult<Decomposition> {
    let (scale_x, scale_y) = scale_factors(affine);
    if scale_x <= SCALE_EPSILON || scale_y <= SCALE_EPSILON {
        return Err(TransformError::UndefinedDecomposition { scale_x, scale_y });
    }
    Ok(Decomposition {
        scale_x,
        scale_y,
        rotation: rotation_degrees(affine),
    })
}

/// Build a linear map from scale factors and a rotation in degrees.
pub fn compose(scale_x: f64, scale_y: f64, rotation: f64) -> Affine {
    Affine::rotate(rotation.to_radians()) * Affine::scale_non_uniform(scale_x, scale_y)
}

/// Decomposed rect of a rectangle-native item.
///
/// The scale factors come straight from the matrix norms and are applied to
/// the item's own width and height, so no corner has to be re-derived.
pub fn decompose_rect(affine: Affine, local_rect: Rect) -> TransformResult<(Rect, Decomposition)> {
    let decomposition = decompose(affine)?;
    let rect = Rect::new(
        0.0,
        0.0,
        local_rect.width().abs() * decomposition.scale_x,
        local_rect.height().abs() * decomposition.scale_y,
    );
    Ok((rect, decomposition))
}

/// Undo rotation and scale on scene-space corner points.
///
/// Each point is moved into a frame centered on `center`, rotated by
/// `-rotation`, divided by the scale factors and moved back. The
/// axis-aligned extent of the results is the item's local rect. This is
/// exact only when the item's transform is `rotate * scale` with no shear.
pub fn undo_rotation_scale(
    points: &[Point],
    center: Point,
    rotation: f64,
    scale_x: f64,
    scale_y: f64,
) -> TransformResult<Rect> {
    if scale_x.abs() <= SCALE_EPSILON || scale_y.abs() <= SCALE_EPSILON {
        return Err(TransformError::UndefinedDecomposition { scale_x, scale_y });
    }
    let Some(first) = points.first() else {
        return Ok(Rect::ZERO);
    };

    let undo = Affine::translate(center.to_vec2())
        * Affine::scale_non_uniform(1.0 / scale_x, 1.0 / scale_y)
        * Affine::rotate(-rotation.to_radians())
        * Affine::translate(-center.to_vec2());

    let start = undo * *first;
    let extent = points
        .iter()
        .skip(1)
        .map(|p| undo * *p)
        .fold(Rect::from_points(start, start), |rect, p| rect.union_pt(p));
    Ok(extent)
}

/// Scene-space corners of `rect` mapped through `transform`.
pub fn mapped_corners(transform: Affine, rect: Rect) -> [Point; 4] {
    [
        transform * Point::new(rect.x0, rect.y0),
        transform * Point::new(rect.x1, rect.y0),
        transform * Point::new(rect.x1, rect.y1),
        transform * Point::new(rect.x0, rect.y1),
    ]
}

/// Angle of `v` in degrees.
pub fn vector_angle(v: Vec2) -> f64 {
    v.y.atan2(v.x).to_degrees()
}

/// Normalize an angle into `[0, 360)`.
///
/// Values within rounding distance of a full turn snap to 0.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped < 1e-9 || 360.0 - wrapped < 1e-9 { 0.0 } else { wrapped }
}
