//! Transform tool configuration.

use crate::error::{TransformError, TransformResult};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Default handle edge length in screen pixels.
pub const DEFAULT_HANDLE_SIZE: f64 = 8.0;
/// Default inflation applied to resize handles when hit-testing.
pub const DEFAULT_HANDLE_HIT_MARGIN: f64 = 3.0;
/// Default distance between the rect's half diagonal and the rotate ring.
pub const DEFAULT_ROTATE_RING_MARGIN: f64 = 20.0;
/// Default rotate ring hit tolerance in screen pixels.
pub const DEFAULT_ROTATE_RING_TOLERANCE: f64 = 2.0;
/// Rotation (degrees) above which a multi-selection member counts as rotated.
pub const DEFAULT_ROTATION_LOCK_EPSILON: f64 = 0.1;

/// Capability flags of the manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformFlags {
    pub movable: bool,
    pub resizable: bool,
    pub rotatable: bool,
    pub keep_aspect_ratio: bool,
}

impl Default for TransformFlags {
    fn default() -> Self {
        Self {
            movable: true,
            resizable: true,
            rotatable: true,
            keep_aspect_ratio: false,
        }
    }
}

/// Configuration for the transform tool and its manipulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Caller-configured capability flags.
    pub flags: TransformFlags,
    /// Optional scene-space clamp for the manipulator.
    pub bound_rect: Option<Rect>,
    /// Handle edge length in screen pixels.
    pub handle_size: f64,
    /// Inflation applied to resize handles when hit-testing.
    pub handle_hit_margin: f64,
    /// Margin added to the half diagonal for the rotate ring radius.
    pub rotate_ring_margin: f64,
    /// Rotate ring hit tolerance in screen pixels.
    pub rotate_ring_tolerance: f64,
    /// Rotation (degrees) that forces the aspect lock on multi-selections.
    pub rotation_lock_epsilon: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            flags: TransformFlags::default(),
            bound_rect: None,
            handle_size: DEFAULT_HANDLE_SIZE,
            handle_hit_margin: DEFAULT_HANDLE_HIT_MARGIN,
            rotate_ring_margin: DEFAULT_ROTATE_RING_MARGIN,
            rotate_ring_tolerance: DEFAULT_ROTATE_RING_TOLERANCE,
            rotation_lock_epsilon: DEFAULT_ROTATION_LOCK_EPSILON,
        }
    }
}

impl TransformConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> TransformResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TransformError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> TransformResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TransformError::Config(e.to_string()))
    }

    /// Check that the metrics and the bound rect are usable.
    pub fn validate(&self) -> TransformResult<()> {
        if !(self.handle_size > 0.0) {
            return Err(TransformError::Config(format!(
                "handle_size must be positive, got {}",
                self.handle_size
            )));
        }
        for (name, value) in [
            ("handle_hit_margin", self.handle_hit_margin),
            ("rotate_ring_margin", self.rotate_ring_margin),
            ("rotate_ring_tolerance", self.rotate_ring_tolerance),
            ("rotation_lock_epsilon", self.rotation_lock_epsilon),
        ] {
            if !(value >= 0.0) {
                return Err(TransformError::Config(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if let Some(bound) = self.bound_rect {
            if bound.width() <= 0.0 || bound.height() <= 0.0 {
                return Err(TransformError::Config(format!(
                    "bound_rect must have a positive area, got {bound:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = TransformFlags::default();
        assert!(flags.movable && flags.resizable && flags.rotatable);
        assert!(!flags.keep_aspect_ratio);
    }

    #[test]
    fn test_from_json_partial() {
        let config = TransformConfig::from_json(
            r#"{ "flags": { "keep_aspect_ratio": true }, "handle_size": 12.0 }"#,
        )
        .unwrap();
        assert!(config.flags.keep_aspect_ratio);
        assert!(config.flags.movable);
        assert!((config.handle_size - 12.0).abs() < f64::EPSILON);
        assert!((config.rotate_ring_margin - DEFAULT_ROTATE_RING_MARGIN).abs() < f64::EPSILON);
        assert!(config.bound_rect.is_none());
    }

    #[test]
    fn test_from_json_rejects_bad_metrics() {
        let err = TransformConfig::from_json(r#"{ "handle_size": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));

        let err = TransformConfig::from_json(r#"{ "rotate_ring_tolerance": -1.0 }"#).unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(TransformConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_json_roundtrip_with_bound() {
        let config = TransformConfig {
            bound_rect: Some(Rect::new(0.0, 0.0, 640.0, 480.0)),
            ..TransformConfig::default()
        };
        let json = config.to_json().unwrap();
        let back = TransformConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_degenerate_bound_rejected() {
        let config = TransformConfig {
            bound_rect: Some(Rect::new(10.0, 10.0, 10.0, 50.0)),
            ..TransformConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
