//! Replay script model.

use crate::error::{AppError, AppResult};
use kurbo::{Point, Vec2};
use layoutkit_core::{SceneNode, TransformConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One step of a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// Left-button drag in view coordinates, split into `steps` moves.
    Drag {
        from: Point,
        to: Point,
        #[serde(default = "default_steps")]
        steps: usize,
        #[serde(default)]
        shift: bool,
    },
    /// Replace the selection with the named items.
    Select { items: Vec<String> },
    /// Change the view zoom.
    SetZoom { zoom: f64 },
    /// Zoom by `factor` around a view point.
    ZoomAt { at: Point, factor: f64 },
    /// Pan the view by a delta in view pixels.
    Pan { delta: Vec2 },
}

fn default_steps() -> usize {
    1
}

fn default_zoom() -> f64 {
    1.0
}

/// A scene plus the gestures to play on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: TransformConfig,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Items back to front. Names must be unique and non-empty.
    pub items: Vec<SceneNode>,
    /// Names of the items selected before the first gesture.
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default)]
    pub gestures: Vec<Gesture>,
}

impl Script {
    /// Parse and validate a script.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.config.validate()?;
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(AppError::Script(format!("zoom must be positive, got {}", self.zoom)));
        }
        let mut names = HashSet::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(AppError::Script("every item needs a name".to_string()));
            }
            if !names.insert(item.name.as_str()) {
                return Err(AppError::Script(format!("duplicate item name '{}'", item.name)));
            }
        }
        Ok(())
    }
}

/// Read a script from disk.
pub fn load_script(path: &Path) -> AppResult<Script> {
    let json = std::fs::read_to_string(path)?;
    let script = Script::from_json(&json)?;
    log::debug!(
        "Loaded script {} with {} item(s) and {} gesture(s)",
        path.display(),
        script.items.len(),
        script.gestures.len()
    );
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r#"{
        "items": [
            { "name": "card", "geometry": { "Rectangle": { "x0": 0.0, "y0": 0.0, "x1": 100.0, "y1": 50.0 } } }
        ],
        "select": ["card"],
        "gestures": [
            { "kind": "drag", "from": { "x": 100.0, "y": 50.0 }, "to": { "x": 120.0, "y": 60.0 } },
            { "kind": "set_zoom", "zoom": 2.0 },
            { "kind": "pan", "delta": { "x": 10.0, "y": -5.0 } },
            { "kind": "zoom_at", "at": { "x": 50.0, "y": 50.0 }, "factor": 0.5 }
        ]
    }"#;

    #[test]
    fn test_from_json_defaults() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.zoom, 1.0);
        assert_eq!(script.config, TransformConfig::default());
        assert_eq!(script.items[0].name, "card");
        assert_eq!(
            script.gestures[0],
            Gesture::Drag {
                from: Point::new(100.0, 50.0),
                to: Point::new(120.0, 60.0),
                steps: 1,
                shift: false,
            }
        );
        assert_eq!(script.gestures[1], Gesture::SetZoom { zoom: 2.0 });
        assert_eq!(script.gestures[2], Gesture::Pan { delta: Vec2::new(10.0, -5.0) });
        assert_eq!(
            script.gestures[3],
            Gesture::ZoomAt {
                at: Point::new(50.0, 50.0),
                factor: 0.5,
            }
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "items": [
            { "name": "a", "geometry": { "Ellipse": { "x0": 0.0, "y0": 0.0, "x1": 1.0, "y1": 1.0 } } },
            { "name": "a", "geometry": { "Ellipse": { "x0": 0.0, "y0": 0.0, "x1": 1.0, "y1": 1.0 } } }
        ] }"#;
        assert!(matches!(Script::from_json(json), Err(AppError::Script(_))));
    }

    #[test]
    fn test_invalid_config_is_engine_error() {
        let json = r#"{ "config": { "handle_size": 0.0 }, "items": [] }"#;
        assert!(matches!(Script::from_json(json), Err(AppError::Engine(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Script::from_json("{ items: "), Err(AppError::Script(_))));
    }

    #[test]
    fn test_load_script_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();
        let script = load_script(file.path()).unwrap();
        assert_eq!(script.items.len(), 1);
        assert_eq!(script.select, vec!["card".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_script(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_to_json_reloads() {
        let script = Script::from_json(SCRIPT).unwrap();
        let reloaded = Script::from_json(&script.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.gestures, script.gestures);
        assert_eq!(reloaded.items[0].id, script.items[0].id);
    }
}
