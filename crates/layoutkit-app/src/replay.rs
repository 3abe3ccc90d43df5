//! Playing a script through the transform tool.

use crate::error::{AppError, AppResult};
use crate::script::{Gesture, Script};
use kurbo::{Point, Rect};
use layoutkit_core::decompose::{rotation_degrees, scale_factors};
use layoutkit_core::{
    ItemId, MemoryScene, Modifiers, MouseButton, PointerEvent, SceneItem, SceneNode, TransformEvent,
    TransformTool,
};
use serde::Serialize;
use std::collections::HashMap;

/// A notification with item names in place of ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEvent {
    pub kind: &'static str,
    pub items: Vec<String>,
}

/// Final state of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub name: String,
    pub position: Point,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub local_bounds: Rect,
    pub scene_bounds: Rect,
}

impl ItemReport {
    fn from_node(node: &SceneNode) -> Self {
        let (scale_x, scale_y) = scale_factors(node.transform);
        Self {
            name: node.name.clone(),
            position: node.position,
            rotation: rotation_degrees(node.transform),
            scale_x,
            scale_y,
            local_bounds: node.bounding_rect(),
            scene_bounds: node.scene_bounding_rect(),
        }
    }
}

/// Everything a replay produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub events: Vec<ReportEvent>,
    /// Items back to front.
    pub items: Vec<ItemReport>,
}

impl ReplayReport {
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A scene with the transform tool active on it.
#[derive(Debug)]
pub struct Replay {
    scene: MemoryScene,
    tool: TransformTool,
    ids: HashMap<String, ItemId>,
    events: Vec<ReportEvent>,
}

impl Replay {
    /// Build the scene, apply the initial selection and activate the tool.
    pub fn new(script: &Script) -> AppResult<Self> {
        let mut scene = MemoryScene::new();
        scene.camera.set_zoom(script.zoom);
        let mut ids = HashMap::new();
        for node in &script.items {
            let id = scene.add_item(node.clone());
            ids.insert(node.name.clone(), id);
        }

        log::debug!("Replay scene holds {} item(s)", scene.len());

        let mut replay = Self {
            scene,
            tool: TransformTool::new(script.config.clone()),
            ids,
            events: Vec::new(),
        };
        let selection = replay.resolve(&script.select)?;
        replay.scene.select(&selection);
        replay.tool.activate(&replay.scene);
        Ok(replay)
    }

    pub fn scene(&self) -> &MemoryScene {
        &self.scene
    }

    pub fn tool(&self) -> &TransformTool {
        &self.tool
    }

    /// Play `gestures` in order and report the outcome.
    pub fn run(mut self, gestures: &[Gesture]) -> AppResult<ReplayReport> {
        for (index, gesture) in gestures.iter().enumerate() {
            log::debug!("Gesture {index}: {gesture:?}");
            self.play(gesture)?;
        }
        Ok(self.report())
    }

    /// Play a single gesture.
    pub fn play(&mut self, gesture: &Gesture) -> AppResult<()> {
        match gesture {
            Gesture::Drag {
                from,
                to,
                steps,
                shift,
            } => self.drag(*from, *to, *steps, *shift),
            Gesture::Select { items } => {
                let selection = self.resolve(items)?;
                self.scene.select(&selection);
                self.tool.on_selection_changed(&self.scene);
            }
            Gesture::SetZoom { zoom } => self.scene.camera.set_zoom(*zoom),
            Gesture::ZoomAt { at, factor } => self.scene.camera.zoom_at(*at, *factor),
            Gesture::Pan { delta } => self.scene.camera.pan(*delta),
        }
        self.collect_events();
        Ok(())
    }

    /// Snapshot the events so far and the current item states.
    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            events: self.events.clone(),
            items: self.scene.nodes_ordered().map(ItemReport::from_node).collect(),
        }
    }

    fn drag(&mut self, from: Point, to: Point, steps: usize, shift: bool) {
        let modifiers = if shift { Modifiers::SHIFT } else { Modifiers::NONE };
        let steps = steps.max(1);
        let mut events = vec![PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
            modifiers,
        }];
        events.extend((1..=steps).map(|step| PointerEvent::Move {
            position: from.lerp(to, step as f64 / steps as f64),
            modifiers,
        }));
        events.push(PointerEvent::Up {
            position: to,
            button: MouseButton::Left,
        });

        for event in events {
            let camera = self.scene.camera.clone();
            let consumed = self.tool.handle_pointer_event(event, &camera, &mut self.scene);
            if !consumed && matches!(event, PointerEvent::Down { .. }) {
                log::info!("Press at {from:?} missed the manipulator");
                return;
            }
        }
    }

    fn resolve(&self, names: &[String]) -> AppResult<Vec<ItemId>> {
        names
            .iter()
            .map(|name| {
                self.ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| AppError::Script(format!("unknown item '{name}'")))
            })
            .collect()
    }

    fn collect_events(&mut self) {
        let names: HashMap<ItemId, &str> = self.ids.iter().map(|(name, id)| (*id, name.as_str())).collect();
        for event in self.tool.take_events() {
            let kind = match &event {
                TransformEvent::ItemsTransformed(_) => "items_transformed",
                TransformEvent::ItemsMoved(_) => "items_moved",
                TransformEvent::ItemsRotated(_) => "items_rotated",
                TransformEvent::TransformFinished(_) => "transform_finished",
            };
            let items = event
                .items()
                .iter()
                .map(|id| names.get(id).map_or_else(|| id.to_string(), |name| name.to_string()))
                .collect();
            self.events.push(ReportEvent { kind, items });
        }
    }
}
