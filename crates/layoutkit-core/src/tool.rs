//! The transform tool: wires the manipulator, the fitter and the
//! broadcaster to pointer input.

use crate::broadcaster::{TransformBroadcaster, TransformEvent};
use crate::camera::Camera;
use crate::config::TransformConfig;
use crate::fitter::fit_selection;
use crate::handles::{CursorKind, HandleMetrics};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::proxy::TransformRect;
use crate::scene::{ItemId, SceneGraph};
use kurbo::{Point, Rect};

/// A pointer sample delivered to the tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolPointer {
    /// Position in view coordinates.
    pub position: Point,
    /// Position in scene coordinates.
    pub scene_position: Point,
    pub modifiers: Modifiers,
}

impl ToolPointer {
    /// Pointer whose view and scene positions coincide.
    pub fn at(scene_position: Point) -> Self {
        Self {
            position: scene_position,
            scene_position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Manipulator state for one selection.
///
/// Created when a selection is attached and dropped when the selection
/// changes or the tool is deactivated.
#[derive(Debug, Clone)]
pub struct TransformSession {
    proxy: TransformRect,
    items: Vec<ItemId>,
    broadcaster: TransformBroadcaster,
}

impl TransformSession {
    /// Fit a new session to the scene's current selection.
    ///
    /// Returns `None` when nothing is selected.
    pub fn fit(scene: &dyn SceneGraph, config: &TransformConfig) -> Option<Self> {
        let items = scene.selected_items();
        let fit = fit_selection(scene, &items, config)?;
        let mut proxy = TransformRect::new(config);
        proxy.set_lod(scene.current_zoom_level());
        fit.apply_to(&mut proxy);
        Some(Self {
            proxy,
            items,
            broadcaster: TransformBroadcaster::new(),
        })
    }

    pub fn proxy(&self) -> &TransformRect {
        &self.proxy
    }

    /// Items the session was fitted to, in selection order.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn broadcaster(&self) -> &TransformBroadcaster {
        &self.broadcaster
    }
}

/// Editor tool that moves, scales and rotates the selection.
#[derive(Debug, Clone, Default)]
pub struct TransformTool {
    config: TransformConfig,
    session: Option<TransformSession>,
    active: bool,
    events: Vec<TransformEvent>,
}

impl TransformTool {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn session(&self) -> Option<&TransformSession> {
        self.session.as_ref()
    }

    /// The manipulator, if a selection is attached.
    pub fn proxy(&self) -> Option<&TransformRect> {
        self.session.as_ref().map(TransformSession::proxy)
    }

    /// Activate the tool and fit the current selection.
    pub fn activate(&mut self, scene: &dyn SceneGraph) {
        log::debug!("Transform tool activated");
        self.active = true;
        self.attach_to_selection(scene);
    }

    /// Deactivate the tool and discard the session.
    pub fn deactivate(&mut self) {
        log::debug!("Transform tool deactivated");
        self.active = false;
        self.session = None;
    }

    /// Rebuild the session from the scene's selection.
    ///
    /// Returns true if a non-empty selection was attached.
    pub fn attach_to_selection(&mut self, scene: &dyn SceneGraph) -> bool {
        self.session = TransformSession::fit(scene, &self.config);
        self.session.is_some()
    }

    /// Refit after the selection changed. Ignored while inactive.
    pub fn on_selection_changed(&mut self, scene: &dyn SceneGraph) {
        if self.active {
            self.attach_to_selection(scene);
        }
    }

    /// Start an interaction. Returns true if the press was consumed.
    ///
    /// Holding shift locks the aspect ratio for this drag.
    pub fn on_pointer_down(&mut self, pointer: ToolPointer, scene: &mut dyn SceneGraph) -> bool {
        if !self.active {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.proxy.set_lod(scene.current_zoom_level());
        if !session.proxy.pointer_down(pointer.scene_position, pointer.modifiers.shift) {
            return false;
        }
        session.broadcaster.begin(&session.proxy);
        true
    }

    /// Continue an interaction, pushing deltas to the selection.
    pub fn on_pointer_move(&mut self, pointer: ToolPointer, scene: &mut dyn SceneGraph) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.proxy.state().is_active() {
            return false;
        }
        session.proxy.pointer_move(pointer.scene_position);
        let events = session.broadcaster.sample(&session.proxy, scene, &session.items);
        self.events.extend(events);
        true
    }

    /// Finish an interaction. Emits the finished event if anything changed.
    pub fn on_pointer_up(&mut self, _pointer: ToolPointer, _scene: &mut dyn SceneGraph) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.proxy.pointer_up() {
            return false;
        }
        if let Some(event) = session.broadcaster.finish() {
            self.events.push(event);
        }
        true
    }

    /// Route a view-space pointer event through `camera`.
    ///
    /// Only the left button drives the manipulator.
    pub fn handle_pointer_event(&mut self, event: PointerEvent, camera: &Camera, scene: &mut dyn SceneGraph) -> bool {
        let pointer = ToolPointer {
            position: event.position(),
            scene_position: camera.screen_to_scene(event.position()),
            modifiers: event.modifiers(),
        };
        match event {
            PointerEvent::Down {
                button: MouseButton::Left,
                ..
            } => self.on_pointer_down(pointer, scene),
            PointerEvent::Move { .. } => self.on_pointer_move(pointer, scene),
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.on_pointer_up(pointer, scene),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => false,
        }
    }

    /// Drain the notifications raised since the last call.
    pub fn take_events(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cursor for a hovered scene point.
    pub fn hover_cursor(&self, scene_point: Point) -> CursorKind {
        self.proxy()
            .map(|proxy| proxy.hover_cursor(scene_point))
            .unwrap_or(CursorKind::Arrow)
    }

    pub fn set_movable(&mut self, movable: bool) {
        self.config.flags.movable = movable;
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_movable(movable);
        }
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.config.flags.resizable = resizable;
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_resizable(resizable);
        }
    }

    pub fn set_rotatable(&mut self, rotatable: bool) {
        self.config.flags.rotatable = rotatable;
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_rotatable(rotatable);
        }
    }

    /// Set the default aspect lock. A rotated multi-selection keeps its
    /// forced lock until the next fit.
    pub fn set_keep_aspect_ratio(&mut self, keep_aspect_ratio: bool) {
        self.config.flags.keep_aspect_ratio = keep_aspect_ratio;
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_keep_aspect_ratio(keep_aspect_ratio);
        }
    }

    pub fn set_bound_rect(&mut self, bound_rect: Option<Rect>) {
        self.config.bound_rect = bound_rect;
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_bound_rect(bound_rect);
        }
    }

    /// Replace handle metrics from the configuration.
    pub fn set_config(&mut self, config: TransformConfig) {
        if let Some(session) = self.session.as_mut() {
            session.proxy.set_metrics(HandleMetrics::from(&config));
            session.proxy.set_bound_rect(config.bound_rect);
            session.proxy.set_flags(config.flags);
        }
        self.config = config;
    }
}
