//! LayoutKit Core Library
//!
//! Interactive affine-transform engine for 2D scene editors: a manipulator
//! rectangle that moves, scales and rotates one or many scene items while
//! keeping each item's own rotation and scale intact.

pub mod broadcaster;
pub mod camera;
pub mod config;
pub mod decompose;
pub mod error;
pub mod fitter;
pub mod handles;
pub mod input;
pub mod proxy;
pub mod scene;
pub mod tool;

pub use broadcaster::{TransformBroadcaster, TransformEvent};
pub use camera::Camera;
pub use config::{TransformConfig, TransformFlags};
pub use decompose::{Decomposition, compose, decompose};
pub use error::{TransformError, TransformResult};
pub use fitter::{SelectionFit, fit_selection};
pub use handles::{CursorKind, Handle, HandleRegion, HandleSet, is_handle_active};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use proxy::{ManipulatorState, TransformRect};
pub use scene::{ItemGeometry, ItemId, MemoryScene, SceneGraph, SceneItem, SceneNode};
pub use tool::{ToolPointer, TransformSession, TransformTool};
