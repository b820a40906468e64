//! Rendering module
//!
//! `scene` turns the simulation into draw commands; `canvas` paints them
//! with Canvas2D in the browser.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasPainter;
pub use scene::{Color, DrawCmd, Overlay, Scene, TextAlign, build_scene, velocity_color};
