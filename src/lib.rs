//! A small wgpu scene: a glowing cube that acts as a point light, and the
//! extruded glyphs "Y" and "2" lit by it with a custom Phong-style shader.
//!
//! The light moves with W/S, the camera strafes with A/D, and a left-drag
//! orbits the camera around the origin. The same [`AppState`] drives the
//! native window in `main.rs`, the headless `--summary-only` run and, on
//! `wasm32`, the browser entry point in [`web`].

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod extrude;
pub mod input;
pub mod loader;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod shading;
pub mod triangulate;
pub mod typeface;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{print_final_state, AppState};
pub use camera::{Camera, DragMode, OrbitControls};
pub use config::CliOptions;
pub use input::Action;
pub use loader::{FontLoad, FontPoll};
pub use mesh::Mesh;
pub use render::{CameraParams, DrawCommand, FrameData, LightParams, Renderer, SurfaceShading};
pub use scene::{LightSource, PointLight, RenderableObject, Scene, SceneError};
pub use shading::{Material, MaterialKind};
pub use typeface::{FontError, Typeface};
