mod common;
mod renderer;
mod shared;

pub use common::{normal_matrix, CameraParams, DrawCommand, FrameData, LightParams, SurfaceShading};
pub use renderer::Renderer;
