use glam::{Mat4, Vec2, Vec3};

use crate::camera::{Camera, DragMode, OrbitControls};
use crate::input::{self, Action};
use crate::loader::{FontLoad, FontPoll};
use crate::render::{DrawCommand, FrameData, LightParams, SurfaceShading};
use crate::scene::{create_text_objects, Scene};

/// Draw-cache key of the light-source cube.
pub const LIGHT_SOURCE_NAME: &str = "light-source";

/// Application state owned by the render loop.
pub struct AppState {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    viewport: (u32, u32),
    font_load: Option<FontLoad>,
}

impl AppState {
    /// Builds the scene for a viewport; the camera aspect is fixed here.
    pub fn new(width: u32, height: u32, font_load: Option<FontLoad>) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::for_viewport(width, height),
            controls: OrbitControls::new(),
            viewport: (width.max(1), height.max(1)),
            font_load,
        }
    }

    pub fn font_pending(&self) -> bool {
        self.font_load.is_some()
    }

    /// Checks the pending font load and attaches both text objects once it
    /// resolves. Returns true on the call that attached them.
    pub fn poll_font(&mut self, now_ms: f64) -> bool {
        let Some(load) = self.font_load.as_mut() else {
            return false;
        };
        let typeface = match load.poll(now_ms) {
            FontPoll::Pending => return false,
            FontPoll::Ready(typeface) => typeface,
            FontPoll::Failed(err) => {
                log::warn!("font {} unavailable, text is not shown: {err}", load.source());
                self.font_load = None;
                return false;
            }
        };
        log::info!(
            "loaded font {:?} ({} glyphs) from {}",
            typeface.family_name(),
            typeface.glyph_count(),
            load.source()
        );
        self.font_load = None;

        let attached = create_text_objects(&typeface)
            .and_then(|objects| self.scene.attach_text(objects));
        match attached {
            Ok(()) => true,
            Err(err) => {
                log::warn!("text objects could not be built: {err}");
                false
            }
        }
    }

    pub fn handle_key(&mut self, key: &str) -> Option<Action> {
        let action = input::handle_key(key, &mut self.scene, &mut self.camera);
        if let Some(action) = action {
            log::trace!("key {key:?} -> {action:?}");
        }
        action
    }

    /// Starts a drag: rotate for the primary button, pan for the secondary.
    pub fn pointer_down(&mut self, position: Vec2, mode: DragMode) {
        self.controls.begin_drag(position, mode);
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        let height = self.viewport.1 as f32;
        self.controls.drag_to(position, height, &mut self.camera);
    }

    pub fn pointer_up(&mut self) {
        self.controls.end_drag();
    }

    pub fn wheel(&mut self, delta: f32) {
        self.controls.zoom(delta, &mut self.camera);
    }

    /// Snapshot of what to draw: the light cube first, then the text.
    pub fn frame(&self) -> FrameData<'_> {
        let light = &self.scene.light_source;
        let mut draws = Vec::with_capacity(1 + self.scene.objects().len());
        draws.push(DrawCommand {
            name: LIGHT_SOURCE_NAME,
            mesh: light.mesh(),
            model: Mat4::from_translation(light.position),
            shading: SurfaceShading::Unlit,
        });
        draws.extend(self.scene.objects().iter().map(|object| DrawCommand {
            name: &object.name,
            mesh: &object.geometry,
            model: Mat4::from_translation(object.position),
            shading: SurfaceShading::Lit(object.material),
        }));

        FrameData {
            camera: self.camera.params(),
            light: LightParams {
                position: self.scene.light_position(),
                color: light.color(),
                intensity: light.intensity(),
            },
            draws,
        }
    }

    /// Human readable final state, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        let scene = &self.scene;
        let mut lines = vec![
            format!(
                "Scene: light source + {} text object(s)",
                scene.objects().len()
            ),
            format!(" - light pos={}", fmt_vec3(scene.light_source.position)),
            format!(
                " - point light pos={} distance={}",
                fmt_vec3(scene.point_light.position),
                scene.point_light.distance
            ),
            format!(
                " - camera pos={} fov={}",
                fmt_vec3(self.camera.position),
                self.camera.fov_y_degrees()
            ),
        ];
        for object in scene.objects() {
            lines.push(format!(
                " - {} pos={} material={} base={}",
                object.name,
                fmt_vec3(object.position),
                object.material.kind().label(),
                fmt_vec3(object.material.base_color())
            ));
        }
        lines
    }
}

pub fn print_final_state(state: &AppState) {
    println!("Final state:");
    for line in state.summary_lines() {
        println!("{line}");
    }
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}
