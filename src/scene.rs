use glam::Vec3;
use thiserror::Error;

use crate::color::{parse_linear_color, ColorError};
use crate::extrude::{glyph_mesh, TextOptions};
use crate::mesh::Mesh;
use crate::shading::{Material, MaterialKind, GLOW_COLOR};
use crate::typeface::{FontError, Typeface};

/// Edge length of the light-source cube.
pub const LIGHT_CUBE_SIZE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("text objects are already part of the scene")]
    TextAlreadyAttached,
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Color(#[from] ColorError),
}

/// The glowing cube at the center of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    pub position: Vec3,
    intensity: f32,
    color: Vec3,
    mesh: Mesh,
}

impl LightSource {
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

/// Point-light record mirroring the light source for the renderer's own
/// light bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableObject {
    pub name: String,
    pub geometry: Mesh,
    pub material: Material,
    pub position: Vec3,
}

/// Everything drawn each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub light_source: LightSource,
    pub point_light: PointLight,
    objects: Vec<RenderableObject>,
}

impl Scene {
    /// Scene holding only the light source.
    pub fn new() -> Self {
        let (light_source, point_light) = create_light_source();
        Self {
            light_source,
            point_light,
            objects: Vec::new(),
        }
    }

    pub fn objects(&self) -> &[RenderableObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&RenderableObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn has_text(&self) -> bool {
        !self.objects.is_empty()
    }

    /// Adds both text objects at once.
    pub fn attach_text(&mut self, objects: [RenderableObject; 2]) -> Result<(), SceneError> {
        if self.has_text() {
            return Err(SceneError::TextAlreadyAttached);
        }
        self.objects.extend(objects);
        Ok(())
    }

    /// Copies the light source position onto the point light.
    pub fn sync_point_light(&mut self) {
        self.point_light.position = self.light_source.position;
    }

    /// World-space position fed to every lit material.
    pub fn light_position(&self) -> Vec3 {
        self.light_source.position
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_light_source() -> (LightSource, PointLight) {
    let light = LightSource {
        position: Vec3::ZERO,
        intensity: 1.0,
        color: GLOW_COLOR,
        mesh: Mesh::cube(LIGHT_CUBE_SIZE),
    };
    let point_light = PointLight {
        position: light.position,
        color: light.color,
        intensity: light.intensity,
        distance: 100.0,
    };
    (light, point_light)
}

/// Placement and look of one text object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLabel {
    pub glyph: char,
    pub kind: MaterialKind,
    pub color: &'static str,
    pub position: Vec3,
}

pub const TEXT_LABELS: [TextLabel; 2] = [
    TextLabel {
        glyph: 'Y',
        kind: MaterialKind::NonMetallic,
        color: "#00008B",
        position: Vec3::new(-3.0, 0.0, 0.0),
    },
    TextLabel {
        glyph: '2',
        kind: MaterialKind::Metallic,
        color: "orange",
        position: Vec3::new(3.0, 0.0, 0.0),
    },
];

pub fn create_text_object(
    glyph: char,
    typeface: &Typeface,
    kind: MaterialKind,
    base_color: Vec3,
    position: Vec3,
) -> Result<RenderableObject, FontError> {
    let geometry = glyph_mesh(typeface, glyph, TextOptions::default())?;
    Ok(RenderableObject {
        name: glyph.to_string(),
        geometry,
        material: Material::new(kind, base_color),
        position,
    })
}

/// Builds both text objects from one font, or neither.
pub fn create_text_objects(typeface: &Typeface) -> Result<[RenderableObject; 2], SceneError> {
    let build = |label: &TextLabel| -> Result<RenderableObject, SceneError> {
        let color = parse_linear_color(label.color)?;
        Ok(create_text_object(
            label.glyph,
            typeface,
            label.kind,
            color,
            label.position,
        )?)
    };
    Ok([build(&TEXT_LABELS[0])?, build(&TEXT_LABELS[1])?])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    /// Two square glyphs standing in for a real font.
    pub(crate) const TEST_FONT: &str = r#"{
        "familyName": "Blocks",
        "resolution": 1000,
        "glyphs": {
            "Y": { "ha": 700, "o": "m 0 0 l 0 700 l 600 700 l 600 0 z" },
            "2": { "ha": 700, "o": "m 0 0 l 0 700 l 600 700 l 600 0 z m 200 200 l 400 200 l 400 500 l 200 500 z" }
        }
    }"#;

    pub(crate) static BLOCKS: Lazy<Typeface> =
        Lazy::new(|| Typeface::from_json(TEST_FONT).expect("test font parses"));

    #[test]
    fn new_scene_has_only_the_light_source() {
        let scene = Scene::new();
        assert!(scene.objects().is_empty());
        assert_eq!(scene.light_source.position, Vec3::ZERO);
        assert_eq!(scene.point_light.position, scene.light_source.position);
        assert_eq!(scene.point_light.distance, 100.0);
        assert_eq!(scene.light_source.color(), Vec3::ONE);
        assert_eq!(scene.light_source.mesh().triangle_count(), 12);
    }

    #[test]
    fn text_objects_match_their_labels() {
        let [y, two] = create_text_objects(&BLOCKS).unwrap();

        assert_eq!(y.name, "Y");
        assert_eq!(y.position, Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(y.material.kind(), MaterialKind::NonMetallic);
        assert!(y.material.base_color().z > 0.0 && y.material.base_color().x == 0.0);

        assert_eq!(two.name, "2");
        assert_eq!(two.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(two.material.kind(), MaterialKind::Metallic);
        assert!((two.material.base_color().x - 1.0).abs() < 1e-5);

        let (_, max) = y.geometry.bounds().unwrap();
        assert!((max.z - 0.2).abs() < 1e-6);
        assert!((max.y - 0.7).abs() < 1e-6);
        // Hole walls add geometry to the "2".
        assert!(two.geometry.triangle_count() > y.geometry.triangle_count());
    }

    #[test]
    fn missing_glyph_builds_nothing() {
        let font = Typeface::from_json(
            r#"{ "glyphs": { "Y": { "ha": 1, "o": "m 0 0 l 0 1 l 1 1 z" } } }"#,
        )
        .unwrap();
        assert!(matches!(
            create_text_objects(&font),
            Err(SceneError::Font(FontError::MissingGlyph('2')))
        ));
    }

    #[test]
    fn text_attaches_once_as_a_pair() {
        let mut scene = Scene::new();
        scene.attach_text(create_text_objects(&BLOCKS).unwrap()).unwrap();
        assert_eq!(scene.objects().len(), 2);
        assert!(scene.object("Y").is_some());
        assert!(matches!(
            scene.attach_text(create_text_objects(&BLOCKS).unwrap()),
            Err(SceneError::TextAlreadyAttached)
        ));
        assert_eq!(scene.objects().len(), 2);
    }
}
