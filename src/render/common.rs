use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::mesh::Mesh;
use crate::shading::Material;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

/// Lighting state consumed by the renderer's uniform buffer.
///
/// `position` is in world space; the shader moves it into view space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// How a draw is shaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceShading {
    /// Flat glow color, no lighting.
    Unlit,
    Lit(Material),
}

/// One mesh to draw this frame.
#[derive(Clone, Copy, Debug)]
pub struct DrawCommand<'a> {
    /// Stable identity used to cache the GPU buffers.
    pub name: &'a str,
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub shading: SurfaceShading,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct FrameData<'a> {
    pub camera: CameraParams,
    pub light: LightParams,
    pub draws: Vec<DrawCommand<'a>>,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub glow_color: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraParams, light: &LightParams) -> Self {
        Self {
            view: camera.view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            light_position: light.position.extend(1.0).into(),
            glow_color: (light.color * light.intensity).extend(1.0).into(),
        }
    }
}

/// Per-draw constants. `params` packs `(ambient, specular exponent,
/// metallic, lit)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ObjectUniform {
    pub model_view: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub base_color: [f32; 4],
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(view: Mat4, draw: &DrawCommand<'_>) -> Self {
        let model_view = view * draw.model;
        let (base_color, params) = match draw.shading {
            SurfaceShading::Unlit => (Vec3::ONE, [0.0; 4]),
            SurfaceShading::Lit(material) => {
                let kind = material.kind();
                (
                    material.base_color(),
                    [
                        material.ambient_intensity(),
                        kind.specular_exponent(),
                        if kind.is_metallic() { 1.0 } else { 0.0 },
                        1.0,
                    ],
                )
            }
        };
        Self {
            model_view: model_view.to_cols_array_2d(),
            normal: mat3_to_3x4(normal_matrix(model_view)),
            base_color: base_color.extend(1.0).into(),
            params,
        }
    }
}

/// Inverse transpose of the upper 3x3, for transforming normals.
pub fn normal_matrix(model_view: Mat4) -> Mat3 {
    Mat3::from_mat4(model_view).inverse().transpose()
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::MaterialKind;

    fn camera() -> CameraParams {
        CameraParams {
            view: Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
            projection: Mat4::IDENTITY,
            position: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    #[test]
    fn light_position_is_uploaded_in_world_space() {
        let light = LightParams {
            position: Vec3::new(0.0, 0.3, 0.0),
            color: Vec3::ONE,
            intensity: 1.0,
        };
        let globals = GlobalUniform::new(&camera(), &light);
        assert_eq!(globals.light_position, [0.0, 0.3, 0.0, 1.0]);
        assert_eq!(globals.glow_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 160);
    }

    #[test]
    fn lit_draw_packs_the_material_as_data() {
        let mesh = Mesh::cube(1.0);
        let draw = DrawCommand {
            name: "2",
            mesh: &mesh,
            model: Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)),
            shading: SurfaceShading::Lit(Material::new(
                MaterialKind::Metallic,
                Vec3::new(1.0, 0.5, 0.0),
            )),
        };
        let object = ObjectUniform::new(camera().view, &draw);
        assert_eq!(object.params, [0.452, 128.0, 1.0, 1.0]);
        assert_eq!(object.base_color, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(object.model_view[3], [3.0, 0.0, -10.0, 1.0]);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
    }

    #[test]
    fn unlit_draw_has_no_lighting_parameters() {
        let mesh = Mesh::cube(0.5);
        let draw = DrawCommand {
            name: "light",
            mesh: &mesh,
            model: Mat4::IDENTITY,
            shading: SurfaceShading::Unlit,
        };
        let object = ObjectUniform::new(Mat4::IDENTITY, &draw);
        assert_eq!(object.params, [0.0; 4]);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let matrix = normal_matrix(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        let normal = (matrix * Vec3::new(1.0, 1.0, 0.0)).normalize();
        assert!((normal - Vec3::new(1.0, 2.0, 0.0).normalize()).length() < 1e-6);
        assert_eq!(normal_matrix(Mat4::from_translation(Vec3::X)), Mat3::IDENTITY);
    }
}
