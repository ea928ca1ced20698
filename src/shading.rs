//! Local lighting model shared by the CPU reference path and the WGSL shader.
//!
//! A single point light contributes an ambient term, a Lambert diffuse term
//! and a Phong specular highlight. The material kind only changes data (the
//! specular exponent and the highlight tint), so the GPU side evaluates the
//! same function with the kind encoded in its uniforms.

use glam::{Vec3, Vec4};

/// Ambient fill applied to every lit material.
pub const AMBIENT_INTENSITY: f32 = 0.452;

/// Glow color of the unlit light-source cube.
pub const GLOW_COLOR: Vec3 = Vec3::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Metallic,
    NonMetallic,
}

impl MaterialKind {
    pub fn is_metallic(self) -> bool {
        matches!(self, Self::Metallic)
    }

    pub fn specular_exponent(self) -> f32 {
        match self {
            Self::Metallic => 128.0,
            Self::NonMetallic => 64.0,
        }
    }

    /// Highlight color: metals tint it with their base color.
    pub fn specular_tint(self, base_color: Vec3) -> Vec3 {
        match self {
            Self::Metallic => base_color,
            Self::NonMetallic => Vec3::ONE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Metallic => "metallic",
            Self::NonMetallic => "non-metallic",
        }
    }
}

/// Lit surface material. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    base_color: Vec3,
    kind: MaterialKind,
}

impl Material {
    pub const fn new(kind: MaterialKind, base_color: Vec3) -> Self {
        Self { base_color, kind }
    }

    pub fn base_color(&self) -> Vec3 {
        self.base_color
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn ambient_intensity(&self) -> f32 {
        AMBIENT_INTENSITY
    }
}

/// Per-fragment geometry, all in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Unit surface normal.
    pub normal: Vec3,
    pub position: Vec3,
    pub light_position: Vec3,
}

/// The three additive lighting terms for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingTerms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl ShadingTerms {
    /// Sum of the terms. Not clamped; values above one are left to the
    /// output target.
    pub fn color(&self) -> Vec3 {
        self.ambient + self.diffuse + self.specular
    }
}

pub fn shade_terms(material: &Material, fragment: &Fragment) -> ShadingTerms {
    let base = material.base_color;
    let light_dir = (fragment.light_position - fragment.position).normalize();

    let ambient = AMBIENT_INTENSITY * base;

    let diffuse_strength = fragment.normal.dot(light_dir).max(0.0);
    let diffuse = diffuse_strength * base;

    let view_dir = (-fragment.position).normalize();
    let reflect_dir = reflect(-light_dir, fragment.normal);
    let spec_strength = view_dir
        .dot(reflect_dir)
        .max(0.0)
        .powf(material.kind.specular_exponent());
    let specular = spec_strength * material.kind.specular_tint(base);

    ShadingTerms {
        ambient,
        diffuse,
        specular,
    }
}

/// Shades a fragment of a lit material. Alpha is always one.
pub fn shade(material: &Material, fragment: &Fragment) -> Vec4 {
    shade_terms(material, fragment).color().extend(1.0)
}

/// Fragment color of the light-source cube, independent of any lighting.
pub fn shade_unlit() -> Vec4 {
    GLOW_COLOR.extend(1.0)
}

/// GLSL/WGSL `reflect`: mirrors `incident` about the plane with `normal`.
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_on() -> Fragment {
        Fragment {
            normal: Vec3::Z,
            position: Vec3::new(0.0, 0.0, -5.0),
            light_position: Vec3::ZERO,
        }
    }

    fn oblique() -> Fragment {
        // Light slightly off the view axis so the highlight is partial.
        Fragment {
            normal: Vec3::Z,
            position: Vec3::new(0.0, 0.0, -5.0),
            light_position: Vec3::new(0.6, 0.0, 0.0),
        }
    }

    fn assert_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).abs().max_element() < 1e-5,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn head_on_red_surface_matches_analytic_terms() {
        let material = Material::new(MaterialKind::NonMetallic, Vec3::X);
        let terms = shade_terms(&material, &head_on());
        assert_close(terms.ambient, Vec3::new(0.452, 0.0, 0.0));
        assert_close(terms.diffuse, Vec3::new(1.0, 0.0, 0.0));
        // reflect(-lightDir, N) points straight back at the eye here.
        assert_close(terms.specular, Vec3::ONE);
        let color = shade(&material, &head_on());
        assert_close(color.truncate(), Vec3::new(2.452, 1.0, 1.0));
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn output_is_not_clamped() {
        let material = Material::new(MaterialKind::NonMetallic, Vec3::X);
        assert!(shade(&material, &head_on()).x > 1.0);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let material = Material::new(MaterialKind::Metallic, Vec3::new(1.0, 0.4, 0.0));
        let first = shade(&material, &oblique());
        let second = shade(&material, &oblique());
        assert_eq!(first.to_array().map(f32::to_bits), second.to_array().map(f32::to_bits));
    }

    #[test]
    fn metallic_tightens_and_tints_highlight() {
        let base = Vec3::new(1.0, 0.4, 0.0);
        assert!(MaterialKind::Metallic.specular_exponent() > MaterialKind::NonMetallic.specular_exponent());

        let plastic = shade_terms(&Material::new(MaterialKind::NonMetallic, base), &oblique());
        let metal = shade_terms(&Material::new(MaterialKind::Metallic, base), &oblique());

        assert_close(plastic.ambient, metal.ambient);
        assert_close(plastic.diffuse, metal.diffuse);

        // White highlight on plastic, base-colored on metal.
        assert!(plastic.specular.x > 0.0);
        assert_eq!(plastic.specular.x, plastic.specular.z);
        assert_eq!(metal.specular.z, 0.0);

        // Same angle, higher exponent: a partial highlight falls off faster.
        assert!(metal.specular.x < plastic.specular.x);
        assert!(metal.specular.x > 0.0);
    }

    #[test]
    fn light_behind_surface_leaves_only_ambient() {
        let material = Material::new(MaterialKind::NonMetallic, Vec3::new(0.2, 0.4, 0.6));
        let fragment = Fragment {
            normal: Vec3::Z,
            position: Vec3::new(0.0, 0.0, -5.0),
            light_position: Vec3::new(0.0, 0.0, -10.0),
        };
        let terms = shade_terms(&material, &fragment);
        assert_eq!(terms.diffuse, Vec3::ZERO);
        assert_eq!(terms.specular, Vec3::ZERO);
        assert_close(terms.color(), material.base_color() * AMBIENT_INTENSITY);
    }

    #[test]
    fn unlit_is_always_white() {
        assert_eq!(shade_unlit(), Vec4::ONE);
    }
}
