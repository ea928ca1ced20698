use glam::Vec3;

/// Floats per interleaved vertex: `position.xyz` followed by `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;

/// GPU ready triangle mesh with interleaved vertices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Axis aligned cube centered on the origin with flat per-face normals.
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        ];
        let mut mesh = Self::new();
        for (normal, right, up) in faces {
            let center = normal * half;
            let corners = [
                center - right * half - up * half,
                center + right * half - up * half,
                center + right * half + up * half,
                center - right * half + up * half,
            ];
            let base = mesh.push_vertex(corners[0], normal);
            for corner in &corners[1..] {
                mesh.push_vertex(*corner, normal);
            }
            mesh.push_triangle(base, base + 1, base + 2);
            mesh.push_triangle(base, base + 2, base + 3);
        }
        mesh
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, index: u32) -> Vec3 {
        let start = index as usize * VERTEX_STRIDE;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    pub fn normal(&self, index: u32) -> Vec3 {
        let start = index as usize * VERTEX_STRIDE + 3;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    /// Minimum and maximum corner of the vertex positions, if any.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|chunk| Vec3::from_slice(&chunk[..3]));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}
