use glam::{Vec2, Vec3};

use crate::mesh::Mesh;
use crate::triangulate::triangulate;
use crate::typeface::{signed_area, Contour, FontError, GlyphOutline, Typeface};

/// Glyph geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Em size in scene units.
    pub size: f32,
    /// Extrusion depth along +z.
    pub depth: f32,
    pub curve_segments: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            depth: 0.2,
            curve_segments: crate::typeface::DEFAULT_CURVE_SEGMENTS,
        }
    }
}

/// Builds the extruded mesh for a single glyph.
pub fn glyph_mesh(typeface: &Typeface, glyph: char, options: TextOptions) -> Result<Mesh, FontError> {
    let outline = typeface.outline(glyph, options.size, options.curve_segments)?;
    Ok(extrude_outline(&outline, options.depth))
}

/// A filled region and the holes cut out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outer: Contour,
    pub holes: Vec<Contour>,
}

/// Groups glyph contours into shapes.
///
/// Contours wound like the largest one are solids; the rest are holes and
/// belong to the solid that contains them. Solids come back counter-clockwise
/// and holes clockwise.
pub fn classify_contours(contours: &[Contour]) -> Vec<Shape> {
    let Some(largest) = contours
        .iter()
        .map(|c| signed_area(c))
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
    else {
        return Vec::new();
    };
    let solid_sign = largest.signum();

    let mut shapes = Vec::new();
    let mut holes = Vec::new();
    for contour in contours {
        let area = signed_area(contour);
        if area == 0.0 {
            continue;
        }
        if area.signum() == solid_sign {
            shapes.push(Shape {
                outer: wound(contour, true),
                holes: Vec::new(),
            });
        } else {
            holes.push(wound(contour, false));
        }
    }

    for hole in holes {
        match shapes
            .iter_mut()
            .find(|shape| contains(&shape.outer, hole[0]))
        {
            Some(shape) => shape.holes.push(hole),
            None => log::debug!("dropping hole outside every solid contour"),
        }
    }
    shapes
}

fn wound(contour: &[Vec2], counter_clockwise: bool) -> Contour {
    let mut contour = contour.to_vec();
    if (signed_area(&contour) > 0.0) != counter_clockwise {
        contour.reverse();
    }
    contour
}

/// Even-odd point in polygon test.
fn contains(polygon: &[Vec2], point: Vec2) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + n - 1) % n];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
    }
    inside
}

/// Extrudes a flat outline into a closed solid spanning `z = 0..depth`.
///
/// The front cap faces +z, the back cap faces -z and the side walls carry
/// flat outward normals.
pub fn extrude_outline(outline: &GlyphOutline, depth: f32) -> Mesh {
    let mut mesh = Mesh::new();
    for shape in classify_contours(&outline.contours) {
        push_caps(&mut mesh, &shape, depth);
        push_walls(&mut mesh, &shape.outer, depth);
        for hole in &shape.holes {
            push_walls(&mut mesh, hole, depth);
        }
    }
    mesh
}

fn push_caps(mesh: &mut Mesh, shape: &Shape, depth: f32) {
    let triangles = triangulate(&shape.outer, &shape.holes);
    let points: Vec<Vec2> = shape
        .outer
        .iter()
        .chain(shape.holes.iter().flatten())
        .copied()
        .collect();

    let front = mesh.vertex_count() as u32;
    for p in &points {
        mesh.push_vertex(p.extend(depth), Vec3::Z);
    }
    let back = mesh.vertex_count() as u32;
    for p in &points {
        mesh.push_vertex(p.extend(0.0), Vec3::NEG_Z);
    }

    for [a, b, c] in triangles {
        mesh.push_triangle(front + a, front + b, front + c);
        mesh.push_triangle(back + a, back + c, back + b);
    }
}

fn push_walls(mesh: &mut Mesh, contour: &[Vec2], depth: f32) {
    let n = contour.len();
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        let edge = b - a;
        let normal = Vec3::new(edge.y, -edge.x, 0.0).normalize_or_zero();
        let a0 = mesh.push_vertex(a.extend(0.0), normal);
        let b0 = mesh.push_vertex(b.extend(0.0), normal);
        let b1 = mesh.push_vertex(b.extend(depth), normal);
        let a1 = mesh.push_vertex(a.extend(depth), normal);
        mesh.push_triangle(a0, b0, b1);
        mesh.push_triangle(a0, b1, a1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Contour {
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ]
    }

    fn clockwise(mut contour: Contour) -> Contour {
        contour.reverse();
        contour
    }

    /// Signed volume of a closed mesh; positive when faces point outward.
    fn volume(mesh: &Mesh) -> f32 {
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| mesh.position(i));
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    #[test]
    fn square_extrudes_into_a_closed_box() {
        let outline = GlyphOutline {
            contours: vec![clockwise(rect(0.0, 0.0, 1.0, 1.0))],
            advance: 1.0,
        };
        let mesh = extrude_outline(&outline, 0.2);
        assert_eq!(mesh.vertex_count(), 8 + 16);
        assert_eq!(mesh.triangle_count(), 4 + 8);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.2));
        assert!((volume(&mesh) - 0.2).abs() < 1e-5);
    }

    #[test]
    fn every_triangle_faces_its_vertex_normal() {
        let outline = GlyphOutline {
            contours: vec![
                clockwise(rect(0.0, 0.0, 3.0, 3.0)),
                rect(1.0, 1.0, 2.0, 2.0),
            ],
            advance: 3.0,
        };
        let mesh = extrude_outline(&outline, 0.5);
        for t in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| mesh.position(i));
            let face = (b - a).cross(c - a).normalize();
            assert!(face.dot(mesh.normal(t[0])) > 0.99);
        }
    }

    #[test]
    fn holes_are_subtracted_from_the_volume() {
        let outline = GlyphOutline {
            contours: vec![
                clockwise(rect(0.0, 0.0, 4.0, 4.0)),
                rect(1.0, 1.0, 3.0, 3.0),
            ],
            advance: 4.0,
        };
        let shapes = classify_contours(&outline.contours);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes.len(), 1);
        assert!(signed_area(&shapes[0].outer) > 0.0);
        assert!(signed_area(&shapes[0].holes[0]) < 0.0);

        let mesh = extrude_outline(&outline, 0.5);
        assert!((volume(&mesh) - 12.0 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn separate_solids_keep_their_own_holes() {
        let contours = vec![
            clockwise(rect(0.0, 0.0, 3.0, 3.0)),
            clockwise(rect(5.0, 0.0, 8.0, 3.0)),
            rect(6.0, 1.0, 7.0, 2.0),
        ];
        let shapes = classify_contours(&contours);
        assert_eq!(shapes.len(), 2);
        assert!(shapes[0].holes.is_empty());
        assert_eq!(shapes[1].holes.len(), 1);
    }

    #[test]
    fn empty_outline_gives_empty_mesh() {
        let mesh = extrude_outline(&GlyphOutline::default(), 0.2);
        assert!(mesh.is_empty());
    }
}
