//! Ear-clipping triangulation for polygons with holes.
//!
//! Holes are merged into the outer ring through a bridge edge from each
//! hole's rightmost vertex to a visible outer vertex, processed from the
//! rightmost hole leftwards. The resulting weakly simple ring is then clipped
//! ear by ear.

use glam::Vec2;

use crate::typeface::signed_area;

/// Triangulates `outer` minus `holes`.
///
/// Returned indices address the concatenation of `outer` followed by every
/// hole in order. Triangles are counter-clockwise regardless of the input
/// winding.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Vec<[u32; 3]> {
    let mut points: Vec<Vec2> = Vec::with_capacity(outer.len());
    points.extend_from_slice(outer);

    let mut ring: Vec<usize> = (0..outer.len()).collect();
    if signed_area(outer) < 0.0 {
        ring.reverse();
    }

    let mut hole_rings = Vec::with_capacity(holes.len());
    for hole in holes {
        let start = points.len();
        points.extend_from_slice(hole);
        let mut hole_ring: Vec<usize> = (start..points.len()).collect();
        if signed_area(hole) > 0.0 {
            hole_ring.reverse();
        }
        if hole_ring.len() >= 3 {
            hole_rings.push(hole_ring);
        }
    }

    hole_rings.sort_by(|a, b| {
        let ax = max_x(&points, a);
        let bx = max_x(&points, b);
        bx.total_cmp(&ax)
    });
    for hole in hole_rings {
        merge_hole(&points, &mut ring, &hole);
    }

    clip_ears(&points, ring)
}

fn max_x(points: &[Vec2], ring: &[usize]) -> f32 {
    ring.iter()
        .map(|&i| points[i].x)
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Positive when `a`, `b`, `c` turn counter-clockwise.
fn orient(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - b)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    orient(a, b, p) >= 0.0 && orient(b, c, p) >= 0.0 && orient(c, a, p) >= 0.0
}

fn merge_hole(points: &[Vec2], ring: &mut Vec<usize>, hole: &[usize]) {
    let Some(m_pos) = (0..hole.len()).reduce(|best, i| {
        if points[hole[i]].x > points[hole[best]].x {
            i
        } else {
            best
        }
    }) else {
        return;
    };
    let m = points[hole[m_pos]];

    let Some(bridge) = find_bridge(points, ring, m) else {
        log::debug!("no bridge found for hole at {m:?}; hole ignored");
        return;
    };

    let mut merged = Vec::with_capacity(ring.len() + hole.len() + 2);
    merged.extend_from_slice(&ring[..=bridge]);
    merged.extend(hole[m_pos..].iter().chain(&hole[..m_pos]));
    merged.push(hole[m_pos]);
    merged.push(ring[bridge]);
    merged.extend_from_slice(&ring[bridge + 1..]);
    *ring = merged;
}

/// Ring position of an outer vertex visible from `m`.
fn find_bridge(points: &[Vec2], ring: &[usize], m: Vec2) -> Option<usize> {
    let n = ring.len();
    let mut nearest: Option<(f32, usize)> = None;
    for i in 0..n {
        let j = (i + 1) % n;
        let a = points[ring[i]];
        let b = points[ring[j]];
        if a.y == b.y {
            continue;
        }
        let straddles = (a.y <= m.y && b.y >= m.y) || (b.y <= m.y && a.y >= m.y);
        if !straddles {
            continue;
        }
        let x = a.x + (m.y - a.y) * (b.x - a.x) / (b.y - a.y);
        if x < m.x {
            continue;
        }
        let candidate = if a.x >= b.x { i } else { j };
        if nearest.map_or(true, |(best, _)| x < best) {
            nearest = Some((x, candidate));
        }
    }
    let (hit_x, mut bridge) = nearest?;
    let hit = Vec2::new(hit_x, m.y);
    let p = points[ring[bridge]];
    if p == hit {
        return Some(bridge);
    }

    // A reflex vertex inside (m, hit, p) blocks the view of p; take the one
    // closest in angle to the ray instead.
    let (t0, t1, t2) = if orient(m, hit, p) >= 0.0 {
        (m, hit, p)
    } else {
        (m, p, hit)
    };
    let mut best_tan = f32::INFINITY;
    for pos in 0..n {
        let v = points[ring[pos]];
        if v == p || v.x <= m.x || !point_in_triangle(v, t0, t1, t2) {
            continue;
        }
        let prev = points[ring[(pos + n - 1) % n]];
        let next = points[ring[(pos + 1) % n]];
        if orient(prev, v, next) >= 0.0 {
            continue;
        }
        let tan = (v.y - m.y).abs() / (v.x - m.x);
        if tan < best_tan {
            best_tan = tan;
            bridge = pos;
        }
    }
    Some(bridge)
}

fn clip_ears(points: &[Vec2], mut ring: Vec<usize>) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));

    while ring.len() > 3 {
        let n = ring.len();
        let mut clipped = false;
        for i in 0..n {
            let (ia, ib, ic) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            let turn = orient(a, b, c);
            if turn == 0.0 {
                // Collinear or duplicate: drop without emitting anything.
                ring.remove(i);
                clipped = true;
                break;
            }
            if turn < 0.0 || !is_ear(points, &ring, a, b, c) {
                continue;
            }
            triangles.push([ia as u32, ib as u32, ic as u32]);
            ring.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // Self-touching input; force progress on the first convex corner.
            let Some(i) = (0..n).find(|&i| {
                let a = points[ring[(i + n - 1) % n]];
                let c = points[ring[(i + 1) % n]];
                orient(a, points[ring[i]], c) > 0.0
            }) else {
                break;
            };
            let (ia, ib, ic) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            triangles.push([ia as u32, ib as u32, ic as u32]);
            ring.remove(i);
        }
    }

    if ring.len() == 3 && orient(points[ring[0]], points[ring[1]], points[ring[2]]) > 0.0 {
        triangles.push([ring[0] as u32, ring[1] as u32, ring[2] as u32]);
    }
    triangles
}

fn is_ear(points: &[Vec2], ring: &[usize], a: Vec2, b: Vec2, c: Vec2) -> bool {
    ring.iter().map(|&i| points[i]).all(|p| {
        p == a || p == b || p == c || !point_in_triangle(p, a, b, c)
    })
}
