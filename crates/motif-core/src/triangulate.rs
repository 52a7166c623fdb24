//! Ear-clipping triangulation for simple, hole-free polygon outlines.
//!
//! O(n²) worst case, which is fine for the tens-to-low-hundreds of vertices
//! a tessellated curve outline produces.

use glam::Vec2;

/// Signed area of the polygon; positive for counter-clockwise winding.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    0.5 * sum
}

// Twice the signed area of triangle (a, b, c).
fn area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

// Barycentric sign test, boundary inclusive. The ear triangle is known to
// be counter-clockwise when this is called.
fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    area2(a, b, p) >= 0.0 && area2(b, c, p) >= 0.0 && area2(c, a, p) >= 0.0
}

/// Ear-clips `points` into triangles, returned as index triples into
/// `points`. The input is treated as a simple, non-self-intersecting,
/// hole-free polygon; winding is normalized internally, indices always
/// refer to the caller's order.
///
/// Degenerate input (a full scan finding no ear) terminates with whatever
/// triangles were clipped so far — rendering degrades to a partially filled
/// shape instead of failing the frame.
pub fn triangulate(points: &[Vec2]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..n).collect();
    if signed_area(points) < 0.0 {
        indices.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    while indices.len() > 3 {
        let len = indices.len();
        let mut clipped = false;

        for i in 0..len {
            let prev = indices[(i + len - 1) % len];
            let curr = indices[i];
            let next = indices[(i + 1) % len];

            let a = points[prev];
            let b = points[curr];
            let c = points[next];

            // Reflex or degenerate corner: not an ear.
            if area2(a, b, c) <= 0.0 {
                continue;
            }

            let blocked = indices.iter().any(|&other| {
                other != prev
                    && other != curr
                    && other != next
                    && point_in_triangle(points[other], a, b, c)
            });
            if blocked {
                continue;
            }

            triangles.push([prev, curr, next]);
            indices.remove(i);
            clipped = true;
            break;
        }

        if !clipped {
            tracing::warn!(
                remaining = indices.len(),
                "no ear found; returning partial triangulation"
            );
            return triangles;
        }
    }

    triangles.push([indices[0], indices[1], indices[2]]);
    triangles
}

/// Flattens triangles into the `3 * N * 2` float buffer a GPU fill consumes.
pub fn triangle_vertices(points: &[Vec2], triangles: &[[usize; 3]]) -> Vec<f32> {
    let mut vertices = Vec::with_capacity(triangles.len() * 6);
    for triangle in triangles {
        for &index in triangle {
            let p = points[index];
            vertices.push(p.x);
            vertices.push(p.y);
        }
    }
    vertices
}
