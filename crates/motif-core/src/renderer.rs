//! Renderable primitives handed to an external backend.
//!
//! The engine stops at plain data: outline path commands for stroke
//! rendering, a sampled polyline, and an optional triangle buffer for
//! filled GPU rendering. Issuing draw calls is someone else's job.

use crate::animatable::FrameSnapshot;
use crate::errors::GeometryError;
use crate::{geometry, triangulate};
use glam::Vec2;
use kurbo::BezPath;
use motif_data::model::{Shape, StyleMap};

/// Triangles for filled rendering: `3 * triangle_count * 2` floats of
/// shape-local vertex coordinates.
#[derive(Debug, Clone, Default)]
pub struct FillMesh {
    pub vertices: Vec<f32>,
    pub triangle_count: usize,
}

/// One shape's renderable geometry for one frame. Coordinates are
/// shape-local; the renderer translates by `origin`.
#[derive(Debug, Clone)]
pub struct RenderGeometry {
    /// Global position, including any animated offset.
    pub origin: Vec2,
    /// Outline path commands: move / line / cubic curve / close.
    pub outline: BezPath,
    /// Sampled polyline for stroke rendering.
    pub polyline: Vec<Vec2>,
    /// Fill triangles; present only when the shape is filled.
    pub fill: Option<FillMesh>,
    /// Static style with animated string values overlaid.
    pub style: StyleMap,
}

/// Assembles the renderable geometry of `shape` under the animated
/// `snapshot`. Call after the frame's snapshot is computed so readers never
/// see a partially updated frame.
pub fn build_geometry(
    shape: &Shape,
    snapshot: &FrameSnapshot,
    curve_resolution: usize,
) -> Result<RenderGeometry, GeometryError> {
    let points = geometry::resolved_points(shape, snapshot);
    let outline = geometry::to_outline(&shape.segments, &points, shape.close_path)?;
    let polyline = geometry::to_polyline(&shape.segments, &points, shape.close_path, curve_resolution)?;

    let fill = if shape.fill_path {
        let mut ring = polyline.clone();
        // The closing duplicate would register as a zero-length edge.
        if ring.len() > 1 {
            let first = ring[0];
            let last = *ring.last().unwrap();
            if first.distance_squared(last) <= f32::EPSILON {
                ring.pop();
            }
        }
        let triangles = triangulate::triangulate(&ring);
        Some(FillMesh {
            vertices: triangulate::triangle_vertices(&ring, &triangles),
            triangle_count: triangles.len(),
        })
    } else {
        None
    };

    let mut origin = Vec2::new(shape.position.global.x, shape.position.global.y);
    if let Some(offset) = snapshot.global_position {
        origin += offset;
    }

    let mut style = shape.style.clone();
    for (property, value) in &snapshot.style {
        style.insert(property.clone(), serde_json::Value::String(value.clone()));
    }

    Ok(RenderGeometry {
        origin,
        outline,
        polyline,
        fill,
        style,
    })
}
