//! Segment-to-geometry tessellation.
//!
//! Walks a shape's ordered segments against an explicit point lookup table
//! and produces either outline path commands ([`kurbo::BezPath`]) or a
//! sampled polyline. Consecutive segments are expected to share their joint
//! point; that contract belongs to the shape author and is not verified
//! here — a violation shows up downstream as a visible discontinuity.

use crate::animatable::FrameSnapshot;
use crate::errors::GeometryError;
use glam::Vec2;
use kurbo::BezPath;
use motif_data::model::{Segment, SegmentKind, Shape};
use std::collections::HashMap;

/// Samples per bezier segment when the caller has no opinion.
pub const DEFAULT_CURVE_RESOLUTION: usize = 16;

/// Static control point positions overlaid with the animated snapshot.
pub fn resolved_points(shape: &Shape, snapshot: &FrameSnapshot) -> HashMap<String, Vec2> {
    let mut points = HashMap::with_capacity(shape.control_points.len());
    for point in &shape.control_points {
        points.insert(point.id.clone(), Vec2::new(point.x, point.y));
    }
    for (id, position) in &snapshot.points {
        if let Some(slot) = points.get_mut(id) {
            *slot = *position;
        }
    }
    points
}

fn segment_points(
    segment: &Segment,
    points: &HashMap<String, Vec2>,
) -> Result<Vec<Vec2>, GeometryError> {
    let expected = segment.kind.point_count();
    if segment.point_ids.len() != expected {
        return Err(GeometryError::WrongPointCount {
            segment: segment.id.clone(),
            expected,
            got: segment.point_ids.len(),
        });
    }
    segment
        .point_ids
        .iter()
        .map(|id| {
            points.get(id).copied().ok_or_else(|| GeometryError::UnknownPoint {
                segment: segment.id.clone(),
                point: id.clone(),
            })
        })
        .collect()
}

fn to_kurbo(p: Vec2) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

/// Emits outline path commands: a move to the first segment's first point,
/// then one line/curve continuation per segment, and a close when
/// `close_path` is set.
pub fn to_outline(
    segments: &[Segment],
    points: &HashMap<String, Vec2>,
    close_path: bool,
) -> Result<BezPath, GeometryError> {
    let mut path = BezPath::new();
    for (index, segment) in segments.iter().enumerate() {
        let pts = segment_points(segment, points)?;
        if index == 0 {
            path.move_to(to_kurbo(pts[0]));
        }
        match segment.kind {
            SegmentKind::Line => path.line_to(to_kurbo(pts[1])),
            SegmentKind::Bezier => {
                path.curve_to(to_kurbo(pts[1]), to_kurbo(pts[2]), to_kurbo(pts[3]))
            }
        }
    }
    if close_path && !path.elements().is_empty() {
        path.close_path();
    }
    Ok(path)
}

/// Point on a cubic bezier at parameter `t` in [0, 1].
pub fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let one_minus_t = 1.0 - t;
    let one_minus_t_sq = one_minus_t * one_minus_t;
    let one_minus_t_cub = one_minus_t_sq * one_minus_t;

    let t_sq = t * t;
    let t_cub = t_sq * t;

    p0 * one_minus_t_cub
        + p1 * 3.0 * one_minus_t_sq * t
        + p2 * 3.0 * one_minus_t * t_sq
        + p3 * t_cub
}

/// Samples the segment walk into a flat polyline. A line contributes its
/// endpoints; a bezier contributes `curve_resolution + 1` uniform samples.
/// For every segment after the first, sample 0 is dropped so the shared
/// joint does not produce a zero-length edge. With `close_path`, the start
/// point is appended when the walk does not already end on it.
pub fn to_polyline(
    segments: &[Segment],
    points: &HashMap<String, Vec2>,
    close_path: bool,
    curve_resolution: usize,
) -> Result<Vec<Vec2>, GeometryError> {
    let resolution = curve_resolution.max(1);
    let mut polyline = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let pts = segment_points(segment, points)?;
        let first_segment = index == 0;
        match segment.kind {
            SegmentKind::Line => {
                if first_segment {
                    polyline.push(pts[0]);
                }
                polyline.push(pts[1]);
            }
            SegmentKind::Bezier => {
                let start = if first_segment { 0 } else { 1 };
                for step in start..=resolution {
                    let t = step as f32 / resolution as f32;
                    polyline.push(cubic_point(pts[0], pts[1], pts[2], pts[3], t));
                }
            }
        }
    }

    if close_path {
        if let (Some(&first), Some(&last)) = (polyline.first(), polyline.last()) {
            if first.distance_squared(last) > f32::EPSILON {
                polyline.push(first);
            }
        }
    }

    Ok(polyline)
}
