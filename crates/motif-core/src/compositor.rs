//! Non-destructive modification compositing.
//!
//! A modification is a sparse delta: position and point offsets add,
//! style entries shallow-merge, path flags and the animation block
//! overwrite. The base shape is never touched.

use motif_data::model::{Modification, Shape};

/// Applies `modification` onto a deep copy of `base` and returns the
/// derived shape.
///
/// Steps run in a fixed order: position delta, point offsets, per-segment
/// styles, shape style, `fill_path`/`close_path`, animation replacement.
/// Offsets are deltas, so applying a modification twice in sequence
/// compounds them; the overwrite steps are stable under re-application.
/// References to unknown point or segment ids are skipped.
pub fn apply(base: &Shape, modification: &Modification) -> Shape {
    let mut shape = base.clone();

    if let Some(delta) = &modification.modify_position {
        shape.position.global.x += delta.x;
        shape.position.global.y += delta.y;
    }

    for (point_id, offset) in &modification.modify_control_points {
        match shape.control_points.iter_mut().find(|p| &p.id == point_id) {
            Some(point) => {
                point.x += offset.x_offset;
                point.y += offset.y_offset;
            }
            None => {
                tracing::debug!(point = %point_id, "offset names a point the shape does not have, skipped");
            }
        }
    }

    for (segment_id, overrides) in &modification.style_changes {
        match shape.segments.iter_mut().find(|s| &s.id == segment_id) {
            Some(segment) => {
                for (key, value) in overrides {
                    segment.style.insert(key.clone(), value.clone());
                }
            }
            None => {
                tracing::debug!(segment = %segment_id, "style change names a segment the shape does not have, skipped");
            }
        }
    }

    for (key, value) in &modification.style {
        shape.style.insert(key.clone(), value.clone());
    }

    if let Some(fill_path) = modification.fill_path {
        shape.fill_path = fill_path;
    }
    if let Some(close_path) = modification.close_path {
        shape.close_path = close_path;
    }

    if let Some(animations) = &modification.animations {
        shape.animations = Some(animations.clone());
    }

    shape
}
