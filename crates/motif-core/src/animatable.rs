//! Per-frame animation: formula and keyframe resolution.

use crate::expressions::{self, VarTable};
use glam::Vec2;
use motif_data::model::{FormulaSpec, Keyframe, PointAnimation, Shape, VarValue};
use std::collections::HashMap;

/// Animated overrides computed for one frame. Only animated values appear;
/// everything else keeps its static definition. Recomputed every tick and
/// discarded with the owning player.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    /// Animated control point positions, keyed by point id.
    pub points: HashMap<String, Vec2>,
    /// Offset applied on top of `position.global`, when animated.
    pub global_position: Option<Vec2>,
    /// Rendered style template values, keyed by property name.
    pub style: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, keyframe: &Keyframe) -> Option<f32> {
        match self {
            Axis::X => keyframe.x,
            Axis::Y => keyframe.y,
        }
    }

    fn base(self, point: Vec2) -> f32 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

pub struct Animator;

impl Animator {
    /// Computes the animated snapshot of `shape` at `local_time` seconds
    /// into the current loop. Deterministic for fixed inputs, except where
    /// a formula calls `random()`.
    ///
    /// A failed formula falls back to the static coordinate of that axis
    /// only; sibling axes and points are unaffected.
    pub fn compute_frame(shape: &Shape, local_time: f64) -> FrameSnapshot {
        let Some(anim) = &shape.animations else {
            return FrameSnapshot::default();
        };

        let base_vars = Self::frame_vars(shape, anim.duration, local_time);
        let mut snapshot = FrameSnapshot::default();

        for (point_id, point_anim) in &anim.control_point_animations {
            let Some(point) = shape.control_points.iter().find(|p| &p.id == point_id) else {
                tracing::warn!(point = %point_id, "animation targets a point the shape does not have");
                continue;
            };
            let base = Vec2::new(point.x, point.y);
            let resolved = Self::resolve_point(point_anim, base, &base_vars, local_time);
            snapshot.points.insert(point_id.clone(), resolved);
        }

        if let Some(position) = &anim.position_animations {
            // Synthetic point at the origin; the result reads as an offset
            // from the static global position.
            let offset = Self::resolve_point(&position.global, Vec2::ZERO, &base_vars, local_time);
            snapshot.global_position = Some(offset);
        }

        for (property, template) in &anim.style_animations {
            snapshot
                .style
                .insert(property.clone(), Self::render_template(template, &base_vars));
        }

        snapshot
    }

    /// Shape variables plus the standard animation variables. `t`, `d` and
    /// `n` are inserted last: the timebase cannot be shadowed.
    fn frame_vars(shape: &Shape, duration: f64, local_time: f64) -> VarTable {
        let mut vars = shape.variables.clone();
        vars.insert("t".to_string(), VarValue::Number(local_time));
        vars.insert("d".to_string(), VarValue::Number(duration));
        let normalized = if duration > 0.0 { local_time / duration } else { 0.0 };
        vars.insert("n".to_string(), VarValue::Number(normalized));
        vars
    }

    fn resolve_point(
        anim: &PointAnimation,
        base: Vec2,
        frame_vars: &VarTable,
        local_time: f64,
    ) -> Vec2 {
        let x = Self::resolve_axis(anim, Axis::X, base, frame_vars, local_time);
        let y = Self::resolve_axis(anim, Axis::Y, base, frame_vars, local_time);
        Vec2::new(x, y)
    }

    // Formula if declared for the axis (failure -> static coordinate),
    // otherwise keyframes, otherwise the static coordinate.
    fn resolve_axis(
        anim: &PointAnimation,
        axis: Axis,
        base: Vec2,
        frame_vars: &VarTable,
        local_time: f64,
    ) -> f32 {
        let formula = anim.formula.as_ref().and_then(|f| match axis {
            Axis::X => f.x.as_ref(),
            Axis::Y => f.y.as_ref(),
        });
        if let Some(spec) = formula {
            return Self::eval_formula(spec, frame_vars).unwrap_or_else(|| axis.base(base));
        }
        Self::keyframe_value(&anim.keyframes, axis, local_time).unwrap_or_else(|| axis.base(base))
    }

    fn eval_formula(spec: &FormulaSpec, frame_vars: &VarTable) -> Option<f32> {
        let vars = if spec.variables.is_empty() {
            None
        } else {
            let mut merged = frame_vars.clone();
            // Formula-local overrides win over shape variables, but `t`,
            // `d`, `n` stay authoritative.
            for (name, value) in &spec.variables {
                if name != "t" && name != "d" && name != "n" {
                    merged.insert(name.clone(), value.clone());
                }
            }
            Some(merged)
        };
        match expressions::evaluate(&spec.expression, vars.as_ref().unwrap_or(frame_vars)) {
            Ok(value) => Some(value as f32),
            Err(err) => {
                tracing::warn!(expression = %spec.expression, %err, "formula evaluation failed");
                None
            }
        }
    }

    /// Linear interpolation over the keyframes that carry a value on this
    /// axis. Clamps before the first and after the last keyframe; a single
    /// keyframe is a constant.
    fn keyframe_value(keyframes: &[Keyframe], axis: Axis, local_time: f64) -> Option<f32> {
        let samples: Vec<(f64, f32)> = keyframes
            .iter()
            .filter_map(|kf| axis.of(kf).map(|v| (kf.time, v)))
            .collect();
        if samples.is_empty() {
            return None;
        }

        // Index of the first sample with time > local_time; the bracketing
        // pair is [idx - 1, idx].
        let idx = samples.partition_point(|&(time, _)| time <= local_time);
        if idx == 0 {
            return Some(samples[0].1);
        }
        if idx >= samples.len() {
            return Some(samples[samples.len() - 1].1);
        }

        let (t0, v0) = samples[idx - 1];
        let (t1, v1) = samples[idx];
        let span = t1 - t0;
        if span <= 0.0 {
            return Some(v0);
        }
        let local_t = ((local_time - t0) / span) as f32;
        Some(v0 + (v1 - v0) * local_t)
    }

    /// Splices `${expr}` placeholders into a style template. A failed
    /// placeholder resolves to `0`; the rest of the template is unaffected.
    fn render_template(template: &str, frame_vars: &VarTable) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let inner = &after[..end];
                    match expressions::evaluate(inner, frame_vars) {
                        Ok(value) if value.is_finite() => {
                            out.push_str(&format_number(value));
                        }
                        Ok(_) => out.push('0'),
                        Err(err) => {
                            tracing::warn!(placeholder = %inner, %err, "style placeholder failed");
                            out.push('0');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // Unterminated placeholder; keep the tail verbatim.
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn format_number(value: f64) -> String {
    // `Display` for f64 already drops a trailing `.0`.
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use motif_data::model::{AnimationBlock, AxisFormulas, ControlPoint, PointKind, PositionAnimations};

    fn point(id: &str, x: f32, y: f32) -> ControlPoint {
        ControlPoint {
            id: id.to_string(),
            x,
            y,
            kind: PointKind::Anchor,
        }
    }

    fn shape_with(points: Vec<ControlPoint>, animations: AnimationBlock) -> Shape {
        Shape {
            id: "test".to_string(),
            width: 0.0,
            height: 0.0,
            position: Default::default(),
            control_points: points,
            segments: vec![],
            style: Default::default(),
            fill_path: false,
            close_path: false,
            variables: Default::default(),
            animations: Some(animations),
        }
    }

    fn keyframe_x(time: f64, x: f32) -> Keyframe {
        Keyframe {
            time,
            x: Some(x),
            y: None,
        }
    }

    #[test]
    fn test_keyframe_interpolation_and_clamping() {
        let keyframes = vec![keyframe_x(0.0, 0.0), keyframe_x(2.0, 10.0)];
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 1.0), Some(5.0));
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, -1.0), Some(0.0));
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 5.0), Some(10.0));
        // No data on this axis at all
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::Y, 1.0), None);
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let keyframes = vec![keyframe_x(1.0, 7.0)];
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 0.0), Some(7.0));
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 3.0), Some(7.0));
    }

    #[test]
    fn test_bracketing_pair_selection() {
        let keyframes = vec![
            keyframe_x(0.0, 0.0),
            keyframe_x(1.0, 10.0),
            keyframe_x(3.0, 30.0),
            keyframe_x(4.0, 0.0),
        ];
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 0.5), Some(5.0));
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 2.0), Some(20.0));
        assert_eq!(Animator::keyframe_value(&keyframes, Axis::X, 3.5), Some(15.0));
    }

    #[test]
    fn test_formula_with_keyframe_fallback_per_axis() {
        let mut control_point_animations = HashMap::new();
        control_point_animations.insert(
            "tip".to_string(),
            PointAnimation {
                formula: Some(AxisFormulas {
                    x: Some(FormulaSpec {
                        expression: "10 * n".to_string(),
                        variables: Default::default(),
                    }),
                    y: None,
                }),
                keyframes: vec![Keyframe {
                    time: 0.0,
                    x: None,
                    y: Some(-50.0),
                }],
            },
        );
        let shape = shape_with(
            vec![point("tip", 1.0, -80.0)],
            AnimationBlock {
                duration: 2.0,
                loops: 0,
                control_point_animations,
                position_animations: None,
                style_animations: Default::default(),
            },
        );

        let snapshot = Animator::compute_frame(&shape, 1.0);
        let tip = snapshot.points["tip"];
        assert!((tip.x - 5.0).abs() < 1e-6); // formula: 10 * 0.5
        assert!((tip.y - -50.0).abs() < 1e-6); // keyframe axis
    }

    #[test]
    fn test_failed_formula_falls_back_to_static() {
        let mut control_point_animations = HashMap::new();
        control_point_animations.insert(
            "tip".to_string(),
            PointAnimation {
                formula: Some(AxisFormulas {
                    x: Some(FormulaSpec {
                        expression: "nonsense(t)".to_string(),
                        variables: Default::default(),
                    }),
                    y: Some(FormulaSpec {
                        expression: "t * 2".to_string(),
                        variables: Default::default(),
                    }),
                }),
                keyframes: vec![],
            },
        );
        let shape = shape_with(
            vec![point("tip", 4.0, -80.0)],
            AnimationBlock {
                duration: 2.0,
                loops: 0,
                control_point_animations,
                position_animations: None,
                style_animations: Default::default(),
            },
        );

        let snapshot = Animator::compute_frame(&shape, 1.0);
        let tip = snapshot.points["tip"];
        assert_eq!(tip.x, 4.0); // static fallback for the broken axis only
        assert_eq!(tip.y, 2.0);
    }

    #[test]
    fn test_global_position_offset() {
        let shape = shape_with(
            vec![],
            AnimationBlock {
                duration: 4.0,
                loops: 0,
                control_point_animations: Default::default(),
                position_animations: Some(PositionAnimations {
                    global: PointAnimation {
                        formula: Some(AxisFormulas {
                            x: Some(FormulaSpec {
                                expression: "8 * n".to_string(),
                                variables: Default::default(),
                            }),
                            y: None,
                        }),
                        keyframes: vec![],
                    },
                }),
                style_animations: Default::default(),
            },
        );

        let snapshot = Animator::compute_frame(&shape, 2.0);
        let offset = snapshot.global_position.unwrap();
        assert!((offset.x - 4.0).abs() < 1e-6);
        assert_eq!(offset.y, 0.0); // synthetic point is static at the origin
    }

    #[test]
    fn test_style_template() {
        let mut style_animations = HashMap::new();
        style_animations.insert(
            "strokeStyle".to_string(),
            "rgba(${100 + 100 * n}, 0, ${broken(}, 1)".to_string(),
        );
        let shape = shape_with(
            vec![],
            AnimationBlock {
                duration: 2.0,
                loops: 0,
                control_point_animations: Default::default(),
                position_animations: None,
                style_animations,
            },
        );

        let snapshot = Animator::compute_frame(&shape, 1.0);
        assert_eq!(snapshot.style["strokeStyle"], "rgba(150, 0, 0, 1)");
    }

    #[test]
    fn test_formula_local_variables_override() {
        let mut control_point_animations = HashMap::new();
        let mut locals = HashMap::new();
        locals.insert("amp".to_string(), VarValue::Number(2.0));
        control_point_animations.insert(
            "tip".to_string(),
            PointAnimation {
                formula: Some(AxisFormulas {
                    x: Some(FormulaSpec {
                        expression: "amp * 10".to_string(),
                        variables: locals,
                    }),
                    y: None,
                }),
                keyframes: vec![],
            },
        );
        let mut shape = shape_with(
            vec![point("tip", 0.0, 0.0)],
            AnimationBlock {
                duration: 1.0,
                loops: 0,
                control_point_animations,
                position_animations: None,
                style_animations: Default::default(),
            },
        );
        shape
            .variables
            .insert("amp".to_string(), VarValue::Number(5.0));

        let snapshot = Animator::compute_frame(&shape, 0.0);
        assert_eq!(snapshot.points["tip"].x, 20.0);
    }
}
