use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Style properties are schema-loose: the engine only shallow-merges and
/// templates them, so they stay as raw JSON values.
pub type StyleMap = HashMap<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    #[default]
    Anchor,
    Control,
}

/// A named 2D coordinate. Segments reference points by `id`; ids are unique
/// within one shape.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ControlPoint {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub kind: PointKind,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Line,
    Bezier,
}

impl SegmentKind {
    /// Number of control points a segment of this kind references:
    /// 2 for a line, 4 (start, c1, c2, end) for a cubic bezier.
    pub fn point_count(self) -> usize {
        match self {
            SegmentKind::Line => 2,
            SegmentKind::Bezier => 4,
        }
    }
}

/// A line or cubic-bezier edge between control points. Consecutive segments
/// are expected to share their joint point (the first id of one segment
/// equals the last id of the previous one) for a continuous outline.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub kind: SegmentKind,
    pub point_ids: Vec<String>,
    #[serde(default)]
    pub style: StyleMap,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    #[serde(default)]
    pub local: Coord,
    #[serde(default)]
    pub global: Coord,
}

/// A variable value: a number, or text that participates in `|var:NAME|`
/// substitution (the text itself may reference further variables).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum VarValue {
    Number(f64),
    Text(String),
}

impl VarValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VarValue::Number(v) => Some(*v),
            VarValue::Text(_) => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Number(v) => write!(f, "{}", v),
            VarValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for VarValue {
    fn from(v: f64) -> Self {
        VarValue::Number(v)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub position: Position,
    pub control_points: Vec<ControlPoint>,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub fill_path: bool,
    #[serde(default)]
    pub close_path: bool,
    #[serde(default)]
    pub variables: HashMap<String, VarValue>,
    #[serde(default)]
    pub animations: Option<AnimationBlock>,
}

fn default_duration() -> f64 {
    5.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnimationBlock {
    /// Length of one loop in seconds. Must be positive.
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Number of loops to run; 0 means loop forever.
    #[serde(default)]
    pub loops: u32,
    #[serde(default)]
    pub control_point_animations: HashMap<String, PointAnimation>,
    #[serde(default)]
    pub position_animations: Option<PositionAnimations>,
    /// property name -> template string with `${expr}` placeholders.
    #[serde(default)]
    pub style_animations: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PositionAnimations {
    pub global: PointAnimation,
}

/// How one control point moves. Both sources may be present: each axis takes
/// its formula if one exists, falls back to keyframes, then to the point's
/// static coordinate.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PointAnimation {
    #[serde(default)]
    pub formula: Option<AxisFormulas>,
    /// Sorted ascending by `time`.
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AxisFormulas {
    #[serde(default)]
    pub x: Option<FormulaSpec>,
    #[serde(default)]
    pub y: Option<FormulaSpec>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FormulaSpec {
    pub expression: String,
    /// Formula-local overrides, merged over the shape's variable table.
    #[serde(default)]
    pub variables: HashMap<String, VarValue>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct Keyframe {
    /// Seconds into the loop.
    pub time: f64,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

/// A sparse delta applied onto a base shape to derive a new one. Unknown
/// point/segment ids are skipped rather than rejected.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    #[serde(default)]
    pub modify_position: Option<PositionDelta>,
    #[serde(default)]
    pub modify_control_points: HashMap<String, PointOffset>,
    /// segment id -> style overrides, shallow-merged.
    #[serde(default)]
    pub style_changes: HashMap<String, StyleMap>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub fill_path: Option<bool>,
    #[serde(default)]
    pub close_path: Option<bool>,
    /// Replaces the base shape's animation block wholesale when present.
    #[serde(default)]
    pub animations: Option<AnimationBlock>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct PositionDelta {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "camelCase")]
pub struct PointOffset {
    #[serde(default)]
    pub x_offset: f32,
    #[serde(default)]
    pub y_offset: f32,
}
