use thiserror::Error;

/// Structural problems in a shape definition. Raised by
/// [`validate_shape`](crate::validate_shape) for the loader; the engine
/// itself assumes validated input and treats an invalid shape as fatal for
/// that instance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("duplicate control point id `{0}`")]
    DuplicatePointId(String),
    #[error("segment `{segment}` references unknown control point `{point}`")]
    UnknownPointRef { segment: String, point: String },
    #[error("segment `{segment}` has {got} point reference(s), expected {expected}")]
    WrongPointCount {
        segment: String,
        expected: usize,
        got: usize,
    },
    #[error("animation duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("keyframes for `{0}` are not sorted by time")]
    UnsortedKeyframes(String),
}

/// A dangling reference hit while tessellating. Unreachable on shapes that
/// passed [`validate_shape`](crate::validate_shape).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("segment `{segment}` references unknown control point `{point}`")]
    UnknownPoint { segment: String, point: String },
    #[error("segment `{segment}` has {got} point reference(s), expected {expected}")]
    WrongPointCount {
        segment: String,
        expected: usize,
        got: usize,
    },
}
