//! motif-core: procedural animation and tessellation of 2D vector shapes.
//!
//! A shape is a set of named control points joined by line/bezier segments
//! (`motif-data`). Per frame, [`Animator`] resolves formula- and
//! keyframe-driven overrides, [`geometry`] turns the segment walk into path
//! commands or a polyline, and [`triangulate`] ear-clips filled outlines
//! into triangles. [`compositor`] derives new shapes from sparse
//! modifications without touching the base. Everything runs synchronously
//! within one tick; there is no shared state between shape instances.

pub mod animatable;
pub mod compositor;
pub mod errors;
pub mod expressions;
pub mod geometry;
pub mod renderer;
pub mod triangulate;

pub use animatable::{Animator, FrameSnapshot};
pub use errors::{GeometryError, ShapeError};
pub use expressions::EvalError;
pub use renderer::{build_geometry, FillMesh, RenderGeometry};

use motif_data::model::Shape;
use std::collections::HashSet;

/// Structural validation for the external loader. The engine assumes its
/// input already passed this; a shape that fails here is fatal for the
/// instance (render nothing or substitute a default), not something the
/// engine partially recovers from.
pub fn validate_shape(shape: &Shape) -> Result<(), ShapeError> {
    let mut ids = HashSet::new();
    for point in &shape.control_points {
        if !ids.insert(point.id.as_str()) {
            return Err(ShapeError::DuplicatePointId(point.id.clone()));
        }
    }

    for segment in &shape.segments {
        let expected = segment.kind.point_count();
        if segment.point_ids.len() != expected {
            return Err(ShapeError::WrongPointCount {
                segment: segment.id.clone(),
                expected,
                got: segment.point_ids.len(),
            });
        }
        for point_id in &segment.point_ids {
            if !ids.contains(point_id.as_str()) {
                return Err(ShapeError::UnknownPointRef {
                    segment: segment.id.clone(),
                    point: point_id.clone(),
                });
            }
        }
    }

    if let Some(anim) = &shape.animations {
        if anim.duration <= 0.0 {
            return Err(ShapeError::NonPositiveDuration(anim.duration));
        }
        for (point_id, point_anim) in &anim.control_point_animations {
            if !sorted_by_time(&point_anim.keyframes) {
                return Err(ShapeError::UnsortedKeyframes(point_id.clone()));
            }
        }
        if let Some(position) = &anim.position_animations {
            if !sorted_by_time(&position.global.keyframes) {
                return Err(ShapeError::UnsortedKeyframes("global".to_string()));
            }
        }
    }

    Ok(())
}

fn sorted_by_time(keyframes: &[motif_data::model::Keyframe]) -> bool {
    keyframes.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not started, or stopped by the owner.
    Idle,
    Playing,
    /// A bounded animation ran out of loops; the last frame is frozen.
    Finished,
}

/// Per-instance playback driver.
///
/// The player owns the timer state (`start_time`, playing flag) and the
/// transient snapshot for one shape instance. It is driven by an external
/// monotonic clock through [`tick`](ShapePlayer::tick) — a display-frame
/// callback, a fixed timestep, or a test stepping time by hand all work.
/// The owner of a running animation must keep ticking it and call
/// [`stop`](ShapePlayer::stop) on teardown; cancellation is immediate.
#[derive(Debug, Clone)]
pub struct ShapePlayer {
    shape: Shape,
    start_time: Option<f64>,
    state: PlaybackState,
    snapshot: FrameSnapshot,
}

impl ShapePlayer {
    pub fn new(shape: Shape) -> Self {
        ShapePlayer {
            shape,
            start_time: None,
            state: PlaybackState::Idle,
            snapshot: FrameSnapshot::default(),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Starts (or restarts) the animation clock at `now` seconds.
    pub fn play(&mut self, now: f64) {
        self.start_time = Some(now);
        self.state = if self.shape.animations.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        };
    }

    /// Stops immediately; the next tick recomputes nothing. The current
    /// snapshot is kept so a stopped shape still renders its last pose.
    pub fn stop(&mut self) {
        self.start_time = None;
        self.state = PlaybackState::Idle;
    }

    /// Advances the clock to `now` and recomputes the animated snapshot.
    ///
    /// With `loops == 0` the animation runs forever on `elapsed mod
    /// duration`. With a bounded loop count, the tick that reaches
    /// `loops * duration` computes one final frame at the end-of-cycle
    /// pose and freezes; every later tick returns the frozen snapshot.
    pub fn tick(&mut self, now: f64) -> &FrameSnapshot {
        if self.state != PlaybackState::Playing {
            return &self.snapshot;
        }
        let Some(anim) = &self.shape.animations else {
            return &self.snapshot;
        };

        let start = self.start_time.unwrap_or(now);
        let elapsed = (now - start).max(0.0);
        let duration = anim.duration;

        let local_time = if anim.loops > 0 {
            let total = duration * anim.loops as f64;
            if elapsed >= total {
                self.state = PlaybackState::Finished;
                duration
            } else {
                elapsed % duration
            }
        } else {
            elapsed % duration
        };

        self.snapshot = Animator::compute_frame(&self.shape, local_time);
        &self.snapshot
    }

    /// Computes the snapshot at an explicit loop-local time, independent of
    /// the clock. Does not change the playback state.
    pub fn seek(&mut self, local_time: f64) -> &FrameSnapshot {
        self.snapshot = Animator::compute_frame(&self.shape, local_time);
        &self.snapshot
    }

    /// Ticks the clock and assembles renderable geometry in one call, so
    /// the snapshot a renderer reads is always fully computed.
    pub fn render_frame(
        &mut self,
        now: f64,
        curve_resolution: usize,
    ) -> Result<RenderGeometry, GeometryError> {
        self.tick(now);
        renderer::build_geometry(&self.shape, &self.snapshot, curve_resolution)
    }
}
