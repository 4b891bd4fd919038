//! Pointer input: raw events in, per-tick gesture facts out.
//!
//! The host surface delivers [`PointerEvent`]s (down/move/up with stage-space
//! coordinates and play-time timestamps). The [`PointerTracker`] folds them
//! into a [`PointerFrame`] each tick: edge lists, contact duration, drift from
//! the press origin, drag phase flags, and release summaries. The condition
//! evaluator consumes those facts; per-rule thresholds (hold duration, swipe
//! distance) are applied there, not here.
//!
//! One pointer is tracked. Multi-touch gestures are out of scope.

use serde::{Deserialize, Serialize};

use playforge_core::math::Vec2;
use playforge_core::project::SwipeDirection;

/// Contact must move this far (stage units) from its origin before it counts
/// as a drag rather than a wobbly tap.
pub const DRAG_START_TOLERANCE: f32 = 0.01;

// ---------------------------------------------------------------------------
// PointerEvent
// ---------------------------------------------------------------------------

/// A raw pointer event from the host surface.
///
/// `time` is in play-time seconds (the same clock as the engine's elapsed
/// time). Events are recordable: they serialize for session capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { position: Vec2, time: f64 },
    Move { position: Vec2, time: f64 },
    Up { position: Vec2, time: f64 },
}

impl PointerEvent {
    pub fn position(&self) -> Vec2 {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => *position,
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            PointerEvent::Down { time, .. }
            | PointerEvent::Move { time, .. }
            | PointerEvent::Up { time, .. } => *time,
        }
    }
}

// ---------------------------------------------------------------------------
// ReleaseSummary
// ---------------------------------------------------------------------------

/// Everything swipe/flick classification needs about one completed contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseSummary {
    /// Where the contact started.
    pub origin: Vec2,
    /// Where it ended.
    pub position: Vec2,
    /// End minus start.
    pub delta: Vec2,
    /// Contact duration in seconds.
    pub duration: f64,
}

impl ReleaseSummary {
    /// Straight-line distance covered.
    pub fn distance(&self) -> f32 {
        self.delta.length()
    }

    /// Mean velocity in stage units per second.
    pub fn mean_velocity(&self) -> f32 {
        self.distance() / (self.duration.max(1e-6) as f32)
    }

    /// The 8-way direction bucket of the stroke.
    pub fn direction(&self) -> SwipeDirection {
        SwipeDirection::from_vector(self.delta)
    }
}

// ---------------------------------------------------------------------------
// PointerFrame
// ---------------------------------------------------------------------------

/// Gesture facts for one tick.
#[derive(Debug, Clone, Default)]
pub struct PointerFrame {
    /// Press positions this tick.
    pub down_edges: Vec<Vec2>,
    /// Contacts released this tick.
    pub up_edges: Vec<ReleaseSummary>,
    /// Contact is live at the end of this tick.
    pub is_down: bool,
    /// Current pointer position while held (last known otherwise).
    pub position: Option<Vec2>,
    /// Origin of the live contact.
    pub press_origin: Option<Vec2>,
    /// Duration of the live contact in seconds.
    pub held_duration: f64,
    /// Farthest the live contact has drifted from its origin.
    pub max_drift: f32,
    /// The live contact crossed the drag threshold this tick.
    pub drag_started: bool,
    /// The live contact is past the drag threshold (includes the start tick).
    pub dragging: bool,
    /// A contact past the drag threshold was released this tick.
    pub drag_ended: bool,
}

// ---------------------------------------------------------------------------
// PointerTracker
// ---------------------------------------------------------------------------

/// Folds raw pointer events into per-tick [`PointerFrame`]s, carrying contact
/// state across ticks.
#[derive(Debug, Default)]
pub struct PointerTracker {
    is_down: bool,
    pressed_at: f64,
    origin: Vec2,
    position: Vec2,
    max_drift: f32,
    drag_active: bool,
    has_position: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process the tick's events and produce its gesture facts.
    ///
    /// `now` is elapsed play time at the end of the tick, used for the live
    /// contact's duration when no event carries a newer timestamp.
    pub fn process(&mut self, events: &[PointerEvent], now: f64) -> PointerFrame {
        let mut frame = PointerFrame::default();

        for event in events {
            match *event {
                PointerEvent::Down { position, time } => {
                    self.is_down = true;
                    self.pressed_at = time;
                    self.origin = position;
                    self.position = position;
                    self.max_drift = 0.0;
                    self.drag_active = false;
                    self.has_position = true;
                    frame.down_edges.push(position);
                }
                PointerEvent::Move { position, time: _ } => {
                    self.position = position;
                    self.has_position = true;
                    if self.is_down {
                        let drift = self.origin.distance_to(position);
                        self.max_drift = self.max_drift.max(drift);
                        if !self.drag_active && drift > DRAG_START_TOLERANCE {
                            self.drag_active = true;
                            frame.drag_started = true;
                        }
                    }
                }
                PointerEvent::Up { position, time } => {
                    // Release without a tracked press: nothing to summarize.
                    if !self.is_down {
                        continue;
                    }
                    self.position = position;
                    frame.up_edges.push(ReleaseSummary {
                        origin: self.origin,
                        position,
                        delta: position - self.origin,
                        duration: (time - self.pressed_at).max(0.0),
                    });
                    if self.drag_active {
                        frame.drag_ended = true;
                    }
                    self.is_down = false;
                    self.drag_active = false;
                    self.max_drift = 0.0;
                }
            }
        }

        frame.is_down = self.is_down;
        frame.dragging = self.is_down && self.drag_active;
        frame.position = self.has_position.then_some(self.position);
        frame.press_origin = self.is_down.then_some(self.origin);
        frame.held_duration = if self.is_down {
            (now - self.pressed_at).max(0.0)
        } else {
            0.0
        };
        frame.max_drift = if self.is_down { self.max_drift } else { 0.0 };
        frame
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
