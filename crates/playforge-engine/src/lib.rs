//! Playforge Engine -- the rule engine that turns an authored game document
//! into live, time-bounded, interactive behavior.
//!
//! Each tick (one per displayed frame, driven by the host's animation
//! callback) the engine runs three phases over the authoritative
//! [`Scene`](playforge_core::scene::Scene):
//!
//! 1. [`ConditionEvaluator`](condition::ConditionEvaluator) -- which rules'
//!    conditions hold this tick, producing `(rule, target)` matches in
//!    declaration order.
//! 2. [`ActionExecutor`](action::ActionExecutor) -- applies matched actions
//!    and integrates one tick of motion, effect clocks, and fades.
//! 3. Termination check -- target score reached, time limit crossed, or an
//!    explicit failure action.
//!
//! A [`RuleEngine`](tick::RuleEngine) is single-use: one engine, one scene,
//! one play-through. The [`GameRunner`](runner::GameRunner) owns that
//! lifecycle and reports a [`PlayResult`](runner::PlayResult) exactly once
//! per play.
//!
//! # Quick Start
//!
//! ```
//! use playforge_engine::prelude::*;
//!
//! # fn project() -> GameProject {
//! #     serde_json::from_str(r#"{
//! #         "objects": [{"id": "b", "kind": "t",
//! #                      "position": {"x": 0.5, "y": 0.5},
//! #                      "size": {"x": 0.2, "y": 0.2}}],
//! #         "rules": [{"subject": "b",
//! #                    "condition": {"type": "touch", "gesture": "down"},
//! #                    "actions": [{"type": "score", "points": 1},
//! #                                {"type": "destroy"}]}],
//! #         "settings": {"duration": 10.0, "targetScore": 1}
//! #     }"#).unwrap()
//! # }
//! let mut runner = GameRunner::new(Box::new(NullSurface), Box::new(NullSoundSink), 7);
//! runner.launch(&project()).unwrap();
//!
//! let tap = [
//!     PointerEvent::Down { position: Vec2::new(0.5, 0.5), time: 0.0 },
//!     PointerEvent::Up { position: Vec2::new(0.5, 0.5), time: 0.05 },
//! ];
//! let result = runner.frame(1.0 / 60.0, &tap).expect("one tap wins this game");
//! assert!(result.success);
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod condition;
pub mod input;
pub mod runner;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use playforge_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the core prelude.
    pub use playforge_core::prelude::*;

    // Engine-specific exports.
    pub use crate::action::{ActionExecutor, ActionOutcome, EffectState, FadeState, TriggerContext};
    pub use crate::condition::{ConditionEvaluator, RuleMatch};
    pub use crate::input::{PointerEvent, PointerFrame, PointerTracker, ReleaseSummary};
    pub use crate::runner::{
        GameRunner, LaunchError, NullSoundSink, NullSurface, PlayResult, PlayView, RenderSurface,
        SoundSink,
    };
    pub use crate::tick::{EngineConfig, EngineState, RuleEngine, Termination};
}
