//! The rule engine: one play-through's tick loop and termination logic.
//!
//! The engine is cooperatively scheduled: the host calls
//! [`RuleEngine::tick`] once per displayed frame with the frame's dt and
//! pointer events. Each tick while running:
//!
//! 1. Advance elapsed play time.
//! 2. Evaluate conditions ([`ConditionEvaluator`]), producing matches in
//!    declaration order.
//! 3. Execute each match's actions ([`ActionExecutor`]), accumulating score
//!    and failure signals, then integrate motion/effects/fades.
//! 4. Check termination: explicit failure action, target score reached, or
//!    time limit crossed.
//!
//! Engines are single-use by design: `idle -> running ->
//! terminated{success|failure|timeout}`, never reset in place. A new play
//! gets a new scene and a new engine, so no latent state survives a replay.

use playforge_core::prelude::*;

use crate::action::{ActionExecutor, EffectState, FadeState, TriggerContext};
use crate::condition::ConditionEvaluator;
use crate::input::{PointerEvent, PointerTracker};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Why a play-through ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// Target score reached.
    Success,
    /// Explicit failure action, or an external skip.
    Failure,
    /// Time limit crossed with score below target. Treated as failure.
    Timeout,
}

/// Lifecycle of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Terminated(Termination),
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for one play-through.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed for the play's RNG (wander headings, random teleports). Same
    /// project + same seed + same inputs = same play.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { seed: 0 }
    }
}

// ---------------------------------------------------------------------------
// RuleEngine
// ---------------------------------------------------------------------------

/// Drives one play-through of one project.
pub struct RuleEngine {
    scene: Scene,
    rules: Vec<Rule>,
    evaluator: ConditionEvaluator,
    executor: ActionExecutor,
    tracker: PointerTracker,
    state: EngineState,
    elapsed: f64,
    score: i64,
    tick_counter: u64,
}

impl RuleEngine {
    /// Validate the project and build an idle engine for it.
    ///
    /// The scene is a fresh deep copy; the source document is not retained.
    pub fn new(project: &GameProject, config: EngineConfig) -> Result<Self, ProjectError> {
        let scene = Scene::initialize(project)?;
        Ok(Self {
            scene,
            rules: project.rules.clone(),
            evaluator: ConditionEvaluator::new(),
            executor: ActionExecutor::new(config.seed),
            tracker: PointerTracker::new(),
            state: EngineState::Idle,
            elapsed: 0.0,
            score: 0,
            tick_counter: 0,
        })
    }

    /// Begin the play-through. Only meaningful from `Idle`.
    pub fn start(&mut self) {
        if self.state == EngineState::Idle {
            self.state = EngineState::Running;
        }
    }

    /// Execute one tick: `dt` seconds of simulation plus this frame's
    /// pointer events. Returns the engine state after the tick.
    ///
    /// Once terminated, further calls are no-ops: input is ignored and the
    /// terminal state is returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative or non-finite.
    pub fn tick(&mut self, dt: f64, events: &[PointerEvent]) -> EngineState {
        assert!(
            dt.is_finite() && dt >= 0.0,
            "dt must be non-negative and finite, got {dt}"
        );

        if self.state != EngineState::Running {
            return self.state;
        }

        self.elapsed += dt;
        self.tick_counter += 1;

        let frame = self.tracker.process(events, self.elapsed);
        let matches = self
            .evaluator
            .evaluate(&self.scene, &self.rules, &frame, self.elapsed);

        let mut failed = false;
        for m in &matches {
            let rule = &self.rules[m.rule];
            let trigger = TriggerContext {
                drag_constraint: drag_constraint_of(&rule.condition),
            };
            let outcome = self
                .executor
                .apply(&mut self.scene, &rule.actions, &m.target, &trigger);
            self.score += outcome.score_delta;
            failed |= outcome.failed;
        }

        if failed {
            tracing::debug!(score = self.score, "explicit failure action");
            self.state = EngineState::Terminated(Termination::Failure);
            return self.state;
        }

        self.executor.integrate(&mut self.scene, dt, &frame);

        if self.score >= i64::from(self.scene.settings().target_score) {
            tracing::debug!(score = self.score, elapsed = self.elapsed, "target score reached");
            self.state = EngineState::Terminated(Termination::Success);
        } else if let Some(limit) = self.scene.settings().duration.limit() {
            if self.elapsed >= limit {
                tracing::debug!(score = self.score, "time limit reached");
                self.state = EngineState::Terminated(Termination::Timeout);
            }
        }

        self.state
    }

    /// Force the play-through to end in failure (the skip path). The score
    /// accumulated so far stands. No-op unless running.
    pub fn force_failure(&mut self) {
        if self.state == EngineState::Running {
            self.state = EngineState::Terminated(Termination::Failure);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Elapsed play time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Seconds left before timeout, or `None` for unlimited play.
    pub fn remaining_time(&self) -> Option<f64> {
        self.scene
            .settings()
            .duration
            .limit()
            .map(|limit| (limit - self.elapsed).max(0.0))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Running effects on an object (for the presentation layer).
    pub fn effects_on(&self, id: &ObjectId) -> &[EffectState] {
        self.executor.effects_on(id)
    }

    /// Running fade ramp on an object (for the presentation layer).
    pub fn fade_on(&self, id: &ObjectId) -> Option<&FadeState> {
        self.executor.fade_on(id)
    }

    /// Drain queued fire-and-forget playback requests.
    pub fn take_sounds(&mut self) -> Vec<String> {
        self.executor.take_sounds()
    }
}

/// The axis constraint a drag condition imposes on `followDrag`.
fn drag_constraint_of(condition: &Condition) -> DragConstraint {
    match condition {
        Condition::Touch(TouchCondition {
            gesture: TouchGesture::Drag { constraint, .. },
            ..
        }) => *constraint,
        _ => DragConstraint::Free,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
