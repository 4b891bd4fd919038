//! The action executor: applies matched actions and integrates one tick of
//! simulation.
//!
//! The scene stores only authoritative transform and visibility. Everything
//! a motion or overlay needs across ticks -- headings, wander timers, orbit
//! angles, effect clocks, fade ramps -- lives here, in executor-side tables
//! keyed by object id. When an object leaves the scene its entries are
//! dropped with it, so a consumed target can never act again.
//!
//! Failure semantics: an action whose target has already been removed is
//! silently skipped. Consumed targets are the normal case (a tapped object
//! destroys itself mid-action-list), not an error.
//!
//! Randomness (wander headings, random teleports) comes from a seeded
//! `Pcg32`, so a play-through is reproducible from its seed.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use playforge_core::prelude::*;

use crate::input::PointerFrame;

// ---------------------------------------------------------------------------
// Outcome and trigger context
// ---------------------------------------------------------------------------

/// What one action application contributed to the play-through.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionOutcome {
    /// Points added by `score` actions.
    pub score_delta: i64,
    /// A `fail` action ran: the play-through terminates with failure.
    pub failed: bool,
}

/// Per-match context carried from the firing rule into the executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerContext {
    /// Axis constraint of the drag condition that fired the rule, if any.
    /// `followDrag` honors it by freezing the other axis.
    pub drag_constraint: DragConstraint,
}

// ---------------------------------------------------------------------------
// Motion state
// ---------------------------------------------------------------------------

/// Per-object motion, advanced one tick at a time.
#[derive(Debug, Clone)]
enum MotionState {
    /// Constant velocity; `bounce` reflects at stage contact, otherwise the
    /// object leaves the scene and is removed.
    Linear { velocity: Vec2, bounce: bool },
    Wander {
        heading: Vec2,
        speed: f32,
        turn_interval: f64,
        until_turn: f64,
    },
    Approach { target: ObjectId, speed: f32 },
    Orbit {
        around: ObjectId,
        radius: f32,
        /// Radians.
        angle: f32,
        /// Radians per second (`speed / radius`).
        angular_speed: f32,
    },
    FollowDrag {
        damping: f32,
        constrain_to_bounds: bool,
        axis: DragConstraint,
    },
}

/// What happens to a motion (and its object) after one integration step.
enum MotionFate {
    Keep,
    /// The motion ends; the object stays.
    DropMotion,
    /// The object left the stage and is removed with all its state.
    RemoveObject,
}

fn still_on_stage(scene: &Scene, id: &ObjectId) -> bool {
    scene
        .object(id)
        .map(|o| scene.is_within_bounds(o))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Effect and fade state
// ---------------------------------------------------------------------------

/// One running overlay on one object.
///
/// Effects never alter transform; the presentation layer interpolates from
/// [`progress`](Self::progress). One clock per effect kind per object:
/// re-triggering restarts it.
#[derive(Debug, Clone)]
pub struct EffectState {
    pub spec: EffectAction,
    elapsed: f64,
}

impl EffectState {
    /// Completion ratio in `[0,1]`.
    pub fn progress(&self) -> f64 {
        (self.elapsed / self.spec.duration()).clamp(0.0, 1.0)
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// A running show/hide fade ramp. Purely presentational: logical visibility
/// flips at trigger time, the ramp only drives alpha.
#[derive(Debug, Clone)]
pub struct FadeState {
    pub mode: VisibilityMode,
    elapsed: f64,
    duration: f64,
}

impl FadeState {
    /// Current alpha: ramps up for show, down for hide.
    pub fn alpha(&self) -> f64 {
        let progress = (self.elapsed / self.duration).clamp(0.0, 1.0);
        match self.mode {
            VisibilityMode::Show => progress,
            VisibilityMode::Hide => 1.0 - progress,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionExecutor
// ---------------------------------------------------------------------------

/// Applies actions and advances motion, effects, and fades each tick.
///
/// One executor per play-through, like the scene it drives.
pub struct ActionExecutor {
    motions: HashMap<ObjectId, MotionState>,
    effects: HashMap<ObjectId, Vec<EffectState>>,
    fades: HashMap<ObjectId, FadeState>,
    /// Fire-and-forget playback requests, drained by the runner each frame.
    sounds: Vec<String>,
    rng: Pcg32,
}

impl ActionExecutor {
    pub fn new(seed: u64) -> Self {
        Self {
            motions: HashMap::new(),
            effects: HashMap::new(),
            fades: HashMap::new(),
            sounds: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Apply a rule's action list to one target.
    ///
    /// Actions run in declaration order. If an earlier action removes the
    /// target, the rest are skipped silently.
    pub fn apply(
        &mut self,
        scene: &mut Scene,
        actions: &[Action],
        target: &ObjectId,
        trigger: &TriggerContext,
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome::default();

        for action in actions {
            // Score/sound/fail still make sense without a live target;
            // everything touching the object needs it present.
            let needs_target = matches!(
                action,
                Action::Move(_) | Action::Effect(_) | Action::ShowHide { .. } | Action::Destroy
            );
            if needs_target && !scene.contains(target) {
                tracing::trace!(object = %target, "action target already consumed; skipping");
                continue;
            }

            match action {
                Action::Move(mv) => self.apply_move(scene, mv, target, trigger),
                Action::Effect(effect) => self.apply_effect(effect, target),
                Action::ShowHide {
                    mode,
                    fade,
                    duration,
                } => self.apply_show_hide(scene, target, *mode, *fade, *duration),
                Action::Destroy => {
                    scene.remove_object(target);
                    self.purge(target);
                }
                Action::Sound { clip_id } => self.sounds.push(clip_id.clone()),
                Action::Score { points } => outcome.score_delta += i64::from(*points),
                Action::Fail => outcome.failed = true,
            }
        }

        outcome
    }

    /// Advance motions, effect clocks, and fades by `dt` seconds.
    pub fn integrate(&mut self, scene: &mut Scene, dt: f64, pointer: &PointerFrame) {
        let mut gone: Vec<ObjectId> = Vec::new();

        let ids: Vec<ObjectId> = self.motions.keys().cloned().collect();
        for id in ids {
            if !scene.contains(&id) {
                self.motions.remove(&id);
                continue;
            }
            match self.integrate_motion(scene, dt, pointer, &id) {
                MotionFate::Keep => {}
                MotionFate::DropMotion => {
                    self.motions.remove(&id);
                }
                MotionFate::RemoveObject => gone.push(id),
            }
        }

        // Out-of-bounds projectile/wander movers leave the scene entirely.
        for id in gone {
            scene.remove_object(&id);
            self.purge(&id);
        }

        for states in self.effects.values_mut() {
            for state in states.iter_mut() {
                state.elapsed += dt;
            }
            states.retain(|s| s.elapsed < s.spec.duration());
        }
        self.effects.retain(|id, states| !states.is_empty() && scene.contains(id));

        for fade in self.fades.values_mut() {
            fade.elapsed += dt;
        }
        self.fades
            .retain(|id, fade| fade.elapsed < fade.duration && scene.contains(id));
    }

    // -- presentation accessors ---------------------------------------------

    /// Running effects on an object, if any.
    pub fn effects_on(&self, id: &ObjectId) -> &[EffectState] {
        self.effects.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Running fade ramp on an object, if any.
    pub fn fade_on(&self, id: &ObjectId) -> Option<&FadeState> {
        self.fades.get(id)
    }

    /// Drain the queued playback requests.
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }

    // -- internal helpers ---------------------------------------------------

    fn apply_move(
        &mut self,
        scene: &mut Scene,
        mv: &MoveAction,
        target: &ObjectId,
        trigger: &TriggerContext,
    ) {
        match mv {
            MoveAction::Straight { angle, speed } | MoveAction::Bounce { angle, speed } => {
                let velocity = Vec2::from_angle(*angle).scaled(*speed);
                let bounce = matches!(mv, MoveAction::Bounce { .. });
                self.motions
                    .insert(target.clone(), MotionState::Linear { velocity, bounce });
                if let Some(obj) = scene.object_mut(target) {
                    obj.velocity = Some(velocity);
                }
            }
            MoveAction::Teleport { to } => {
                let destination = match to {
                    TeleportDestination::Point(p) => *p,
                    TeleportDestination::Random => {
                        Vec2::new(self.rng.gen_range(0.0..1.0), self.rng.gen_range(0.0..1.0))
                    }
                };
                if let Some(obj) = scene.object_mut(target) {
                    obj.position = destination;
                }
            }
            MoveAction::Wander {
                speed,
                turn_interval,
            } => {
                let heading = Vec2::from_angle(self.rng.gen_range(0.0..360.0));
                self.motions.insert(
                    target.clone(),
                    MotionState::Wander {
                        heading,
                        speed: *speed,
                        turn_interval: *turn_interval,
                        until_turn: *turn_interval,
                    },
                );
                if let Some(obj) = scene.object_mut(target) {
                    obj.velocity = Some(heading.scaled(*speed));
                }
            }
            MoveAction::Stop => {
                self.motions.remove(target);
                if let Some(obj) = scene.object_mut(target) {
                    obj.velocity = None;
                }
            }
            MoveAction::Swap { with } => {
                scene.swap_positions(target, with);
            }
            MoveAction::Approach {
                target: toward,
                speed,
            } => {
                self.motions.insert(
                    target.clone(),
                    MotionState::Approach {
                        target: toward.clone(),
                        speed: *speed,
                    },
                );
            }
            MoveAction::Orbit {
                around,
                radius,
                speed,
            } => {
                let Some(pivot) = scene.object(around).map(|o| o.position) else {
                    tracing::trace!(object = %around, "orbit pivot missing; move skipped");
                    return;
                };
                let offset = scene
                    .object(target)
                    .map(|o| o.position - pivot)
                    .unwrap_or(Vec2::ZERO);
                let angle = if offset.length() > f32::EPSILON {
                    offset.y.atan2(offset.x)
                } else {
                    0.0
                };
                self.motions.insert(
                    target.clone(),
                    MotionState::Orbit {
                        around: around.clone(),
                        radius: *radius,
                        angle,
                        angular_speed: *speed / *radius,
                    },
                );
            }
            MoveAction::FollowDrag {
                damping,
                constrain_to_bounds,
            } => {
                self.motions.insert(
                    target.clone(),
                    MotionState::FollowDrag {
                        damping: *damping,
                        constrain_to_bounds: *constrain_to_bounds,
                        axis: trigger.drag_constraint,
                    },
                );
                if let Some(obj) = scene.object_mut(target) {
                    obj.velocity = None;
                }
            }
        }
    }

    fn apply_effect(&mut self, effect: &EffectAction, target: &ObjectId) {
        let states = self.effects.entry(target.clone()).or_default();
        let fresh = EffectState {
            spec: effect.clone(),
            elapsed: 0.0,
        };
        // One clock per effect kind per object: re-triggering restarts.
        if let Some(existing) = states
            .iter_mut()
            .find(|s| s.spec.kind_name() == effect.kind_name())
        {
            *existing = fresh;
        } else {
            states.push(fresh);
        }
    }

    fn apply_show_hide(
        &mut self,
        scene: &mut Scene,
        target: &ObjectId,
        mode: VisibilityMode,
        fade: bool,
        duration: f64,
    ) {
        if let Some(obj) = scene.object_mut(target) {
            obj.visible = matches!(mode, VisibilityMode::Show);
        }
        if fade && duration > 0.0 {
            self.fades.insert(
                target.clone(),
                FadeState {
                    mode,
                    elapsed: 0.0,
                    duration,
                },
            );
        } else {
            self.fades.remove(target);
        }
    }

    fn integrate_motion(
        &mut self,
        scene: &mut Scene,
        dt: f64,
        pointer: &PointerFrame,
        id: &ObjectId,
    ) -> MotionFate {
        let Some(state) = self.motions.get_mut(id) else {
            return MotionFate::Keep;
        };

        match state {
            MotionState::Linear { velocity, bounce } => {
                let Some(current) = scene.object(id) else {
                    return MotionFate::DropMotion;
                };
                let mut position = current.position + velocity.scaled(dt as f32);
                if *bounce {
                    let (hw, hh) = (current.size.x / 2.0, current.size.y / 2.0);
                    if position.x - hw < 0.0 {
                        position.x = hw;
                        velocity.x = velocity.x.abs();
                    } else if position.x + hw > 1.0 {
                        position.x = 1.0 - hw;
                        velocity.x = -velocity.x.abs();
                    }
                    if position.y - hh < 0.0 {
                        position.y = hh;
                        velocity.y = velocity.y.abs();
                    } else if position.y + hh > 1.0 {
                        position.y = 1.0 - hh;
                        velocity.y = -velocity.y.abs();
                    }
                }
                let velocity = *velocity;
                let projectile = !*bounce;
                if let Some(obj) = scene.object_mut(id) {
                    obj.position = position;
                    obj.velocity = Some(velocity);
                }
                if projectile && !still_on_stage(scene, id) {
                    return MotionFate::RemoveObject;
                }
                MotionFate::Keep
            }

            MotionState::Wander {
                heading,
                speed,
                turn_interval,
                until_turn,
            } => {
                *until_turn -= dt;
                if *until_turn <= 0.0 {
                    *heading = Vec2::from_angle(self.rng.gen_range(0.0..360.0));
                    *until_turn += *turn_interval;
                }
                let velocity = heading.scaled(*speed);
                if let Some(obj) = scene.object_mut(id) {
                    obj.position = obj.position + velocity.scaled(dt as f32);
                    obj.velocity = Some(velocity);
                }
                if !still_on_stage(scene, id) {
                    return MotionFate::RemoveObject;
                }
                MotionFate::Keep
            }

            MotionState::Approach { target, speed } => {
                let Some(goal) = scene.object(target).map(|o| o.position) else {
                    // Pursued object is gone: the chase ends where it stands.
                    if let Some(obj) = scene.object_mut(id) {
                        obj.velocity = None;
                    }
                    return MotionFate::DropMotion;
                };
                let speed = *speed;
                if let Some(obj) = scene.object_mut(id) {
                    let direction = (goal - obj.position).normalized_or_zero();
                    let velocity = direction.scaled(speed);
                    obj.position = obj.position + velocity.scaled(dt as f32);
                    obj.velocity = Some(velocity);
                }
                MotionFate::Keep
            }

            MotionState::Orbit {
                around,
                radius,
                angle,
                angular_speed,
            } => {
                let Some(pivot) = scene.object(around).map(|o| o.position) else {
                    return MotionFate::DropMotion;
                };
                *angle += *angular_speed * dt as f32;
                let position = pivot + Vec2::new(angle.cos(), angle.sin()).scaled(*radius);
                if let Some(obj) = scene.object_mut(id) {
                    obj.position = position;
                }
                MotionFate::Keep
            }

            MotionState::FollowDrag {
                damping,
                constrain_to_bounds,
                axis,
            } => {
                let (Some(pointer_pos), true) = (pointer.position, pointer.is_down) else {
                    return MotionFate::Keep;
                };
                let factor = 1.0 - *damping;
                let constrain = *constrain_to_bounds;
                let axis = *axis;
                if let Some(obj) = scene.object_mut(id) {
                    let goal = match axis {
                        DragConstraint::Free => pointer_pos,
                        DragConstraint::Horizontal => Vec2::new(pointer_pos.x, obj.position.y),
                        DragConstraint::Vertical => Vec2::new(obj.position.x, pointer_pos.y),
                    };
                    let step = (goal - obj.position).scaled(factor);
                    let mut position = obj.position + step;
                    if constrain {
                        position = position.clamped_to(Rect::STAGE);
                    }
                    obj.position = position;
                }
                MotionFate::Keep
            }
        }
    }

    fn purge(&mut self, id: &ObjectId) {
        self.motions.remove(id);
        self.effects.remove(id);
        self.fades.remove(id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
