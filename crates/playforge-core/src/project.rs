//! The authored game document: objects, rules, and play settings.
//!
//! A [`GameProject`] is produced by the external authoring surface and stored
//! in the catalog as JSON. The engine treats it as immutable input: it is
//! validated once with [`GameProject::validate`] and then cloned into a
//! [`Scene`](crate::scene::Scene) per play-through.
//!
//! # Rule anatomy
//!
//! Every [`Rule`] is attached to one object (its `subject`), carries one
//! [`Condition`], a list of [`Action`]s, and a [`TargetSelector`] naming which
//! object(s) the actions apply to. Rules are pure predicates: they are
//! re-evaluated every tick in declaration order, and firing at most once per
//! tick per satisfying target. "Fire once ever" semantics belong to the
//! actions (destroy or hide the subject), never to the rule itself.
//!
//! # Wire format
//!
//! Conditions and actions are closed, internally tagged variants -- there is
//! no open metadata bag. A malformed or unknown variant fails at parse time,
//! and a structurally valid document that references a missing object fails
//! at [`validate`](GameProject::validate) time. The engine never sees either.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec2};
use crate::ProjectError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Author-assigned object identifier, unique within one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual role of an object (e.g. `"balloon"`, `"enemy"`). Kinds are an open
/// vocabulary: they categorize, they do not imply behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub String);

impl Kind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameProject
// ---------------------------------------------------------------------------

/// One authored mini-game: the root document of the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameProject {
    /// The objects on stage at the start of a play-through, in declaration
    /// (and therefore draw) order.
    pub objects: Vec<GameObject>,
    /// Condition->action bindings, evaluated every tick in declaration order.
    pub rules: Vec<Rule>,
    /// Play settings: duration and win condition.
    pub settings: GameSettings,
}

/// An object as authored: initial transform and visibility. The runtime
/// counterpart is [`SceneObject`](crate::scene::SceneObject).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub kind: Kind,
    /// Center of the object in stage space.
    pub position: Vec2,
    /// Extent (width, height) in stage space.
    pub size: Vec2,
    /// Initially visible. Hidden objects stay in the scene but are excluded
    /// from rendering and touch matching until shown.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Play settings for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// How long a play-through lasts.
    pub duration: GameDuration,
    /// Score at which the play-through terminates with success.
    pub target_score: u32,
}

/// Play duration: a number of seconds, or the keyword `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameDuration {
    Seconds(f64),
    Unlimited,
}

impl GameDuration {
    /// The time limit, or `None` for unlimited play.
    pub fn limit(self) -> Option<f64> {
        match self {
            GameDuration::Seconds(s) => Some(s),
            GameDuration::Unlimited => None,
        }
    }
}

impl Serialize for GameDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GameDuration::Seconds(s) => serializer.serialize_f64(*s),
            GameDuration::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for GameDuration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DurationVisitor;

        impl serde::de::Visitor<'_> for DurationVisitor {
            type Value = GameDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a number of seconds or the string \"unlimited\"")
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<GameDuration, E> {
                Ok(GameDuration::Seconds(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<GameDuration, E> {
                Ok(GameDuration::Seconds(v as f64))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<GameDuration, E> {
                Ok(GameDuration::Seconds(v as f64))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<GameDuration, E> {
                if v == "unlimited" {
                    Ok(GameDuration::Unlimited)
                } else {
                    Err(E::invalid_value(serde::de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// One condition->action binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// The object this rule is attached to. Resolves `self` in the condition
    /// and in the target selector.
    pub subject: ObjectId,
    pub condition: Condition,
    /// Applied in order to every resolved target when the condition holds.
    pub actions: Vec<Action>,
    /// Which object(s) the actions apply to. Defaults to the subject.
    #[serde(default)]
    pub target: TargetSelector,
}

/// Resolves the objects a rule's actions apply to.
///
/// Serialized as `"self"`, `{"named": "<id>"}`, or `{"ofKind": "<kind>"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetSelector {
    /// The rule's subject.
    #[default]
    #[serde(rename = "self")]
    Itself,
    /// One specific object by id.
    Named(ObjectId),
    /// Every object of a kind, in declaration order.
    OfKind(Kind),
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// The fixed condition vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// A pointer gesture against the subject, the stage, or a stage region.
    Touch(TouchCondition),
    /// Fires exactly once, on the tick where elapsed play time crosses the
    /// threshold. Edge-triggered by design: never re-fires.
    TimerElapsed {
        seconds: f64,
    },
    /// The subject's bounds overlap any visible object of the kind.
    /// Level-triggered: holds on every tick the overlap persists.
    Collision {
        #[serde(rename = "withKind")]
        with_kind: Kind,
    },
    /// Holds every tick.
    Always,
}

/// A touch condition: gesture plus where it must land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchCondition {
    #[serde(flatten)]
    pub gesture: TouchGesture,
    /// Where the gesture must land. Defaults to the subject's bounds.
    #[serde(default)]
    pub target: TouchTarget,
}

/// Pointer gesture variants, each with its own thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "camelCase")]
pub enum TouchGesture {
    /// The tick containing the press edge.
    Down,
    /// The tick containing the release edge.
    Up,
    /// Continuous contact for at least `duration` seconds, drifting at most
    /// `tolerance` stage units from the press origin. Re-arms on release.
    #[serde(rename_all = "camelCase")]
    Hold {
        duration: f64,
        #[serde(default = "default_hold_tolerance")]
        tolerance: f32,
    },
    /// One phase of a drag. `start` is the first tick contact moves beyond
    /// tolerance, `dragging` every tick it stays held after that, `end` the
    /// release tick of a drag.
    #[serde(rename_all = "camelCase")]
    Drag {
        phase: DragPhase,
        #[serde(default)]
        constraint: DragConstraint,
    },
    /// A directional stroke, classified at release.
    #[serde(rename_all = "camelCase")]
    Swipe {
        #[serde(default = "default_swipe_distance")]
        min_distance: f32,
        #[serde(default = "default_swipe_duration")]
        max_duration: f64,
        #[serde(default = "default_swipe_velocity")]
        min_velocity: f32,
        /// Required direction bucket; `None` accepts any direction.
        #[serde(default)]
        direction: Option<SwipeDirection>,
    },
    /// A short, fast stroke: like swipe but gated on velocity alone.
    #[serde(rename_all = "camelCase")]
    Flick {
        #[serde(default = "default_flick_velocity")]
        min_velocity: f32,
        #[serde(default)]
        direction: Option<SwipeDirection>,
    },
}

fn default_hold_tolerance() -> f32 {
    0.03
}

fn default_swipe_distance() -> f32 {
    0.08
}

fn default_swipe_duration() -> f64 {
    0.5
}

fn default_swipe_velocity() -> f32 {
    0.3
}

fn default_flick_velocity() -> f32 {
    0.8
}

/// Phases of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    Start,
    Dragging,
    End,
}

/// Restricts the axis along which drag movement is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragConstraint {
    #[default]
    Free,
    Horizontal,
    Vertical,
}

/// One of 8 compass buckets in screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwipeDirection {
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
    Up,
    UpRight,
}

impl SwipeDirection {
    /// Classify a displacement into one of 8 buckets by angle, 45 degrees per
    /// bucket, each centered on its compass direction. `(+1, 0)` is `Right`,
    /// `(+1, +1)` is `DownRight` (screen space, y-down).
    pub fn from_vector(delta: Vec2) -> Self {
        let deg = delta.y.atan2(delta.x).to_degrees();
        // Rotate so each 45-degree sector starts at a bucket boundary, then
        // index counterclockwise-negative angles into 0..8.
        let sector = ((deg + 22.5).rem_euclid(360.0) / 45.0) as usize % 8;
        [
            SwipeDirection::Right,
            SwipeDirection::DownRight,
            SwipeDirection::Down,
            SwipeDirection::DownLeft,
            SwipeDirection::Left,
            SwipeDirection::UpLeft,
            SwipeDirection::Up,
            SwipeDirection::UpRight,
        ][sector]
    }
}

/// Where a touch gesture must land.
///
/// Serialized as `"self"`, `"stage"`, or `{"stageArea": {"rect": ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchTarget {
    /// The subject's current bounds. Hidden subjects never match.
    #[default]
    #[serde(rename = "self")]
    Itself,
    /// Anywhere on the stage.
    Stage,
    /// A fixed stage region.
    StageArea {
        rect: Rect,
    },
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The fixed action vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Start, change, or stop a movement on the target.
    Move(MoveAction),
    /// Trigger a time-boxed visual overlay on the target.
    Effect(EffectAction),
    /// Toggle the target's visibility.
    #[serde(rename_all = "camelCase")]
    ShowHide {
        mode: VisibilityMode,
        #[serde(default)]
        fade: bool,
        #[serde(default)]
        duration: f64,
    },
    /// Fire-and-forget playback request.
    #[serde(rename_all = "camelCase")]
    Sound {
        clip_id: String,
    },
    /// Add to the play-through score.
    Score {
        points: i32,
    },
    /// Remove the target from the scene. The "mark consumed" path: a
    /// destroyed object never matches a condition again.
    Destroy,
    /// Terminate the play-through immediately with failure.
    Fail,
}

/// Movement variants. Each starts (or replaces) the target's active motion;
/// integration happens one tick at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MoveAction {
    /// Constant velocity along a fixed heading (degrees, 0 = right,
    /// 90 = down). Leaves the scene when it exits the stage.
    Straight {
        angle: f32,
        speed: f32,
    },
    /// Like `straight`, but reflects the velocity component on stage contact.
    Bounce {
        angle: f32,
        speed: f32,
    },
    /// Instant relocation.
    Teleport {
        to: TeleportDestination,
    },
    /// Random heading, re-rolled every `turnInterval` seconds. Leaves the
    /// scene when it exits the stage.
    #[serde(rename_all = "camelCase")]
    Wander {
        speed: f32,
        turn_interval: f64,
    },
    /// Zero the velocity and drop any active motion.
    Stop,
    /// Exchange positions with another object, instantly.
    Swap {
        with: ObjectId,
    },
    /// Velocity recomputed every tick toward another object's current
    /// position.
    Approach {
        target: ObjectId,
        speed: f32,
    },
    /// Circle a pivot object: position computed from angle and radius, angle
    /// advanced by `speed / radius` per second.
    Orbit {
        around: ObjectId,
        radius: f32,
        speed: f32,
    },
    /// Track the pointer with exponential smoothing: each tick the target
    /// moves toward the pointer by `1 - damping`. Damping 0 snaps in one
    /// tick; damping 1 never moves.
    #[serde(rename_all = "camelCase")]
    FollowDrag {
        damping: f32,
        #[serde(default)]
        constrain_to_bounds: bool,
    },
}

/// Where a teleport lands: a fixed point or a uniformly random stage
/// position. Serialized as `{"point": {...}}` or `"random"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeleportDestination {
    Point(Vec2),
    Random,
}

/// Time-boxed visual overlays. Effects never alter position or velocity;
/// the presentation layer interpolates from the effect's progress ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EffectAction {
    Glow {
        color: Color,
        intensity: f32,
        duration: f64,
    },
    Shake {
        intensity: f32,
        duration: f64,
    },
    Confetti {
        count: u32,
        spread: f32,
        duration: f64,
    },
    Monochrome {
        duration: f64,
    },
    Flash {
        color: Color,
        duration: f64,
    },
    Rotate {
        speed: f32,
        #[serde(default = "default_clockwise")]
        clockwise: bool,
        duration: f64,
    },
    Particles {
        particle: String,
        count: u32,
        spread: f32,
        speed: f32,
        duration: f64,
    },
}

fn default_clockwise() -> bool {
    true
}

impl EffectAction {
    /// How long the overlay runs, in seconds.
    pub fn duration(&self) -> f64 {
        match self {
            EffectAction::Glow { duration, .. }
            | EffectAction::Shake { duration, .. }
            | EffectAction::Confetti { duration, .. }
            | EffectAction::Monochrome { duration }
            | EffectAction::Flash { duration, .. }
            | EffectAction::Rotate { duration, .. }
            | EffectAction::Particles { duration, .. } => *duration,
        }
    }

    /// Stable name of the variant, used to key one clock per effect type per
    /// object (re-triggering restarts, never stacks).
    pub fn kind_name(&self) -> &'static str {
        match self {
            EffectAction::Glow { .. } => "glow",
            EffectAction::Shake { .. } => "shake",
            EffectAction::Confetti { .. } => "confetti",
            EffectAction::Monochrome { .. } => "monochrome",
            EffectAction::Flash { .. } => "flash",
            EffectAction::Rotate { .. } => "rotate",
            EffectAction::Particles { .. } => "particles",
        }
    }
}

/// RGB color, each channel in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Show or hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    Show,
    Hide,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl GameProject {
    /// Structural validation: unique object ids, no dangling references,
    /// finite and in-range parameters.
    ///
    /// A project that passes never makes the engine crash on a missing
    /// object or a NaN; anything this returns is a load-time error the
    /// orchestrator recovers from by skipping the entry.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.objects.is_empty() {
            return Err(ProjectError::EmptyProject);
        }

        let mut ids = std::collections::HashSet::new();
        for obj in &self.objects {
            if !ids.insert(&obj.id) {
                return Err(ProjectError::DuplicateObjectId {
                    id: obj.id.clone(),
                });
            }
            let ctx = || format!("object '{}'", obj.id);
            check_finite(&ctx(), "position.x", obj.position.x as f64)?;
            check_finite(&ctx(), "position.y", obj.position.y as f64)?;
            check_positive(&ctx(), "size.x", obj.size.x as f64)?;
            check_positive(&ctx(), "size.y", obj.size.y as f64)?;
        }

        check_positive("settings", "targetScore", self.settings.target_score as f64)?;
        if let GameDuration::Seconds(s) = self.settings.duration {
            check_positive("settings", "duration", s)?;
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if !ids.contains(&rule.subject) {
                return Err(ProjectError::UnknownSubject {
                    rule: index,
                    id: rule.subject.clone(),
                });
            }
            if let TargetSelector::Named(id) = &rule.target {
                if !ids.contains(id) {
                    return Err(ProjectError::UnknownTarget {
                        rule: index,
                        id: id.clone(),
                    });
                }
            }
            validate_condition(index, &rule.condition)?;
            for action in &rule.actions {
                validate_action(index, action, &ids)?;
            }
        }

        Ok(())
    }
}

fn validate_condition(rule: usize, condition: &Condition) -> Result<(), ProjectError> {
    let ctx = format!("rule {rule} condition");
    match condition {
        Condition::Touch(touch) => match &touch.gesture {
            TouchGesture::Hold {
                duration,
                tolerance,
            } => {
                check_positive(&ctx, "duration", *duration)?;
                check_non_negative(&ctx, "tolerance", *tolerance as f64)
            }
            TouchGesture::Swipe {
                min_distance,
                max_duration,
                min_velocity,
                ..
            } => {
                check_positive(&ctx, "minDistance", *min_distance as f64)?;
                check_positive(&ctx, "maxDuration", *max_duration)?;
                check_non_negative(&ctx, "minVelocity", *min_velocity as f64)
            }
            TouchGesture::Flick { min_velocity, .. } => {
                check_positive(&ctx, "minVelocity", *min_velocity as f64)
            }
            TouchGesture::Down | TouchGesture::Up | TouchGesture::Drag { .. } => Ok(()),
        },
        Condition::TimerElapsed { seconds } => check_positive(&ctx, "seconds", *seconds),
        Condition::Collision { .. } | Condition::Always => Ok(()),
    }
}

fn validate_action(
    rule: usize,
    action: &Action,
    ids: &std::collections::HashSet<&ObjectId>,
) -> Result<(), ProjectError> {
    let ctx = format!("rule {rule} action");
    let check_ref = |id: &ObjectId| {
        if ids.contains(id) {
            Ok(())
        } else {
            Err(ProjectError::UnknownTarget {
                rule,
                id: id.clone(),
            })
        }
    };

    match action {
        Action::Move(mv) => match mv {
            MoveAction::Straight { angle, speed } | MoveAction::Bounce { angle, speed } => {
                check_finite(&ctx, "angle", *angle as f64)?;
                check_non_negative(&ctx, "speed", *speed as f64)
            }
            MoveAction::Teleport { to } => match to {
                TeleportDestination::Point(p) => {
                    check_finite(&ctx, "to.x", p.x as f64)?;
                    check_finite(&ctx, "to.y", p.y as f64)
                }
                TeleportDestination::Random => Ok(()),
            },
            MoveAction::Wander {
                speed,
                turn_interval,
            } => {
                check_non_negative(&ctx, "speed", *speed as f64)?;
                check_positive(&ctx, "turnInterval", *turn_interval)
            }
            MoveAction::Stop => Ok(()),
            MoveAction::Swap { with } => check_ref(with),
            MoveAction::Approach { target, speed } => {
                check_non_negative(&ctx, "speed", *speed as f64)?;
                check_ref(target)
            }
            MoveAction::Orbit {
                around,
                radius,
                speed,
            } => {
                check_positive(&ctx, "radius", *radius as f64)?;
                check_non_negative(&ctx, "speed", *speed as f64)?;
                check_ref(around)
            }
            MoveAction::FollowDrag { damping, .. } => {
                let d = *damping as f64;
                if !(0.0..=1.0).contains(&d) {
                    return Err(ProjectError::InvalidParameter {
                        context: ctx,
                        name: "damping",
                        value: d,
                    });
                }
                Ok(())
            }
        },
        Action::Effect(effect) => {
            check_positive(&ctx, "duration", effect.duration())?;
            match effect {
                EffectAction::Glow { intensity, .. } | EffectAction::Shake { intensity, .. } => {
                    check_non_negative(&ctx, "intensity", *intensity as f64)
                }
                EffectAction::Rotate { speed, .. } => {
                    check_non_negative(&ctx, "speed", *speed as f64)
                }
                EffectAction::Particles { speed, spread, .. } => {
                    check_non_negative(&ctx, "speed", *speed as f64)?;
                    check_non_negative(&ctx, "spread", *spread as f64)
                }
                EffectAction::Confetti { spread, .. } => {
                    check_non_negative(&ctx, "spread", *spread as f64)
                }
                EffectAction::Monochrome { .. } | EffectAction::Flash { .. } => Ok(()),
            }
        }
        Action::ShowHide { duration, .. } => check_non_negative(&ctx, "duration", *duration),
        Action::Sound { .. } | Action::Score { .. } | Action::Destroy | Action::Fail => Ok(()),
    }
}

fn check_finite(context: &str, name: &'static str, value: f64) -> Result<(), ProjectError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProjectError::InvalidParameter {
            context: context.to_owned(),
            name,
            value,
        })
    }
}

fn check_non_negative(context: &str, name: &'static str, value: f64) -> Result<(), ProjectError> {
    check_finite(context, name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ProjectError::InvalidParameter {
            context: context.to_owned(),
            name,
            value,
        })
    }
}

fn check_positive(context: &str, name: &'static str, value: f64) -> Result<(), ProjectError> {
    check_finite(context, name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ProjectError::InvalidParameter {
            context: context.to_owned(),
            name,
            value,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str, kind: &str) -> GameObject {
        GameObject {
            id: ObjectId::new(id),
            kind: Kind::new(kind),
            position: Vec2::new(0.5, 0.5),
            size: Vec2::new(0.1, 0.1),
            visible: true,
        }
    }

    fn minimal_project() -> GameProject {
        GameProject {
            objects: vec![object("ball", "toy")],
            rules: vec![],
            settings: GameSettings {
                duration: GameDuration::Seconds(10.0),
                target_score: 1,
            },
        }
    }

    // -- 1. Wire format round trips the whole vocabulary ---------------------

    #[test]
    fn full_document_parses() {
        let json = r#"{
            "objects": [
                {"id": "bird", "kind": "animal",
                 "position": {"x": 0.2, "y": 0.3}, "size": {"x": 0.1, "y": 0.1}},
                {"id": "cage", "kind": "prop",
                 "position": {"x": 0.8, "y": 0.3}, "size": {"x": 0.2, "y": 0.2},
                 "visible": false}
            ],
            "rules": [
                {"subject": "bird",
                 "condition": {"type": "touch", "gesture": "down"},
                 "actions": [{"type": "score", "points": 1},
                             {"type": "sound", "clipId": "chirp"},
                             {"type": "destroy"}]},
                {"subject": "bird",
                 "condition": {"type": "touch", "gesture": "swipe",
                               "minDistance": 0.1, "maxDuration": 0.3,
                               "minVelocity": 0.5, "direction": "down-right",
                               "target": "stage"},
                 "actions": [{"type": "move", "kind": "bounce",
                              "angle": 45.0, "speed": 0.4}]},
                {"subject": "cage",
                 "condition": {"type": "timerElapsed", "seconds": 3.0},
                 "actions": [{"type": "showHide", "mode": "show",
                              "fade": true, "duration": 0.25}]},
                {"subject": "bird",
                 "condition": {"type": "collision", "withKind": "prop"},
                 "actions": [{"type": "effect", "kind": "shake",
                              "intensity": 0.5, "duration": 0.4},
                             {"type": "fail"}],
                 "target": {"ofKind": "animal"}}
            ],
            "settings": {"duration": "unlimited", "targetScore": 3}
        }"#;

        let project: GameProject = serde_json::from_str(json).unwrap();
        assert_eq!(project.objects.len(), 2);
        assert_eq!(project.rules.len(), 4);
        assert_eq!(project.settings.duration, GameDuration::Unlimited);
        assert!(!project.objects[1].visible);

        match &project.rules[1].condition {
            Condition::Touch(touch) => {
                assert_eq!(touch.target, TouchTarget::Stage);
                match &touch.gesture {
                    TouchGesture::Swipe { direction, .. } => {
                        assert_eq!(*direction, Some(SwipeDirection::DownRight));
                    }
                    other => panic!("expected swipe, got {other:?}"),
                }
            }
            other => panic!("expected touch, got {other:?}"),
        }

        assert_eq!(
            project.rules[3].target,
            TargetSelector::OfKind(Kind::new("animal"))
        );

        project.validate().unwrap();
    }

    // -- 2. Defaults ---------------------------------------------------------

    #[test]
    fn selector_and_touch_target_default_to_self() {
        let json = r#"{"subject": "a",
                       "condition": {"type": "touch", "gesture": "up"},
                       "actions": []}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.target, TargetSelector::Itself);
        match rule.condition {
            Condition::Touch(t) => assert_eq!(t.target, TouchTarget::Itself),
            other => panic!("expected touch, got {other:?}"),
        }
    }

    // -- 3. GameDuration codec ----------------------------------------------

    #[test]
    fn duration_accepts_number_or_keyword() {
        let s: GameSettings =
            serde_json::from_str(r#"{"duration": 15, "targetScore": 2}"#).unwrap();
        assert_eq!(s.duration, GameDuration::Seconds(15.0));
        assert_eq!(s.duration.limit(), Some(15.0));

        let u: GameSettings =
            serde_json::from_str(r#"{"duration": "unlimited", "targetScore": 2}"#).unwrap();
        assert_eq!(u.duration, GameDuration::Unlimited);
        assert_eq!(u.duration.limit(), None);

        assert!(
            serde_json::from_str::<GameSettings>(r#"{"duration": "forever", "targetScore": 2}"#)
                .is_err()
        );

        // Serializes back to the same shapes.
        assert_eq!(
            serde_json::to_value(GameDuration::Unlimited).unwrap(),
            serde_json::json!("unlimited")
        );
        assert_eq!(
            serde_json::to_value(GameDuration::Seconds(8.0)).unwrap(),
            serde_json::json!(8.0)
        );
    }

    // -- 4. Swipe direction bucketing ----------------------------------------

    #[test]
    fn swipe_direction_cardinals_and_diagonals() {
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(100.0, 0.0)),
            SwipeDirection::Right
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(70.0, 70.0)),
            SwipeDirection::DownRight
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(0.0, 50.0)),
            SwipeDirection::Down
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(-1.0, 0.0)),
            SwipeDirection::Left
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(0.0, -1.0)),
            SwipeDirection::Up
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::new(0.5, -0.5)),
            SwipeDirection::UpRight
        );
    }

    #[test]
    fn swipe_direction_sector_boundaries() {
        // Just inside the Right sector on both sides.
        assert_eq!(
            SwipeDirection::from_vector(Vec2::from_angle(22.0)),
            SwipeDirection::Right
        );
        assert_eq!(
            SwipeDirection::from_vector(Vec2::from_angle(-22.0)),
            SwipeDirection::Right
        );
        // Just past the boundary.
        assert_eq!(
            SwipeDirection::from_vector(Vec2::from_angle(23.0)),
            SwipeDirection::DownRight
        );
    }

    // -- 5. Validation: dangling references ----------------------------------

    #[test]
    fn unknown_subject_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ghost"),
            condition: Condition::Always,
            actions: vec![],
            target: TargetSelector::Itself,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::UnknownSubject { rule: 0, .. })
        ));
    }

    #[test]
    fn unknown_action_reference_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ball"),
            condition: Condition::Always,
            actions: vec![Action::Move(MoveAction::Approach {
                target: ObjectId::new("ghost"),
                speed: 0.1,
            })],
            target: TargetSelector::Itself,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::UnknownTarget { rule: 0, .. })
        ));
    }

    #[test]
    fn unknown_named_selector_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ball"),
            condition: Condition::Always,
            actions: vec![],
            target: TargetSelector::Named(ObjectId::new("ghost")),
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::UnknownTarget { rule: 0, .. })
        ));
    }

    // -- 6. Validation: parameters -------------------------------------------

    #[test]
    fn duplicate_object_ids_rejected() {
        let mut project = minimal_project();
        project.objects.push(object("ball", "other"));
        assert!(matches!(
            project.validate(),
            Err(ProjectError::DuplicateObjectId { .. })
        ));
    }

    #[test]
    fn empty_project_rejected() {
        let project = GameProject {
            objects: vec![],
            rules: vec![],
            settings: GameSettings {
                duration: GameDuration::Seconds(10.0),
                target_score: 1,
            },
        };
        assert!(matches!(project.validate(), Err(ProjectError::EmptyProject)));
    }

    #[test]
    fn non_finite_parameter_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ball"),
            condition: Condition::Always,
            actions: vec![Action::Move(MoveAction::Straight {
                angle: f32::NAN,
                speed: 0.2,
            })],
            target: TargetSelector::Itself,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::InvalidParameter { name: "angle", .. })
        ));
    }

    #[test]
    fn damping_out_of_range_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ball"),
            condition: Condition::Always,
            actions: vec![Action::Move(MoveAction::FollowDrag {
                damping: 1.5,
                constrain_to_bounds: false,
            })],
            target: TargetSelector::Itself,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::InvalidParameter { name: "damping", .. })
        ));
    }

    #[test]
    fn zero_duration_effect_rejected() {
        let mut project = minimal_project();
        project.rules.push(Rule {
            subject: ObjectId::new("ball"),
            condition: Condition::Always,
            actions: vec![Action::Effect(EffectAction::Monochrome { duration: 0.0 })],
            target: TargetSelector::Itself,
        });
        assert!(matches!(
            project.validate(),
            Err(ProjectError::InvalidParameter { name: "duration", .. })
        ));
    }
}
