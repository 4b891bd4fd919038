//! The per-tick predicate pass: which rules hold, against which targets.
//!
//! Rules are pure predicates. Every tick the evaluator re-checks each rule
//! against the scene, the tick's [`PointerFrame`], and elapsed play time,
//! emitting `(rule, target)` matches in declaration order -- the only firing
//! order. The evaluator owns the little state that edge semantics need: the
//! fired set for `timerElapsed`, hold latches that re-arm on release, and a
//! warned set so a missing subject is logged once per play, then skipped
//! quietly.

use std::collections::HashSet;

use playforge_core::prelude::*;

use crate::input::PointerFrame;

// ---------------------------------------------------------------------------
// RuleMatch
// ---------------------------------------------------------------------------

/// One rule firing against one resolved target this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Index of the rule in declaration order.
    pub rule: usize,
    /// The object the rule's actions apply to.
    pub target: ObjectId,
}

// ---------------------------------------------------------------------------
// ConditionEvaluator
// ---------------------------------------------------------------------------

/// Evaluates every rule's condition each tick.
///
/// One evaluator per play-through; it carries edge-trigger state across
/// ticks and is never reused between plays.
#[derive(Debug, Default)]
pub struct ConditionEvaluator {
    /// Rules whose `timerElapsed` already fired.
    fired_timers: HashSet<usize>,
    /// Rules whose `hold` fired during the current contact. Cleared on
    /// release so holds re-arm.
    hold_latches: HashSet<usize>,
    /// Rules already warned about a missing subject or named target.
    warned_missing: HashSet<usize>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce this tick's matches in declaration order.
    pub fn evaluate(
        &mut self,
        scene: &Scene,
        rules: &[Rule],
        frame: &PointerFrame,
        elapsed: f64,
    ) -> Vec<RuleMatch> {
        // Contact ended: every hold re-arms.
        if !frame.is_down {
            self.hold_latches.clear();
        }

        let mut matches = Vec::new();

        for (index, rule) in rules.iter().enumerate() {
            let Some(subject) = scene.object(&rule.subject) else {
                self.warn_missing(index, &rule.subject);
                continue;
            };

            if !self.condition_holds(index, subject, &rule.condition, scene, frame, elapsed) {
                continue;
            }

            for target in self.resolve_targets(index, rule, scene) {
                matches.push(RuleMatch {
                    rule: index,
                    target,
                });
            }
        }

        matches
    }

    // -- internal helpers ---------------------------------------------------

    fn condition_holds(
        &mut self,
        index: usize,
        subject: &SceneObject,
        condition: &Condition,
        scene: &Scene,
        frame: &PointerFrame,
        elapsed: f64,
    ) -> bool {
        match condition {
            Condition::Touch(touch) => {
                // Touch never lands on a hidden subject.
                if !subject.visible {
                    return false;
                }
                self.touch_holds(index, subject, touch, frame)
            }

            // Edge-triggered: exactly the tick where elapsed crosses the
            // threshold, never again.
            Condition::TimerElapsed { seconds } => {
                if self.fired_timers.contains(&index) || elapsed < *seconds {
                    false
                } else {
                    self.fired_timers.insert(index);
                    true
                }
            }

            // Level-triggered overlap between two visible objects.
            Condition::Collision { with_kind } => {
                if !subject.visible {
                    return false;
                }
                let bounds = subject.bounds();
                scene
                    .objects_by_kind(with_kind)
                    .any(|o| o.visible && o.id != subject.id && o.bounds().intersects(&bounds))
            }

            // Holds every tick the subject is visible.
            Condition::Always => subject.visible,
        }
    }

    fn touch_holds(
        &mut self,
        index: usize,
        subject: &SceneObject,
        touch: &TouchCondition,
        frame: &PointerFrame,
    ) -> bool {
        let in_area = |point: Vec2| match &touch.target {
            TouchTarget::Itself => subject.contains_point(point),
            TouchTarget::Stage => true,
            TouchTarget::StageArea { rect } => rect.contains(point),
        };

        match &touch.gesture {
            TouchGesture::Down => frame.down_edges.iter().any(|p| in_area(*p)),

            TouchGesture::Up => frame.up_edges.iter().any(|r| in_area(r.position)),

            TouchGesture::Hold {
                duration,
                tolerance,
            } => {
                if self.hold_latches.contains(&index) {
                    return false;
                }
                let armed = frame.is_down
                    && frame.held_duration >= *duration
                    && frame.max_drift <= *tolerance
                    && frame.press_origin.is_some_and(|p| in_area(p));
                if armed {
                    self.hold_latches.insert(index);
                }
                armed
            }

            TouchGesture::Drag { phase, .. } => {
                let origin_ok = frame.press_origin.is_some_and(|p| in_area(p))
                    || frame.up_edges.iter().any(|r| in_area(r.origin));
                origin_ok
                    && match phase {
                        DragPhase::Start => frame.drag_started,
                        DragPhase::Dragging => frame.dragging,
                        DragPhase::End => frame.drag_ended,
                    }
            }

            TouchGesture::Swipe {
                min_distance,
                max_duration,
                min_velocity,
                direction,
            } => frame.up_edges.iter().any(|release| {
                in_area(release.origin)
                    && release.distance() >= *min_distance
                    && release.duration <= *max_duration
                    && release.mean_velocity() >= *min_velocity
                    && direction.is_none_or(|d| release.direction() == d)
            }),

            TouchGesture::Flick {
                min_velocity,
                direction,
            } => frame.up_edges.iter().any(|release| {
                in_area(release.origin)
                    && release.mean_velocity() >= *min_velocity
                    && direction.is_none_or(|d| release.direction() == d)
            }),
        }
    }

    fn resolve_targets(&mut self, index: usize, rule: &Rule, scene: &Scene) -> Vec<ObjectId> {
        match &rule.target {
            TargetSelector::Itself => vec![rule.subject.clone()],
            TargetSelector::Named(id) => {
                if scene.contains(id) {
                    vec![id.clone()]
                } else {
                    self.warn_missing(index, id);
                    Vec::new()
                }
            }
            // Hidden objects are included: "show everything of kind X" must
            // reach them.
            TargetSelector::OfKind(kind) => {
                scene.objects_by_kind(kind).map(|o| o.id.clone()).collect()
            }
        }
    }

    fn warn_missing(&mut self, index: usize, id: &ObjectId) {
        if self.warned_missing.insert(index) {
            tracing::warn!(
                rule = index,
                object = %id,
                "rule references a missing object; rule skipped for the rest of this play"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PointerEvent, PointerTracker};

    fn scene_with_rules(rules: Vec<Rule>) -> (Scene, Vec<Rule>) {
        let project = GameProject {
            objects: vec![
                GameObject {
                    id: ObjectId::new("a"),
                    kind: Kind::new("target"),
                    position: Vec2::new(0.3, 0.3),
                    size: Vec2::new(0.2, 0.2),
                    visible: true,
                },
                GameObject {
                    id: ObjectId::new("b"),
                    kind: Kind::new("target"),
                    position: Vec2::new(0.7, 0.7),
                    size: Vec2::new(0.2, 0.2),
                    visible: true,
                },
            ],
            rules,
            settings: GameSettings {
                duration: GameDuration::Seconds(30.0),
                target_score: 1,
            },
        };
        let scene = Scene::initialize(&project).unwrap();
        let rules = project.rules;
        (scene, rules)
    }

    fn rule(subject: &str, condition: Condition) -> Rule {
        Rule {
            subject: ObjectId::new(subject),
            condition,
            actions: vec![],
            target: TargetSelector::Itself,
        }
    }

    fn touch_down(subject: &str) -> Rule {
        rule(
            subject,
            Condition::Touch(TouchCondition {
                gesture: TouchGesture::Down,
                target: TouchTarget::Itself,
            }),
        )
    }

    fn tap(tracker: &mut PointerTracker, x: f32, y: f32, t: f64) -> PointerFrame {
        tracker.process(
            &[PointerEvent::Down {
                position: Vec2::new(x, y),
                time: t,
            }],
            t,
        )
    }

    // -- 1. Touch down matches the pressed object only -----------------------

    #[test]
    fn down_matches_pressed_object() {
        let (scene, rules) = scene_with_rules(vec![touch_down("a"), touch_down("b")]);
        let mut evaluator = ConditionEvaluator::new();
        let mut tracker = PointerTracker::new();

        let frame = tap(&mut tracker, 0.3, 0.3, 0.0);
        let matches = evaluator.evaluate(&scene, &rules, &frame, 0.016);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule, 0);
        assert_eq!(matches[0].target, ObjectId::new("a"));
    }

    #[test]
    fn hidden_subject_never_touch_matches() {
        let (mut scene, rules) = scene_with_rules(vec![touch_down("a")]);
        scene.object_mut(&ObjectId::new("a")).unwrap().visible = false;

        let mut evaluator = ConditionEvaluator::new();
        let mut tracker = PointerTracker::new();
        let frame = tap(&mut tracker, 0.3, 0.3, 0.0);
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.016).is_empty());
    }

    // -- 2. timerElapsed is edge-triggered ------------------------------------

    #[test]
    fn timer_fires_on_exactly_one_tick() {
        let (scene, rules) =
            scene_with_rules(vec![rule("a", Condition::TimerElapsed { seconds: 10.0 })]);
        let mut evaluator = ConditionEvaluator::new();
        let frame = PointerFrame::default();

        let mut fire_count = 0;
        let mut elapsed = 0.0;
        for _ in 0..1200 {
            elapsed += 1.0 / 60.0;
            if !evaluator.evaluate(&scene, &rules, &frame, elapsed).is_empty() {
                fire_count += 1;
            }
        }
        assert_eq!(fire_count, 1);
    }

    // -- 3. Collision is level-triggered --------------------------------------

    #[test]
    fn collision_holds_while_overlapping() {
        let (mut scene, rules) = scene_with_rules(vec![rule(
            "a",
            Condition::Collision {
                with_kind: Kind::new("target"),
            },
        )]);
        let mut evaluator = ConditionEvaluator::new();
        let frame = PointerFrame::default();

        // Apart: no match.
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.0).is_empty());

        // Move b onto a: match on every subsequent tick.
        scene.object_mut(&ObjectId::new("b")).unwrap().position = Vec2::new(0.35, 0.3);
        assert_eq!(evaluator.evaluate(&scene, &rules, &frame, 0.1).len(), 1);
        assert_eq!(evaluator.evaluate(&scene, &rules, &frame, 0.2).len(), 1);

        // Hide b: overlap with an invisible object does not count.
        scene.object_mut(&ObjectId::new("b")).unwrap().visible = false;
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.3).is_empty());
    }

    // -- 4. Hold fires once per contact and re-arms ----------------------------

    #[test]
    fn hold_fires_once_then_rearms_after_release() {
        let (scene, rules) = scene_with_rules(vec![rule(
            "a",
            Condition::Touch(TouchCondition {
                gesture: TouchGesture::Hold {
                    duration: 0.5,
                    tolerance: 0.05,
                },
                target: TouchTarget::Itself,
            }),
        )]);
        let mut evaluator = ConditionEvaluator::new();
        let mut tracker = PointerTracker::new();

        let frame = tap(&mut tracker, 0.3, 0.3, 0.0);
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.0).is_empty());

        // Crosses the threshold: fires once.
        let frame = tracker.process(&[], 0.6);
        assert_eq!(evaluator.evaluate(&scene, &rules, &frame, 0.6).len(), 1);
        let frame = tracker.process(&[], 0.7);
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.7).is_empty());

        // Release, press again, cross again: fires again.
        let frame = tracker.process(
            &[PointerEvent::Up {
                position: Vec2::new(0.3, 0.3),
                time: 0.8,
            }],
            0.8,
        );
        assert!(evaluator.evaluate(&scene, &rules, &frame, 0.8).is_empty());
        let frame = tap(&mut tracker, 0.3, 0.3, 1.0);
        assert!(evaluator.evaluate(&scene, &rules, &frame, 1.0).is_empty());
        let frame = tracker.process(&[], 1.6);
        assert_eq!(evaluator.evaluate(&scene, &rules, &frame, 1.6).len(), 1);
    }

    // -- 5. Target selectors ----------------------------------------------------

    #[test]
    fn of_kind_selector_expands_in_declaration_order() {
        let (scene, rules) = scene_with_rules(vec![Rule {
            subject: ObjectId::new("a"),
            condition: Condition::Always,
            actions: vec![],
            target: TargetSelector::OfKind(Kind::new("target")),
        }]);
        let mut evaluator = ConditionEvaluator::new();
        let frame = PointerFrame::default();

        let matches = evaluator.evaluate(&scene, &rules, &frame, 0.0);
        let ids: Vec<&str> = matches.iter().map(|m| m.target.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn missing_subject_skips_rule_and_keeps_evaluating() {
        let (mut scene, rules) = scene_with_rules(vec![touch_down("a"), touch_down("b")]);
        scene.remove_object(&ObjectId::new("a"));

        let mut evaluator = ConditionEvaluator::new();
        let mut tracker = PointerTracker::new();
        let frame = tap(&mut tracker, 0.7, 0.7, 0.0);

        let matches = evaluator.evaluate(&scene, &rules, &frame, 0.016);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target, ObjectId::new("b"));
    }

    // -- 6. Swipe thresholds -----------------------------------------------------

    #[test]
    fn swipe_requires_all_thresholds() {
        let swipe = |direction| {
            rule(
                "a",
                Condition::Touch(TouchCondition {
                    gesture: TouchGesture::Swipe {
                        min_distance: 0.08,
                        max_duration: 0.5,
                        min_velocity: 0.3,
                        direction,
                    },
                    target: TouchTarget::Stage,
                }),
            )
        };
        let (scene, rules) =
            scene_with_rules(vec![swipe(Some(SwipeDirection::Right)), swipe(None)]);
        let mut evaluator = ConditionEvaluator::new();
        let mut tracker = PointerTracker::new();

        // Qualifying stroke to the right: both rules fire.
        tracker.process(
            &[PointerEvent::Down {
                position: Vec2::new(0.2, 0.5),
                time: 0.0,
            }],
            0.0,
        );
        let frame = tracker.process(
            &[PointerEvent::Up {
                position: Vec2::new(0.4, 0.5),
                time: 0.2,
            }],
            0.2,
        );
        assert_eq!(evaluator.evaluate(&scene, &rules, &frame, 0.2).len(), 2);

        // Too slow: neither fires.
        tracker.process(
            &[PointerEvent::Down {
                position: Vec2::new(0.2, 0.5),
                time: 1.0,
            }],
            1.0,
        );
        let frame = tracker.process(
            &[PointerEvent::Up {
                position: Vec2::new(0.3, 0.5),
                time: 1.45,
            }],
            1.45,
        );
        assert!(evaluator.evaluate(&scene, &rules, &frame, 1.45).is_empty());
    }
}
