//! The game runner: bridges one play-through to the host surface.
//!
//! A [`GameRunner`] owns at most one [`RuleEngine`] at a time. `launch`
//! mounts the injected [`RenderSurface`], builds a fresh scene + engine, and
//! starts the tick loop; `frame` pumps it once per displayed frame and yields
//! the [`PlayResult`] exactly once, on the frame the play terminates.
//! Launching again while a play is active is a reported programming error,
//! never a silent restart.
//!
//! `skip` requests early termination; it takes effect on the next frame, not
//! synchronously mid-action, and resolves the play as a failure carrying the
//! score accumulated so far.

use playforge_core::prelude::*;

use crate::action::{EffectState, FadeState};
use crate::input::PointerEvent;
use crate::tick::{EngineConfig, EngineState, RuleEngine, Termination};

// ---------------------------------------------------------------------------
// Host-facing traits
// ---------------------------------------------------------------------------

/// The opaque mount point the embedding UI provides.
///
/// The runner only requires attach/detach and a per-frame present of the
/// authoritative play state. What "present" means (canvas, GPU, terminal) is
/// entirely the host's business.
pub trait RenderSurface {
    fn attach(&mut self);
    fn detach(&mut self);
    fn present(&mut self, view: &PlayView<'_>);
}

/// Surface that renders nothing. Headless tests and tools.
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn attach(&mut self) {}
    fn detach(&mut self) {}
    fn present(&mut self, _view: &PlayView<'_>) {}
}

/// Fire-and-forget audio playback.
///
/// A sink that cannot play a clip degrades silently (log it, drop it); it
/// must never fail the frame.
pub trait SoundSink {
    fn play(&mut self, clip_id: &str);
}

/// Sink that plays nothing.
pub struct NullSoundSink;

impl SoundSink for NullSoundSink {
    fn play(&mut self, _clip_id: &str) {}
}

// ---------------------------------------------------------------------------
// PlayView
// ---------------------------------------------------------------------------

/// Read-only view of the running play, handed to the surface each frame.
pub struct PlayView<'a> {
    engine: &'a RuleEngine,
}

impl PlayView<'_> {
    pub fn scene(&self) -> &Scene {
        self.engine.scene()
    }

    pub fn score(&self) -> i64 {
        self.engine.score()
    }

    pub fn elapsed(&self) -> f64 {
        self.engine.elapsed()
    }

    /// Seconds until timeout, `None` for unlimited play.
    pub fn remaining_time(&self) -> Option<f64> {
        self.engine.remaining_time()
    }

    /// Running effect overlays on an object.
    pub fn effects_on(&self, id: &ObjectId) -> &[EffectState] {
        self.engine.effects_on(id)
    }

    /// Running fade ramp on an object.
    pub fn fade_on(&self, id: &ObjectId) -> Option<&FadeState> {
        self.engine.fade_on(id)
    }
}

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// The sole contract between a runner and its caller: one of these per
/// launch, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResult {
    pub score: i64,
    pub success: bool,
    /// Play time in seconds at termination.
    pub elapsed_time: f64,
}

/// Errors from [`GameRunner::launch`].
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// `launch` was called before the previous play resolved.
    #[error("a play-through is already active; wait for its result before launching")]
    AlreadyRunning,

    /// The project failed structural validation at scene construction.
    #[error("project failed validation: {0}")]
    InvalidProject(#[from] ProjectError),
}

// ---------------------------------------------------------------------------
// GameRunner
// ---------------------------------------------------------------------------

/// Owns the engine lifecycle for successive play-throughs, one at a time.
pub struct GameRunner {
    surface: Box<dyn RenderSurface>,
    sound: Box<dyn SoundSink>,
    engine: Option<RuleEngine>,
    skip_requested: bool,
    base_seed: u64,
    plays: u64,
}

impl GameRunner {
    /// `base_seed` derives each play's RNG seed; two runners with the same
    /// seed replay identically given identical inputs.
    pub fn new(surface: Box<dyn RenderSurface>, sound: Box<dyn SoundSink>, base_seed: u64) -> Self {
        Self {
            surface,
            sound,
            engine: None,
            skip_requested: false,
            base_seed,
            plays: 0,
        }
    }

    /// Start a play-through of `project`.
    ///
    /// Fails with [`LaunchError::AlreadyRunning`] if the previous play has
    /// not resolved, and with [`LaunchError::InvalidProject`] if the project
    /// does not validate. On success the surface is attached and the next
    /// `frame` call begins ticking.
    pub fn launch(&mut self, project: &GameProject) -> Result<(), LaunchError> {
        if self.engine.is_some() {
            return Err(LaunchError::AlreadyRunning);
        }

        let seed = self
            .base_seed
            .wrapping_add(self.plays.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut engine = RuleEngine::new(project, EngineConfig { seed })?;
        engine.start();

        self.surface.attach();
        self.skip_requested = false;
        self.engine = Some(engine);
        self.plays += 1;
        tracing::debug!(play = self.plays, "play-through launched");
        Ok(())
    }

    /// Pump one frame: tick the engine, forward queued sounds, present to
    /// the surface. Returns the play's result on the frame it terminates,
    /// `None` otherwise -- including every frame after resolution, until the
    /// next `launch`.
    pub fn frame(&mut self, dt: f64, events: &[PointerEvent]) -> Option<PlayResult> {
        let state = {
            let engine = self.engine.as_mut()?;
            if self.skip_requested {
                engine.force_failure();
                self.skip_requested = false;
            }
            let state = engine.tick(dt, events);
            for clip in engine.take_sounds() {
                self.sound.play(&clip);
            }
            state
        };

        if let Some(engine) = &self.engine {
            self.surface.present(&PlayView { engine });
        }

        match state {
            EngineState::Terminated(termination) => {
                let engine = self.engine.take()?;
                self.surface.detach();
                let result = PlayResult {
                    score: engine.score(),
                    success: termination == Termination::Success,
                    elapsed_time: engine.elapsed(),
                };
                tracing::debug!(
                    score = result.score,
                    success = result.success,
                    "play-through resolved"
                );
                Some(result)
            }
            _ => None,
        }
    }

    /// Request early termination: the play resolves as a failure (with its
    /// accumulated score) on the next `frame` call.
    pub fn skip(&mut self) {
        if self.engine.is_some() {
            self.skip_requested = true;
        }
    }

    /// A play-through is active (launched, not yet resolved).
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// View of the active play, if any.
    pub fn view(&self) -> Option<PlayView<'_>> {
        self.engine.as_ref().map(|engine| PlayView { engine })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const DT: f64 = 1.0 / 60.0;

    /// Surface that counts lifecycle calls.
    struct CountingSurface {
        attaches: Arc<AtomicUsize>,
        detaches: Arc<AtomicUsize>,
        presents: Arc<AtomicUsize>,
    }

    impl RenderSurface for CountingSurface {
        fn attach(&mut self) {
            self.attaches.fetch_add(1, Ordering::SeqCst);
        }
        fn detach(&mut self) {
            self.detaches.fetch_add(1, Ordering::SeqCst);
        }
        fn present(&mut self, _view: &PlayView<'_>) {
            self.presents.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Sink that records requested clips.
    struct RecordingSink {
        clips: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl SoundSink for RecordingSink {
        fn play(&mut self, clip_id: &str) {
            self.clips.lock().unwrap().push(clip_id.to_owned());
        }
    }

    fn tap_game(target_score: u32) -> GameProject {
        serde_json::from_str(&format!(
            r#"{{
                "objects": [{{"id": "b", "kind": "t",
                              "position": {{"x": 0.5, "y": 0.5}},
                              "size": {{"x": 0.2, "y": 0.2}}}}],
                "rules": [{{"subject": "b",
                            "condition": {{"type": "touch", "gesture": "down"}},
                            "actions": [{{"type": "score", "points": 1}},
                                        {{"type": "sound", "clipId": "pop"}}]}}],
                "settings": {{"duration": 10.0, "targetScore": {target_score}}}
            }}"#
        ))
        .unwrap()
    }

    fn tap(t: f64) -> Vec<PointerEvent> {
        vec![
            PointerEvent::Down {
                position: Vec2::new(0.5, 0.5),
                time: t,
            },
            PointerEvent::Up {
                position: Vec2::new(0.5, 0.5),
                time: t + 0.01,
            },
        ]
    }

    fn runner() -> GameRunner {
        GameRunner::new(Box::new(NullSurface), Box::new(NullSoundSink), 7)
    }

    // -- 1. Double launch is a reported error --------------------------------

    #[test]
    fn second_launch_before_resolution_errors() {
        let project = tap_game(3);
        let mut runner = runner();
        runner.launch(&project).unwrap();

        assert!(matches!(
            runner.launch(&project),
            Err(LaunchError::AlreadyRunning)
        ));
        // The active play is untouched by the failed launch.
        assert!(runner.is_active());
    }

    #[test]
    fn launch_rejects_invalid_project_and_stays_idle() {
        let mut project = tap_game(3);
        project.rules[0].subject = ObjectId::new("ghost");

        let mut runner = runner();
        assert!(matches!(
            runner.launch(&project),
            Err(LaunchError::InvalidProject(_))
        ));
        assert!(!runner.is_active());
    }

    // -- 2. Result resolves exactly once ---------------------------------------

    #[test]
    fn result_is_yielded_exactly_once() {
        let project = tap_game(1);
        let mut runner = runner();
        runner.launch(&project).unwrap();

        let result = runner.frame(DT, &tap(0.0)).expect("tap wins immediately");
        assert_eq!(result.score, 1);
        assert!(result.success);
        assert!(result.elapsed_time < 10.0);

        // Frames after resolution yield nothing and nothing is active.
        assert!(runner.frame(DT, &[]).is_none());
        assert!(!runner.is_active());
        assert!(runner.view().is_none());
    }

    #[test]
    fn runner_is_reusable_after_resolution() {
        let project = tap_game(1);
        let mut runner = runner();

        for _ in 0..3 {
            runner.launch(&project).unwrap();
            let result = runner.frame(DT, &tap(0.0)).unwrap();
            assert_eq!(result.score, 1);
        }
    }

    // -- 3. Skip -----------------------------------------------------------------

    #[test]
    fn skip_takes_effect_on_next_frame_with_score_kept() {
        let project = tap_game(3);
        let mut runner = runner();
        runner.launch(&project).unwrap();

        assert!(runner.frame(DT, &tap(0.0)).is_none());
        runner.skip();
        // Not synchronous: nothing resolved yet.
        assert!(runner.is_active());

        let result = runner.frame(DT, &[]).expect("skip resolves this frame");
        assert!(!result.success);
        assert_eq!(result.score, 1);
    }

    // -- 4. Surface lifecycle ------------------------------------------------------

    #[test]
    fn surface_attached_per_launch_and_detached_on_resolution() {
        let attaches = Arc::new(AtomicUsize::new(0));
        let detaches = Arc::new(AtomicUsize::new(0));
        let presents = Arc::new(AtomicUsize::new(0));
        let surface = CountingSurface {
            attaches: attaches.clone(),
            detaches: detaches.clone(),
            presents: presents.clone(),
        };

        let project = tap_game(1);
        let mut runner = GameRunner::new(Box::new(surface), Box::new(NullSoundSink), 7);

        runner.launch(&project).unwrap();
        assert_eq!(attaches.load(Ordering::SeqCst), 1);

        runner.frame(DT, &[]);
        runner.frame(DT, &tap(0.1)).unwrap();

        assert_eq!(detaches.load(Ordering::SeqCst), 1);
        // Presented on every pumped frame, including the terminal one.
        assert_eq!(presents.load(Ordering::SeqCst), 2);
    }

    // -- 5. Sounds are forwarded ----------------------------------------------------

    #[test]
    fn queued_sounds_reach_the_sink() {
        let clips = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = RecordingSink {
            clips: clips.clone(),
        };

        let project = tap_game(3);
        let mut runner = GameRunner::new(Box::new(NullSurface), Box::new(sink), 7);
        runner.launch(&project).unwrap();

        runner.frame(DT, &tap(0.0));
        assert_eq!(*clips.lock().unwrap(), vec!["pop".to_owned()]);
    }
}
