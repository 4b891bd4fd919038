//! The session orchestrator: an endless, stall-free stream of plays.
//!
//! A state machine pumped once per displayed frame by the host:
//!
//! ```text
//! loading -> playing -> bridge -> playing -> bridge -> ...
//!    |
//!    v
//!  error (absorbing, until retry())          ended (after exit())
//! ```
//!
//! - **loading** fetches exactly one playable entry first, from a randomized
//!   catalog page (falling back to the first page), and transitions the
//!   instant one candidate launches. The larger pool fills on a background
//!   worker thread, delivered over a channel, never blocking the pump.
//! - **playing** pumps the [`GameRunner`] and prefetches the next candidate.
//! - **bridge** counts down a fixed result screen, then consumes the
//!   prefetched candidate. Candidates that fail to launch are recovered
//!   locally: quarantined, and the next one is tried after a short delay.
//!   Only candidate exhaustion surfaces as an error.
//!
//! Consecutive plays never share an id while the catalog has two distinct
//! ids; the used set resets once the pool is exhausted. `pause` suspends the
//! bridge countdown only -- gameplay timing belongs to the engine, not here.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use playforge_engine::input::PointerEvent;
use playforge_engine::runner::{GameRunner, PlayResult};

use crate::catalog::{CatalogError, CatalogFetcher, CatalogQuery, GameId, PublicGame};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seconds the result/countdown bridge screen stays up.
    pub bridge_seconds: f64,
    /// Entries requested by the fast first fetch.
    pub first_fetch_size: u32,
    /// Entries the background fill aims to hold in the pool.
    pub pool_size: u32,
    /// The randomized first fetch picks a page in `0..random_page_span`.
    pub random_page_span: u32,
    /// Delay before trying the next candidate after a failed launch.
    pub launch_retry_delay: f64,
    /// Seed for page randomization and next-game selection.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bridge_seconds: 3.0,
            first_fetch_size: 10,
            pool_size: 50,
            random_page_span: 8,
            launch_retry_delay: 0.5,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Phases, events, telemetry
// ---------------------------------------------------------------------------

/// Where the session is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Playing,
    Bridge,
    /// Absorbing until [`SessionOrchestrator::retry`].
    Error,
    /// Terminal, after [`SessionOrchestrator::exit`].
    Ended,
}

/// Session lifecycle events for the injected telemetry sink.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PlayStarted { game: GameId },
    PlayFinished { game: GameId, result: PlayResult },
    PoolFilled { count: usize },
    FetchFailed { details: String },
}

/// Injected telemetry seam. No ambient singletons: whoever constructs the
/// orchestrator decides where events go.
pub trait TelemetrySink: Send {
    fn record(&mut self, event: SessionEvent);
}

/// Sink that drops everything.
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn record(&mut self, _event: SessionEvent) {}
}

/// What a finished session looked like, returned by `exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub plays: u64,
    pub total_score: i64,
}

// ---------------------------------------------------------------------------
// Background fetch plumbing
// ---------------------------------------------------------------------------

/// What a worker thread reports back over its channel.
enum FetchMessage {
    /// Playable entries (possibly empty).
    Loaded(Vec<PublicGame>),
    Failed(CatalogError),
}

/// The fast first fetch: a randomized page, falling back to the first page
/// when the random one is empty or unreachable.
fn first_fetch(
    fetcher: &dyn CatalogFetcher,
    query: &CatalogQuery,
    page: u32,
    per_page: u32,
) -> FetchMessage {
    match fetcher.fetch_page(query, page, per_page) {
        Ok(fetched) => {
            let playable = fetched.into_playable();
            if !playable.is_empty() || page == 0 {
                return FetchMessage::Loaded(playable);
            }
            tracing::debug!(page, "randomized page empty; falling back to first page");
        }
        Err(err) if page == 0 => return FetchMessage::Failed(err),
        Err(err) => {
            tracing::debug!(error = %err, page, "randomized page fetch failed; falling back to first page");
        }
    }

    match fetcher.fetch_page(query, 0, per_page) {
        Ok(fetched) => FetchMessage::Loaded(fetched.into_playable()),
        Err(err) => FetchMessage::Failed(err),
    }
}

/// The background pool fill: walk pages until the pool target is met or the
/// catalog runs out.
fn fill_fetch(fetcher: &dyn CatalogFetcher, query: &CatalogQuery, target: u32) -> FetchMessage {
    let mut collected: Vec<PublicGame> = Vec::new();
    let mut page = 0u32;
    loop {
        match fetcher.fetch_page(query, page, target) {
            Ok(fetched) => {
                let total_pages = fetched.total_pages;
                collected.extend(fetched.into_playable());
                page += 1;
                if page >= total_pages || collected.len() >= target as usize {
                    break;
                }
            }
            Err(err) => {
                if collected.is_empty() {
                    return FetchMessage::Failed(err);
                }
                tracing::debug!(error = %err, page, "pool fill stopped early; keeping partial pool");
                break;
            }
        }
    }
    FetchMessage::Loaded(collected)
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

/// Sequences an unbounded stream of plays from the injected catalog.
pub struct SessionOrchestrator {
    fetcher: Arc<dyn CatalogFetcher>,
    runner: GameRunner,
    telemetry: Box<dyn TelemetrySink>,
    config: SessionConfig,
    query: CatalogQuery,

    phase: SessionPhase,
    pool: Vec<PublicGame>,
    /// Ids played since the last reset; avoids repeats until exhaustion.
    used: HashSet<GameId>,
    /// Ids that failed to launch; never selected again this session.
    broken: HashSet<GameId>,
    current: Option<PublicGame>,
    next: Option<PublicGame>,

    bridge_remaining: f64,
    paused: bool,

    first_rx: Option<Receiver<FetchMessage>>,
    fill_rx: Option<Receiver<FetchMessage>>,

    last_result: Option<PlayResult>,
    last_error: Option<CatalogError>,
    total_score: i64,
    plays: u64,
    rng: Pcg32,
}

impl SessionOrchestrator {
    /// Build a session and immediately start the fast first fetch.
    ///
    /// All collaborators are injected: the catalog, the runner (which itself
    /// carries the render surface and sound sink), and the telemetry sink.
    pub fn new(
        fetcher: Arc<dyn CatalogFetcher>,
        runner: GameRunner,
        telemetry: Box<dyn TelemetrySink>,
        query: CatalogQuery,
        config: SessionConfig,
    ) -> Self {
        let rng = Pcg32::seed_from_u64(config.seed);
        let mut session = Self {
            fetcher,
            runner,
            telemetry,
            config,
            query,
            phase: SessionPhase::Loading,
            pool: Vec::new(),
            used: HashSet::new(),
            broken: HashSet::new(),
            current: None,
            next: None,
            bridge_remaining: 0.0,
            paused: false,
            first_rx: None,
            fill_rx: None,
            last_result: None,
            last_error: None,
            total_score: 0,
            plays: 0,
            rng,
        };
        session.spawn_first_fetch();
        session
    }

    /// Pump the session once per displayed frame.
    ///
    /// Never blocks: background fetch results are drained with `try_recv`,
    /// and the active play ticks exactly once.
    pub fn update(&mut self, dt: f64, events: &[PointerEvent]) {
        self.drain_fill();

        match self.phase {
            SessionPhase::Loading => self.update_loading(),
            SessionPhase::Playing => self.update_playing(dt, events),
            SessionPhase::Bridge => self.update_bridge(dt),
            SessionPhase::Error | SessionPhase::Ended => {}
        }
    }

    /// Force the current play to resolve early; the session then proceeds
    /// exactly as on natural termination. Takes effect on the next pump.
    pub fn skip_to_bridge(&mut self) {
        if self.phase == SessionPhase::Playing {
            self.runner.skip();
        }
    }

    /// Suspend or resume the bridge countdown. Gameplay is never paused
    /// from here: the engine owns its own clock.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Tear the session down. The active play (if any) is discarded.
    pub fn exit(&mut self) -> SessionSummary {
        if self.runner.is_active() {
            self.runner.skip();
            let _ = self.runner.frame(0.0, &[]);
        }
        self.phase = SessionPhase::Ended;
        SessionSummary {
            plays: self.plays,
            total_score: self.total_score,
        }
    }

    /// From `Error` only: start over with a fresh first fetch.
    pub fn retry(&mut self) {
        if self.phase != SessionPhase::Error {
            return;
        }
        self.last_error = None;
        self.phase = SessionPhase::Loading;
        self.spawn_first_fetch();
    }

    // -- accessors ----------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_game(&self) -> Option<&PublicGame> {
        self.current.as_ref()
    }

    /// The prefetched next entry, if selection already happened.
    pub fn next_game(&self) -> Option<&PublicGame> {
        self.next.as_ref()
    }

    pub fn last_result(&self) -> Option<&PlayResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }

    /// Seconds left on the bridge countdown.
    pub fn bridge_remaining(&self) -> f64 {
        self.bridge_remaining
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn plays(&self) -> u64 {
        self.plays
    }

    pub fn total_score(&self) -> i64 {
        self.total_score
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// The runner, e.g. for host-side rendering of the active play.
    pub fn runner(&self) -> &GameRunner {
        &self.runner
    }

    // -- phase handlers -----------------------------------------------------

    fn update_loading(&mut self) {
        let Some(rx) = &self.first_rx else {
            return;
        };
        let message = match rx.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => FetchMessage::Failed(CatalogError::Unavailable {
                details: "fetch worker disappeared".to_owned(),
            }),
        };
        self.first_rx = None;

        match message {
            FetchMessage::Loaded(games) if !games.is_empty() => {
                self.merge_pool(games);
                if self.launch_first_available() {
                    self.phase = SessionPhase::Playing;
                    // The rest of the pool fills behind the first play.
                    self.spawn_pool_fill();
                } else {
                    self.fail_with(CatalogError::NoPlayableGames);
                }
            }
            FetchMessage::Loaded(_) => self.fail_with(CatalogError::NoPlayableGames),
            FetchMessage::Failed(err) => self.fail_with(err),
        }
    }

    fn update_playing(&mut self, dt: f64, events: &[PointerEvent]) {
        // Prefetch while the current play runs, so the bridge hand-off is
        // instant.
        if self.next.is_none() {
            self.next = self.select_next();
        }

        let Some(result) = self.runner.frame(dt, events) else {
            return;
        };

        self.plays += 1;
        self.total_score += result.score;
        self.last_result = Some(result);
        if let Some(current) = &self.current {
            self.telemetry.record(SessionEvent::PlayFinished {
                game: current.id.clone(),
                result,
            });
        }

        self.phase = SessionPhase::Bridge;
        self.bridge_remaining = self.config.bridge_seconds;
    }

    fn update_bridge(&mut self, dt: f64) {
        if self.next.is_none() {
            self.next = self.select_next();
        }

        if self.paused {
            return;
        }

        self.bridge_remaining -= dt;
        if self.bridge_remaining > 0.0 {
            return;
        }

        let Some(game) = self.next.take().or_else(|| self.select_next()) else {
            self.fail_with(CatalogError::NoPlayableGames);
            return;
        };

        // A prefetch made while the pool was still thin may have settled for
        // a repeat; if the background fill has landed since, choose again.
        let game = if self.current.as_ref().is_some_and(|c| c.id == game.id) {
            self.select_next().unwrap_or(game)
        } else {
            game
        };

        if self.try_launch(game) {
            self.phase = SessionPhase::Playing;
        } else if self.any_candidate_left() {
            // Recovered locally: another candidate after a short delay.
            self.bridge_remaining = self.config.launch_retry_delay;
        } else {
            self.fail_with(CatalogError::NoPlayableGames);
        }
    }

    // -- selection and launching --------------------------------------------

    /// Launch the given entry; on failure it is quarantined for the session.
    fn try_launch(&mut self, game: PublicGame) -> bool {
        let Some(project) = game.project.as_ref() else {
            self.broken.insert(game.id.clone());
            return false;
        };
        match self.runner.launch(project) {
            Ok(()) => {
                self.used.insert(game.id.clone());
                self.telemetry.record(SessionEvent::PlayStarted {
                    game: game.id.clone(),
                });
                tracing::info!(game = %game.id, title = %game.title, "starting play");
                self.current = Some(game);
                true
            }
            Err(err) => {
                tracing::warn!(game = %game.id, error = %err, "entry failed to launch; quarantined");
                self.broken.insert(game.id.clone());
                false
            }
        }
    }

    /// First-fetch path: take candidates in catalog order until one launches.
    fn launch_first_available(&mut self) -> bool {
        loop {
            let candidate = self
                .pool
                .iter()
                .find(|g| !self.used.contains(&g.id) && !self.broken.contains(&g.id))
                .cloned();
            match candidate {
                Some(game) => {
                    if self.try_launch(game) {
                        return true;
                    }
                }
                None => return false,
            }
        }
    }

    /// Pick the next entry: never the current id while another exists, never
    /// a quarantined one, resetting the used set once the pool is exhausted.
    fn select_next(&mut self) -> Option<PublicGame> {
        let current_id = self.current.as_ref().map(|g| g.id.clone());

        let mut candidates = self.candidate_indices(&current_id, true);
        if candidates.is_empty() {
            // Pool exhausted: reset and go around again, still avoiding an
            // immediate repeat.
            self.used.clear();
            candidates = self.candidate_indices(&current_id, true);
        }
        if candidates.is_empty() {
            // Only the current game is selectable (catalog of one): repeat it.
            candidates = self.candidate_indices(&current_id, false);
        }
        if candidates.is_empty() {
            return None;
        }

        let index = candidates[self.rng.gen_range(0..candidates.len())];
        Some(self.pool[index].clone())
    }

    fn candidate_indices(&self, current_id: &Option<GameId>, avoid_current: bool) -> Vec<usize> {
        self.pool
            .iter()
            .enumerate()
            .filter(|(_, g)| {
                !self.broken.contains(&g.id)
                    && !self.used.contains(&g.id)
                    && (!avoid_current || Some(&g.id) != current_id.as_ref())
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn any_candidate_left(&self) -> bool {
        self.pool.iter().any(|g| !self.broken.contains(&g.id))
    }

    // -- fetch plumbing ------------------------------------------------------

    fn spawn_first_fetch(&mut self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.first_rx = Some(rx);

        let fetcher = Arc::clone(&self.fetcher);
        let query = self.query.clone();
        let span = self.config.random_page_span.max(1);
        let page = self.rng.gen_range(0..span);
        let per_page = self.config.first_fetch_size;

        std::thread::spawn(move || {
            let message = first_fetch(fetcher.as_ref(), &query, page, per_page);
            // The session may already be gone; that is fine.
            let _ = tx.send(message);
        });
    }

    fn spawn_pool_fill(&mut self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.fill_rx = Some(rx);

        let fetcher = Arc::clone(&self.fetcher);
        let query = self.query.clone();
        let target = self.config.pool_size;

        std::thread::spawn(move || {
            let message = fill_fetch(fetcher.as_ref(), &query, target);
            let _ = tx.send(message);
        });
    }

    fn drain_fill(&mut self) {
        let Some(rx) = &self.fill_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(FetchMessage::Loaded(games)) => {
                self.fill_rx = None;
                self.merge_pool(games);
                self.telemetry.record(SessionEvent::PoolFilled {
                    count: self.pool.len(),
                });
                tracing::debug!(pool = self.pool.len(), "background pool fill complete");
            }
            Ok(FetchMessage::Failed(err)) => {
                // Non-fatal: keep sequencing from what we already have.
                self.fill_rx = None;
                tracing::warn!(error = %err, "background pool fill failed");
                self.telemetry.record(SessionEvent::FetchFailed {
                    details: err.to_string(),
                });
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.fill_rx = None;
            }
        }
    }

    fn merge_pool(&mut self, games: Vec<PublicGame>) {
        for game in games {
            if !self.pool.iter().any(|g| g.id == game.id) {
                self.pool.push(game);
            }
        }
    }

    fn fail_with(&mut self, err: CatalogError) {
        tracing::warn!(error = %err, "session entered error state");
        self.telemetry.record(SessionEvent::FetchFailed {
            details: err.to_string(),
        });
        self.last_error = Some(err);
        self.phase = SessionPhase::Error;
    }
}
