//! Playforge Session -- catalog access and the endless-play orchestrator.
//!
//! This crate turns the engine's single-play
//! [`GameRunner`](playforge_engine::runner::GameRunner) into an uninterrupted
//! stream of user-authored games:
//!
//! - [`catalog`] defines the read-only [`PublicGame`](catalog::PublicGame)
//!   contract, the paginated [`CatalogFetcher`](catalog::CatalogFetcher)
//!   seam to the backing store, and an in-memory implementation for tests
//!   and tools.
//! - [`orchestrator`] owns the session state machine: fetch one entry fast,
//!   fill the pool in the background, prefetch a non-repeating next
//!   candidate, run the bridge countdown between plays, and recover locally
//!   from entries that fail to launch.
//!
//! The orchestrator's core guarantee: nothing short of total catalog
//! unavailability interrupts the stream. Broken entries are quarantined and
//! skipped; a failed background fill just means a smaller pool.

#![deny(unsafe_code)]

pub mod catalog;
pub mod orchestrator;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the engine crate for convenience.
pub use playforge_engine;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for embedding a session.
pub mod prelude {
    pub use playforge_engine::prelude::*;

    pub use crate::catalog::{
        CatalogError, CatalogFetcher, CatalogPage, CatalogQuery, GameId, GameStats, PublicGame,
        SortBy, StaticCatalog,
    };
    pub use crate::orchestrator::{
        NullTelemetry, SessionConfig, SessionEvent, SessionOrchestrator, SessionPhase,
        SessionSummary, TelemetrySink,
    };
}
