//! The catalog contract: published games, paginated queries, and the
//! injected fetcher seam.
//!
//! The backing store is an external collaborator. The session crate only
//! needs the [`CatalogFetcher`] trait: a paginated, filterable query that
//! returns [`PublicGame`] entries which may or may not carry project data.
//! Entries without project data are not playable and are filtered out before
//! the orchestrator ever sees them.
//!
//! [`StaticCatalog`] is the in-memory implementation used by tests, examples,
//! and offline tooling.

use serde::{Deserialize, Serialize};

use playforge_core::project::GameProject;

// ---------------------------------------------------------------------------
// PublicGame
// ---------------------------------------------------------------------------

/// Catalog-wide identifier of a published game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregate counters maintained by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub likes: u64,
}

/// One published catalog entry. Read-only to this crate: the orchestrator's
/// only "mutation" is an in-memory used marker, never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicGame {
    pub id: GameId,
    pub title: String,
    pub author: String,
    /// The authored document. Entries still being processed (or corrupted
    /// upstream) lack it and are not playable.
    #[serde(rename = "projectData")]
    pub project: Option<GameProject>,
    #[serde(default)]
    pub stats: GameStats,
}

impl PublicGame {
    /// Whether this entry can be handed to a game runner at all.
    /// (Structural validation happens later, at scene construction.)
    pub fn is_playable(&self) -> bool {
        self.project.is_some()
    }
}

// ---------------------------------------------------------------------------
// Queries and pages
// ---------------------------------------------------------------------------

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Newest,
    Popular,
}

/// Filters for a catalog query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    pub entries: Vec<PublicGame>,
    pub page: u32,
    pub total_pages: u32,
}

impl CatalogPage {
    /// The page's playable entries, dropping the rest with a log line.
    pub fn into_playable(self) -> Vec<PublicGame> {
        let mut playable = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            if entry.is_playable() {
                playable.push(entry);
            } else {
                tracing::debug!(game = %entry.id, "catalog entry has no project data; not playable");
            }
        }
        playable
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the backing store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// The store could not be reached or answered with garbage.
    #[error("catalog unavailable: {details}")]
    Unavailable {
        details: String,
    },

    /// The store answered, but nothing in it is playable.
    #[error("catalog has no playable games")]
    NoPlayableGames,
}

// ---------------------------------------------------------------------------
// CatalogFetcher
// ---------------------------------------------------------------------------

/// The injected seam to the backing store.
///
/// Implementations must be callable from a background worker thread; the
/// orchestrator never blocks its pump on a fetch.
pub trait CatalogFetcher: Send + Sync {
    fn fetch_page(
        &self,
        query: &CatalogQuery,
        page: u32,
        per_page: u32,
    ) -> Result<CatalogPage, CatalogError>;
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// In-memory catalog over a fixed list of games. Tests and offline tools.
///
/// Supports pagination and the `search` filter (title substring,
/// case-insensitive); `category` is a backend taxonomy this implementation
/// does not model and ignores.
pub struct StaticCatalog {
    games: Vec<PublicGame>,
}

impl StaticCatalog {
    pub fn new(games: Vec<PublicGame>) -> Self {
        Self { games }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl CatalogFetcher for StaticCatalog {
    fn fetch_page(
        &self,
        query: &CatalogQuery,
        page: u32,
        per_page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let per_page = per_page.max(1) as usize;

        let filtered: Vec<&PublicGame> = self
            .games
            .iter()
            .filter(|g| match &query.search {
                Some(needle) => g.title.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            })
            .collect();

        let total_pages = (filtered.len().div_ceil(per_page)).max(1) as u32;
        let start = page as usize * per_page;
        let entries = filtered
            .into_iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        Ok(CatalogPage {
            entries,
            page,
            total_pages,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
