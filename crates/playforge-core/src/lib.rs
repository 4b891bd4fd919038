//! Playforge Core -- data contracts and scene model for user-authored mini-games.
//!
//! This crate defines the two documents the rest of the platform exchanges:
//! the [`GameProject`](project::GameProject) authored by end users (objects,
//! condition->action rules, play settings) and the mutable [`Scene`](scene::Scene)
//! a single play-through runs against. The project document is immutable;
//! every play deep-copies it into a fresh scene so replays never share state.
//!
//! All structural problems with a project (dangling object references,
//! non-finite parameters) are caught by
//! [`validate`](project::GameProject::validate) at load time and reported as
//! [`ProjectError`] -- the engine never has to defend against them at runtime.
//!
//! # Quick Start
//!
//! ```
//! use playforge_core::prelude::*;
//!
//! let json = r#"{
//!     "objects": [
//!         {"id": "ball", "kind": "toy", "position": {"x": 0.5, "y": 0.5},
//!          "size": {"x": 0.1, "y": 0.1}}
//!     ],
//!     "rules": [
//!         {"subject": "ball",
//!          "condition": {"type": "touch", "gesture": "down"},
//!          "actions": [{"type": "score", "points": 1}, {"type": "destroy"}]}
//!     ],
//!     "settings": {"duration": 10.0, "targetScore": 1}
//! }"#;
//!
//! let project: GameProject = serde_json::from_str(json).unwrap();
//! let scene = Scene::initialize(&project).unwrap();
//! assert_eq!(scene.object_count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod math;
pub mod project;
pub mod scene;

use project::ObjectId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by project validation and scene construction.
///
/// These are load-time errors: a project that passes [`validate`]
/// (project::GameProject::validate) will never make the engine reference a
/// missing object or consume a malformed parameter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    /// Two authored objects share an id.
    #[error("duplicate object id '{id}'")]
    DuplicateObjectId {
        id: ObjectId,
    },

    /// A rule's `subject` names an object that is not in the project.
    #[error("rule {rule} is attached to unknown object '{id}'")]
    UnknownSubject {
        rule: usize,
        id: ObjectId,
    },

    /// A rule's target selector or action names an object that is not in the
    /// project.
    #[error("rule {rule} references unknown object '{id}'")]
    UnknownTarget {
        rule: usize,
        id: ObjectId,
    },

    /// A numeric parameter is non-finite or outside its allowed range.
    #[error("{context}: parameter '{name}' is invalid (got {value})")]
    InvalidParameter {
        context: String,
        name: &'static str,
        value: f64,
    },

    /// The project has no objects at all.
    #[error("project contains no objects")]
    EmptyProject,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::math::{Rect, Vec2};
    pub use crate::project::{
        Action, Color, Condition, DragConstraint, DragPhase, EffectAction, GameDuration,
        GameObject, GameProject, GameSettings, Kind, MoveAction, ObjectId, Rule, SwipeDirection,
        TargetSelector, TeleportDestination, TouchCondition, TouchGesture, TouchTarget,
        VisibilityMode,
    };
    pub use crate::scene::{Scene, SceneObject};
    pub use crate::ProjectError;
}
