//! The [`Scene`] is the mutable runtime state of one play-through.
//!
//! [`Scene::initialize`] validates a [`GameProject`] and deep-copies its
//! objects and settings. The source document is never mutated, so any number
//! of plays of the same project start from an identical state. Objects are
//! stored in declaration order -- which is also draw order and the only
//! rule-firing order -- and looked up linearly: authored scenes hold tens of
//! objects, not thousands.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec2};
use crate::project::{GameObject, GameProject, GameSettings, Kind, ObjectId};
use crate::ProjectError;

// ---------------------------------------------------------------------------
// SceneObject
// ---------------------------------------------------------------------------

/// Runtime state of one object: the authored fields plus live velocity.
///
/// `velocity` is `Some` only while a movement action drives the object; the
/// executor clears it on `stop` and on motion end. A hidden object still
/// exists (it can be shown again) but is excluded from rendering and from
/// touch matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: Kind,
    /// Center in stage space.
    pub position: Vec2,
    /// Extent (width, height) in stage space.
    pub size: Vec2,
    pub visible: bool,
    pub velocity: Option<Vec2>,
}

impl SceneObject {
    fn from_authored(obj: &GameObject) -> Self {
        Self {
            id: obj.id.clone(),
            kind: obj.kind.clone(),
            position: obj.position,
            size: obj.size,
            visible: obj.visible,
            velocity: None,
        }
    }

    /// Current axis-aligned bounds, centered on `position`.
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.size)
    }

    /// Whether a stage-space point lands inside the object's bounds.
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.bounds().contains(point)
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Mutable object state plus immutable settings for one play-through.
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    settings: GameSettings,
}

impl Scene {
    /// Validate the project and build a fresh scene from it.
    ///
    /// The project is read-only; every call produces an independent deep
    /// copy with exactly `project.objects.len()` objects.
    pub fn initialize(project: &GameProject) -> Result<Self, ProjectError> {
        project.validate()?;
        tracing::debug!(
            objects = project.objects.len(),
            rules = project.rules.len(),
            "scene initialized"
        );
        Ok(Self {
            objects: project.objects.iter().map(SceneObject::from_authored).collect(),
            settings: project.settings.clone(),
        })
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// All objects in declaration order, including hidden ones.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// Remove an object from the scene. Returns whether it existed.
    ///
    /// Removal is how actions mark an object consumed; a removed object
    /// never matches a condition or receives an action again.
    pub fn remove_object(&mut self, id: &ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| &o.id != id);
        self.objects.len() != before
    }

    /// Objects of a kind, in declaration order.
    pub fn objects_by_kind<'a>(&'a self, kind: &'a Kind) -> impl Iterator<Item = &'a SceneObject> {
        self.objects.iter().filter(move |o| &o.kind == kind)
    }

    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.visible)
    }

    /// The topmost (last-declared) visible object under a stage point.
    pub fn hit_test(&self, point: Vec2) -> Option<&SceneObject> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.visible && o.contains_point(point))
    }

    /// Whether the object is still on (or near) the stage. An object is out
    /// of bounds once it has left the unit stage by more than its own size;
    /// wander/projectile-style movers past that line are auto-removed.
    pub fn is_within_bounds(&self, object: &SceneObject) -> bool {
        Rect::STAGE.expanded(object.size).contains(object.position)
    }

    /// Exchange the positions of two objects. Returns false (and leaves the
    /// scene untouched) if either is missing.
    pub fn swap_positions(&mut self, a: &ObjectId, b: &ObjectId) -> bool {
        let Some(ia) = self.objects.iter().position(|o| &o.id == a) else {
            return false;
        };
        let Some(ib) = self.objects.iter().position(|o| &o.id == b) else {
            return false;
        };
        let pa = self.objects[ia].position;
        self.objects[ia].position = self.objects[ib].position;
        self.objects[ib].position = pa;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
