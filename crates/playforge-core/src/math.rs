//! Minimal 2D math for stage-space coordinates.
//!
//! The stage is the normalized unit square `[0,1] x [0,1]`, y-down (as on
//! screens). Everything the engine integrates -- positions, sizes, pointer
//! coordinates -- lives in this space; mapping to pixels is the rendering
//! surface's concern.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D vector / point in stage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate, 0.0 at the left edge.
    pub x: f32,
    /// Vertical coordinate, 0.0 at the top edge.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for an angle in degrees. 0 degrees points right (+x),
    /// 90 degrees points down (+y), matching screen space.
    pub fn from_angle(degrees: f32) -> Self {
        let rad = degrees.to_radians();
        Self {
            x: rad.cos(),
            y: rad.sin(),
        }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalized copy, or zero if the vector is (near) zero length.
    pub fn normalized_or_zero(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }

    pub fn distance_to(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Component-wise clamp into a rectangle.
    pub fn clamped_to(self, rect: Rect) -> Self {
        Self {
            x: self.x.clamp(rect.x, rect.x + rect.w),
            y: self.y.clamp(rect.y, rect.y + rect.h),
        }
    }

    /// Both components are finite numbers.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle: origin (top-left) plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// The whole stage.
    pub const STAGE: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given extent centered on `center`.
    pub fn centered(center: Vec2, extent: Vec2) -> Self {
        Self {
            x: center.x - extent.x / 2.0,
            y: center.y - extent.y / 2.0,
            w: extent.x,
            h: extent.y,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.x + self.w && point.y >= self.y && point.y <= self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.w
            && other.x <= self.x + self.w
            && self.y <= other.y + other.h
            && other.y <= self.y + self.h
    }

    /// Copy of this rect grown by `margin` on every side.
    pub fn expanded(&self, margin: Vec2) -> Self {
        Self {
            x: self.x - margin.x,
            y: self.y - margin.y,
            w: self.w + margin.x * 2.0,
            h: self.h + margin.y * 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
