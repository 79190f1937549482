//! Spatial and collision utilities
//!
//! Every entity carries a `Body`: identifier, top-left position and bounding
//! box. Overlap tests are axis-aligned; distance queries use box centres.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique entity identifier
pub type EntityId = u32;

/// Monotonic id allocator; ids are never reused within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGen {
    next: EntityId,
}

impl Default for IdGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGen {
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Shared base shape of all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, size: Vec2) -> Self {
        Self { id, pos, size }
    }

    /// Body of the given size centred on `center`
    pub fn centered(id: EntityId, center: Vec2, size: Vec2) -> Self {
        Self {
            id,
            pos: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Move so the centre sits at `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.pos = center - self.size * 0.5;
    }

    /// Strict AABB overlap (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Body) -> bool {
        aabb_overlap(self.pos, self.size, other.pos, other.size)
    }

    /// Distance between box centres
    #[inline]
    pub fn center_distance(&self, other: &Body) -> f32 {
        self.center().distance(other.center())
    }

    /// Whether the centre lies within `radius` of `point`
    #[inline]
    pub fn within(&self, point: Vec2, radius: f32) -> bool {
        self.center().distance(point) < radius
    }

    /// Clamp so the whole box stays inside `[0, world]`
    pub fn clamp_to(&mut self, world: Vec2) {
        self.pos.x = self.pos.x.clamp(0.0, (world.x - self.size.x).max(0.0));
        self.pos.y = self.pos.y.clamp(0.0, (world.y - self.size.y).max(0.0));
    }

    /// Whether the box lies fully outside `[-margin, world + margin]`
    pub fn is_outside(&self, world: Vec2, margin: f32) -> bool {
        self.pos.x + self.size.x < -margin
            || self.pos.y + self.size.y < -margin
            || self.pos.x > world.x + margin
            || self.pos.y > world.y + margin
    }
}

/// Anything that exposes a `Body`
pub trait HasBody {
    fn body(&self) -> &Body;

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn center(&self) -> Vec2 {
        self.body().center()
    }
}

impl HasBody for Body {
    fn body(&self) -> &Body {
        self
    }
}

/// Axis-aligned box overlap test
#[inline]
pub fn aabb_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x < b_pos.x + b_size.x
        && a_pos.x + a_size.x > b_pos.x
        && a_pos.y < b_pos.y + b_size.y
        && a_pos.y + a_size.y > b_pos.y
}

/// Circle contact between two bodies using half their widths as radii
#[inline]
pub fn circle_contact(a: &Body, b: &Body) -> bool {
    a.center_distance(b) < a.size.x / 2.0 + b.size.x / 2.0
}

/// Nearest candidate to `from` by Euclidean centre distance
///
/// Returns the candidate's id and distance. Ties keep the earliest candidate
/// so iteration order decides, which keeps targeting deterministic.
pub fn nearest<'a, T, I>(from: Vec2, candidates: I) -> Option<(EntityId, f32)>
where
    T: HasBody + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<(EntityId, f32)> = None;
    for candidate in candidates {
        let dist = candidate.center().distance(from);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((candidate.id(), dist)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: EntityId, x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::new(id, Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_overlap() {
        let a = body(1, 0.0, 0.0, 10.0, 10.0);
        let b = body(2, 5.0, 5.0, 10.0, 10.0);
        let c = body(3, 10.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        // Touching edges do not overlap
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_center_and_clamp() {
        let mut a = body(1, -20.0, 900.0, 48.0, 36.0);
        assert_eq!(a.center(), Vec2::new(4.0, 918.0));
        a.clamp_to(Vec2::new(1024.0, 768.0));
        assert_eq!(a.pos, Vec2::new(0.0, 768.0 - 36.0));
    }

    #[test]
    fn test_centered_constructor() {
        let b = Body::centered(7, Vec2::new(100.0, 100.0), Vec2::new(20.0, 10.0));
        assert_eq!(b.pos, Vec2::new(90.0, 95.0));
        assert_eq!(b.center(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_nearest() {
        let bodies = [
            body(1, 100.0, 0.0, 10.0, 10.0),
            body(2, 20.0, 0.0, 10.0, 10.0),
            body(3, 300.0, 0.0, 10.0, 10.0),
        ];
        let (id, _) = nearest(Vec2::ZERO, bodies.iter()).unwrap();
        assert_eq!(id, 2);
        assert!(nearest::<Body, _>(Vec2::ZERO, std::iter::empty()).is_none());
    }

    #[test]
    fn test_outside() {
        let world = Vec2::new(100.0, 100.0);
        assert!(body(1, 120.0, 50.0, 5.0, 5.0).is_outside(world, 10.0));
        assert!(!body(1, 105.0, 50.0, 5.0, 5.0).is_outside(world, 10.0));
        assert!(body(1, -30.0, 50.0, 5.0, 5.0).is_outside(world, 10.0));
    }
}
