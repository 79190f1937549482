//! Hazards, pickups and arena obstacles
//!
//! Each type is self-contained: its own timers and arming/detonation rules.
//! The step decides what a detonation does to the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Body, EntityId, HasBody};

macro_rules! impl_has_body {
    ($($ty:ty),* $(,)?) => {
        $(impl HasBody for $ty {
            fn body(&self) -> &Body {
                &self.body
            }
        })*
    };
}

/// Proximity mine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mine {
    pub body: Body,
    pub armed: bool,
    pub arm_timer: f32,
    pub life: f32,
}

impl Mine {
    /// Count down arming and lifetime; returns false once expired
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.armed {
            self.arm_timer -= dt;
            if self.arm_timer <= 0.0 {
                self.armed = true;
            }
        }
        self.life -= dt;
        self.life > 0.0
    }
}

/// Homing suicide drone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KamikazeDrone {
    pub body: Body,
    pub health: f32,
    pub speed: f32,
    /// Soft reference to the hunted tank
    pub target: EntityId,
    pub stun_timer: f32,
}

impl KamikazeDrone {
    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

/// Power-up effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Timed fire-rate buff
    RapidFire,
    /// Arms one golden-bullet charge
    GoldenRound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
    /// Frames before the pickup vanishes
    pub life: f32,
    /// Frames the buff lasts once collected
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceOrb {
    pub body: Body,
    pub value: f32,
    pub life: f32,
}

/// Telegraph phase of an artillery strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikePhase {
    /// Reticle follows its quarry
    Sweeping,
    /// Reticle fixed, detonation imminent
    Locking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtilleryTarget {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub timer: f32,
    pub max_timer: f32,
    pub phase: StrikePhase,
    pub damage: f32,
}

impl ArtilleryTarget {
    /// Count down; switches to locking halfway. Returns true on detonation.
    pub fn update(&mut self, dt: f32, quarry: Option<Vec2>) -> bool {
        self.timer -= dt;
        if self.phase == StrikePhase::Sweeping {
            if let Some(quarry) = quarry {
                let step = (quarry - self.pos).clamp_length_max(1.5 * dt);
                self.pos += step;
            }
            if self.timer < self.max_timer / 2.0 {
                self.phase = StrikePhase::Locking;
            }
        }
        self.timer <= 0.0
    }
}

/// Post-death delayed detonation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MartyrsBeacon {
    pub id: EntityId,
    pub pos: Vec2,
    pub timer: f32,
    pub max_timer: f32,
}

/// Telegraphed solar flare strike
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarFlareWarning {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub timer: f32,
    pub max_timer: f32,
    pub damage: f32,
}

/// Gravity well that drags combatants and pickups toward its core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackHole {
    pub id: EntityId,
    pub pos: Vec2,
    pub pull_radius: f32,
    pub core_radius: f32,
    /// Pull in pixels per frame at the core
    pub strength: f32,
    pub life: f32,
}

impl BlackHole {
    /// Displacement applied this frame to something centred at `point`
    pub fn pull(&self, point: Vec2, dt: f32) -> Vec2 {
        let delta = self.pos - point;
        let dist = delta.length();
        if dist >= self.pull_radius || dist <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let falloff = 1.0 - dist / self.pull_radius;
        (delta / dist * self.strength * falloff * dt).clamp_length_max(dist)
    }

    pub fn in_core(&self, point: Vec2) -> bool {
        point.distance(self.pos) < self.core_radius
    }
}

/// Expanding stun wave from the EMP ability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpBlast {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub life: f32,
    pub max_life: f32,
    /// Entities already stunned by this wave
    pub affected: Vec<EntityId>,
}

impl EmpBlast {
    /// Grow the wave; returns false once spent
    pub fn update(&mut self, dt: f32) -> bool {
        self.life -= dt;
        let progress = (1.0 - self.life / self.max_life).clamp(0.0, 1.0);
        self.radius = self.max_radius * progress;
        self.life > 0.0
    }
}

/// Drifting rock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: Body,
    pub vel: Vec2,
    pub health: f32,
    pub rotation: f32,
    pub spin: f32,
}

/// Static, indestructible obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceDebris {
    pub body: Body,
}

/// Destructible cover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
}

/// Remains of a building; slows tanks crossing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubble {
    pub body: Body,
}

impl_has_body!(
    Mine,
    KamikazeDrone,
    PowerUp,
    ExperienceOrb,
    Asteroid,
    SpaceDebris,
    Building,
    Rubble,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mine_arms_then_expires() {
        let mut mine = Mine {
            body: Body::new(1, Vec2::ZERO, Vec2::splat(12.0)),
            armed: false,
            arm_timer: 2.0,
            life: 4.0,
        };
        assert!(mine.update(1.0));
        assert!(!mine.armed);
        assert!(mine.update(1.0));
        assert!(mine.armed);
        assert!(mine.update(1.0));
        assert!(!mine.update(1.0));
    }

    #[test]
    fn test_artillery_phases() {
        let mut strike = ArtilleryTarget {
            id: 1,
            pos: Vec2::ZERO,
            radius: 80.0,
            timer: 10.0,
            max_timer: 10.0,
            phase: StrikePhase::Sweeping,
            damage: 40.0,
        };
        assert!(!strike.update(2.0, Some(Vec2::new(100.0, 0.0))));
        assert_eq!(strike.phase, StrikePhase::Sweeping);
        assert!((strike.pos.x - 3.0).abs() < 1e-4);

        assert!(!strike.update(4.0, Some(Vec2::new(100.0, 0.0))));
        assert_eq!(strike.phase, StrikePhase::Locking);
        let locked = strike.pos;
        assert!(!strike.update(1.0, Some(Vec2::new(500.0, 0.0))));
        assert_eq!(strike.pos, locked);
        assert!(strike.update(3.0, None));
    }

    #[test]
    fn test_black_hole_pull() {
        let hole = BlackHole {
            id: 1,
            pos: Vec2::ZERO,
            pull_radius: 200.0,
            core_radius: 20.0,
            strength: 2.0,
            life: 100.0,
        };
        let near = hole.pull(Vec2::new(50.0, 0.0), 1.0);
        let far = hole.pull(Vec2::new(150.0, 0.0), 1.0);
        assert!(near.x < 0.0 && far.x < 0.0);
        assert!(near.length() > far.length());
        assert_eq!(hole.pull(Vec2::new(250.0, 0.0), 1.0), Vec2::ZERO);
        assert!(hole.in_core(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_emp_expands() {
        let mut emp = EmpBlast {
            id: 1,
            pos: Vec2::ZERO,
            radius: 0.0,
            max_radius: 100.0,
            life: 10.0,
            max_life: 10.0,
            affected: Vec::new(),
        };
        assert!(emp.update(5.0));
        assert!((emp.radius - 50.0).abs() < 1e-4);
        assert!(!emp.update(5.0));
        assert!((emp.radius - 100.0).abs() < 1e-4);
    }
}
