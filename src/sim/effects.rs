//! Transient visual/physical effects
//!
//! Every effect carries a remaining life and a fixed maximum life, decays
//! linearly each frame and is pruned at zero. Factories here are pure; the
//! caller decides whether the effect also requests a sound.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::unit_from_angle;

/// Explosion particle palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ember {
    Orange,
    OrangeRed,
    Tomato,
    Gold,
}

const EMBERS: [Ember; 4] = [Ember::Orange, Ember::OrangeRed, Ember::Tomato, Ember::Gold];

/// A simple moving particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub life: f32,
    pub ember: Ember,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub size: f32,
    pub particles: Vec<Particle>,
    pub life: f32,
    pub duration: f32,
    /// Current shockwave radius, grows to `size / 2`
    pub shockwave: f32,
    pub shrapnel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuzzleFlash {
    pub pos: Vec2,
    pub angle: f32,
    pub life: f32,
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellCasing {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub spin: f32,
    pub life: f32,
}

/// Text colour cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextTone {
    Score,
    Boss,
    LevelUp,
    Streak,
    Warning,
    Cheat,
    Heal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub tone: TextTone,
    pub life: f32,
    pub max_life: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorchMark {
    pub pos: Vec2,
    pub radius: f32,
    pub life: f32,
    pub max_life: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TireTrackPoint {
    pub pos: Vec2,
    /// 1.0 fresh, fades to 0
    pub life: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smoke {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub life: f32,
    pub max_life: f32,
}

/// Screen shake request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub magnitude: f32,
    pub duration: f32,
}

impl ScreenShake {
    /// Keep the stronger of the current and requested shake
    pub fn trigger(&mut self, magnitude: f32, duration: f32) {
        self.magnitude = self.magnitude.max(magnitude);
        self.duration = self.duration.max(duration);
    }

    pub fn decay(&mut self, dt: f32) {
        if self.duration > 0.0 {
            self.duration = (self.duration - dt).max(0.0);
        } else {
            self.magnitude = 0.0;
        }
    }
}

/// All transient effect collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    pub explosions: Vec<Explosion>,
    pub muzzle_flashes: Vec<MuzzleFlash>,
    pub sparks: Vec<Particle>,
    pub shell_casings: Vec<ShellCasing>,
    pub floating_texts: Vec<FloatingText>,
    pub scorch_marks: Vec<ScorchMark>,
    pub tire_tracks: Vec<TireTrackPoint>,
    pub smoke: Vec<Smoke>,
    pub screen_shake: ScreenShake,
}

// --- Factories ---

pub fn explosion(rng: &mut impl Rng, pos: Vec2, size: f32, shrapnel: bool) -> Explosion {
    let count = if shrapnel { 50 } else { 30 };
    let max_speed = if shrapnel { 8.0 } else { 5.0 };
    let particles = (0..count)
        .map(|_| {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = rng.random::<f32>() * max_speed + 1.0;
            Particle {
                pos,
                vel: unit_from_angle(angle) * speed,
                size: rng.random::<f32>() * 3.0 + 1.0,
                life: 30.0,
                ember: EMBERS[rng.random_range(0..EMBERS.len())],
            }
        })
        .collect();
    Explosion {
        pos,
        size,
        particles,
        life: 30.0,
        duration: 30.0,
        shockwave: 0.0,
        shrapnel,
    }
}

pub fn sparks(rng: &mut impl Rng, pos: Vec2, count: usize) -> impl Iterator<Item = Particle> + '_ {
    (0..count).map(move |_| {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = rng.random::<f32>() * 3.0 + 1.0;
        Particle {
            pos,
            vel: unit_from_angle(angle) * speed,
            size: rng.random::<f32>() * 2.0 + 1.0,
            life: (rng.random::<f32>() * 10.0 + 5.0).floor(),
            ember: Ember::Gold,
        }
    })
}

pub fn shell_casing(rng: &mut impl Rng, pos: Vec2, fire_angle: f32) -> ShellCasing {
    let eject = fire_angle + std::f32::consts::FRAC_PI_2 + (rng.random::<f32>() - 0.5) * 0.5;
    ShellCasing {
        pos,
        vel: unit_from_angle(eject) * 2.0 - Vec2::new(0.0, 2.0),
        rotation: 0.0,
        spin: (rng.random::<f32>() - 0.5) * 0.5,
        life: 60.0,
    }
}

pub fn muzzle_flash(pos: Vec2, angle: f32) -> MuzzleFlash {
    MuzzleFlash {
        pos,
        angle,
        life: 5.0,
        duration: 5.0,
    }
}

pub fn floating_text(pos: Vec2, text: impl Into<String>, tone: TextTone, life: f32) -> FloatingText {
    FloatingText {
        pos,
        text: text.into(),
        tone,
        life,
        max_life: life,
    }
}

pub fn scorch_mark(pos: Vec2, radius: f32) -> ScorchMark {
    ScorchMark {
        pos,
        radius,
        life: 900.0,
        max_life: 900.0,
    }
}

pub fn smoke(rng: &mut impl Rng, pos: Vec2) -> Smoke {
    let life = 40.0 + rng.random::<f32>() * 20.0;
    Smoke {
        pos,
        vel: Vec2::new((rng.random::<f32>() - 0.5) * 0.4, -0.4 - rng.random::<f32>() * 0.4),
        size: 4.0 + rng.random::<f32>() * 4.0,
        life,
        max_life: life,
    }
}

// --- Aging ---

impl Effects {
    /// Advance every transient collection and drop the expired
    pub fn age(&mut self, dt: f32) {
        self.screen_shake.decay(dt);

        self.muzzle_flashes.retain_mut(|f| {
            f.life -= dt;
            f.life > 0.0
        });

        self.explosions.retain_mut(|e| {
            for p in &mut e.particles {
                p.pos += p.vel * dt;
                p.vel.y += 0.1 * dt;
                p.size = (p.size - 0.05 * dt).max(0.0);
            }
            e.life -= dt;
            let progress = (1.0 - e.life / e.duration).clamp(0.0, 1.0);
            e.shockwave = e.size * 0.5 * progress;
            e.life > 0.0
        });

        self.smoke.retain_mut(|s| {
            s.life -= dt;
            s.pos += s.vel * dt;
            s.size += 0.05 * dt;
            s.life > 0.0
        });

        self.sparks.retain_mut(|s| {
            s.life -= dt;
            s.pos += s.vel * dt;
            s.life > 0.0
        });

        self.shell_casings.retain_mut(|s| {
            s.life -= dt;
            s.pos += s.vel * dt;
            s.vel.y += 0.1 * dt;
            s.rotation += s.spin * dt;
            s.life > 0.0
        });

        self.tire_tracks.retain_mut(|t| {
            t.life -= 0.005 * dt;
            t.life > 0.0
        });

        self.floating_texts.retain_mut(|t| {
            t.pos.y -= 0.5 * dt;
            t.life -= dt;
            t.life > 0.0
        });

        self.scorch_marks.retain_mut(|m| {
            m.life -= dt;
            m.life > 0.0
        });
    }

    pub fn add_tire_track(&mut self, pos: Vec2, cap: usize) {
        self.tire_tracks.push(TireTrackPoint { pos, life: 1.0 });
        if self.tire_tracks.len() > cap {
            let excess = self.tire_tracks.len() - cap;
            self.tire_tracks.drain(..excess);
        }
    }

    pub fn add_scorch_mark(&mut self, mark: ScorchMark, cap: usize) {
        self.scorch_marks.push(mark);
        if self.scorch_marks.len() > cap {
            self.scorch_marks.remove(0);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_explosion_particles_and_shockwave() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut effects = Effects::default();
        effects.explosions.push(explosion(&mut rng, Vec2::ZERO, 100.0, false));
        effects.explosions.push(explosion(&mut rng, Vec2::ZERO, 100.0, true));
        assert_eq!(effects.explosions[0].particles.len(), 30);
        assert_eq!(effects.explosions[1].particles.len(), 50);

        effects.age(15.0);
        assert_eq!(effects.explosions.len(), 2);
        assert!((effects.explosions[0].shockwave - 25.0).abs() < 1e-3);

        effects.age(15.0);
        assert!(effects.explosions.is_empty());
    }

    #[test]
    fn test_everything_expires() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut effects = Effects::default();
        effects.muzzle_flashes.push(muzzle_flash(Vec2::ZERO, 0.0));
        effects.sparks.extend(sparks(&mut rng, Vec2::ZERO, 10));
        effects.shell_casings.push(shell_casing(&mut rng, Vec2::ZERO, 0.0));
        effects
            .floating_texts
            .push(floating_text(Vec2::new(0.0, 100.0), "+100", TextTone::Score, 60.0));
        effects.add_scorch_mark(scorch_mark(Vec2::ZERO, 20.0), 60);
        effects.add_tire_track(Vec2::ZERO, 200);
        effects.smoke.push(smoke(&mut rng, Vec2::ZERO));
        effects.screen_shake.trigger(8.0, 20.0);

        // Floating text drifts upward
        effects.age(1.0);
        assert!(effects.floating_texts[0].pos.y < 100.0);

        for _ in 0..300 {
            effects.age(3.0);
        }
        assert!(effects.muzzle_flashes.is_empty());
        assert!(effects.sparks.is_empty());
        assert!(effects.shell_casings.is_empty());
        assert!(effects.floating_texts.is_empty());
        assert!(effects.scorch_marks.is_empty());
        assert!(effects.tire_tracks.is_empty());
        assert!(effects.smoke.is_empty());
        assert_eq!(effects.screen_shake, ScreenShake::default());
    }

    #[test]
    fn test_tire_track_cap() {
        let mut effects = Effects::default();
        for i in 0..250 {
            effects.add_tire_track(Vec2::new(i as f32, 0.0), 200);
        }
        assert_eq!(effects.tire_tracks.len(), 200);
        assert_eq!(effects.tire_tracks[0].pos.x, 50.0);
    }
}
