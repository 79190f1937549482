//! Tank Arena - simulation core of a top-down arena combat game
//!
//! Core modules:
//! - `sim`: Simulation step (entities, AI, spawning, collisions, game state)
//! - `session`: Fixed-timestep scheduling, player intents, snapshot publishing
//! - `persistence`: Key-value storage for leaderboard and profile records
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use audio::{AudioSink, SoundEffect};
pub use highscores::HighScores;
pub use session::Session;
pub use settings::{GameMod, Profile};
pub use snapshot::Snapshot;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
///
/// Durations are in frames (one frame = 1/60 s); distances in world pixels.
pub mod consts {
    /// Nominal frame rate the step is tuned for
    pub const FPS: f32 = 60.0;
    /// Milliseconds per nominal frame
    pub const MS_PER_FRAME: f32 = 1000.0 / FPS;
    /// Largest frame delta accepted by the step (3x nominal)
    pub const MAX_FRAME_DELTA: f32 = 3.0;

    /// Default arena dimensions
    pub const WORLD_WIDTH: f32 = 1024.0;
    pub const WORLD_HEIGHT: f32 = 768.0;

    /// Tank footprints
    pub const TANK_WIDTH: f32 = 48.0;
    pub const TANK_HEIGHT: f32 = 36.0;
    pub const BOSS_WIDTH: f32 = 96.0;
    pub const BOSS_HEIGHT: f32 = 72.0;
    pub const SWARMER_WIDTH: f32 = 28.0;
    pub const SWARMER_HEIGHT: f32 = 22.0;

    /// Health regeneration
    pub const HEALTH_REGEN_DELAY: f32 = 300.0;
    pub const HEALTH_REGEN_INTERVAL: f32 = 60.0;

    /// Kill streak window
    pub const KILL_STREAK_RESET_TIME: f32 = 180.0;
    /// Kills per multiplier tier
    pub const STREAK_TIER_SIZE: u32 = 5;

    /// Shield rescue
    pub const SHIELD_RESTORE_FRACTION: f32 = 0.5;
    pub const SHIELD_INVINCIBILITY: f32 = 180.0;

    /// Projectiles
    pub const PLAYER_BULLET_SPEED: f32 = 12.0;
    pub const ENEMY_BULLET_SPEED: f32 = 6.0;
    pub const BULLET_TRAIL_LENGTH: usize = 5;
    pub const BULLET_BOUNDS_MARGIN: f32 = 10.0;

    /// Enemy behaviour
    pub const DEFAULT_SAFE_DISTANCE: f32 = 150.0;
    pub const ARTILLERY_SAFE_DISTANCE: f32 = 400.0;
    pub const SWARMER_SAFE_DISTANCE: f32 = 40.0;
    pub const BOSS_STANDOFF: f32 = 300.0;
    pub const BOSS_BURST: usize = 8;
    pub const ALLY_LEASH: f32 = 80.0;
    pub const ALLY_OFFSET_X: f32 = 60.0;
    pub const SPAWNER_INTERVAL: f32 = 300.0;
    pub const SPAWNER_BROOD: usize = 2;
    pub const MAX_ENEMIES: usize = 40;

    /// Power-ups
    pub const POWERUP_PICKUP_RADIUS: f32 = 30.0;
    pub const LOW_HEALTH_FRACTION: f32 = 0.2;
    pub const LOW_HEALTH_POWERUP_COOLDOWN: f32 = 1800.0;

    /// Leveling
    pub const ORB_ATTRACTION_RADIUS: f32 = 100.0;
    pub const ORB_ATTRACTION_SPEED: f32 = 3.0;
    pub const ORB_HEAL: f32 = 2.0;
    pub const LEVEL_UP_CHOICES: usize = 3;

    /// Adrenaline
    pub const ADRENALINE_MAX: f32 = 100.0;
    pub const ADRENALINE_DURATION: f32 = 360.0;
    pub const ADRENALINE_PER_KILL: f32 = 10.0;
    pub const ADRENALINE_PER_DRONE: f32 = 4.0;
    pub const ADRENALINE_PER_BOSS: f32 = 50.0;

    /// Martyr's beacon
    pub const BEACON_TIMER: f32 = 180.0;
    pub const BEACON_RADIUS: f32 = 150.0;
    pub const BEACON_DAMAGE: f32 = 500.0;

    /// Boss rewards
    pub const BOSS_ORB_COUNT: usize = 50;
    pub const BOSS_ORB_VALUE: f32 = 50.0;
    pub const BOSS_RESPITE: f32 = 180.0;

    /// Hazard damage
    pub const MINE_DAMAGE: f32 = 50.0;
    pub const DRONE_CONTACT_DAMAGE: f32 = 30.0;
    pub const ASTEROID_CONTACT_DAMAGE: f32 = 25.0;
    pub const BLACK_HOLE_CORE_DAMAGE: f32 = 0.5;
    pub const SHRAPNEL_COUNT: usize = 12;
    pub const SHRAPNEL_DAMAGE: f32 = 20.0;
    pub const SHRAPNEL_SPEED: f32 = 4.0;

    /// EMP stun durations
    pub const EMP_STUN: f32 = 180.0;
    pub const EMP_BOSS_STUN: f32 = 90.0;

    /// Terrain and damage cues
    pub const RUBBLE_SLOWDOWN: f32 = 0.6;
    pub const SMOKE_HEALTH_FRACTION: f32 = 0.3;

    /// Population caps
    pub const MAX_MINES: usize = 8;
    pub const MAX_DRONES: usize = 5;
    pub const MAX_ASTEROIDS: usize = 3;
    pub const MAX_POWERUPS: usize = 3;
    pub const MAX_TIRE_TRACKS: usize = 200;
    pub const MAX_SCORCH_MARKS: usize = 60;
}

/// Centre-to-centre unit vector and distance; `None` when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<(Vec2, f32)> {
    let delta = to - from;
    let dist = delta.length();
    if dist > f32::EPSILON {
        Some((delta / dist, dist))
    } else {
        None
    }
}

/// Unit vector for an angle in radians
#[inline]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector in radians
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to() {
        let (dir, dist) = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0)).unwrap();
        assert!((dist - 5.0).abs() < 1e-5);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(direction_to(Vec2::ONE, Vec2::ONE).is_none());
    }

    #[test]
    fn test_angle_round_trip() {
        let a = 0.75;
        assert!((angle_of(unit_from_angle(a)) - a).abs() < 1e-5);
    }
}
