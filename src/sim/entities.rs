//! Combatant and projectile types
//!
//! `Tank` is the single archetype for player, allies, enemies and the boss.
//! Temporary buffs are countdowns on the tank; the effective stats are derived
//! from base stats every frame, so a buff reverts simply by running out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Body, EntityId, HasBody};
use super::country::TankDesign;
use crate::consts::*;

/// Owning faction of a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Ally,
    Enemy,
    Boss,
}

impl Faction {
    /// Player-aligned factions fire friendly bullets
    pub fn is_friendly(self) -> bool {
        matches!(self, Faction::Player | Faction::Ally)
    }
}

/// Behavioural sub-type of an enemy tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Default,
    /// Keeps its distance and calls in telegraphed strikes
    Artillery,
    /// Stationary, periodically deploys swarmers
    Spawner,
    /// Small, fast and aggressive
    Swarmer,
}

impl Variant {
    /// Distance below which the tank backs off and strafes
    pub fn safe_distance(self) -> f32 {
        match self {
            Variant::Default | Variant::Spawner => DEFAULT_SAFE_DISTANCE,
            Variant::Artillery => ARTILLERY_SAFE_DISTANCE,
            Variant::Swarmer => SWARMER_SAFE_DISTANCE,
        }
    }
}

/// Strength tier of an enemy tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    Regular,
    Elite,
    Champion,
}

/// Player special ability, chosen by country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AbilityKind {
    #[default]
    None,
    AegisShield,
    Overdrive,
    EmpBlast,
    GoldenBullet,
    QuickRepair,
}

impl AbilityKind {
    /// Frames before the ability can be used again
    pub fn cooldown(self) -> f32 {
        match self {
            AbilityKind::QuickRepair => 1200.0,
            AbilityKind::Overdrive => 2400.0,
            _ => 1800.0,
        }
    }

    /// Active duration in frames; zero for instant abilities
    pub fn duration(self) -> f32 {
        match self {
            AbilityKind::AegisShield => 300.0,
            AbilityKind::Overdrive => 420.0,
            // Stays armed until the next shot
            AbilityKind::GoldenBullet => 1.0,
            AbilityKind::None | AbilityKind::EmpBlast | AbilityKind::QuickRepair => 0.0,
        }
    }

    pub fn is_instant(self) -> bool {
        matches!(self, AbilityKind::EmpBlast | AbilityKind::QuickRepair)
    }
}

/// Ability state on a tank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub kind: AbilityKind,
    /// Frames until ready
    pub cooldown: f32,
    pub max_cooldown: f32,
    pub active: bool,
    /// Frames of activity left
    pub timer: f32,
}

impl AbilitySlot {
    pub fn new(kind: AbilityKind) -> Self {
        Self {
            kind,
            cooldown: 0.0,
            max_cooldown: kind.cooldown(),
            active: false,
            timer: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.kind != AbilityKind::None && self.cooldown <= 0.0 && !self.active
    }

    pub fn is_active(&self, kind: AbilityKind) -> bool {
        self.active && self.kind == kind
    }
}

/// Adrenaline meter and buff
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Adrenaline {
    /// 0..=ADRENALINE_MAX
    pub meter: f32,
    /// Frames of buff left
    pub timer: f32,
}

impl Adrenaline {
    pub fn is_full(&self) -> bool {
        self.meter >= ADRENALINE_MAX
    }

    pub fn is_active(&self) -> bool {
        self.timer > 0.0
    }

    pub fn fill(&mut self, amount: f32) {
        self.meter = (self.meter + amount).min(ADRENALINE_MAX);
    }
}

/// The common combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub body: Body,
    pub faction: Faction,
    pub variant: Variant,
    pub rank: Rank,
    /// Country code the tank fights for
    pub country: String,
    pub design: TankDesign,

    pub health: f32,
    pub max_health: f32,
    /// Base movement speed (pixels per frame)
    pub speed: f32,
    /// Frames until the next shot
    pub fire_cooldown: f32,
    /// Base frames between shots
    pub max_cooldown: f32,
    pub damage: f32,
    pub piercing: bool,

    /// Soft reference to the current target
    pub target: Option<EntityId>,
    /// -1 or 1
    pub strafe_dir: f32,
    /// 0..=1 spawn-in animation
    pub spawn_anim: f32,
    pub damage_flash: f32,

    pub regen_rate: f32,
    pub regen_timer: f32,
    /// Frames since damage was last taken
    pub since_damage: f32,

    pub invincible: bool,
    pub invincibility_timer: f32,
    pub stun_timer: f32,

    pub ability: AbilitySlot,
    pub adrenaline: Adrenaline,
    /// Frames of rapid-fire power-up left
    pub rapid_fire_timer: f32,
    /// Armed golden-bullet charges from power-ups
    pub golden_charges: u32,

    pub level: u32,
    pub experience: f32,

    /// Frames until a spawner deploys its next brood
    pub brood_timer: f32,
}

impl HasBody for Tank {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Tank {
    pub fn is_player(&self) -> bool {
        self.faction == Faction::Player
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Apply damage, clamping at zero. Returns true if this hit was lethal.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.invincible || !self.is_alive() {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.damage_flash = 10.0;
        self.since_damage = 0.0;
        self.health <= 0.0
    }

    /// Heal, clamping at max health
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    /// Change max health, keeping the health gain/loss proportional to the
    /// difference and re-clamping
    pub fn set_max_health(&mut self, max_health: f32) {
        let delta = max_health - self.max_health;
        self.max_health = max_health.max(1.0);
        self.health = (self.health + delta.max(0.0)).clamp(0.0, self.max_health);
    }

    /// Stun for at least `frames`
    pub fn stun(&mut self, frames: f32) {
        self.stun_timer = self.stun_timer.max(frames);
    }

    /// Grant invincibility for at least `frames`
    pub fn grant_invincibility(&mut self, frames: f32) {
        self.invincible = true;
        self.invincibility_timer = self.invincibility_timer.max(frames);
    }

    /// Movement speed after temporary buffs
    pub fn effective_speed(&self) -> f32 {
        let mut speed = self.speed;
        if self.ability.is_active(AbilityKind::Overdrive) {
            speed *= 1.5;
        }
        speed
    }

    /// Frames between shots after temporary buffs
    pub fn effective_cooldown(&self) -> f32 {
        let mut cooldown = self.max_cooldown;
        if self.ability.is_active(AbilityKind::Overdrive) {
            cooldown *= 0.5;
        }
        if self.rapid_fire_timer > 0.0 {
            cooldown *= 0.5;
        }
        if self.adrenaline.is_active() {
            cooldown *= 0.5;
        }
        cooldown
    }

    /// Whether the next shot pierces
    pub fn effective_piercing(&self) -> bool {
        self.piercing || self.adrenaline.is_active()
    }

    /// Whether the next shot is a golden round
    pub fn golden_armed(&self) -> bool {
        self.ability.is_active(AbilityKind::GoldenBullet) || self.golden_charges > 0
    }

    /// Experience needed to reach the next level
    pub fn xp_threshold(&self, xp_per_level: f32) -> f32 {
        xp_per_level * self.level as f32
    }
}

/// Which side a bullet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Player and ally fire
    Friendly,
    Hostile,
}

/// Visual tag for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletKind {
    Player,
    Golden,
    Ally,
    Enemy,
    Boss,
    Shrapnel,
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub vel: Vec2,
    pub damage: f32,
    pub side: Side,
    pub kind: BulletKind,
    pub piercing: bool,
    /// Targets already damaged (piercing rounds hit each target once)
    #[serde(default)]
    pub hits: Vec<EntityId>,
    /// Recent positions, newest first
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl HasBody for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Bullet {
    /// Advance and record the trail
    pub fn advance(&mut self, dt: f32) {
        self.trail.insert(0, self.body.center());
        self.trail.truncate(BULLET_TRAIL_LENGTH);
        self.body.pos += self.vel * dt;
    }

    /// Whether this bullet may damage `id` now
    pub fn can_hit(&self, id: EntityId) -> bool {
        !self.hits.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::{TankSpec, create_tank};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player() -> Tank {
        let mut rng = Pcg32::seed_from_u64(1);
        create_tank(&mut rng, 1, &TankSpec::player("US"), Vec2::new(1024.0, 768.0))
    }

    #[test]
    fn test_damage_and_heal_clamp() {
        let mut tank = player();
        assert!(!tank.take_damage(30.0));
        assert_eq!(tank.health, 70.0);
        tank.heal(500.0);
        assert_eq!(tank.health, tank.max_health);
        assert!(tank.take_damage(1000.0));
        assert_eq!(tank.health, 0.0);
        // Dead tanks take no further damage
        assert!(!tank.take_damage(10.0));
    }

    #[test]
    fn test_invincible_ignores_damage() {
        let mut tank = player();
        tank.grant_invincibility(60.0);
        assert!(!tank.take_damage(500.0));
        assert_eq!(tank.health, 100.0);
    }

    #[test]
    fn test_buffs_derive_stats() {
        let mut tank = player();
        let base_cd = tank.effective_cooldown();
        tank.rapid_fire_timer = 10.0;
        assert_eq!(tank.effective_cooldown(), base_cd * 0.5);
        tank.adrenaline.timer = 10.0;
        assert_eq!(tank.effective_cooldown(), base_cd * 0.25);
        assert!(tank.effective_piercing());
        tank.rapid_fire_timer = 0.0;
        tank.adrenaline.timer = 0.0;
        assert_eq!(tank.effective_cooldown(), base_cd);
        assert!(!tank.effective_piercing());
    }

    #[test]
    fn test_set_max_health_keeps_clamp() {
        let mut tank = player();
        tank.health = 50.0;
        tank.set_max_health(120.0);
        assert_eq!(tank.health, 70.0);
        tank.set_max_health(40.0);
        assert_eq!(tank.health, 40.0);
    }
}
