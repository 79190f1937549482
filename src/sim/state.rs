//! World state and core simulation types
//!
//! `GameState` is the single owned aggregate the step mutates. Everything a
//! renderer needs is reachable from here; cross-entity references are plain
//! ids resolved with lookup-or-skip.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{EntityId, HasBody, IdGen, nearest};
use super::country::TankDesign;
use super::effects::Effects;
use super::entities::{Bullet, Tank};
use super::factory::{TankSpec, arena_layout, create_tank};
use super::hazards::{
    ArtilleryTarget, Asteroid, BlackHole, Building, EmpBlast, ExperienceOrb, KamikazeDrone,
    MartyrsBeacon, Mine, PowerUp, Rubble, SolarFlareWarning, SpaceDebris,
};
use super::upgrades::UpgradeKind;
use super::weather::Weather;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::tuning::Tuning;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for a start intent
    #[default]
    Start,
    /// Full simulation
    Playing,
    /// Waiting for an upgrade choice
    LevelUpPause,
    /// Only the martyr's beacon runs
    DeathAnimation,
    /// Run ended
    GameOver,
}

impl GameStatus {
    /// Whether the frame loop should keep being scheduled
    pub fn is_running(self) -> bool {
        matches!(
            self,
            GameStatus::Playing | GameStatus::LevelUpPause | GameStatus::DeathAnimation
        )
    }
}

/// Something the step reports to the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    /// A shield absorbed a lethal hit
    ShieldConsumed { remaining: u32 },
    /// The run is over; the score should be recorded
    RunEnded { score: u64 },
    LevelUp { level: u32 },
    BossWave { difficulty: u32 },
}

/// Gameplay modifiers selected before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mods {
    pub hard_mode: bool,
    pub champion_rush: bool,
    pub ally_support: bool,
    pub glass_cannon: bool,
}

/// Everything `start` needs from the persisted profile
#[derive(Debug, Clone, Default)]
pub struct RunSetup {
    pub country: String,
    pub design: Option<TankDesign>,
    pub mods: Mods,
    pub shields: u32,
}

/// Independent spawn countdowns (frames)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnTimers {
    pub enemy: f32,
    pub mine: f32,
    pub drone: f32,
    pub power_up: f32,
    pub asteroid: f32,
    pub solar_flare: f32,
    pub black_hole: f32,
    /// Quiet period after a boss dies
    pub boss_respite: f32,
}

impl SpawnTimers {
    fn roll(rng: &mut impl Rng) -> Self {
        Self {
            enemy: 120.0,
            mine: rng.random_range(1200.0..1800.0),
            drone: rng.random_range(600.0..900.0),
            power_up: rng.random_range(900.0..1500.0),
            asteroid: rng.random_range(900.0..1500.0),
            solar_flare: rng.random_range(1500.0..2400.0),
            black_hole: rng.random_range(2400.0..3600.0),
            boss_respite: 0.0,
        }
    }
}

/// Complete world state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub status: GameStatus,
    pub mods: Mods,

    pub player: Option<Tank>,
    pub allies: Vec<Tank>,
    pub enemies: Vec<Tank>,
    pub boss: Option<Tank>,
    pub bullets: Vec<Bullet>,

    pub drones: Vec<KamikazeDrone>,
    pub mines: Vec<Mine>,
    pub power_ups: Vec<PowerUp>,
    pub orbs: Vec<ExperienceOrb>,
    pub artillery_targets: Vec<ArtilleryTarget>,
    pub beacon: Option<MartyrsBeacon>,
    pub solar_flares: Vec<SolarFlareWarning>,
    pub black_holes: Vec<BlackHole>,
    pub emp_blasts: Vec<EmpBlast>,
    pub asteroids: Vec<Asteroid>,
    pub space_debris: Vec<SpaceDebris>,
    pub buildings: Vec<Building>,
    pub rubble: Vec<Rubble>,

    pub effects: Effects,
    pub weather: Weather,

    pub score: u64,
    /// Elapsed run time in seconds
    pub time: f32,
    pub difficulty: u32,
    /// Highest tier that already produced a boss wave
    pub last_boss_tier: u32,
    pub timers: SpawnTimers,
    pub kill_streak: u32,
    /// Frames since the last kill
    pub streak_timer: f32,
    pub low_health_cooldown: f32,

    /// Pending level-up choices (non-empty only in `LevelUpPause`)
    pub upgrade_choices: Vec<UpgradeKind>,

    /// Persisted across sessions
    pub shields: u32,
    pub beacon_purchased: bool,

    pub ids: IdGen,
    /// Reports for the session, drained after every frame
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle state with the default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let weather = Weather::new(&tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            status: GameStatus::Start,
            mods: Mods::default(),
            player: None,
            allies: Vec::new(),
            enemies: Vec::new(),
            boss: None,
            bullets: Vec::new(),
            drones: Vec::new(),
            mines: Vec::new(),
            power_ups: Vec::new(),
            orbs: Vec::new(),
            artillery_targets: Vec::new(),
            beacon: None,
            solar_flares: Vec::new(),
            black_holes: Vec::new(),
            emp_blasts: Vec::new(),
            asteroids: Vec::new(),
            space_debris: Vec::new(),
            buildings: Vec::new(),
            rubble: Vec::new(),
            effects: Effects::default(),
            weather,
            score: 0,
            time: 0.0,
            difficulty: 1,
            last_boss_tier: 0,
            timers: SpawnTimers::default(),
            kill_streak: 0,
            streak_timer: 0.0,
            low_health_cooldown: 0.0,
            upgrade_choices: Vec::new(),
            shields: 0,
            beacon_purchased: false,
            ids: IdGen::default(),
            events: Vec::new(),
        }
    }

    /// Reset the world and begin a run
    ///
    /// The RNG stream carries over so consecutive runs differ.
    pub fn start(&mut self, setup: &RunSetup) {
        let tuning = std::mem::take(&mut self.tuning);
        let mut fresh = Self::with_tuning(self.seed, tuning);
        fresh.rng = self.rng.clone();
        *self = fresh;

        self.mods = setup.mods;
        self.shields = setup.shields;
        self.timers = SpawnTimers::roll(&mut self.rng);
        let world = self.world_size();

        let id = self.alloc_id();
        let spec = TankSpec::player(&setup.country).with_design(setup.design);
        let mut player = create_tank(&mut self.rng, id, &spec, world);
        if self.mods.glass_cannon {
            player.max_health *= 0.5;
            player.health = player.max_health;
            player.damage *= 2.0;
        }
        let player_center = player.body.center();
        self.player = Some(player);

        if self.mods.ally_support {
            self.spawn_ally(player_center + Vec2::new(-ALLY_OFFSET_X, 0.0));
        }

        let (debris, buildings) = arena_layout(
            &mut self.rng,
            &mut self.ids,
            world,
            self.tuning.space_debris_count,
            self.tuning.building_count,
        );
        self.space_debris = debris;
        self.buildings = buildings;

        self.status = GameStatus::Playing;
        log::info!(
            "Run started (country {}, mods {:?}, shields {})",
            setup.country,
            self.mods,
            self.shields
        );
    }

    /// Allocate a new entity ID
    pub fn alloc_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    pub fn world_size(&self) -> Vec2 {
        self.tuning.world_size()
    }

    pub fn play(&mut self, sound: SoundEffect) {
        self.events.push(GameEvent::Sound(sound));
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Score multiplier from the current kill streak
    pub fn streak_multiplier(&self) -> f32 {
        1.0 + (self.kill_streak / STREAK_TIER_SIZE) as f32 * 0.1
    }

    /// Maximum concurrent allies for the selected mods
    pub fn ally_cap(&self) -> usize {
        if self.mods.ally_support {
            self.tuning.max_allies_with_support
        } else {
            self.tuning.max_allies
        }
    }

    /// Add an ally tank centred at `center`
    pub fn spawn_ally(&mut self, center: Vec2) {
        let country = self
            .player
            .as_ref()
            .map(|p| p.country.clone())
            .unwrap_or_default();
        let id = self.alloc_id();
        let world = self.world_size();
        let ally = create_tank(&mut self.rng, id, &TankSpec::ally(&country).at(center), world);
        self.allies.push(ally);
    }

    /// Apply a pending upgrade choice and resume play
    ///
    /// No-op outside `LevelUpPause` or for a kind that was not offered.
    pub fn select_upgrade(&mut self, kind: UpgradeKind) -> bool {
        if self.status != GameStatus::LevelUpPause || !self.upgrade_choices.contains(&kind) {
            return false;
        }
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        kind.apply(player);
        self.upgrade_choices.clear();
        self.status = GameStatus::Playing;
        log::info!("Upgrade selected: {}", kind.key());
        true
    }

    // --- Lookups (stale ids resolve to None) ---

    /// Centre of a hostile (enemy, boss or drone) by id
    pub fn hostile_center(&self, id: EntityId) -> Option<Vec2> {
        self.enemies
            .iter()
            .chain(self.boss.iter())
            .find(|t| t.body.id == id)
            .map(|t| t.body.center())
            .or_else(|| {
                self.drones
                    .iter()
                    .find(|d| d.body.id == id)
                    .map(|d| d.body.center())
            })
    }

    /// Centre of the player or an ally by id
    pub fn friendly_center(&self, id: EntityId) -> Option<Vec2> {
        self.player
            .iter()
            .chain(self.allies.iter())
            .find(|t| t.body.id == id)
            .map(|t| t.body.center())
    }

    /// Nearest hostile to `from` (enemies, boss, drones)
    pub fn nearest_hostile(&self, from: Vec2) -> Option<(EntityId, f32)> {
        let tanks = self
            .enemies
            .iter()
            .chain(self.boss.iter())
            .filter(|t| t.is_alive())
            .map(|t| t as &dyn HasBody);
        let drones = self.drones.iter().map(|d| d as &dyn HasBody);
        nearest(from, tanks.chain(drones))
    }

    /// Nearest friendly tank to `from` (player, allies)
    pub fn nearest_friendly(&self, from: Vec2) -> Option<(EntityId, f32)> {
        nearest(
            from,
            self.player
                .iter()
                .chain(self.allies.iter())
                .filter(|t| t.is_alive()),
        )
    }

    /// Every live entity, in draw order, for renderers
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        self.rubble
            .iter()
            .map(EntityRef::Rubble)
            .chain(self.space_debris.iter().map(EntityRef::Debris))
            .chain(self.buildings.iter().map(EntityRef::Building))
            .chain(self.mines.iter().map(EntityRef::Mine))
            .chain(self.orbs.iter().map(EntityRef::Orb))
            .chain(self.power_ups.iter().map(EntityRef::PowerUp))
            .chain(self.artillery_targets.iter().map(EntityRef::ArtilleryTarget))
            .chain(self.solar_flares.iter().map(EntityRef::SolarFlare))
            .chain(self.black_holes.iter().map(EntityRef::BlackHole))
            .chain(self.asteroids.iter().map(EntityRef::Asteroid))
            .chain(self.player.iter().map(EntityRef::Player))
            .chain(self.allies.iter().map(EntityRef::Ally))
            .chain(self.enemies.iter().map(EntityRef::Enemy))
            .chain(self.boss.iter().map(EntityRef::Boss))
            .chain(self.drones.iter().map(EntityRef::Drone))
            .chain(self.bullets.iter().map(EntityRef::Bullet))
            .chain(self.emp_blasts.iter().map(EntityRef::Emp))
            .chain(self.beacon.iter().map(EntityRef::Beacon))
    }

    /// Find any entity by id
    pub fn find(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities().find(|e| e.id() == id)
    }
}

/// Borrowed view of one entity, one variant per kind
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Player(&'a Tank),
    Ally(&'a Tank),
    Enemy(&'a Tank),
    Boss(&'a Tank),
    Bullet(&'a Bullet),
    Drone(&'a KamikazeDrone),
    Mine(&'a Mine),
    PowerUp(&'a PowerUp),
    Orb(&'a ExperienceOrb),
    ArtilleryTarget(&'a ArtilleryTarget),
    Beacon(&'a MartyrsBeacon),
    SolarFlare(&'a SolarFlareWarning),
    BlackHole(&'a BlackHole),
    Emp(&'a EmpBlast),
    Asteroid(&'a Asteroid),
    Debris(&'a SpaceDebris),
    Building(&'a Building),
    Rubble(&'a Rubble),
}

impl EntityRef<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            EntityRef::Player(t) | EntityRef::Ally(t) | EntityRef::Enemy(t) | EntityRef::Boss(t) => {
                t.body.id
            }
            EntityRef::Bullet(b) => b.body.id,
            EntityRef::Drone(d) => d.body.id,
            EntityRef::Mine(m) => m.body.id,
            EntityRef::PowerUp(p) => p.body.id,
            EntityRef::Orb(o) => o.body.id,
            EntityRef::ArtilleryTarget(a) => a.id,
            EntityRef::Beacon(b) => b.id,
            EntityRef::SolarFlare(f) => f.id,
            EntityRef::BlackHole(h) => h.id,
            EntityRef::Emp(e) => e.id,
            EntityRef::Asteroid(a) => a.body.id,
            EntityRef::Debris(d) => d.body.id,
            EntityRef::Building(b) => b.body.id,
            EntityRef::Rubble(r) => r.body.id,
        }
    }

    pub fn center(&self) -> Vec2 {
        match self {
            EntityRef::Player(t) | EntityRef::Ally(t) | EntityRef::Enemy(t) | EntityRef::Boss(t) => {
                t.body.center()
            }
            EntityRef::Bullet(b) => b.body.center(),
            EntityRef::Drone(d) => d.body.center(),
            EntityRef::Mine(m) => m.body.center(),
            EntityRef::PowerUp(p) => p.body.center(),
            EntityRef::Orb(o) => o.body.center(),
            EntityRef::ArtilleryTarget(a) => a.pos,
            EntityRef::Beacon(b) => b.pos,
            EntityRef::SolarFlare(f) => f.pos,
            EntityRef::BlackHole(h) => h.pos,
            EntityRef::Emp(e) => e.pos,
            EntityRef::Asteroid(a) => a.body.center(),
            EntityRef::Debris(d) => d.body.center(),
            EntityRef::Building(b) => b.body.center(),
            EntityRef::Rubble(r) => r.body.center(),
        }
    }
}
