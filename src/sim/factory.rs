//! Entity factories
//!
//! Pure constructors: given semantic parameters they return fully initialized
//! values with no references into the world. Nothing here can fail; unknown
//! country codes fall back to the default design.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::collision::{Body, EntityId, IdGen};
use super::country::{COUNTRIES, Palette, TankDesign, country_or_default};
use super::entities::{
    AbilityKind, AbilitySlot, Adrenaline, Bullet, BulletKind, Faction, Rank, Side, Tank, Variant,
};
use super::hazards::{
    ArtilleryTarget, Asteroid, BlackHole, Building, EmpBlast, ExperienceOrb, KamikazeDrone,
    MartyrsBeacon, Mine, PowerUp, PowerUpKind, SolarFlareWarning, SpaceDebris, StrikePhase,
};
use crate::consts::*;

/// Semantic description of a tank to build
#[derive(Debug, Clone)]
pub struct TankSpec<'a> {
    pub faction: Faction,
    /// Country code; `None` picks a random country for hostiles
    pub country: Option<&'a str>,
    pub variant: Variant,
    pub rank: Rank,
    pub difficulty: u32,
    pub hard_mode: bool,
    /// Player colour override
    pub design: Option<TankDesign>,
    /// Spawn centre; `None` uses the role's default placement
    pub center: Option<Vec2>,
}

impl<'a> TankSpec<'a> {
    fn new(faction: Faction) -> Self {
        Self {
            faction,
            country: None,
            variant: Variant::Default,
            rank: Rank::Regular,
            difficulty: 1,
            hard_mode: false,
            design: None,
            center: None,
        }
    }

    pub fn player(country: &'a str) -> Self {
        Self {
            country: Some(country),
            ..Self::new(Faction::Player)
        }
    }

    pub fn ally(country: &'a str) -> Self {
        Self {
            country: Some(country),
            ..Self::new(Faction::Ally)
        }
    }

    pub fn enemy(difficulty: u32, variant: Variant, rank: Rank) -> Self {
        Self {
            difficulty,
            variant,
            rank,
            ..Self::new(Faction::Enemy)
        }
    }

    pub fn boss(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::new(Faction::Boss)
        }
    }

    pub fn at(mut self, center: Vec2) -> Self {
        self.center = Some(center);
        self
    }

    pub fn hard(mut self, hard_mode: bool) -> Self {
        self.hard_mode = hard_mode;
        self
    }

    pub fn with_design(mut self, design: Option<TankDesign>) -> Self {
        self.design = design;
        self
    }
}

/// Base stats before placement
struct Stats {
    health: f32,
    speed: f32,
    cooldown: f32,
    damage: f32,
}

fn hostile_stats(rng: &mut impl Rng, spec: &TankSpec) -> Stats {
    let d = spec.difficulty.max(1) as f32;
    if spec.faction == Faction::Boss {
        return Stats {
            health: 10000.0 + 1000.0 * d,
            speed: 0.8,
            cooldown: 40.0,
            damage: 50.0,
        };
    }

    let mut health = match spec.rank {
        Rank::Champion => 1000.0,
        Rank::Elite => 250.0 + 10.0 * d,
        Rank::Regular => 100.0 + 5.0 * d,
    };
    let mut speed = 1.2 + d / 15.0 + rng.random::<f32>() * 0.4;
    let mut cooldown = 70.0 - d;
    let mut damage = 18.0 + d;

    match spec.variant {
        Variant::Artillery => {
            health *= 1.5;
            speed = 0.5;
            cooldown = 480.0;
            damage = 100.0;
        }
        Variant::Spawner => health *= 2.0,
        Variant::Swarmer => {
            health *= 0.4;
            speed *= 1.6;
            damage *= 0.5;
        }
        Variant::Default => {}
    }
    match spec.rank {
        Rank::Champion => damage *= 1.5,
        Rank::Elite => damage *= 1.2,
        Rank::Regular => {}
    }

    if spec.hard_mode && spec.variant != Variant::Artillery {
        speed *= 1.2;
        cooldown *= 0.8;
    }
    Stats {
        health,
        speed,
        cooldown: cooldown.max(10.0),
        damage,
    }
}

fn size_for(spec: &TankSpec) -> Vec2 {
    match (spec.faction, spec.variant) {
        (Faction::Boss, _) => Vec2::new(BOSS_WIDTH, BOSS_HEIGHT),
        (_, Variant::Swarmer) => Vec2::new(SWARMER_WIDTH, SWARMER_HEIGHT),
        _ => Vec2::new(TANK_WIDTH, TANK_HEIGHT),
    }
}

/// Build a tank from a `TankSpec`
pub fn create_tank(rng: &mut impl Rng, id: EntityId, spec: &TankSpec, world: Vec2) -> Tank {
    let friendly = spec.faction.is_friendly();
    let mut stats = if friendly {
        Stats {
            health: 100.0,
            speed: 3.0,
            cooldown: 25.0,
            damage: if spec.faction == Faction::Player { 30.0 } else { 20.0 },
        }
    } else {
        hostile_stats(rng, spec)
    };
    if spec.hard_mode && !friendly {
        stats.health *= 1.5;
    }

    let country = match (spec.faction, spec.country) {
        (Faction::Boss, _) => country_or_default(""),
        (_, Some(code)) => country_or_default(code),
        (_, None) => COUNTRIES.choose(rng).unwrap_or(country_or_default("")),
    };
    let design = match spec.faction {
        Faction::Boss => Palette::Boss.design(),
        _ => spec.design.unwrap_or_else(|| country.palette.design()),
    };
    let ability = if spec.faction == Faction::Player {
        country.ability
    } else {
        AbilityKind::None
    };

    let size = size_for(spec);
    let center = spec.center.unwrap_or_else(|| match spec.faction {
        Faction::Player | Faction::Ally => world * 0.5,
        Faction::Boss => Vec2::new(world.x * 0.5, size.y),
        Faction::Enemy => edge_point(rng, world, size),
    });
    let mut body = Body::centered(id, center, size);
    body.clamp_to(world);

    let fire_cooldown = if friendly {
        0.0
    } else {
        rng.random::<f32>() * stats.cooldown
    };

    Tank {
        body,
        faction: spec.faction,
        variant: spec.variant,
        rank: spec.rank,
        country: country.code.to_string(),
        design,
        health: stats.health,
        max_health: stats.health,
        speed: stats.speed,
        fire_cooldown,
        max_cooldown: stats.cooldown,
        damage: stats.damage,
        piercing: false,
        target: None,
        strafe_dir: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
        spawn_anim: 0.0,
        damage_flash: 0.0,
        regen_rate: if spec.faction == Faction::Player { 2.0 } else { 0.0 },
        regen_timer: 0.0,
        since_damage: 0.0,
        invincible: false,
        invincibility_timer: 0.0,
        stun_timer: 0.0,
        ability: AbilitySlot::new(ability),
        adrenaline: Adrenaline::default(),
        rapid_fire_timer: 0.0,
        golden_charges: 0,
        level: 1,
        experience: 0.0,
        brood_timer: if spec.variant == Variant::Spawner {
            SPAWNER_INTERVAL
        } else {
            0.0
        },
    }
}

/// Centre of a spawn point just inside a random arena edge
pub fn edge_point(rng: &mut impl Rng, world: Vec2, size: Vec2) -> Vec2 {
    let half = size * 0.5;
    let x = rng.random_range(half.x..(world.x - half.x).max(half.x + 1.0));
    let y = rng.random_range(half.y..(world.y - half.y).max(half.y + 1.0));
    match rng.random_range(0..4) {
        0 => Vec2::new(x, half.y),
        1 => Vec2::new(world.x - half.x, y),
        2 => Vec2::new(x, world.y - half.y),
        _ => Vec2::new(half.x, y),
    }
}

/// Uniform point at least `margin` away from every edge
pub fn interior_point(rng: &mut impl Rng, world: Vec2, margin: f32) -> Vec2 {
    let max = (world - Vec2::splat(margin)).max(Vec2::splat(margin + 1.0));
    Vec2::new(
        rng.random_range(margin..max.x),
        rng.random_range(margin..max.y),
    )
}

// --- Projectiles ---

/// Build a bullet travelling with `vel` from `origin` (centre)
pub fn create_bullet(
    id: EntityId,
    origin: Vec2,
    vel: Vec2,
    damage: f32,
    kind: BulletKind,
    piercing: bool,
) -> Bullet {
    let (size, side) = match kind {
        BulletKind::Player => (6.0, Side::Friendly),
        BulletKind::Ally => (6.0, Side::Friendly),
        BulletKind::Golden => (10.0, Side::Friendly),
        BulletKind::Enemy => (6.0, Side::Hostile),
        BulletKind::Boss => (10.0, Side::Hostile),
        BulletKind::Shrapnel => (5.0, Side::Hostile),
    };
    Bullet {
        body: Body::centered(id, origin, Vec2::splat(size)),
        vel,
        damage,
        side,
        kind,
        piercing,
        hits: Vec::new(),
        trail: Vec::with_capacity(BULLET_TRAIL_LENGTH),
    }
}

// --- Hazards and pickups ---

pub fn create_drone(
    rng: &mut impl Rng,
    id: EntityId,
    difficulty: u32,
    target: EntityId,
    world: Vec2,
) -> KamikazeDrone {
    let d = difficulty.max(1) as f32;
    let size = Vec2::splat(20.0);
    KamikazeDrone {
        body: Body::centered(id, edge_point(rng, world, size), size),
        health: 20.0 + 5.0 * d,
        speed: 1.8 + 0.2 * d,
        target,
        stun_timer: 0.0,
    }
}

pub fn create_mine(rng: &mut impl Rng, id: EntityId, world: Vec2) -> Mine {
    let size = Vec2::splat(16.0);
    Mine {
        body: Body::centered(id, interior_point(rng, world, 50.0), size),
        armed: false,
        arm_timer: 120.0,
        life: 1800.0,
    }
}

pub fn create_orb(id: EntityId, center: Vec2, value: f32) -> ExperienceOrb {
    ExperienceOrb {
        body: Body::centered(id, center, Vec2::splat(10.0)),
        value,
        life: 600.0,
    }
}

/// Scatter `count` orbs around `center`
pub fn orb_shower(
    rng: &mut impl Rng,
    ids: &mut IdGen,
    center: Vec2,
    count: usize,
    value: f32,
) -> Vec<ExperienceOrb> {
    (0..count)
        .map(|_| {
            let offset = Vec2::new(
                (rng.random::<f32>() - 0.5) * 120.0,
                (rng.random::<f32>() - 0.5) * 120.0,
            );
            create_orb(ids.next_id(), center + offset, value)
        })
        .collect()
}

pub fn random_power_up_kind(rng: &mut impl Rng) -> PowerUpKind {
    if rng.random_bool(0.5) {
        PowerUpKind::RapidFire
    } else {
        PowerUpKind::GoldenRound
    }
}

pub fn create_power_up(id: EntityId, kind: PowerUpKind, center: Vec2) -> PowerUp {
    PowerUp {
        body: Body::centered(id, center, Vec2::splat(24.0)),
        kind,
        life: 600.0,
        duration: match kind {
            PowerUpKind::RapidFire => 300.0,
            PowerUpKind::GoldenRound => 0.0,
        },
    }
}

/// Rock entering from an edge and drifting toward the arena interior
pub fn create_asteroid(rng: &mut impl Rng, id: EntityId, world: Vec2) -> Asteroid {
    let size = Vec2::splat(rng.random_range(30.0..50.0));
    let start = edge_point(rng, world, size);
    let aim = interior_point(rng, world, 150.0);
    let speed = rng.random_range(1.0..2.0);
    Asteroid {
        body: Body::centered(id, start, size),
        vel: (aim - start).normalize_or_zero() * speed,
        health: 60.0,
        rotation: 0.0,
        spin: (rng.random::<f32>() - 0.5) * 0.05,
    }
}

pub fn create_artillery_target(id: EntityId, pos: Vec2) -> ArtilleryTarget {
    ArtilleryTarget {
        id,
        pos,
        radius: 80.0,
        timer: 240.0,
        max_timer: 240.0,
        phase: StrikePhase::Sweeping,
        damage: 40.0,
    }
}

pub fn create_solar_flare(rng: &mut impl Rng, id: EntityId, world: Vec2) -> SolarFlareWarning {
    SolarFlareWarning {
        id,
        pos: interior_point(rng, world, 110.0),
        radius: 110.0,
        timer: 150.0,
        max_timer: 150.0,
        damage: 35.0,
    }
}

pub fn create_black_hole(rng: &mut impl Rng, id: EntityId, world: Vec2) -> BlackHole {
    BlackHole {
        id,
        pos: interior_point(rng, world, 150.0),
        pull_radius: 220.0,
        core_radius: 20.0,
        strength: 2.0,
        life: 600.0,
    }
}

pub fn create_emp(id: EntityId, pos: Vec2) -> EmpBlast {
    EmpBlast {
        id,
        pos,
        radius: 0.0,
        max_radius: 260.0,
        life: 30.0,
        max_life: 30.0,
        affected: Vec::new(),
    }
}

pub fn create_beacon(id: EntityId, pos: Vec2) -> MartyrsBeacon {
    MartyrsBeacon {
        id,
        pos,
        timer: BEACON_TIMER,
        max_timer: BEACON_TIMER,
    }
}

/// Find a spot for `size` away from the spawn point and earlier obstacles
fn place_clear(rng: &mut impl Rng, placed: &mut Vec<Body>, world: Vec2, size: Vec2) -> Option<Body> {
    let spawn = world * 0.5;
    // Bounded retries; a crowded arena just gets fewer obstacles
    for _ in 0..32 {
        let center = interior_point(rng, world, 80.0);
        let body = Body::centered(0, center, size);
        let clear_of_spawn = center.distance(spawn) > 160.0;
        let clear_of_others = placed.iter().all(|b| b.center_distance(&body) > 120.0);
        if clear_of_spawn && clear_of_others {
            placed.push(body);
            return Some(body);
        }
    }
    None
}

/// Static obstacles placed at session start, kept clear of the player spawn
pub fn arena_layout(
    rng: &mut impl Rng,
    ids: &mut IdGen,
    world: Vec2,
    debris_count: usize,
    building_count: usize,
) -> (Vec<SpaceDebris>, Vec<Building>) {
    let mut placed: Vec<Body> = Vec::new();

    let mut debris = Vec::with_capacity(debris_count);
    for _ in 0..debris_count {
        let size = Vec2::new(rng.random_range(40.0..70.0), rng.random_range(30.0..60.0));
        if let Some(mut body) = place_clear(rng, &mut placed, world, size) {
            body.id = ids.next_id();
            debris.push(SpaceDebris { body });
        }
    }

    let mut buildings = Vec::with_capacity(building_count);
    for _ in 0..building_count {
        if let Some(mut body) = place_clear(rng, &mut placed, world, Vec2::new(64.0, 64.0)) {
            body.id = ids.next_id();
            buildings.push(Building {
                body,
                health: 300.0,
                max_health: 300.0,
            });
        }
    }
    (debris, buildings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const WORLD: Vec2 = Vec2::new(1024.0, 768.0);

    #[test]
    fn test_player_defaults() {
        let mut rng = Pcg32::seed_from_u64(1);
        let tank = create_tank(&mut rng, 1, &TankSpec::player("tr"), WORLD);
        assert_eq!(tank.health, 100.0);
        assert_eq!(tank.damage, 30.0);
        assert_eq!(tank.max_cooldown, 25.0);
        assert_eq!(tank.country, "TR");
        assert_eq!(tank.ability.kind, AbilityKind::AegisShield);
        assert_eq!(tank.body.center(), WORLD * 0.5);
    }

    #[test]
    fn test_unknown_country_falls_back() {
        let mut rng = Pcg32::seed_from_u64(2);
        let tank = create_tank(&mut rng, 1, &TankSpec::player("??"), WORLD);
        assert_eq!(tank.country, "XX");
        assert_eq!(tank.ability.kind, AbilityKind::None);
        assert_eq!(tank.design, Palette::Default.design());
    }

    #[test]
    fn test_hostile_scaling() {
        let mut rng = Pcg32::seed_from_u64(3);
        let boss = create_tank(&mut rng, 1, &TankSpec::boss(5), WORLD);
        assert_eq!(boss.max_health, 15000.0);
        assert_eq!(boss.design, Palette::Boss.design());

        let regular = create_tank(&mut rng, 2, &TankSpec::enemy(4, Variant::Default, Rank::Regular), WORLD);
        assert_eq!(regular.max_health, 120.0);
        assert_eq!(regular.max_cooldown, 66.0);

        let hard = create_tank(
            &mut rng,
            3,
            &TankSpec::enemy(4, Variant::Default, Rank::Regular).hard(true),
            WORLD,
        );
        assert_eq!(hard.max_health, 180.0);

        let swarmer = create_tank(&mut rng, 4, &TankSpec::enemy(1, Variant::Swarmer, Rank::Regular), WORLD);
        assert_eq!(swarmer.body.size, Vec2::new(SWARMER_WIDTH, SWARMER_HEIGHT));
        assert!((swarmer.max_health - 42.0).abs() < 1e-3);

        let artillery = create_tank(&mut rng, 5, &TankSpec::enemy(1, Variant::Artillery, Rank::Regular), WORLD);
        assert_eq!(artillery.max_cooldown, 480.0);
    }

    #[test]
    fn test_enemy_spawns_on_edge() {
        let mut rng = Pcg32::seed_from_u64(4);
        for id in 0..50 {
            let tank = create_tank(&mut rng, id, &TankSpec::enemy(1, Variant::Default, Rank::Regular), WORLD);
            let b = tank.body;
            let on_edge = b.pos.x <= 0.5
                || b.pos.y <= 0.5
                || (b.pos.x + b.size.x - WORLD.x).abs() < 0.5
                || (b.pos.y + b.size.y - WORLD.y).abs() < 0.5;
            assert!(on_edge, "{:?}", b);
        }
    }

    #[test]
    fn test_arena_layout_clear_of_spawn() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut ids = IdGen::default();
        let (debris, buildings) = arena_layout(&mut rng, &mut ids, WORLD, 4, 3);
        assert!(debris.len() <= 4 && buildings.len() <= 3);
        assert!(!debris.is_empty());
        for body in debris.iter().map(|d| d.body).chain(buildings.iter().map(|b| b.body)) {
            assert!(body.center().distance(WORLD * 0.5) > 160.0);
            assert_ne!(body.id, 0);
        }
    }
}
