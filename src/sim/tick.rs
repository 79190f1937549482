//! Per-frame simulation step
//!
//! Sub-systems run in a fixed order every frame; later ones observe the
//! partially updated state of earlier ones (collision sees post-movement
//! positions, for instance). Nothing in here can fail: a soft reference that
//! no longer resolves just skips its work for the frame.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::abilities::{self, spend_golden, tick_buffs};
use super::collision::Body;
use super::combat;
use super::effects::{muzzle_flash, shell_casing, smoke};
use super::entities::{BulletKind, Rank, Tank, Variant};
use super::factory::{
    TankSpec, create_artillery_target, create_bullet, create_power_up, create_tank,
    random_power_up_kind,
};
use super::spawn;
use super::state::{GameState, GameStatus};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{angle_of, direction_to, unit_from_angle};

/// Logical actions held this frame
///
/// Read once per frame and never reset by the step (level-triggered).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub ability: bool,
    pub adrenaline: bool,
}

impl TickInput {
    /// Unit movement direction (zero when idle or opposing keys cancel)
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

/// Advance the world by `dt` frames (clamped to `MAX_FRAME_DELTA`)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
    match state.status {
        GameStatus::Start | GameStatus::LevelUpPause | GameStatus::GameOver => return,
        GameStatus::DeathAnimation => {
            combat::update_beacon(state, dt);
            state.effects.age(dt);
            return;
        }
        GameStatus::Playing => {}
    }

    advance_timers(state, dt);

    if combat::resolve_player_death(state) {
        state.effects.age(dt);
        return;
    }

    update_player(state, input, dt);
    update_allies(state, dt);
    combat::collect_power_ups(state);

    if state.weather.update(&mut state.rng, dt, &state.tuning) {
        log::info!("Weather changed to {:?}", state.weather.kind);
    }

    update_drones(state, dt);
    update_boss(state, dt);
    update_enemies(state, dt);
    combat::update_hazards(state, dt);

    spawn::update(state, dt);

    combat::resolve_bullets(state, dt);
    combat::resolve_contacts(state);
    combat::handle_deaths(state);
    if state.player.as_ref().is_some_and(|p| p.since_damage == 0.0) {
        state.play(SoundEffect::Damage);
        state.effects.screen_shake.trigger(4.0, 8.0);
    }
    if combat::resolve_player_death(state) {
        state.effects.age(dt);
        return;
    }

    combat::collect_orbs(state, dt);

    emit_smoke(state);
    state.effects.age(dt);
}

fn advance_timers(state: &mut GameState, dt: f32) {
    state.time += dt / FPS;
    let difficulty = spawn::difficulty_for(state.time, &state.tuning);
    if difficulty > state.difficulty {
        log::info!("Difficulty {} at {:.0}s", difficulty, state.time);
        state.difficulty = difficulty;
    }

    state.streak_timer += dt;
    if state.kill_streak > 0 && state.streak_timer >= KILL_STREAK_RESET_TIME {
        state.kill_streak = 0;
    }
    state.low_health_cooldown = (state.low_health_cooldown - dt).max(0.0);
}

// --- Shared helpers ---

/// Movement multiplier from terrain under `body`
fn terrain_factor(state: &GameState, body: &Body) -> f32 {
    if state.rubble.iter().any(|r| r.body.overlaps(body)) {
        RUBBLE_SLOWDOWN
    } else {
        1.0
    }
}

/// Spawn a bullet from `shooter` along `aim`, bent by the weather
///
/// Returns the final firing angle.
fn fire_bullet(
    state: &mut GameState,
    shooter: &Tank,
    aim: Vec2,
    speed: f32,
    damage: f32,
    kind: BulletKind,
    piercing: bool,
) -> f32 {
    let angle = angle_of(aim) + state.weather.aim_deviation(&mut state.rng, &state.tuning);
    let dir = unit_from_angle(angle);
    let speed = speed * state.weather.bullet_speed_factor(&state.tuning);
    let muzzle = shooter.body.center() + dir * shooter.body.width() * 0.5;
    let id = state.alloc_id();
    state
        .bullets
        .push(create_bullet(id, muzzle, dir * speed, damage, kind, piercing));
    state.effects.muzzle_flashes.push(muzzle_flash(muzzle, angle));
    angle
}

fn regenerate(tank: &mut Tank, dt: f32) {
    tank.since_damage += dt;
    if tank.regen_rate <= 0.0 || tank.since_damage < HEALTH_REGEN_DELAY {
        tank.regen_timer = 0.0;
        return;
    }
    tank.regen_timer += dt;
    while tank.regen_timer >= HEALTH_REGEN_INTERVAL {
        tank.regen_timer -= HEALTH_REGEN_INTERVAL;
        let boost = if tank.adrenaline.is_active() { 2.0 } else { 1.0 };
        tank.heal(tank.regen_rate * boost);
    }
}

fn animate(tank: &mut Tank, dt: f32) {
    tank.spawn_anim = (tank.spawn_anim + 0.05 * dt).min(1.0);
    tank.damage_flash = (tank.damage_flash - dt).max(0.0);
}

// --- Player and allies ---

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.ability {
        abilities::activate_ability(state);
    }
    if input.adrenaline {
        abilities::activate_adrenaline(state);
    }

    let Some(mut player) = state.player.take() else {
        return;
    };
    let world = state.world_size();
    animate(&mut player, dt);
    tick_buffs(&mut player, dt);

    player.target = state
        .nearest_hostile(player.body.center())
        .map(|(id, _)| id);

    let dir = input.direction();
    if dir != Vec2::ZERO {
        let speed = player.effective_speed()
            * state.weather.movement_factor(&state.tuning)
            * terrain_factor(state, &player.body);
        let previous = player.body.pos;
        player.body.pos += dir * speed * dt;
        player.body.clamp_to(world);
        // Debris rejects the whole move, no sliding
        if state
            .space_debris
            .iter()
            .any(|d| d.body.overlaps(&player.body))
        {
            player.body.pos = previous;
        } else {
            state
                .effects
                .add_tire_track(player.body.center(), MAX_TIRE_TRACKS);
        }
    }

    regenerate(&mut player, dt);

    player.fire_cooldown = (player.fire_cooldown - dt).max(0.0);
    if input.fire && player.fire_cooldown <= 0.0 {
        let target = player.target.and_then(|id| state.hostile_center(id));
        if let Some((aim, _)) = target.and_then(|t| direction_to(player.body.center(), t)) {
            let golden = player.golden_armed();
            let (damage, kind) = if golden {
                (player.damage * 5.0, BulletKind::Golden)
            } else {
                (player.damage, BulletKind::Player)
            };
            let piercing = player.effective_piercing();
            let angle = fire_bullet(state, &player, aim, PLAYER_BULLET_SPEED, damage, kind, piercing);
            if golden {
                spend_golden(&mut player);
            }
            player.fire_cooldown = player.effective_cooldown();
            let casing = shell_casing(&mut state.rng, player.body.center(), angle);
            state.effects.shell_casings.push(casing);
            state.play(SoundEffect::Shoot);
        }
    }

    if player.is_alive()
        && player.health_fraction() < LOW_HEALTH_FRACTION
        && state.low_health_cooldown <= 0.0
    {
        state.low_health_cooldown = LOW_HEALTH_POWERUP_COOLDOWN;
        let angle = state.rng.random::<f32>() * std::f32::consts::TAU;
        let margin = Vec2::splat(20.0);
        let center = (player.body.center() + unit_from_angle(angle) * 100.0)
            .clamp(margin, world - margin);
        let id = state.alloc_id();
        let kind = random_power_up_kind(&mut state.rng);
        state.power_ups.push(create_power_up(id, kind, center));
        log::debug!("Rescue power-up {:?} dropped", kind);
    }

    state.player = Some(player);
}

fn update_allies(state: &mut GameState, dt: f32) {
    let mut allies = std::mem::take(&mut state.allies);
    let anchor = state.player.as_ref().map(|p| p.body.center());
    let world = state.world_size();
    let range = state.weather.detection_range(&state.tuning);

    for (i, ally) in allies.iter_mut().enumerate() {
        animate(ally, dt);
        tick_buffs(ally, dt);
        let center = ally.body.center();
        ally.target = state.nearest_hostile(center).map(|(id, _)| id);

        if let Some(anchor) = anchor {
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            let slot = anchor + Vec2::new(side * ALLY_OFFSET_X * (1 + i / 2) as f32, 0.0);
            let leashed = center.distance(anchor) > ALLY_LEASH;
            match direction_to(center, slot) {
                Some((dir, dist)) if leashed || dist > ALLY_OFFSET_X => {
                    let speed = ally.effective_speed()
                        * state.weather.movement_factor(&state.tuning)
                        * terrain_factor(state, &ally.body);
                    ally.body.pos += dir * (speed * dt).min(dist);
                    ally.body.clamp_to(world);
                }
                _ => {}
            }
        }

        ally.fire_cooldown = (ally.fire_cooldown - dt).max(0.0);
        if ally.fire_cooldown > 0.0 {
            continue;
        }
        let target = ally.target.and_then(|id| state.hostile_center(id));
        match target.and_then(|t| direction_to(ally.body.center(), t)) {
            Some((aim, dist)) if dist < range => {
                fire_bullet(state, ally, aim, PLAYER_BULLET_SPEED, ally.damage, BulletKind::Ally, false);
                ally.fire_cooldown = ally.effective_cooldown();
            }
            _ => {}
        }
    }

    allies.append(&mut state.allies);
    state.allies = allies;
}

// --- Hostiles ---

/// Flee inside the safe distance, close in well beyond it, strafe between
fn steer(tank: &mut Tank, rng: &mut impl Rng, target: Vec2, speed: f32, dt: f32) {
    let Some((dir, dist)) = direction_to(tank.body.center(), target) else {
        return;
    };
    let safe = tank.variant.safe_distance();
    let strafe = Vec2::new(-dir.y, dir.x) * tank.strafe_dir;
    let heading = if dist < safe {
        -dir + strafe * 0.5
    } else if dist > safe * 1.5 {
        dir
    } else {
        strafe
    };
    tank.body.pos += heading.normalize_or_zero() * speed * dt;
    if rng.random::<f32>() < 0.01 * dt {
        tank.strafe_dir = -tank.strafe_dir;
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let mut enemies = std::mem::take(&mut state.enemies);
    let mut broods = Vec::new();
    let world = state.world_size();
    let range = state.weather.detection_range(&state.tuning);
    let weather_factor = state.weather.movement_factor(&state.tuning);

    for enemy in &mut enemies {
        animate(enemy, dt);
        if enemy.is_stunned() {
            enemy.stun_timer = (enemy.stun_timer - dt).max(0.0);
            continue;
        }
        let center = enemy.body.center();
        enemy.target = state.nearest_friendly(center).map(|(id, _)| id);
        let Some(target) = enemy.target.and_then(|id| state.friendly_center(id)) else {
            continue;
        };

        if enemy.variant == Variant::Spawner {
            enemy.brood_timer -= dt;
            if enemy.brood_timer <= 0.0 {
                enemy.brood_timer = SPAWNER_INTERVAL;
                broods.push(center);
            }
            continue;
        }

        let speed = enemy.effective_speed() * weather_factor * terrain_factor(state, &enemy.body);
        steer(enemy, &mut state.rng, target, speed, dt);
        enemy.body.clamp_to(world);

        enemy.fire_cooldown = (enemy.fire_cooldown - dt).max(0.0);
        if enemy.fire_cooldown > 0.0 {
            continue;
        }
        match direction_to(enemy.body.center(), target) {
            Some((aim, dist)) if dist < range => {
                enemy.fire_cooldown = enemy.max_cooldown;
                if enemy.variant == Variant::Artillery {
                    let id = state.alloc_id();
                    state
                        .artillery_targets
                        .push(create_artillery_target(id, target));
                } else {
                    fire_bullet(state, enemy, aim, ENEMY_BULLET_SPEED, enemy.damage, BulletKind::Enemy, false);
                }
            }
            _ => {}
        }
    }

    enemies.append(&mut state.enemies);
    state.enemies = enemies;

    for center in broods {
        for i in 0..SPAWNER_BROOD {
            if state.enemies.len() >= MAX_ENEMIES {
                break;
            }
            let offset = Vec2::new((i as f32 - 0.5) * SWARMER_WIDTH * 2.0, TANK_HEIGHT);
            let id = state.alloc_id();
            let spec = TankSpec::enemy(state.difficulty, Variant::Swarmer, Rank::Regular)
                .hard(state.mods.hard_mode)
                .at(center + offset);
            let swarmer = create_tank(&mut state.rng, id, &spec, world);
            state.enemies.push(swarmer);
        }
    }
}

fn update_boss(state: &mut GameState, dt: f32) {
    let Some(mut boss) = state.boss.take() else {
        return;
    };
    animate(&mut boss, dt);
    if boss.is_stunned() {
        boss.stun_timer = (boss.stun_timer - dt).max(0.0);
        state.boss = Some(boss);
        return;
    }

    let center = boss.body.center();
    boss.target = state.nearest_friendly(center).map(|(id, _)| id);
    let target = boss.target.and_then(|id| state.friendly_center(id));
    if let Some((aim, dist)) = target.and_then(|t| direction_to(center, t)) {
        let speed = boss.effective_speed() * state.weather.movement_factor(&state.tuning);
        let heading = if dist > BOSS_STANDOFF {
            aim
        } else {
            Vec2::new(-aim.y, aim.x) * boss.strafe_dir
        };
        boss.body.pos += heading * speed * dt;
        boss.body.clamp_to(state.world_size());

        boss.fire_cooldown = (boss.fire_cooldown - dt).max(0.0);
        if boss.fire_cooldown <= 0.0 {
            boss.fire_cooldown = boss.max_cooldown;
            let base = angle_of(aim);
            for i in 0..BOSS_BURST {
                let spread = (i as f32 - (BOSS_BURST - 1) as f32 / 2.0) * 0.12;
                let dir = unit_from_angle(base + spread);
                fire_bullet(state, &boss, dir, ENEMY_BULLET_SPEED, boss.damage, BulletKind::Boss, false);
            }
        }
    }
    state.boss = Some(boss);
}

fn update_drones(state: &mut GameState, dt: f32) {
    let mut drones = std::mem::take(&mut state.drones);
    let factor = state.weather.movement_factor(&state.tuning);
    for drone in &mut drones {
        if drone.is_stunned() {
            drone.stun_timer = (drone.stun_timer - dt).max(0.0);
            continue;
        }
        let center = drone.body.center();
        let quarry = match state.friendly_center(drone.target) {
            Some(quarry) => Some(quarry),
            None => state.nearest_friendly(center).and_then(|(id, _)| {
                drone.target = id;
                state.friendly_center(id)
            }),
        };
        if let Some((dir, dist)) = quarry.and_then(|q| direction_to(center, q)) {
            drone.body.pos += dir * (drone.speed * factor * dt).min(dist);
        }
    }
    drones.append(&mut state.drones);
    state.drones = drones;
}

fn emit_smoke(state: &mut GameState) {
    let sources: Vec<Vec2> = state
        .player
        .iter()
        .chain(state.enemies.iter())
        .chain(state.boss.iter())
        .filter(|t| t.health_fraction() < SMOKE_HEALTH_FRACTION)
        .map(|t| t.body.center())
        .collect();
    for center in sources {
        if state.rng.random::<f32>() < 0.2 {
            let puff = smoke(&mut state.rng, center);
            state.effects.smoke.push(puff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::create_bullet;
    use crate::sim::hazards::SpaceDebris;
    use crate::sim::state::RunSetup;
    use crate::sim::weather::WeatherKind;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start(&RunSetup {
            country: "US".into(),
            ..RunSetup::default()
        });
        state.space_debris.clear();
        state.buildings.clear();
        state
    }

    fn add_enemy(state: &mut GameState, center: Vec2, variant: Variant) -> u32 {
        let id = state.alloc_id();
        let world = state.world_size();
        let spec = TankSpec::enemy(1, variant, Rank::Regular).at(center);
        let tank = create_tank(&mut state.rng, id, &spec, world);
        state.enemies.push(tank);
        id
    }

    #[test]
    fn test_idle_states_do_nothing() {
        let mut state = GameState::new(1);
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.time, 0.0);

        let mut state = playing(1);
        state.status = GameStatus::LevelUpPause;
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn test_frame_delta_clamped() {
        let mut state = playing(2);
        tick(&mut state, &TickInput::default(), 1000.0);
        assert!((state.time - MAX_FRAME_DELTA / FPS).abs() < 1e-6);
    }

    #[test]
    fn test_player_moves_and_stays_in_bounds() {
        let mut state = playing(3);
        let start = state.player.as_ref().unwrap().body.pos;
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        tick(&mut state, &input, 1.0);
        let pos = state.player.as_ref().unwrap().body.pos;
        assert!((pos.x - (start.x - 3.0)).abs() < 1e-4);
        for _ in 0..400 {
            tick(&mut state, &input, 1.0);
            if state.player.is_none() {
                return;
            }
        }
        assert_eq!(state.player.as_ref().unwrap().body.pos.x, 0.0);
    }

    #[test]
    fn test_debris_rejects_move() {
        let mut state = playing(4);
        let player_body = state.player.as_ref().unwrap().body;
        let id = state.alloc_id();
        state.space_debris.push(SpaceDebris {
            body: Body::new(
                id,
                Vec2::new(player_body.pos.x + player_body.size.x + 1.0, player_body.pos.y),
                Vec2::new(40.0, 40.0),
            ),
        });
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, 1.0);
        assert_eq!(state.player.as_ref().unwrap().body.pos, player_body.pos);
    }

    #[test]
    fn test_regen_after_grace() {
        let mut state = playing(5);
        let player = state.player.as_mut().unwrap();
        player.health = 50.0;
        player.since_damage = HEALTH_REGEN_DELAY;
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.player.as_ref().unwrap().health, 50.0);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), 1.0);
        }
        let health = state.player.as_ref().unwrap().health;
        assert!(health > 50.0 && health <= 100.0);
    }

    #[test]
    fn test_fire_needs_target_and_cooldown() {
        let mut state = playing(6);
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, 1.0);
        assert!(state.bullets.is_empty());

        let center = state.player.as_ref().unwrap().body.center();
        add_enemy(&mut state, center + Vec2::new(250.0, 0.0), Variant::Default);
        state.enemies[0].fire_cooldown = 1000.0;
        tick(&mut state, &fire, 1.0);
        assert_eq!(state.bullets.len(), 1);
        assert!(state.bullets[0].vel.x > 0.0);
        tick(&mut state, &fire, 1.0);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_rain_bends_shots() {
        let mut state = playing(7);
        let tuning = state.tuning.clone();
        state.weather.set_kind(&mut state.rng, WeatherKind::Rain, &tuning);
        let origin = state.player.as_ref().unwrap().body.center();
        let target = origin + Vec2::new(200.0, 80.0);
        add_enemy(&mut state, target, Variant::Default);
        state.enemies[0].fire_cooldown = 1000.0;
        let aim = state.enemies[0].body.center() - origin;

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, 1.0);
        let bullet = &state.bullets[0];
        let deviation = angle_of(bullet.vel) - angle_of(aim);
        assert!(deviation.abs() > 1e-4);
        assert!(deviation.abs() <= 0.06 + 1e-4);
    }

    #[test]
    fn test_stunned_enemy_skips_update() {
        let mut state = playing(8);
        let center = state.player.as_ref().unwrap().body.center();
        add_enemy(&mut state, center + Vec2::new(300.0, 0.0), Variant::Default);
        state.enemies[0].stun(60.0);
        state.enemies[0].fire_cooldown = 0.0;
        let pos = state.enemies[0].body.pos;
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.enemies[0].body.pos, pos);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_spawner_broods_swarmers() {
        let mut state = playing(9);
        let center = state.player.as_ref().unwrap().body.center();
        add_enemy(&mut state, center + Vec2::new(0.0, -250.0), Variant::Spawner);
        state.enemies[0].brood_timer = 1.0;
        tick(&mut state, &TickInput::default(), 1.0);
        let swarmers = state
            .enemies
            .iter()
            .filter(|e| e.variant == Variant::Swarmer)
            .count();
        assert_eq!(swarmers, SPAWNER_BROOD);
    }

    #[test]
    fn test_rescue_power_up_gated() {
        let mut state = playing(10);
        state.player.as_mut().unwrap().health = 10.0;
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.power_ups.len(), 1);
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.power_ups.len(), 1);
    }

    #[test]
    fn test_hostile_hit_kills_in_same_frame() {
        let mut state = playing(11);
        let player = state.player.as_mut().unwrap();
        player.health = 15.0;
        let center = player.body.center();
        let id = state.alloc_id();
        state
            .bullets
            .push(create_bullet(id, center, Vec2::ZERO, 20.0, BulletKind::Enemy, false));
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.status, GameStatus::GameOver);
        assert!(state.player.is_none());
    }

    #[test]
    fn test_streak_resets() {
        let mut state = playing(12);
        state.kill_streak = 7;
        state.streak_timer = KILL_STREAK_RESET_TIME - 1.0;
        tick(&mut state, &TickInput::default(), 2.0);
        assert_eq!(state.kill_streak, 0);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = playing(99999);
        let mut state2 = playing(99999);
        let inputs = [
            TickInput {
                fire: true,
                ..Default::default()
            },
            TickInput {
                up: true,
                left: true,
                fire: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for frame in 0..1200 {
            let input = &inputs[frame % inputs.len()];
            tick(&mut state1, input, 1.0);
            tick(&mut state2, input, 1.0);
        }
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.status, state2.status);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.bullets.len(), state2.bullets.len());
        assert_eq!(
            state1.player.as_ref().map(|p| p.body.pos),
            state2.player.as_ref().map(|p| p.body.pos)
        );
    }
}
