//! Damage resolution, deaths, rewards and leveling
//!
//! Damage is applied first and deaths are processed afterwards in one pass,
//! so anything reduced to zero health this frame leaves its collection
//! before the next frame starts.

use glam::Vec2;

use super::collision::{Body, circle_contact};
use super::effects::{TextTone, explosion, floating_text, scorch_mark, sparks};
use super::entities::{Bullet, BulletKind, Rank, Side, Tank, Variant};
use super::factory::{create_beacon, create_bullet, create_orb, orb_shower};
use super::hazards::{Asteroid, Building, KamikazeDrone, PowerUpKind, Rubble};
use super::state::{GameEvent, GameState, GameStatus};
use super::upgrades::draw_choices;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{direction_to, unit_from_angle};

/// Something bullets can wear down
trait Damageable {
    fn hitbox(&self) -> &Body;
    fn alive(&self) -> bool;
    fn hurt(&mut self, amount: f32);
}

impl Damageable for Tank {
    fn hitbox(&self) -> &Body {
        &self.body
    }
    fn alive(&self) -> bool {
        self.is_alive()
    }
    fn hurt(&mut self, amount: f32) {
        self.take_damage(amount);
    }
}

impl Damageable for KamikazeDrone {
    fn hitbox(&self) -> &Body {
        &self.body
    }
    fn alive(&self) -> bool {
        self.health > 0.0
    }
    fn hurt(&mut self, amount: f32) {
        self.take_damage(amount);
    }
}

impl Damageable for Asteroid {
    fn hitbox(&self) -> &Body {
        &self.body
    }
    fn alive(&self) -> bool {
        self.health > 0.0
    }
    fn hurt(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

/// Damage every overlapping live target the bullet has not hit yet
///
/// Returns true once a non-piercing bullet is spent.
fn strike<'a, T: Damageable + 'a>(
    bullet: &mut Bullet,
    targets: impl Iterator<Item = &'a mut T>,
    impacts: &mut Vec<Vec2>,
) -> bool {
    for target in targets {
        let id = target.hitbox().id;
        if !target.alive() || !bullet.can_hit(id) || !bullet.body.overlaps(target.hitbox()) {
            continue;
        }
        target.hurt(bullet.damage);
        bullet.hits.push(id);
        impacts.push(bullet.body.center());
        if !bullet.piercing {
            return true;
        }
    }
    false
}

// --- Projectiles ---

/// Move every bullet and resolve bounds, obstacles and hits
pub(crate) fn resolve_bullets(state: &mut GameState, dt: f32) {
    let world = state.world_size();
    let mut impacts = Vec::new();
    let mut bullets = std::mem::take(&mut state.bullets);

    bullets.retain_mut(|bullet| {
        bullet.advance(dt);
        if bullet.body.is_outside(world, BULLET_BOUNDS_MARGIN) {
            return false;
        }
        if state.space_debris.iter().any(|d| d.body.overlaps(&bullet.body)) {
            impacts.push(bullet.body.center());
            return false;
        }
        if let Some(building) = state
            .buildings
            .iter_mut()
            .find(|b| b.health > 0.0 && b.body.overlaps(&bullet.body))
        {
            building.health = (building.health - bullet.damage).max(0.0);
            impacts.push(bullet.body.center());
            return false;
        }

        let spent = match bullet.side {
            Side::Friendly => {
                strike(bullet, state.enemies.iter_mut(), &mut impacts)
                    || strike(bullet, state.boss.iter_mut(), &mut impacts)
                    || strike(bullet, state.drones.iter_mut(), &mut impacts)
            }
            Side::Hostile => {
                strike(bullet, state.player.iter_mut(), &mut impacts)
                    || strike(bullet, state.allies.iter_mut(), &mut impacts)
            }
        };
        if spent {
            return false;
        }
        !strike(bullet, state.asteroids.iter_mut(), &mut impacts)
    });

    bullets.append(&mut state.bullets);
    state.bullets = bullets;

    for point in impacts {
        state.effects.sparks.extend(sparks(&mut state.rng, point, 5));
    }
    collapse_buildings(state);
}

/// Turn destroyed buildings into rubble
fn collapse_buildings(state: &mut GameState) {
    let mut fallen: Vec<Building> = Vec::new();
    state.buildings.retain(|b| {
        if b.health > 0.0 {
            true
        } else {
            fallen.push(b.clone());
            false
        }
    });
    for building in fallen {
        let center = building.body.center();
        state
            .effects
            .explosions
            .push(explosion(&mut state.rng, center, building.body.width(), false));
        state
            .effects
            .add_scorch_mark(scorch_mark(center, building.body.width() * 0.5), MAX_SCORCH_MARKS);
        state.rubble.push(Rubble {
            body: building.body,
        });
        state.play(SoundEffect::Explosion);
    }
}

// --- Contact hazards ---

/// Mines, drones and asteroids touching tanks
pub(crate) fn resolve_contacts(state: &mut GameState) {
    let mut blasts: Vec<(Vec2, f32)> = Vec::new();

    state.mines.retain(|mine| {
        if !mine.armed {
            return true;
        }
        let victim = state
            .player
            .iter_mut()
            .chain(state.allies.iter_mut())
            .find(|t| t.is_alive() && t.body.overlaps(&mine.body));
        match victim {
            Some(tank) => {
                tank.take_damage(MINE_DAMAGE);
                blasts.push((mine.body.center(), 60.0));
                false
            }
            None => true,
        }
    });

    state.drones.retain(|drone| {
        if drone.health <= 0.0 {
            return true;
        }
        let victim = state
            .player
            .iter_mut()
            .chain(state.allies.iter_mut())
            .find(|t| t.is_alive() && circle_contact(&t.body, &drone.body));
        match victim {
            Some(tank) => {
                tank.take_damage(DRONE_CONTACT_DAMAGE);
                blasts.push((drone.body.center(), 40.0));
                false
            }
            None => true,
        }
    });

    state.asteroids.retain(|rock| {
        if rock.health <= 0.0 {
            return true;
        }
        let victim = state
            .player
            .iter_mut()
            .chain(state.allies.iter_mut())
            .chain(state.enemies.iter_mut())
            .chain(state.boss.iter_mut())
            .find(|t| t.is_alive() && t.body.overlaps(&rock.body));
        match victim {
            Some(tank) => {
                tank.take_damage(ASTEROID_CONTACT_DAMAGE);
                blasts.push((rock.body.center(), rock.body.width()));
                false
            }
            None => true,
        }
    });

    for (center, size) in blasts {
        blast_effect(state, center, size, false);
    }
}

fn blast_effect(state: &mut GameState, center: Vec2, size: f32, shrapnel: bool) {
    state
        .effects
        .explosions
        .push(explosion(&mut state.rng, center, size, shrapnel));
    if size >= 50.0 {
        state
            .effects
            .add_scorch_mark(scorch_mark(center, size * 0.4), MAX_SCORCH_MARKS);
    }
    state.effects.screen_shake.trigger(size / 15.0, 10.0);
    state.play(SoundEffect::Explosion);
}

// --- Timed hazards ---

/// Age and trigger mines, strikes, flares, black holes, EMPs and asteroids
pub(crate) fn update_hazards(state: &mut GameState, dt: f32) {
    let world = state.world_size();

    state.mines.retain_mut(|m| m.update(dt));
    state.power_ups.retain_mut(|p| {
        p.life -= dt;
        p.life > 0.0
    });

    // Artillery strikes
    let quarry = state.player.as_ref().map(|p| p.body.center());
    let mut strikes = Vec::new();
    state.artillery_targets.retain_mut(|t| {
        if t.update(dt, quarry) {
            strikes.push((t.pos, t.radius, t.damage));
            false
        } else {
            true
        }
    });
    for (pos, radius, damage) in strikes {
        for tank in state.player.iter_mut().chain(state.allies.iter_mut()) {
            if tank.body.within(pos, radius) {
                tank.take_damage(damage);
            }
        }
        for i in 0..SHRAPNEL_COUNT {
            let angle = i as f32 / SHRAPNEL_COUNT as f32 * std::f32::consts::TAU;
            let id = state.alloc_id();
            state.bullets.push(create_bullet(
                id,
                pos,
                unit_from_angle(angle) * SHRAPNEL_SPEED,
                SHRAPNEL_DAMAGE,
                BulletKind::Shrapnel,
                false,
            ));
        }
        blast_effect(state, pos, radius * 1.2, true);
    }

    // Solar flares hit everyone inside
    let mut flares = Vec::new();
    state.solar_flares.retain_mut(|f| {
        f.timer -= dt;
        if f.timer <= 0.0 {
            flares.push((f.pos, f.radius, f.damage));
            false
        } else {
            true
        }
    });
    for (pos, radius, damage) in flares {
        let tanks = state
            .player
            .iter_mut()
            .chain(state.allies.iter_mut())
            .chain(state.enemies.iter_mut())
            .chain(state.boss.iter_mut());
        for tank in tanks {
            if tank.body.within(pos, radius) {
                tank.take_damage(damage);
            }
        }
        for drone in &mut state.drones {
            if drone.body.within(pos, radius) {
                drone.take_damage(damage);
            }
        }
        blast_effect(state, pos, radius * 1.5, false);
    }

    update_black_holes(state, dt, world);
    update_emp(state, dt);

    state.asteroids.retain_mut(|a| {
        a.body.pos += a.vel * dt;
        a.rotation += a.spin * dt;
        !a.body.is_outside(world, 100.0)
    });
}

fn update_black_holes(state: &mut GameState, dt: f32, world: Vec2) {
    state.black_holes.retain_mut(|h| {
        h.life -= dt;
        h.life > 0.0
    });
    let mut swallowed = Vec::new();
    for hole in &state.black_holes {
        let tanks = state
            .player
            .iter_mut()
            .chain(state.allies.iter_mut())
            .chain(state.enemies.iter_mut())
            .chain(state.boss.iter_mut());
        for tank in tanks {
            let center = tank.body.center();
            tank.body.pos += hole.pull(center, dt);
            tank.body.clamp_to(world);
            if hole.in_core(tank.body.center()) {
                tank.take_damage(BLACK_HOLE_CORE_DAMAGE * dt);
            }
        }
        state.drones.retain_mut(|d| {
            let center = d.body.center();
            d.body.pos += hole.pull(center, dt);
            if hole.in_core(d.body.center()) {
                swallowed.push(d.body.center());
                false
            } else {
                true
            }
        });
        for orb in &mut state.orbs {
            let center = orb.body.center();
            orb.body.pos += hole.pull(center, dt);
        }
        for power_up in &mut state.power_ups {
            let center = power_up.body.center();
            power_up.body.pos += hole.pull(center, dt);
        }
    }
    for center in swallowed {
        state
            .effects
            .explosions
            .push(explosion(&mut state.rng, center, 20.0, false));
    }
}

fn update_emp(state: &mut GameState, dt: f32) {
    state.emp_blasts.retain_mut(|e| e.update(dt));
    for blast in &mut state.emp_blasts {
        let (pos, radius) = (blast.pos, blast.radius);
        for enemy in &mut state.enemies {
            if enemy.body.within(pos, radius) && !blast.affected.contains(&enemy.body.id) {
                enemy.stun(EMP_STUN);
                blast.affected.push(enemy.body.id);
            }
        }
        for boss in state.boss.iter_mut() {
            if boss.body.within(pos, radius) && !blast.affected.contains(&boss.body.id) {
                boss.stun(EMP_BOSS_STUN);
                blast.affected.push(boss.body.id);
            }
        }
        for drone in &mut state.drones {
            if drone.body.within(pos, radius) && !blast.affected.contains(&drone.body.id) {
                drone.stun_timer = drone.stun_timer.max(EMP_STUN);
                blast.affected.push(drone.body.id);
            }
        }
        state
            .bullets
            .retain(|b| b.side == Side::Friendly || !b.body.within(pos, radius));
    }
}

// --- Deaths and rewards ---

fn register_kill(state: &mut GameState, at: Vec2) {
    state.kill_streak += 1;
    state.streak_timer = 0.0;
    if state.kill_streak % STREAK_TIER_SIZE == 0 {
        state.play(SoundEffect::Combo);
        state.effects.floating_texts.push(floating_text(
            at,
            format!("{} STREAK! x{:.1}", state.kill_streak, state.streak_multiplier()),
            TextTone::Streak,
            90.0,
        ));
    }
}

fn fill_adrenaline(state: &mut GameState, amount: f32) {
    if let Some(player) = state.player.as_mut() {
        player.adrenaline.fill(amount);
    }
}

/// Points for an enemy tank before multipliers
pub fn enemy_base_score(variant: Variant, rank: Rank) -> u64 {
    match (rank, variant) {
        (Rank::Champion, _) => 500,
        (_, Variant::Artillery) => 250,
        (_, Variant::Spawner) => 300,
        (_, Variant::Swarmer) => 40,
        _ => 100,
    }
}

fn award_points(state: &mut GameState, base: u64, at: Vec2) {
    let mut points = base as f32 * state.streak_multiplier();
    if state.mods.hard_mode {
        points *= 1.5;
    }
    let points = points.round() as u64;
    state.score += points;
    state.effects.floating_texts.push(floating_text(
        at,
        format!("+{}", points),
        TextTone::Score,
        60.0,
    ));
}

/// Remove everything that reached zero health and hand out rewards
pub(crate) fn handle_deaths(state: &mut GameState) {
    let mut fallen = Vec::new();
    state.enemies.retain(|e| {
        if e.is_alive() {
            true
        } else {
            fallen.push((e.variant, e.rank, e.body.center(), e.body.width()));
            false
        }
    });
    for (variant, rank, center, width) in fallen {
        register_kill(state, center);
        award_points(state, enemy_base_score(variant, rank), center);
        let value = if variant == Variant::Swarmer { 5.0 } else { 20.0 };
        let id = state.alloc_id();
        state.orbs.push(create_orb(id, center, value));
        fill_adrenaline(state, ADRENALINE_PER_KILL);
        blast_effect(state, center, width * 1.5, false);
    }

    if let Some(boss) = state.boss.take_if(|b| !b.is_alive()) {
        let center = boss.body.center();
        register_kill(state, center);
        let points = 10000 * state.difficulty as u64;
        state.score += points;
        let orbs = orb_shower(
            &mut state.rng,
            &mut state.ids,
            center,
            BOSS_ORB_COUNT,
            BOSS_ORB_VALUE,
        );
        state.orbs.extend(orbs);
        state.timers.boss_respite = BOSS_RESPITE;
        fill_adrenaline(state, ADRENALINE_PER_BOSS);
        state.effects.floating_texts.push(floating_text(
            center,
            format!("BOSS DEFEATED +{}", points),
            TextTone::Boss,
            120.0,
        ));
        blast_effect(state, center, boss.body.width() * 2.0, true);
        state.effects.screen_shake.trigger(15.0, 40.0);
        log::info!("Boss defeated at difficulty {} (+{})", state.difficulty, points);
    }

    let mut downed = Vec::new();
    state.drones.retain(|d| {
        if d.health > 0.0 {
            true
        } else {
            downed.push(d.body.center());
            false
        }
    });
    for center in downed {
        register_kill(state, center);
        award_points(state, 50, center);
        fill_adrenaline(state, ADRENALINE_PER_DRONE);
        grant_experience(state, 5.0);
        blast_effect(state, center, 30.0, false);
    }

    let mut wrecks = Vec::new();
    state.allies.retain(|a| {
        if a.is_alive() {
            true
        } else {
            wrecks.push(a.body.center());
            false
        }
    });
    state.asteroids.retain(|a| {
        if a.health > 0.0 {
            true
        } else {
            wrecks.push(a.body.center());
            false
        }
    });
    for center in wrecks {
        blast_effect(state, center, 60.0, false);
    }
}

/// Handle a player at zero health
///
/// A shield absorbs the hit. Otherwise the player is removed and the run
/// either enters the beacon countdown or ends. Returns true if the player
/// was removed.
pub(crate) fn resolve_player_death(state: &mut GameState) -> bool {
    let Some(player) = state.player.as_mut() else {
        return false;
    };
    if player.is_alive() {
        return false;
    }
    let center = player.body.center();

    if state.shields > 0 {
        state.shields -= 1;
        player.health = player.max_health * SHIELD_RESTORE_FRACTION;
        player.grant_invincibility(SHIELD_INVINCIBILITY);
        state.effects.floating_texts.push(floating_text(
            center,
            "SHIELD!",
            TextTone::Heal,
            90.0,
        ));
        state.emit(GameEvent::ShieldConsumed {
            remaining: state.shields,
        });
        log::info!("Shield consumed, {} left", state.shields);
        return false;
    }

    state.player = None;
    blast_effect(state, center, 120.0, true);
    state.effects.screen_shake.trigger(20.0, 45.0);

    if state.beacon_purchased {
        let id = state.alloc_id();
        state.beacon = Some(create_beacon(id, center));
        state.status = GameStatus::DeathAnimation;
        log::info!("Player down, martyr's beacon armed");
    } else {
        end_run(state);
    }
    true
}

fn end_run(state: &mut GameState) {
    state.status = GameStatus::GameOver;
    state.emit(GameEvent::RunEnded { score: state.score });
    log::info!(
        "Game over: score {} at difficulty {} after {:.1}s",
        state.score,
        state.difficulty,
        state.time
    );
}

/// Count down the beacon; on detonation damage hostiles and end the run
pub(crate) fn update_beacon(state: &mut GameState, dt: f32) {
    let Some(beacon) = state.beacon.as_mut() else {
        end_run(state);
        return;
    };
    beacon.timer -= dt;
    if beacon.timer > 0.0 {
        return;
    }
    let pos = beacon.pos;
    state.beacon = None;

    for tank in state.enemies.iter_mut().chain(state.boss.iter_mut()) {
        if tank.body.within(pos, BEACON_RADIUS) {
            tank.take_damage(BEACON_DAMAGE);
        }
    }
    for drone in &mut state.drones {
        if drone.body.within(pos, BEACON_RADIUS) {
            drone.take_damage(BEACON_DAMAGE);
        }
    }
    blast_effect(state, pos, BEACON_RADIUS * 2.0, true);
    state.effects.screen_shake.trigger(25.0, 60.0);
    handle_deaths(state);
    log::info!("Martyr's beacon detonated");
    end_run(state);
}

// --- Pickups and leveling ---

/// Collect power-ups touching the player
pub(crate) fn collect_power_ups(state: &mut GameState) {
    let Some(player) = state.player.as_mut() else {
        return;
    };
    let center = player.body.center();
    let mut collected = Vec::new();
    state.power_ups.retain(|p| {
        if p.body.within(center, POWERUP_PICKUP_RADIUS) {
            collected.push((p.kind, p.duration));
            false
        } else {
            true
        }
    });
    if collected.is_empty() {
        return;
    }
    for (kind, duration) in &collected {
        let label = match kind {
            PowerUpKind::RapidFire => {
                player.rapid_fire_timer = player.rapid_fire_timer.max(*duration);
                "RAPID FIRE"
            }
            PowerUpKind::GoldenRound => {
                player.golden_charges += 1;
                "GOLDEN ROUND"
            }
        };
        state
            .effects
            .floating_texts
            .push(floating_text(center, label, TextTone::LevelUp, 60.0));
    }
    state.play(SoundEffect::PowerUp);
}

/// Attract and collect experience orbs
pub(crate) fn collect_orbs(state: &mut GameState, dt: f32) {
    let mut gained = 0.0;
    match state.player.as_mut() {
        Some(player) => {
            let center = player.body.center();
            state.orbs.retain_mut(|orb| {
                orb.life -= dt;
                if orb.life <= 0.0 {
                    return false;
                }
                match direction_to(orb.body.center(), center) {
                    Some((dir, dist)) if dist < ORB_ATTRACTION_RADIUS => {
                        orb.body.pos += dir * (ORB_ATTRACTION_SPEED * dt).min(dist);
                    }
                    _ => {}
                }
                if orb.body.overlaps(&player.body) {
                    gained += orb.value;
                    player.heal(ORB_HEAL);
                    false
                } else {
                    true
                }
            });
        }
        None => state.orbs.retain_mut(|orb| {
            orb.life -= dt;
            orb.life > 0.0
        }),
    }
    if gained > 0.0 {
        state.play(SoundEffect::OrbPickup);
        grant_experience(state, gained);
    }
}

/// Add experience; crossing the threshold levels up and pauses for a choice
pub(crate) fn grant_experience(state: &mut GameState, amount: f32) {
    let xp_per_level = state.tuning.xp_per_level;
    let Some(player) = state.player.as_mut() else {
        return;
    };
    player.experience += amount;
    let threshold = player.xp_threshold(xp_per_level);
    if player.experience < threshold || state.status != GameStatus::Playing {
        return;
    }

    player.level += 1;
    let next = player.xp_threshold(xp_per_level);
    player.experience = (player.experience - threshold).clamp(0.0, next * 0.5);
    player.health = player.max_health;
    let level = player.level;
    let center = player.body.center();
    state.upgrade_choices = draw_choices(&mut state.rng, player, LEVEL_UP_CHOICES);

    state.status = GameStatus::LevelUpPause;
    state.effects.floating_texts.push(floating_text(
        center,
        format!("LEVEL {}", level),
        TextTone::LevelUp,
        90.0,
    ));
    state.play(SoundEffect::LevelUp);
    state.emit(GameEvent::LevelUp { level });
    log::info!("Level up to {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Body;
    use crate::sim::factory::{TankSpec, create_tank};
    use crate::sim::state::RunSetup;

    fn playing() -> GameState {
        let mut state = GameState::new(21);
        state.start(&RunSetup {
            country: "US".into(),
            ..RunSetup::default()
        });
        state.space_debris.clear();
        state.buildings.clear();
        state
    }

    fn enemy_at(state: &mut GameState, center: Vec2) -> u32 {
        let id = state.alloc_id();
        let world = state.world_size();
        let spec = TankSpec::enemy(1, Variant::Default, Rank::Regular).at(center);
        let tank = create_tank(&mut state.rng, id, &spec, world);
        state.enemies.push(tank);
        id
    }

    fn bullet_at(state: &mut GameState, center: Vec2, damage: f32, kind: BulletKind, piercing: bool) {
        let id = state.alloc_id();
        state
            .bullets
            .push(create_bullet(id, center, Vec2::ZERO, damage, kind, piercing));
    }

    #[test]
    fn test_non_piercing_hits_once() {
        let mut state = playing();
        let a = enemy_at(&mut state, Vec2::new(300.0, 300.0));
        let b = enemy_at(&mut state, Vec2::new(300.0, 300.0));
        bullet_at(&mut state, Vec2::new(300.0, 300.0), 10.0, BulletKind::Player, false);
        resolve_bullets(&mut state, 1.0);

        let damaged = state
            .enemies
            .iter()
            .filter(|e| e.health < e.max_health)
            .count();
        assert_eq!(damaged, 1);
        assert!(state.bullets.is_empty());
        assert!(state.enemies.iter().any(|e| e.body.id == a || e.body.id == b));
    }

    #[test]
    fn test_piercing_passes_through() {
        let mut state = playing();
        enemy_at(&mut state, Vec2::new(300.0, 300.0));
        enemy_at(&mut state, Vec2::new(310.0, 300.0));
        bullet_at(&mut state, Vec2::new(305.0, 300.0), 10.0, BulletKind::Player, true);
        resolve_bullets(&mut state, 1.0);
        assert!(state.enemies.iter().all(|e| e.health < e.max_health));
        assert_eq!(state.bullets.len(), 1);

        // Same targets are not hit twice by the same round
        let health: Vec<f32> = state.enemies.iter().map(|e| e.health).collect();
        resolve_bullets(&mut state, 1.0);
        let after: Vec<f32> = state.enemies.iter().map(|e| e.health).collect();
        assert_eq!(health, after);
    }

    #[test]
    fn test_kill_removed_same_frame_and_scored() {
        let mut state = playing();
        let id = enemy_at(&mut state, Vec2::new(300.0, 300.0));
        bullet_at(&mut state, Vec2::new(300.0, 300.0), 1000.0, BulletKind::Player, false);
        resolve_bullets(&mut state, 1.0);
        handle_deaths(&mut state);
        assert!(state.enemies.iter().all(|e| e.body.id != id));
        assert_eq!(state.score, 100);
        assert_eq!(state.kill_streak, 1);
        assert_eq!(state.orbs.len(), 1);
        assert_eq!(
            state.player.as_ref().unwrap().adrenaline.meter,
            ADRENALINE_PER_KILL
        );
    }

    #[test]
    fn test_debris_destroys_bullets() {
        let mut state = playing();
        let id = state.alloc_id();
        state.space_debris.push(crate::sim::hazards::SpaceDebris {
            body: Body::centered(id, Vec2::new(500.0, 100.0), Vec2::splat(50.0)),
        });
        bullet_at(&mut state, Vec2::new(500.0, 100.0), 10.0, BulletKind::Enemy, false);
        resolve_bullets(&mut state, 1.0);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_building_collapses_to_rubble() {
        let mut state = playing();
        let id = state.alloc_id();
        state.buildings.push(Building {
            body: Body::centered(id, Vec2::new(700.0, 100.0), Vec2::splat(64.0)),
            health: 15.0,
            max_health: 300.0,
        });
        bullet_at(&mut state, Vec2::new(700.0, 100.0), 20.0, BulletKind::Enemy, true);
        resolve_bullets(&mut state, 1.0);
        assert!(state.buildings.is_empty());
        assert_eq!(state.rubble.len(), 1);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_shield_absorbs_death() {
        let mut state = playing();
        state.shields = 1;
        state.player.as_mut().unwrap().health = 0.0;
        assert!(!resolve_player_death(&mut state));
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.health, 50.0);
        assert!(player.invincible);
        assert_eq!(state.shields, 0);
        assert!(state
            .events
            .contains(&GameEvent::ShieldConsumed { remaining: 0 }));
    }

    #[test]
    fn test_beacon_detonation_scores_and_ends() {
        let mut state = playing();
        state.beacon_purchased = true;
        let center = state.player.as_ref().unwrap().body.center();
        enemy_at(&mut state, center + Vec2::new(60.0, 0.0));
        enemy_at(&mut state, center + Vec2::new(400.0, 0.0));
        state.player.as_mut().unwrap().health = 0.0;

        assert!(resolve_player_death(&mut state));
        assert_eq!(state.status, GameStatus::DeathAnimation);
        assert!(state.player.is_none());

        update_beacon(&mut state, BEACON_TIMER / 2.0);
        assert_eq!(state.status, GameStatus::DeathAnimation);
        update_beacon(&mut state, BEACON_TIMER);
        assert_eq!(state.status, GameStatus::GameOver);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.score, 100);
        assert!(state.events.contains(&GameEvent::RunEnded { score: 100 }));
    }

    #[test]
    fn test_level_up_offers_three_choices() {
        let mut state = playing();
        grant_experience(&mut state, 100.0);
        assert_eq!(state.status, GameStatus::LevelUpPause);
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.level, 2);
        assert!(player.experience < player.xp_threshold(100.0));
        assert_eq!(state.upgrade_choices.len(), 3);
    }

    #[test]
    fn test_orbs_attract_and_heal() {
        let mut state = playing();
        let center = state.player.as_ref().unwrap().body.center();
        state.player.as_mut().unwrap().health = 50.0;
        let id = state.alloc_id();
        state.orbs.push(create_orb(id, center + Vec2::new(60.0, 0.0), 20.0));
        for _ in 0..30 {
            collect_orbs(&mut state, 1.0);
        }
        assert!(state.orbs.is_empty());
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.experience, 20.0);
        assert_eq!(player.health, 52.0);
    }

    #[test]
    fn test_emp_stuns_and_erases_hostile_fire() {
        let mut state = playing();
        let center = state.player.as_ref().unwrap().body.center();
        enemy_at(&mut state, center + Vec2::new(100.0, 0.0));
        bullet_at(&mut state, center + Vec2::new(50.0, 0.0), 10.0, BulletKind::Enemy, false);
        bullet_at(&mut state, center + Vec2::new(50.0, 0.0), 10.0, BulletKind::Player, false);
        let id = state.alloc_id();
        state.emp_blasts.push(crate::sim::factory::create_emp(id, center));
        for _ in 0..30 {
            update_emp(&mut state, 1.0);
        }
        assert!(state.enemies[0].is_stunned());
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].side, Side::Friendly);
    }
}
