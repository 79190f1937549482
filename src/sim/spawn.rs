//! Difficulty curve and spawning policy

use glam::Vec2;
use rand::Rng;

use super::effects::{TextTone, floating_text};
use super::entities::{Rank, Variant};
use super::factory::{
    TankSpec, create_asteroid, create_black_hole, create_drone, create_mine, create_power_up,
    create_solar_flare, create_tank, edge_point, interior_point, random_power_up_kind,
};
use super::state::{GameEvent, GameState};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::tuning::Tuning;

/// Difficulty tier for an elapsed run time in seconds
///
/// Tier 1 through the grace period, then `1 + floor(((t - grace) / period)^exp)`.
pub fn difficulty_for(time: f32, tuning: &Tuning) -> u32 {
    if time < tuning.difficulty_grace_secs {
        return 1;
    }
    let x = (time - tuning.difficulty_grace_secs) / tuning.difficulty_period_secs;
    1 + x.powf(tuning.difficulty_exponent).floor() as u32
}

/// Frames between regular enemy spawns at a tier
pub fn enemy_spawn_interval(difficulty: u32, champion_rush: bool, tuning: &Tuning) -> f32 {
    let base = if champion_rush {
        tuning.enemy_spawn_base_champion_rush
    } else {
        tuning.enemy_spawn_base
    };
    (base - tuning.enemy_spawn_step * difficulty as f32).max(tuning.enemy_spawn_floor)
}

/// Chance that a spawn is replaced by a formation
pub fn formation_chance(difficulty: u32, tuning: &Tuning) -> f32 {
    if difficulty < tuning.formation_min_difficulty {
        return 0.0;
    }
    (0.05 * (difficulty as f32 - 2.0)).min(0.35)
}

/// Run every spawn timer for one frame
pub(crate) fn update(state: &mut GameState, dt: f32) {
    if try_boss_wave(state) {
        return;
    }

    let t = &mut state.timers;
    t.enemy -= dt;
    t.mine -= dt;
    t.drone -= dt;
    t.power_up -= dt;
    t.asteroid -= dt;
    t.solar_flare -= dt;
    t.black_hole -= dt;
    t.boss_respite = (t.boss_respite - dt).max(0.0);

    let d = state.difficulty;
    let world = state.world_size();

    if state.timers.enemy <= 0.0 {
        state.timers.enemy = enemy_spawn_interval(d, state.mods.champion_rush, &state.tuning);
        if state.boss.is_none() && state.timers.boss_respite <= 0.0 && state.enemies.len() < MAX_ENEMIES {
            spawn_enemies(state);
        }
    }

    if state.timers.mine <= 0.0 {
        state.timers.mine = state.rng.random_range(1200.0..1800.0);
        if state.mines.len() < MAX_MINES {
            let id = state.alloc_id();
            let mine = create_mine(&mut state.rng, id, world);
            state.mines.push(mine);
        }
    }

    if state.timers.drone <= 0.0 {
        state.timers.drone = state.rng.random_range(600.0..900.0);
        let target = state.player.as_ref().map(|p| p.body.id);
        match target {
            Some(target) if state.drones.len() < MAX_DRONES => {
                let id = state.alloc_id();
                let drone = create_drone(&mut state.rng, id, d, target, world);
                log::debug!("Drone {} launched", id);
                state.drones.push(drone);
            }
            _ => {}
        }
    }

    if state.timers.power_up <= 0.0 {
        state.timers.power_up = state.rng.random_range(900.0..1500.0);
        if state.power_ups.len() < MAX_POWERUPS {
            let id = state.alloc_id();
            let kind = random_power_up_kind(&mut state.rng);
            let center = interior_point(&mut state.rng, world, 60.0);
            state.power_ups.push(create_power_up(id, kind, center));
        }
    }

    if state.timers.asteroid <= 0.0 {
        state.timers.asteroid = state.rng.random_range(900.0..1500.0);
        if d >= 2 && state.asteroids.len() < MAX_ASTEROIDS {
            let id = state.alloc_id();
            let asteroid = create_asteroid(&mut state.rng, id, world);
            state.asteroids.push(asteroid);
        }
    }

    if state.timers.solar_flare <= 0.0 {
        state.timers.solar_flare = state.rng.random_range(1500.0..2400.0);
        if d >= 3 {
            let id = state.alloc_id();
            let flare = create_solar_flare(&mut state.rng, id, world);
            state.effects.floating_texts.push(floating_text(
                flare.pos,
                "SOLAR FLARE",
                TextTone::Warning,
                flare.max_timer,
            ));
            state.solar_flares.push(flare);
        }
    }

    if state.timers.black_hole <= 0.0 {
        state.timers.black_hole = state.rng.random_range(2400.0..3600.0);
        if d >= 4 && state.black_holes.is_empty() {
            let id = state.alloc_id();
            let hole = create_black_hole(&mut state.rng, id, world);
            state.black_holes.push(hole);
        }
    }
}

/// Replace regular enemies with a boss when a new boss tier is reached
fn try_boss_wave(state: &mut GameState) -> bool {
    let d = state.difficulty;
    let interval = state.tuning.boss_wave_interval;
    if d % interval != 0 || d <= state.last_boss_tier || state.boss.is_some() {
        return false;
    }
    state.last_boss_tier = d;
    state.enemies.clear();
    state.artillery_targets.clear();

    let id = state.alloc_id();
    let world = state.world_size();
    let spec = TankSpec::boss(d).hard(state.mods.hard_mode);
    let boss = create_tank(&mut state.rng, id, &spec, world);
    state.effects.floating_texts.push(floating_text(
        Vec2::new(world.x * 0.5, world.y * 0.3),
        "BOSS INCOMING",
        TextTone::Boss,
        120.0,
    ));
    state.effects.screen_shake.trigger(10.0, 30.0);
    state.boss = Some(boss);
    state.play(SoundEffect::BossWarning);
    state.emit(GameEvent::BossWave { difficulty: d });
    log::info!("Boss wave at difficulty {}", d);
    true
}

fn pick_rank(state: &mut GameState) -> Rank {
    if state.mods.champion_rush {
        Rank::Champion
    } else if state.rng.random::<f32>() < state.tuning.elite_chance {
        Rank::Elite
    } else {
        Rank::Regular
    }
}

fn pick_variant(state: &mut GameState) -> Variant {
    let roll = state.rng.random::<f32>();
    if roll < state.tuning.spawner_chance {
        Variant::Spawner
    } else if roll < state.tuning.spawner_chance + state.tuning.artillery_chance {
        Variant::Artillery
    } else {
        Variant::Default
    }
}

fn spawn_one(state: &mut GameState, variant: Variant, rank: Rank, center: Option<Vec2>) {
    let id = state.alloc_id();
    let world = state.world_size();
    let mut spec = TankSpec::enemy(state.difficulty, variant, rank).hard(state.mods.hard_mode);
    spec.center = center;
    let tank = create_tank(&mut state.rng, id, &spec, world);
    state.enemies.push(tank);
}

/// A single enemy, or now and then a themed formation
fn spawn_enemies(state: &mut GameState) {
    let d = state.difficulty;
    let world = state.world_size();
    if state.rng.random::<f32>() < formation_chance(d, &state.tuning) {
        if state.rng.random_bool(0.5) {
            // Line of swarmers along the top edge
            let spacing = world.x / 6.0;
            for i in 1..=5 {
                let center = Vec2::new(spacing * i as f32, SWARMER_HEIGHT);
                spawn_one(state, Variant::Swarmer, Rank::Regular, Some(center));
            }
            log::debug!("Swarmer line formation");
        } else {
            let size = Vec2::new(TANK_WIDTH, TANK_HEIGHT);
            let center = edge_point(&mut state.rng, world, size);
            let offset = Vec2::new(TANK_WIDTH * 1.5, 0.0);
            spawn_one(state, Variant::Artillery, Rank::Regular, Some(center - offset));
            spawn_one(state, Variant::Artillery, Rank::Regular, Some(center + offset));
            log::debug!("Artillery pair formation");
        }
        return;
    }
    let rank = pick_rank(state);
    let variant = pick_variant(state);
    spawn_one(state, variant, rank, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RunSetup;

    #[test]
    fn test_difficulty_curve() {
        let tuning = Tuning::default();
        assert_eq!(difficulty_for(0.0, &tuning), 1);
        assert_eq!(difficulty_for(29.9, &tuning), 1);
        assert_eq!(difficulty_for(60.0, &tuning), 2);
        // ((120 - 30) / 30)^1.5 = 5.196
        assert_eq!(difficulty_for(120.0, &tuning), 6);
    }

    #[test]
    fn test_spawn_interval_floor() {
        let tuning = Tuning::default();
        assert_eq!(enemy_spawn_interval(1, false, &tuning), 232.0);
        assert_eq!(enemy_spawn_interval(1, true, &tuning), 592.0);
        assert_eq!(enemy_spawn_interval(100, false, &tuning), 30.0);
    }

    #[test]
    fn test_formation_chance() {
        let tuning = Tuning::default();
        assert_eq!(formation_chance(2, &tuning), 0.0);
        assert!((formation_chance(3, &tuning) - 0.05).abs() < 1e-6);
        assert!((formation_chance(50, &tuning) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_boss_wave_once_per_tier() {
        let mut state = GameState::new(3);
        state.start(&RunSetup {
            country: "US".into(),
            ..RunSetup::default()
        });
        state.difficulty = 5;
        for _ in 0..3 {
            spawn_one(&mut state, Variant::Default, Rank::Regular, None);
        }
        update(&mut state, 1.0);
        assert!(state.enemies.is_empty());
        assert!(state.boss.is_some());
        assert_eq!(state.last_boss_tier, 5);

        // Boss killed at the same tier: no second boss
        state.boss = None;
        update(&mut state, 1.0);
        assert!(state.boss.is_none());
    }
}
