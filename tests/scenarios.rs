//! End-to-end runs through the session controller

use glam::Vec2;
use tank_arena::audio::RecordingAudio;
use tank_arena::persistence::MemoryStorage;
use tank_arena::sim::entities::{BulletKind, Rank, Variant};
use tank_arena::sim::factory::{TankSpec, create_bullet, create_orb, create_tank};
use tank_arena::sim::weather::WeatherKind;
use tank_arena::sim::{GameStatus, TickInput, UpgradeKind};
use tank_arena::{Profile, Session, SoundEffect, angle_of};

type TestSession = Session<MemoryStorage, RecordingAudio>;

const FRAME_MS: f32 = 1000.0 / 60.0;

fn running_session(seed: u64) -> TestSession {
    let mut session = Session::new(MemoryStorage::new(), RecordingAudio::default(), seed);
    session.start();
    let state = session.state_mut();
    state.space_debris.clear();
    state.buildings.clear();
    session
}

fn player_center(session: &TestSession) -> Vec2 {
    session.state().player.as_ref().unwrap().body.center()
}

fn add_enemy(session: &mut TestSession, center: Vec2) -> u32 {
    let state = session.state_mut();
    let id = state.alloc_id();
    let world = state.world_size();
    let spec = TankSpec::enemy(1, Variant::Default, Rank::Regular).at(center);
    let mut tank = create_tank(&mut state.rng, id, &spec, world);
    tank.health = 1000.0;
    tank.max_health = 1000.0;
    tank.fire_cooldown = 10_000.0;
    state.enemies.push(tank);
    id
}

#[test]
fn lethal_hit_without_shield_ends_run_and_records_score() {
    let mut session = running_session(1);
    let center = player_center(&session);
    let state = session.state_mut();
    state.score = 4_321;
    state.player.as_mut().unwrap().health = 15.0;
    let id = state.alloc_id();
    state
        .bullets
        .push(create_bullet(id, center, Vec2::ZERO, 20.0, BulletKind::Enemy, false));

    let rearm = session.frame(FRAME_MS, &TickInput::default());
    assert!(!rearm);
    assert_eq!(session.state().status, GameStatus::GameOver);
    assert!(session.state().player.is_none());
    assert_eq!(session.state().shields, 0);
    assert_eq!(session.high_scores().top_score(), Some(4_321));
    assert_eq!(session.high_scores().entries[0].country, "US");
    assert_eq!(session.snapshot().status, GameStatus::GameOver);
    assert!(!session.frame(FRAME_MS, &TickInput::default()));
}

#[test]
fn shield_absorbs_lethal_damage() {
    let mut session = running_session(2);
    session.state_mut().score = 5_000;
    assert!(session.buy_shield());
    session.state_mut().player.as_mut().unwrap().health = 0.0;

    assert!(session.frame(FRAME_MS, &TickInput::default()));
    let state = session.state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.shields, 0);
    let player = state.player.as_ref().unwrap();
    assert!(player.health > 0.0);
    assert!(player.invincible);
    assert!(player.invincibility_timer > 0.0);
    assert_eq!(Profile::load(session.storage()).shields, 0);
}

#[test]
fn experience_threshold_pauses_for_three_choices() {
    let mut session = running_session(3);
    let center = player_center(&session);
    let state = session.state_mut();
    state.player.as_mut().unwrap().experience = 99.0;
    let id = state.alloc_id();
    state.orbs.push(create_orb(id, center, 5.0));

    assert!(session.frame(FRAME_MS, &TickInput::default()));
    let state = session.state();
    let player = state.player.as_ref().unwrap();
    assert_eq!(player.level, 2);
    assert!(player.experience < player.xp_threshold(state.tuning.xp_per_level));
    assert_eq!(state.status, GameStatus::LevelUpPause);
    let choices = &state.upgrade_choices;
    assert_eq!(choices.len(), 3);
    assert!(choices.iter().all(|c| choices.iter().filter(|d| *d == c).count() == 1));
    assert!(session.snapshot().is_level_up_prompt());
    assert!(session.audio().played.contains(&SoundEffect::LevelUp));

    // Paused: time stands still
    let time = session.state().time;
    assert!(session.frame(FRAME_MS, &TickInput::default()));
    assert_eq!(session.state().time, time);
}

#[test]
fn select_upgrade_applies_once() {
    let mut session = running_session(4);
    assert!(!session.select_upgrade(UpgradeKind::Damage));

    let state = session.state_mut();
    state.status = GameStatus::LevelUpPause;
    state.upgrade_choices = vec![UpgradeKind::Damage, UpgradeKind::Speed, UpgradeKind::FireRate];
    let damage = state.player.as_ref().unwrap().damage;

    assert!(!session.select_upgrade(UpgradeKind::Piercing));
    assert!(session.select_upgrade(UpgradeKind::Damage));
    assert!(!session.select_upgrade(UpgradeKind::Damage));
    let state = session.state();
    assert_eq!(state.status, GameStatus::Playing);
    assert!(state.upgrade_choices.is_empty());
    assert!((state.player.as_ref().unwrap().damage - damage * 1.15).abs() < 1e-4);
}

#[test]
fn boss_tier_replaces_enemies_with_one_boss() {
    let mut session = running_session(5);
    let center = player_center(&session);
    for i in 0..4 {
        add_enemy(&mut session, center + Vec2::new(-300.0 + 150.0 * i as f32, -250.0));
    }
    session.state_mut().time = 110.0;

    assert!(session.frame(FRAME_MS, &TickInput::default()));
    let state = session.state();
    assert_eq!(state.difficulty, 5);
    assert!(state.enemies.is_empty());
    assert!(state.boss.is_some());
    assert!(session.audio().played.contains(&SoundEffect::BossWarning));
    assert!(session.snapshot().boss.is_some());

    // The tier never spawns a second boss
    let boss_id = state.boss.as_ref().unwrap().body.id;
    for _ in 0..30 {
        session.frame(FRAME_MS, &TickInput::default());
    }
    if let Some(boss) = session.state().boss.as_ref() {
        assert_eq!(boss.body.id, boss_id);
    }
}

#[test]
fn piercing_bullet_passes_through_stacked_targets() {
    let mut session = running_session(6);
    let target = player_center(&session) + Vec2::new(0.0, -250.0);
    let first = add_enemy(&mut session, target);
    let second = add_enemy(&mut session, target);
    let state = session.state_mut();
    let id = state.alloc_id();
    state
        .bullets
        .push(create_bullet(id, target, Vec2::new(2.0, 0.0), 30.0, BulletKind::Player, true));

    assert!(session.frame(FRAME_MS, &TickInput::default()));
    let state = session.state();
    for enemy_id in [first, second] {
        let enemy = state.enemies.iter().find(|e| e.body.id == enemy_id).unwrap();
        assert_eq!(enemy.health, 970.0);
    }
    let bullet = state.bullets.iter().find(|b| b.body.id == id).unwrap();
    assert!(bullet.hits.contains(&first) && bullet.hits.contains(&second));
    assert!(bullet.body.center().x > target.x);

    // Already-hit targets are not damaged again on later frames
    session.frame(FRAME_MS, &TickInput::default());
    let state = session.state();
    let enemy = state.enemies.iter().find(|e| e.body.id == first).unwrap();
    assert_eq!(enemy.health, 970.0);
}

#[test]
fn rain_deflects_every_shot() {
    let mut session = running_session(7);
    let origin = player_center(&session);
    let enemy = add_enemy(&mut session, origin + Vec2::new(260.0, -120.0));
    let state = session.state_mut();
    let tuning = state.tuning.clone();
    state.weather.set_kind(&mut state.rng, WeatherKind::Rain, &tuning);

    let fire = TickInput {
        fire: true,
        ..TickInput::default()
    };
    let mut checked = 0;
    for _ in 0..200 {
        let aim = session
            .state()
            .enemies
            .iter()
            .find(|e| e.body.id == enemy)
            .map(|e| e.body.center() - player_center(&session));
        let known: Vec<u32> = session.state().bullets.iter().map(|b| b.body.id).collect();
        session.frame(FRAME_MS, &fire);
        let (Some(aim), Some(player)) = (aim, session.state().player.as_ref()) else {
            break;
        };
        if player.body.center() != origin {
            break;
        }
        for bullet in session.state().bullets.iter() {
            if bullet.kind == BulletKind::Player && !known.contains(&bullet.body.id) {
                assert!((angle_of(bullet.vel) - angle_of(aim)).abs() > 1e-4);
                checked += 1;
            }
        }
        if checked >= 5 {
            break;
        }
    }
    assert!(checked >= 1);
}
