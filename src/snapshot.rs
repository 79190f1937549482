//! Read-only projection of the world for presentation
//!
//! Published by the session at a lower rate than the step runs.

use serde::{Deserialize, Serialize};

use crate::sim::entities::AbilityKind;
use crate::sim::state::{GameState, GameStatus};
use crate::sim::upgrades::UpgradeKind;
use crate::sim::weather::WeatherKind;

/// Boss health bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossBar {
    pub health: f32,
    pub max_health: f32,
}

/// Player ability readout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityView {
    pub kind: AbilityKind,
    pub cooldown: f32,
    pub max_cooldown: f32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: GameStatus,
    pub health: f32,
    pub max_health: f32,
    pub score: u64,
    /// Elapsed run time in seconds
    pub time: f32,
    pub difficulty: u32,
    pub shields: u32,
    pub boss: Option<BossBar>,
    pub level: u32,
    pub experience: f32,
    pub experience_needed: f32,
    /// Level-up prompt choices (empty unless paused for a level-up)
    pub upgrade_choices: Vec<UpgradeKind>,
    pub kill_streak: u32,
    pub multiplier: f32,
    pub ally_count: usize,
    pub ability: Option<AbilityView>,
    pub adrenaline: f32,
    pub adrenaline_active: bool,
    pub weather: WeatherKind,
    pub beacon_purchased: bool,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = state.player.as_ref();
        let xp_per_level = state.tuning.xp_per_level;
        Self {
            status: state.status,
            health: player.map_or(0.0, |p| p.health),
            max_health: player.map_or(0.0, |p| p.max_health),
            score: state.score,
            time: state.time,
            difficulty: state.difficulty,
            shields: state.shields,
            boss: state.boss.as_ref().map(|b| BossBar {
                health: b.health,
                max_health: b.max_health,
            }),
            level: player.map_or(1, |p| p.level),
            experience: player.map_or(0.0, |p| p.experience),
            experience_needed: player.map_or(xp_per_level, |p| p.xp_threshold(xp_per_level)),
            upgrade_choices: state.upgrade_choices.clone(),
            kill_streak: state.kill_streak,
            multiplier: state.streak_multiplier(),
            ally_count: state.allies.len(),
            ability: player
                .filter(|p| p.ability.kind != AbilityKind::None)
                .map(|p| AbilityView {
                    kind: p.ability.kind,
                    cooldown: p.ability.cooldown,
                    max_cooldown: p.ability.max_cooldown,
                    active: p.ability.active,
                }),
            adrenaline: player.map_or(0.0, |p| p.adrenaline.meter),
            adrenaline_active: player.is_some_and(|p| p.adrenaline.is_active()),
            weather: state.weather.kind,
            beacon_purchased: state.beacon_purchased,
        }
    }

    pub fn is_level_up_prompt(&self) -> bool {
        self.status == GameStatus::LevelUpPause && !self.upgrade_choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RunSetup;

    #[test]
    fn test_capture_reflects_state() {
        let mut state = GameState::new(7);
        let idle = Snapshot::capture(&state);
        assert_eq!(idle.status, GameStatus::Start);
        assert_eq!(idle.health, 0.0);

        state.start(&RunSetup {
            country: "RU".into(),
            shields: 2,
            ..RunSetup::default()
        });
        state.kill_streak = 12;
        let snap = Snapshot::capture(&state);
        assert_eq!(snap.health, 100.0);
        assert_eq!(snap.shields, 2);
        assert!((snap.multiplier - 1.2).abs() < 1e-6);
        assert_eq!(snap.ability.map(|a| a.kind), Some(AbilityKind::EmpBlast));
        assert!(snap.boss.is_none());
        assert!(!snap.is_level_up_prompt());
    }
}
