//! Data-driven game balance
//!
//! [`Tuning`] mirrors the balance constants that define observable game feel.
//! Every field defaults to the shipped value, so a JSON file only needs the
//! keys it wants to override. Invalid files are logged and ignored.

use std::fmt;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::sim::weather::WeatherKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // ── Arena ────────────────────────────────────────────────────────────────
    pub world_width: f32,
    pub world_height: f32,
    pub space_debris_count: usize,
    pub building_count: usize,

    // ── Difficulty curve ─────────────────────────────────────────────────────
    /// Seconds at tier 1 before the curve starts
    pub difficulty_grace_secs: f32,
    /// Seconds per unit of curve input
    pub difficulty_period_secs: f32,
    pub difficulty_exponent: f32,
    /// Boss waves arrive at multiples of this tier
    pub boss_wave_interval: u32,

    // ── Enemy spawning (frames) ──────────────────────────────────────────────
    pub enemy_spawn_base: f32,
    pub enemy_spawn_base_champion_rush: f32,
    pub enemy_spawn_step: f32,
    pub enemy_spawn_floor: f32,
    pub artillery_chance: f32,
    pub spawner_chance: f32,
    pub elite_chance: f32,
    pub formation_min_difficulty: u32,

    // ── Weather ──────────────────────────────────────────────────────────────
    pub rain_inaccuracy: f32,
    pub rain_bullet_speed_factor: f32,
    pub snow_slowdown: f32,
    pub fog_detection_range: f32,
    pub clear_detection_range: f32,
    pub weather_intensity_min: f32,
    pub weather_intensity_range: f32,
    pub weather_first_change: f32,
    pub weather_duration_min: f32,
    pub weather_duration_range: f32,
    /// When non-empty, weather cycles through this list instead of rolling
    pub weather_script: Vec<WeatherKind>,

    // ── Economy ──────────────────────────────────────────────────────────────
    pub shield_cost: u64,
    pub beacon_cost: u64,
    pub ally_cost: u64,
    pub max_allies: usize,
    pub max_allies_with_support: usize,
    pub xp_per_level: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            space_debris_count: 4,
            building_count: 3,

            difficulty_grace_secs: 30.0,
            difficulty_period_secs: 30.0,
            difficulty_exponent: 1.5,
            boss_wave_interval: 5,

            enemy_spawn_base: 240.0,
            enemy_spawn_base_champion_rush: 600.0,
            enemy_spawn_step: 8.0,
            enemy_spawn_floor: 30.0,
            artillery_chance: 0.2,
            spawner_chance: 0.08,
            elite_chance: 0.1,
            formation_min_difficulty: 3,

            rain_inaccuracy: 0.12,
            rain_bullet_speed_factor: 0.9,
            snow_slowdown: 0.8,
            fog_detection_range: 200.0,
            clear_detection_range: 500.0,
            weather_intensity_min: 0.2,
            weather_intensity_range: 0.2,
            weather_first_change: 600.0,
            weather_duration_min: 1200.0,
            weather_duration_range: 1200.0,
            weather_script: Vec::new(),

            shield_cost: 5000,
            beacon_cost: 5000,
            ally_cost: 3000,
            max_allies: 1,
            max_allies_with_support: 3,
            xp_per_level: 100.0,
        }
    }
}

/// Rejected tuning input
#[derive(Debug)]
pub enum TuningError {
    /// The JSON could not be read or parsed
    Parse(String),
    /// A value is outside its usable range
    OutOfRange {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(msg) => write!(f, "tuning could not be parsed: {}", msg),
            TuningError::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "tuning '{}' = {} is outside {}", name, value, expected),
        }
    }
}

impl std::error::Error for TuningError {}

fn check(name: &'static str, value: f32, ok: bool, expected: &'static str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}

impl Tuning {
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| TuningError::Parse(e.to_string()))
            .and_then(|json| Self::from_json(&json));
        match loaded {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({})", e);
                Self::default()
            }
        }
    }

    /// Reject values that would break the curves the step relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        check("world_width", self.world_width, self.world_width >= 200.0, "[200, inf)")?;
        check("world_height", self.world_height, self.world_height >= 200.0, "[200, inf)")?;
        check(
            "difficulty_period_secs",
            self.difficulty_period_secs,
            self.difficulty_period_secs > 0.0,
            "(0, inf)",
        )?;
        check(
            "difficulty_exponent",
            self.difficulty_exponent,
            self.difficulty_exponent > 0.0,
            "(0, inf)",
        )?;
        check(
            "boss_wave_interval",
            self.boss_wave_interval as f32,
            self.boss_wave_interval >= 2,
            "[2, inf)",
        )?;
        check(
            "enemy_spawn_floor",
            self.enemy_spawn_floor,
            self.enemy_spawn_floor > 0.0 && self.enemy_spawn_floor <= self.enemy_spawn_base,
            "(0, enemy_spawn_base]",
        )?;
        check(
            "enemy_spawn_step",
            self.enemy_spawn_step,
            self.enemy_spawn_step >= 0.0,
            "[0, inf)",
        )?;
        check(
            "rain_inaccuracy",
            self.rain_inaccuracy,
            (0.0..=std::f32::consts::PI).contains(&self.rain_inaccuracy),
            "[0, pi]",
        )?;
        check("xp_per_level", self.xp_per_level, self.xp_per_level > 0.0, "(0, inf)")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "boss_wave_interval": 3, "weather_script": ["Rain", "Fog"] }"#)
            .unwrap();
        assert_eq!(tuning.boss_wave_interval, 3);
        assert_eq!(tuning.weather_script, vec![WeatherKind::Rain, WeatherKind::Fog]);
        assert_eq!(tuning.shield_cost, 5000);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "difficulty_exponent": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "difficulty_exponent",
                ..
            }
        ));
        assert!(matches!(
            Tuning::from_json("{ nope").unwrap_err(),
            TuningError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file_defaults() {
        let tuning = Tuning::load_or_default(Path::new("/definitely/not/here.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
