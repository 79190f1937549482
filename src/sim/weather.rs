//! Weather system
//!
//! A countdown picks the next weather kind (random, or from a scripted
//! sequence in the tuning) and regenerates its precipitation particles.
//! Weather has real gameplay effects: snow slows movement, rain bends and
//! slows bullets, fog shortens how far hostiles can see.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeatherKind {
    #[default]
    Clear,
    Rain,
    Snow,
    Fog,
}

const ALL_WEATHER: [WeatherKind; 4] = [
    WeatherKind::Clear,
    WeatherKind::Rain,
    WeatherKind::Snow,
    WeatherKind::Fog,
];

/// A precipitation particle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

/// Active weather descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub kind: WeatherKind,
    /// 0..1, scales particle density and fog opacity
    pub intensity: f32,
    /// Frames until the next change
    pub timer: f32,
    pub particles: Vec<WeatherParticle>,
    /// Next entry of the scripted sequence
    script_index: usize,
}

impl Weather {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            kind: WeatherKind::Clear,
            intensity: 0.0,
            timer: tuning.weather_first_change,
            particles: Vec::new(),
            script_index: 0,
        }
    }

    /// Count down and move particles. Returns true when the kind changed.
    pub fn update(&mut self, rng: &mut impl Rng, dt: f32, tuning: &Tuning) -> bool {
        let world = tuning.world_size();
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            // Wrap around world bounds
            p.pos.x = p.pos.x.rem_euclid(world.x);
            p.pos.y = p.pos.y.rem_euclid(world.y);
        }

        self.timer -= dt;
        if self.timer > 0.0 {
            return false;
        }
        let previous = self.kind;
        let next = self.next_kind(rng, tuning);
        self.set_kind(rng, next, tuning);
        self.timer = tuning.weather_duration_min + rng.random::<f32>() * tuning.weather_duration_range;
        self.kind != previous
    }

    fn next_kind(&mut self, rng: &mut impl Rng, tuning: &Tuning) -> WeatherKind {
        if tuning.weather_script.is_empty() {
            return ALL_WEATHER[rng.random_range(0..ALL_WEATHER.len())];
        }
        let kind = tuning.weather_script[self.script_index % tuning.weather_script.len()];
        self.script_index += 1;
        kind
    }

    /// Switch to `kind` immediately and regenerate particles
    pub fn set_kind(&mut self, rng: &mut impl Rng, kind: WeatherKind, tuning: &Tuning) {
        self.kind = kind;
        self.intensity = if kind == WeatherKind::Clear {
            0.0
        } else {
            tuning.weather_intensity_min + rng.random::<f32>() * tuning.weather_intensity_range
        };

        let world = tuning.world_size();
        let count = match kind {
            WeatherKind::Rain => 100,
            WeatherKind::Snow => 150,
            WeatherKind::Clear | WeatherKind::Fog => 0,
        };
        self.particles = (0..count)
            .map(|_| {
                let pos = Vec2::new(rng.random::<f32>() * world.x, rng.random::<f32>() * world.y);
                match kind {
                    WeatherKind::Rain => WeatherParticle {
                        pos,
                        vel: Vec2::new(1.0, 8.0 + rng.random::<f32>() * 4.0),
                        size: 10.0 + rng.random::<f32>() * 10.0,
                    },
                    _ => WeatherParticle {
                        pos,
                        vel: Vec2::new((rng.random::<f32>() - 0.5) * 1.0, 1.0 + rng.random::<f32>()),
                        size: 1.0 + rng.random::<f32>() * 2.0,
                    },
                }
            })
            .collect();
        log::debug!("Weather -> {:?} ({:.2})", kind, self.intensity);
    }

    /// Multiplier on tank movement
    pub fn movement_factor(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            WeatherKind::Snow => tuning.snow_slowdown,
            _ => 1.0,
        }
    }

    /// Multiplier on bullet muzzle speed
    pub fn bullet_speed_factor(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            WeatherKind::Rain => tuning.rain_bullet_speed_factor,
            _ => 1.0,
        }
    }

    /// How far hostiles can see
    pub fn detection_range(&self, tuning: &Tuning) -> f32 {
        match self.kind {
            WeatherKind::Fog => tuning.fog_detection_range,
            _ => tuning.clear_detection_range,
        }
    }

    /// Angular deviation (radians) applied to a freshly fired bullet
    ///
    /// Under rain this is never exactly zero.
    pub fn aim_deviation(&self, rng: &mut impl Rng, tuning: &Tuning) -> f32 {
        if self.kind != WeatherKind::Rain || tuning.rain_inaccuracy <= 0.0 {
            return 0.0;
        }
        let deviation = (rng.random::<f32>() - 0.5) * tuning.rain_inaccuracy;
        let floor = (tuning.rain_inaccuracy / 2.0).min(0.005);
        if deviation.abs() < floor {
            floor.copysign(if deviation == 0.0 { 1.0 } else { deviation })
        } else {
            deviation
        }
    }
}
