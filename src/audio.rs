//! Sound effect catalogue and playback sink
//!
//! The simulation only ever requests sounds; it never waits on playback.
//! Whatever implements [`AudioSink`] decides how (or whether) to play them.

use serde::{Deserialize, Serialize};

use crate::sim::entities::AbilityKind;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player fired
    Shoot,
    /// Something blew up
    Explosion,
    /// Player took damage
    Damage,
    /// Level gained
    LevelUp,
    /// Experience orb collected
    OrbPickup,
    /// Kill streak milestone
    Combo,
    /// Shield bought
    ShieldBuy,
    /// Cheat code accepted
    Cheat,
    /// Ability activated
    Ability(AbilityKind),
    /// Adrenaline activated
    Adrenaline,
    /// Power-up collected
    PowerUp,
    /// Boss incoming
    BossWarning,
}

impl SoundEffect {
    /// Asset name of the sound
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::Explosion => "explosion",
            SoundEffect::Damage => "damage",
            SoundEffect::LevelUp => "levelUp",
            SoundEffect::OrbPickup => "orbPickup",
            SoundEffect::Combo => "combo",
            SoundEffect::ShieldBuy => "shieldBuy",
            SoundEffect::Cheat => "cheat",
            SoundEffect::Ability(kind) => match kind {
                AbilityKind::AegisShield => "aegis",
                AbilityKind::Overdrive => "overdrive",
                AbilityKind::EmpBlast => "emp",
                AbilityKind::GoldenBullet => "goldenBullet",
                AbilityKind::QuickRepair => "repair",
                AbilityKind::None => "ability",
            },
            SoundEffect::Adrenaline => "adrenaline",
            SoundEffect::PowerUp => "powerUp",
            SoundEffect::BossWarning => "bossWarning",
        }
    }

    /// Relative playback volume (0.0 - 1.0)
    pub fn volume(self) -> f32 {
        match self {
            SoundEffect::Shoot => 0.3,
            SoundEffect::OrbPickup => 0.4,
            SoundEffect::Damage => 0.6,
            SoundEffect::Explosion | SoundEffect::BossWarning => 0.8,
            _ => 0.7,
        }
    }
}

/// Fire-and-forget sound output
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Discards every request
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Logs each request at debug level; used by the headless runner
#[derive(Debug, Default, Clone)]
pub struct LogAudio {
    master_volume: f32,
    muted: bool,
    played: u64,
}

impl LogAudio {
    pub fn new(master_volume: f32) -> Self {
        Self {
            master_volume: master_volume.clamp(0.0, 1.0),
            muted: false,
            played: 0,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Number of sounds played so far
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if self.muted {
            return;
        }
        self.played += 1;
        log::debug!(
            "play sound {} at {:.2}",
            effect.name(),
            effect.volume() * self.master_volume
        );
    }
}

/// Records every request; handy for asserting on outbound signals
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<SoundEffect>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.played.push(effect);
    }
}
