//! Session controller
//!
//! Owns the world, the persisted profile and leaderboard, and the outbound
//! audio sink. The host calls [`Session::frame`] once per rendered frame and
//! forwards user intents between frames; single-threaded ownership means no
//! intent can land mid-step.

use crate::audio::{AudioSink, SoundEffect};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::persistence::Storage;
use crate::settings::{Customization, GameMod, Profile, UNLOCK_ALL_MODS};
use crate::sim::country::find_country;
use crate::sim::effects::{TextTone, floating_text};
use crate::sim::state::{GameEvent, GameState, GameStatus, RunSetup};
use crate::sim::tick::{TickInput, tick};
use crate::sim::upgrades::UpgradeKind;
use crate::sim::{abilities, spawn};
use crate::snapshot::Snapshot;
use crate::tuning::Tuning;

/// Simulated milliseconds between snapshot publications
pub const SNAPSHOT_INTERVAL_MS: f32 = 100.0;

pub struct Session<S: Storage, A: AudioSink> {
    storage: S,
    audio: A,
    state: GameState,
    profile: Profile,
    high_scores: HighScores,
    snapshot: Snapshot,
    since_snapshot: f32,
    published_status: GameStatus,
}

impl<S: Storage, A: AudioSink> Session<S, A> {
    /// Create a session, loading the profile and leaderboard from `storage`
    pub fn new(storage: S, audio: A, seed: u64) -> Self {
        Self::with_tuning(storage, audio, seed, Tuning::default())
    }

    pub fn with_tuning(storage: S, audio: A, seed: u64, tuning: Tuning) -> Self {
        let profile = Profile::load(&storage);
        let high_scores = HighScores::load(&storage);
        let state = GameState::with_tuning(seed, tuning);
        let snapshot = Snapshot::capture(&state);
        Self {
            storage,
            audio,
            published_status: state.status,
            state,
            profile,
            high_scores,
            snapshot,
            since_snapshot: 0.0,
        }
    }

    // --- Profile ---

    /// Select the player's country; unknown codes are ignored
    pub fn select_country(&mut self, code: &str) -> bool {
        let Some(country) = find_country(code) else {
            log::debug!("Ignoring unknown country '{}'", code);
            return false;
        };
        self.profile.country = country.code.to_string();
        self.profile.save(&mut self.storage);
        true
    }

    /// Set custom colours, or `None` for the country palette
    ///
    /// Malformed colours are ignored and the previous choice kept.
    pub fn set_customization(&mut self, customization: Option<Customization>) -> bool {
        if customization.as_ref().is_some_and(|c| c.design().is_none()) {
            log::debug!("Ignoring malformed customization {:?}", customization);
            return false;
        }
        self.profile.customization = customization;
        self.profile.save(&mut self.storage);
        true
    }

    pub fn set_mods(&mut self, mods: &[GameMod]) {
        self.profile.set_mods(mods);
        self.profile.save(&mut self.storage);
    }

    pub fn mark_tutorial_seen(&mut self) {
        if !self.profile.tutorial_seen {
            self.profile.tutorial_seen = true;
            self.profile.save(&mut self.storage);
        }
    }

    // --- Run lifecycle ---

    /// Reset the world and begin a run with the profile's selections
    pub fn start(&mut self) {
        let setup = RunSetup {
            country: self.profile.country.clone(),
            design: self.profile.design(),
            mods: self.profile.mods(),
            shields: self.profile.shields,
        };
        self.state.start(&setup);
        self.since_snapshot = 0.0;
        self.after_intent();
    }

    /// Advance by the wall-clock time since the previous frame
    ///
    /// Returns whether the host should schedule another frame.
    pub fn frame(&mut self, elapsed_ms: f32, input: &TickInput) -> bool {
        if !self.state.status.is_running() {
            return false;
        }
        let elapsed_ms = elapsed_ms.clamp(0.0, MAX_FRAME_DELTA * MS_PER_FRAME);
        tick(&mut self.state, input, elapsed_ms / MS_PER_FRAME);
        self.dispatch_events();

        self.since_snapshot += elapsed_ms;
        if self.since_snapshot >= SNAPSHOT_INTERVAL_MS || self.state.status != self.published_status
        {
            self.publish();
        }
        self.state.status.is_running()
    }

    // --- Purchases ---

    /// Trade score for a shield; the count persists across runs
    pub fn buy_shield(&mut self) -> bool {
        let cost = self.state.tuning.shield_cost;
        if !self.can_spend(cost) {
            return false;
        }
        self.state.score -= cost;
        self.state.shields += 1;
        self.profile.shields = self.state.shields;
        self.profile.save(&mut self.storage);
        self.state.play(SoundEffect::ShieldBuy);
        log::info!("Shield bought ({} held)", self.state.shields);
        self.after_intent();
        true
    }

    /// One-time purchase: death leaves a detonating beacon instead of ending the run
    pub fn buy_martyrs_beacon(&mut self) -> bool {
        let cost = self.state.tuning.beacon_cost;
        if self.state.beacon_purchased || !self.can_spend(cost) {
            return false;
        }
        self.state.score -= cost;
        self.state.beacon_purchased = true;
        self.state.play(SoundEffect::ShieldBuy);
        log::info!("Martyr's beacon bought");
        self.after_intent();
        true
    }

    /// Add an allied tank beside the player, up to the mod-dependent cap
    pub fn buy_ally(&mut self) -> bool {
        let cost = self.state.tuning.ally_cost;
        if self.state.allies.len() >= self.state.ally_cap() || !self.can_spend(cost) {
            return false;
        }
        let Some(anchor) = self.state.player.as_ref().map(|p| p.body.center()) else {
            return false;
        };
        self.state.score -= cost;
        let side = if self.state.allies.len() % 2 == 0 { -1.0 } else { 1.0 };
        self.state
            .spawn_ally(anchor + glam::Vec2::new(side * ALLY_OFFSET_X, 0.0));
        self.state.play(SoundEffect::ShieldBuy);
        log::info!("Ally bought ({} active)", self.state.allies.len());
        self.after_intent();
        true
    }

    fn can_spend(&self, cost: u64) -> bool {
        self.state.status == GameStatus::Playing && self.state.score >= cost
    }

    // --- Combat intents ---

    pub fn activate_ability(&mut self) -> bool {
        let activated = abilities::activate_ability(&mut self.state);
        self.after_intent();
        activated
    }

    pub fn activate_adrenaline(&mut self) -> bool {
        let activated = abilities::activate_adrenaline(&mut self.state);
        self.after_intent();
        activated
    }

    /// Apply an offered level-up upgrade and resume play
    pub fn select_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let applied = self.state.select_upgrade(kind);
        self.after_intent();
        applied
    }

    /// Apply a cheat code; unrecognized codes do nothing
    pub fn apply_cheat(&mut self, code: &str) -> bool {
        let text = match code.trim() {
            "openhangar" => {
                self.profile.unlocks.insert(UNLOCK_ALL_MODS.to_string());
                self.profile.save(&mut self.storage);
                "HANGAR OPEN!"
            }
            "12alillat" => {
                let Some(player) = self.state.player.as_mut() else {
                    return false;
                };
                player.damage *= 2.0;
                player.speed *= 1.5;
                player.max_cooldown *= 0.5;
                self.state.score += 100_000;
                "QUALITY BOOST!"
            }
            "gdmn100" => {
                if self.state.player.is_none() {
                    return false;
                }
                self.state.score += 25_000;
                self.state.shields += 5;
                self.profile.shields = self.state.shields;
                self.profile.save(&mut self.storage);
                "REINFORCEMENTS!"
            }
            _ => {
                log::debug!("Ignoring unknown cheat code");
                return false;
            }
        };

        if let Some(center) = self.state.player.as_ref().map(|p| p.body.center()) {
            let pos = center - glam::Vec2::new(0.0, 20.0);
            let label = floating_text(pos, text, TextTone::Cheat, 120.0);
            self.state.effects.floating_texts.push(label);
        }
        self.state.play(SoundEffect::Cheat);
        log::info!("Cheat applied: {}", text);
        self.after_intent();
        true
    }

    // --- Accessors ---

    /// Latest published snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct world access for hosts and tests
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Difficulty tier the current run time maps to
    pub fn difficulty(&self) -> u32 {
        spawn::difficulty_for(self.state.time, &self.state.tuning)
    }

    // --- Internals ---

    fn after_intent(&mut self) {
        self.dispatch_events();
        self.publish();
    }

    fn publish(&mut self) {
        self.snapshot = Snapshot::capture(&self.state);
        self.published_status = self.state.status;
        self.since_snapshot = 0.0;
    }

    /// Route step events to the audio sink and persistence
    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sound(effect) => self.audio.play(effect),
                GameEvent::ShieldConsumed { remaining } => {
                    self.profile.shields = remaining;
                    self.profile.save(&mut self.storage);
                }
                GameEvent::RunEnded { score } => {
                    match self.high_scores.add_score(score, &self.profile.country) {
                        Some(rank) => {
                            log::info!("New high score {} at rank {}", score, rank);
                            self.high_scores.save(&mut self.storage);
                        }
                        None => log::info!("Run ended with {} points", score),
                    }
                }
                GameEvent::LevelUp { level } => log::debug!("Level up event ({})", level),
                GameEvent::BossWave { difficulty } => {
                    log::debug!("Boss wave event ({})", difficulty)
                }
            }
        }
    }
}
