//! Persisted player profile
//!
//! Country selection, cosmetic customization, active mods, cheat unlocks,
//! the tutorial flag and the purchased shield count. Stored as one JSON
//! record; malformed or missing fields fall back to defaults.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::persistence::{PROFILE_KEY, Storage, load_json, save_json};
use crate::sim::country::{Rgb, TankDesign};
use crate::sim::state::Mods;

/// Run modifier selectable before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMod {
    HardMode,
    ChampionRush,
    AllySupport,
    GlassCannon,
}

impl GameMod {
    pub const ALL: [GameMod; 4] = [
        GameMod::HardMode,
        GameMod::ChampionRush,
        GameMod::AllySupport,
        GameMod::GlassCannon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMod::HardMode => "hard_mode",
            GameMod::ChampionRush => "champion_rush",
            GameMod::AllySupport => "ally_support",
            GameMod::GlassCannon => "glass_cannon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// Tank colours as hex strings (`#RRGGBB`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customization {
    pub base: String,
    pub turret: String,
}

impl Customization {
    pub fn new(base: impl Into<String>, turret: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            turret: turret.into(),
        }
    }

    /// Parsed design, `None` when either colour is malformed
    pub fn design(&self) -> Option<TankDesign> {
        let base = Rgb::from_hex(&self.base)?;
        let turret = Rgb::from_hex(&self.turret)?;
        Some(TankDesign::new(base, turret))
    }
}

/// Unlock flag granted by the hangar cheat
pub const UNLOCK_ALL_MODS: &str = "all_mods";

/// Player profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Purchased shields carried between runs
    pub shields: u32,
    pub tutorial_seen: bool,
    /// Selected country code
    pub country: String,
    /// Custom colours; `None` uses the country palette
    pub customization: Option<Customization>,
    /// Active mod names; unknown names are kept but ignored
    pub mods: Vec<String>,
    pub unlocks: BTreeSet<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            shields: 0,
            tutorial_seen: false,
            country: "US".to_string(),
            customization: None,
            mods: Vec::new(),
            unlocks: BTreeSet::new(),
        }
    }
}

impl Profile {
    /// Active mods as flags
    pub fn mods(&self) -> Mods {
        let mut mods = Mods::default();
        for name in &self.mods {
            match GameMod::parse(name) {
                Some(GameMod::HardMode) => mods.hard_mode = true,
                Some(GameMod::ChampionRush) => mods.champion_rush = true,
                Some(GameMod::AllySupport) => mods.ally_support = true,
                Some(GameMod::GlassCannon) => mods.glass_cannon = true,
                None => log::debug!("Ignoring unknown mod '{}'", name),
            }
        }
        mods
    }

    pub fn set_mods(&mut self, mods: &[GameMod]) {
        self.mods = mods.iter().map(|m| m.as_str().to_string()).collect();
        self.mods.dedup();
    }

    /// Custom design if one is set and well-formed
    pub fn design(&self) -> Option<TankDesign> {
        self.customization.as_ref().and_then(Customization::design)
    }

    pub fn is_unlocked(&self, flag: &str) -> bool {
        self.unlocks.contains(flag)
    }

    /// Load from storage; unavailable or malformed data gives the defaults
    pub fn load(storage: &impl Storage) -> Self {
        match load_json::<Profile>(storage, PROFILE_KEY) {
            Ok(Some(profile)) => {
                log::info!("Loaded profile ({} shields)", profile.shields);
                profile
            }
            Ok(None) => {
                log::info!("No profile found, using defaults");
                Self::default()
            }
            Err(err) => {
                log::warn!("Profile unavailable ({}), using defaults", err);
                Self::default()
            }
        }
    }

    /// Save to storage; failures are logged and dropped
    pub fn save(&self, storage: &mut impl Storage) {
        match save_json(storage, PROFILE_KEY, self) {
            Ok(()) => log::info!("Profile saved"),
            Err(err) => log::warn!("Could not save profile: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_mod_parsing_ignores_unknown() {
        let profile = Profile {
            mods: vec!["hard_mode".into(), "moon_gravity".into(), "glass_cannon".into()],
            ..Profile::default()
        };
        let mods = profile.mods();
        assert!(mods.hard_mode && mods.glass_cannon);
        assert!(!mods.champion_rush && !mods.ally_support);
    }

    #[test]
    fn test_malformed_customization_defaults() {
        let mut profile = Profile::default();
        profile.customization = Some(Customization::new("#112233", "not-a-colour"));
        assert!(profile.design().is_none());
        profile.customization = Some(Customization::new("#112233", "#445566"));
        let design = profile.design().unwrap();
        assert_eq!(design.base, Rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_profile_persists() {
        let mut storage = MemoryStorage::new();
        let mut profile = Profile::default();
        profile.shields = 4;
        profile.set_mods(&[GameMod::AllySupport]);
        profile.unlocks.insert(UNLOCK_ALL_MODS.to_string());
        profile.save(&mut storage);

        let loaded = Profile::load(&storage);
        assert_eq!(loaded, profile);
        assert!(loaded.mods().ally_support);

        storage.write(PROFILE_KEY, "[1, 2").unwrap();
        assert_eq!(Profile::load(&storage), Profile::default());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let mut storage = MemoryStorage::new();
        storage.write(PROFILE_KEY, r#"{"shields": 2}"#).unwrap();
        let loaded = Profile::load(&storage);
        assert_eq!(loaded.shields, 2);
        assert_eq!(loaded.country, "US");
    }
}
