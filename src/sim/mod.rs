//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable frame delta, clamped to three nominal frames
//! - Seeded RNG only, owned by the state
//! - Stable iteration order (insertion order of each collection)
//! - No rendering, audio or storage dependencies; side effects leave as events

pub mod abilities;
pub mod collision;
pub mod combat;
pub mod country;
pub mod effects;
pub mod entities;
pub mod factory;
pub mod hazards;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod upgrades;
pub mod weather;

pub use abilities::{activate_ability, activate_adrenaline};
pub use collision::{Body, EntityId, HasBody};
pub use combat::enemy_base_score;
pub use country::{COUNTRIES, Country, TankDesign, find_country};
pub use entities::{AbilityKind, Bullet, BulletKind, Faction, Rank, Tank, Variant};
pub use spawn::difficulty_for;
pub use state::{EntityRef, GameEvent, GameState, GameStatus, Mods, RunSetup};
pub use tick::{TickInput, tick};
pub use upgrades::UpgradeKind;
pub use weather::WeatherKind;
