//! Level-up upgrade catalog

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::entities::Tank;

/// An upgrade offered on level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    MaxHealth,
    Speed,
    Damage,
    FireRate,
    Piercing,
}

pub const ALL_UPGRADES: [UpgradeKind; 5] = [
    UpgradeKind::MaxHealth,
    UpgradeKind::Speed,
    UpgradeKind::Damage,
    UpgradeKind::FireRate,
    UpgradeKind::Piercing,
];

impl UpgradeKind {
    /// Localization key for the title
    pub fn key(self) -> &'static str {
        match self {
            UpgradeKind::MaxHealth => "maxHealth",
            UpgradeKind::Speed => "speed",
            UpgradeKind::Damage => "damage",
            UpgradeKind::FireRate => "fireRate",
            UpgradeKind::Piercing => "piercing",
        }
    }

    /// One-shot upgrades are never offered again once owned
    pub fn is_one_shot(self) -> bool {
        self == UpgradeKind::Piercing
    }

    pub fn is_owned(self, tank: &Tank) -> bool {
        match self {
            UpgradeKind::Piercing => tank.piercing,
            _ => false,
        }
    }

    /// Apply the upgrade's transform to the tank
    pub fn apply(self, tank: &mut Tank) {
        match self {
            UpgradeKind::MaxHealth => tank.set_max_health(tank.max_health * 1.2),
            UpgradeKind::Speed => tank.speed *= 1.15,
            UpgradeKind::Damage => tank.damage *= 1.15,
            UpgradeKind::FireRate => tank.max_cooldown *= 0.8,
            UpgradeKind::Piercing => tank.piercing = true,
        }
    }
}

/// Draw up to `count` distinct upgrades, skipping owned one-shots
pub fn draw_choices(rng: &mut impl Rng, tank: &Tank, count: usize) -> Vec<UpgradeKind> {
    let mut pool: Vec<UpgradeKind> = ALL_UPGRADES
        .iter()
        .copied()
        .filter(|u| !(u.is_one_shot() && u.is_owned(tank)))
        .collect();
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}
