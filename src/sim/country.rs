//! Country table, cosmetic tank palettes and country abilities
//!
//! Static lookup data: country code -> palette and ability. Unknown codes fall
//! back to the default palette and no ability.

use serde::{Deserialize, Serialize};

use super::entities::AbilityKind;

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB` (leading `#` optional)
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Scale each channel by `(100 + percent) / 100`, saturating
    pub fn shade(self, percent: i32) -> Self {
        let scale = |c: u8| -> u8 {
            let v = (c as i32 * (100 + percent)) / 100;
            v.clamp(0, 255) as u8
        };
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

const TRACK_COLOR: Rgb = Rgb(0x36, 0x36, 0x36);

/// Cosmetic design descriptor handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankDesign {
    pub base: Rgb,
    pub turret: Rgb,
    pub shadow: Rgb,
    pub highlight: Rgb,
    pub track: Rgb,
}

impl TankDesign {
    pub fn new(base: Rgb, turret: Rgb) -> Self {
        Self {
            base,
            turret,
            shadow: base.shade(-30),
            highlight: base.shade(20),
            track: TRACK_COLOR,
        }
    }
}

/// Named palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Palette {
    Default,
    NatoGreen,
    NatoCamo,
    Desert,
    ForestCamo,
    Snow,
    Urban,
    RussianGreen,
    AsianCamo,
    Boss,
}

impl Palette {
    pub fn design(self) -> TankDesign {
        let (base, turret) = match self {
            Palette::Default => (Rgb(0xBD, 0xB7, 0x6B), Rgb(0xF0, 0xE6, 0x8C)),
            Palette::NatoGreen => (Rgb(0x55, 0x6B, 0x2F), Rgb(0x6B, 0x8E, 0x23)),
            Palette::NatoCamo => (Rgb(0x6B, 0x8E, 0x23), Rgb(0x80, 0x80, 0x00)),
            Palette::Desert => (Rgb(0xC1, 0x9A, 0x6B), Rgb(0xD2, 0xB4, 0x8C)),
            Palette::ForestCamo => (Rgb(0x22, 0x8B, 0x22), Rgb(0x00, 0x80, 0x00)),
            Palette::Snow => (Rgb(0xF5, 0xF5, 0xF5), Rgb(0xDC, 0xDC, 0xDC)),
            Palette::Urban => (Rgb(0x69, 0x69, 0x69), Rgb(0xA9, 0xA9, 0xA9)),
            Palette::RussianGreen => (Rgb(0x3d, 0x4d, 0x2d), Rgb(0x4e, 0x5b, 0x42)),
            Palette::AsianCamo => (Rgb(0x55, 0x6B, 0x2F), Rgb(0x66, 0x7d, 0x33)),
            Palette::Boss => (Rgb(0x2C, 0x00, 0x1E), Rgb(0x8A, 0x2B, 0xE2)),
        };
        TankDesign::new(base, turret)
    }
}

/// A selectable country
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
    pub palette: Palette,
    pub ability: AbilityKind,
}

macro_rules! country {
    ($code:literal, $name:literal, $flag:literal, $palette:ident, $ability:ident) => {
        Country {
            code: $code,
            name: $name,
            flag: $flag,
            palette: Palette::$palette,
            ability: AbilityKind::$ability,
        }
    };
}

pub static COUNTRIES: &[Country] = &[
    country!("US", "USA", "🇺🇸", NatoGreen, Overdrive),
    country!("TR", "Turkey", "🇹🇷", NatoCamo, AegisShield),
    country!("DE", "Germany", "🇩🇪", ForestCamo, GoldenBullet),
    country!("RU", "Russia", "🇷🇺", RussianGreen, EmpBlast),
    country!("JP", "Japan", "🇯🇵", AsianCamo, Overdrive),
    country!("IN", "India", "🇮🇳", Desert, QuickRepair),
    country!("CN", "China", "🇨🇳", AsianCamo, GoldenBullet),
    country!("FR", "France", "🇫🇷", NatoCamo, AegisShield),
    country!("GB", "UK", "🇬🇧", NatoGreen, AegisShield),
    country!("BR", "Brazil", "🇧🇷", ForestCamo, Overdrive),
    country!("CA", "Canada", "🇨🇦", Snow, QuickRepair),
    country!("IT", "Italy", "🇮🇹", NatoCamo, AegisShield),
    country!("AU", "Australia", "🇦🇺", Desert, Overdrive),
    country!("KR", "S. Korea", "🇰🇷", AsianCamo, GoldenBullet),
    country!("MX", "Mexico", "🇲🇽", Desert, Overdrive),
    country!("ES", "Spain", "🇪🇸", NatoCamo, AegisShield),
    country!("SA", "Saudi Arabia", "🇸🇦", Desert, QuickRepair),
    country!("AR", "Argentina", "🇦🇷", ForestCamo, Overdrive),
    country!("NL", "Netherlands", "🇳🇱", NatoCamo, AegisShield),
    country!("SE", "Sweden", "🇸🇪", Snow, QuickRepair),
    country!("CH", "Switzerland", "🇨🇭", Snow, QuickRepair),
    country!("PL", "Poland", "🇵🇱", ForestCamo, AegisShield),
    country!("BE", "Belgium", "🇧🇪", NatoCamo, AegisShield),
    country!("ID", "Indonesia", "🇮🇩", ForestCamo, Overdrive),
    country!("NG", "Nigeria", "🇳🇬", Desert, Overdrive),
    country!("ZA", "S. Africa", "🇿🇦", Desert, QuickRepair),
    country!("EG", "Egypt", "🇪🇬", Desert, QuickRepair),
    country!("PK", "Pakistan", "🇵🇰", Desert, QuickRepair),
    country!("BD", "Bangladesh", "🇧🇩", ForestCamo, Overdrive),
    country!("VN", "Vietnam", "🇻🇳", AsianCamo, GoldenBullet),
    country!("PH", "Philippines", "🇵🇭", ForestCamo, Overdrive),
    country!("GR", "Greece", "🇬🇷", NatoCamo, AegisShield),
    country!("TH", "Thailand", "🇹🇭", AsianCamo, GoldenBullet),
    country!("CL", "Chile", "🇨🇱", Desert, Overdrive),
    country!("PE", "Peru", "🇵🇪", ForestCamo, Overdrive),
    country!("CO", "Colombia", "🇨🇴", ForestCamo, Overdrive),
    country!("IR", "Iran", "🇮🇷", Desert, EmpBlast),
    country!("IQ", "Iraq", "🇮🇶", Desert, EmpBlast),
    country!("UA", "Ukraine", "🇺🇦", ForestCamo, EmpBlast),
    country!("CZ", "Czechia", "🇨🇿", ForestCamo, AegisShield),
    country!("HU", "Hungary", "🇭🇺", ForestCamo, AegisShield),
    country!("RO", "Romania", "🇷🇴", ForestCamo, AegisShield),
    country!("PT", "Portugal", "🇵🇹", NatoCamo, AegisShield),
    country!("IE", "Ireland", "🇮🇪", ForestCamo, Overdrive),
    country!("NZ", "New Zealand", "🇳🇿", ForestCamo, Overdrive),
    country!("SG", "Singapore", "🇸🇬", Urban, GoldenBullet),
    country!("DK", "Denmark", "🇩🇰", Snow, QuickRepair),
    country!("NO", "Norway", "🇳🇴", Snow, QuickRepair),
    country!("AT", "Austria", "🇦🇹", Snow, AegisShield),
    country!("FI", "Finland", "🇫🇮", Snow, QuickRepair),
];

/// Fallback used for unknown codes and for boss units
pub const DEFAULT_COUNTRY: Country = Country {
    code: "XX",
    name: "Unknown",
    flag: "🏳",
    palette: Palette::Default,
    ability: AbilityKind::None,
};

/// Look up a country by code (case-insensitive)
pub fn find_country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Look up a country, falling back to the default entry
pub fn country_or_default(code: &str) -> &'static Country {
    find_country(code).unwrap_or(&DEFAULT_COUNTRY)
}
