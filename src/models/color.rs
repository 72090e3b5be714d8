//! Color identity normalization.
//!
//! A deck's color identity is stored as free text ("ubw", "G W", ""). The
//! canonical key keeps the five mana letters once each, in WUBRG order, and
//! collapses to `C` when no letter is present.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana letters in canonical order.
const WUBRG: [char; 5] = ['W', 'U', 'B', 'R', 'G'];

/// Colorless sentinel key.
pub const COLORLESS: &str = "C";

/// Display names indexed by color bitmask (bit 0 = W ... bit 4 = G).
const NAMES: [&str; 32] = [
    "Colorless",  // -
    "Mono White", // W
    "Mono Blue",  // U
    "Azorius",    // WU
    "Mono Black", // B
    "Orzhov",     // WB
    "Dimir",      // UB
    "Esper",      // WUB
    "Mono Red",   // R
    "Boros",      // WR
    "Izzet",      // UR
    "Jeskai",     // WUR
    "Rakdos",     // BR
    "Mardu",      // WBR
    "Grixis",     // UBR
    "Not Green",  // WUBR
    "Mono Green", // G
    "Selesnya",   // WG
    "Simic",      // UG
    "Bant",       // WUG
    "Golgari",    // BG
    "Abzan",      // WBG
    "Sultai",     // UBG
    "Not Red",    // WUBG
    "Gruul",      // RG
    "Naya",       // WRG
    "Temur",      // URG
    "Not Black",  // WURG
    "Jund",       // BRG
    "Not Blue",   // WBRG
    "Not White",  // UBRG
    "5 Color",    // WUBRG
];

fn letter_bit(c: char) -> Option<u8> {
    WUBRG
        .iter()
        .position(|&l| l == c.to_ascii_uppercase())
        .map(|i| 1 << i)
}

fn mask_of(raw: &str) -> u8 {
    raw.chars().filter_map(letter_bit).fold(0, |acc, bit| acc | bit)
}

fn key_of(mask: u8) -> String {
    if mask == 0 {
        return COLORLESS.to_string();
    }
    WUBRG
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, c)| *c)
        .collect()
}

/// Canonical key for a raw color identity string.
pub fn normalize_color_identity(raw: &str) -> String {
    key_of(mask_of(raw))
}

/// Friendly name for a canonical key; unknown keys are returned unchanged.
pub fn color_display_name(key: &str) -> String {
    match ColorIdentity::from_canonical(key) {
        Some(identity) => identity.display_name().to_string(),
        None => key.to_string(),
    }
}

/// A normalized color identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorIdentity(u8);

impl ColorIdentity {
    pub const COLORLESS: ColorIdentity = ColorIdentity(0);

    /// Normalize any raw string; never fails.
    pub fn parse(raw: &str) -> Self {
        Self(mask_of(raw))
    }

    /// Accept only keys already in canonical form.
    pub fn from_canonical(key: &str) -> Option<Self> {
        let parsed = Self::parse(key);
        (parsed.key() == key).then_some(parsed)
    }

    pub fn key(&self) -> String {
        key_of(self.0)
    }

    pub fn display_name(&self) -> &'static str {
        NAMES[self.0 as usize & 0x1f]
    }

    /// Number of colors (0 for colorless).
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_colorless(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, letter: char) -> bool {
        letter_bit(letter).is_some_and(|bit| self.0 & bit != 0)
    }
}

impl Default for ColorIdentity {
    fn default() -> Self {
        Self::COLORLESS
    }
}

impl fmt::Display for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl fmt::Debug for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorIdentity({})", self.key())
    }
}

impl Serialize for ColorIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for ColorIdentity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
