//! Statistic records: raw counters gathered per entity and the ratios derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{ColorIdentity, EliminationType};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of `part` in `whole`, one decimal; 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

/// A counting scope. Serialized as its display string ("total", "recent", "2024").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {
    /// Lifetime total (HIST)
    Total,
    /// Every year at or after the configured cutoff (PRM)
    Recent,
    /// A single calendar year
    Year(u16),
}

impl Window {
    /// Short label used on medal tables.
    pub fn label(&self) -> String {
        match self {
            Window::Total => "HIST".to_string(),
            Window::Recent => "PRM".to_string(),
            Window::Year(y) => y.to_string(),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Total => write!(f, "total"),
            Window::Recent => write!(f, "recent"),
            Window::Year(y) => write!(f, "{}", y),
        }
    }
}

impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "hist" | "all" => Ok(Window::Total),
            "recent" | "prm" => Ok(Window::Recent),
            other => other
                .parse::<u16>()
                .map(Window::Year)
                .map_err(|_| format!("unknown window '{}': use total, recent or a year", s)),
        }
    }
}

impl Serialize for Window {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Window {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Games and wins inside one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub games: u32,
    pub wins: u32,
}

impl WindowCounts {
    pub fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    pub fn add(&mut self, other: WindowCounts) {
        self.games += other.games;
        self.wins += other.wins;
    }

    /// Win rate in percent, one decimal.
    pub fn win_rate(&self) -> f64 {
        percentage(self.wins, self.games)
    }
}

/// Count of eliminations per cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationTally {
    pub combat_damage: u32,
    pub commander_damage: u32,
    pub non_combat_damage: u32,
    pub other: u32,
}

impl EliminationTally {
    pub fn increment(&mut self, kind: EliminationType) {
        *self.slot_mut(kind) += 1;
    }

    pub fn get(&self, kind: EliminationType) -> u32 {
        match kind {
            EliminationType::CombatDamage => self.combat_damage,
            EliminationType::CommanderDamage => self.commander_damage,
            EliminationType::NonCombatDamage => self.non_combat_damage,
            EliminationType::Other => self.other,
        }
    }

    fn slot_mut(&mut self, kind: EliminationType) -> &mut u32 {
        match kind {
            EliminationType::CombatDamage => &mut self.combat_damage,
            EliminationType::CommanderDamage => &mut self.commander_damage,
            EliminationType::NonCombatDamage => &mut self.non_combat_damage,
            EliminationType::Other => &mut self.other,
        }
    }

    pub fn total(&self) -> u32 {
        EliminationType::ALL.iter().map(|k| self.get(*k)).sum()
    }

    pub fn add(&mut self, other: &EliminationTally) {
        for kind in EliminationType::ALL {
            *self.slot_mut(kind) += other.get(kind);
        }
    }

    /// Percentage mix; all zero when nothing was tallied.
    pub fn shares(&self) -> EliminationShare {
        let total = self.total();
        EliminationShare {
            combat: percentage(self.combat_damage, total),
            commander: percentage(self.commander_damage, total),
            non_combat: percentage(self.non_combat_damage, total),
            other: percentage(self.other, total),
        }
    }
}

/// Percentage mix of elimination causes (C/D/N/O).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminationShare {
    #[serde(rename = "C")]
    pub combat: f64,
    #[serde(rename = "D")]
    pub commander: f64,
    #[serde(rename = "N")]
    pub non_combat: f64,
    #[serde(rename = "O")]
    pub other: f64,
}

impl EliminationShare {
    pub fn get(&self, kind: EliminationType) -> f64 {
        match kind {
            EliminationType::CombatDamage => self.combat,
            EliminationType::CommanderDamage => self.commander,
            EliminationType::NonCombatDamage => self.non_combat,
            EliminationType::Other => self.other,
        }
    }

    pub fn sum(&self) -> f64 {
        self.combat + self.commander + self.non_combat + self.other
    }
}

/// Mean of a list of turn samples; `None` when there are no samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AverageTurn(Option<f64>);

impl AverageTurn {
    pub fn of(samples: &[u32]) -> Self {
        if samples.is_empty() {
            return Self(None);
        }
        let sum: u64 = samples.iter().map(|&t| t as u64).sum();
        Self(Some(round1(sum as f64 / samples.len() as f64)))
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    /// Value for ordering: missing data sorts as 0.
    pub fn sort_value(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

impl fmt::Display for AverageTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.1}", v),
            None => write!(f, "-"),
        }
    }
}

/// Raw counters for one entity. Only ever grows during accumulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatCounters {
    pub total: WindowCounts,
    pub recent: WindowCounts,
    pub years: BTreeMap<u16, WindowCounts>,

    /// Turn at which the entity won (the match's last elimination turn)
    pub win_turns: Vec<u32>,
    /// Turn at which the entity was knocked out
    pub elim_turns: Vec<u32>,
    /// Turn of the entity's first elimination of an opponent, one per match
    pub first_elim_turns: Vec<u32>,

    pub elims_made: EliminationTally,
    pub elims_taken: EliminationTally,
}

impl StatCounters {
    /// Count one game in the lifetime, year and recent windows.
    pub fn record_game(&mut self, year: Option<u16>, recent_cutoff: u16, won: bool) {
        self.total.record(won);
        if let Some(year) = year {
            self.years.entry(year).or_default().record(won);
            if year >= recent_cutoff {
                self.recent.record(won);
            }
        }
    }

    pub fn window(&self, window: Window) -> WindowCounts {
        match window {
            Window::Total => self.total,
            Window::Recent => self.recent,
            Window::Year(y) => self.years.get(&y).copied().unwrap_or_default(),
        }
    }

    /// Fold another entity's counters into this one.
    pub fn merge(&mut self, other: &StatCounters) {
        self.total.add(other.total);
        self.recent.add(other.recent);
        for (year, counts) in &other.years {
            self.years.entry(*year).or_default().add(*counts);
        }
        self.win_turns.extend_from_slice(&other.win_turns);
        self.elim_turns.extend_from_slice(&other.elim_turns);
        self.first_elim_turns.extend_from_slice(&other.first_elim_turns);
        self.elims_made.add(&other.elims_made);
        self.elims_taken.add(&other.elims_taken);
    }

    /// Reduce the counters to rates, averages and shares.
    pub fn derive(&self) -> DerivedStats {
        DerivedStats {
            winrate_total: self.total.win_rate(),
            winrate_recent: self.recent.win_rate(),
            winrate_by_year: self
                .years
                .iter()
                .map(|(year, counts)| (*year, counts.win_rate()))
                .collect(),
            avg_win_turn: AverageTurn::of(&self.win_turns),
            avg_elim_turn: AverageTurn::of(&self.elim_turns),
            avg_first_elim_turn: AverageTurn::of(&self.first_elim_turns),
            elims_made_pct: self.elims_made.shares(),
            elims_taken_pct: self.elims_taken.shares(),
        }
    }
}

/// Values computed from [`StatCounters`] during finalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub winrate_total: f64,
    pub winrate_recent: f64,
    pub winrate_by_year: BTreeMap<u16, f64>,
    pub avg_win_turn: AverageTurn,
    pub avg_elim_turn: AverageTurn,
    pub avg_first_elim_turn: AverageTurn,
    pub elims_made_pct: EliminationShare,
    pub elims_taken_pct: EliminationShare,
}

impl DerivedStats {
    pub fn win_rate(&self, window: Window) -> f64 {
        match window {
            Window::Total => self.winrate_total,
            Window::Recent => self.winrate_recent,
            Window::Year(y) => self.winrate_by_year.get(&y).copied().unwrap_or(0.0),
        }
    }
}

/// Number of decks behind a player or a color group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCounts {
    pub total: u32,
    pub active: u32,
}

/// Finalized statistics for a player, a deck or a color group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord<K> {
    pub key: K,

    /// Most recently seen activity flag
    pub is_active: bool,

    /// Canonical colors (decks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_identity: Option<ColorIdentity>,

    /// Decks owned or grouped (players and color groups)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_counts: Option<DeckCounts>,

    pub counters: StatCounters,
    pub derived: DerivedStats,
}

impl<K> StatRecord<K> {
    /// Build a record, deriving every ratio from `counters`.
    pub fn new(key: K, is_active: bool, counters: StatCounters) -> Self {
        let derived = counters.derive();
        Self {
            key,
            is_active,
            color_identity: None,
            deck_counts: None,
            counters,
            derived,
        }
    }

    pub fn with_color_identity(mut self, colors: ColorIdentity) -> Self {
        self.color_identity = Some(colors);
        self
    }

    pub fn with_deck_counts(mut self, counts: DeckCounts) -> Self {
        self.deck_counts = Some(counts);
        self
    }

    pub fn games(&self, window: Window) -> u32 {
        self.counters.window(window).games
    }

    pub fn wins(&self, window: Window) -> u32 {
        self.counters.window(window).wins
    }

    pub fn win_rate(&self, window: Window) -> f64 {
        self.derived.win_rate(window)
    }

    /// Years with at least one game, ascending.
    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.counters.years.keys().copied()
    }
}
