//! Sort keys, sort direction and the column-group cycles of the stats tables.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EntityLabel;
use crate::models::{EliminationType, StatRecord, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Column a table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    Name,
    Games,
    Wins,
    WinRate,
    AvgWinTurn,
    AvgFirstElimTurn,
    AvgElimTurn,
    TotalDecks,
    ActiveDecks,
    ElimsMade(EliminationType),
    ElimsTaken(EliminationType),
}

impl SortKey {
    /// Numeric value used for ordering. Missing data counts as 0.
    fn value<K>(&self, record: &StatRecord<K>, window: Window) -> f64 {
        let derived = &record.derived;
        let decks = record.deck_counts.unwrap_or_default();
        match self {
            SortKey::Name => 0.0,
            SortKey::Games => record.games(window) as f64,
            SortKey::Wins => record.wins(window) as f64,
            SortKey::WinRate => record.win_rate(window),
            SortKey::AvgWinTurn => derived.avg_win_turn.sort_value(),
            SortKey::AvgFirstElimTurn => derived.avg_first_elim_turn.sort_value(),
            SortKey::AvgElimTurn => derived.avg_elim_turn.sort_value(),
            SortKey::TotalDecks => decks.total as f64,
            SortKey::ActiveDecks => decks.active as f64,
            SortKey::ElimsMade(kind) => derived.elims_made_pct.get(*kind),
            SortKey::ElimsTaken(kind) => derived.elims_taken_pct.get(*kind),
        }
    }

    fn compare<K: EntityLabel>(&self, a: &StatRecord<K>, b: &StatRecord<K>, window: Window) -> Ordering {
        match self {
            SortKey::Name => a.key.label().to_lowercase().cmp(&b.key.label().to_lowercase()),
            _ => self
                .value(a, window)
                .partial_cmp(&self.value(b, window))
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Games => write!(f, "games"),
            SortKey::Wins => write!(f, "wins"),
            SortKey::WinRate => write!(f, "winrate"),
            SortKey::AvgWinTurn => write!(f, "win-turn"),
            SortKey::AvgFirstElimTurn => write!(f, "first-elim-turn"),
            SortKey::AvgElimTurn => write!(f, "elim-turn"),
            SortKey::TotalDecks => write!(f, "decks"),
            SortKey::ActiveDecks => write!(f, "active-decks"),
            SortKey::ElimsMade(kind) => write!(f, "made-{}", kind.code().to_ascii_lowercase()),
            SortKey::ElimsTaken(kind) => write!(f, "taken-{}", kind.code().to_ascii_lowercase()),
        }
    }
}

fn kind_from_code(code: &str) -> Option<EliminationType> {
    EliminationType::ALL
        .into_iter()
        .find(|k| code.eq_ignore_ascii_case(&k.code().to_string()))
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "name" => SortKey::Name,
            "games" => SortKey::Games,
            "wins" => SortKey::Wins,
            "winrate" | "win-rate" => SortKey::WinRate,
            "win-turn" => SortKey::AvgWinTurn,
            "first-elim-turn" => SortKey::AvgFirstElimTurn,
            "elim-turn" => SortKey::AvgElimTurn,
            "decks" => SortKey::TotalDecks,
            "active-decks" => SortKey::ActiveDecks,
            other => {
                let parsed = if let Some(code) = other.strip_prefix("made-") {
                    kind_from_code(code).map(SortKey::ElimsMade)
                } else if let Some(code) = other.strip_prefix("taken-") {
                    kind_from_code(code).map(SortKey::ElimsTaken)
                } else {
                    None
                };
                return parsed.ok_or_else(|| format!("unknown sort key '{}'", s));
            }
        };
        Ok(key)
    }
}

/// Average-turn column group: win, first elimination, own elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnSortMode {
    WinDesc,
    WinAsc,
    FirstElimDesc,
    FirstElimAsc,
    ElimDesc,
    ElimAsc,
}

impl TurnSortMode {
    pub const FIRST: TurnSortMode = TurnSortMode::WinDesc;

    pub fn next(self) -> Self {
        match self {
            TurnSortMode::WinDesc => TurnSortMode::WinAsc,
            TurnSortMode::WinAsc => TurnSortMode::FirstElimDesc,
            TurnSortMode::FirstElimDesc => TurnSortMode::FirstElimAsc,
            TurnSortMode::FirstElimAsc => TurnSortMode::ElimDesc,
            TurnSortMode::ElimDesc => TurnSortMode::ElimAsc,
            TurnSortMode::ElimAsc => TurnSortMode::WinDesc,
        }
    }

    pub fn sort(&self) -> (SortKey, SortOrder) {
        match self {
            TurnSortMode::WinDesc => (SortKey::AvgWinTurn, SortOrder::Desc),
            TurnSortMode::WinAsc => (SortKey::AvgWinTurn, SortOrder::Asc),
            TurnSortMode::FirstElimDesc => (SortKey::AvgFirstElimTurn, SortOrder::Desc),
            TurnSortMode::FirstElimAsc => (SortKey::AvgFirstElimTurn, SortOrder::Asc),
            TurnSortMode::ElimDesc => (SortKey::AvgElimTurn, SortOrder::Desc),
            TurnSortMode::ElimAsc => (SortKey::AvgElimTurn, SortOrder::Asc),
        }
    }
}

/// Deck-count column group: active decks, then all decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckCountSortMode {
    ActiveDesc,
    ActiveAsc,
    TotalDesc,
    TotalAsc,
}

impl DeckCountSortMode {
    pub const FIRST: DeckCountSortMode = DeckCountSortMode::ActiveDesc;

    pub fn next(self) -> Self {
        match self {
            DeckCountSortMode::ActiveDesc => DeckCountSortMode::ActiveAsc,
            DeckCountSortMode::ActiveAsc => DeckCountSortMode::TotalDesc,
            DeckCountSortMode::TotalDesc => DeckCountSortMode::TotalAsc,
            DeckCountSortMode::TotalAsc => DeckCountSortMode::ActiveDesc,
        }
    }

    pub fn sort(&self) -> (SortKey, SortOrder) {
        match self {
            DeckCountSortMode::ActiveDesc => (SortKey::ActiveDecks, SortOrder::Desc),
            DeckCountSortMode::ActiveAsc => (SortKey::ActiveDecks, SortOrder::Asc),
            DeckCountSortMode::TotalDesc => (SortKey::TotalDecks, SortOrder::Desc),
            DeckCountSortMode::TotalAsc => (SortKey::TotalDecks, SortOrder::Asc),
        }
    }
}

/// Elimination-share column group. Always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EliminationSortMode {
    Combat,
    Commander,
    NonCombat,
    Other,
}

impl EliminationSortMode {
    pub const FIRST: EliminationSortMode = EliminationSortMode::Combat;

    pub fn next(self) -> Self {
        match self {
            EliminationSortMode::Combat => EliminationSortMode::Commander,
            EliminationSortMode::Commander => EliminationSortMode::NonCombat,
            EliminationSortMode::NonCombat => EliminationSortMode::Other,
            EliminationSortMode::Other => EliminationSortMode::Combat,
        }
    }

    pub fn kind(&self) -> EliminationType {
        match self {
            EliminationSortMode::Combat => EliminationType::CombatDamage,
            EliminationSortMode::Commander => EliminationType::CommanderDamage,
            EliminationSortMode::NonCombat => EliminationType::NonCombatDamage,
            EliminationSortMode::Other => EliminationType::Other,
        }
    }
}

/// Multi-column header that cycles through several sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortGroup {
    Turns,
    DeckCounts,
    ElimsMade,
    ElimsTaken,
}

impl FromStr for SortGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turns" => Ok(SortGroup::Turns),
            "decks" | "deck-counts" => Ok(SortGroup::DeckCounts),
            "made" | "elims-made" => Ok(SortGroup::ElimsMade),
            "taken" | "elims-taken" => Ok(SortGroup::ElimsTaken),
            _ => Err(format!("unknown sort group '{}'", s)),
        }
    }
}

/// Position inside a group cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleMode {
    Turns(TurnSortMode),
    DeckCounts(DeckCountSortMode),
    ElimsMade(EliminationSortMode),
    ElimsTaken(EliminationSortMode),
}

impl CycleMode {
    fn first(group: SortGroup) -> Self {
        match group {
            SortGroup::Turns => CycleMode::Turns(TurnSortMode::FIRST),
            SortGroup::DeckCounts => CycleMode::DeckCounts(DeckCountSortMode::FIRST),
            SortGroup::ElimsMade => CycleMode::ElimsMade(EliminationSortMode::FIRST),
            SortGroup::ElimsTaken => CycleMode::ElimsTaken(EliminationSortMode::FIRST),
        }
    }

    pub fn group(&self) -> SortGroup {
        match self {
            CycleMode::Turns(_) => SortGroup::Turns,
            CycleMode::DeckCounts(_) => SortGroup::DeckCounts,
            CycleMode::ElimsMade(_) => SortGroup::ElimsMade,
            CycleMode::ElimsTaken(_) => SortGroup::ElimsTaken,
        }
    }

    fn next(self) -> Self {
        match self {
            CycleMode::Turns(m) => CycleMode::Turns(m.next()),
            CycleMode::DeckCounts(m) => CycleMode::DeckCounts(m.next()),
            CycleMode::ElimsMade(m) => CycleMode::ElimsMade(m.next()),
            CycleMode::ElimsTaken(m) => CycleMode::ElimsTaken(m.next()),
        }
    }

    fn sort(&self) -> (SortKey, SortOrder) {
        match self {
            CycleMode::Turns(m) => m.sort(),
            CycleMode::DeckCounts(m) => m.sort(),
            CycleMode::ElimsMade(m) => (SortKey::ElimsMade(m.kind()), SortOrder::Desc),
            CycleMode::ElimsTaken(m) => (SortKey::ElimsTaken(m.kind()), SortOrder::Desc),
        }
    }
}

/// Current sort of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleMode>,
}

impl Default for SortState {
    fn default() -> Self {
        Self::new(SortKey::WinRate, SortOrder::Desc)
    }
}

impl SortState {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self {
            key,
            order,
            cycle: None,
        }
    }

    /// Same key flips the order; a new key starts descending and leaves any cycle.
    pub fn toggle(&mut self, key: SortKey) {
        if self.cycle.is_none() && self.key == key {
            self.order = self.order.flip();
        } else {
            *self = Self::new(key, SortOrder::Desc);
        }
    }

    /// Enter `group` at its first state, or advance when already in it.
    pub fn cycle(&mut self, group: SortGroup) {
        let mode = match self.cycle {
            Some(mode) if mode.group() == group => mode.next(),
            _ => CycleMode::first(group),
        };
        let (key, order) = mode.sort();
        self.key = key;
        self.order = order;
        self.cycle = Some(mode);
    }
}

/// Stable sort of `records` by `state`, reading windowed columns from `window`.
pub fn sort_records<K: EntityLabel>(records: &mut [&StatRecord<K>], state: &SortState, window: Window) {
    records.sort_by(|a, b| {
        let ordering = state.key.compare(a, b, window);
        match state.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
