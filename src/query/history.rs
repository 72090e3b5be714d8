//! Match history: filtering and sorting of individual matches.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SortOrder;
use crate::models::{Match, Participant};

/// How the max elimination turn is compared against the filter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnComparison {
    #[default]
    Equals,
    Greater,
    Less,
}

impl TurnComparison {
    pub fn holds(&self, turn: u32, target: u32) -> bool {
        match self {
            TurnComparison::Equals => turn == target,
            TurnComparison::Greater => turn > target,
            TurnComparison::Less => turn < target,
        }
    }
}

impl FromStr for TurnComparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" | "=" => Ok(TurnComparison::Equals),
            "greater" | "gt" | ">" => Ok(TurnComparison::Greater),
            "less" | "lt" | "<" => Ok(TurnComparison::Less),
            _ => Err(format!("unknown turn comparison '{}': use equals, greater or less", s)),
        }
    }
}

/// True when some word of `text` starts with `query` (case-insensitive).
///
/// Words are split on whitespace and `, - _ . /`. An empty query matches.
pub fn word_boundary_match(text: &str, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '_' | '.' | '/'))
        .filter(|word| !word.is_empty())
        .any(|word| word.to_lowercase().starts_with(&query))
}

fn player_name(p: &Participant) -> &str {
    p.player.as_ref().map(|pl| pl.name.as_str()).unwrap_or("")
}

fn deck_name(p: &Participant) -> &str {
    p.deck.as_ref().map(|d| d.name.as_str()).unwrap_or("")
}

/// Filters of the match-history view. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilter {
    /// Inclusive lower date bound, `YYYY-MM-DD`
    #[serde(default)]
    pub date_from: Option<String>,
    /// Inclusive upper date bound, `YYYY-MM-DD`
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub turn: Option<(TurnComparison, u32)>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub deck: Option<String>,
    /// Finishing positions (1 to 4) someone must have held
    #[serde(default)]
    pub positions: Vec<u8>,
}

impl MatchFilter {
    fn searched(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn has_search(&self) -> bool {
        Self::searched(&self.player).is_some() || Self::searched(&self.deck).is_some()
    }

    fn within_dates(&self, m: &Match) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        let Some(date) = m.date_str() else {
            return false;
        };
        self.date_from.as_deref().map_or(true, |from| date >= from)
            && self.date_to.as_deref().map_or(true, |to| date <= to)
    }

    /// Some participant matches the player search or the deck search.
    fn search_hit(&self, m: &Match) -> bool {
        let player = Self::searched(&self.player);
        let deck = Self::searched(&self.deck);
        m.participants.iter().any(|p| {
            player.is_some_and(|q| word_boundary_match(player_name(p), q))
                || deck.is_some_and(|q| word_boundary_match(deck_name(p), q))
        })
    }

    /// With a search, the searched participant must hold one of the positions.
    fn position_hit(&self, m: &Match) -> bool {
        let player = Self::searched(&self.player);
        let deck = Self::searched(&self.deck);
        m.finishing_order().into_iter().any(|(position, p)| {
            self.positions.contains(&position)
                && player.map_or(true, |q| word_boundary_match(player_name(p), q))
                && deck.map_or(true, |q| word_boundary_match(deck_name(p), q))
        })
    }

    pub fn matches(&self, m: &Match) -> bool {
        if !self.within_dates(m) {
            return false;
        }
        if let Some((comparison, target)) = self.turn {
            if !comparison.holds(m.max_elimination_turn(), target) {
                return false;
            }
        }
        if self.has_search() && !self.search_hit(m) {
            return false;
        }
        self.positions.is_empty() || self.position_hit(m)
    }
}

/// Four-state sort of a finishing-position column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSortMode {
    DeckAsc,
    DeckDesc,
    PlayerAsc,
    PlayerDesc,
}

impl PositionSortMode {
    pub const FIRST: PositionSortMode = PositionSortMode::DeckAsc;

    pub fn next(self) -> Self {
        match self {
            PositionSortMode::DeckAsc => PositionSortMode::DeckDesc,
            PositionSortMode::DeckDesc => PositionSortMode::PlayerAsc,
            PositionSortMode::PlayerAsc => PositionSortMode::PlayerDesc,
            PositionSortMode::PlayerDesc => PositionSortMode::DeckAsc,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PositionSortMode::DeckAsc => "A-Z ▲ Deck",
            PositionSortMode::DeckDesc => "Z-A ▼ Deck",
            PositionSortMode::PlayerAsc => "A-Z ▲ Player",
            PositionSortMode::PlayerDesc => "Z-A ▼ Player",
        }
    }

    fn compare(&self, a: &Participant, b: &Participant) -> Ordering {
        let by = |name: fn(&Participant) -> &str| {
            name(a).trim().to_lowercase().cmp(&name(b).trim().to_lowercase())
        };
        match self {
            PositionSortMode::DeckAsc => by(deck_name),
            PositionSortMode::DeckDesc => by(deck_name).reverse(),
            PositionSortMode::PlayerAsc => by(player_name),
            PositionSortMode::PlayerDesc => by(player_name).reverse(),
        }
    }
}

/// Sortable column of the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryColumn {
    Date,
    MaxTurn,
    Position(u8),
}

impl fmt::Display for HistoryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryColumn::Date => write!(f, "date"),
            HistoryColumn::MaxTurn => write!(f, "turn"),
            HistoryColumn::Position(1) => write!(f, "winner"),
            HistoryColumn::Position(2) => write!(f, "2nd"),
            HistoryColumn::Position(3) => write!(f, "3rd"),
            HistoryColumn::Position(n) => write!(f, "{}th", n),
        }
    }
}

impl FromStr for HistoryColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(HistoryColumn::Date),
            "turn" | "max-turn" => Ok(HistoryColumn::MaxTurn),
            "winner" | "1st" | "1" => Ok(HistoryColumn::Position(1)),
            "2nd" | "2" => Ok(HistoryColumn::Position(2)),
            "3rd" | "3" => Ok(HistoryColumn::Position(3)),
            "4th" | "4" => Ok(HistoryColumn::Position(4)),
            _ => Err(format!("unknown history column '{}'", s)),
        }
    }
}

/// Current sort of the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistorySort {
    Date(SortOrder),
    MaxTurn(SortOrder),
    Position { position: u8, mode: PositionSortMode },
}

impl Default for HistorySort {
    fn default() -> Self {
        HistorySort::Date(SortOrder::Desc)
    }
}

impl HistorySort {
    pub fn column(&self) -> HistoryColumn {
        match self {
            HistorySort::Date(_) => HistoryColumn::Date,
            HistorySort::MaxTurn(_) => HistoryColumn::MaxTurn,
            HistorySort::Position { position, .. } => HistoryColumn::Position(*position),
        }
    }

    /// Header click. Repeating a column flips it (or advances a position
    /// column's cycle); a new column starts at date ▼, turn ▲ or deck A-Z.
    pub fn toggle(&mut self, column: HistoryColumn) {
        let same = self.column() == column;
        *self = match (*self, column) {
            (HistorySort::Date(order), HistoryColumn::Date) if same => HistorySort::Date(order.flip()),
            (HistorySort::MaxTurn(order), HistoryColumn::MaxTurn) if same => {
                HistorySort::MaxTurn(order.flip())
            }
            (HistorySort::Position { position, mode }, HistoryColumn::Position(_)) if same => {
                HistorySort::Position {
                    position,
                    mode: mode.next(),
                }
            }
            (_, HistoryColumn::Date) => HistorySort::Date(SortOrder::Desc),
            (_, HistoryColumn::MaxTurn) => HistorySort::MaxTurn(SortOrder::Asc),
            (_, HistoryColumn::Position(position)) => HistorySort::Position {
                position,
                mode: PositionSortMode::FIRST,
            },
        };
    }

    /// Header arrow for the sorted column.
    pub fn indicator(&self) -> String {
        match self {
            HistorySort::Date(SortOrder::Desc) | HistorySort::MaxTurn(SortOrder::Desc) => "↓".to_string(),
            HistorySort::Date(SortOrder::Asc) | HistorySort::MaxTurn(SortOrder::Asc) => "↑".to_string(),
            HistorySort::Position { mode, .. } => mode.label().to_string(),
        }
    }

    fn compare(&self, a: &Match, b: &Match) -> Ordering {
        match self {
            HistorySort::Date(order) => {
                let ordering = a.date_str().unwrap_or("").cmp(b.date_str().unwrap_or(""));
                apply(*order, ordering)
            }
            HistorySort::MaxTurn(order) => {
                let turn = |m: &Match| Some(m.max_elimination_turn()).filter(|t| *t > 0);
                nulls_last(turn(a), turn(b), |x, y| apply(*order, x.cmp(y)))
            }
            HistorySort::Position { position, mode } => nulls_last(
                a.participant_at(*position),
                b.participant_at(*position),
                |x, y| mode.compare(x, y),
            ),
        }
    }
}

fn apply(order: SortOrder, ordering: Ordering) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Missing values sort after present ones regardless of direction.
fn nulls_last<T>(a: Option<T>, b: Option<T>, compare: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Matches passing `filter`, in dataset order.
pub fn filter_matches<'a>(matches: &'a [Match], filter: &MatchFilter) -> Vec<&'a Match> {
    matches.iter().filter(|m| filter.matches(m)).collect()
}

/// Stable sort of `matches` by `sort`.
pub fn sort_matches(matches: &mut [&Match], sort: &HistorySort) {
    matches.sort_by(|a, b| sort.compare(a, b));
}

/// Filter then sort, the history table pipeline.
pub fn query_history<'a>(matches: &'a [Match], filter: &MatchFilter, sort: &HistorySort) -> Vec<&'a Match> {
    let mut rows = filter_matches(matches, filter);
    sort_matches(&mut rows, sort);
    rows
}
