//! Table queries over finalized records: search, window filtering and sorting.
//! Match history filtering lives in [`history`].

pub mod history;
pub mod sort;

pub use history::{
    filter_matches, query_history, sort_matches, word_boundary_match, HistoryColumn, HistorySort,
    MatchFilter, PositionSortMode, TurnComparison,
};
pub use sort::{
    sort_records, CycleMode, DeckCountSortMode, EliminationSortMode, SortGroup, SortKey, SortOrder,
    SortState, TurnSortMode,
};

use serde::Serialize;

use crate::models::{ColorIdentity, DeckKey, PlayerKey, StatRecord, Window};

/// Human-readable label of an entity key, used for search and name sorting.
pub trait EntityLabel {
    fn label(&self) -> String;
}

impl EntityLabel for PlayerKey {
    fn label(&self) -> String {
        self.as_str().to_string()
    }
}

impl EntityLabel for DeckKey {
    fn label(&self) -> String {
        self.to_string()
    }
}

impl EntityLabel for ColorIdentity {
    fn label(&self) -> String {
        format!("{} {}", self.display_name(), self.key())
    }
}

impl EntityLabel for String {
    fn label(&self) -> String {
        self.clone()
    }
}

/// Records whose label contains `search` (case-insensitive) and that played
/// in `window`. The total window keeps records with zero games.
pub fn filter_records<'a, K: EntityLabel>(
    records: &'a [StatRecord<K>],
    window: Window,
    search: &str,
) -> Vec<&'a StatRecord<K>> {
    let needle = search.trim().to_lowercase();
    records
        .iter()
        .filter(|r| needle.is_empty() || r.key.label().to_lowercase().contains(&needle))
        .filter(|r| window == Window::Total || r.games(window) > 0)
        .collect()
}

/// Filter then sort, the usual table pipeline.
pub fn query_records<'a, K: EntityLabel>(
    records: &'a [StatRecord<K>],
    window: Window,
    search: &str,
    state: &SortState,
) -> Vec<&'a StatRecord<K>> {
    let mut rows = filter_records(records, window, search);
    sort_records(&mut rows, state, window);
    rows
}

/// Color band a win rate is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WinRateBand {
    Elite,
    Strong,
    Average,
    Weak,
}

impl WinRateBand {
    pub fn name(&self) -> &'static str {
        match self {
            WinRateBand::Elite => "elite",
            WinRateBand::Strong => "strong",
            WinRateBand::Average => "average",
            WinRateBand::Weak => "weak",
        }
    }
}

pub fn win_rate_band(rate: f64) -> WinRateBand {
    if rate >= 30.0 {
        WinRateBand::Elite
    } else if rate >= 25.0 {
        WinRateBand::Strong
    } else if rate >= 15.0 {
        WinRateBand::Average
    } else {
        WinRateBand::Weak
    }
}
