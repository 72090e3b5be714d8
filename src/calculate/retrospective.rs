//! End-of-year summary built from processed statistics.

use std::cmp::Ordering;

use serde::Serialize;

use super::finalize::ProcessedStats;
use crate::models::{round1, DeckKey, PlayerKey, StatRecord, Window};

/// Number of players and decks listed in a year summary.
pub const TOP_N: usize = 5;

/// Headline numbers for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: u16,
    pub matches: u32,
    /// Active players with at least one game in the year
    pub players: usize,
    /// Mean of those players' win rates for the year
    pub average_win_rate: f64,
    pub top_players: Vec<StatRecord<PlayerKey>>,
    pub top_decks: Vec<StatRecord<DeckKey>>,
}

fn top_by_year<K: Clone>(records: Vec<&StatRecord<K>>, window: Window) -> Vec<StatRecord<K>> {
    let mut records = records;
    records.sort_by(|a, b| {
        b.win_rate(window)
            .partial_cmp(&a.win_rate(window))
            .unwrap_or(Ordering::Equal)
    });
    records.into_iter().take(TOP_N).cloned().collect()
}

/// Summarize `year`. Players must be active to appear; decks only need games.
pub fn year_summary(year: u16, stats: &ProcessedStats) -> YearSummary {
    let window = Window::Year(year);

    let players: Vec<&StatRecord<PlayerKey>> = stats
        .players
        .iter()
        .filter(|p| p.is_active && p.games(window) > 0)
        .collect();
    let decks: Vec<&StatRecord<DeckKey>> =
        stats.decks.iter().filter(|d| d.games(window) > 0).collect();

    let average_win_rate = if players.is_empty() {
        0.0
    } else {
        let sum: f64 = players.iter().map(|p| p.win_rate(window)).sum();
        round1(sum / players.len() as f64)
    };

    YearSummary {
        year,
        matches: stats.summary.matches_by_year.get(&year).copied().unwrap_or(0),
        players: players.len(),
        average_win_rate,
        top_players: top_by_year(players, window),
        top_decks: top_by_year(decks, window),
    }
}
