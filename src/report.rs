//! Plain-text tables for the command line.

use std::collections::BTreeMap;

use crate::calculate::{Medal, MedalTable, Metric, MetricKey, RunSummary, YearSummary};
use crate::ingest::RejectedMatch;
use crate::models::{
    ColorIdentity, EliminationShare, EliminationType, Match, Participant, StatRecord, Window,
};
use crate::query::{win_rate_band, EntityLabel, HistoryColumn, HistorySort};
use crate::storage::DerivedKind;

fn medal_mark(medals: Option<&BTreeMap<MetricKey, Medal>>, metric: Metric, window: Window) -> &'static str {
    medals
        .and_then(|m| m.get(&MetricKey::new(metric, window)))
        .map(|m| m.symbol())
        .unwrap_or("")
}

/// "C 50.0 D 25.0 N 25.0 O 0.0"
fn share_cell(share: &EliminationShare) -> String {
    EliminationType::ALL
        .iter()
        .map(|kind| format!("{} {:.1}", kind.code(), share.get(*kind)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let cut: String = label.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn header(window: Window) -> String {
    format!(
        "{:>3}  {:<28} {:>7} {:>8} {:>7} {:>9}  {:>5} {:>5} {:>5}  {:<26} {:<26}",
        "#",
        "NAME",
        "DECKS",
        format!("G/{}", window.label()),
        "W",
        "W%",
        "WIN",
        "1ST",
        "ELIM",
        "ELIMS MADE",
        "ELIMS TAKEN",
    )
}

fn row<K: EntityLabel>(
    position: usize,
    record: &StatRecord<K>,
    window: Window,
    medals: Option<&BTreeMap<MetricKey, Medal>>,
) -> String {
    let decks = record
        .deck_counts
        .map(|c| format!("{}/{}", c.active, c.total))
        .unwrap_or_else(|| "-".to_string());
    let derived = &record.derived;
    let rate = record.win_rate(window);

    format!(
        "{:>3}  {:<28} {:>7} {:>6}{:<2} {:>5}{:<2} {:>7.1}{:<2}  {:>5} {:>5} {:>5}  {:<26} {:<26} {}",
        position,
        truncate(&record.key.label(), 28),
        decks,
        record.games(window),
        medal_mark(medals, Metric::Games, window),
        record.wins(window),
        medal_mark(medals, Metric::Wins, window),
        rate,
        medal_mark(medals, Metric::WinRate, window),
        derived.avg_win_turn.to_string(),
        derived.avg_first_elim_turn.to_string(),
        derived.avg_elim_turn.to_string(),
        share_cell(&derived.elims_made_pct),
        share_cell(&derived.elims_taken_pct),
        win_rate_band(rate).name(),
    )
}

/// Statistics table for `rows` in display order, medals looked up in `medals`.
pub fn stats_table<K: EntityLabel + Ord>(
    rows: &[&StatRecord<K>],
    window: Window,
    medals: &MedalTable<K>,
) -> String {
    if rows.is_empty() {
        return "No matching records.".to_string();
    }

    let mut lines = vec![header(window)];
    lines.extend(
        rows.iter()
            .enumerate()
            .map(|(i, record)| row(i + 1, record, window, medals.get(&record.key))),
    );
    lines.join("\n")
}

/// Color-group table. Groups carry no medals.
pub fn colors_table(rows: &[&StatRecord<ColorIdentity>], window: Window) -> String {
    stats_table(rows, window, &MedalTable::new())
}

pub fn year_summary_report(summary: &YearSummary) -> String {
    let window = Window::Year(summary.year);
    let mut lines = vec![
        format!("=== {} Retrospective ===", summary.year),
        format!("Matches:          {}", summary.matches),
        format!("Active players:   {}", summary.players),
        format!("Avg win rate:     {:.1}%", summary.average_win_rate),
        String::new(),
        "Top players:".to_string(),
    ];
    lines.extend(summary.top_players.iter().enumerate().map(|(i, p)| {
        format!(
            "  {}. {:<24} {:>5.1}%  ({} games)",
            i + 1,
            p.key.label(),
            p.win_rate(window),
            p.games(window)
        )
    }));
    lines.push(String::new());
    lines.push("Top decks:".to_string());
    lines.extend(summary.top_decks.iter().enumerate().map(|(i, d)| {
        format!(
            "  {}. {:<24} {:>5.1}%  ({} games)",
            i + 1,
            d.key.label(),
            d.win_rate(window),
            d.games(window)
        )
    }));
    lines.join("\n")
}

/// "Krenko (Ann)", with "T7 by Bo" for eliminated seats.
fn seat_cell(participant: Option<&Participant>) -> String {
    let Some(p) = participant else {
        return "-".to_string();
    };
    let player = p.player.as_ref().map(|pl| pl.name.as_str()).unwrap_or("Unknown");
    let deck = p.deck.as_ref().map(|d| d.name.as_str()).unwrap_or("Unknown");
    let mut cell = format!("{} ({})", truncate(deck, 18), truncate(player, 10));
    if !p.is_winner && p.elimination_cause().is_some() {
        if p.turn_eliminated > 0 {
            cell.push_str(&format!(" T{}", p.turn_eliminated));
        }
        cell.push_str(&format!(" by {}", p.eliminated_by.as_deref().unwrap_or("?")));
    }
    cell
}

/// Match-history table, one row per match in display order.
pub fn history_table(rows: &[&Match], sort: &HistorySort) -> String {
    if rows.is_empty() {
        return "No matches found.".to_string();
    }

    let sorted = sort.column();
    let head = |column: HistoryColumn, title: &str| {
        if column == sorted {
            format!("{} {}", title, sort.indicator())
        } else {
            title.to_string()
        }
    };

    let mut lines = vec![format!(
        "{:<12} {:>6}  {:<44} {:<44} {:<44} {:<44}",
        head(HistoryColumn::Date, "DATE"),
        head(HistoryColumn::MaxTurn, "TURN"),
        head(HistoryColumn::Position(1), "WINNER"),
        head(HistoryColumn::Position(2), "2ND"),
        head(HistoryColumn::Position(3), "3RD"),
        head(HistoryColumn::Position(4), "4TH"),
    )];
    lines.extend(rows.iter().map(|m| {
        let turn = match m.max_elimination_turn() {
            0 => "-".to_string(),
            t => t.to_string(),
        };
        format!(
            "{:<12} {:>6}  {:<44} {:<44} {:<44} {:<44}",
            m.date_str().unwrap_or("-"),
            turn,
            seat_cell(m.participant_at(1)),
            seat_cell(m.participant_at(2)),
            seat_cell(m.participant_at(3)),
            seat_cell(m.participant_at(4)),
        )
        .trim_end()
        .to_string()
    }));
    lines.join("\n")
}

/// Derived files on disk against the current run: `(kind, on disk, current)`.
pub fn derived_status_report(status: &[(DerivedKind, usize, usize)]) -> String {
    let mut lines = vec!["Derived outputs:".to_string()];
    lines.extend(status.iter().map(|(kind, on_disk, current)| {
        let note = if on_disk == current { "" } else { "  (stale, run export)" };
        format!("  {:<16} {:>5} rows / {:>5} current{}", kind.filename(), on_disk, current, note)
    }));
    lines.join("\n")
}

pub fn rejections_report(rejected: &[RejectedMatch]) -> String {
    if rejected.is_empty() {
        return "All matches passed validation.".to_string();
    }
    let mut lines = vec![format!("{} rejected matches:", rejected.len())];
    lines.extend(rejected.iter().map(|r| {
        format!(
            "  - {} ({}): {}",
            r.id,
            r.date.as_deref().unwrap_or("no date"),
            r.reason
        )
    }));
    lines.join("\n")
}

pub fn run_summary_report(summary: &RunSummary) -> String {
    let mut lines = vec![
        format!("Matches processed:    {}", summary.matches_processed),
        format!("Matches skipped:      {}", summary.matches_skipped),
        format!("Participants skipped: {}", summary.participants_skipped),
    ];
    lines.extend(
        summary
            .matches_by_year
            .iter()
            .map(|(year, count)| format!("  {}: {}", year, count)),
    );
    lines.join("\n")
}
