//! Statistics calculation engine.
//!
//! Turns a match list into per-entity statistics:
//! - Counter accumulation for players and decks
//! - Win rates, turn averages and elimination shares
//! - Medal rankings per window
//! - Color-group aggregation and year retrospectives

pub mod accumulate;
pub mod colors;
pub mod finalize;
pub mod medals;
pub mod retrospective;

pub use accumulate::{accumulate, Accumulated, EntityTally, RunSummary};
pub use colors::aggregate_color_groups;
pub use finalize::{finalize, finalize_players, process, ProcessedStats};
pub use medals::{
    active_only, assign_medals, medal_table, metric_keys, rank_metric, visible_medals, Medal,
    MedalTable, Metric, MetricKey,
};
pub use retrospective::{year_summary, YearSummary};

#[cfg(test)]
mod tests {
    //! End-to-end checks: dataset file, screening, statistics, medals, export.

    use super::*;
    use crate::config::{MedalRules, StatsConfig};
    use crate::ingest::screen_matches;
    use crate::models::{
        color_display_name, normalize_color_identity, EliminationShare, EliminationType, Match,
        Participant, PlayerKey, StatCounters, StatRecord, Window,
    };
    use crate::query::{query_records, SortState};
    use crate::storage::{read_matches, write_derived, DerivedKind, JsonlReader, StorageConfig};
    use pretty_assertions::assert_eq;

    const NAMES: [&str; 6] = ["Ann", "Bo", "Cy", "Dee", "Eli", "Fay"];
    const CAUSES: [EliminationType; 4] = EliminationType::ALL;

    /// A deterministic league: table sizes 2 to 4, rotating winners, causes and years.
    fn league(count: usize) -> Vec<Match> {
        (0..count)
            .map(|i| {
                let size = 2 + i % 3;
                let year = 2021 + (i % 4);
                let participants = (0..size)
                    .map(|seat| {
                        let name = NAMES[(i + seat) % NAMES.len()];
                        let p = Participant::new(name, format!("{name} deck {}", seat % 2))
                            .with_colors(["wu", "bR", "g", "", "ubg", "wubrg"][(i + seat) % 6]);
                        if seat == 0 {
                            p.winner()
                        } else {
                            let killer = NAMES[i % NAMES.len()];
                            p.eliminated((3 + seat + i % 5) as u32, CAUSES[(i + seat) % 4], killer)
                        }
                    })
                    .collect();
                Match::new(format!("{year}-0{}-1{}", 1 + i % 9, i % 10), participants)
            })
            .collect()
    }

    fn two_player(date: &str, cause: Option<EliminationType>) -> Match {
        let mut loser = Participant::new("P2", "D2");
        loser.turn_eliminated = 6;
        loser.eliminated_by = Some("P1".to_string());
        loser.elimination_type = cause.map(|c| c.label().to_string());
        Match::new(date, vec![Participant::new("P1", "D1").winner(), loser])
    }

    fn record_with(games: u32, wins: u32) -> StatCounters {
        let mut counters = StatCounters::default();
        for i in 0..games {
            counters.record_game(Some(2024), 2023, i < wins);
        }
        counters
    }

    #[test]
    fn test_scenario_single_match() {
        let stats = process(
            &[two_player("2024-05-01", Some(EliminationType::CombatDamage))],
            &StatsConfig::default(),
        );

        let p1 = stats.player("P1").unwrap();
        assert_eq!(p1.games(Window::Total), 1);
        assert_eq!(p1.wins(Window::Total), 1);
        assert_eq!(p1.counters.win_turns, vec![6]);
        assert_eq!(p1.counters.elims_made.combat_damage, 1);

        let p2 = stats.player("P2").unwrap();
        assert_eq!(p2.games(Window::Total), 1);
        assert_eq!(p2.wins(Window::Total), 0);
        assert_eq!(p2.counters.elim_turns, vec![6]);
        assert_eq!(p2.counters.elims_taken.combat_damage, 1);
    }

    #[test]
    fn test_scenario_missing_elimination_type() {
        let stats = process(&[two_player("2024-05-01", None)], &StatsConfig::default());

        let p1 = stats.player("P1").unwrap();
        let p2 = stats.player("P2").unwrap();
        assert_eq!(p1.counters.elims_made.total(), 0);
        assert_eq!(p2.counters.elims_taken.total(), 0);
        assert_eq!(p1.counters.win_turns, vec![6]);
        assert_eq!(p2.counters.elim_turns, vec![6]);
        assert!(p1.counters.first_elim_turns.is_empty());
    }

    #[test]
    fn test_scenario_two_matches_half_win_rate() {
        let matches = vec![
            Match::new(
                "2024-01-01",
                vec![Participant::new("Alice", "A").winner(), Participant::new("Bob", "B")],
            ),
            Match::new(
                "2024-01-02",
                vec![Participant::new("Bob", "B").winner(), Participant::new("Alice", "A")],
            ),
        ];

        let stats = process(&matches, &StatsConfig::default());
        let alice = stats.player("Alice").unwrap();

        assert_eq!(alice.games(Window::Total), 2);
        assert_eq!(format!("{:.1}", alice.derived.winrate_total), "50.0");
    }

    #[test]
    fn test_scenario_no_eliminations_gives_zero_shares() {
        let matches = vec![Match::new(
            "2024-01-01",
            vec![Participant::new("Alice", "A").winner(), Participant::new("Bob", "B")],
        )];

        let stats = process(&matches, &StatsConfig::default());

        for record in &stats.players {
            assert_eq!(record.derived.elims_made_pct, EliminationShare::default());
            assert_eq!(record.derived.elims_taken_pct, EliminationShare::default());
            assert!(!record.derived.elims_made_pct.sum().is_nan());
        }
    }

    #[test]
    fn test_scenario_floor_excludes_short_records() {
        let mut records: Vec<StatRecord<String>> = (0..25)
            .map(|i| StatRecord::new(format!("eligible-{i}"), true, record_with(20 + i, 4)))
            .collect();
        records.extend((0..5).map(|i| StatRecord::new(format!("short-{i}"), true, record_with(19, 18))));

        let table = medal_table(&records, &MedalRules::default());

        for (entity, medals) in &table {
            if entity.starts_with("short-") {
                assert!(
                    medals.keys().all(|k| k.window != Window::Total),
                    "{entity} ranked on the total window"
                );
            }
        }
    }

    #[test]
    fn test_scenario_color_normalization() {
        assert_eq!(normalize_color_identity("ubw"), "WUB");
        assert_eq!(color_display_name(&normalize_color_identity("ubw")), "Esper");
        assert_eq!(normalize_color_identity(""), "C");
        assert_eq!(color_display_name("C"), "Colorless");
        assert_eq!(normalize_color_identity("XYZ"), "C");
    }

    #[test]
    fn test_games_conserve_participants() {
        let matches = league(120);
        let stats = process(&matches, &StatsConfig::default());

        let seats: usize = matches.iter().map(|m| m.participants.len()).sum();
        let player_games: u32 = stats.players.iter().map(|p| p.games(Window::Total)).sum();
        let deck_games: u32 = stats.decks.iter().map(|d| d.games(Window::Total)).sum();

        assert_eq!(player_games as usize, seats);
        assert_eq!(deck_games as usize, seats);
        assert_eq!(stats.summary.matches_processed as usize, matches.len());
    }

    #[test]
    fn test_wins_never_exceed_games() {
        let stats = process(&league(120), &StatsConfig::default());
        let groups = aggregate_color_groups(&stats.decks);

        let mut windows = vec![Window::Total, Window::Recent];
        windows.extend((2021..=2024).map(Window::Year));

        for window in windows {
            assert!(stats.players.iter().all(|r| r.wins(window) <= r.games(window)));
            assert!(stats.decks.iter().all(|r| r.wins(window) <= r.games(window)));
            assert!(groups.iter().all(|r| r.wins(window) <= r.games(window)));
        }
    }

    #[test]
    fn test_shares_close_to_hundred() {
        let stats = process(&league(120), &StatsConfig::default());

        for record in &stats.players {
            for (tally, share) in [
                (&record.counters.elims_made, &record.derived.elims_made_pct),
                (&record.counters.elims_taken, &record.derived.elims_taken_pct),
            ] {
                if tally.total() == 0 {
                    assert_eq!(*share, EliminationShare::default());
                } else {
                    assert!((share.sum() - 100.0).abs() <= 0.2, "{:?}", share);
                }
            }
        }
    }

    #[test]
    fn test_medals_respect_floors_and_bounds() {
        let stats = process(&league(200), &StatsConfig::default());
        let rules = MedalRules {
            min_games_total: 40,
            min_games_recent: 20,
            min_games_year: 10,
        };

        let table = medal_table(&stats.players, &rules);

        for key in metric_keys(&stats.players) {
            let mut holders: Vec<_> = stats
                .players
                .iter()
                .filter_map(|p| table.get(&p.key)?.get(&key).map(|m| (*m, p)))
                .collect();

            assert!(holders.len() <= 3, "{key} has {} holders", holders.len());
            for (_, p) in &holders {
                assert!(p.games(key.window) >= rules.min_games(key.window));
            }

            holders.sort_by_key(|(m, _)| *m);
            let values: Vec<f64> = holders.iter().map(|(_, p)| key.value(p)).collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]), "{key}: {values:?}");
        }
    }

    #[test]
    fn test_first_elimination_counted_once_per_match() {
        let m = Match::new(
            "2024-07-07",
            vec![
                Participant::new("A", "DA").winner(),
                Participant::new("B", "DB").eliminated(4, EliminationType::CombatDamage, "A"),
                Participant::new("C", "DC").eliminated(6, EliminationType::CommanderDamage, "A"),
                Participant::new("D", "DD").eliminated(8, EliminationType::Other, "B"),
            ],
        );

        let stats = process(&[m], &StatsConfig::default());
        let a = stats.player("A").unwrap();

        assert_eq!(a.counters.first_elim_turns, vec![4]);
        assert_eq!(a.counters.elims_made.total(), 2);
        assert_eq!(stats.deck("DA", "A").unwrap().counters.first_elim_turns, vec![4]);
    }

    #[test]
    fn test_dataset_file_to_derived_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig::new(dir.path().to_path_buf());

        let mut matches = league(30);
        matches.push(Match::new("not a date", vec![Participant::new("X", "XD").winner()]));
        std::fs::write(storage.matches_path(), serde_json::to_string(&matches).unwrap()).unwrap();

        let loaded = read_matches(&storage.matches_path()).unwrap();
        let screening = screen_matches(loaded);
        assert_eq!(screening.accepted.len(), 30);
        assert_eq!(screening.rejected.len(), 1);

        let stats = process(&screening.accepted, &StatsConfig::default());
        let groups = aggregate_color_groups(&stats.decks);
        write_derived(&storage, DerivedKind::Players, &stats.players).unwrap();
        write_derived(&storage, DerivedKind::Colors, &groups).unwrap();

        let players: Vec<StatRecord<PlayerKey>> =
            JsonlReader::for_derived(&storage, DerivedKind::Players).read_all().unwrap();
        assert_eq!(players, stats.players);

        let colors: JsonlReader<serde_json::Value> = JsonlReader::for_derived(&storage, DerivedKind::Colors);
        assert_eq!(colors.count().unwrap(), groups.len());
    }

    #[test]
    fn test_processing_is_idempotent() {
        let matches = league(50);
        let config = StatsConfig::default();
        assert_eq!(process(&matches, &config), process(&matches, &config));
    }

    #[test]
    fn test_inactive_winner_takes_no_default_medals() {
        let mut matches = league(60);
        matches.extend((0..25).map(|i| {
            Match::new(
                format!("2024-11-{:02}", i % 28 + 1),
                vec![
                    Participant::new("Retired", "Old Deck").with_active(false, false).winner(),
                    Participant::new("Ann", "Ann deck 1").eliminated(5, EliminationType::Other, "Retired"),
                ],
            )
        }));

        let stats = process(&matches, &StatsConfig::default());
        let rows = query_records(&stats.players, Window::Total, "", &SortState::default());
        let wins = MetricKey::new(Metric::Wins, Window::Total);

        let medals = visible_medals(&rows, false, &MedalRules::default());
        assert!(!medals.contains_key(&PlayerKey::new("Retired")));
        assert!(medals.values().any(|m| m.get(&wins) == Some(&Medal::Gold)));

        let with_inactive = visible_medals(&rows, true, &MedalRules::default());
        assert_eq!(
            with_inactive[&PlayerKey::new("Retired")].get(&wins),
            Some(&Medal::Gold)
        );
    }
}
