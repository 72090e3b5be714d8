//! Turn accumulated counters into finalized records.

use std::collections::BTreeMap;

use serde::Serialize;

use super::accumulate::{accumulate, Accumulated, EntityTally, RunSummary};
use crate::config::StatsConfig;
use crate::models::{DeckCounts, DeckKey, Match, PlayerKey, StatRecord};

/// Derive every ratio for each entity in `map`. Map order is kept.
pub fn finalize<K: Clone>(map: &BTreeMap<K, EntityTally>) -> Vec<StatRecord<K>> {
    map.iter()
        .map(|(key, tally)| {
            let record = StatRecord::new(key.clone(), tally.is_active, tally.counters.clone());
            match tally.color_identity {
                Some(colors) => record.with_color_identity(colors),
                None => record,
            }
        })
        .collect()
}

/// Player records with deck ownership counts attached.
pub fn finalize_players(acc: &Accumulated) -> Vec<StatRecord<PlayerKey>> {
    finalize(&acc.players)
        .into_iter()
        .map(|record| {
            let counts = owned_decks(&record.key, &acc.decks);
            record.with_deck_counts(counts)
        })
        .collect()
}

fn owned_decks(player: &PlayerKey, decks: &BTreeMap<DeckKey, EntityTally>) -> DeckCounts {
    decks
        .iter()
        .filter(|(key, _)| key.is_owned_by(player))
        .fold(DeckCounts::default(), |mut counts, (_, tally)| {
            counts.total += 1;
            if tally.is_active {
                counts.active += 1;
            }
            counts
        })
}

/// Finalized players and decks for one match list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedStats {
    pub players: Vec<StatRecord<PlayerKey>>,
    pub decks: Vec<StatRecord<DeckKey>>,
    pub summary: RunSummary,
}

impl ProcessedStats {
    pub fn from_accumulated(acc: &Accumulated) -> Self {
        Self {
            players: finalize_players(acc),
            decks: finalize(&acc.decks),
            summary: acc.summary.clone(),
        }
    }

    pub fn player(&self, name: &str) -> Option<&StatRecord<PlayerKey>> {
        self.players.iter().find(|p| p.key.as_str() == name)
    }

    pub fn deck(&self, deck: &str, owner: &str) -> Option<&StatRecord<DeckKey>> {
        let key = DeckKey::new(deck, owner);
        self.decks.iter().find(|d| d.key == key)
    }
}

/// Accumulate and finalize in one call.
pub fn process(matches: &[Match], config: &StatsConfig) -> ProcessedStats {
    ProcessedStats::from_accumulated(&accumulate(matches, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EliminationShare, EliminationType, Participant, Window};
    use pretty_assertions::assert_eq;

    fn two_player_match(date: &str, winner: &str, loser: &str) -> Match {
        Match::new(
            date,
            vec![
                Participant::new(winner, format!("{winner}'s deck")).winner(),
                Participant::new(loser, format!("{loser}'s deck")).eliminated(
                    7,
                    EliminationType::CommanderDamage,
                    winner,
                ),
            ],
        )
    }

    #[test]
    fn test_win_rate_finalizes_to_one_decimal() {
        let matches = vec![
            two_player_match("2024-01-01", "Alice", "Bob"),
            two_player_match("2024-02-01", "Bob", "Alice"),
        ];

        let stats = process(&matches, &StatsConfig::default());
        let alice = stats.player("Alice").unwrap();

        assert_eq!(alice.games(Window::Total), 2);
        assert_eq!(alice.wins(Window::Total), 1);
        assert_eq!(format!("{:.1}", alice.derived.winrate_total), "50.0");
        assert_eq!(alice.win_rate(Window::Year(2024)), 50.0);
    }

    #[test]
    fn test_turn_averages_and_sentinel() {
        let matches = vec![
            two_player_match("2024-01-01", "Alice", "Bob"),
            two_player_match("2024-02-01", "Alice", "Bob"),
        ];

        let stats = process(&matches, &StatsConfig::default());
        let alice = stats.player("Alice").unwrap();
        let bob = stats.player("Bob").unwrap();

        assert_eq!(alice.derived.avg_win_turn.to_string(), "7.0");
        assert_eq!(alice.derived.avg_first_elim_turn.to_string(), "7.0");
        assert_eq!(alice.derived.avg_elim_turn.to_string(), "-");
        assert_eq!(bob.derived.avg_win_turn.to_string(), "-");
        assert_eq!(bob.derived.avg_elim_turn.to_string(), "7.0");
    }

    #[test]
    fn test_elimination_shares_zero_without_data() {
        let matches = vec![Match::new(
            "2024-01-01",
            vec![
                Participant::new("Solo", "Deck").winner(),
                Participant::new("Quiet", "Deck"),
            ],
        )];
        let stats = process(&matches, &StatsConfig::default());

        for player in &stats.players {
            assert_eq!(player.derived.elims_made_pct, EliminationShare::default());
            assert_eq!(player.derived.elims_taken_pct, EliminationShare::default());
        }
    }

    #[test]
    fn test_deck_counts_use_owner_equality() {
        let matches = vec![
            Match::new(
                "2024-01-01",
                vec![
                    Participant::new("Ann", "Krenko").winner(),
                    Participant::new("Joann", "Atraxa").with_active(true, false),
                ],
            ),
            Match::new(
                "2024-01-02",
                vec![
                    Participant::new("Joann", "Edgar").winner(),
                    Participant::new("Ann", "Krenko"),
                ],
            ),
        ];

        let stats = process(&matches, &StatsConfig::default());

        assert_eq!(
            stats.player("Ann").unwrap().deck_counts,
            Some(DeckCounts { total: 1, active: 1 })
        );
        assert_eq!(
            stats.player("Joann").unwrap().deck_counts,
            Some(DeckCounts { total: 2, active: 1 })
        );
    }

    #[test]
    fn test_decks_have_no_deck_counts() {
        let stats = process(
            &[two_player_match("2024-01-01", "A", "B")],
            &StatsConfig::default(),
        );
        assert!(stats.decks.iter().all(|d| d.deck_counts.is_none()));
        assert!(stats.deck("A's deck", "A").is_some());
    }

    #[test]
    fn test_process_is_idempotent() {
        let matches = vec![
            two_player_match("2023-06-01", "A", "B"),
            two_player_match("2024-06-01", "B", "C"),
        ];
        let config = StatsConfig::default();
        assert_eq!(process(&matches, &config), process(&matches, &config));
    }
}
