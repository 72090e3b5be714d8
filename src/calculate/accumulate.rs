//! Single pass over the match list, growing per-player and per-deck counters.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::StatsConfig;
use crate::models::{ColorIdentity, DeckKey, Match, PlayerKey, StatCounters};

/// Counters for one entity plus the attributes that follow the latest sighting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTally {
    pub is_active: bool,
    pub color_identity: Option<ColorIdentity>,
    pub counters: StatCounters,
}

impl EntityTally {
    fn record_game(&mut self, year: Option<u16>, cutoff: u16, won: bool, turn: u32) {
        self.counters.record_game(year, cutoff, won);
        if turn > 0 {
            if won {
                self.counters.win_turns.push(turn);
            } else {
                self.counters.elim_turns.push(turn);
            }
        }
    }
}

/// Bookkeeping for one accumulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub matches_processed: u32,
    pub matches_skipped: u32,
    pub participants_skipped: u32,
    pub matches_by_year: BTreeMap<u16, u32>,
}

/// Output of [`accumulate`]: raw counters keyed by identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulated {
    pub players: BTreeMap<PlayerKey, EntityTally>,
    pub decks: BTreeMap<DeckKey, EntityTally>,
    pub summary: RunSummary,
}

/// Scan every match once and build counters for players and decks.
///
/// Matches without a date or participants and participants without a
/// resolved player or deck are skipped, never reported as errors.
pub fn accumulate(matches: &[Match], config: &StatsConfig) -> Accumulated {
    let mut acc = Accumulated::default();
    for m in matches {
        acc.add_match(m, config.recent_cutoff_year);
    }

    debug!(
        "Accumulated {} matches ({} skipped): {} players, {} decks",
        acc.summary.matches_processed,
        acc.summary.matches_skipped,
        acc.players.len(),
        acc.decks.len()
    );
    acc
}

impl Accumulated {
    fn add_match(&mut self, m: &Match, cutoff: u16) {
        if m.date_str().is_none() || m.participants.is_empty() {
            trace!("Skipping match {}: no date or participants", m.id_or_derived());
            self.summary.matches_skipped += 1;
            return;
        }

        let year = m.year();
        let winner = m.winner_index();
        let last_turn = m.max_elimination_turn();

        // Eliminators already credited with a first elimination in this match.
        let mut credited_players: HashSet<PlayerKey> = HashSet::new();
        let mut credited_decks: HashSet<DeckKey> = HashSet::new();

        for (index, participant) in m.participants.iter().enumerate() {
            let (Some(player), Some(deck), Some(deck_key)) = (
                participant.player.as_ref(),
                participant.deck.as_ref(),
                participant.deck_key(),
            ) else {
                self.summary.participants_skipped += 1;
                continue;
            };
            let player_key = PlayerKey::new(player.name.clone());

            let won = winner == Some(index);
            let turn = if won {
                last_turn
            } else {
                participant.turn_eliminated
            };

            let cause = if won {
                None
            } else {
                participant.elimination_cause()
            };

            let player_tally = self.players.entry(player_key).or_default();
            player_tally.is_active = player.is_active;
            player_tally.record_game(year, cutoff, won, turn);
            if let Some(cause) = cause {
                player_tally.counters.elims_taken.increment(cause);
            }

            let deck_tally = self.decks.entry(deck_key).or_default();
            deck_tally.is_active = deck.is_active;
            if let Some(raw) = deck.color_identity.as_deref() {
                deck_tally.color_identity = Some(ColorIdentity::parse(raw));
            }
            deck_tally.record_game(year, cutoff, won, turn);
            if let Some(cause) = cause {
                deck_tally.counters.elims_taken.increment(cause);
            }

            let Some(cause) = cause else {
                continue;
            };
            let Some(killer_name) = participant
                .eliminated_by
                .as_deref()
                .filter(|name| !name.trim().is_empty())
            else {
                continue;
            };

            let killer_key = PlayerKey::new(killer_name);
            let first_for_player = credited_players.insert(killer_key.clone());
            let killer = self.players.entry(killer_key).or_default();
            killer.counters.elims_made.increment(cause);
            if first_for_player && turn > 0 {
                killer.counters.first_elim_turns.push(turn);
            }

            let Some(killer_deck) = m.participant_for(killer_name).and_then(|k| k.deck_key())
            else {
                continue;
            };
            let first_for_deck = credited_decks.insert(killer_deck.clone());
            let killer_deck_tally = self.decks.entry(killer_deck).or_default();
            killer_deck_tally.counters.elims_made.increment(cause);
            if first_for_deck && turn > 0 {
                killer_deck_tally.counters.first_elim_turns.push(turn);
            }
        }

        self.summary.matches_processed += 1;
        if let Some(year) = year {
            *self.summary.matches_by_year.entry(year).or_default() += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EliminationTally, EliminationType, Participant, WindowCounts};
    use pretty_assertions::assert_eq;

    fn config() -> StatsConfig {
        StatsConfig::default()
    }

    fn player<'a>(acc: &'a Accumulated, name: &str) -> &'a EntityTally {
        acc.players.get(&PlayerKey::from(name)).unwrap()
    }

    fn deck<'a>(acc: &'a Accumulated, name: &str, owner: &str) -> &'a EntityTally {
        acc.decks.get(&DeckKey::new(name, owner)).unwrap()
    }

    #[test]
    fn test_single_match_winner_and_loser() {
        let matches = vec![Match::new(
            "2024-05-01",
            vec![
                Participant::new("P1", "D1").winner(),
                Participant::new("P2", "D2").eliminated(6, EliminationType::CombatDamage, "P1"),
            ],
        )];

        let acc = accumulate(&matches, &config());

        let p1 = player(&acc, "P1");
        assert_eq!(p1.counters.total, WindowCounts { games: 1, wins: 1 });
        assert_eq!(p1.counters.win_turns, vec![6]);
        assert_eq!(p1.counters.elims_made.combat_damage, 1);
        assert_eq!(p1.counters.first_elim_turns, vec![6]);

        let p2 = player(&acc, "P2");
        assert_eq!(p2.counters.total, WindowCounts { games: 1, wins: 0 });
        assert_eq!(p2.counters.elim_turns, vec![6]);
        assert_eq!(p2.counters.elims_taken.combat_damage, 1);

        assert_eq!(deck(&acc, "D1", "P1").counters.elims_made.combat_damage, 1);
        assert_eq!(deck(&acc, "D2", "P2").counters.elims_taken.combat_damage, 1);
        assert_eq!(acc.summary.matches_by_year.get(&2024), Some(&1));
    }

    #[test]
    fn test_missing_elimination_type_tallies_nothing() {
        let mut loser = Participant::new("P2", "D2");
        loser.turn_eliminated = 6;
        loser.eliminated_by = Some("P1".to_string());
        let matches = vec![Match::new(
            "2024-05-01",
            vec![Participant::new("P1", "D1").winner(), loser],
        )];

        let acc = accumulate(&matches, &config());

        assert_eq!(player(&acc, "P1").counters.elims_made, EliminationTally::default());
        assert_eq!(player(&acc, "P2").counters.elims_taken, EliminationTally::default());
        assert_eq!(player(&acc, "P1").counters.win_turns, vec![6]);
        assert_eq!(player(&acc, "P2").counters.elim_turns, vec![6]);
        assert!(player(&acc, "P1").counters.first_elim_turns.is_empty());
    }

    #[test]
    fn test_first_elimination_counted_once_per_match() {
        let matches = vec![Match::new(
            "2024-05-01",
            vec![
                Participant::new("A", "DA").winner(),
                Participant::new("B", "DB").eliminated(5, EliminationType::CombatDamage, "A"),
                Participant::new("C", "DC").eliminated(7, EliminationType::CommanderDamage, "A"),
                Participant::new("D", "DD").eliminated(9, EliminationType::Other, "C"),
            ],
        )];

        let acc = accumulate(&matches, &config());

        let a = player(&acc, "A");
        assert_eq!(a.counters.first_elim_turns, vec![5]);
        assert_eq!(a.counters.elims_made.total(), 2);
        assert_eq!(deck(&acc, "DA", "A").counters.first_elim_turns, vec![5]);
        assert_eq!(player(&acc, "C").counters.first_elim_turns, vec![9]);
        // Winner's turn is the last elimination turn of the match.
        assert_eq!(a.counters.win_turns, vec![9]);
    }

    #[test]
    fn test_skips_matches_without_date_or_participants() {
        let mut undated = Match::new("", vec![Participant::new("A", "DA").winner()]);
        undated.date = None;
        let matches = vec![
            undated,
            Match::new("2024-01-01", vec![]),
            Match::new("   ", vec![Participant::new("A", "DA")]),
        ];

        let acc = accumulate(&matches, &config());

        assert!(acc.players.is_empty());
        assert_eq!(acc.summary.matches_skipped, 3);
        assert_eq!(acc.summary.matches_processed, 0);
    }

    #[test]
    fn test_skips_unresolved_participants() {
        let mut ghost = Participant::new("Ghost", "None");
        ghost.deck = None;
        let matches = vec![Match::new(
            "2024-01-01",
            vec![Participant::new("A", "DA").winner(), ghost],
        )];

        let acc = accumulate(&matches, &config());

        assert_eq!(acc.players.len(), 1);
        assert_eq!(acc.decks.len(), 1);
        assert_eq!(acc.summary.participants_skipped, 1);
    }

    #[test]
    fn test_activity_is_last_write_wins() {
        let matches = vec![
            Match::new(
                "2023-01-01",
                vec![Participant::new("A", "DA").with_active(false, false).winner()],
            ),
            Match::new(
                "2024-01-01",
                vec![Participant::new("A", "DA").with_active(true, false)],
            ),
            Match::new(
                "2025-01-01",
                vec![Participant::new("B", "DB").with_active(false, true)],
            ),
        ];

        let acc = accumulate(&matches, &config());

        assert!(player(&acc, "A").is_active);
        assert!(!deck(&acc, "DA", "A").is_active);
        assert!(!player(&acc, "B").is_active);
    }

    #[test]
    fn test_unseen_eliminator_created_inactive() {
        let matches = vec![Match::new(
            "2024-01-01",
            vec![
                Participant::new("A", "DA").winner(),
                Participant::new("B", "DB").eliminated(4, EliminationType::Other, "Outsider"),
            ],
        )];

        let acc = accumulate(&matches, &config());

        let outsider = player(&acc, "Outsider");
        assert!(!outsider.is_active);
        assert_eq!(outsider.counters.total.games, 0);
        assert_eq!(outsider.counters.elims_made.other, 1);
        // No participant named Outsider, so no deck is credited.
        assert_eq!(acc.decks.len(), 2);
    }

    #[test]
    fn test_winner_sentinel_and_unknown_labels_ignored() {
        let mut odd = Participant::new("B", "DB");
        odd.elimination_type = Some("Poison".to_string());
        odd.eliminated_by = Some("A".to_string());
        let matches = vec![Match::new(
            "2024-01-01",
            vec![Participant::new("A", "DA").winner(), odd],
        )];

        let acc = accumulate(&matches, &config());

        assert_eq!(player(&acc, "A").counters.elims_taken.total(), 0);
        assert_eq!(player(&acc, "A").counters.elims_made.total(), 0);
        assert_eq!(player(&acc, "B").counters.elims_taken.total(), 0);
    }

    #[test]
    fn test_recent_window_and_bad_year() {
        let matches = vec![
            Match::new("2022-03-01", vec![Participant::new("A", "DA").winner()]),
            Match::new("2023-03-01", vec![Participant::new("A", "DA")]),
            Match::new("20xx-03-01", vec![Participant::new("A", "DA").winner()]),
        ];

        let acc = accumulate(&matches, &config());
        let a = &player(&acc, "A").counters;

        assert_eq!(a.total, WindowCounts { games: 3, wins: 2 });
        assert_eq!(a.recent, WindowCounts { games: 1, wins: 0 });
        assert_eq!(a.years.len(), 2);
        assert_eq!(acc.summary.matches_processed, 3);
    }

    #[test]
    fn test_deck_color_identity_latest_wins() {
        let matches = vec![
            Match::new("2024-01-01", vec![Participant::new("A", "DA").with_colors("gw")]),
            Match::new("2024-02-01", vec![Participant::new("A", "DA").with_colors("bgw")]),
            Match::new("2024-03-01", vec![Participant::new("A", "DA")]),
        ];

        let acc = accumulate(&matches, &config());

        assert_eq!(
            deck(&acc, "DA", "A").color_identity,
            Some(ColorIdentity::parse("WBG"))
        );
    }

    #[test]
    fn test_multiple_winner_flags_first_wins() {
        let matches = vec![Match::new(
            "2024-01-01",
            vec![
                Participant::new("A", "DA").winner(),
                Participant::new("B", "DB").winner(),
            ],
        )];

        let acc = accumulate(&matches, &config());

        assert_eq!(player(&acc, "A").counters.total.wins, 1);
        assert_eq!(player(&acc, "B").counters.total.wins, 0);
    }
}
