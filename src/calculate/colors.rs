//! Color-group statistics: deck records folded by canonical color identity.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{ColorIdentity, DeckCounts, DeckKey, StatCounters, StatRecord};

#[derive(Default)]
struct ColorGroup {
    counters: StatCounters,
    decks: DeckCounts,
}

/// Group finalized deck records by color identity and re-derive every ratio.
///
/// Decks without a recorded identity fall in the colorless group. A group is
/// active when at least one of its decks is.
pub fn aggregate_color_groups(decks: &[StatRecord<DeckKey>]) -> Vec<StatRecord<ColorIdentity>> {
    let mut groups: BTreeMap<ColorIdentity, ColorGroup> = BTreeMap::new();

    for deck in decks {
        let colors = deck.color_identity.unwrap_or(ColorIdentity::COLORLESS);
        let group = groups.entry(colors).or_default();
        group.counters.merge(&deck.counters);
        group.decks.total += 1;
        if deck.is_active {
            group.decks.active += 1;
        }
    }

    debug!("Aggregated {} decks into {} color groups", decks.len(), groups.len());

    groups
        .into_iter()
        .map(|(colors, group)| {
            StatRecord::new(colors, group.decks.active > 0, group.counters)
                .with_color_identity(colors)
                .with_deck_counts(group.decks)
        })
        .collect()
}
