//! Top-three medal assignment with per-window eligibility floors.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MedalRules;
use crate::models::{StatRecord, Window};

/// Quantity a medal is awarded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Games,
    Wins,
    WinRate,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Games, Metric::Wins, Metric::WinRate];

    fn prefix(&self) -> &'static str {
        match self {
            Metric::Games => "games",
            Metric::Wins => "wins",
            Metric::WinRate => "winrate",
        }
    }
}

/// A metric measured inside one window, e.g. `winrate_2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricKey {
    pub metric: Metric,
    pub window: Window,
}

impl MetricKey {
    pub fn new(metric: Metric, window: Window) -> Self {
        Self { metric, window }
    }

    /// Value of this metric for a record.
    pub fn value<K>(&self, record: &StatRecord<K>) -> f64 {
        match self.metric {
            Metric::Games => record.games(self.window) as f64,
            Metric::Wins => record.wins(self.window) as f64,
            Metric::WinRate => record.win_rate(self.window),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.metric.prefix(), self.window)
    }
}

/// Podium position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a zero-based position in the sorted list.
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Medal::Gold),
            1 => Some(Medal::Silver),
            2 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Medal::Gold => 1,
            Medal::Silver => 2,
            Medal::Bronze => 3,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

/// Entity identity → metric → medal. A missing entry means unranked.
pub type MedalTable<K> = BTreeMap<K, BTreeMap<MetricKey, Medal>>;

/// Every metric key for the lifetime, recent and each year seen in `records`.
pub fn metric_keys<'a, K: 'a>(records: impl IntoIterator<Item = &'a StatRecord<K>>) -> Vec<MetricKey> {
    let years: BTreeSet<u16> = records.into_iter().flat_map(|r| r.years()).collect();
    let windows = [Window::Total, Window::Recent]
        .into_iter()
        .chain(years.into_iter().map(Window::Year));

    windows
        .flat_map(|window| Metric::ALL.map(|metric| MetricKey::new(metric, window)))
        .collect()
}

/// Rank one metric: eligible, positive values sorted descending, top three.
///
/// Eligibility is checked against the window's own game count. Ties keep
/// input order.
pub fn rank_metric<'a, K: Clone + 'a>(
    records: impl IntoIterator<Item = &'a StatRecord<K>>,
    key: MetricKey,
    rules: &MedalRules,
) -> Vec<(K, Medal)> {
    let floor = rules.min_games(key.window);
    let mut candidates: Vec<(&StatRecord<K>, f64)> = records
        .into_iter()
        .map(|r| (r, key.value(r)))
        .filter(|(r, value)| *value > 0.0 && r.games(key.window) >= floor)
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(position, (record, _))| {
            Medal::from_position(position).map(|medal| (record.key.clone(), medal))
        })
        .collect()
}

/// Write medals for all metrics into `table`.
///
/// The caller decides which subset is ranked (active only, current search
/// results, ...). Existing entries for other metrics are left alone.
pub fn assign_medals<'a, K: Ord + Clone + 'a>(
    records: impl IntoIterator<Item = &'a StatRecord<K>>,
    table: &mut MedalTable<K>,
    rules: &MedalRules,
) {
    let records: Vec<&StatRecord<K>> = records.into_iter().collect();
    for key in metric_keys(records.iter().copied()) {
        for (entity, medal) in rank_metric(records.iter().copied(), key, rules) {
            table.entry(entity).or_default().insert(key, medal);
        }
    }
}

/// Fresh medal table for `records`.
pub fn medal_table<'a, K: Ord + Clone + 'a>(
    records: impl IntoIterator<Item = &'a StatRecord<K>>,
    rules: &MedalRules,
) -> MedalTable<K> {
    let mut table = MedalTable::new();
    assign_medals(records, &mut table, rules);
    table
}

/// Records whose latest sighting was active.
pub fn active_only<'a, K: 'a>(
    records: impl IntoIterator<Item = &'a StatRecord<K>>,
) -> Vec<&'a StatRecord<K>> {
    records.into_iter().filter(|r| r.is_active).collect()
}

/// Medals for the rows a table is showing. Inactive rows are left unranked
/// unless `include_inactive` is set.
pub fn visible_medals<K: Ord + Clone>(
    rows: &[&StatRecord<K>],
    include_inactive: bool,
    rules: &MedalRules,
) -> MedalTable<K> {
    if include_inactive {
        medal_table(rows.iter().copied(), rules)
    } else {
        medal_table(active_only(rows.iter().copied()), rules)
    }
}
