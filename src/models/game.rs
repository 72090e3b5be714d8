//! Match and participant models, in the enriched shape the persistence layer exports.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{DeckKey, EntityId, MatchId};

/// Raw `elimination_type` value that marks the winner rather than a cause.
pub const WINNER_SENTINEL: &str = "Winner";

/// Cause of a participant's defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EliminationType {
    #[serde(rename = "Combat Damage")]
    CombatDamage,
    #[serde(rename = "Commander Damage")]
    CommanderDamage,
    #[serde(rename = "Non-Combat Damage")]
    NonCombatDamage,
    #[serde(rename = "Other")]
    Other,
}

impl EliminationType {
    pub const ALL: [EliminationType; 4] = [
        EliminationType::CombatDamage,
        EliminationType::CommanderDamage,
        EliminationType::NonCombatDamage,
        EliminationType::Other,
    ];

    /// Parse the raw label stored with a participant. Unknown labels and the
    /// winner sentinel are not causes.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Combat Damage" => Some(EliminationType::CombatDamage),
            "Commander Damage" => Some(EliminationType::CommanderDamage),
            "Non-Combat Damage" => Some(EliminationType::NonCombatDamage),
            "Other" => Some(EliminationType::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EliminationType::CombatDamage => "Combat Damage",
            EliminationType::CommanderDamage => "Commander Damage",
            EliminationType::NonCombatDamage => "Non-Combat Damage",
            EliminationType::Other => "Other",
        }
    }

    /// Single-letter code used in compact breakdowns (C/D/N/O).
    pub fn code(&self) -> char {
        match self {
            EliminationType::CombatDamage => 'C',
            EliminationType::CommanderDamage => 'D',
            EliminationType::NonCombatDamage => 'N',
            EliminationType::Other => 'O',
        }
    }
}

impl std::fmt::Display for EliminationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn default_active() -> bool {
    true
}

/// Resolved player sub-object attached to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub name: String,

    /// Whether the player is still active in the group
    #[serde(default = "default_active", alias = "status", deserialize_with = "lenient_active")]
    pub is_active: bool,
}

/// Resolved deck sub-object attached to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckRef {
    #[serde(alias = "deck_name")]
    pub name: String,

    /// Owner's player name; the pilot is assumed to own the deck when absent
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner: Option<String>,

    /// Whether the deck is still in rotation (not retired)
    #[serde(default = "default_active", alias = "status", deserialize_with = "lenient_active")]
    pub is_active: bool,

    /// Raw color identity string, e.g. "WUB" or "gw"
    #[serde(default, deserialize_with = "lenient_string")]
    pub color_identity: Option<String>,
}

/// One player's presence in one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Unparsable sub-objects leave the participant unresolved
    #[serde(default, alias = "players", deserialize_with = "lenient_object")]
    pub player: Option<PlayerRef>,

    #[serde(default, alias = "decks", deserialize_with = "lenient_object")]
    pub deck: Option<DeckRef>,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_winner: bool,

    /// Turn this participant was eliminated; 0 means not recorded
    #[serde(default, deserialize_with = "permissive_turn")]
    pub turn_eliminated: u32,

    /// Raw elimination label (a cause, the winner sentinel, or free text)
    #[serde(default, deserialize_with = "lenient_string")]
    pub elimination_type: Option<String>,

    /// Name of the player who eliminated this participant
    #[serde(default, deserialize_with = "lenient_string")]
    pub eliminated_by: Option<String>,

    /// Finishing position as registered (1 = winner)
    #[serde(default, deserialize_with = "permissive_rank", skip_serializing_if = "Option::is_none")]
    pub rank: Option<u8>,
}

impl Participant {
    /// Create a participant piloting `deck` (owned by the pilot).
    pub fn new(player: impl Into<String>, deck: impl Into<String>) -> Self {
        Self {
            player: Some(PlayerRef {
                name: player.into(),
                is_active: true,
            }),
            deck: Some(DeckRef {
                name: deck.into(),
                owner: None,
                is_active: true,
                color_identity: None,
            }),
            is_winner: false,
            turn_eliminated: 0,
            elimination_type: None,
            eliminated_by: None,
            rank: None,
        }
    }

    /// Builder method to mark the participant as the winner.
    pub fn winner(mut self) -> Self {
        self.is_winner = true;
        self.elimination_type = Some(WINNER_SENTINEL.to_string());
        self
    }

    /// Builder method to record how the participant was eliminated.
    pub fn eliminated(mut self, turn: u32, cause: EliminationType, by: impl Into<String>) -> Self {
        self.turn_eliminated = turn;
        self.elimination_type = Some(cause.label().to_string());
        self.eliminated_by = Some(by.into());
        self
    }

    /// Builder method to set the deck's color identity.
    pub fn with_colors(mut self, colors: impl Into<String>) -> Self {
        if let Some(deck) = self.deck.as_mut() {
            deck.color_identity = Some(colors.into());
        }
        self
    }

    /// Builder method to set player and deck activity.
    pub fn with_active(mut self, player_active: bool, deck_active: bool) -> Self {
        if let Some(player) = self.player.as_mut() {
            player.is_active = player_active;
        }
        if let Some(deck) = self.deck.as_mut() {
            deck.is_active = deck_active;
        }
        self
    }

    /// Deck identity; requires both the player and the deck to be resolved.
    pub fn deck_key(&self) -> Option<DeckKey> {
        let player = self.player.as_ref()?;
        let deck = self.deck.as_ref()?;
        let owner = deck.owner.clone().unwrap_or_else(|| player.name.clone());
        Some(DeckKey::new(deck.name.clone(), owner))
    }

    /// The real elimination category, if one was recorded.
    pub fn elimination_cause(&self) -> Option<EliminationType> {
        self.elimination_type
            .as_deref()
            .and_then(EliminationType::from_label)
    }

    pub fn is_resolved(&self) -> bool {
        self.player.is_some() && self.deck.is_some()
    }
}

/// One played game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Dataset id; numeric ids are kept as their decimal string
    #[serde(default, alias = "match_id", deserialize_with = "permissive_id")]
    pub id: Option<MatchId>,

    /// Calendar date, `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: Option<String>,

    /// A missing or non-array list reads as empty; unparsable entries are dropped
    #[serde(default, alias = "match_participants", deserialize_with = "lenient_participants")]
    pub participants: Vec<Participant>,
}

impl Match {
    pub fn new(date: impl Into<String>, participants: Vec<Participant>) -> Self {
        Self {
            id: None,
            date: Some(date.into()),
            notes: None,
            participants,
        }
    }

    /// Explicit id when present, otherwise a hash of date and participant names.
    pub fn id_or_derived(&self) -> MatchId {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let mut fields: Vec<&str> = vec![self.date.as_deref().unwrap_or("")];
        fields.extend(
            self.participants
                .iter()
                .filter_map(|p| p.player.as_ref().map(|pl| pl.name.as_str())),
        );
        EntityId::generate(&fields)
    }

    /// A usable date: present and non-blank.
    pub fn date_str(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Year taken from the first four characters of the date.
    pub fn year(&self) -> Option<u16> {
        self.date_str()?.get(..4)?.parse().ok()
    }

    /// Index of the first participant flagged as winner.
    pub fn winner_index(&self) -> Option<usize> {
        self.participants.iter().position(|p| p.is_winner)
    }

    /// Largest recorded elimination turn, 0 when none was recorded.
    pub fn max_elimination_turn(&self) -> u32 {
        self.participants
            .iter()
            .map(|p| p.turn_eliminated)
            .max()
            .unwrap_or(0)
    }

    /// Participants with their finishing position, best first.
    ///
    /// A registered rank is used when present. Otherwise the winner is 1st
    /// and the others follow in the order they were recorded.
    pub fn finishing_order(&self) -> Vec<(u8, &Participant)> {
        let mut next = 2u8;
        let mut order: Vec<(u8, &Participant)> = self
            .participants
            .iter()
            .map(|p| {
                let fallback = if p.is_winner {
                    1
                } else {
                    let position = next;
                    next = next.saturating_add(1);
                    position
                };
                (p.rank.unwrap_or(fallback), p)
            })
            .collect();
        order.sort_by_key(|(position, _)| *position);
        order
    }

    /// The participant who finished in `position`.
    pub fn participant_at(&self, position: u8) -> Option<&Participant> {
        self.finishing_order()
            .into_iter()
            .find(|(p, _)| *p == position)
            .map(|(_, participant)| participant)
    }

    /// The participant piloted by the named player.
    pub fn participant_for(&self, player_name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.player.as_ref().is_some_and(|pl| pl.name == player_name))
    }
}

/// Strings are kept; any other JSON value reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn flag_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Booleans, 0/1 and "true"/"false"; anything else is `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(flag_from_value).unwrap_or(false))
}

/// Like `lenient_flag`, but unreadable values fall back to active.
fn lenient_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(flag_from_value).unwrap_or_else(default_active))
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_participants<'de, D>(deserializer: D) -> Result<Vec<Participant>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn permissive_id<'de, D>(deserializer: D) -> Result<Option<MatchId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(EntityId::from(s)),
        Some(Value::Number(n)) => Some(EntityId::from(n.to_string())),
        _ => None,
    })
}

/// Parse a turn number the way the dashboard did: numbers and numeric
/// prefixes are accepted, everything else becomes 0.
fn permissive_turn<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(turn_from_value).unwrap_or(0))
}

/// Positions 1 to 255; anything else is unregistered.
fn permissive_rank<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(turn_from_value)
        .and_then(|rank| u8::try_from(rank).ok())
        .filter(|rank| *rank > 0))
}

fn turn_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).unwrap_or(0)
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 1.0 && f < u32::MAX as f64 {
                    f.trunc() as u32
                } else {
                    0
                }
            } else {
                0
            }
        }
        Value::String(s) => parse_turn(s),
        _ => 0,
    }
}

/// Leading-digit parse of a turn string ("7", " 7th" → 7, "abc" → 0).
pub fn parse_turn(raw: &str) -> u32 {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
