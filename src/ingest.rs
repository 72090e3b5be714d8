//! Ingestion boundary: match validation before the statistics engine.
//!
//! The engine itself tolerates malformed matches by skipping what it cannot
//! use. Screening here rejects them up front so they can be reported.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Match, MatchId};

pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 4;

/// Reasons a match is refused at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("match has no date")]
    MissingDate,

    #[error("date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidDate(String),

    #[error("match has {0} participants, expected 2 to 4")]
    ParticipantCount(usize),

    #[error("participant {0} has no resolved player or deck")]
    UnresolvedParticipant(usize),

    #[error("match has no winner")]
    NoWinner,

    #[error("match has {0} winners")]
    MultipleWinners(usize),
}

/// Check one match against the dataset rules. The first failed rule is returned.
pub fn validate_match(m: &Match) -> Result<(), MatchError> {
    let date = m.date_str().ok_or(MatchError::MissingDate)?;
    let well_formed = date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(MatchError::InvalidDate(date.to_string()));
    }

    let count = m.participants.len();
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&count) {
        return Err(MatchError::ParticipantCount(count));
    }

    if let Some(index) = m.participants.iter().position(|p| !p.is_resolved()) {
        return Err(MatchError::UnresolvedParticipant(index));
    }

    match m.participants.iter().filter(|p| p.is_winner).count() {
        0 => Err(MatchError::NoWinner),
        1 => Ok(()),
        n => Err(MatchError::MultipleWinners(n)),
    }
}

/// A match refused by [`screen_matches`].
#[derive(Debug, Clone, Serialize)]
pub struct RejectedMatch {
    pub id: MatchId,
    pub date: Option<String>,
    pub reason: String,
    #[serde(skip)]
    pub error: MatchError,
}

/// Outcome of screening a match list.
#[derive(Debug, Clone, Default)]
pub struct Screening {
    pub accepted: Vec<Match>,
    pub rejected: Vec<RejectedMatch>,
}

impl Screening {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Split `matches` into valid and rejected ones, logging each rejection.
pub fn screen_matches(matches: Vec<Match>) -> Screening {
    let mut screening = Screening::default();

    for m in matches {
        match validate_match(&m) {
            Ok(()) => screening.accepted.push(m),
            Err(error) => {
                let id = m.id_or_derived();
                warn!("Rejected match {}: {}", id, error);
                screening.rejected.push(RejectedMatch {
                    id,
                    date: m.date.clone(),
                    reason: error.to_string(),
                    error,
                });
            }
        }
    }

    info!(
        "Screened matches: {} accepted, {} rejected",
        screening.accepted.len(),
        screening.rejected.len()
    );

    screening
}
