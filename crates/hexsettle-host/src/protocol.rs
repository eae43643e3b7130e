//! Messages exchanged with a match session.

use hexsettle_core::{Event, GameState, Intent, Phase, PlayerId, Rejection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requests queued to a match session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    /// Apply an intent on behalf of a player
    Submit {
        player: PlayerId,
        intent: Intent,
    },

    /// Copy of the current game state
    Snapshot,

    /// Intents a player could submit now
    LegalIntents { player: PlayerId },

    /// Summary of the match
    Status,

    /// Stop the session and hand back the final state
    Close,
}

/// Session answers, one per command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Reply {
    /// Intent applied
    Accepted { events: Vec<Event> },

    /// Intent refused; the state is unchanged
    Rejected { reason: Rejection },

    /// Current state
    Snapshot { state: Box<GameState> },

    /// Legal intents for the requested player
    LegalIntents { intents: Vec<Intent> },

    /// Match summary
    Status { info: MatchInfo },

    /// Session stopped
    Closed { state: Box<GameState> },
}

/// Match information for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub id: Uuid,
    pub players: Vec<String>,
    pub status: MatchStatus,
    pub current_player: Option<PlayerId>,
    /// Intents accepted so far
    pub accepted: u64,
    /// Intents rejected so far
    pub rejected: u64,
}

/// Match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Setup,
    InPlay,
    Finished { winner: PlayerId },
}

impl MatchStatus {
    pub fn of(game: &GameState) -> Self {
        match game.phase() {
            Phase::Setup { .. } => MatchStatus::Setup,
            Phase::Play { .. } => MatchStatus::InPlay,
            Phase::Ended { winner } => MatchStatus::Finished { winner: *winner },
        }
    }
}

/// An accepted event as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub match_id: Uuid,
    /// Position of the event in the match's stream, from 0
    pub sequence: u64,
    pub actor: PlayerId,
    pub event: Event,
}
