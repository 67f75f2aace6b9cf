//! Error types for the sync layer
//!
//! Rejected moves, duplicates and out-of-order actions are not errors; they are
//! regular outcomes of the action log and reducer. The types here cover input
//! that cannot be decoded and collaborators that cannot answer.

use thiserror::Error;

use crate::types::{GameId, UserId};

/// Wire decoding and encoding failures
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed action message: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(source: serde_json::Error) -> Self {
        ProtocolError::Malformed { source }
    }
}

/// Session, history and runtime failures
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("no actions recorded for {user_id} in game {game_id}")]
    UnknownChain { game_id: GameId, user_id: UserId },

    #[error("session for game {game_id} has no local player")]
    NotAPlayer { game_id: GameId },

    #[error("local player {user_id} has not joined game {game_id}")]
    NotJoined { game_id: GameId, user_id: UserId },

    #[error("session runtime is gone")]
    RuntimeClosed,

    #[error("failed to start session runtime: {0}")]
    Io(#[from] std::io::Error),
}
