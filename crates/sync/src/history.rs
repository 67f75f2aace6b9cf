//! Action history - the store that answers backfill requests
//!
//! Sessions only need something that can hand back "every action of this player
//! from id N on"; [`ActionSource`] is that seam. [`ActionHistory`] is the in-memory
//! implementation used by relays, replays and tests.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::SyncError;
use crate::protocol::{BackfillRange, GameAction};
use crate::types::{ActionId, GameId, UserId};

/// Anything that can replay a player's chain from a given id
pub trait ActionSource {
    /// Actions of `user_id` in `game_id` with `actionId >= from`, ascending
    fn fetch_actions(
        &self,
        game_id: &str,
        user_id: &str,
        from: ActionId,
    ) -> Result<Vec<GameAction>, SyncError>;

    /// Answer a whole backfill request; chains the source never saw are skipped
    fn answer(&self, ranges: &[BackfillRange]) -> Result<Vec<GameAction>, SyncError> {
        let mut actions = Vec::new();
        for range in ranges {
            for player in &range.players {
                match self.fetch_actions(&range.game_id, &player.user_id, player.from) {
                    Ok(found) => actions.extend(found),
                    Err(SyncError::UnknownChain { game_id, user_id }) => {
                        debug!(%game_id, %user_id, "backfill for unknown chain skipped");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(actions)
    }
}

/// Append-only in-memory store of every action seen, per player chain
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    chains: BTreeMap<(GameId, UserId), BTreeMap<ActionId, GameAction>>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an action; returns false when its id was already recorded
    pub fn record(&mut self, action: GameAction) -> bool {
        let key = (action.game_id().to_string(), action.user_id().to_string());
        let chain = self.chains.entry(key).or_default();
        if chain.contains_key(&action.action_id()) {
            return false;
        }
        chain.insert(action.action_id(), action);
        true
    }

    /// Total number of stored actions
    pub fn len(&self) -> usize {
        self.chains.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl ActionSource for ActionHistory {
    fn fetch_actions(
        &self,
        game_id: &str,
        user_id: &str,
        from: ActionId,
    ) -> Result<Vec<GameAction>, SyncError> {
        let chain = self
            .chains
            .get(&(game_id.to_string(), user_id.to_string()))
            .ok_or_else(|| SyncError::UnknownChain {
                game_id: game_id.to_string(),
                user_id: user_id.to_string(),
            })?;
        Ok(chain.range(from..).map(|(_, a)| a.clone()).collect())
    }
}
