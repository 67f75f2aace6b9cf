//! Action log - per-player causal ordering of incoming actions
//!
//! Every player's actions form a chain: each action names the id of the action
//! it follows (`prevActionId`). The log hands actions out only when their
//! predecessor has been handed out, buffering anything that arrives early and
//! reporting the missing ranges so they can be backfilled.
//!
//! There is no ordering across players; chains are independent.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::protocol::{BackfillPlayer, BackfillRange, GameAction};
use crate::types::{ActionId, GameId, UserId, NO_PREV_ACTION};

/// One player's chain: the contiguous prefix plus early arrivals
#[derive(Debug, Clone, Default)]
struct Chain {
    last: ActionId,
    /// Early actions keyed by the `prevActionId` they wait for
    pending: BTreeMap<ActionId, GameAction>,
}

impl Chain {
    fn is_buffered(&self, action_id: ActionId) -> bool {
        self.pending.values().any(|a| a.action_id() == action_id)
    }
}

/// Causality tracker for every game and player seen so far
#[derive(Debug, Clone)]
pub struct ActionLog {
    chains: BTreeMap<GameId, BTreeMap<UserId, Chain>>,
    max_buffered: usize,
}

impl ActionLog {
    pub fn new(max_buffered: usize) -> Self {
        Self {
            chains: BTreeMap::new(),
            max_buffered: max_buffered.max(1),
        }
    }

    /// Offer one action; returns every action that became applicable, in order.
    ///
    /// Duplicates, malformed ids and forks of an already applied chain come back
    /// as an empty list.
    pub fn accept(&mut self, action: GameAction) -> Vec<GameAction> {
        let action_id = action.action_id();
        let prev = action.prev_action_id();
        let max_buffered = self.max_buffered;

        let chain = self
            .chains
            .entry(action.game_id().to_string())
            .or_default()
            .entry(action.user_id().to_string())
            .or_default();

        if action_id <= chain.last || chain.is_buffered(action_id) {
            debug!(
                game_id = action.game_id(),
                user_id = action.user_id(),
                action_id,
                "duplicate action dropped"
            );
            return Vec::new();
        }
        if action_id <= prev {
            warn!(
                game_id = action.game_id(),
                user_id = action.user_id(),
                action_id,
                prev_action_id = prev,
                "malformed action id dropped"
            );
            return Vec::new();
        }
        if prev < chain.last {
            warn!(
                game_id = action.game_id(),
                user_id = action.user_id(),
                action_id,
                prev_action_id = prev,
                last_applied = chain.last,
                "conflicting fork dropped"
            );
            return Vec::new();
        }

        if prev > chain.last {
            if chain.pending.contains_key(&prev) {
                warn!(
                    game_id = action.game_id(),
                    user_id = action.user_id(),
                    action_id,
                    prev_action_id = prev,
                    "second successor for a buffered predecessor dropped"
                );
                return Vec::new();
            }
            debug!(
                game_id = action.game_id(),
                user_id = action.user_id(),
                action_id,
                waiting_for = prev,
                "action buffered"
            );
            chain.pending.insert(prev, action);
            if chain.pending.len() > max_buffered {
                if let Some((_, evicted)) = chain.pending.pop_last() {
                    debug!(
                        action_id = evicted.action_id(),
                        "buffer full, evicted furthest-ahead action"
                    );
                }
            }
            return Vec::new();
        }

        let mut ready = vec![action];
        chain.last = action_id;
        while let Some(next) = chain.pending.remove(&chain.last) {
            chain.last = next.action_id();
            ready.push(next);
        }
        // Anything still waiting on an id below `last` can never apply.
        chain.pending = chain.pending.split_off(&chain.last);
        ready
    }

    /// Feed a batch of backfilled actions, lowest id first
    pub fn apply_backfill(&mut self, mut actions: Vec<GameAction>) -> Vec<GameAction> {
        actions.sort_by_key(|a| a.action_id());
        actions
            .into_iter()
            .flat_map(|action| self.accept(action))
            .collect()
    }

    /// Missing ranges for every chain holding buffered actions
    pub fn detect_gaps(&self) -> Vec<BackfillRange> {
        self.chains
            .iter()
            .filter_map(|(game_id, players)| {
                let players: Vec<BackfillPlayer> = players
                    .iter()
                    .filter(|(_, chain)| !chain.pending.is_empty())
                    .map(|(user_id, chain)| BackfillPlayer {
                        user_id: user_id.clone(),
                        from: chain.last + 1,
                    })
                    .collect();
                (!players.is_empty()).then(|| BackfillRange {
                    game_id: game_id.clone(),
                    players,
                })
            })
            .collect()
    }

    /// Last contiguous applied id; `0` for a chain never seen
    pub fn last_applied(&self, game_id: &str, user_id: &str) -> ActionId {
        self.chain(game_id, user_id)
            .map(|chain| chain.last)
            .unwrap_or(NO_PREV_ACTION)
    }

    /// Number of actions waiting for a predecessor
    pub fn buffered(&self, game_id: &str, user_id: &str) -> usize {
        self.chain(game_id, user_id)
            .map(|chain| chain.pending.len())
            .unwrap_or(0)
    }

    fn chain(&self, game_id: &str, user_id: &str) -> Option<&Chain> {
        self.chains.get(game_id)?.get(user_id)
    }
}
