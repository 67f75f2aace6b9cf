//! Game session - one participant's view of a game
//!
//! A session glues the action log and the reducer together. Remote actions go
//! through the log before they reach the reducer; local inputs are stamped with
//! the next id of the local chain, applied right away and handed back as
//! outbound actions for the transport to broadcast.

use tracing::{debug, info, warn};

use crate::action_log::ActionLog;
use crate::config::SessionConfig;
use crate::error::{ProtocolError, SyncError};
use crate::protocol::{
    encode_blocks, parse_action, ActionMeta, AppendPendingBlocksPayload, BackfillRange, DropPayload,
    GameAction, JoinGamePayload, ParsedAction, PingPayload, User,
};
use crate::reducer::{GameState, PlayerState, SessionEvent};
use crate::types::{GameId, NO_PREV_ACTION};

/// Inputs a local player can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalInput {
    Ready,
    Pause,
    MoveLeft,
    MoveRight,
    Rotate,
    EnableAcceleration,
    DisableAcceleration,
    Ping { time: u64 },
}

impl LocalInput {
    fn into_action(self, meta: ActionMeta) -> GameAction {
        match self {
            LocalInput::Ready => GameAction::PlayerReady(meta),
            LocalInput::Pause => GameAction::PlayerPause(meta),
            LocalInput::MoveLeft => GameAction::MoveLeft(meta),
            LocalInput::MoveRight => GameAction::MoveRight(meta),
            LocalInput::Rotate => GameAction::Rotate(meta),
            LocalInput::EnableAcceleration => GameAction::EnableAcceleration(meta),
            LocalInput::DisableAcceleration => GameAction::DisableAcceleration(meta),
            LocalInput::Ping { time } => GameAction::Ping(PingPayload { meta, time }),
        }
    }
}

/// Result of any session call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutput {
    /// Local actions to broadcast, in chain order
    pub outbound: Vec<GameAction>,
    pub events: Vec<SessionEvent>,
}

impl SessionOutput {
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.events.is_empty()
    }

    fn merge(&mut self, other: SessionOutput) {
        self.outbound.extend(other.outbound);
        self.events.extend(other.events);
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    game_id: GameId,
    local: Option<User>,
    log: ActionLog,
    state: GameState,
    /// Gravity frames not yet turned into whole rows
    pending_frames: f64,
}

impl GameSession {
    /// Session that only watches other players
    pub fn observer(game_id: &str, config: SessionConfig) -> Self {
        Self {
            game_id: game_id.to_string(),
            local: None,
            log: ActionLog::new(config.max_buffered_actions),
            state: GameState::new(game_id, config.well),
            pending_frames: 0.0,
        }
    }

    /// Session for a local player (call [`GameSession::join`] to enter the game)
    pub fn for_player(game_id: &str, user: User, config: SessionConfig) -> Self {
        let mut session = Self::observer(game_id, config);
        session.local = Some(user);
        session
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn local_user(&self) -> Option<&User> {
        self.local.as_ref()
    }

    /// Start the local chain with `JOIN_GAME`; a no-op once joined
    pub fn join(&mut self) -> Result<SessionOutput, SyncError> {
        let user = self.local_user_or_err()?.clone();
        if self.log.last_applied(&self.game_id, &user.id) != NO_PREV_ACTION {
            debug!(user_id = %user.id, "already joined");
            return Ok(SessionOutput::default());
        }
        info!(game_id = %self.game_id, user_id = %user.id, "joining game");
        Ok(self.emit(|meta| GameAction::JoinGame(JoinGamePayload { meta, user })))
    }

    /// Turn a local input into the next action of the local chain
    pub fn input(&mut self, input: LocalInput) -> Result<SessionOutput, SyncError> {
        self.joined_user()?;
        Ok(self.emit(|meta| input.into_action(meta)))
    }

    /// Local gravity clock.
    ///
    /// Frames accumulate while the local player is running; every whole row at the
    /// current speed becomes a `DROP` action.
    pub fn tick(&mut self, frames: f64) -> SessionOutput {
        let Some(player) = self.local_player() else {
            return SessionOutput::default();
        };
        if !player.is_running() || player.well().active().is_none() {
            self.pending_frames = 0.0;
            return SessionOutput::default();
        }
        if !frames.is_finite() || frames <= 0.0 {
            return SessionOutput::default();
        }

        let drop_frames = player.well().effective_drop_frames();
        if drop_frames.is_nan() || drop_frames <= 0.0 {
            return SessionOutput::default();
        }
        self.pending_frames += frames;
        let rows = (self.pending_frames / drop_frames).floor();
        if rows < 1.0 {
            return SessionOutput::default();
        }
        self.pending_frames -= rows * drop_frames;
        let rows = rows.min(u32::MAX as f64) as u32;
        self.emit(|meta| GameAction::Drop(DropPayload { meta, rows }))
    }

    /// Feed one action received from the network
    pub fn receive(&mut self, action: GameAction) -> SessionOutput {
        let ready = self.log.accept(action);
        self.apply_ready(ready)
    }

    /// Parse and feed one JSON line; unknown action types are logged and skipped
    pub fn receive_json(&mut self, line: &str) -> Result<SessionOutput, ProtocolError> {
        match parse_action(line)? {
            ParsedAction::Action(action) => Ok(self.receive(action)),
            ParsedAction::Unknown(unknown) => {
                warn!(action_type = %unknown.action_type, "unknown action type ignored");
                Ok(SessionOutput::default())
            }
        }
    }

    /// Feed a batch answering an earlier backfill request
    pub fn receive_backfill(&mut self, actions: Vec<GameAction>) -> SessionOutput {
        let ready = self.log.apply_backfill(actions);
        self.apply_ready(ready)
    }

    /// Chains waiting for missing actions
    pub fn detect_gaps(&self) -> Vec<BackfillRange> {
        let gaps = self.log.detect_gaps();
        if !gaps.is_empty() {
            let chains: usize = gaps.iter().map(|g| g.players.len()).sum();
            info!(game_id = %self.game_id, chains, "action gaps detected");
        }
        gaps
    }

    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self, user_id: &str) -> Option<&PlayerState> {
        self.state.player(user_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.state.players()
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    fn local_user_or_err(&self) -> Result<&User, SyncError> {
        self.local.as_ref().ok_or_else(|| SyncError::NotAPlayer {
            game_id: self.game_id.clone(),
        })
    }

    fn joined_user(&self) -> Result<&User, SyncError> {
        let user = self.local_user_or_err()?;
        if self.state.player(&user.id).is_none() {
            return Err(SyncError::NotJoined {
                game_id: self.game_id.clone(),
                user_id: user.id.clone(),
            });
        }
        Ok(user)
    }

    fn local_player(&self) -> Option<&PlayerState> {
        self.state.player(&self.local.as_ref()?.id)
    }

    /// Stamp, apply and return the next local action
    fn emit(&mut self, build: impl FnOnce(ActionMeta) -> GameAction) -> SessionOutput {
        let Some(user) = self.local.as_ref() else {
            return SessionOutput::default();
        };
        let last = self.log.last_applied(&self.game_id, &user.id);
        let meta = ActionMeta::new(&self.game_id, &user.id, last + 1, last);
        let action = build(meta);

        let mut out = SessionOutput {
            outbound: vec![action.clone()],
            events: Vec::new(),
        };
        out.merge(self.receive(action));
        self.flush_pending_blocks(&mut out);
        out
    }

    /// After a local landing, move received garbage onto the local well
    fn flush_pending_blocks(&mut self, out: &mut SessionOutput) {
        let Some(user) = self.local.as_ref() else {
            return;
        };
        let landed = out
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::PieceLanded { user_id, .. } if *user_id == user.id));
        if !landed {
            return;
        }
        let Some(player) = self.local_player() else {
            return;
        };
        if player.blocks_pending().is_empty() {
            return;
        }
        let sources: Vec<_> = player.blocks_pending().keys().cloned().collect();
        let rows: Vec<_> = player.blocks_pending().values().flatten().cloned().collect();
        let blocks = Some(encode_blocks(&rows));
        out.merge(self.emit(|meta| {
            GameAction::AppendPendingBlocks(AppendPendingBlocksPayload {
                meta,
                blocks,
                sources,
            })
        }));
    }

    fn apply_ready(&mut self, ready: Vec<GameAction>) -> SessionOutput {
        let mut out = SessionOutput::default();
        for action in ready {
            out.events.extend(self.state.apply(&action));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::PlayerStatus;

    fn player(id: &str) -> GameSession {
        GameSession::for_player("g", User::new(id, id), SessionConfig::default())
    }

    #[test]
    fn test_join_starts_local_chain() {
        let mut session = player("a");
        let out = session.join().unwrap();
        assert_eq!(out.outbound.len(), 1);
        assert_eq!(out.outbound[0].action_id(), 1);
        assert_eq!(out.outbound[0].prev_action_id(), 0);
        assert!(session.player("a").is_some());

        assert!(session.join().unwrap().is_empty());
    }

    #[test]
    fn test_inputs_chain_ids() {
        let mut session = player("a");
        session.join().unwrap();
        let ready = session.input(LocalInput::Ready).unwrap();
        let rotate = session.input(LocalInput::Rotate).unwrap();
        assert_eq!(ready.outbound[0].action_id(), 2);
        assert_eq!(rotate.outbound[0].prev_action_id(), 2);
        assert_eq!(rotate.outbound[0].action_id(), 3);
        assert_eq!(
            session.player("a").unwrap().status(),
            PlayerStatus::Playing
        );
    }

    #[test]
    fn test_observer_cannot_input() {
        let mut session = GameSession::observer("g", SessionConfig::default());
        assert!(matches!(session.join(), Err(SyncError::NotAPlayer { .. })));
        assert!(matches!(
            session.input(LocalInput::Rotate),
            Err(SyncError::NotAPlayer { .. })
        ));
        assert!(session.tick(100.0).is_empty());
    }

    #[test]
    fn test_input_before_join_is_an_error() {
        let mut session = player("a");
        assert!(matches!(
            session.input(LocalInput::Ready),
            Err(SyncError::NotJoined { .. })
        ));
    }

    #[test]
    fn test_tick_emits_whole_rows_only() {
        let mut session = player("a");
        session.join().unwrap();
        assert!(session.tick(480.0).is_empty(), "not running yet");

        session.input(LocalInput::Ready).unwrap();
        assert!(session.tick(24.0).is_empty());
        let out = session.tick(72.0);
        match out.outbound.as_slice() {
            [GameAction::Drop(p)] => assert_eq!(p.rows, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(session.player("a").unwrap().well().grid_position().1, 0);
    }

    #[test]
    fn test_remote_actions_are_applied_in_chain_order() {
        let mut remote = player("b");
        let mut actions = remote.join().unwrap().outbound;
        actions.extend(remote.input(LocalInput::Ready).unwrap().outbound);
        actions.extend(remote.input(LocalInput::MoveLeft).unwrap().outbound);

        let mut observer = GameSession::observer("g", SessionConfig::default());
        actions.reverse();
        for action in actions {
            observer.receive(action);
        }
        assert_eq!(observer.state_hash(), remote.state_hash());
        assert!(observer.detect_gaps().is_empty());
    }

    #[test]
    fn test_receive_json_skips_unknown_types() {
        let mut session = GameSession::observer("g", SessionConfig::default());
        let out = session
            .receive_json(r#"{"type":"CHAT","payload":{}}"#)
            .unwrap();
        assert!(out.is_empty());
        assert!(session.receive_json("{").is_err());
    }
}
