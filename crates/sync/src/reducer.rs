//! Reducer - folds causally ready actions into the shared game state
//!
//! Every replica feeds the same per-player action order through [`GameState::apply`],
//! so every replica ends up with the same wells, scores and statuses. Garbage is
//! the only path by which one player's actions touch another player's state.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use tracing::{debug, info, warn};

use crate::core::{calculate_landing_score, Fnv1aHasher, GarbageRow, PieceQueue, Well, WellConfig};
use crate::protocol::{decode_blocks, GameAction, GarbageSource, User};
use crate::types::{ActionId, GameId, PieceKind, UserId, NO_PREV_ACTION};

/// Where a player is in their game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerStatus {
    Joined,
    Playing,
    Paused,
    Lost,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Joined => "joined",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
            PlayerStatus::Lost => "lost",
        }
    }
}

/// One player's share of the game
#[derive(Debug, Clone)]
pub struct PlayerState {
    user: User,
    well: Well,
    queue: PieceQueue,
    status: PlayerStatus,
    score: u32,
    lines: u32,
    /// Garbage received from opponents, not yet appended to the well
    blocks_pending: BTreeMap<GarbageSource, Vec<GarbageRow>>,
    /// Sources this player consumed before their `DROP` arrived here
    consumed_early: BTreeSet<GarbageSource>,
    last_action: ActionId,
    last_ping: Option<u64>,
}

impl PlayerState {
    fn new(game_id: &str, user: User, config: WellConfig) -> Self {
        let queue = PieceQueue::for_player(game_id, &user.id);
        Self {
            user,
            well: Well::new(config),
            queue,
            status: PlayerStatus::Joined,
            score: 0,
            lines: 0,
            blocks_pending: BTreeMap::new(),
            consumed_early: BTreeSet::new(),
            last_action: NO_PREV_ACTION,
            last_ping: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn well(&self) -> &Well {
        &self.well
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn blocks_pending(&self) -> &BTreeMap<GarbageSource, Vec<GarbageRow>> {
        &self.blocks_pending
    }

    /// Number of pending garbage rows across all sources
    pub fn pending_rows(&self) -> usize {
        self.blocks_pending.values().map(Vec::len).sum()
    }

    pub fn last_ping(&self) -> Option<u64> {
        self.last_ping
    }

    /// Next piece kind this player will spawn
    pub fn next_piece(&self) -> PieceKind {
        self.queue.peek()
    }

    fn spawn(&mut self) -> PieceKind {
        let kind = self.queue.draw();
        self.well.load_piece(Some(kind));
        kind
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.user.hash(state);
        self.well.snapshot().hash(state);
        self.queue.hash(state);
        self.status.hash(state);
        self.score.hash(state);
        self.lines.hash(state);
    }
}

/// What applying an action did, for whoever drives the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PlayerJoined {
        user: User,
    },
    StatusChanged {
        user_id: UserId,
        status: PlayerStatus,
    },
    PieceSpawned {
        user_id: UserId,
        kind: PieceKind,
    },
    PieceLanded {
        user_id: UserId,
        kind: PieceKind,
        lines: u32,
        points: u32,
    },
    GarbageSent {
        from: UserId,
        to: UserId,
        rows: usize,
    },
    GarbageQueued {
        user_id: UserId,
        rows: usize,
    },
    WellFull {
        user_id: UserId,
    },
    Ignored {
        action_type: &'static str,
        user_id: UserId,
        action_id: ActionId,
        reason: &'static str,
    },
}

/// Shared state of one game
#[derive(Debug, Clone)]
pub struct GameState {
    game_id: GameId,
    config: WellConfig,
    players: BTreeMap<UserId, PlayerState>,
}

impl GameState {
    pub fn new(game_id: &str, config: WellConfig) -> Self {
        Self {
            game_id: game_id.to_string(),
            config,
            players: BTreeMap::new(),
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn player(&self, user_id: &str) -> Option<&PlayerState> {
        self.players.get(user_id)
    }

    /// Players ordered by user id
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    /// FNV-1a hash over everything every replica must agree on.
    ///
    /// Pending opponent garbage is excluded; it depends on cross-player arrival order.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1aHasher::new();
        self.game_id.hash(&mut hasher);
        self.players.len().hash(&mut hasher);
        for player in self.players.values() {
            player.hash_into(&mut hasher);
        }
        hasher.finish()
    }

    /// Apply one causally ready action
    pub fn apply(&mut self, action: &GameAction) -> Vec<SessionEvent> {
        if action.game_id() != self.game_id {
            return vec![ignored(action, "action belongs to another game")];
        }

        if let GameAction::JoinGame(join) = action {
            return self.join(action, &join.user);
        }

        // Sources whose DROP was already applied here were queued (or skipped) then.
        let already_dropped: Vec<bool> = match action {
            GameAction::AppendPendingBlocks(payload) => payload
                .sources
                .iter()
                .map(|source| {
                    self.players
                        .get(&source.user_id)
                        .is_some_and(|p| p.last_action >= source.action_id)
                })
                .collect(),
            _ => Vec::new(),
        };

        let user_id = action.user_id().to_string();
        let Some(player) = self.players.get_mut(&user_id) else {
            return vec![ignored(action, "player has not joined")];
        };
        if player.status == PlayerStatus::Lost {
            return vec![ignored(action, "player already lost")];
        }
        player.last_action = action.action_id();

        let mut events = Vec::new();
        match action {
            GameAction::JoinGame(_) => {}
            GameAction::PlayerReady(_) => {
                player.status = PlayerStatus::Playing;
                events.push(SessionEvent::StatusChanged {
                    user_id: user_id.clone(),
                    status: player.status,
                });
                if player.well.active().is_none() {
                    let kind = player.spawn();
                    events.push(SessionEvent::PieceSpawned { user_id, kind });
                }
            }
            GameAction::PlayerPause(_) => {
                player.status = PlayerStatus::Paused;
                events.push(SessionEvent::StatusChanged {
                    user_id,
                    status: player.status,
                });
            }
            GameAction::MoveLeft(_) | GameAction::MoveRight(_) | GameAction::Rotate(_) => {
                if !player.is_running() {
                    debug!(user_id = %user_id, action = action.type_name(), "move while not running");
                    return events;
                }
                let moved = match action {
                    GameAction::MoveLeft(_) => player.well.move_left(),
                    GameAction::MoveRight(_) => player.well.move_right(),
                    _ => player.well.rotate(),
                };
                if !moved {
                    debug!(user_id = %user_id, action = action.type_name(), "move rejected");
                }
            }
            GameAction::EnableAcceleration(_) => player.well.set_drop_acceleration(true),
            GameAction::DisableAcceleration(_) => player.well.set_drop_acceleration(false),
            GameAction::AppendPendingBlocks(payload) => {
                let rows = decode_blocks(
                    payload.blocks.as_deref().unwrap_or_default(),
                    player.well.grid().cols(),
                );
                let n = rows.len();
                for (source, dropped) in payload.sources.iter().zip(already_dropped) {
                    if player.blocks_pending.remove(source).is_none() && !dropped {
                        player.consumed_early.insert(source.clone());
                    }
                }
                player.well.queue_garbage(rows);
                if n > 0 {
                    events.push(SessionEvent::GarbageQueued { user_id, rows: n });
                }
            }
            GameAction::Ping(ping) => player.last_ping = Some(ping.time),
            GameAction::Drop(payload) => {
                if !player.is_running() {
                    debug!(user_id = %user_id, "drop while not running");
                    return events;
                }
                let garbage = drop_piece(player, payload.rows, &mut events);
                if !garbage.is_empty() {
                    let source = GarbageSource::new(&user_id, payload.meta.action_id);
                    self.send_garbage(source, garbage, &mut events);
                }
            }
        }
        events
    }

    fn join(&mut self, action: &GameAction, user: &User) -> Vec<SessionEvent> {
        if action.prev_action_id() != NO_PREV_ACTION {
            return vec![ignored(action, "join must start the player's chain")];
        }
        if user.id != action.user_id() {
            return vec![ignored(action, "joining user does not match sender")];
        }
        if self.players.contains_key(&user.id) {
            return vec![ignored(action, "player already joined")];
        }
        info!(game_id = %self.game_id, user_id = %user.id, name = %user.name, "player joined");
        let mut player = PlayerState::new(&self.game_id, user.clone(), self.config);
        player.last_action = action.action_id();
        self.players.insert(user.id.clone(), player);
        vec![SessionEvent::PlayerJoined { user: user.clone() }]
    }

    /// Hand cleared rows to every opponent still in the game.
    ///
    /// An opponent whose `APPEND_PENDING_BLOCKS` already named `source` has taken
    /// the rows; nothing is queued for them.
    fn send_garbage(
        &mut self,
        source: GarbageSource,
        rows: Vec<GarbageRow>,
        events: &mut Vec<SessionEvent>,
    ) {
        for (user_id, player) in self.players.iter_mut() {
            if *user_id == source.user_id || player.status == PlayerStatus::Lost {
                continue;
            }
            if player.consumed_early.remove(&source) {
                debug!(user_id = %user_id, from = %source.user_id, action_id = source.action_id, "garbage already consumed");
                continue;
            }
            player.blocks_pending.insert(source.clone(), rows.clone());
            events.push(SessionEvent::GarbageSent {
                from: source.user_id.clone(),
                to: user_id.clone(),
                rows: rows.len(),
            });
        }
    }
}

/// Run one DROP on a player's well; returns rows to send to opponents
fn drop_piece(player: &mut PlayerState, rows: u32, events: &mut Vec<SessionEvent>) -> Vec<GarbageRow> {
    let user_id = player.user.id.clone();
    let result = player.well.descend(rows as f64);
    let mut garbage = Vec::new();

    if let Some(landing) = result.landing {
        let points =
            calculate_landing_score(landing.cells, landing.hard_drop, landing.lines, player.lines);
        player.score = player.score.saturating_add(points);
        player.lines = player.lines.saturating_add(landing.lines);
        if landing.lines > 0 {
            let config = *player.well.config();
            if player.well.drop_frames() - config.drop_frames_decrement >= config.drop_frames_min {
                player.well.increase_speed();
            }
            garbage = landing.cleared;
        }
        events.push(SessionEvent::PieceLanded {
            user_id: user_id.clone(),
            kind: landing.kind,
            lines: landing.lines,
            points,
        });
    }

    if result.well_full {
        warn!(user_id = %user_id, score = player.score, "well full, player lost");
        player.status = PlayerStatus::Lost;
        player.well.load_piece(None);
        player.blocks_pending.clear();
        player.consumed_early.clear();
        events.push(SessionEvent::WellFull {
            user_id: user_id.clone(),
        });
        events.push(SessionEvent::StatusChanged {
            user_id,
            status: PlayerStatus::Lost,
        });
    } else if player.well.active().is_none() {
        let kind = player.spawn();
        events.push(SessionEvent::PieceSpawned { user_id, kind });
    }
    garbage
}

fn ignored(action: &GameAction, reason: &'static str) -> SessionEvent {
    warn!(
        game_id = action.game_id(),
        user_id = action.user_id(),
        action_id = action.action_id(),
        action = action.type_name(),
        reason,
        "action ignored"
    );
    SessionEvent::Ignored {
        action_type: action.type_name(),
        user_id: action.user_id().to_string(),
        action_id: action.action_id(),
        reason,
    }
}
