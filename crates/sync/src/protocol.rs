//! Protocol module - JSON action messages shared by every replica
//!
//! Every action is `{"type": "...", "payload": {...}}` with camelCase payload keys.
//! All payloads carry the chain metadata (`actionId`, `prevActionId`, `gameId`,
//! `userId`); a few add their own fields.

use serde::{Deserialize, Serialize};

use crate::core::GarbageRow;
use crate::error::ProtocolError;
use crate::types::{cell_code, cell_from_code, ActionId, GameId, UserId};

/// Causal chain metadata carried by every action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMeta {
    pub action_id: ActionId,
    pub prev_action_id: ActionId,
    pub game_id: GameId,
    pub user_id: UserId,
}

impl ActionMeta {
    pub fn new(game_id: &str, user_id: &str, action_id: ActionId, prev_action_id: ActionId) -> Self {
        Self {
            action_id,
            prev_action_id,
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGamePayload {
    #[serde(flatten)]
    pub meta: ActionMeta,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    #[serde(flatten)]
    pub meta: ActionMeta,
    pub rows: u32,
}

/// The opponent `DROP` that produced a batch of garbage rows
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarbageSource {
    pub user_id: UserId,
    pub action_id: ActionId,
}

impl GarbageSource {
    pub fn new(user_id: &str, action_id: ActionId) -> Self {
        Self {
            user_id: user_id.to_string(),
            action_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendPendingBlocksPayload {
    #[serde(flatten)]
    pub meta: ActionMeta,
    /// Garbage rows as cell codes; absent means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Vec<u8>>>,
    /// Pending garbage batches these rows consume
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GarbageSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingPayload {
    #[serde(flatten)]
    pub meta: ActionMeta,
    /// Sender clock, milliseconds
    pub time: u64,
}

/// Every gameplay action, as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    JoinGame(JoinGamePayload),
    PlayerReady(ActionMeta),
    PlayerPause(ActionMeta),
    MoveLeft(ActionMeta),
    MoveRight(ActionMeta),
    Rotate(ActionMeta),
    Drop(DropPayload),
    EnableAcceleration(ActionMeta),
    DisableAcceleration(ActionMeta),
    AppendPendingBlocks(AppendPendingBlocksPayload),
    Ping(PingPayload),
}

/// Wire names of every known action type
pub const ACTION_TYPES: [&str; 11] = [
    "JOIN_GAME",
    "PLAYER_READY",
    "PLAYER_PAUSE",
    "MOVE_LEFT",
    "MOVE_RIGHT",
    "ROTATE",
    "DROP",
    "ENABLE_ACCELERATION",
    "DISABLE_ACCELERATION",
    "APPEND_PENDING_BLOCKS",
    "PING",
];

impl GameAction {
    pub fn meta(&self) -> &ActionMeta {
        match self {
            GameAction::JoinGame(p) => &p.meta,
            GameAction::Drop(p) => &p.meta,
            GameAction::AppendPendingBlocks(p) => &p.meta,
            GameAction::Ping(p) => &p.meta,
            GameAction::PlayerReady(meta)
            | GameAction::PlayerPause(meta)
            | GameAction::MoveLeft(meta)
            | GameAction::MoveRight(meta)
            | GameAction::Rotate(meta)
            | GameAction::EnableAcceleration(meta)
            | GameAction::DisableAcceleration(meta) => meta,
        }
    }

    pub fn action_id(&self) -> ActionId {
        self.meta().action_id
    }

    pub fn prev_action_id(&self) -> ActionId {
        self.meta().prev_action_id
    }

    pub fn game_id(&self) -> &str {
        &self.meta().game_id
    }

    pub fn user_id(&self) -> &str {
        &self.meta().user_id
    }

    /// Wire `type` of this action
    pub fn type_name(&self) -> &'static str {
        match self {
            GameAction::JoinGame(_) => "JOIN_GAME",
            GameAction::PlayerReady(_) => "PLAYER_READY",
            GameAction::PlayerPause(_) => "PLAYER_PAUSE",
            GameAction::MoveLeft(_) => "MOVE_LEFT",
            GameAction::MoveRight(_) => "MOVE_RIGHT",
            GameAction::Rotate(_) => "ROTATE",
            GameAction::Drop(_) => "DROP",
            GameAction::EnableAcceleration(_) => "ENABLE_ACCELERATION",
            GameAction::DisableAcceleration(_) => "DISABLE_ACCELERATION",
            GameAction::AppendPendingBlocks(_) => "APPEND_PENDING_BLOCKS",
            GameAction::Ping(_) => "PING",
        }
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            what: "action",
            source,
        })
    }
}

/// A message whose `type` this build does not know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction {
    pub action_type: String,
}

/// Parsed incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAction {
    Action(GameAction),
    Unknown(UnknownAction),
}

/// Parse one JSON action.
///
/// An unknown `type` is not a hard error: it comes back as [`ParsedAction::Unknown`]
/// so the caller can log and skip it. A known type with a broken payload is.
pub fn parse_action(json: &str) -> Result<ParsedAction, ProtocolError> {
    match serde_json::from_str::<GameAction>(json) {
        Ok(action) => Ok(ParsedAction::Action(action)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                action_type: Option<String>,
            }
            let action_type = serde_json::from_str::<TypeOnly>(json)?
                .action_type
                .unwrap_or_default();
            if ACTION_TYPES.contains(&action_type.as_str()) {
                return Err(e.into());
            }
            Ok(ParsedAction::Unknown(UnknownAction { action_type }))
        }
    }
}

/// One player's entry in a backfill request: "send me everything from `from` on"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillPlayer {
    pub user_id: UserId,
    pub from: ActionId,
}

/// Missing action ranges for one game
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillRange {
    pub game_id: GameId,
    pub players: Vec<BackfillPlayer>,
}

pub fn encode_backfill_request(ranges: &[BackfillRange]) -> Result<String, ProtocolError> {
    serde_json::to_string(ranges).map_err(|source| ProtocolError::Encode {
        what: "backfill request",
        source,
    })
}

pub fn parse_backfill_request(json: &str) -> Result<Vec<BackfillRange>, ProtocolError> {
    Ok(serde_json::from_str(json)?)
}

/// Garbage rows to wire cell codes
pub fn encode_blocks(rows: &[GarbageRow]) -> Vec<Vec<u8>> {
    rows.iter()
        .map(|row| row.iter().map(|&cell| cell_code(cell)).collect())
        .collect()
}

/// Wire cell codes to garbage rows of exactly `cols` cells
pub fn decode_blocks(blocks: &[Vec<u8>], cols: usize) -> Vec<GarbageRow> {
    blocks
        .iter()
        .map(|row| {
            (0..cols)
                .map(|x| row.get(x).copied().and_then(cell_from_code))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceKind;

    #[test]
    fn test_wire_shape() {
        let action = GameAction::MoveLeft(ActionMeta::new("g1", "u1", 4, 3));
        let value: serde_json::Value = serde_json::from_str(&action.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "MOVE_LEFT",
                "payload": {"actionId": 4, "prevActionId": 3, "gameId": "g1", "userId": "u1"}
            })
        );
    }

    #[test]
    fn test_parse_join_game() {
        let json = r#"{"type":"JOIN_GAME","payload":{"actionId":1,"prevActionId":0,"gameId":"ab12","userId":"u7","user":{"id":"u7","name":"Mira"}}}"#;
        let ParsedAction::Action(GameAction::JoinGame(p)) = parse_action(json).unwrap() else {
            panic!("expected JOIN_GAME");
        };
        assert_eq!(p.meta, ActionMeta::new("ab12", "u7", 1, 0));
        assert_eq!(p.user, User::new("u7", "Mira"));
    }

    #[test]
    fn test_parse_payload_fields() {
        let drop = r#"{"type":"DROP","payload":{"actionId":9,"prevActionId":8,"gameId":"g","userId":"u","rows":3}}"#;
        match parse_action(drop).unwrap() {
            ParsedAction::Action(GameAction::Drop(p)) => assert_eq!(p.rows, 3),
            other => panic!("unexpected {:?}", other),
        }

        let append = r#"{"type":"APPEND_PENDING_BLOCKS","payload":{"actionId":2,"prevActionId":1,"gameId":"g","userId":"u"}}"#;
        match parse_action(append).unwrap() {
            ParsedAction::Action(GameAction::AppendPendingBlocks(p)) => {
                assert_eq!(p.blocks, None);
                assert!(p.sources.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }

        let sourced = r#"{"type":"APPEND_PENDING_BLOCKS","payload":{"actionId":5,"prevActionId":4,"gameId":"g","userId":"u","blocks":[[1,0]],"sources":[{"userId":"v","actionId":7}]}}"#;
        match parse_action(sourced).unwrap() {
            ParsedAction::Action(GameAction::AppendPendingBlocks(p)) => {
                assert_eq!(p.sources, vec![GarbageSource::new("v", 7)]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let json = r#"{"type":"SEND_EMOJI","payload":{"actionId":1}}"#;
        assert_eq!(
            parse_action(json).unwrap(),
            ParsedAction::Unknown(UnknownAction {
                action_type: "SEND_EMOJI".to_string()
            })
        );
    }

    #[test]
    fn test_known_type_with_bad_payload_is_an_error() {
        let json = r#"{"type":"DROP","payload":{"actionId":1,"prevActionId":0,"gameId":"g","userId":"u"}}"#;
        assert!(matches!(parse_action(json), Err(ProtocolError::Malformed { .. })));
        assert!(parse_action("not json").is_err());
    }

    #[test]
    fn test_backfill_request_shape() {
        let ranges = vec![BackfillRange {
            game_id: "g".into(),
            players: vec![BackfillPlayer {
                user_id: "u".into(),
                from: 3,
            }],
        }];
        let json = encode_backfill_request(&ranges).unwrap();
        assert_eq!(json, r#"[{"gameId":"g","players":[{"userId":"u","from":3}]}]"#);
        assert_eq!(parse_backfill_request(&json).unwrap(), ranges);
    }

    #[test]
    fn test_decode_blocks_pads_and_ignores_bad_codes() {
        let rows = decode_blocks(&[vec![1, 0, 9]], 4);
        assert_eq!(rows, vec![vec![Some(PieceKind::I), None, None, None]]);
        assert_eq!(encode_blocks(&rows), vec![vec![1, 0, 0, 0]]);
    }
}
