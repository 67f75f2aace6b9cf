//! Multiplayer sync layer - causal action chains on top of the well physics
//!
//! Every player broadcasts their gameplay as a chain of actions. Each action
//! carries its own `actionId` and the `prevActionId` it follows, so any client
//! can rebuild every player's exact action order no matter how the network
//! reorders or drops messages. Identical order in means identical wells out.
//!
//! # Flow
//!
//! 1. A local input becomes the next action of the local chain ([`GameSession::input`])
//! 2. The transport broadcasts it; other clients feed it to [`GameSession::receive`]
//! 3. The [`ActionLog`] releases actions only after their predecessor, buffering early ones
//! 4. The [`GameState`] reducer applies released actions to the player's [`Well`](crate::core::Well)
//! 5. Open gaps are reported by [`GameSession::detect_gaps`] and answered by an [`ActionSource`]
//!
//! # Wire Format
//!
//! ```text
//! {"type":"JOIN_GAME","payload":{"actionId":1,"prevActionId":0,"gameId":"a1b2","userId":"u1","user":{"id":"u1","name":"Ana"}}}
//! {"type":"PLAYER_READY","payload":{"actionId":2,"prevActionId":1,"gameId":"a1b2","userId":"u1"}}
//! {"type":"DROP","payload":{"actionId":3,"prevActionId":2,"gameId":"a1b2","userId":"u1","rows":1}}
//! ```
//!
//! Backfill requests are `[{"gameId":"a1b2","players":[{"userId":"u1","from":3}]}]`.
//!
//! # Environment Variables
//!
//! See [`SessionConfig::from_env`].

pub mod action_log;
pub mod config;
pub mod error;
pub mod history;
pub mod protocol;
pub mod reducer;
pub mod runtime;
pub mod session;

pub use flatris_core as core;
pub use flatris_types as types;

pub use action_log::ActionLog;
pub use config::SessionConfig;
pub use error::{ProtocolError, SyncError};
pub use history::{ActionHistory, ActionSource};
pub use protocol::*;
pub use reducer::{GameState, PlayerState, PlayerStatus, SessionEvent};
pub use runtime::{run_session, Inbound, Outbound, RuntimeConfig, SessionRuntime};
pub use session::{GameSession, LocalInput, SessionOutput};
