//! Session runtime
//!
//! Serialises everything that touches a [`GameSession`] onto one tokio task:
//! network input, local input, the gravity clock and the periodic gap check.
//! The transport itself lives elsewhere and talks to the task over channels.

use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::SyncError;
use crate::protocol::{BackfillRange, GameAction};
use crate::reducer::SessionEvent;
use crate::session::{GameSession, LocalInput, SessionOutput};

/// Message delivered to the session task
#[derive(Debug, Clone)]
pub enum Inbound {
    Action(GameAction),
    /// Raw JSON line from the transport
    Line(String),
    Backfill(Vec<GameAction>),
    Input(LocalInput),
}

/// Message produced by the session task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Local action to broadcast
    Action(GameAction),
    /// Ranges to request from an action source
    Backfill(Vec<BackfillRange>),
    Event(SessionEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub frames_per_second: u32,
    pub frame_interval: Duration,
    pub backfill_interval: Duration,
    /// Capacity of the inbound channel created by [`SessionRuntime::start`]
    pub max_pending_inbound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for RuntimeConfig {
    fn from(config: &SessionConfig) -> Self {
        let fps = config.frames_per_second.max(1);
        Self {
            frames_per_second: fps,
            frame_interval: Duration::from_nanos(1_000_000_000 / fps as u64),
            backfill_interval: Duration::from_millis(config.backfill_interval_ms.max(1)),
            max_pending_inbound: config.max_buffered_actions.max(1),
        }
    }
}

/// Drive `session` until the inbound channel closes, then hand it back
pub async fn run_session(
    mut session: GameSession,
    mut inbound: mpsc::Receiver<Inbound>,
    outbound: mpsc::UnboundedSender<Outbound>,
    config: RuntimeConfig,
) -> GameSession {
    let mut frames = time::interval(config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut gaps = time::interval(config.backfill_interval);
    gaps.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            msg = inbound.recv() => {
                let Some(msg) = msg else {
                    debug!(game_id = session.game_id(), "inbound closed, session task done");
                    break;
                };
                let out = handle_inbound(&mut session, msg);
                forward(&outbound, out);
            }
            now = frames.tick() => {
                let elapsed = now.saturating_duration_since(last_frame);
                last_frame = now;
                let elapsed_frames = elapsed.as_secs_f64() * config.frames_per_second as f64;
                forward(&outbound, session.tick(elapsed_frames));
            }
            _ = gaps.tick() => {
                let ranges = session.detect_gaps();
                if !ranges.is_empty() {
                    let _ = outbound.send(Outbound::Backfill(ranges));
                }
            }
        }
    }

    session
}

fn handle_inbound(session: &mut GameSession, msg: Inbound) -> SessionOutput {
    match msg {
        Inbound::Action(action) => session.receive(action),
        Inbound::Backfill(actions) => session.receive_backfill(actions),
        Inbound::Line(line) => session.receive_json(&line).unwrap_or_else(|e| {
            warn!(error = %e, "dropping malformed line");
            SessionOutput::default()
        }),
        Inbound::Input(input) => session.input(input).unwrap_or_else(|e| {
            warn!(error = %e, "local input rejected");
            SessionOutput::default()
        }),
    }
}

fn forward(outbound: &mpsc::UnboundedSender<Outbound>, out: SessionOutput) {
    for action in out.outbound {
        let _ = outbound.send(Outbound::Action(action));
    }
    for event in out.events {
        let _ = outbound.send(Outbound::Event(event));
    }
}

/// Running session task with its own tokio runtime, for synchronous callers
pub struct SessionRuntime {
    rt: Runtime,
    handle: JoinHandle<GameSession>,
    in_tx: mpsc::Sender<Inbound>,
    out_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl SessionRuntime {
    pub fn start(session: GameSession, config: RuntimeConfig) -> Result<Self, SyncError> {
        let (in_tx, in_rx) = mpsc::channel::<Inbound>(config.max_pending_inbound.max(1));
        let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();

        let rt = Runtime::new()?;
        let handle = rt.spawn(run_session(session, in_rx, out_tx, config));

        Ok(Self {
            rt,
            handle,
            in_tx,
            out_rx,
        })
    }

    /// Queue a message for the session; fails when the queue is full or the task is gone
    pub fn send(&self, msg: Inbound) -> Result<(), SyncError> {
        self.in_tx.try_send(msg).map_err(|_| SyncError::RuntimeClosed)
    }

    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.out_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next outbound message
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Outbound> {
        let out_rx = &mut self.out_rx;
        self.rt
            .block_on(async { time::timeout(timeout, out_rx.recv()).await.ok().flatten() })
    }

    /// Close the inbound side and wait for the session to come back
    pub fn shutdown(self) -> Result<GameSession, SyncError> {
        let Self {
            rt, handle, in_tx, ..
        } = self;
        drop(in_tx);
        rt.block_on(handle).map_err(|_| SyncError::RuntimeClosed)
    }
}
