//! Session runtime tests - the tokio task driving a session over channels

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use flatris::sync::{
    run_session, ActionMeta, GameAction, GameSession, Inbound, LocalInput, Outbound,
    PlayerStatus, RuntimeConfig, SessionConfig, SessionEvent, SessionRuntime, User,
};

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        frames_per_second: 60,
        frame_interval: Duration::from_millis(5),
        backfill_interval: Duration::from_millis(20),
        max_pending_inbound: 16,
    }
}

fn joined_player() -> GameSession {
    let mut session = GameSession::for_player("g", User::new("a", "Ana"), SessionConfig::default());
    session.join().expect("player session joins");
    session
}

async fn next_matching<F>(rx: &mut mpsc::UnboundedReceiver<Outbound>, mut pred: F) -> Outbound
where
    F: FnMut(&Outbound) -> bool,
{
    timeout(Duration::from_secs(3), async {
        loop {
            let msg = rx.recv().await.expect("outbound channel closed");
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("expected outbound message did not arrive")
}

#[tokio::test]
async fn runtime_local_input_and_gravity_produce_actions() {
    let (in_tx, in_rx) = mpsc::channel::<Inbound>(16);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    let task = tokio::spawn(run_session(joined_player(), in_rx, out_tx, fast_config()));

    in_tx.send(Inbound::Input(LocalInput::Ready)).await.unwrap();
    let ready = next_matching(&mut out_rx, |m| matches!(m, Outbound::Action(_))).await;
    match ready {
        Outbound::Action(GameAction::PlayerReady(meta)) => {
            assert_eq!(meta.action_id, 2);
            assert_eq!(meta.prev_action_id, 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    in_tx
        .send(Inbound::Input(LocalInput::EnableAcceleration))
        .await
        .unwrap();
    next_matching(&mut out_rx, |m| {
        matches!(m, Outbound::Action(GameAction::Drop(p)) if p.rows >= 1)
    })
    .await;

    drop(in_tx);
    let session = timeout(Duration::from_secs(3), task)
        .await
        .expect("task finishes")
        .expect("task does not panic");
    let player = session.player("a").unwrap();
    assert_ne!(player.status(), PlayerStatus::Joined);
}

#[tokio::test]
async fn runtime_requests_backfill_for_gaps() {
    let (in_tx, in_rx) = mpsc::channel::<Inbound>(16);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    let observer = GameSession::observer("g", SessionConfig::default());
    let task = tokio::spawn(run_session(observer, in_rx, out_tx, fast_config()));

    let early = GameAction::Rotate(ActionMeta::new("g", "b", 3, 2));
    in_tx.send(Inbound::Action(early)).await.unwrap();

    let msg = next_matching(&mut out_rx, |m| matches!(m, Outbound::Backfill(_))).await;
    let Outbound::Backfill(ranges) = msg else {
        unreachable!()
    };
    assert_eq!(ranges[0].game_id, "g");
    assert_eq!(ranges[0].players[0].user_id, "b");
    assert_eq!(ranges[0].players[0].from, 1);

    drop(in_tx);
    let _ = timeout(Duration::from_secs(3), task).await;
}

#[tokio::test]
async fn runtime_parses_lines_and_skips_garbage() {
    let (in_tx, in_rx) = mpsc::channel::<Inbound>(16);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    let observer = GameSession::observer("g", SessionConfig::default());
    let task = tokio::spawn(run_session(observer, in_rx, out_tx, fast_config()));

    in_tx.send(Inbound::Line("not json".into())).await.unwrap();
    in_tx
        .send(Inbound::Line(
            r#"{"type":"JOIN_GAME","payload":{"actionId":1,"prevActionId":0,"gameId":"g","userId":"b","user":{"id":"b","name":"Ben"}}}"#.into(),
        ))
        .await
        .unwrap();

    let joined = next_matching(&mut out_rx, |m| matches!(m, Outbound::Event(_))).await;
    assert_eq!(
        joined,
        Outbound::Event(SessionEvent::PlayerJoined {
            user: User::new("b", "Ben")
        })
    );

    drop(in_tx);
    let session = timeout(Duration::from_secs(3), task).await.unwrap().unwrap();
    assert!(session.player("b").is_some());
}

#[test]
fn session_runtime_bridges_sync_callers() {
    let mut runtime = SessionRuntime::start(joined_player(), fast_config()).expect("runtime starts");
    runtime.send(Inbound::Input(LocalInput::Ready)).unwrap();

    let mut saw_ready = false;
    for _ in 0..50 {
        match runtime.recv_timeout(Duration::from_millis(100)) {
            Some(Outbound::Action(GameAction::PlayerReady(_))) => {
                saw_ready = true;
                break;
            }
            Some(_) => continue,
            None => continue,
        }
    }
    assert!(saw_ready);

    let session = runtime.shutdown().expect("session comes back");
    assert!(session.player("a").unwrap().is_running());
}
