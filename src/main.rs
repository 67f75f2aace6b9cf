//! Replay runner (default binary).
//!
//! Reads line-delimited JSON actions from one or more files, feeds them to an
//! observer session per game and prints where every player ended up.
//!
//! ```text
//! flatris game-a1b2.jsonl relay-dump.jsonl
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use flatris::sync::{parse_action, GameSession, ParsedAction, SessionConfig};

fn main() -> Result<()> {
    flatris::logging::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: flatris <actions.jsonl> [more.jsonl ...]");
    }

    let config = SessionConfig::from_env();
    let mut games: BTreeMap<String, GameSession> = BTreeMap::new();
    for path in &paths {
        replay_file(Path::new(path), &config, &mut games)?;
    }

    for session in games.values() {
        print_summary(session);
    }
    Ok(())
}

fn replay_file(
    path: &Path,
    config: &SessionConfig,
    games: &mut BTreeMap<String, GameSession>,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut applied = 0usize;

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_action(line) {
            Ok(ParsedAction::Action(action)) => {
                let session = games
                    .entry(action.game_id().to_string())
                    .or_insert_with(|| GameSession::observer(action.game_id(), config.clone()));
                session.receive(action);
                applied += 1;
            }
            Ok(ParsedAction::Unknown(unknown)) => {
                warn!(file = %path.display(), line = idx + 1, action_type = %unknown.action_type, "unknown action type skipped");
            }
            Err(e) => {
                warn!(file = %path.display(), line = idx + 1, error = %e, "malformed line skipped");
            }
        }
    }

    info!(file = %path.display(), actions = applied, "replayed");
    Ok(())
}

fn print_summary(session: &GameSession) {
    println!("game {} (state hash {:016x})", session.game_id(), session.state_hash());
    for player in session.players() {
        println!(
            "  {} [{}] status={} score={} lines={} last_action={}",
            player.user().name,
            player.user().id,
            player.status().as_str(),
            player.score(),
            player.lines(),
            session.log().last_applied(session.game_id(), &player.user().id),
        );
        for row in player.well().snapshot().render().lines() {
            println!("    |{}|", row);
        }
    }

    let gaps = session.detect_gaps();
    for range in &gaps {
        for player in &range.players {
            println!(
                "  gap: {} missing actions from #{} ({} buffered)",
                player.user_id,
                player.from,
                session.log().buffered(&range.game_id, &player.user_id),
            );
        }
    }
}
