use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flatris::core::{Grid, Well, WellConfig};
use flatris::sync::{ActionLog, ActionMeta, GameAction, GameSession, LocalInput, SessionConfig, User};
use flatris::types::PieceKind;

fn bench_advance(c: &mut Criterion) {
    let mut well = Well::new(WellConfig::default());

    c.bench_function("well_advance_1_frame", |b| {
        b.iter(|| {
            if well.active().is_none() {
                well.reset();
                well.load_piece(Some(PieceKind::T));
            }
            black_box(well.advance(black_box(1.0)));
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_rows", |b| {
        b.iter(|| {
            let mut grid = Grid::new(20, 10);
            for y in 16..20 {
                for x in 0..10 {
                    grid.set(x, y, Some(PieceKind::I));
                }
            }
            black_box(grid.clear_full_rows());
        })
    });
}

fn bench_rotate(c: &mut Criterion) {
    let mut well = Well::default();
    well.load_piece(Some(PieceKind::L));
    well.descend(8.0);

    c.bench_function("well_rotate", |b| {
        b.iter(|| {
            black_box(well.rotate());
        })
    });
}

fn bench_action_log_reversed(c: &mut Criterion) {
    let actions: Vec<GameAction> = (1..=64)
        .rev()
        .map(|id| GameAction::Rotate(ActionMeta::new("g", "u", id, id - 1)))
        .collect();

    c.bench_function("action_log_64_reversed", |b| {
        b.iter(|| {
            let mut log = ActionLog::new(256);
            let mut applied = 0;
            for action in actions.iter().cloned() {
                applied += log.accept(action).len();
            }
            black_box(applied);
        })
    });
}

fn bench_session_tick(c: &mut Criterion) {
    let mut session = GameSession::for_player("g", User::new("u", "U"), SessionConfig::default());
    let _ = session.join();
    let _ = session.input(LocalInput::Ready);

    c.bench_function("session_tick_1_frame", |b| {
        b.iter(|| {
            black_box(session.tick(black_box(1.0)));
        })
    });
}

criterion_group!(
    benches,
    bench_advance,
    bench_line_clear,
    bench_rotate,
    bench_action_log_reversed,
    bench_session_tick
);
criterion_main!(benches);
