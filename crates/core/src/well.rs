//! Well module - deterministic single-board physics
//!
//! A [`Well`] owns the landed grid, the falling piece and its gravity settings.
//! Timing stays outside: callers hand in a frame count ([`Well::advance`]) or a row
//! count ([`Well::descend`]) and get an [`AdvanceResult`] back describing any
//! landing, merged garbage or overflow.
//!
//! Positions are floating point so sub-row progress accumulates between frames.
//! Collision and rendering always use the floored value.

use crate::grid::{GarbageRow, Grid};
use crate::pieces::{shape, spawn_x, PieceGrid, MAX_PIECE_SIZE};
use crate::types::{
    PieceKind, DROP_FRAMES_ACCELERATED, DROP_FRAMES_DECREMENT, DROP_FRAMES_DEFAULT,
    DROP_FRAMES_MIN, SPAWN_ROW, WELL_COLS, WELL_ROWS,
};

/// Well dimensions and gravity tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellConfig {
    pub rows: usize,
    pub cols: usize,
    /// Frames per row when a well is (re)set
    pub drop_frames_default: f64,
    /// Speed-up applied by [`Well::increase_speed`]
    pub drop_frames_decrement: f64,
    /// Frames per row while drop acceleration is on
    pub drop_frames_accelerated: f64,
    /// Lower bound callers keep `drop_frames` above when speeding up
    pub drop_frames_min: f64,
}

impl Default for WellConfig {
    fn default() -> Self {
        Self {
            rows: WELL_ROWS,
            cols: WELL_COLS,
            drop_frames_default: DROP_FRAMES_DEFAULT,
            drop_frames_decrement: DROP_FRAMES_DECREMENT,
            drop_frames_accelerated: DROP_FRAMES_ACCELERATED,
            drop_frames_min: DROP_FRAMES_MIN,
        }
    }
}

/// Top-left corner of the active piece grid, in well coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Grid coordinates used for collision and rendering
    pub fn floored(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// The falling piece: its kind plus its current rotation grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub grid: PieceGrid,
}

impl ActivePiece {
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            grid: shape(kind),
        }
    }
}

/// A piece settling into the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub kind: PieceKind,
    /// Piece cells that made it into the grid (cells above row 0 are discarded)
    pub cells: u32,
    /// Rows cleared by this landing
    pub lines: u32,
    /// The piece landed while drop acceleration was on
    pub hard_drop: bool,
    /// Cleared rows with the landing piece's own cells blanked, top to bottom
    pub cleared: Vec<GarbageRow>,
}

/// Outcome of one [`Well::advance`] / [`Well::descend`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    pub landing: Option<Landing>,
    /// Queued garbage rows merged before moving the piece
    pub garbage_rows: usize,
    /// Blocks ended up above the visible field
    pub well_full: bool,
}

impl AdvanceResult {
    pub fn landed(&self) -> bool {
        self.landing.is_some()
    }
}

/// Single-board game physics
#[derive(Debug, Clone)]
pub struct Well {
    config: WellConfig,
    grid: Grid,
    active: Option<ActivePiece>,
    position: Position,
    drop_frames: f64,
    drop_acceleration: bool,
    queued_garbage: Vec<GarbageRow>,
}

impl Well {
    pub fn new(config: WellConfig) -> Self {
        Self {
            config,
            grid: Grid::new(config.rows, config.cols),
            active: None,
            position: Position::default(),
            drop_frames: config.drop_frames_default,
            drop_acceleration: false,
            queued_garbage: Vec::new(),
        }
    }

    /// Back to an empty grid at default speed, dropping any queued garbage
    pub fn reset(&mut self) {
        self.grid.clear();
        self.active = None;
        self.position = Position::default();
        self.drop_frames = self.config.drop_frames_default;
        self.drop_acceleration = false;
        self.queued_garbage.clear();
    }

    /// Load a fresh piece at the spawn point, or unload the active one with `None`
    pub fn load_piece(&mut self, kind: Option<PieceKind>) {
        match kind {
            Some(kind) => {
                let piece = ActivePiece::new(kind);
                let x = spawn_x(self.grid.cols(), piece.grid.size());
                self.active = Some(piece);
                self.position = Position::new(x as f64, SPAWN_ROW);
            }
            None => {
                self.active = None;
                self.position = Position::default();
            }
        }
    }

    /// Rotate the active piece clockwise, kicking it back inside the walls.
    ///
    /// Returns false (and changes nothing) when there is no piece or the kicked
    /// position collides.
    pub fn rotate(&mut self) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let rotated = piece.grid.rotated();
        let cols = self.grid.cols() as i32;

        // Each cell sees the x left behind by the cells before it.
        let mut x = self.position.x;
        for (_, c) in rotated.cells() {
            let col = x.floor() as i32 + c;
            if col < 0 {
                x -= col as f64;
            } else if col >= cols {
                x -= (col - cols + 1) as f64;
            }
        }

        let (_, y) = self.position.floored();
        if !self.is_position_available(&rotated, x.floor() as i32, y) {
            return false;
        }
        self.active = Some(ActivePiece {
            kind: piece.kind,
            grid: rotated,
        });
        self.position.x = x;
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1.0)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1.0)
    }

    fn shift(&mut self, dx: f64) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let x = self.position.x + dx;
        let (_, y) = self.position.floored();
        if !self.is_position_available(&piece.grid, x.floor() as i32, y) {
            return false;
        }
        self.position.x = x;
        true
    }

    /// Shrink `drop_frames` by one decrement; keeping it above the floor is up to the caller
    pub fn increase_speed(&mut self) {
        self.drop_frames -= self.config.drop_frames_decrement;
    }

    pub fn set_drop_acceleration(&mut self, enabled: bool) {
        self.drop_acceleration = enabled;
    }

    /// Frames per row currently in effect
    pub fn effective_drop_frames(&self) -> f64 {
        if self.drop_acceleration {
            self.config.drop_frames_accelerated
        } else {
            self.drop_frames
        }
    }

    /// Apply `frames` of gravity at the current speed
    pub fn advance(&mut self, frames: f64) -> AdvanceResult {
        self.descend(frames / self.effective_drop_frames())
    }

    /// Move the active piece down by a (possibly fractional) number of rows.
    ///
    /// Queued garbage is merged first. If the piece cannot reach the floored
    /// target, it settles on the last free row above the obstacle and is
    /// transferred into the grid.
    pub fn descend(&mut self, rows: f64) -> AdvanceResult {
        let mut result = AdvanceResult::default();

        if !self.queued_garbage.is_empty() {
            let garbage = std::mem::take(&mut self.queued_garbage);
            result.garbage_rows = garbage.len();
            result.well_full |= self.grid.append_rows(&garbage);
        }

        if !rows.is_finite() || rows < 0.0 {
            return result;
        }
        let Some(piece) = self.active else {
            return result;
        };

        let (x, mut y) = self.position.floored();
        let target = self.position.y + rows;
        let target_row = target.floor() as i32;
        if self.is_position_available(&piece.grid, x, y) {
            // Walk row by row so a long step cannot tunnel through blocks.
            while y < target_row && self.is_position_available(&piece.grid, x, y + 1) {
                y += 1;
            }
            if y >= target_row {
                self.position.y = target;
                return result;
            }
        } else {
            // Merged garbage pushed the grid into the piece. A piece entirely
            // above the field always fits, so this terminates.
            let ceiling = -(MAX_PIECE_SIZE as i32);
            while y > ceiling && !self.is_position_available(&piece.grid, x, y) {
                y -= 1;
            }
        }

        let landing = self.settle(piece, x, y);
        if let Some(top) = piece.grid.top_row() {
            result.well_full |= y + (top as i32) < 0;
        }
        result.landing = Some(landing);
        result
    }

    /// Write the piece into the grid at (x, y), clear lines and unload it
    fn settle(&mut self, piece: ActivePiece, x: i32, y: i32) -> Landing {
        let mut placed = Vec::with_capacity(4);
        for (r, c) in piece.grid.cells() {
            let (gx, gy) = (x + c, y + r);
            if gy < 0 {
                continue;
            }
            if self.grid.set(gx, gy, Some(piece.kind)) {
                placed.push((gx, gy));
            }
        }

        let cleared = (0..self.grid.rows())
            .filter(|&row| self.grid.is_row_full(row))
            .map(|row| {
                let mut cells = self.grid.row(row).to_vec();
                for &(gx, gy) in &placed {
                    if gy as usize == row {
                        cells[gx as usize] = None;
                    }
                }
                cells
            })
            .collect::<Vec<_>>();
        let lines = self.grid.clear_full_rows().len() as u32;

        self.load_piece(None);

        Landing {
            kind: piece.kind,
            cells: placed.len() as u32,
            lines,
            hard_drop: self.drop_acceleration,
            cleared,
        }
    }

    /// Queue garbage rows; they are merged at the bottom on the next descent
    pub fn queue_garbage(&mut self, rows: Vec<GarbageRow>) {
        self.queued_garbage.extend(rows);
    }

    /// Collision test for `piece` with its top-left corner at (x, y).
    ///
    /// Columns outside the well reject, rows above the field accept, rows below
    /// the floor reject and occupied grid cells reject.
    pub fn is_position_available(&self, piece: &PieceGrid, x: i32, y: i32) -> bool {
        let rows = self.grid.rows() as i32;
        let cols = self.grid.cols() as i32;
        piece.cells().iter().all(|&(r, c)| {
            let (gx, gy) = (x + c, y + r);
            if gx < 0 || gx >= cols {
                return false;
            }
            if gy < 0 {
                return true;
            }
            gy < rows && !self.grid.is_occupied(gx, gy)
        })
    }

    /// Floored position of the active piece
    pub fn grid_position(&self) -> (i32, i32) {
        self.position.floored()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &WellConfig {
        &self.config
    }

    pub fn drop_frames(&self) -> f64 {
        self.drop_frames
    }

    pub fn drop_acceleration(&self) -> bool {
        self.drop_acceleration
    }

    pub fn queued_garbage(&self) -> &[GarbageRow] {
        &self.queued_garbage
    }
}

impl Default for Well {
    fn default() -> Self {
        Self::new(WellConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_with(kind: PieceKind) -> Well {
        let mut well = Well::default();
        well.load_piece(Some(kind));
        well
    }

    #[test]
    fn test_spawn_positions() {
        assert_eq!(well_with(PieceKind::I).grid_position(), (3, -2));
        assert_eq!(well_with(PieceKind::O).grid_position(), (4, -2));
        assert_eq!(well_with(PieceKind::T).grid_position(), (3, -2));
    }

    #[test]
    fn test_unload_piece() {
        let mut well = well_with(PieceKind::S);
        well.load_piece(None);
        assert!(well.active().is_none());
        assert_eq!(well.position(), Position::default());
        assert!(!well.rotate());
        assert!(!well.move_left());
    }

    #[test]
    fn test_move_left_then_right_restores_position() {
        let mut well = well_with(PieceKind::T);
        let before = well.position();
        assert!(well.move_left());
        assert!(well.move_right());
        assert_eq!(well.position(), before);
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let mut well = well_with(PieceKind::O);
        while well.move_left() {}
        assert_eq!(well.grid_position().0, 0);
        assert!(!well.move_left());
        assert_eq!(well.grid_position().0, 0);
    }

    #[test]
    fn test_four_rotations_restore_grid() {
        for kind in PieceKind::ALL {
            let mut well = well_with(kind);
            well.descend(5.0);
            let before = *well.active().unwrap();
            for _ in 0..4 {
                assert!(well.rotate(), "{:?}", kind);
            }
            assert_eq!(*well.active().unwrap(), before, "{:?}", kind);
        }
    }

    #[test]
    fn test_wall_kick_right_edge() {
        let mut well = well_with(PieceKind::I);
        well.descend(5.0);
        assert!(well.rotate());
        // Vertical I sits in column x + 2; push it to the right wall.
        while well.move_right() {}
        assert_eq!(well.grid_position().0 + 2, 9);

        // Rotating back to horizontal would reach column 11; kicked left by 2.
        assert!(well.rotate());
        let (x, _) = well.grid_position();
        assert_eq!(x, 6);
        let cells = well.active().unwrap().grid.cells();
        assert!(cells.iter().all(|&(_, c)| x + c < 10));
    }

    #[test]
    fn test_wall_kick_left_edge() {
        let mut well = well_with(PieceKind::I);
        well.descend(5.0);
        assert!(well.rotate());
        while well.move_left() {}
        assert_eq!(well.grid_position().0, -2);

        assert!(well.rotate());
        assert_eq!(well.grid_position().0, 0);
    }

    #[test]
    fn test_rejected_rotation_keeps_state() {
        let mut well = well_with(PieceKind::I);
        well.descend(5.0);
        assert!(well.rotate());
        let (x, y) = well.grid_position();
        // Wall the vertical I in on both sides of its column.
        for gy in y..y + 4 {
            well.grid.set(x + 1, gy, Some(PieceKind::O));
            well.grid.set(x + 3, gy, Some(PieceKind::O));
        }
        let before = (*well.active().unwrap(), well.position());
        assert!(!well.rotate());
        assert_eq!((*well.active().unwrap(), well.position()), before);
    }

    #[test]
    fn test_i_piece_lands_on_bottom_row() {
        let mut well = well_with(PieceKind::I);
        let result = well.advance(48.0 * 40.0);

        let landing = result.landing.expect("piece should land");
        assert_eq!(landing.kind, PieceKind::I);
        assert_eq!(landing.cells, 4);
        assert_eq!(landing.lines, 0);
        assert!(!landing.hard_drop);
        assert!(!result.well_full);
        assert_eq!(well.grid().occupied_count(), 4);
        for x in 3..7 {
            assert!(well.grid().is_occupied(x, 19));
        }
        assert!(well.active().is_none());
    }

    #[test]
    fn test_long_step_stops_on_shelf() {
        let mut well = Well::default();
        for x in 3..7 {
            well.grid.set(x, 10, Some(PieceKind::L));
        }
        well.load_piece(Some(PieceKind::O));
        let landing = well.descend(40.0).landing.unwrap();
        assert_eq!(landing.cells, 4);
        assert!(well.grid().is_occupied(4, 9));
        assert!(well.grid().is_occupied(5, 8));
        assert!(!well.grid().is_occupied(4, 19));
    }

    #[test]
    fn test_fractional_descent_accumulates() {
        let mut well = well_with(PieceKind::O);
        assert!(!well.advance(24.0).landed());
        assert_eq!(well.position().y, -1.5);
        assert_eq!(well.grid_position().1, -2);
        well.advance(24.0);
        assert_eq!(well.grid_position().1, -1);
    }

    #[test]
    fn test_acceleration_uses_fast_drop_frames() {
        let mut well = well_with(PieceKind::O);
        well.set_drop_acceleration(true);
        assert_eq!(well.effective_drop_frames(), DROP_FRAMES_ACCELERATED);
        well.advance(3.0);
        assert_eq!(well.grid_position().1, 0);

        let result = well.advance(1000.0);
        assert!(result.landing.unwrap().hard_drop);
    }

    #[test]
    fn test_invalid_steps_are_ignored() {
        let mut well = well_with(PieceKind::T);
        let before = well.position();
        assert_eq!(well.descend(f64::NAN), AdvanceResult::default());
        assert_eq!(well.descend(-3.0), AdvanceResult::default());
        assert_eq!(well.descend(f64::INFINITY), AdvanceResult::default());
        assert_eq!(well.position(), before);
    }

    #[test]
    fn test_line_clear_reports_garbage_without_piece_cells() {
        let mut well = Well::default();
        for x in 0..6 {
            well.grid.set(x, 19, Some(PieceKind::Z));
        }
        well.load_piece(Some(PieceKind::I));
        while well.move_right() {}

        let result = well.descend(40.0);
        let landing = result.landing.unwrap();
        assert_eq!(landing.lines, 1);
        assert_eq!(landing.cleared.len(), 1);
        let row = &landing.cleared[0];
        assert!(row[..6].iter().all(|c| *c == Some(PieceKind::Z)));
        assert!(row[6..].iter().all(|c| c.is_none()));
        assert_eq!(well.grid().occupied_count(), 0);
    }

    #[test]
    fn test_increase_speed() {
        let mut well = Well::default();
        well.increase_speed();
        assert_eq!(well.drop_frames(), DROP_FRAMES_DEFAULT - DROP_FRAMES_DECREMENT);
        well.reset();
        assert_eq!(well.drop_frames(), DROP_FRAMES_DEFAULT);
    }

    #[test]
    fn test_queued_garbage_merges_before_descent() {
        let mut well = well_with(PieceKind::O);
        let mut row = vec![Some(PieceKind::J); 10];
        row[0] = None;
        well.queue_garbage(vec![row.clone(), row]);
        assert_eq!(well.queued_garbage().len(), 2);

        let result = well.descend(0.0);
        assert_eq!(result.garbage_rows, 2);
        assert!(!result.well_full);
        assert!(well.queued_garbage().is_empty());
        assert_eq!(well.grid().occupied_count(), 18);

        let landing = well.descend(40.0).landing.unwrap();
        assert_eq!(landing.lines, 0);
        assert!(well.grid().is_occupied(4, 17));
    }

    #[test]
    fn test_landing_above_field_reports_full() {
        let mut well = Well::new(WellConfig {
            rows: 2,
            ..WellConfig::default()
        });
        well.load_piece(Some(PieceKind::O));
        assert!(!well.descend(10.0).well_full);

        well.load_piece(Some(PieceKind::O));
        let result = well.descend(10.0);
        assert!(result.landed());
        assert!(result.well_full);
        assert_eq!(result.landing.unwrap().cells, 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut well = well_with(PieceKind::L);
        well.set_drop_acceleration(true);
        well.queue_garbage(vec![vec![Some(PieceKind::T); 10]]);
        well.reset();
        let once = format!("{:?}", well);
        well.reset();
        assert_eq!(format!("{:?}", well), once);
        assert!(well.active().is_none());
        assert!(!well.drop_acceleration());
        assert!(well.queued_garbage().is_empty());
    }
}
