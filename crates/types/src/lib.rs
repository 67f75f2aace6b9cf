//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (well physics, action log, replay tooling).
//!
//! # Well Dimensions
//!
//! Default playfield dimensions (configurable per well):
//!
//! - **Columns**: 10 (indexed 0-9)
//! - **Rows**: 20 (indexed 0-19, row 0 is the top)
//! - **Spawn row**: -2, two rows above the visible field
//!
//! # Gravity Constants
//!
//! Gravity is expressed in animation frames per row:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DROP_FRAMES_DEFAULT` | 48 | Frames to descend one row at game start |
//! | `DROP_FRAMES_DECREMENT` | 1.5 | Speed-up applied after a line clear |
//! | `DROP_FRAMES_ACCELERATED` | 1.5 | Frames per row while accelerating |
//! | `DROP_FRAMES_MIN` | 6 | Slowest the well may get sped up to |
//! | `FRAMES_PER_SECOND` | 60 | Nominal animation frame rate |
//!
//! # Examples
//!
//! ```
//! use flatris_types::{PieceKind, WELL_COLS, WELL_ROWS};
//!
//! let piece = PieceKind::T;
//! assert_eq!(PieceKind::from_str("t"), Some(piece));
//! assert_eq!(piece.color(), "#b04497");
//!
//! assert_eq!(PieceKind::from_code(piece.code()), Some(piece));
//!
//! assert_eq!(WELL_COLS, 10);
//! assert_eq!(WELL_ROWS, 20);
//! ```

/// Default well height in rows
pub const WELL_ROWS: usize = 20;

/// Default well width in columns
pub const WELL_COLS: usize = 10;

/// Frames needed to descend one row at normal speed when a game starts
pub const DROP_FRAMES_DEFAULT: f64 = 48.0;

/// How much `drop_frames` shrinks every time the well speeds up
pub const DROP_FRAMES_DECREMENT: f64 = 1.5;

/// Frames per row while drop acceleration is enabled
pub const DROP_FRAMES_ACCELERATED: f64 = 1.5;

/// Floor for `drop_frames`; enforced by whoever calls `increase_speed`
pub const DROP_FRAMES_MIN: f64 = 6.0;

/// Nominal animation frame rate used to convert elapsed time into frames
pub const FRAMES_PER_SECOND: u32 = 60;

/// Row a freshly loaded piece starts at (above the visible field)
pub const SPAWN_ROW: f64 = -2.0;

/// Points awarded for clearing 1, 2, 3 or 4 lines at level 1
pub const LINE_CLEAR_BONUSES: [u32; 4] = [100, 300, 500, 800];

/// Lines needed to advance one level
pub const LINES_PER_LEVEL: u32 = 10;

/// `prevActionId` carried by the first action of every player chain
pub const NO_PREV_ACTION: ActionId = 0;

/// Per-player, strictly increasing action identifier
pub type ActionId = u64;

/// Opaque game identifier (short hex string in practice)
pub type GameId = String;

/// Opaque user identifier
pub type UserId = String;


/// The seven tetromino piece kinds
///
/// Each piece has a distinct shape and color:
/// - **I**: `#3cc7d6`, horizontal bar
/// - **O**: `#fbb414`, 2x2 square
/// - **T**: `#b04497`, T-shaped
/// - **J**: `#3993d0`, J-shaped
/// - **L**: `#ed652f`, L-shaped (mirror of J)
/// - **S**: `#95c43d`, S-shaped
/// - **Z**: `#e84138`, Z-shaped (mirror of S)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    I,
    O,
    T,
    J,
    L,
    S,
    Z,
}

impl PieceKind {
    /// Every kind, in table order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::J,
        PieceKind::L,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use flatris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "I" => Some(PieceKind::I),
            "O" => Some(PieceKind::O),
            "T" => Some(PieceKind::T),
            "J" => Some(PieceKind::J),
            "L" => Some(PieceKind::L),
            "S" => Some(PieceKind::S),
            "Z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Upper-case letter used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
        }
    }

    /// Stable non-zero code for compact grids (`0` means empty)
    pub fn code(&self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::J => 4,
            PieceKind::L => 5,
            PieceKind::S => 6,
            PieceKind::Z => 7,
        }
    }

    /// Inverse of [`PieceKind::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::O),
            3 => Some(PieceKind::T),
            4 => Some(PieceKind::J),
            5 => Some(PieceKind::L),
            6 => Some(PieceKind::S),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Block color as a CSS hex string
    pub fn color(&self) -> &'static str {
        match self {
            PieceKind::I => "#3cc7d6",
            PieceKind::O => "#fbb414",
            PieceKind::T => "#b04497",
            PieceKind::J => "#3993d0",
            PieceKind::L => "#ed652f",
            PieceKind::S => "#95c43d",
            PieceKind::Z => "#e84138",
        }
    }
}

/// A cell on the well grid
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled by a landed piece of that kind
pub type Cell = Option<PieceKind>;

/// Encode a cell into its compact code
pub fn cell_code(cell: Cell) -> u8 {
    cell.map(|kind| kind.code()).unwrap_or(0)
}

/// Decode a compact cell code; unknown codes read as empty
pub fn cell_from_code(code: u8) -> Cell {
    PieceKind::from_code(code)
}
