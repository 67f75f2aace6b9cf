//! Core well physics - pure, deterministic, and testable
//!
//! This crate contains the single-board rules of the game: the shape table, the
//! well grid, piece movement/rotation/gravity, landing and line clearing.
//! It has **zero dependencies** on networking, timing, or I/O, making it:
//!
//! - **Deterministic**: The same calls on the same well always produce the same board
//! - **Timing-agnostic**: Gravity only ever sees a frame (or row) count handed in by the caller
//! - **Testable**: Every rule is a synchronous, total function over explicit state
//!
//! # Module Structure
//!
//! - [`pieces`]: Tetromino shape table and clockwise grid rotation
//! - [`grid`]: Fixed-size well grid with line clearing and garbage appending
//! - [`well`]: The well engine (spawn, move, rotate with wall kick, advance, land)
//! - [`rng`]: 7-bag piece sequence, seeded per player so every replica agrees
//! - [`scoring`]: Landing score, line clear bonuses and levels
//! - [`snapshot`]: Plain snapshots of a well and a stable hash for convergence checks
//!
//! # Example
//!
//! ```
//! use flatris_core::{Well, WellConfig};
//! use flatris_types::PieceKind;
//!
//! let mut well = Well::new(WellConfig::default());
//! well.load_piece(Some(PieceKind::I));
//! assert_eq!(well.grid_position(), (3, -2));
//!
//! // Plenty of frames: the piece falls all the way and lands.
//! let result = well.advance(48.0 * 40.0);
//! assert!(result.landed());
//! assert_eq!(well.grid().occupied_count(), 4);
//! ```

pub mod grid;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod well;

pub use flatris_types as types;

// Re-export commonly used types for convenience
pub use grid::{GarbageRow, Grid};
pub use pieces::{shape, spawn_x, PieceGrid};
pub use rng::{PieceQueue, SimpleRng};
pub use scoring::{calculate_drop_score, calculate_landing_score, calculate_line_bonus, level_for_lines};
pub use snapshot::{stable_hash, ActiveSnapshot, Fnv1aHasher, WellSnapshot};
pub use well::{ActivePiece, AdvanceResult, Landing, Position, Well, WellConfig};
