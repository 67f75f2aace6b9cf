//! Pieces module - Tetromino shape table and grid rotation
//!
//! Every piece is a small square matrix of filled/blank squares. Rotating a piece
//! means rotating its matrix clockwise, so four rotations always bring a piece
//! back to where it started.

use arrayvec::ArrayVec;

use crate::types::PieceKind;

/// Largest bounding box among the seven shapes (the I piece)
pub const MAX_PIECE_SIZE: usize = 4;

/// Occupied `(row, col)` offsets of a piece grid
pub type PieceCells = ArrayVec<(i32, i32), { MAX_PIECE_SIZE * MAX_PIECE_SIZE }>;

const I_SHAPE: [[u8; 4]; 4] = [[0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0]];
const O_SHAPE: [[u8; 2]; 2] = [[1, 1], [1, 1]];
const T_SHAPE: [[u8; 3]; 3] = [[0, 1, 0], [1, 1, 1], [0, 0, 0]];
const J_SHAPE: [[u8; 3]; 3] = [[1, 0, 0], [1, 1, 1], [0, 0, 0]];
const L_SHAPE: [[u8; 3]; 3] = [[0, 0, 1], [1, 1, 1], [0, 0, 0]];
const S_SHAPE: [[u8; 3]; 3] = [[0, 1, 1], [1, 1, 0], [0, 0, 0]];
const Z_SHAPE: [[u8; 3]; 3] = [[1, 1, 0], [0, 1, 1], [0, 0, 0]];

/// Square rotation grid of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceGrid {
    size: u8,
    squares: [[bool; MAX_PIECE_SIZE]; MAX_PIECE_SIZE],
}

impl PieceGrid {
    /// Build a grid from a square matrix of 0/1 values.
    ///
    /// Matrices larger than [`MAX_PIECE_SIZE`] are cropped.
    pub fn from_rows<const N: usize>(rows: &[[u8; N]; N]) -> Self {
        let size = N.min(MAX_PIECE_SIZE);
        let mut squares = [[false; MAX_PIECE_SIZE]; MAX_PIECE_SIZE];
        for (r, row) in rows.iter().take(size).enumerate() {
            for (c, &v) in row.iter().take(size).enumerate() {
                squares[r][c] = v != 0;
            }
        }
        Self {
            size: size as u8,
            squares,
        }
    }

    /// Side length of the bounding box
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Whether the square at (row, col) is filled; out of range reads as blank
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.size() && col < self.size() && self.squares[row][col]
    }

    /// Clockwise rotation: `out[r][c] = in[n - 1 - c][r]`
    pub fn rotated(&self) -> Self {
        let n = self.size();
        let mut squares = [[false; MAX_PIECE_SIZE]; MAX_PIECE_SIZE];
        for (r, out_row) in squares.iter_mut().enumerate().take(n) {
            for (c, out) in out_row.iter_mut().enumerate().take(n) {
                *out = self.squares[n - 1 - c][r];
            }
        }
        Self {
            size: self.size,
            squares,
        }
    }

    /// Occupied squares as `(row, col)` offsets in row-major order
    pub fn cells(&self) -> PieceCells {
        let mut out = PieceCells::new();
        for r in 0..self.size() {
            for c in 0..self.size() {
                if self.squares[r][c] {
                    out.push((r as i32, c as i32));
                }
            }
        }
        out
    }

    /// Number of occupied squares
    pub fn cell_count(&self) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|&&filled| filled)
            .count()
    }

    /// Top-most row holding at least one occupied square
    pub fn top_row(&self) -> Option<usize> {
        (0..self.size()).find(|&r| self.squares[r][..self.size()].iter().any(|&f| f))
    }
}

/// Spawn-orientation grid for a piece kind
pub fn shape(kind: PieceKind) -> PieceGrid {
    match kind {
        PieceKind::I => PieceGrid::from_rows(&I_SHAPE),
        PieceKind::O => PieceGrid::from_rows(&O_SHAPE),
        PieceKind::T => PieceGrid::from_rows(&T_SHAPE),
        PieceKind::J => PieceGrid::from_rows(&J_SHAPE),
        PieceKind::L => PieceGrid::from_rows(&L_SHAPE),
        PieceKind::S => PieceGrid::from_rows(&S_SHAPE),
        PieceKind::Z => PieceGrid::from_rows(&Z_SHAPE),
    }
}

/// Spawn column for a grid of `width` in a well of `cols` columns.
///
/// The I piece takes columns 3-6, the O piece 4-5 and the rest 3-5 on a
/// 10-column well.
pub fn spawn_x(cols: usize, width: usize) -> i32 {
    (cols as f64 / 2.0).round() as i32 - (width as f64 / 2.0).round() as i32
}
