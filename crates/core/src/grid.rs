//! Grid module - the landed blocks of a well
//!
//! The grid is a `rows x cols` field where each cell is empty or filled with a piece kind.
//! Uses a flat vector in row-major order; dimensions are fixed at creation.
//! Coordinates: (x, y) where x is the column (left to right) and y the row (top to bottom).

use crate::types::{cell_code, Cell};

/// One row of garbage cells appended to the bottom of a grid
pub type GarbageRow = Vec<Cell>;

/// The landed blocks of a well, flat row-major storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Flat array of cells, row-major order (y * cols + x)
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid. Zero dimensions are bumped to one.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        Some(y as usize * self.cols + x as usize)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and filled
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.rows && self.row(y).iter().all(|cell| cell.is_some())
    }

    /// Cells of one row; empty slice when out of range
    pub fn row(&self, y: usize) -> &[Cell] {
        if y >= self.rows {
            return &[];
        }
        let start = y * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// Clear all full rows and return their indices (top to bottom).
    ///
    /// Rows above each cleared row shift down, so clearing an interior row moves
    /// everything above it down by exactly one and leaves rows below untouched.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut cleared_rows = Vec::new();
        let width = self.cols;
        let mut write_y = self.rows;

        // Scan from bottom to top
        for read_y in (0..self.rows).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * width;
                    self.cells
                        .copy_within(src_start..src_start + width, write_y * width);
                }
            }
        }

        // Clear the remaining rows at the top
        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared_rows.reverse();
        cleared_rows
    }

    /// Push `rows` in at the bottom, shifting everything else up.
    ///
    /// Rows shorter than the grid are padded with empty cells, longer ones are cut.
    /// Returns true when occupied cells were pushed off the top.
    pub fn append_rows(&mut self, rows: &[GarbageRow]) -> bool {
        if rows.is_empty() {
            return false;
        }
        let width = self.cols;
        let n = rows.len().min(self.rows);
        let dropped = rows[..rows.len() - n]
            .iter()
            .any(|row| row.iter().take(width).any(|cell| cell.is_some()));
        let rows = &rows[rows.len() - n..];

        let overflow = dropped || self.cells[..n * width].iter().any(|cell| cell.is_some());
        self.cells.copy_within(n * width.., 0);

        let base = (self.rows - n) * width;
        for (i, row) in rows.iter().enumerate() {
            for x in 0..width {
                self.cells[base + i * width + x] = row.get(x).copied().flatten();
            }
        }

        overflow
    }

    /// Row-major compact codes (`0` empty, see [`PieceKind::code`](crate::types::PieceKind::code))
    pub fn to_codes(&self) -> Vec<u8> {
        self.cells.iter().map(|&cell| cell_code(cell)).collect()
    }

    /// Number of filled cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }
}
