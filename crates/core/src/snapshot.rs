//! Snapshot module - plain, hashable copies of well state
//!
//! Replicas compare snapshots (or their FNV-1a hash) to check they agree.

use std::hash::{Hash, Hasher};

use crate::types::PieceKind;
use crate::well::Well;

/// Stable 64-bit FNV-1a hasher for deterministic state hashes.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions/platforms.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// FNV-1a hash of any `Hash` value
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = Fnv1aHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    /// Side of the rotation grid; only `squares[..size][..size]` is meaningful
    pub size: u8,
    pub squares: [[bool; 4]; 4],
    pub x: i32,
    pub y: i32,
}

/// Plain copy of a well, comparable and hashable across replicas
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WellSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row-major cell codes (`0` = empty)
    pub cells: Vec<u8>,
    pub active: Option<ActiveSnapshot>,
    /// Bit pattern of the current `drop_frames`
    pub drop_frames_bits: u64,
    pub drop_acceleration: bool,
    pub queued_garbage: usize,
}

impl WellSnapshot {
    /// Text rendering of the grid with the active piece overlaid
    /// (`.` empty, piece letter otherwise).
    pub fn render(&self) -> String {
        let mut board: Vec<char> = self
            .cells
            .iter()
            .map(|&code| PieceKind::from_code(code).map_or('.', letter))
            .collect();
        if let Some(active) = &self.active {
            for r in 0..active.size as usize {
                for c in 0..active.size as usize {
                    if !active.squares[r][c] {
                        continue;
                    }
                    let (x, y) = (active.x + c as i32, active.y + r as i32);
                    if x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows {
                        board[y as usize * self.cols + x as usize] =
                            letter(active.kind).to_ascii_lowercase();
                    }
                }
            }
        }

        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in board.chunks(self.cols.max(1)) {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

fn letter(kind: PieceKind) -> char {
    kind.as_str().chars().next().unwrap_or('?')
}

impl From<&Well> for WellSnapshot {
    fn from(well: &Well) -> Self {
        let active = well.active().map(|piece| {
            let (x, y) = well.grid_position();
            let mut squares = [[false; 4]; 4];
            for (r, c) in piece.grid.cells() {
                squares[r as usize][c as usize] = true;
            }
            ActiveSnapshot {
                kind: piece.kind,
                size: piece.grid.size() as u8,
                squares,
                x,
                y,
            }
        });
        Self {
            rows: well.grid().rows(),
            cols: well.grid().cols(),
            cells: well.grid().to_codes(),
            active,
            drop_frames_bits: well.drop_frames().to_bits(),
            drop_acceleration: well.drop_acceleration(),
            queued_garbage: well.queued_garbage().len(),
        }
    }
}

impl Well {
    pub fn snapshot(&self) -> WellSnapshot {
        WellSnapshot::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vector() {
        let mut hasher = Fnv1aHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_snapshot_hash_tracks_state() {
        let mut well = Well::default();
        well.load_piece(Some(PieceKind::T));
        let a = stable_hash(&well.snapshot());
        assert_eq!(a, stable_hash(&well.clone().snapshot()));

        well.move_left();
        assert_ne!(a, stable_hash(&well.snapshot()));
    }

    #[test]
    fn test_render_overlays_active_piece() {
        let mut well = Well::default();
        well.load_piece(Some(PieceKind::O));
        well.descend(2.0);
        let text = well.snapshot().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "....oo....");
        assert_eq!(lines[1], "....oo....");
        assert_eq!(lines[2], "..........");
    }
}
