//! RNG module - 7-bag piece sequence
//!
//! Each bag holds one of each piece kind, shuffled; pieces are drawn until the
//! bag is empty, then a new bag is shuffled. The sequence depends only on the
//! seed, so replicas seeding a player's queue the same way spawn the same pieces
//! without the kinds ever travelling on the wire.

use std::hash::Hasher;

use crate::snapshot::Fnv1aHasher;
use crate::types::PieceKind;

/// LCG with the Numerical Recipes constants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        // A zero state would stay zero
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Value in `[0, max)`
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Per-player 7-bag piece generator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PieceQueue {
    bag: [PieceKind; 7],
    bag_index: usize,
    rng: SimpleRng,
}

impl PieceQueue {
    pub fn new(seed: u32) -> Self {
        let mut queue = Self {
            bag: PieceKind::ALL,
            bag_index: 0,
            rng: SimpleRng::new(seed),
        };
        queue.refill_bag();
        queue
    }

    /// Queue seeded from FNV-1a over `game_id` and `user_id`
    pub fn for_player(game_id: &str, user_id: &str) -> Self {
        let mut hasher = Fnv1aHasher::new();
        hasher.write(game_id.as_bytes());
        hasher.write_u8(0xff);
        hasher.write(user_id.as_bytes());
        let hash = hasher.finish();
        Self::new((hash ^ (hash >> 32)) as u32)
    }

    fn refill_bag(&mut self) {
        self.bag = PieceKind::ALL;
        self.rng.shuffle(&mut self.bag);
        self.bag_index = 0;
    }

    /// Next piece without consuming it
    pub fn peek(&self) -> PieceKind {
        if self.bag_index < self.bag.len() {
            return self.bag[self.bag_index];
        }
        // Shuffle a copy so the preview matches the next draw.
        let mut preview_rng = self.rng.clone();
        let mut next_bag = PieceKind::ALL;
        preview_rng.shuffle(&mut next_bag);
        next_bag[0]
    }

    pub fn draw(&mut self) -> PieceKind {
        if self.bag_index >= self.bag.len() {
            self.refill_bag();
        }
        let piece = self.bag[self.bag_index];
        self.bag_index += 1;
        piece
    }

    /// Current RNG state
    pub fn seed(&self) -> u32 {
        self.rng.state
    }
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
