//! Scoring module - landing points, line clear bonuses and levels
//!
//! Every landing is worth one point per landed cell (two on a hard drop). Line
//! clears add a bonus from [`LINE_CLEAR_BONUSES`] multiplied by the level, where
//! the level grows by one every [`LINES_PER_LEVEL`] cleared lines.

use crate::types::{LINES_PER_LEVEL, LINE_CLEAR_BONUSES};

/// Level for a running total of cleared lines (1-based)
pub fn level_for_lines(lines: u32) -> u32 {
    lines / LINES_PER_LEVEL + 1
}

/// Points for the cells of a landed piece
pub fn calculate_drop_score(cells: u32, hard_drop: bool) -> u32 {
    if hard_drop {
        cells.saturating_mul(2)
    } else {
        cells
    }
}

/// Bonus for clearing `lines` rows at once; more than four counts as four
pub fn calculate_line_bonus(lines: u32, level: u32) -> u32 {
    if lines == 0 {
        return 0;
    }
    let idx = (lines as usize).min(LINE_CLEAR_BONUSES.len()) - 1;
    LINE_CLEAR_BONUSES[idx].saturating_mul(level)
}

/// Total score for one landing.
///
/// `total_lines` is the line count *before* this landing; the level used for the
/// bonus is taken from it.
pub fn calculate_landing_score(cells: u32, hard_drop: bool, lines: u32, total_lines: u32) -> u32 {
    calculate_drop_score(cells, hard_drop)
        .saturating_add(calculate_line_bonus(lines, level_for_lines(total_lines)))
}
