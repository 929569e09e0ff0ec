//! Cursor position within one inset
//!
//! The surrounding editor owns the full cursor stack (one slice per nesting
//! level); the engine's navigation hooks only see and adjust the innermost
//! slice: which cell the cursor is in and at which atom position.

use serde::{Deserialize, Serialize};

/// Position inside one inset: cell index and atom offset within the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorSlice {
    /// Index of the cell the cursor is in, `0..nargs()`
    pub idx: usize,
    /// Atom position within that cell, `0..=cell.len()`
    pub pos: usize,
}

impl CursorSlice {
    pub fn new(idx: usize, pos: usize) -> Self {
        Self { idx, pos }
    }

    /// Enter the given cell at its start
    pub fn front_of(idx: usize) -> Self {
        Self { idx, pos: 0 }
    }

    /// Enter the given cell at the given end position
    pub fn back_of(idx: usize, len: usize) -> Self {
        Self { idx, pos: len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(CursorSlice::front_of(2), CursorSlice::new(2, 0));
        assert_eq!(CursorSlice::back_of(1, 5), CursorSlice::new(1, 5));
    }
}
