//! Coordinate cache - last-known on-screen geometry per tree node
//!
//! The metrics pass records each node's `Dimension`, the draw pass records
//! its position. Cursor hit-testing and the row's nested-footprint
//! bookkeeping read the entries back. Entries are keyed by the node's
//! address, so the tree must keep stable addresses for as long as a formula
//! is visible; any code that moves a node's storage must invalidate the
//! cache first.

use crate::dimension::{Dimension, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identity of a tree node for the lifetime of a layout
pub fn addr_of<T: ?Sized>(node: &T) -> usize {
    node as *const T as *const () as usize
}

/// Cached geometry of one node: left edge and baseline, plus extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// x = left edge, y = baseline
    pub pos: Point,
    pub dim: Dimension,
}

impl Geometry {
    /// Whether the device point (x, y) falls inside this box
    pub fn covers(&self, x: i32, y: i32) -> bool {
        x >= self.pos.x
            && x <= self.pos.x + self.dim.width
            && y >= self.pos.y - self.dim.ascent
            && y <= self.pos.y + self.dim.descent
    }

    /// Squared distance from (x, y) to this box, 0 when covered
    pub fn distance_sq(&self, x: i32, y: i32) -> i64 {
        let dx = if x < self.pos.x {
            self.pos.x - x
        } else if x > self.pos.x + self.dim.width {
            x - (self.pos.x + self.dim.width)
        } else {
            0
        };
        let top = self.pos.y - self.dim.ascent;
        let bottom = self.pos.y + self.dim.descent;
        let dy = if y < top {
            top - y
        } else if y > bottom {
            y - bottom
        } else {
            0
        };
        dx as i64 * dx as i64 + dy as i64 * dy as i64
    }
}

/// One address-keyed geometry map
#[derive(Debug, Default)]
pub struct CoordMap {
    data: HashMap<usize, Geometry>,
}

impl CoordMap {
    /// Record a dimension during the metrics pass
    pub fn add_dim(&mut self, addr: usize, dim: Dimension) {
        self.data.entry(addr).or_default().dim = dim;
    }

    /// Record a position during the draw pass
    pub fn add_pos(&mut self, addr: usize, x: i32, y: i32) {
        self.data.entry(addr).or_default().pos = Point::new(x, y);
    }

    pub fn geometry(&self, addr: usize) -> Option<&Geometry> {
        self.data.get(&addr)
    }

    pub fn dim(&self, addr: usize) -> Option<Dimension> {
        self.data.get(&addr).map(|g| g.dim)
    }

    pub fn has(&self, addr: usize) -> bool {
        self.data.contains_key(&addr)
    }

    pub fn covers(&self, addr: usize, x: i32, y: i32) -> bool {
        self.geometry(addr).is_some_and(|g| g.covers(x, y))
    }

    /// The cached node closest to (x, y), if any
    pub fn find_near(&self, x: i32, y: i32) -> Option<usize> {
        self.data
            .iter()
            .min_by_key(|(_, g)| g.distance_sq(x, y))
            .map(|(addr, _)| *addr)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-view cache: insets and cells are tracked in separate maps
#[derive(Debug, Default)]
pub struct CoordCache {
    pub insets: CoordMap,
    pub cells: CoordMap,
}

impl CoordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, e.g. after a structural edit
    pub fn clear(&mut self) {
        self.insets.clear();
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers() {
        let g = Geometry {
            pos: Point::new(10, 20),
            dim: Dimension::new(30, 8, 4),
        };
        assert!(g.covers(10, 20));
        assert!(g.covers(40, 12));
        assert!(g.covers(25, 24));
        assert!(!g.covers(9, 20));
        assert!(!g.covers(25, 25));
    }

    #[test]
    fn test_distance_zero_when_covered() {
        let g = Geometry {
            pos: Point::new(0, 10),
            dim: Dimension::new(10, 5, 5),
        };
        assert_eq!(g.distance_sq(5, 10), 0);
        assert!(g.distance_sq(20, 10) > 0);
    }

    #[test]
    fn test_two_phase_recording() {
        let mut map = CoordMap::default();
        let key = 0xdead;
        map.add_dim(key, Dimension::new(12, 6, 2));
        map.add_pos(key, 100, 50);
        let g = map.geometry(key).unwrap();
        assert_eq!(g.dim.width, 12);
        assert_eq!(g.pos.x, 100);
    }

    #[test]
    fn test_find_near_picks_closest() {
        let mut map = CoordMap::default();
        map.add_dim(1, Dimension::new(10, 5, 5));
        map.add_pos(1, 0, 10);
        map.add_dim(2, Dimension::new(10, 5, 5));
        map.add_pos(2, 100, 10);
        assert_eq!(map.find_near(5, 10), Some(1));
        assert_eq!(map.find_near(105, 10), Some(2));
    }
}
