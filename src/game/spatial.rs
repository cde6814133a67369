//! Spatial hash grid for trail/territory segment queries
//!
//! Divides the world into uniform cells and buckets line segments by the
//! cells of their endpoints and midpoint. Collision queries only look at the
//! 3x3 neighborhood around a position. The approximation holds because
//! per-tick movement is small relative to the cell size.

use crate::util::vec2::Vec2;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Cell size in world units. Larger than any per-tick movement segment.
pub const SEGMENT_GRID_CELL_SIZE: f64 = 100.0;

/// Initial capacity for the cell map (number of expected non-empty cells)
const GRID_INITIAL_CAPACITY: usize = 256;

/// Initial capacity for segment vectors within cells
const CELL_INITIAL_CAPACITY: usize = 8;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// What a stored segment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Trail,
    Territory,
}

/// Segment record stored in the grid.
///
/// Records are value copies rebuilt every tick; `owner` is the slot of the
/// owning player in the tick's iteration order, and `index` is the trail
/// index of `p1` (0 for territory edges).
#[derive(Debug, Clone, Copy)]
pub struct SegmentItem {
    pub owner: u32,
    pub kind: SegmentKind,
    pub p1: Vec2,
    pub p2: Vec2,
    pub index: u32,
}

/// Uniform-grid spatial hash of line segments
pub struct SegmentGrid {
    cell_size: f64,
    inv_cell_size: f64,
    cells: HashMap<CellKey, Vec<SegmentItem>>,
    neighbor_offsets: [(i32, i32); 9],
}

impl SegmentGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(GRID_INITIAL_CAPACITY),
            neighbor_offsets: [
                (-1, -1), (0, -1), (1, -1),
                (-1,  0), (0,  0), (1,  0),
                (-1,  1), (0,  1), (1,  1),
            ],
        }
    }

    /// Clear all segments, retaining bucket allocations
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    #[inline]
    fn position_to_cell(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Insert a segment into the cells of both endpoints and the midpoint
    pub fn insert(&mut self, item: SegmentItem) {
        let midpoint = (item.p1 + item.p2) * 0.5;
        let mut keys: SmallVec<[CellKey; 3]> = SmallVec::new();
        for p in [item.p1, item.p2, midpoint] {
            let key = self.position_to_cell(p);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        for key in keys {
            self.cells
                .entry(key)
                .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY))
                .push(item);
        }
    }

    /// All segments bucketed in the 3x3 neighborhood around a position
    pub fn query(&self, position: Vec2) -> impl Iterator<Item = &SegmentItem> {
        let (cx, cy) = self.position_to_cell(position);
        self.neighbor_offsets.iter().flat_map(move |&(dx, dy)| {
            self.cells
                .get(&(cx + dx, cy + dy))
                .into_iter()
                .flat_map(|cell| cell.iter())
        })
    }

    /// Total stored segment records (duplicates across cells counted once per cell)
    pub fn len(&self) -> usize {
        self.cells.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(|c| c.is_empty())
    }
}

impl Default for SegmentGrid {
    fn default() -> Self {
        Self::new(SEGMENT_GRID_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail_segment(owner: u32, p1: Vec2, p2: Vec2, index: u32) -> SegmentItem {
        SegmentItem {
            owner,
            kind: SegmentKind::Trail,
            p1,
            p2,
            index,
        }
    }

    #[test]
    fn test_insert_and_query() {
        let mut grid = SegmentGrid::default();
        grid.insert(trail_segment(
            0,
            Vec2::new(150.0, 150.0),
            Vec2::new(160.0, 150.0),
            3,
        ));

        let results: Vec<_> = grid.query(Vec2::new(150.0, 150.0)).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].owner, 0);
        assert_eq!(results[0].index, 3);
    }

    #[test]
    fn test_query_finds_neighbor_cells() {
        let mut grid = SegmentGrid::default();
        // Segment in cell (1, 1); query from cell (2, 1)
        grid.insert(trail_segment(
            1,
            Vec2::new(150.0, 150.0),
            Vec2::new(155.0, 150.0),
            0,
        ));

        let results: Vec<_> = grid.query(Vec2::new(250.0, 150.0)).collect();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_query_misses_distant_cells() {
        let mut grid = SegmentGrid::default();
        grid.insert(trail_segment(
            1,
            Vec2::new(150.0, 150.0),
            Vec2::new(155.0, 150.0),
            0,
        ));

        let results: Vec<_> = grid.query(Vec2::new(600.0, 600.0)).collect();
        assert!(results.is_empty());
    }

    #[test]
    fn test_segment_spanning_cells_found_from_both_ends() {
        let mut grid = SegmentGrid::default();
        // Endpoints in different cells; midpoint in a third
        grid.insert(trail_segment(
            2,
            Vec2::new(95.0, 50.0),
            Vec2::new(205.0, 50.0),
            7,
        ));

        assert!(grid.query(Vec2::new(95.0, 50.0)).count() >= 1);
        assert!(grid.query(Vec2::new(205.0, 50.0)).count() >= 1);
        assert!(grid.query(Vec2::new(150.0, 50.0)).count() >= 1);
    }

    #[test]
    fn test_no_duplicate_insert_for_short_segment() {
        let mut grid = SegmentGrid::default();
        // All three index points land in the same cell
        grid.insert(trail_segment(
            0,
            Vec2::new(110.0, 110.0),
            Vec2::new(120.0, 110.0),
            0,
        ));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut grid = SegmentGrid::default();
        grid.insert(trail_segment(
            0,
            Vec2::new(50.0, 50.0),
            Vec2::new(60.0, 50.0),
            0,
        ));
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.query(Vec2::new(50.0, 50.0)).count(), 0);
    }

    #[test]
    fn test_kinds_coexist() {
        let mut grid = SegmentGrid::default();
        grid.insert(trail_segment(
            0,
            Vec2::new(50.0, 50.0),
            Vec2::new(60.0, 50.0),
            0,
        ));
        grid.insert(SegmentItem {
            owner: 1,
            kind: SegmentKind::Territory,
            p1: Vec2::new(55.0, 55.0),
            p2: Vec2::new(65.0, 55.0),
            index: 0,
        });

        let results: Vec<_> = grid.query(Vec2::new(55.0, 50.0)).collect();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|i| i.kind == SegmentKind::Trail));
        assert!(results.iter().any(|i| i.kind == SegmentKind::Territory));
    }
}
