use crate::rng::SimRng;

/// A cell coordinate `(x, y)`; `x` selects the row
pub type Position = (usize, usize);

/// Square occupancy field. The grid only ever stores normalized coordinates;
/// wraparound is the caller's concern (see `neighbor`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create an empty `size` x `size` grid
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Build a grid from row-major rows. Returns `None` unless the rows form a square.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            size,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    pub(crate) fn from_cells(size: usize, cells: Vec<bool>) -> Option<Self> {
        (size.checked_mul(size) == Some(cells.len())).then_some(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Center cell `(⌊M/2⌋, ⌊M/2⌋)`
    pub fn center(&self) -> Position {
        (self.size / 2, self.size / 2)
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.size && y < self.size, "({x}, {y}) outside {0}x{0} grid", self.size);
        x * self.size + y
    }

    #[inline]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn set_occupied(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.cells[idx] = true;
    }

    #[inline]
    pub fn clear(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.cells[idx] = false;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Pick a cell on one of the four edges.
    ///
    /// One axis is pinned to `0` or `M-1`, the other is uniform in `[0, M)`, and
    /// the axes swap roles on a fair coin. Corner cells are reachable both ways,
    /// so the perimeter is not sampled uniformly. The draw order is fixed so
    /// seeded runs stay reproducible.
    pub fn random_edge_position(&self, rng: &mut SimRng) -> Position {
        let extremes = [0, self.size - 1];
        let x = extremes[rng.index(2)];
        let y = rng.index(self.size);
        if rng.unit() > 0.5 {
            (y, x)
        } else {
            (x, y)
        }
    }

    /// All cells lying on the boundary, in row-major order
    pub fn edge_cells(&self) -> impl Iterator<Item = Position> + '_ {
        let last = self.size - 1;
        (0..self.size).flat_map(move |x| {
            (0..self.size)
                .filter(move |&y| x == 0 || x == last || y == 0 || y == last)
                .map(move |y| (x, y))
        })
    }

    /// Rows of the grid, first coordinate outermost
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.size)
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut grid = Grid::new(5);
        assert_eq!(grid.occupied_count(), 0);
        grid.set_occupied(1, 3);
        assert!(grid.is_occupied(1, 3));
        assert!(!grid.is_occupied(3, 1));
        grid.set_occupied(1, 3);
        assert_eq!(grid.occupied_count(), 1);
        grid.clear(1, 3);
        assert!(!grid.is_occupied(1, 3));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_center() {
        assert_eq!(Grid::new(5).center(), (2, 2));
        assert_eq!(Grid::new(3).center(), (1, 1));
        assert_eq!(Grid::new(4).center(), (2, 2));
    }

    #[test]
    fn test_random_edge_position_on_boundary() {
        let grid = Grid::new(9);
        let mut rng = SimRng::seeded(3);
        let mut seen_sides = [false; 4];
        for _ in 0..2000 {
            let (x, y) = grid.random_edge_position(&mut rng);
            assert!(x < 9 && y < 9);
            assert!(x == 0 || x == 8 || y == 0 || y == 8, "({x}, {y}) is interior");
            if x == 0 {
                seen_sides[0] = true;
            }
            if x == 8 {
                seen_sides[1] = true;
            }
            if y == 0 {
                seen_sides[2] = true;
            }
            if y == 8 {
                seen_sides[3] = true;
            }
        }
        assert!(seen_sides.iter().all(|&s| s));
    }

    #[test]
    fn test_edge_cells() {
        let grid = Grid::new(4);
        let edges: Vec<_> = grid.edge_cells().collect();
        assert_eq!(edges.len(), 12);
        assert!(!edges.contains(&(1, 1)));
        assert!(!edges.contains(&(2, 2)));
        assert!(edges.contains(&(3, 0)));
    }

    #[test]
    fn test_rows_round_trip() {
        let mut grid = Grid::new(3);
        grid.set_occupied(0, 2);
        grid.set_occupied(2, 1);
        let rows = grid.to_rows();
        assert_eq!(rows[0], vec![false, false, true]);
        assert_eq!(rows[2], vec![false, true, false]);
        assert_eq!(Grid::from_rows(&rows), Some(grid));
        assert!(Grid::from_rows(&[vec![true, false]]).is_none());
    }

    #[test]
    fn test_from_cells_checks_length() {
        assert!(Grid::from_cells(2, vec![false; 4]).is_some());
        assert!(Grid::from_cells(2, vec![false; 3]).is_none());
        assert!(Grid::from_cells(1 << 32, Vec::new()).is_none());
    }
}
