use crate::grid::{Grid, Position};
use serde::{Deserialize, Serialize};

/// Moore neighborhood offsets, row by row
pub const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// How neighbor arithmetic treats the grid edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Coordinates wrap modulo the grid size
    #[default]
    Torus,
    /// Offsets that leave the grid are not neighbors
    Bounded,
}

impl Topology {
    pub fn name(&self) -> &str {
        match self {
            Topology::Torus => "Torus",
            Topology::Bounded => "Bounded",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Topology::Torus => Topology::Bounded,
            Topology::Bounded => Topology::Torus,
        }
    }

    /// Apply `delta` to `coord` on an axis of length `size`
    #[inline]
    fn shift(&self, coord: usize, delta: isize, size: usize) -> Option<usize> {
        let moved = coord as isize + delta;
        match self {
            Topology::Torus => Some(moved.rem_euclid(size as isize) as usize),
            Topology::Bounded => (0..size as isize).contains(&moved).then_some(moved as usize),
        }
    }

    /// The neighbors of `(x, y)` that exist under this topology
    pub fn neighbors(&self, size: usize, x: usize, y: usize) -> impl Iterator<Item = Position> + '_ {
        MOORE_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            Some((self.shift(x, dx, size)?, self.shift(y, dy, size)?))
        })
    }
}

/// Free neighbors of one cell, held inline so the walk loop never allocates
#[derive(Debug, Clone, Copy)]
pub struct FreeNeighbors {
    cells: [Position; 8],
    len: usize,
}

impl FreeNeighbors {
    pub fn as_slice(&self) -> &[Position] {
        &self.cells[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Number of occupied cells around `(x, y)`
pub fn occupied_neighbor_count(grid: &Grid, topology: Topology, x: usize, y: usize) -> usize {
    topology
        .neighbors(grid.size(), x, y)
        .filter(|&(nx, ny)| grid.is_occupied(nx, ny))
        .count()
}

/// Unoccupied cells around `(x, y)`, in offset order
pub fn free_neighbors(grid: &Grid, topology: Topology, x: usize, y: usize) -> FreeNeighbors {
    let mut out = FreeNeighbors {
        cells: [(0, 0); 8],
        len: 0,
    };
    for (nx, ny) in topology.neighbors(grid.size(), x, y) {
        if !grid.is_occupied(nx, ny) {
            out.cells[out.len] = (nx, ny);
            out.len += 1;
        }
    }
    out
}

/// True when at least one neighbor of `(x, y)` is occupied
pub fn touches_aggregate(grid: &Grid, topology: Topology, x: usize, y: usize) -> bool {
    topology
        .neighbors(grid.size(), x, y)
        .any(|(nx, ny)| grid.is_occupied(nx, ny))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torus_wraps_left_edge() {
        let m = 7;
        let y = 3;
        let ns: Vec<_> = Topology::Torus.neighbors(m, 0, y).collect();
        assert_eq!(ns.len(), 8);
        assert!(ns.contains(&(m - 1, y - 1)));
        assert!(ns.contains(&(m - 1, y)));
        assert!(ns.contains(&(m - 1, y + 1)));
    }

    #[test]
    fn test_torus_corner_wraps_both_axes() {
        let ns: Vec<_> = Topology::Torus.neighbors(5, 0, 0).collect();
        assert!(ns.contains(&(4, 4)));
        assert!(ns.contains(&(4, 0)));
        assert!(ns.contains(&(0, 4)));
        assert!(!ns.contains(&(0, 0)));
    }

    #[test]
    fn test_torus_smallest_grid_has_eight_distinct_neighbors() {
        let mut ns: Vec<_> = Topology::Torus.neighbors(3, 1, 1).collect();
        ns.sort();
        ns.dedup();
        assert_eq!(ns.len(), 8);
        assert!(!ns.contains(&(1, 1)));
    }

    #[test]
    fn test_bounded_drops_offgrid_cells() {
        assert_eq!(Topology::Bounded.neighbors(5, 0, 0).count(), 3);
        assert_eq!(Topology::Bounded.neighbors(5, 0, 2).count(), 5);
        assert_eq!(Topology::Bounded.neighbors(5, 2, 2).count(), 8);
    }

    #[test]
    fn test_counts_and_free_neighbors() {
        let mut grid = Grid::new(5);
        grid.set_occupied(2, 2);
        grid.set_occupied(4, 4);

        assert_eq!(occupied_neighbor_count(&grid, Topology::Torus, 1, 1), 1);
        assert_eq!(free_neighbors(&grid, Topology::Torus, 1, 1).len(), 7);
        assert!(touches_aggregate(&grid, Topology::Torus, 0, 0));
        assert!(!touches_aggregate(&grid, Topology::Bounded, 0, 0));

        let free = free_neighbors(&grid, Topology::Torus, 3, 3);
        assert_eq!(free.len(), 6);
        assert!(!free.as_slice().contains(&(2, 2)));
        assert!(!free.as_slice().contains(&(4, 4)));
    }

    #[test]
    fn test_boxed_in_cell_has_no_free_neighbors() {
        let mut grid = Grid::new(3);
        for x in 0..3 {
            for y in 0..3 {
                grid.set_occupied(x, y);
            }
        }
        grid.clear(1, 1);
        let free = free_neighbors(&grid, Topology::Torus, 1, 1);
        assert!(free.is_empty());
        assert_eq!(occupied_neighbor_count(&grid, Topology::Torus, 1, 1), 8);
    }

    #[test]
    fn test_topology_serde_names() {
        assert_eq!(serde_json::to_string(&Topology::Torus).unwrap(), "\"torus\"");
        let t: Topology = serde_json::from_str("\"bounded\"").unwrap();
        assert_eq!(t, Topology::Bounded);
        assert_eq!(t.toggle(), Topology::Torus);
    }
}
