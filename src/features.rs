use crate::error::{DlaError, Result};
use crate::grid::Grid;
use std::ops::RangeInclusive;

/// Rows/columns covered by the centered `window` x `window` block of a grid of side `size`.
///
/// The block spans `mid - window/2 ..= mid + window/2` with `mid = size/2`, so
/// `window` must be odd and no larger than the grid.
pub fn central_window(size: usize, window: usize) -> Result<RangeInclusive<usize>> {
    if window == 0 || window % 2 == 0 || window > size {
        return Err(DlaError::InvalidWindow { window, size });
    }
    let mid = size / 2;
    let half = window / 2;
    Ok(mid - half..=mid + half)
}

/// Fraction of occupied cells inside the centered window
pub fn central_density(grid: &Grid, window: usize) -> Result<f64> {
    let span = central_window(grid.size(), window)?;
    let occupied = span
        .clone()
        .flat_map(|x| span.clone().map(move |y| (x, y)))
        .filter(|&(x, y)| grid.is_occupied(x, y))
        .count();
    Ok(occupied as f64 / (window * window) as f64)
}

/// Central density of every grid in a batch
pub fn central_density_batch(grids: &[Grid], window: usize) -> Result<Vec<f64>> {
    grids.iter().map(|g| central_density(g, window)).collect()
}
