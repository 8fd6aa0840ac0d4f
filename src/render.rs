use crate::error::{DlaError, Result};
use crate::grid::Grid;
use image::{GrayImage, Luma};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const OCCUPIED: u8 = 0;
const FREE: u8 = 255;

/// Grayscale image of the grid, `scale` pixels per cell. Occupied cells are
/// black. Row `x` of the grid becomes pixel row `x`.
pub fn to_image(grid: &Grid, scale: u32) -> GrayImage {
    let scale = scale.max(1);
    let side = grid.size() as u32 * scale;
    GrayImage::from_fn(side, side, |px, py| {
        let x = (py / scale) as usize;
        let y = (px / scale) as usize;
        Luma([if grid.is_occupied(x, y) { OCCUPIED } else { FREE }])
    })
}

/// Write the grid as a PNG (format picked from the extension)
pub fn save_png(grid: &Grid, path: &Path, scale: u32) -> Result<()> {
    to_image(grid, scale).save(path)?;
    Ok(())
}

/// Collects grid snapshots while a run progresses, for an animated GIF
pub struct GrowthRecorder {
    every: usize,
    frames: Vec<Grid>,
}

impl GrowthRecorder {
    /// Keep one frame for every `every` released particles
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            frames: Vec::new(),
        }
    }

    /// Offer the grid after `released` particles; stored when it falls on the interval
    pub fn observe(&mut self, released: usize, grid: &Grid) {
        if released % self.every == 0 {
            self.frames.push(grid.clone());
        }
    }

    /// Append the final state unless it was just recorded
    pub fn finish(&mut self, grid: &Grid) {
        if self.frames.last() != Some(grid) {
            self.frames.push(grid.clone());
        }
    }

    pub fn frames(&self) -> &[Grid] {
        &self.frames
    }

    /// Encode every frame as an endlessly looping GIF; `delay` is in hundredths of a second
    pub fn save_gif(&self, path: &Path, scale: u32, delay: u16) -> Result<()> {
        let Some(first) = self.frames.first() else {
            return Ok(());
        };
        let scale = scale.max(1);
        let pixels = first.size() as u64 * scale as u64;
        let side = u16::try_from(pixels).map_err(|_| DlaError::FrameTooLarge { side: pixels })?;

        // Index 0 is white, 1 is black
        let palette = [255, 255, 255, 0, 0, 0];
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = gif::Encoder::new(file, side, side, &palette)?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        for grid in &self.frames {
            let pixels: Vec<u8> = to_image(grid, scale)
                .pixels()
                .map(|p| if p.0[0] == OCCUPIED { 1 } else { 0 })
                .collect();
            let mut frame = gif::Frame::from_indexed_pixels(side, side, pixels, None);
            frame.delay = delay;
            encoder.write_frame(&frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_grid() -> Grid {
        let mut grid = Grid::new(4);
        grid.set_occupied(0, 3);
        grid.set_occupied(2, 1);
        grid
    }

    #[test]
    fn test_image_maps_occupied_to_black() {
        let img = to_image(&sample_grid(), 2);
        assert_eq!(img.dimensions(), (8, 8));
        // cell (0, 3) covers pixel columns 6-7 of rows 0-1
        assert_eq!(img.get_pixel(6, 0).0[0], OCCUPIED);
        assert_eq!(img.get_pixel(7, 1).0[0], OCCUPIED);
        assert_eq!(img.get_pixel(2, 4).0[0], OCCUPIED);
        assert_eq!(img.get_pixel(0, 0).0[0], FREE);
        assert_eq!(img.get_pixel(4, 2).0[0], FREE);
    }

    #[test]
    fn test_png_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.png");
        save_png(&sample_grid(), &path, 3).unwrap();
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded, to_image(&sample_grid(), 3));
    }

    #[test]
    fn test_png_bad_path_leaves_grid_untouched() {
        let grid = sample_grid();
        let before = grid.clone();
        assert!(save_png(&grid, Path::new("/nonexistent/dir/grid.png"), 1).is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_recorder_interval_and_gif() {
        let mut recorder = GrowthRecorder::new(2);
        let mut grid = Grid::new(4);
        for released in 1..=5 {
            grid.set_occupied(released % 4, 0);
            recorder.observe(released, &grid);
        }
        assert_eq!(recorder.frames().len(), 2);
        recorder.finish(&grid);
        assert_eq!(recorder.frames().len(), 3);
        recorder.finish(&grid);
        assert_eq!(recorder.frames().len(), 3);

        let dir = tempdir().unwrap();
        let path = dir.path().join("growth.gif");
        recorder.save_gif(&path, 2, 5).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
    }

    #[test]
    fn test_gif_rejects_oversized_frames() {
        let mut recorder = GrowthRecorder::new(1);
        recorder.observe(0, &Grid::new(1000));

        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.gif");
        let err = recorder.save_gif(&path, 70, 5).unwrap_err();
        assert!(matches!(err, DlaError::FrameTooLarge { side: 70_000 }));
        assert!(!path.exists());
    }
}
