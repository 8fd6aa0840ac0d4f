use dla_lattice::{Grid, Position};
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

const AGGREGATE_COLOR: Color = Color::White;
const NEWEST_COLOR: Color = Color::Yellow;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Render the grid into Braille characters, scaled uniformly so the whole
/// square fits the canvas. Grid rows run down the screen. The character
/// containing `newest` is drawn in a highlight color.
pub fn render_to_braille(
    grid: &Grid,
    newest: Option<Position>,
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<BrailleCell> {
    let size = grid.size();

    // Braille effective resolution
    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;
    if braille_width == 0 || braille_height == 0 || size == 0 {
        return Vec::new();
    }

    // One scale for both axes keeps the aggregate square
    let scale = (size as f32 / braille_width as f32).max(size as f32 / braille_height as f32);

    let mut cells = Vec::new();

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut is_newest = false;

            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let row = ((base_by + dy) as f32 * scale) as usize;
                    let col = ((base_bx + dx) as f32 * scale) as usize;
                    if row >= size || col >= size {
                        continue;
                    }

                    if grid.is_occupied(row, col) {
                        pattern |= BRAILLE_DOTS[dx][dy];
                        if newest == Some((row, col)) {
                            is_newest = true;
                        }
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: if is_newest { NEWEST_COLOR } else { AGGREGATE_COLOR },
                });
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_braille_char_generation() {
        let empty = char::from_u32(BRAILLE_BASE).unwrap();
        assert_eq!(empty, '\u{2800}');

        let full = char::from_u32(BRAILLE_BASE + 0xFF).unwrap();
        assert_eq!(full, '\u{28FF}');
    }

    #[test]
    fn test_full_grid_fills_canvas() {
        let mut grid = Grid::new(4);
        for x in 0..4 {
            for y in 0..4 {
                grid.set_occupied(x, y);
            }
        }
        let cells = render_to_braille(&grid, None, 2, 1);
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.char == '\u{28FF}' && c.color == AGGREGATE_COLOR));
    }

    #[test]
    fn test_single_cell_maps_to_one_dot() {
        let mut grid = Grid::new(4);
        grid.set_occupied(3, 0);
        let cells = render_to_braille(&grid, Some((3, 0)), 2, 1);
        assert_eq!(
            cells,
            vec![BrailleCell {
                x: 0,
                y: 0,
                char: char::from_u32(BRAILLE_BASE + 0x40).unwrap(),
                color: NEWEST_COLOR,
            }]
        );
    }

    #[test]
    fn test_empty_grid_or_canvas() {
        assert!(render_to_braille(&Grid::new(8), None, 10, 10).is_empty());
        let mut grid = Grid::new(8);
        grid.set_occupied(4, 4);
        assert!(render_to_braille(&grid, None, 0, 10).is_empty());
    }
}
