//! Canvas dimensions and the boolean occupancy grid shared by the mask
//! generators and the compositor.

use rayon::prelude::*;

/// Target raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIDE, Self::DEFAULT_SIDE)
    }
}

impl Canvas {
    pub const DEFAULT_SIDE: u32 = 800;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Caller supplied dimensions; anything non-positive becomes 800.
    pub fn from_requested(width: i64, height: i64) -> Self {
        let side = |v: i64| {
            if v > 0 {
                u32::try_from(v).unwrap_or(u32::MAX)
            } else {
                Self::DEFAULT_SIDE
            }
        };
        Self::new(side(width), side(height))
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Largest size with the given aspect ratio (width / height) that fits
    /// inside this canvas.
    ///
    /// When the canvas is relatively wider than `aspect` the height is kept,
    /// otherwise the width is kept. The derived side is truncated.
    pub fn fit_aspect(&self, aspect: f64) -> Canvas {
        if !aspect.is_finite() || aspect <= 0.0 {
            return *self;
        }
        let canvas_aspect = self.width as f64 / self.height as f64;
        if canvas_aspect > aspect {
            Canvas::new((self.height as f64 * aspect) as u32, self.height)
        } else {
            Canvas::new(self.width, (self.width as f64 / aspect) as u32)
        }
    }
}

/// Row-major `height × width` boolean matrix. `true` marks a pixel inside the
/// silhouette, i.e. eligible for term placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn filled(canvas: Canvas, value: bool) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            cells: vec![value; canvas.pixel_count()],
        }
    }

    /// Evaluates `inside(row, col)` for every cell. Rows are filled in
    /// parallel; each cell is written exactly once.
    pub fn from_fn<F>(canvas: Canvas, inside: F) -> Self
    where
        F: Fn(u32, u32) -> bool + Sync,
    {
        let width = canvas.width as usize;
        let mut cells = vec![false; canvas.pixel_count()];
        cells
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                for (col, cell) in line.iter_mut().enumerate() {
                    *cell = inside(row as u32, col as u32);
                }
            });
        Self {
            width: canvas.width,
            height: canvas.height,
            cells,
        }
    }

    /// Occupied block covering the middle half of both axes.
    pub fn centered_rect(canvas: Canvas) -> Self {
        let (w, h) = (canvas.width, canvas.height);
        let rows = h / 4..3 * h / 4;
        let cols = w / 4..3 * w / 4;
        Self::from_fn(canvas, |row, col| rows.contains(&row) && cols.contains(&col))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    pub fn get(&self, row: u32, col: u32) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        self.cells[row as usize * self.width as usize + col as usize]
    }

    pub fn set(&mut self, row: u32, col: u32, value: bool) {
        if row < self.height && col < self.width {
            self.cells[row as usize * self.width as usize + col as usize] = value;
        }
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Copies `other` into this grid with its top-left corner at
    /// (`offset_x`, `offset_y`). Cells falling outside are dropped.
    pub fn paste(&mut self, other: &OccupancyGrid, offset_x: u32, offset_y: u32) {
        for row in 0..other.height {
            let target_row = offset_y + row;
            if target_row >= self.height {
                break;
            }
            for col in 0..other.width {
                let target_col = offset_x + col;
                if target_col >= self.width {
                    break;
                }
                self.set(target_row, target_col, other.get(row, col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_sizes_default_to_800() {
        assert_eq!(Canvas::from_requested(0, -5), Canvas::new(800, 800));
        assert_eq!(Canvas::from_requested(640, 0), Canvas::new(640, 800));
        assert_eq!(Canvas::from_requested(320, 200), Canvas::new(320, 200));
    }

    #[test]
    fn fit_aspect_keeps_height_for_wide_canvas() {
        let canvas = Canvas::new(800, 400);
        assert_eq!(canvas.fit_aspect(1.0), Canvas::new(400, 400));
        assert_eq!(canvas.fit_aspect(4.0), Canvas::new(800, 200));
        assert_eq!(canvas.fit_aspect(2.0), Canvas::new(800, 400));
    }

    #[test]
    fn from_fn_matches_dimensions() {
        let grid = OccupancyGrid::from_fn(Canvas::new(7, 3), |row, col| row == 1 && col % 2 == 0);
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.cells().len(), 21);
        assert_eq!(grid.occupied_count(), 4);
        assert!(grid.get(1, 6));
        assert!(!grid.get(0, 0));
    }

    #[test]
    fn centered_rect_covers_middle_half() {
        let grid = OccupancyGrid::centered_rect(Canvas::new(100, 40));
        assert_eq!(grid.occupied_count(), 50 * 20);
        assert!(grid.get(10, 25));
        assert!(grid.get(29, 74));
        assert!(!grid.get(30, 50));
        assert!(!grid.get(20, 24));
    }

    #[test]
    fn paste_clips_at_edges() {
        let mut base = OccupancyGrid::filled(Canvas::new(4, 4), false);
        let stamp = OccupancyGrid::filled(Canvas::new(3, 3), true);
        base.paste(&stamp, 2, 2);
        assert_eq!(base.occupied_count(), 4);
        assert!(base.get(3, 3));
        assert!(!base.get(1, 1));
    }
}
