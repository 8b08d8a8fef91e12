//! Closed-form occupancy tests for the parametric shapes.
//!
//! Every shape is resolved against a canvas into a [`Silhouette`] carrying its
//! own center and size parameters; the grid is then a pure per-pixel function
//! of that value.

use std::f64::consts::{PI, TAU};

use crate::grid::{Canvas, OccupancyGrid};
use crate::shape::GeometricShape;

/// Breathing room left between the silhouette and the canvas edge.
pub const MARGIN: i64 = 10;

/// Inner radius of the star relative to the outer radius.
pub const STAR_INNER_RATIO: f64 = 0.4;

const HEXAGON_INRADIUS: f64 = 0.866;
const PENTAGON_INRADIUS: f64 = 0.7265;
const OCTAGON_INRADIUS: f64 = 0.7071;

/// A shape resolved against a concrete canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Silhouette {
    /// The whole canvas.
    Full,
    Disc {
        cx: i64,
        cy: i64,
        radius: i64,
    },
    /// Apex at top-center, widening linearly to the full width at the bottom.
    Wedge {
        cx: i64,
        width: u32,
        height: u32,
    },
    Heart {
        cx: i64,
        cy: i64,
        scale_x: f64,
        scale_y: f64,
    },
    Star {
        cx: i64,
        cy: i64,
        outer: f64,
    },
    Polygon {
        cx: i64,
        cy: i64,
        radius: f64,
        vertices: u32,
        inradius: f64,
    },
    Ellipse {
        cx: i64,
        cy: i64,
        a: f64,
        b: f64,
    },
    Diamond {
        cx: i64,
        cy: i64,
        size: f64,
    },
}

impl Silhouette {
    pub fn resolve(shape: GeometricShape, canvas: Canvas) -> Self {
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        let (cx, cy) = (w / 2, h / 2);
        let radius = w.min(h) / 2 - MARGIN;
        let polygon = |vertices, inradius| Silhouette::Polygon {
            cx,
            cy,
            radius: radius as f64,
            vertices,
            inradius,
        };

        match shape {
            GeometricShape::Rectangle => Silhouette::Full,
            GeometricShape::Circle => Silhouette::Disc { cx, cy, radius },
            GeometricShape::Triangle => Silhouette::Wedge {
                cx,
                width: canvas.width,
                height: canvas.height,
            },
            GeometricShape::Heart => Silhouette::Heart {
                cx,
                // authored slightly above center
                cy: cy - h / 10,
                scale_x: w as f64 / 3.0,
                scale_y: h as f64 / 3.0,
            },
            GeometricShape::Star => Silhouette::Star {
                cx,
                cy,
                outer: radius as f64,
            },
            GeometricShape::Hexagon => polygon(6, HEXAGON_INRADIUS),
            GeometricShape::Pentagon => polygon(5, PENTAGON_INRADIUS),
            GeometricShape::Octagon => polygon(8, OCTAGON_INRADIUS),
            GeometricShape::Ellipse => Silhouette::Ellipse {
                cx,
                cy,
                a: (w / 2 - MARGIN) as f64,
                b: (h / 2 - MARGIN) as f64,
            },
            GeometricShape::Diamond => Silhouette::Diamond {
                cx,
                cy,
                size: radius as f64,
            },
        }
    }

    /// Membership test for the pixel at (`row`, `col`).
    pub fn contains(&self, row: u32, col: u32) -> bool {
        let (row, col) = (row as i64, col as i64);
        match *self {
            Silhouette::Full => true,
            Silhouette::Disc { cx, cy, radius } => {
                if radius < 0 {
                    return false;
                }
                let (dx, dy) = (col - cx, row - cy);
                dx * dx + dy * dy <= radius * radius
            }
            Silhouette::Wedge { cx, width, height } => {
                let ratio = row as f64 / height as f64;
                let row_width = (width as f64 * ratio) as i64;
                if row_width <= 0 {
                    return false;
                }
                let half = row_width / 2;
                col >= cx - half && col < cx + half
            }
            Silhouette::Heart {
                cx,
                cy,
                scale_x,
                scale_y,
            } => {
                let x = (col - cx) as f64 / scale_x;
                // flipped so the lobes sit on top
                let y = -((row - cy) as f64 / scale_y);
                let base = x * x + y * y - 1.0;
                base * base * base - x * x * y * y * y <= 0.0
            }
            Silhouette::Star { cx, cy, outer } => {
                let (distance, angle) = polar(col - cx, row - cy);
                distance <= star_radius(outer, angle)
            }
            Silhouette::Polygon {
                cx,
                cy,
                radius,
                vertices,
                inradius,
            } => {
                let (distance, angle) = polar(col - cx, row - cy);
                distance <= polygon_radius(radius, vertices, inradius, angle)
            }
            Silhouette::Ellipse { cx, cy, a, b } => {
                if a <= 0.0 || b <= 0.0 {
                    return false;
                }
                let (dx, dy) = ((col - cx) as f64, (row - cy) as f64);
                (dx * dx) / (a * a) + (dy * dy) / (b * b) <= 1.0
            }
            Silhouette::Diamond { cx, cy, size } => {
                if size <= 0.0 {
                    return false;
                }
                let (dx, dy) = ((col - cx).abs() as f64, (row - cy).abs() as f64);
                dx / size + dy / size <= 1.0
            }
        }
    }
}

/// Distance and angle in `[0, 2π)` of an offset from the center.
fn polar(dx: i64, dy: i64) -> (f64, f64) {
    let (dx, dy) = (dx as f64, dy as f64);
    let distance = (dx * dx + dy * dy).sqrt();
    let mut angle = dy.atan2(dx);
    if angle < 0.0 {
        angle += TAU;
    }
    (distance, angle)
}

/// Boundary radius of the 5-point star at `angle`.
///
/// Ten sectors of π/5: even sectors run from the outer radius down to the
/// inner one, odd sectors back up.
pub fn star_radius(outer: f64, angle: f64) -> f64 {
    let sector_width = PI / 5.0;
    let sector = (angle / sector_width) as u32;
    let t = (angle - sector as f64 * sector_width) / sector_width;
    let inner = outer * STAR_INNER_RATIO;
    let span = outer - inner;
    if sector % 2 == 0 {
        outer - span * t
    } else {
        inner + span * t
    }
}

/// Boundary radius of a `vertices`-gon at `angle`: full radius in even
/// sectors, `radius * inradius` in odd ones.
pub fn polygon_radius(radius: f64, vertices: u32, inradius: f64, angle: f64) -> f64 {
    let sector = (angle / (TAU / vertices as f64)) as u32;
    if sector % 2 == 0 {
        radius
    } else {
        radius * inradius
    }
}

/// Occupancy grid for `shape` at the canvas resolution. `Rectangle` yields an
/// all-occupied grid.
pub fn generate(shape: GeometricShape, canvas: Canvas) -> OccupancyGrid {
    let silhouette = Silhouette::resolve(shape, canvas);
    if silhouette == Silhouette::Full {
        return OccupancyGrid::filled(canvas, true);
    }
    OccupancyGrid::from_fn(canvas, |row, col| silhouette.contains(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: u32) -> Canvas {
        Canvas::new(side, side)
    }

    #[test]
    fn grids_match_requested_dimensions() {
        let canvas = Canvas::new(123, 77);
        for shape in GeometricShape::ALL {
            let grid = generate(shape, canvas);
            assert_eq!((grid.width(), grid.height()), (123, 77), "{:?}", shape);
            assert_eq!(grid.cells().len(), 123 * 77);
        }
    }

    #[test]
    fn circle_center_in_and_radius_plus_one_out() {
        let grid = generate(GeometricShape::Circle, square(200));
        // center (100, 100), radius 90
        assert!(grid.get(100, 100));
        assert!(grid.get(100, 190));
        assert!(!grid.get(100, 191));
        assert!(!grid.get(191, 100));
        assert!(!grid.get(9, 100));
    }

    #[test]
    fn rectangle_is_fully_occupied() {
        let grid = generate(GeometricShape::Rectangle, Canvas::new(40, 30));
        assert_eq!(grid.occupied_count(), 40 * 30);
    }

    #[test]
    fn ellipse_on_square_canvas_matches_circle() {
        let canvas = square(301);
        let circle = generate(GeometricShape::Circle, canvas);
        let ellipse = generate(GeometricShape::Ellipse, canvas);
        let differing = circle
            .cells()
            .iter()
            .zip(ellipse.cells())
            .filter(|(a, b)| a != b)
            .count();
        // only lattice points exactly on the boundary may flip through rounding
        assert!(differing <= 12, "{} pixels differ", differing);
    }

    #[test]
    fn triangle_widens_towards_bottom() {
        let canvas = Canvas::new(100, 100);
        let grid = generate(GeometricShape::Triangle, canvas);
        let row_count = |row: u32| (0..100).filter(|&c| grid.get(row, c)).count();
        assert_eq!(row_count(0), 0);
        assert_eq!(row_count(50), 50);
        assert_eq!(row_count(99), 98);
        assert!(grid.get(50, 25) && !grid.get(50, 75));
    }

    #[test]
    fn heart_has_lobes_on_top() {
        let canvas = square(300);
        let grid = generate(GeometricShape::Heart, canvas);
        // center shifted to row 120
        assert!(grid.get(120, 150));
        // cusp between the lobes is empty, tip at the bottom is filled
        assert!(!grid.get(15, 150));
        assert!(grid.get(200, 150));
        assert!(!grid.get(225, 150));
        assert!(grid.get(10, 100) && grid.get(10, 200));
    }

    #[test]
    fn diamond_edges() {
        let grid = generate(GeometricShape::Diamond, square(100));
        // size 40 around (50, 50)
        assert!(grid.get(50, 90));
        assert!(!grid.get(50, 91));
        assert!(grid.get(70, 70));
        assert!(!grid.get(71, 71));
    }

    #[test]
    fn star_has_five_radius_maxima() {
        let outer = 100.0;
        let steps = 3600;
        let radii: Vec<f64> = (0..steps)
            .map(|i| star_radius(outer, TAU * i as f64 / steps as f64))
            .collect();
        let maxima = (0..steps)
            .filter(|&i| {
                let prev = radii[(i + steps - 1) % steps];
                let next = radii[(i + 1) % steps];
                radii[i] > prev && radii[i] >= next
            })
            .count();
        assert_eq!(maxima, 5);
        assert!((star_radius(outer, PI / 5.0 - 1e-9) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn polygon_alternates_full_and_inradius_sectors() {
        for (vertices, inradius) in [
            (6, HEXAGON_INRADIUS),
            (5, PENTAGON_INRADIUS),
            (8, OCTAGON_INRADIUS),
        ] {
            let sector = TAU / vertices as f64;
            for s in 0..vertices {
                let mid = sector * (s as f64 + 0.5);
                let expected = if s % 2 == 0 { 50.0 } else { 50.0 * inradius };
                assert_eq!(polygon_radius(50.0, vertices, inradius, mid), expected);
            }
        }
    }

    #[test]
    fn star_like_shapes_include_center() {
        for shape in [
            GeometricShape::Star,
            GeometricShape::Hexagon,
            GeometricShape::Pentagon,
            GeometricShape::Octagon,
        ] {
            let grid = generate(shape, square(120));
            assert!(grid.get(60, 60), "{:?}", shape);
            assert!(!grid.get(0, 0), "{:?}", shape);
        }
    }

    #[test]
    fn tiny_canvas_leaves_nothing_occupied() {
        for shape in [
            GeometricShape::Circle,
            GeometricShape::Ellipse,
            GeometricShape::Diamond,
        ] {
            let grid = generate(shape, square(12));
            assert_eq!(grid.occupied_count(), 0, "{:?}", shape);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let canvas = Canvas::new(257, 191);
        for shape in GeometricShape::ALL {
            assert_eq!(generate(shape, canvas), generate(shape, canvas));
        }
    }
}
