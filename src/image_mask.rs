//! Occupancy derived from raster images.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use tracing::{debug, warn};

use crate::assets::AssetStore;
use crate::grid::{Canvas, OccupancyGrid};
use crate::shape::{TemplateId, Threshold};
use crate::Error;

/// Uploaded images: pixels darker than this are inside the silhouette.
pub const UPLOAD_THRESHOLD: Threshold = Threshold::DarkerThan(200);

fn threshold_grid(luma: &GrayImage, threshold: Threshold) -> OccupancyGrid {
    let canvas = Canvas::new(luma.width(), luma.height());
    OccupancyGrid::from_fn(canvas, |row, col| {
        threshold.occupied(luma.get_pixel(col, row)[0])
    })
}

/// Stretches the uploaded image over the whole canvas and thresholds its
/// luminance.
pub fn from_image_bytes(bytes: &[u8], canvas: Canvas) -> Result<OccupancyGrid, Error> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(from_image(&img, canvas))
}

pub fn from_image(img: &DynamicImage, canvas: Canvas) -> OccupancyGrid {
    let luma = img.to_luma8();
    let resized = image::imageops::resize(&luma, canvas.width, canvas.height, FilterType::Triangle);
    threshold_grid(&resized, UPLOAD_THRESHOLD)
}

/// Fits `template` inside the canvas keeping its aspect ratio, thresholds it
/// and pastes it centered into an otherwise empty grid.
pub fn embed_template(template: &DynamicImage, canvas: Canvas, threshold: Threshold) -> OccupancyGrid {
    let aspect = template.width() as f64 / template.height().max(1) as f64;
    let scaled = canvas.fit_aspect(aspect);
    let luma = template
        .resize_exact(scaled.width, scaled.height, FilterType::Lanczos3)
        .to_luma8();
    let stamp = threshold_grid(&luma, threshold);

    let offset_x = (canvas.width - scaled.width) / 2;
    let offset_y = (canvas.height - scaled.height) / 2;
    debug!(
        width = scaled.width,
        height = scaled.height,
        offset_x,
        offset_y,
        "embedding template"
    );

    let mut grid = OccupancyGrid::filled(canvas, false);
    grid.paste(&stamp, offset_x, offset_y);
    grid
}

/// Template mask, or the centered rectangle when the template image could
/// not be loaded. Never fails.
pub fn template_mask(assets: &AssetStore, template: TemplateId, canvas: Canvas) -> OccupancyGrid {
    match assets.template(template) {
        Some(img) => embed_template(&img, canvas, template.threshold()),
        None => {
            warn!(template = template.id(), "using rectangular fallback mask");
            OccupancyGrid::centered_rect(canvas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Luma};
    use std::io::Cursor;

    fn encode(img: &GrayImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn upload_dark_half_is_occupied() {
        let img: GrayImage = ImageBuffer::from_fn(40, 40, |x, _| {
            if x < 20 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let grid = from_image_bytes(&encode(&img), Canvas::new(80, 60)).unwrap();
        assert_eq!((grid.width(), grid.height()), (80, 60));
        assert!(grid.get(30, 5));
        assert!(grid.get(59, 35));
        assert!(!grid.get(30, 45));
        assert!(!grid.get(0, 79));
    }

    #[test]
    fn upload_threshold_is_at_200() {
        let below = GrayImage::from_pixel(8, 8, Luma([199]));
        let at = GrayImage::from_pixel(8, 8, Luma([200]));
        let canvas = Canvas::new(8, 8);
        assert_eq!(from_image_bytes(&encode(&below), canvas).unwrap().occupied_count(), 64);
        assert_eq!(from_image_bytes(&encode(&at), canvas).unwrap().occupied_count(), 0);
    }

    #[test]
    fn malformed_upload_is_decode_error() {
        let err = from_image_bytes(b"definitely not an image", Canvas::new(10, 10));
        assert!(matches!(err, Err(Error::Decode(_))));
    }

    #[test]
    fn threshold_is_monotonic() {
        // left to right gradient: darker pixels are never excluded while lighter ones are included
        let img: GrayImage = ImageBuffer::from_fn(256, 4, |x, _| Luma([x as u8]));
        let dark = threshold_grid(&img, Threshold::DarkerThan(128));
        let bright = threshold_grid(&img, Threshold::BrighterThan(128));
        for col in 1..256 {
            if dark.get(0, col) {
                assert!(dark.get(0, col - 1));
            }
            if bright.get(0, col - 1) {
                assert!(bright.get(0, col));
            }
        }
        assert_eq!(dark.occupied_count(), 128 * 4);
        assert_eq!(bright.occupied_count(), 127 * 4);
    }

    #[test]
    fn wide_template_is_centered_vertically() {
        let template = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, Luma([0])));
        let grid = embed_template(&template, Canvas::new(100, 100), Threshold::DarkerThan(128));
        // scaled to 100x50, offset 25 rows
        assert_eq!(grid.occupied_count(), 100 * 50);
        assert!(!grid.get(24, 50));
        assert!(grid.get(25, 50));
        assert!(grid.get(74, 0));
        assert!(!grid.get(75, 99));
    }

    #[test]
    fn tall_template_is_centered_horizontally() {
        let template = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 100, Luma([255])));
        let grid = embed_template(&template, Canvas::new(100, 100), Threshold::BrighterThan(128));
        assert_eq!(grid.occupied_count(), 50 * 100);
        assert!(!grid.get(50, 24));
        assert!(grid.get(50, 25));
        assert!(!grid.get(50, 75));
    }

    #[test]
    fn corrupt_template_falls_back_to_center_rect() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetStore::new(dir.path());
        std::fs::write(assets.template_path(TemplateId::ShanghaiMap), b"corrupted").unwrap();
        let canvas = Canvas::new(120, 80);
        let grid = template_mask(&assets, TemplateId::ShanghaiMap, canvas);
        assert_eq!(grid, OccupancyGrid::centered_rect(canvas));
    }
}
