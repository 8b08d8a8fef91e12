//! Process-wide read-only resources: template images and resolved fonts.
//!
//! Each entry is initialized at most once, on first use, and never replaced.
//! A template that fails to load stays failed for the lifetime of the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::font::{resolve_font, FontId, Platform};
use crate::shape::TemplateId;
use crate::Error;

pub struct AssetStore {
    dir: PathBuf,
    platform: Platform,
    templates: [OnceCell<Option<Arc<DynamicImage>>>; 2],
    fonts: [OnceCell<Option<PathBuf>>; 8],
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_platform(dir, Platform::current())
    }

    pub fn with_platform(dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            dir: dir.into(),
            platform,
            templates: Default::default(),
            fonts: Default::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn template_path(&self, template: TemplateId) -> PathBuf {
        self.dir.join(template.file_name())
    }

    /// Decoded template image, or `None` when it is missing or corrupt.
    pub fn template(&self, template: TemplateId) -> Option<Arc<DynamicImage>> {
        self.templates[template.index()]
            .get_or_init(|| match self.load_template(template) {
                Ok(img) => {
                    debug!(
                        template = template.id(),
                        width = img.width(),
                        height = img.height(),
                        "loaded template"
                    );
                    Some(Arc::new(img))
                }
                Err(err) => {
                    warn!(template = template.id(), error = %err, "template unavailable");
                    None
                }
            })
            .clone()
    }

    fn load_template(&self, template: TemplateId) -> Result<DynamicImage, Error> {
        let bytes = std::fs::read(self.template_path(template))?;
        image::load_from_memory(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Font file for `font` on this platform, resolved once per font id.
    pub fn font_path(&self, font: FontId) -> Option<&Path> {
        self.fonts[font.index()]
            .get_or_init(|| {
                let path = resolve_font(font, self.platform);
                if path.is_none() {
                    warn!(font = font.id(), "no font file found, layout engine default applies");
                }
                path
            })
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};

    #[test]
    fn missing_template_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        assert!(store.template(TemplateId::ChinaMap).is_none());
    }

    #[test]
    fn template_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let img = GrayImage::from_pixel(4, 2, Luma([0]));
        img.save_with_format(store.template_path(TemplateId::ShanghaiMap), ImageFormat::Png)
            .unwrap();

        let first = store.template(TemplateId::ShanghaiMap).unwrap();
        // replacing the file afterwards has no effect
        std::fs::write(store.template_path(TemplateId::ShanghaiMap), b"garbage").unwrap();
        let second = store.template(TemplateId::ShanghaiMap).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((second.width(), second.height()), (4, 2));
    }

    #[test]
    fn corrupt_template_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        std::fs::write(store.template_path(TemplateId::ChinaMap), b"\x89PNG broken").unwrap();
        assert!(store.template(TemplateId::ChinaMap).is_none());
    }
}
