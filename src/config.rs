use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the built-in layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Upper bound on the number of terms placed.
    pub max_words: usize,
    /// How strongly weight differences translate into size differences
    /// (0 = rank only, 1 = proportional).
    pub relative_scaling: f32,
    pub min_font_size: f32,
    /// Largest font size; `None` derives it from the canvas height.
    pub max_font_size: Option<f32>,
    /// Shrink step applied when a term does not fit.
    pub font_step: f32,
    pub padding: u32,
    pub word_spacing: f32,
    /// Rotation angles in degrees, picked at random per term.
    pub angles: Vec<f32>,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Positions tried along the spiral before shrinking a term.
    pub max_attempts: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_words: 100,
            relative_scaling: 0.5,
            min_font_size: 4.0,
            max_font_size: None,
            font_step: 2.0,
            padding: 1,
            word_spacing: 2.0,
            angles: vec![0.0, 0.0, 0.0, 90.0],
            seed: Some(42),
            max_attempts: 10000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the template images.
    pub asset_dir: PathBuf,
    /// Directory persisted renders are written to.
    pub output_dir: PathBuf,
    pub default_width: u32,
    pub default_height: u32,
    pub background: String,
    /// Colors extracted from a reference image.
    pub palette_size: usize,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("output"),
            default_width: 800,
            default_height: 400,
            background: "white".to_string(),
            palette_size: crate::palette::DEFAULT_COLOR_COUNT,
            layout: LayoutConfig::default(),
        }
    }
}

/// Reads a JSON config file over the defaults. Missing keys keep their
/// default value; no path yields [`Config::default`].
pub fn load_config(path: Option<&Path>) -> Result<Config, crate::Error> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| crate::Error::Input(format!("config {}: {}", path.display(), e)))?;
    Ok(config)
}
