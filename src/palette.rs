//! Colors, named themes and palette extraction.

use std::fmt;

use image::imageops::FilterType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::Error;

// =============================================================================
// Colors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b))
    }

    /// Hex notation (`#rrggbb` or `#rgb`) or a named color.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let name = value.trim().to_ascii_lowercase();
        Rgb::named(&name)
            .or_else(|| Rgb::from_hex(&name))
            .or_else(|| Rgb::from_short_hex(&name))
            .ok_or_else(|| Error::Input(format!("unrecognized color '{}'", value.trim())))
    }

    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, rgb)| *rgb)
    }

    fn from_short_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 3 || !hex.is_ascii() {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
        Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_skia(&self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// CSS4 color names plus the single-letter and `tab:` shorthands used by
/// plotting tools.
const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("aliceblue", Rgb::new(0xf0, 0xf8, 0xff)),
    ("antiquewhite", Rgb::new(0xfa, 0xeb, 0xd7)),
    ("aqua", Rgb::new(0x00, 0xff, 0xff)),
    ("aquamarine", Rgb::new(0x7f, 0xff, 0xd4)),
    ("azure", Rgb::new(0xf0, 0xff, 0xff)),
    ("beige", Rgb::new(0xf5, 0xf5, 0xdc)),
    ("bisque", Rgb::new(0xff, 0xe4, 0xc4)),
    ("black", Rgb::new(0x00, 0x00, 0x00)),
    ("blanchedalmond", Rgb::new(0xff, 0xeb, 0xcd)),
    ("blue", Rgb::new(0x00, 0x00, 0xff)),
    ("blueviolet", Rgb::new(0x8a, 0x2b, 0xe2)),
    ("brown", Rgb::new(0xa5, 0x2a, 0x2a)),
    ("burlywood", Rgb::new(0xde, 0xb8, 0x87)),
    ("cadetblue", Rgb::new(0x5f, 0x9e, 0xa0)),
    ("chartreuse", Rgb::new(0x7f, 0xff, 0x00)),
    ("chocolate", Rgb::new(0xd2, 0x69, 0x1e)),
    ("coral", Rgb::new(0xff, 0x7f, 0x50)),
    ("cornflowerblue", Rgb::new(0x64, 0x95, 0xed)),
    ("cornsilk", Rgb::new(0xff, 0xf8, 0xdc)),
    ("crimson", Rgb::new(0xdc, 0x14, 0x3c)),
    ("cyan", Rgb::new(0x00, 0xff, 0xff)),
    ("darkblue", Rgb::new(0x00, 0x00, 0x8b)),
    ("darkcyan", Rgb::new(0x00, 0x8b, 0x8b)),
    ("darkgoldenrod", Rgb::new(0xb8, 0x86, 0x0b)),
    ("darkgray", Rgb::new(0xa9, 0xa9, 0xa9)),
    ("darkgreen", Rgb::new(0x00, 0x64, 0x00)),
    ("darkgrey", Rgb::new(0xa9, 0xa9, 0xa9)),
    ("darkkhaki", Rgb::new(0xbd, 0xb7, 0x6b)),
    ("darkmagenta", Rgb::new(0x8b, 0x00, 0x8b)),
    ("darkolivegreen", Rgb::new(0x55, 0x6b, 0x2f)),
    ("darkorange", Rgb::new(0xff, 0x8c, 0x00)),
    ("darkorchid", Rgb::new(0x99, 0x32, 0xcc)),
    ("darkred", Rgb::new(0x8b, 0x00, 0x00)),
    ("darksalmon", Rgb::new(0xe9, 0x96, 0x7a)),
    ("darkseagreen", Rgb::new(0x8f, 0xbc, 0x8f)),
    ("darkslateblue", Rgb::new(0x48, 0x3d, 0x8b)),
    ("darkslategray", Rgb::new(0x2f, 0x4f, 0x4f)),
    ("darkslategrey", Rgb::new(0x2f, 0x4f, 0x4f)),
    ("darkturquoise", Rgb::new(0x00, 0xce, 0xd1)),
    ("darkviolet", Rgb::new(0x94, 0x00, 0xd3)),
    ("deeppink", Rgb::new(0xff, 0x14, 0x93)),
    ("deepskyblue", Rgb::new(0x00, 0xbf, 0xff)),
    ("dimgray", Rgb::new(0x69, 0x69, 0x69)),
    ("dimgrey", Rgb::new(0x69, 0x69, 0x69)),
    ("dodgerblue", Rgb::new(0x1e, 0x90, 0xff)),
    ("firebrick", Rgb::new(0xb2, 0x22, 0x22)),
    ("floralwhite", Rgb::new(0xff, 0xfa, 0xf0)),
    ("forestgreen", Rgb::new(0x22, 0x8b, 0x22)),
    ("fuchsia", Rgb::new(0xff, 0x00, 0xff)),
    ("gainsboro", Rgb::new(0xdc, 0xdc, 0xdc)),
    ("ghostwhite", Rgb::new(0xf8, 0xf8, 0xff)),
    ("gold", Rgb::new(0xff, 0xd7, 0x00)),
    ("goldenrod", Rgb::new(0xda, 0xa5, 0x20)),
    ("gray", Rgb::new(0x80, 0x80, 0x80)),
    ("green", Rgb::new(0x00, 0x80, 0x00)),
    ("greenyellow", Rgb::new(0xad, 0xff, 0x2f)),
    ("grey", Rgb::new(0x80, 0x80, 0x80)),
    ("honeydew", Rgb::new(0xf0, 0xff, 0xf0)),
    ("hotpink", Rgb::new(0xff, 0x69, 0xb4)),
    ("indianred", Rgb::new(0xcd, 0x5c, 0x5c)),
    ("indigo", Rgb::new(0x4b, 0x00, 0x82)),
    ("ivory", Rgb::new(0xff, 0xff, 0xf0)),
    ("khaki", Rgb::new(0xf0, 0xe6, 0x8c)),
    ("lavender", Rgb::new(0xe6, 0xe6, 0xfa)),
    ("lavenderblush", Rgb::new(0xff, 0xf0, 0xf5)),
    ("lawngreen", Rgb::new(0x7c, 0xfc, 0x00)),
    ("lemonchiffon", Rgb::new(0xff, 0xfa, 0xcd)),
    ("lightblue", Rgb::new(0xad, 0xd8, 0xe6)),
    ("lightcoral", Rgb::new(0xf0, 0x80, 0x80)),
    ("lightcyan", Rgb::new(0xe0, 0xff, 0xff)),
    ("lightgoldenrodyellow", Rgb::new(0xfa, 0xfa, 0xd2)),
    ("lightgray", Rgb::new(0xd3, 0xd3, 0xd3)),
    ("lightgreen", Rgb::new(0x90, 0xee, 0x90)),
    ("lightgrey", Rgb::new(0xd3, 0xd3, 0xd3)),
    ("lightpink", Rgb::new(0xff, 0xb6, 0xc1)),
    ("lightsalmon", Rgb::new(0xff, 0xa0, 0x7a)),
    ("lightseagreen", Rgb::new(0x20, 0xb2, 0xaa)),
    ("lightskyblue", Rgb::new(0x87, 0xce, 0xfa)),
    ("lightslategray", Rgb::new(0x77, 0x88, 0x99)),
    ("lightslategrey", Rgb::new(0x77, 0x88, 0x99)),
    ("lightsteelblue", Rgb::new(0xb0, 0xc4, 0xde)),
    ("lightyellow", Rgb::new(0xff, 0xff, 0xe0)),
    ("lime", Rgb::new(0x00, 0xff, 0x00)),
    ("limegreen", Rgb::new(0x32, 0xcd, 0x32)),
    ("linen", Rgb::new(0xfa, 0xf0, 0xe6)),
    ("magenta", Rgb::new(0xff, 0x00, 0xff)),
    ("maroon", Rgb::new(0x80, 0x00, 0x00)),
    ("mediumaquamarine", Rgb::new(0x66, 0xcd, 0xaa)),
    ("mediumblue", Rgb::new(0x00, 0x00, 0xcd)),
    ("mediumorchid", Rgb::new(0xba, 0x55, 0xd3)),
    ("mediumpurple", Rgb::new(0x93, 0x70, 0xdb)),
    ("mediumseagreen", Rgb::new(0x3c, 0xb3, 0x71)),
    ("mediumslateblue", Rgb::new(0x7b, 0x68, 0xee)),
    ("mediumspringgreen", Rgb::new(0x00, 0xfa, 0x9a)),
    ("mediumturquoise", Rgb::new(0x48, 0xd1, 0xcc)),
    ("mediumvioletred", Rgb::new(0xc7, 0x15, 0x85)),
    ("midnightblue", Rgb::new(0x19, 0x19, 0x70)),
    ("mintcream", Rgb::new(0xf5, 0xff, 0xfa)),
    ("mistyrose", Rgb::new(0xff, 0xe4, 0xe1)),
    ("moccasin", Rgb::new(0xff, 0xe4, 0xb5)),
    ("navajowhite", Rgb::new(0xff, 0xde, 0xad)),
    ("navy", Rgb::new(0x00, 0x00, 0x80)),
    ("oldlace", Rgb::new(0xfd, 0xf5, 0xe6)),
    ("olive", Rgb::new(0x80, 0x80, 0x00)),
    ("olivedrab", Rgb::new(0x6b, 0x8e, 0x23)),
    ("orange", Rgb::new(0xff, 0xa5, 0x00)),
    ("orangered", Rgb::new(0xff, 0x45, 0x00)),
    ("orchid", Rgb::new(0xda, 0x70, 0xd6)),
    ("palegoldenrod", Rgb::new(0xee, 0xe8, 0xaa)),
    ("palegreen", Rgb::new(0x98, 0xfb, 0x98)),
    ("paleturquoise", Rgb::new(0xaf, 0xee, 0xee)),
    ("palevioletred", Rgb::new(0xdb, 0x70, 0x93)),
    ("papayawhip", Rgb::new(0xff, 0xef, 0xd5)),
    ("peachpuff", Rgb::new(0xff, 0xda, 0xb9)),
    ("peru", Rgb::new(0xcd, 0x85, 0x3f)),
    ("pink", Rgb::new(0xff, 0xc0, 0xcb)),
    ("plum", Rgb::new(0xdd, 0xa0, 0xdd)),
    ("powderblue", Rgb::new(0xb0, 0xe0, 0xe6)),
    ("purple", Rgb::new(0x80, 0x00, 0x80)),
    ("rebeccapurple", Rgb::new(0x66, 0x33, 0x99)),
    ("red", Rgb::new(0xff, 0x00, 0x00)),
    ("rosybrown", Rgb::new(0xbc, 0x8f, 0x8f)),
    ("royalblue", Rgb::new(0x41, 0x69, 0xe1)),
    ("saddlebrown", Rgb::new(0x8b, 0x45, 0x13)),
    ("salmon", Rgb::new(0xfa, 0x80, 0x72)),
    ("sandybrown", Rgb::new(0xf4, 0xa4, 0x60)),
    ("seagreen", Rgb::new(0x2e, 0x8b, 0x57)),
    ("seashell", Rgb::new(0xff, 0xf5, 0xee)),
    ("sienna", Rgb::new(0xa0, 0x52, 0x2d)),
    ("silver", Rgb::new(0xc0, 0xc0, 0xc0)),
    ("skyblue", Rgb::new(0x87, 0xce, 0xeb)),
    ("slateblue", Rgb::new(0x6a, 0x5a, 0xcd)),
    ("slategray", Rgb::new(0x70, 0x80, 0x90)),
    ("slategrey", Rgb::new(0x70, 0x80, 0x90)),
    ("snow", Rgb::new(0xff, 0xfa, 0xfa)),
    ("springgreen", Rgb::new(0x00, 0xff, 0x7f)),
    ("steelblue", Rgb::new(0x46, 0x82, 0xb4)),
    ("tan", Rgb::new(0xd2, 0xb4, 0x8c)),
    ("teal", Rgb::new(0x00, 0x80, 0x80)),
    ("thistle", Rgb::new(0xd8, 0xbf, 0xd8)),
    ("tomato", Rgb::new(0xff, 0x63, 0x47)),
    ("turquoise", Rgb::new(0x40, 0xe0, 0xd0)),
    ("violet", Rgb::new(0xee, 0x82, 0xee)),
    ("wheat", Rgb::new(0xf5, 0xde, 0xb3)),
    ("white", Rgb::new(0xff, 0xff, 0xff)),
    ("whitesmoke", Rgb::new(0xf5, 0xf5, 0xf5)),
    ("yellow", Rgb::new(0xff, 0xff, 0x00)),
    ("yellowgreen", Rgb::new(0x9a, 0xcd, 0x32)),
    ("b", Rgb::new(0x00, 0x00, 0xff)),
    ("g", Rgb::new(0x00, 0x80, 0x00)),
    ("r", Rgb::new(0xff, 0x00, 0x00)),
    ("c", Rgb::new(0x00, 0xbf, 0xbf)),
    ("m", Rgb::new(0xbf, 0x00, 0xbf)),
    ("y", Rgb::new(0xbf, 0xbf, 0x00)),
    ("k", Rgb::new(0x00, 0x00, 0x00)),
    ("w", Rgb::new(0xff, 0xff, 0xff)),
    ("tab:blue", Rgb::new(0x1f, 0x77, 0xb4)),
    ("tab:orange", Rgb::new(0xff, 0x7f, 0x0e)),
    ("tab:green", Rgb::new(0x2c, 0xa0, 0x2c)),
    ("tab:red", Rgb::new(0xd6, 0x27, 0x28)),
    ("tab:purple", Rgb::new(0x94, 0x67, 0xbd)),
    ("tab:brown", Rgb::new(0x8c, 0x56, 0x4b)),
    ("tab:pink", Rgb::new(0xe3, 0x77, 0xc2)),
    ("tab:gray", Rgb::new(0x7f, 0x7f, 0x7f)),
    ("tab:grey", Rgb::new(0x7f, 0x7f, 0x7f)),
    ("tab:olive", Rgb::new(0xbc, 0xbd, 0x22)),
    ("tab:cyan", Rgb::new(0x17, 0xbe, 0xcf)),
];

fn hex_list(colors: &[&str]) -> Vec<Rgb> {
    colors.iter().filter_map(|c| Rgb::from_hex(c)).collect()
}

// =============================================================================
// Named Themes
// =============================================================================

/// Named color themes offered to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorTheme {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
    Twilight,
    Rainbow,
    Ocean,
    Sunset,
    Forest,
    Fire,
    Pastel,
    Dark,
    Neon,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 14] = [
        ColorTheme::Viridis,
        ColorTheme::Plasma,
        ColorTheme::Inferno,
        ColorTheme::Magma,
        ColorTheme::Cividis,
        ColorTheme::Twilight,
        ColorTheme::Rainbow,
        ColorTheme::Ocean,
        ColorTheme::Sunset,
        ColorTheme::Forest,
        ColorTheme::Fire,
        ColorTheme::Pastel,
        ColorTheme::Dark,
        ColorTheme::Neon,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ColorTheme::Viridis => "viridis",
            ColorTheme::Plasma => "plasma",
            ColorTheme::Inferno => "inferno",
            ColorTheme::Magma => "magma",
            ColorTheme::Cividis => "cividis",
            ColorTheme::Twilight => "twilight",
            ColorTheme::Rainbow => "rainbow",
            ColorTheme::Ocean => "ocean",
            ColorTheme::Sunset => "sunset",
            ColorTheme::Forest => "forest",
            ColorTheme::Fire => "fire",
            ColorTheme::Pastel => "pastel",
            ColorTheme::Dark => "dark",
            ColorTheme::Neon => "neon",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorTheme::Viridis => "Blue-green",
            ColorTheme::Plasma => "Purple-red",
            ColorTheme::Inferno => "Yellow-orange-red",
            ColorTheme::Magma => "Purple-black",
            ColorTheme::Cividis => "Blue-yellow",
            ColorTheme::Twilight => "Purple-blue",
            ColorTheme::Rainbow => "Rainbow",
            ColorTheme::Ocean => "Ocean",
            ColorTheme::Sunset => "Sunset",
            ColorTheme::Forest => "Forest",
            ColorTheme::Fire => "Fire",
            ColorTheme::Pastel => "Pastel",
            ColorTheme::Dark => "Dark",
            ColorTheme::Neon => "Neon",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.id().eq_ignore_ascii_case(id))
    }

    /// Representative stops the built-in layout engine samples from.
    pub fn colors(&self) -> Vec<Rgb> {
        match self {
            ColorTheme::Viridis => {
                hex_list(&["#440154", "#414487", "#2a788e", "#22a884", "#7ad151", "#fde725"])
            }
            ColorTheme::Plasma => {
                hex_list(&["#0d0887", "#6a00a8", "#b12a90", "#e16462", "#fca636", "#f0f921"])
            }
            ColorTheme::Inferno => {
                hex_list(&["#1b0c41", "#4a0c6b", "#932667", "#dd513a", "#fca50a", "#f6d746"])
            }
            ColorTheme::Magma => {
                hex_list(&["#1c1044", "#4f127b", "#8c2981", "#de4968", "#fe9f6d", "#fcfdbf"])
            }
            ColorTheme::Cividis => {
                hex_list(&["#00224e", "#35456c", "#666970", "#948e77", "#c8b866", "#fee838"])
            }
            ColorTheme::Twilight => {
                hex_list(&["#5e43a5", "#6276ba", "#7ea7c4", "#b9c8d1", "#a44a83", "#6b1f5d"])
            }
            ColorTheme::Rainbow => {
                hex_list(&["#e63946", "#f4a261", "#e9c46a", "#2a9d8f", "#457b9d", "#7b2cbf"])
            }
            ColorTheme::Ocean => hex_list(&["#264653", "#287271", "#2a9d8f", "#8ab17d", "#e9c46a"]),
            ColorTheme::Sunset => hex_list(&["#f94144", "#f3722c", "#f8961e", "#f9844a", "#f9c74f"]),
            ColorTheme::Forest => hex_list(&["#2d6a4f", "#40916c", "#52b788", "#74c69d", "#95d5b2"]),
            ColorTheme::Fire => hex_list(&["#6a040f", "#9d0208", "#d00000", "#dc2f02", "#e85d04", "#faa307"]),
            ColorTheme::Pastel => hex_list(&["#ffadad", "#ffd6a5", "#fdffb6", "#caffbf", "#9bf6ff", "#bdb2ff"]),
            ColorTheme::Dark => hex_list(&["#212529", "#343a40", "#495057", "#6c757d", "#3d405b"]),
            ColorTheme::Neon => hex_list(&["#ff00ff", "#00ffff", "#39ff14", "#ff073a", "#fe019a", "#ffff33"]),
        }
    }
}

// =============================================================================
// Color Source
// =============================================================================

/// Where the layout engine draws term colors from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSource {
    /// Fixed list, e.g. extracted from a reference image.
    Palette(Vec<Rgb>),
    Theme(ColorTheme),
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::Theme(ColorTheme::default())
    }
}

impl ColorSource {
    /// Concrete colors; never empty.
    pub fn colors(&self) -> Vec<Rgb> {
        match self {
            ColorSource::Palette(colors) if !colors.is_empty() => colors.clone(),
            ColorSource::Palette(_) => ColorTheme::default().colors(),
            ColorSource::Theme(theme) => theme.colors(),
        }
    }
}

// =============================================================================
// Palette Extraction
// =============================================================================

/// Number of colors extracted when the caller does not ask for a count.
pub const DEFAULT_COLOR_COUNT: usize = 5;

/// Returned whenever extraction cannot produce a palette.
pub const FALLBACK_PALETTE: [&str; 5] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd"];

/// Working resolution the reference image is reduced to before clustering.
const WORK_SIZE: u32 = 150;
const KMEANS_SEED: u64 = 42;
const KMEANS_MAX_ITERATIONS: usize = 300;
/// Centroid movement (squared, summed) below which clustering stops early.
const KMEANS_TOLERANCE: f32 = 1e-4;

pub fn fallback_palette() -> Vec<Rgb> {
    hex_list(&FALLBACK_PALETTE)
}

/// Clusters the image's pixels into `k` representative colors.
///
/// Identical input bytes and `k` always give the same ordered palette.
pub fn extract_palette(image_bytes: &[u8], k: usize) -> Result<Vec<Rgb>, Error> {
    if k == 0 {
        return Err(Error::Input("palette size must be positive".into()));
    }
    let img = image::load_from_memory(image_bytes).map_err(|e| Error::Decode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let small = image::imageops::resize(&rgb, WORK_SIZE, WORK_SIZE, FilterType::Triangle);

    let pixels: Vec<[f32; 3]> = small
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();

    let centroids = kmeans(&pixels, k, KMEANS_MAX_ITERATIONS);
    if centroids.len() != k {
        return Err(Error::Render(format!(
            "clustering produced {} of {} colors",
            centroids.len(),
            k
        )));
    }

    Ok(centroids
        .into_iter()
        .map(|c| {
            Rgb::new(
                c[0].clamp(0.0, 255.0) as u8,
                c[1].clamp(0.0, 255.0) as u8,
                c[2].clamp(0.0, 255.0) as u8,
            )
        })
        .collect())
}

/// [`extract_palette`] that degrades to [`FALLBACK_PALETTE`] instead of failing.
pub fn extract_palette_or_fallback(image_bytes: &[u8], k: usize) -> Vec<Rgb> {
    match extract_palette(image_bytes, k) {
        Ok(colors) => {
            debug!(count = colors.len(), "extracted palette from reference image");
            colors
        }
        Err(err) => {
            warn!(error = %err, "palette extraction failed, using fallback palette");
            fallback_palette()
        }
    }
}

pub fn to_hex_list(colors: &[Rgb]) -> Vec<String> {
    colors.iter().map(Rgb::to_hex).collect()
}

fn dist_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let (dr, dg, db) = (a[0] - b[0], a[1] - b[1], a[2] - b[2]);
    dr * dr + dg * dg + db * db
}

fn nearest(p: &[f32; 3], centroids: &[[f32; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist_sq(p, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// k-means++ seeding from a fixed-seed RNG, then Lloyd iterations capped at
/// `max_iterations`.
fn kmeans(pixels: &[[f32; 3]], k: usize, max_iterations: usize) -> Vec<[f32; 3]> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(KMEANS_SEED);

    let mut centroids = Vec::with_capacity(k);
    centroids.push(pixels[rng.random_range(0..pixels.len())]);

    let mut distances = vec![f32::MAX; pixels.len()];
    while centroids.len() < k {
        let last = centroids[centroids.len() - 1];
        for (d, p) in distances.iter_mut().zip(pixels) {
            *d = d.min(dist_sq(p, &last));
        }

        let total: f64 = distances.iter().map(|&d| d as f64).sum();
        let next = if total <= 0.0 {
            // every pixel already sits on a centroid
            rng.random_range(0..pixels.len())
        } else {
            let threshold = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|&d| {
                    cumulative += d as f64;
                    cumulative >= threshold
                })
                .unwrap_or(pixels.len() - 1)
        };
        centroids.push(pixels[next]);
    }

    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];
    for _ in 0..max_iterations {
        sums.fill([0.0; 3]);
        counts.fill(0);

        for p in pixels {
            let c = nearest(p, &centroids);
            counts[c] += 1;
            for ch in 0..3 {
                sums[c][ch] += p[ch] as f64;
            }
        }

        let mut shift = 0.0f32;
        for i in 0..k {
            // empty clusters keep their previous centroid
            if counts[i] == 0 {
                continue;
            }
            let n = counts[i] as f64;
            let updated = [
                (sums[i][0] / n) as f32,
                (sums[i][1] / n) as f32,
                (sums[i][2] / n) as f32,
            ];
            shift += dist_sq(&centroids[i], &updated);
            centroids[i] = updated;
        }

        if shift <= KMEANS_TOLERANCE {
            break;
        }
    }

    centroids
}
