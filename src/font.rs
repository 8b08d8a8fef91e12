//! Font catalogue and platform specific path resolution.

use std::path::{Path, PathBuf};

/// Selectable font families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontId {
    #[default]
    Default,
    SimHei,
    SimSun,
    MsYaHei,
    SimKai,
    SimFang,
    SimLi,
    SimYou,
}

impl FontId {
    pub const ALL: [FontId; 8] = [
        FontId::Default,
        FontId::SimHei,
        FontId::SimSun,
        FontId::MsYaHei,
        FontId::SimKai,
        FontId::SimFang,
        FontId::SimLi,
        FontId::SimYou,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FontId::Default => "default",
            FontId::SimHei => "simhei",
            FontId::SimSun => "simsun",
            FontId::MsYaHei => "msyh",
            FontId::SimKai => "simkai",
            FontId::SimFang => "simfang",
            FontId::SimLi => "simli",
            FontId::SimYou => "simyou",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FontId::Default => "Default",
            FontId::SimHei => "Hei",
            FontId::SimSun => "Song",
            FontId::MsYaHei => "YaHei",
            FontId::SimKai => "Kai",
            FontId::SimFang => "FangSong",
            FontId::SimLi => "Li",
            FontId::SimYou => "YouYuan",
        }
    }

    /// Unknown ids resolve to [`FontId::Default`].
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.id().eq_ignore_ascii_case(id))
            .unwrap_or_default()
    }

    pub(crate) fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            _ => Platform::Linux,
        }
    }

    /// Platform file backing a named font, if the platform has a mapping.
    pub fn font_path(&self, font: FontId) -> Option<&'static str> {
        let path = match (self, font) {
            (_, FontId::Default) => return None,
            (Platform::Windows, FontId::SimHei) => "C:/Windows/Fonts/simhei.ttf",
            (Platform::Windows, FontId::SimSun) => "C:/Windows/Fonts/simsun.ttc",
            (Platform::Windows, FontId::MsYaHei) => "C:/Windows/Fonts/msyh.ttc",
            (Platform::Windows, FontId::SimKai) => "C:/Windows/Fonts/simkai.ttf",
            (Platform::Windows, FontId::SimFang) => "C:/Windows/Fonts/simfang.ttf",
            (Platform::Windows, FontId::SimLi) => "C:/Windows/Fonts/simli.ttf",
            (Platform::Windows, FontId::SimYou) => "C:/Windows/Fonts/simyou.ttf",
            (Platform::MacOs, FontId::SimHei) => "/System/Library/Fonts/STHeiti.ttc",
            (Platform::MacOs, FontId::SimSun) => "/System/Library/Fonts/STSong.ttc",
            (Platform::MacOs, FontId::MsYaHei) => "/System/Library/Fonts/PingFang.ttc",
            (Platform::MacOs, FontId::SimKai) => "/System/Library/Fonts/STKaiti.ttc",
            (Platform::MacOs, FontId::SimFang) => "/System/Library/Fonts/STFangsong.ttc",
            (Platform::MacOs, FontId::SimLi) => "/System/Library/Fonts/STLiti.ttc",
            (Platform::MacOs, FontId::SimYou) => "/System/Library/Fonts/STYuanti.ttc",
            (Platform::Linux, FontId::SimHei) => "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            (Platform::Linux, FontId::SimSun) => "/usr/share/fonts/truetype/arphic/uming.ttc",
            (Platform::Linux, FontId::MsYaHei) => "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
            (Platform::Linux, FontId::SimKai) => "/usr/share/fonts/truetype/arphic/ukai.ttc",
            (Platform::Linux, FontId::SimFang) => "/usr/share/fonts/truetype/arphic/bsmi00lp.ttf",
            (Platform::Linux, FontId::SimLi) => "/usr/share/fonts/truetype/arphic/gbsn00lp.ttf",
            (Platform::Linux, FontId::SimYou) => "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
        };
        Some(path)
    }

    /// CJK capable faces tried in order when the named font is unavailable.
    pub fn fallback_fonts(&self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &[
                "C:/Windows/Fonts/msyh.ttc",
                "C:/Windows/Fonts/simhei.ttf",
                "C:/Windows/Fonts/simsun.ttc",
                "C:/Windows/Fonts/simkai.ttf",
                "C:/Windows/Fonts/simfang.ttf",
                "C:/Windows/Fonts/simli.ttf",
                "C:/Windows/Fonts/simyou.ttf",
            ],
            Platform::MacOs => &[
                "/System/Library/Fonts/PingFang.ttc",
                "/System/Library/Fonts/STHeiti.ttc",
                "/System/Library/Fonts/STSong.ttc",
                "/System/Library/Fonts/STKaiti.ttc",
                "/System/Library/Fonts/STFangsong.ttc",
            ],
            Platform::Linux => &[
                "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
                "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
                "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
                "/usr/share/fonts/truetype/arphic/uming.ttc",
                "/usr/share/fonts/truetype/arphic/ukai.ttc",
            ],
        }
    }
}

/// Resolves `font` to an existing file, falling back through the platform's
/// CJK list. `None` leaves the choice to the layout engine.
pub fn resolve_font(font: FontId, platform: Platform) -> Option<PathBuf> {
    resolve_with(font, platform, |p| p.exists())
}

fn resolve_with(font: FontId, platform: Platform, exists: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    platform
        .font_path(font)
        .into_iter()
        .chain(platform.fallback_fonts().iter().copied())
        .map(Path::new)
        .find(|p| exists(p))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_font_is_default() {
        assert_eq!(FontId::from_id("comic-sans"), FontId::Default);
        assert_eq!(FontId::from_id("MSYH"), FontId::MsYaHei);
    }

    #[test]
    fn named_font_preferred_when_present() {
        let found = resolve_with(FontId::SimKai, Platform::Linux, |_| true).unwrap();
        assert_eq!(found, PathBuf::from("/usr/share/fonts/truetype/arphic/ukai.ttc"));
    }

    #[test]
    fn missing_named_font_uses_fallback_list() {
        let found = resolve_with(FontId::SimKai, Platform::MacOs, |p| {
            p.ends_with("STSong.ttc")
        });
        assert_eq!(found, Some(PathBuf::from("/System/Library/Fonts/STSong.ttc")));
    }

    #[test]
    fn default_font_goes_straight_to_fallbacks() {
        let found = resolve_with(FontId::Default, Platform::Windows, |_| true).unwrap();
        assert_eq!(found, PathBuf::from("C:/Windows/Fonts/msyh.ttc"));
        assert_eq!(resolve_with(FontId::Default, Platform::Linux, |_| false), None);
    }
}
