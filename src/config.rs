//! Configuration loaded from a JSON file.
//!
//! Every field has a hard-coded default, so a missing or malformed config
//! file degrades to the built-in settings instead of failing the run.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Pixel format of the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PixelMode {
    #[serde(rename = "RGBA")]
    Rgba,
    #[serde(rename = "RGB")]
    Rgb,
}

/// How words are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Colormap,
    CustomColors,
    ImageColors,
}

/// Hue/saturation/lightness settings for [`ColorMode::CustomColors`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CustomColors {
    /// Fixed hue in degrees, 0-360.
    pub hue: f32,
    /// Fixed saturation in percent, 0-100.
    pub saturation: f32,
    /// Lightness range `[lo, hi]` in percent, sampled uniformly per word.
    pub lightness_range: [f32; 2],
}

impl Default for CustomColors {
    fn default() -> Self {
        Self {
            hue: 30.0,
            saturation: 80.0,
            lightness_range: [40.0, 80.0],
        }
    }
}

/// Per-tier frequency multipliers for the smart-sizing rescaler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmartSizing {
    pub extra_large_multiplier: f64,
    pub large_multiplier: f64,
    pub medium_multiplier: f64,
    pub small_multiplier: f64,
}

impl Default for SmartSizing {
    fn default() -> Self {
        Self {
            extra_large_multiplier: 8.0,
            large_multiplier: 6.0,
            medium_multiplier: 4.0,
            small_multiplier: 2.0,
        }
    }
}

/// Full pipeline configuration. Loaded once, then threaded through the
/// pipeline by value; nothing here is process-global.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_file: PathBuf,
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub mask_path: Option<PathBuf>,
    pub max_words: usize,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub relative_scaling: f32,
    pub prefer_horizontal: f32,
    pub random_state: u64,
    pub collocations: bool,
    pub repeat: bool,
    pub colormap: String,
    pub mode: PixelMode,
    pub dpi: u32,
    pub color_mode: ColorMode,
    pub custom_colors: CustomColors,
    pub stopwords: HashSet<String>,
    pub font_paths: Vec<PathBuf>,
    pub smart_sizing: SmartSizing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("wordcloud.png"),
            width: 800,
            height: 600,
            background_color: "white".into(),
            mask_path: None,
            max_words: 1000,
            min_font_size: 8.0,
            max_font_size: 300.0,
            relative_scaling: 1.0,
            prefer_horizontal: 0.3,
            random_state: 42,
            collocations: false,
            repeat: true,
            colormap: "plasma".into(),
            mode: PixelMode::Rgba,
            dpi: 300,
            color_mode: ColorMode::Colormap,
            custom_colors: CustomColors::default(),
            stopwords: HashSet::new(),
            font_paths: Vec::new(),
            smart_sizing: SmartSizing::default(),
        }
    }
}

impl Config {
    /// Read a config file, falling back to defaults on any failure.
    ///
    /// A missing file and malformed JSON are both non-fatal: a warning is
    /// logged and the defaults are used. This never returns an error.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "config file {} not found, using default settings: {e}",
                    path.display()
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("error parsing config file {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtins() {
        let c = Config::default();
        assert_eq!(c.width, 800);
        assert_eq!(c.height, 600);
        assert_eq!(c.background_color, "white");
        assert_eq!(c.max_words, 1000);
        assert_eq!(c.random_state, 42);
        assert_eq!(c.colormap, "plasma");
        assert_eq!(c.color_mode, ColorMode::Colormap);
        assert_eq!(c.mode, PixelMode::Rgba);
        assert!(c.mask_path.is_none());
        assert!(c.stopwords.is_empty());
        assert_eq!(c.smart_sizing.extra_large_multiplier, 8.0);
        assert_eq!(c.custom_colors.lightness_range, [40.0, 80.0]);
    }

    #[test]
    fn partial_json_keeps_defaults_elsewhere() {
        let c: Config = serde_json::from_str(r#"{"width": 1920, "colormap": "viridis"}"#).unwrap();
        assert_eq!(c.width, 1920);
        assert_eq!(c.colormap, "viridis");
        assert_eq!(c.height, 600);
        assert_eq!(c.dpi, 300);
    }

    #[test]
    fn nested_sections_parse() {
        let c: Config = serde_json::from_str(
            r#"{
                "color_mode": "custom_colors",
                "custom_colors": {"hue": 200, "lightness_range": [30, 60]},
                "smart_sizing": {"extra_large_multiplier": 10},
                "stopwords": ["و", "از"],
                "mode": "RGB"
            }"#,
        )
        .unwrap();
        assert_eq!(c.color_mode, ColorMode::CustomColors);
        assert_eq!(c.custom_colors.hue, 200.0);
        assert_eq!(c.custom_colors.saturation, 80.0);
        assert_eq!(c.custom_colors.lightness_range, [30.0, 60.0]);
        assert_eq!(c.smart_sizing.extra_large_multiplier, 10.0);
        assert_eq!(c.smart_sizing.small_multiplier, 2.0);
        assert!(c.stopwords.contains("و"));
        assert_eq!(c.mode, PixelMode::Rgb);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let c = Config::load(Path::new("/definitely/not/here/config.json"));
        assert_eq!(c.width, 800);
        assert_eq!(c.output_file, PathBuf::from("wordcloud.png"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let c: Config = serde_json::from_str(r#"{"width": 640, "no_such_key": true}"#).unwrap();
        assert_eq!(c.width, 640);
    }
}
