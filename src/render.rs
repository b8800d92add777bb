//! Output assembly: placed words become an SVG document, which resvg
//! renders into a pixmap for PNG export. Going through SVG is what gets
//! Persian glyphs shaped and joined correctly.

use crate::config::PixelMode;
use crate::layout::PlacedWord;
use crate::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Color, Pixmap, Transform};
use tracing::{info, warn};
use usvg::fontdb;

/// Reference resolution for the dpi-to-scale mapping in [`WordCloud::save`].
const BASE_DPI: f32 = 96.0;

/// A rendered word cloud, ready for export.
pub struct WordCloud {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub mode: PixelMode,
    pub words: Vec<PlacedWord>,
    pub(crate) font_data: Vec<u8>,
    pub(crate) font_family: String,
}

impl WordCloud {
    fn is_transparent(&self) -> bool {
        self.mode == PixelMode::Rgba
            && matches!(
                self.background.to_ascii_lowercase().as_str(),
                "transparent" | "none" | ""
            )
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(8192);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        ));

        if !self.is_transparent() {
            svg.push_str(&format!(
                r#"<rect width="100%" height="100%" fill="{}"/>"#,
                escape_xml(&self.background)
            ));
        }

        svg.push_str(&format!(
            r#"<style>text{{font-family:'{}',sans-serif}}</style>"#,
            escape_xml(&self.font_family)
        ));

        for word in &self.words {
            let rotate = if word.vertical {
                format!(r#" transform="rotate(90 {:.1} {:.1})""#, word.x, word.y)
            } else {
                String::new()
            };
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" fill="{}" font-size="{:.1}"{}>{}</text>"#,
                word.x,
                word.y,
                word.color,
                word.font_size,
                rotate,
                escape_xml(&word.text)
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Render to PNG bytes at the given scale factor.
    pub fn to_png(&self, scale: f32) -> Result<Vec<u8>, Error> {
        let svg_content = self.to_svg();
        let mut db = fontdb::Database::new();
        db.load_font_source(fontdb::Source::Binary(Arc::new(self.font_data.clone())));

        let options = usvg::Options {
            font_family: self.font_family.clone(),
            fontdb: Arc::new(db),
            ..Default::default()
        };
        let tree =
            usvg::Tree::from_str(&svg_content, &options).map_err(|e| Error::Svg(e.to_string()))?;

        let size = tree.size().to_int_size();
        let out_width = ((size.width() as f32 * scale).max(1.0)) as u32;
        let out_height = ((size.height() as f32 * scale).max(1.0)) as u32;
        let mut pixmap = Pixmap::new(out_width, out_height)
            .ok_or_else(|| Error::Render("failed to create pixel buffer".into()))?;

        if !self.is_transparent() {
            let color = parse_color(&self.background).unwrap_or_else(|| {
                warn!(
                    "cannot parse background color {:?}, using white",
                    self.background
                );
                Color::WHITE
            });
            pixmap.fill(color);
        }

        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        pixmap.encode_png().map_err(|e| Error::Render(e.to_string()))
    }

    /// Render at `dpi` and write the PNG to `path`. Failures here are
    /// fatal and propagate to the caller.
    pub fn save(&self, path: &Path, dpi: u32) -> Result<(), Error> {
        let scale = (dpi as f32 / BASE_DPI).max(0.1);
        let png = self.to_png(scale)?;
        fs::write(path, png)?;
        info!("word cloud saved as {}", path.display());
        Ok(())
    }
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a small set of CSS color names.
pub(crate) fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let expand = |s: &str| channel(s).map(|v| v * 16 + v);
                Some(Color::from_rgba8(
                    expand(&hex[0..1])?,
                    expand(&hex[1..2])?,
                    expand(&hex[2..3])?,
                    255,
                ))
            }
            6 => Some(Color::from_rgba8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Color::from_rgba8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        };
    }

    let named: [u8; 3] = match value.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "pink" => [255, 192, 203],
        "gray" | "grey" => [128, 128, 128],
        "navy" => [0, 0, 128],
        "teal" => [0, 128, 128],
        _ => return None,
    };
    Some(Color::from_rgba8(named[0], named[1], named[2], 255))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(words: Vec<PlacedWord>, background: &str, mode: PixelMode) -> WordCloud {
        WordCloud {
            width: 400,
            height: 300,
            background: background.into(),
            mode,
            words,
            font_data: Vec::new(),
            font_family: "Vazirmatn".into(),
        }
    }

    fn word(text: &str, vertical: bool) -> PlacedWord {
        PlacedWord {
            text: text.into(),
            font_size: 24.0,
            x: 100.0,
            y: 50.0,
            vertical,
            color: "#112233".into(),
        }
    }

    #[test]
    fn svg_contains_words_and_background() {
        let svg = cloud(vec![word("سلام", false)], "white", PixelMode::Rgba).to_svg();
        assert!(svg.contains(r#"<rect width="100%" height="100%" fill="white"/>"#));
        assert!(svg.contains("سلام"));
        assert!(svg.contains(r##"fill="#112233""##));
        assert!(!svg.contains("rotate"));
    }

    #[test]
    fn vertical_words_get_a_rotation() {
        let svg = cloud(vec![word("دنیا", true)], "white", PixelMode::Rgba).to_svg();
        assert!(svg.contains(r#"transform="rotate(90 100.0 50.0)""#));
    }

    #[test]
    fn transparent_mode_skips_background_rect() {
        let svg = cloud(Vec::new(), "transparent", PixelMode::Rgba).to_svg();
        assert!(!svg.contains("<rect"));
        // RGB mode has no alpha channel, so the rect stays.
        let svg = cloud(Vec::new(), "transparent", PixelMode::Rgb).to_svg();
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn parse_hex_forms() {
        assert_eq!(parse_color("#fff"), Some(Color::from_rgba8(255, 255, 255, 255)));
        assert_eq!(
            parse_color("#102030"),
            Some(Color::from_rgba8(16, 32, 48, 255))
        );
        assert_eq!(
            parse_color("#10203040"),
            Some(Color::from_rgba8(16, 32, 48, 64))
        );
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("white"), Some(Color::from_rgba8(255, 255, 255, 255)));
        assert_eq!(parse_color("Black"), Some(Color::from_rgba8(0, 0, 0, 255)));
        assert_eq!(parse_color("mauve"), None);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&apos;");
    }
}
