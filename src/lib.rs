/*!
 * Persian word-cloud generation.
 *
 * A single-pass pipeline: raw strings are normalized to Persian tokens
 * and counted, counts are inflated by rank tier ("smart sizing"), the
 * words are packed onto a canvas (optionally shaped and colored by a
 * mask image), and the result is saved as a PNG.
 *
 * ```no_run
 * use persian_wordcloud::create_persian_wordcloud;
 * use std::path::Path;
 *
 * let texts = vec!["سلام دنیا", "ابر کلمات فارسی"];
 * create_persian_wordcloud(&texts, Path::new("config.json"), None)?;
 * # Ok::<(), persian_wordcloud::Error>(())
 * ```
 */

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub mod color;
pub mod config;
pub mod font;
pub mod layout;
pub mod mask;
pub mod rescale;
pub mod render;
pub mod text;

pub use color::{ColorFunc, Palette, Region};
pub use config::{ColorMode, Config, CustomColors, PixelMode, SmartSizing};
pub use layout::PlacedWord;
pub use mask::MaskImage;
pub use render::WordCloud;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Font error: {0}")]
    Font(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("SVG error: {0}")]
    Svg(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the pipeline up to layout: tokenize, smart-size, resolve font and
/// mask, place words. A failing mask load is recoverable (the run
/// continues without a mask); everything else propagates.
pub fn generate<S: AsRef<str>>(texts: &[S], config: &Config) -> Result<WordCloud, Error> {
    let counts = text::count_tokens(texts, &config.stopwords, config.collocations);
    if counts.is_empty() {
        return Err(Error::Input(
            "no Persian tokens survived normalization".into(),
        ));
    }

    let weights = rescale::smart_size(&counts, &config.smart_sizing);
    info!("total unique words: {}", weights.len());
    let top: Vec<&(String, f64)> = weights.iter().take(10).collect();
    info!("most common words: {top:?}");

    let resolved = font::resolve(&config.font_paths)?;
    let font = resolved.rasterizer()?;

    let mask = match &config.mask_path {
        Some(path) => match MaskImage::load(path, config.width, config.height) {
            Ok(mask) => Some(mask),
            Err(e) => {
                warn!("mask processing failed: {e}; continuing without mask");
                None
            }
        },
        None => None,
    };

    let colors = ColorFunc::from_config(config, mask.as_ref());
    let words = layout::place_words(&weights, config, &font, mask.as_ref(), &colors)?;

    Ok(WordCloud {
        width: config.width,
        height: config.height,
        background: config.background_color.clone(),
        mode: config.mode,
        words,
        font_data: resolved.data,
        font_family: resolved.family,
    })
}

/// Full pipeline: load the config file, generate, and save the PNG.
///
/// `output_file` overrides the configured output path when given.
/// Returns the path the image was written to.
pub fn create_persian_wordcloud<S: AsRef<str>>(
    texts: &[S],
    config_path: &Path,
    output_file: Option<&Path>,
) -> Result<PathBuf, Error> {
    let config = Config::load(config_path);
    let cloud = generate(texts, &config)?;
    let out = output_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_file.clone());
    cloud.save(&out, config.dpi)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_rejects_empty_input() {
        let config = Config::default();
        let result = generate::<&str>(&[], &config);
        assert!(matches!(result, Err(Error::Input(_))));
        let result = generate(&["just english"], &config);
        assert!(matches!(result, Err(Error::Input(_))));
    }
}
