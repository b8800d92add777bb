//! Font resolution: first existing configured path wins, otherwise fall
//! back to the system font database, preferring Arabic-script coverage.

use crate::Error;
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use usvg::fontdb;

/// Families tried first when no configured font path exists. Ordered by
/// how well they cover Persian text.
const PREFERRED_FAMILIES: [&str; 6] = [
    "Vazirmatn",
    "Vazir",
    "Noto Naskh Arabic",
    "Noto Sans Arabic",
    "IRANSans",
    "DejaVu Sans",
];

/// A font usable both for collision sprites (fontdue) and for the final
/// SVG render (registered into resvg's fontdb by family name).
pub struct ResolvedFont {
    pub data: Vec<u8>,
    pub family: String,
    collection_index: u32,
}

impl ResolvedFont {
    /// Build the fontdue rasterizer for this face.
    pub fn rasterizer(&self) -> Result<Font, Error> {
        let settings = FontSettings {
            collection_index: self.collection_index,
            ..FontSettings::default()
        };
        Font::from_bytes(self.data.as_slice(), settings).map_err(|e| Error::Font(e.to_string()))
    }
}

/// Resolve a font from the configured candidate list, else the system.
pub fn resolve(font_paths: &[PathBuf]) -> Result<ResolvedFont, Error> {
    for path in font_paths {
        if !path.exists() {
            continue;
        }
        match fs::read(path) {
            Ok(data) => {
                if Font::from_bytes(data.as_slice(), FontSettings::default()).is_err() {
                    warn!("skipping unusable font file {}", path.display());
                    continue;
                }
                let family = family_name(&data).unwrap_or_else(|| "sans-serif".to_string());
                info!("using font: {}", path.display());
                return Ok(ResolvedFont {
                    data,
                    family,
                    collection_index: 0,
                });
            }
            Err(e) => warn!("cannot read font file {}: {e}", path.display()),
        }
    }

    warn!("no configured Persian font found, using system default");
    system_font()
}

fn system_font() -> Result<ResolvedFont, Error> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let preferred = db.faces().find(|face| {
        face.families.iter().any(|(name, _)| {
            PREFERRED_FAMILIES
                .iter()
                .any(|want| name.eq_ignore_ascii_case(want))
        })
    });
    let face = match preferred.or_else(|| db.faces().next()) {
        Some(face) => face,
        None => return Err(Error::Font("no system fonts available".into())),
    };

    let family = face
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "sans-serif".to_string());
    let data = face_bytes(&face.source)
        .ok_or_else(|| Error::Font(format!("cannot read system font {family}")))?;
    let index = face.index;
    let settings = FontSettings {
        collection_index: index,
        ..FontSettings::default()
    };
    Font::from_bytes(data.as_slice(), settings).map_err(|e| Error::Font(e.to_string()))?;

    info!("using system font: {family}");
    Ok(ResolvedFont {
        data,
        family,
        collection_index: index,
    })
}

fn face_bytes(source: &fontdb::Source) -> Option<Vec<u8>> {
    match source {
        fontdb::Source::Binary(data) => Some((*data).as_ref().as_ref().to_vec()),
        fontdb::Source::File(path) => fs::read(path).ok(),
        fontdb::Source::SharedFile(path, _) => fs::read(path).ok(),
    }
}

/// Extract the face's family name, used as the SVG `font-family`.
fn family_name(font_data: &[u8]) -> Option<String> {
    let mut db = fontdb::Database::new();
    db.load_font_source(fontdb::Source::Binary(Arc::new(font_data.to_vec())));
    for face in db.faces() {
        if let Some((name, _)) = face.families.first() {
            return Some(name.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_paths_are_skipped() {
        // With only bogus candidates, resolution falls through to the
        // system lookup; either outcome is fine, it must not panic.
        let paths = vec![PathBuf::from("/no/such/font.ttf")];
        let _ = resolve(&paths);
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(family_name(b"definitely not a font").is_none());
    }
}
