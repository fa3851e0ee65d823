use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

/// Horizontal metrics of one font face, used to break overlay text into
/// lines for backends that cannot wrap on their own.
#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("units_per_em", &self.units_per_em)
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_metrics_from_data(&data, None)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

/// Font from an explicit file, else the first installed family of
/// `families` (a CSS-style comma separated list), else the system sans-serif.
pub fn resolve_font(font_path: Option<&Path>, families: Option<&str>) -> Result<FontMetrics> {
    if let Some(path) = font_path {
        return load_font_metrics(path);
    }

    let db = system_font_db();
    if let Some(metrics) = families.and_then(|families| find_family_font(&db, families)) {
        return Ok(metrics);
    }
    load_font_metrics_from_family(&db, "sans-serif")
        .map_err(|err| anyhow!("no fallback fonts found ({})", err))
}

pub fn system_font_db() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    db
}

/// First installed face of a CSS family list. No generic fallback beyond
/// what the list itself names.
pub fn find_family_font(db: &fontdb::Database, families: &str) -> Option<FontMetrics> {
    split_family_list(families)
        .iter()
        .find_map(|candidate| load_font_metrics_from_family(db, candidate).ok())
}

/// Faces used for line breaking, keyed by the authored `fontFamily` list.
/// Elements whose family is missing fall back to the configured face.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    fallback: Option<FontMetrics>,
    families: HashMap<String, FontMetrics>,
}

impl FontBook {
    pub fn new(fallback: Option<FontMetrics>) -> Self {
        Self {
            fallback,
            families: HashMap::new(),
        }
    }

    pub fn insert(&mut self, families: &str, font: FontMetrics) {
        self.families.insert(families.trim().to_string(), font);
    }

    pub fn fallback(&self) -> Option<&FontMetrics> {
        self.fallback.as_ref()
    }

    pub fn for_family(&self, families: Option<&str>) -> Option<&FontMetrics> {
        families
            .and_then(|families| self.families.get(families.trim()))
            .or(self.fallback.as_ref())
    }
}

pub(crate) fn split_family_list(families: &str) -> Vec<String> {
    families
        .split(',')
        .map(|name| name.trim().trim_matches(|ch| ch == '"' || ch == '\'').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

pub(crate) fn measure_text_width_px(
    text: &str,
    font_size: f32,
    letter_spacing: f32,
    font: Option<&FontMetrics>,
) -> f32 {
    let spacing = letter_spacing * text.chars().filter(|ch| *ch != '\n').count() as f32;
    if let Some(font) = font {
        if let Ok(face) = Face::parse(&font.data, font.face_index) {
            let mut advance = 0u32;
            for ch in text.chars() {
                if ch == '\n' {
                    continue;
                }
                if ch == ' ' {
                    advance = advance.saturating_add(font.space_advance as u32);
                    continue;
                }
                let glyph_advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(font.space_advance);
                advance = advance.saturating_add(glyph_advance as u32);
            }
            let units = font.units_per_em.max(1) as f32;
            return advance as f32 * (font_size / units) + spacing;
        }
    }
    estimate_text_width_units(text) * font_size + spacing
}

pub(crate) fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0xFF00..=0xFFEF
    )
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if is_cjk(ch) {
        1.0
    } else {
        0.9
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(estimate_char_units)
        .sum()
}

fn load_font_metrics_from_data(data: &[u8], preferred_family: Option<&str>) -> Result<FontMetrics> {
    let mut fallback = None;
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        if let Ok(face) = Face::parse(data, index) {
            let family = extract_family_name(&face);
            let units_per_em = face.units_per_em().max(1);
            let space_advance = face
                .glyph_index(' ')
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(units_per_em / 2);
            let metrics = FontMetrics {
                data: Arc::new(data.to_vec()),
                units_per_em,
                space_advance,
                family: family.clone(),
                face_index: index,
            };
            if let (Some(preferred), Some(found)) = (preferred_family, &family) {
                if found.eq_ignore_ascii_case(preferred) {
                    return Ok(metrics);
                }
            }
            if fallback.is_none() {
                fallback = Some(metrics);
            }
        }
    }
    fallback.ok_or_else(|| anyhow!("failed to parse font data"))
}

fn load_font_metrics_from_family(db: &fontdb::Database, family: &str) -> Result<FontMetrics> {
    let families = match family.to_ascii_lowercase().as_str() {
        "sans-serif" | "system-ui" | "-apple-system" => vec![fontdb::Family::SansSerif],
        "serif" => vec![fontdb::Family::Serif],
        "monospace" => vec![fontdb::Family::Monospace],
        _ => vec![fontdb::Family::Name(family)],
    };
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let data = db
        .with_face_data(id, |data, _index| data.to_vec())
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    load_font_metrics_from_data(&data, Some(family))
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_css_family_lists() {
        assert_eq!(
            split_family_list(r#"system-ui, "Segoe UI", 'Noto Sans',  sans-serif"#),
            vec!["system-ui", "Segoe UI", "Noto Sans", "sans-serif"]
        );
    }

    #[test]
    fn estimates_width_without_font() {
        assert!((measure_text_width_px("ab", 10.0, 0.0, None) - 11.0).abs() < 1e-4);
        assert!((measure_text_width_px("漢字", 20.0, 0.0, None) - 40.0).abs() < 1e-4);
        assert!((measure_text_width_px("ab", 10.0, 2.0, None) - 15.0).abs() < 1e-4);
    }

    fn unparsed(family: &str) -> FontMetrics {
        FontMetrics {
            data: Arc::new(Vec::new()),
            units_per_em: 1000,
            space_advance: 250,
            family: Some(family.to_string()),
            face_index: 0,
        }
    }

    #[test]
    fn font_book_prefers_the_authored_family() {
        let mut book = FontBook::new(Some(unparsed("Fallback")));
        book.insert(" \"Comic Neue\", cursive ", unparsed("Comic Neue"));

        let authored = book.for_family(Some(r#""Comic Neue", cursive"#));
        assert_eq!(authored.and_then(FontMetrics::family), Some("Comic Neue"));
        let missing = book.for_family(Some("Nope"));
        assert_eq!(missing.and_then(FontMetrics::family), Some("Fallback"));
        assert_eq!(book.for_family(None).and_then(FontMetrics::family), Some("Fallback"));
        assert!(FontBook::default().for_family(Some("Nope")).is_none());
    }

    #[test]
    fn unknown_family_list_finds_nothing() {
        let db = fontdb::Database::new();
        assert!(find_family_font(&db, "Definitely Not Installed 9f2c").is_none());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_font(Some(&dir.path().join("nope.ttf")), None).expect_err("missing");
        assert!(err.to_string().contains("nope.ttf"));
    }
}
