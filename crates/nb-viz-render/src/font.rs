use std::sync::Arc;

use ab_glyph::FontVec;
use usvg::fontdb;

use crate::primitives::FontWeight;

/// `font-family` written on every SVG text element.
pub const SVG_FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Arial, Helvetica, sans-serif";

/// Preferred faces, in lookup order, before the generic sans-serif fallback.
const PREFERRED_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// Fonts shared by layout (glyph metrics) and rasterization (the database).
pub struct FontHandle {
    db: Arc<fontdb::Database>,
    regular: Option<FontVec>,
    bold: Option<FontVec>,
}

impl FontHandle {
    /// Load the fonts installed on the system.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self::from_database(db)
    }

    /// Use an already populated font database.
    pub fn from_database(db: fontdb::Database) -> Self {
        let regular = load_face(&db, fontdb::Weight::NORMAL);
        let bold = load_face(&db, fontdb::Weight::BOLD);
        if regular.is_none() {
            log::warn!("no sans-serif font found ({} faces loaded); text widths are estimated", db.len());
        }
        Self { db: Arc::new(db), regular, bold }
    }

    /// No fonts at all: metrics fall back to estimates and text is not rasterized.
    pub fn empty() -> Self {
        Self::from_database(fontdb::Database::new())
    }

    pub fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }

    /// Face for measuring text of the given weight. Bold falls back to regular.
    pub fn select(&self, weight: FontWeight) -> Option<&FontVec> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Regular => self.regular.as_ref(),
        }
    }
}

fn load_face(db: &fontdb::Database, weight: fontdb::Weight) -> Option<FontVec> {
    let mut families: Vec<fontdb::Family<'_>> =
        PREFERRED_FAMILIES.iter().map(|&name| fontdb::Family::Name(name)).collect();
    families.push(fontdb::Family::SansSerif);
    let query = fontdb::Query {
        families: &families,
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index).ok())
        .flatten()
}
