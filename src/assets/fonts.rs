//! Process-wide font registration.
//!
//! Fonts are resolved once per process: the first caller loads the configured font directory
//! plus the system font database and picks one face per [`FontFace`]. Every later caller,
//! including concurrent ones, gets the same registry. Options passed after the first call are
//! ignored.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use usvg::fontdb::{Database, Family, Query, Weight};

use crate::foundation::error::{ForgeError, ForgeResult};

/// Logical faces the card layout asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFace {
    Sans,
    SansBold,
    /// Bold monospace, used for identifying codes.
    MonoBold,
}

impl FontFace {
    pub const ALL: [Self; 3] = [Self::Sans, Self::SansBold, Self::MonoBold];

    fn weight(self) -> Weight {
        match self {
            Self::Sans => Weight::NORMAL,
            Self::SansBold | Self::MonoBold => Weight::BOLD,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontOptions {
    /// Directory of `.ttf`/`.otf`/`.ttc` files loaded before system fonts.
    pub dir: Option<PathBuf>,
    /// Also scan the system font database. Off means only `dir` is used.
    pub system_fonts: bool,
    /// Preferred sans-serif families, first match wins.
    pub sans_families: Vec<String>,
    /// Preferred monospace families, first match wins.
    pub mono_families: Vec<String>,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            dir: None,
            system_fonts: true,
            sans_families: vec![
                "Noto Sans".to_owned(),
                "DejaVu Sans".to_owned(),
                "Liberation Sans".to_owned(),
                "Arial".to_owned(),
                "Helvetica".to_owned(),
            ],
            mono_families: vec![
                "Noto Sans Mono".to_owned(),
                "DejaVu Sans Mono".to_owned(),
                "Liberation Mono".to_owned(),
                "Courier New".to_owned(),
                "Menlo".to_owned(),
            ],
        }
    }
}

/// Raw bytes of one resolved face.
#[derive(Clone, Debug)]
pub struct FaceData {
    /// Family name as reported by the font database.
    pub family: String,
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
}

#[derive(Debug)]
pub struct FontRegistry {
    sans: FaceData,
    sans_bold: FaceData,
    mono_bold: FaceData,
}

static REGISTRY: OnceLock<Result<FontRegistry, String>> = OnceLock::new();

/// Return the process-wide registry, registering fonts on first use.
pub fn registry(opts: &FontOptions) -> ForgeResult<&'static FontRegistry> {
    REGISTRY
        .get_or_init(|| {
            FontRegistry::load(opts).map_err(|e| match e {
                ForgeError::FontRegistration(msg) => msg,
                other => other.to_string(),
            })
        })
        .as_ref()
        .map_err(|e| ForgeError::font_registration(e.clone()))
}

impl FontRegistry {
    pub fn face(&self, face: FontFace) -> &FaceData {
        match face {
            FontFace::Sans => &self.sans,
            FontFace::SansBold => &self.sans_bold,
            FontFace::MonoBold => &self.mono_bold,
        }
    }

    #[tracing::instrument(skip(opts))]
    fn load(opts: &FontOptions) -> ForgeResult<Self> {
        let mut db = Database::new();
        if let Some(dir) = &opts.dir {
            if dir.is_dir() {
                db.load_fonts_dir(dir);
                tracing::info!(dir = %dir.display(), faces = db.len(), "loaded font directory");
            } else {
                tracing::warn!(dir = %dir.display(), "font directory not found, using system fonts");
            }
        }
        if opts.system_fonts {
            db.load_system_fonts();
        }
        if db.len() == 0 {
            return Err(ForgeError::font_registration(
                "no fonts found in font directory or system font database",
            ));
        }

        let sans = resolve(&db, &opts.sans_families, Family::SansSerif, FontFace::Sans)?;
        let sans_bold = resolve(&db, &opts.sans_families, Family::SansSerif, FontFace::SansBold)?;
        let mono_bold = resolve(&db, &opts.mono_families, Family::Monospace, FontFace::MonoBold)?;
        tracing::info!(
            sans = %sans.family,
            sans_bold = %sans_bold.family,
            mono_bold = %mono_bold.family,
            "registered fonts"
        );
        Ok(Self {
            sans,
            sans_bold,
            mono_bold,
        })
    }
}

fn resolve(
    db: &Database,
    preferred: &[String],
    generic: Family<'_>,
    face: FontFace,
) -> ForgeResult<FaceData> {
    let mut families: Vec<Family<'_>> = preferred.iter().map(|n| Family::Name(n.as_str())).collect();
    families.push(generic);
    let query = Query {
        families: &families,
        weight: face.weight(),
        ..Query::default()
    };

    let id = match db.query(&query) {
        Some(id) => id,
        None => {
            // Substitute the first installed face.
            let fallback = db.faces().next().map(|f| f.id).ok_or_else(|| {
                ForgeError::font_registration(format!("no face available for {face:?}"))
            })?;
            tracing::warn!(?face, "no preferred family installed, substituting first available face");
            fallback
        }
    };

    let family = db
        .face(id)
        .and_then(|info| info.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_default();
    db.with_face_data(id, |data, index| FaceData {
        family,
        bytes: Arc::new(data.to_vec()),
        index,
    })
    .ok_or_else(|| ForgeError::font_registration(format!("failed to read font data for {face:?}")))
}

/// The font shipped under `tests/data/fonts`, with system fonts off.
#[cfg(test)]
pub(crate) fn fixture_options() -> FontOptions {
    FontOptions {
        dir: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts")),
        system_fonts: false,
        sans_families: vec!["Tuffy".to_owned()],
        mono_families: vec!["Tuffy".to_owned()],
    }
}

#[cfg(test)]
impl FontRegistry {
    /// Registry serving `face` for every logical face, bypassing the process-wide cache.
    pub(crate) fn uniform(face: FaceData) -> Self {
        Self {
            sans: face.clone(),
            sans_bold: face.clone(),
            mono_bold: face,
        }
    }
}
