use std::collections::HashMap;

use crate::assets::fonts::{FontFace, FontRegistry};
use crate::foundation::color::Rgba8;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Horizontal anchor of a text origin, as in CSS `text-align` for canvas `fillText`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size_px: f32,
    pub color: Rgba8,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn new(face: FontFace, size_px: f32, color: Rgba8) -> Self {
        Self {
            face,
            size_px,
            color,
            align: TextAlign::Left,
        }
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

struct RegisteredFace {
    family: String,
    font: vello_cpu::peniko::FontData,
}

/// Shaped text ready to be drawn, with its baseline and advance width.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<Rgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
    pub(crate) width: f32,
    /// Distance from the layout top to the first baseline.
    pub(crate) baseline: f32,
}

/// Parley contexts plus the registered card faces. One per request.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    faces: HashMap<FontFace, RegisteredFace>,
}

impl TextEngine {
    pub fn new(registry: &FontRegistry) -> ForgeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let mut faces = HashMap::new();
        for face in FontFace::ALL {
            let data = registry.face(face);
            let families = font_ctx.collection.register_fonts(
                parley::fontique::Blob::new(data.bytes.clone()),
                None,
            );
            let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                ForgeError::font_registration(format!("no font families registered for {face:?}"))
            })?;
            let family = font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| ForgeError::font_registration("registered font family has no name"))?
                .to_owned();
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::new(data.bytes.clone()),
                data.index,
            );
            faces.insert(face, RegisteredFace { family, font });
        }
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            faces,
        })
    }

    pub(crate) fn shape(&mut self, text: &str, style: &TextStyle) -> ForgeResult<ShapedText> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(ForgeError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let face = self
            .faces
            .get(&style.face)
            .ok_or_else(|| ForgeError::font_registration(format!("{:?} not registered", style.face)))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(style.color));
        if matches!(style.face, FontFace::SansBold | FontFace::MonoBold) {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);

        let baseline = layout
            .lines()
            .next()
            .map(|line| line.metrics().baseline)
            .unwrap_or(style.size_px);
        let width = layout.width();
        Ok(ShapedText {
            layout,
            font: face.font.clone(),
            width,
            baseline,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::fonts::{FaceData, fixture_options, registry};

    fn engine() -> TextEngine {
        TextEngine::new(registry(&fixture_options()).unwrap()).unwrap()
    }

    #[test]
    fn shaping_measures_nonzero_width() {
        let mut engine = engine();
        let style = TextStyle::new(FontFace::Sans, 16.0, Rgba8::BLACK);
        let short = engine.shape("ID", &style).unwrap();
        let long = engine.shape("IDENTIFICATION", &style).unwrap();
        assert!(short.width > 0.0);
        assert!(long.width > short.width);
        assert!(short.baseline > 0.0);
    }

    #[test]
    fn width_scales_with_font_size() {
        let mut engine = engine();
        let small = engine
            .shape("Session", &TextStyle::new(FontFace::Sans, 12.0, Rgba8::BLACK))
            .unwrap();
        let large = engine
            .shape("Session", &TextStyle::new(FontFace::Sans, 24.0, Rgba8::BLACK))
            .unwrap();
        assert!(large.width > small.width * 1.5);
    }

    #[test]
    fn invalid_size_is_rejected() {
        let mut engine = engine();
        let style = TextStyle::new(FontFace::Sans, 0.0, Rgba8::BLACK);
        assert!(engine.shape("x", &style).is_err());
    }

    #[test]
    fn engine_shares_font_bytes_instead_of_copying() {
        let shared = registry(&fixture_options()).unwrap().face(FontFace::Sans);
        let local = FontRegistry::uniform(FaceData {
            bytes: Arc::new(shared.bytes.as_ref().clone()),
            ..shared.clone()
        });
        let bytes = Arc::clone(&local.face(FontFace::Sans).bytes);
        let before = Arc::strong_count(&bytes);
        let engine = TextEngine::new(&local).unwrap();
        assert!(Arc::strong_count(&bytes) >= before + FontFace::ALL.len());
        drop(engine);
    }
}
