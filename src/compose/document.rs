//! Card rendering: background, watermark, header, photo, text rows, footer, then the
//! hologram seal and sleeve scratches.

use kurbo::{Circle, Shape};
use rand::Rng;

use crate::assets::decode::decode_asset;
use crate::assets::fetch::AssetFetcher;
use crate::assets::fonts::FontFace;
use crate::content::DocumentSpec;
use crate::effects::blend::BlendMode;
use crate::effects::gradient::{FillRegion, Gradient, GradientPaint, GradientStop, fill_gradient};
use crate::effects::noise::{NoiseFlavor, apply_noise};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::core::{BezPath, Point, Rect, Vec2};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::render::surface::{RasterImage, Surface};
use crate::render::text::{TextAlign, TextEngine, TextStyle};

const LOGO_RECT_RIGHT: f64 = 110.0;
const LOGO_SIZE: f64 = 80.0;
const FRAME: [f64; 4] = [25.0, 135.0, 155.0, 295.0];
const PORTRAIT: [f64; 4] = [30.0, 140.0, 150.0, 290.0];
const FOOTER_HEIGHT: f64 = 30.0;
const LABEL_X: f64 = 180.0;
const VALUE_X: f64 = 280.0;
const FIRST_ROW_Y: f64 = 160.0;
const ROW_STEP: f64 = 35.0;

const FRAME_COLOR: Rgba8 = Rgba8::rgb(0xE0, 0xE0, 0xE0);
const ADDRESS_COLOR: Rgba8 = Rgba8::rgb(0xEE, 0xEE, 0xEE);
const LABEL_COLOR: Rgba8 = Rgba8::rgb(0x55, 0x55, 0x55);
const ACCENT_COLOR: Rgba8 = Rgba8::rgb(0xD0, 0x00, 0x00);

const SEAL_LABEL_ALPHA: f32 = 0.85;

const DISCLAIMER: &str = "This card is non-transferable. Return to address above if found.";

/// What to do when the portrait cannot be fetched or decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortraitPolicy {
    /// Draw a neutral silhouette and log a warning.
    #[default]
    Placeholder,
    /// Fail the request.
    Required,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HologramParams {
    pub radius: f64,
    /// Distance of the seal centre from the right edge.
    pub inset_right: f64,
    /// Distance of the seal centre from the bottom edge.
    pub inset_bottom: f64,
    pub alpha: f32,
    pub label: String,
    pub label_size: f32,
}

impl Default for HologramParams {
    fn default() -> Self {
        Self {
            radius: 35.0,
            inset_right: 70.0,
            inset_bottom: 80.0,
            alpha: 0.5,
            label: "VERIFIED".to_owned(),
            label_size: 9.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScratchParams {
    pub count: u32,
    /// Maximum distance of a scratch end from its start, per axis.
    pub max_offset: f64,
    pub alpha: f32,
    pub width: f64,
}

impl Default for ScratchParams {
    fn default() -> Self {
        Self {
            count: 15,
            max_offset: 40.0,
            alpha: 0.15,
            width: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DocumentParams {
    pub background: Rgba8,
    pub hologram: HologramParams,
    pub scratches: ScratchParams,
    /// Tinted print grain amount; `None` disables it.
    pub print_grain: Option<f32>,
}

impl Default for DocumentParams {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            hologram: HologramParams::default(),
            scratches: ScratchParams::default(),
            print_grain: Some(20.0 / 255.0),
        }
    }
}

/// Decoded images for one card. A missing portrait is drawn as a silhouette.
#[derive(Clone, Debug, Default)]
pub struct DocumentAssets {
    pub logo: Option<RasterImage>,
    pub portrait: Option<RasterImage>,
}

impl DocumentAssets {
    /// Fetch and decode the logo and portrait of `spec`.
    ///
    /// Logo failures are logged and dropped. Portrait failures follow `policy`.
    #[tracing::instrument(skip_all, fields(institution = %spec.institution_name))]
    pub fn load(
        spec: &DocumentSpec,
        fetcher: &dyn AssetFetcher,
        policy: PortraitPolicy,
    ) -> ForgeResult<Self> {
        let logo = match &spec.logo_url {
            Some(url) => match fetch_decoded(fetcher, url, LOGO_SIZE, LOGO_SIZE) {
                Ok(img) => Some(img),
                Err(e) => {
                    tracing::warn!(%url, error = %e, "logo load failed, rendering without it");
                    None
                }
            },
            None => None,
        };

        let portrait = match fetch_decoded(
            fetcher,
            &spec.portrait_url,
            PORTRAIT[2] - PORTRAIT[0],
            PORTRAIT[3] - PORTRAIT[1],
        ) {
            Ok(img) => Some(img),
            Err(e) => match policy {
                PortraitPolicy::Required => return Err(e),
                PortraitPolicy::Placeholder => {
                    tracing::warn!(url = %spec.portrait_url, error = %e, "portrait load failed, drawing placeholder");
                    None
                }
            },
        };

        Ok(Self { logo, portrait })
    }
}

fn fetch_decoded(
    fetcher: &dyn AssetFetcher,
    location: &str,
    w: f64,
    h: f64,
) -> ForgeResult<RasterImage> {
    let bytes = fetcher.fetch(location)?;
    decode_asset(&bytes, w, h)
        .map_err(|e| ForgeError::asset_fetch(format!("decode {location}: {e}")))
}

/// Draws one card. Each stage is public; [`DocumentCompositor::render`] runs them in order.
///
/// Only the stages that set type take a [`TextEngine`].
pub struct DocumentCompositor<'a> {
    spec: &'a DocumentSpec,
    params: &'a DocumentParams,
    assets: &'a DocumentAssets,
}

impl<'a> DocumentCompositor<'a> {
    pub fn new(
        spec: &'a DocumentSpec,
        params: &'a DocumentParams,
        assets: &'a DocumentAssets,
    ) -> Self {
        Self {
            spec,
            params,
            assets,
        }
    }

    #[tracing::instrument(skip_all, fields(name = %self.spec.display_name))]
    pub fn render<R: Rng>(&self, text: &mut TextEngine, rng: &mut R) -> ForgeResult<PixelBuffer> {
        let mut buf = PixelBuffer::new(self.spec.width, self.spec.height)?;
        self.fill_background(&mut buf)?;
        self.draw_watermark(&mut buf, text)?;
        self.draw_header_band(&mut buf)?;
        self.draw_assets(&mut buf)?;
        self.draw_text(&mut buf, text)?;
        self.draw_footer(&mut buf, text)?;
        self.apply_hologram(&mut buf)?;
        self.draw_hologram_label(&mut buf, text)?;
        self.apply_scratches(&mut buf, rng)?;
        self.apply_print_grain(&mut buf, rng);
        Ok(buf)
    }

    pub fn fill_background(&self, buf: &mut PixelBuffer) -> ForgeResult<()> {
        buf.fill(self.params.background);
        Ok(())
    }

    pub fn draw_watermark(&self, buf: &mut PixelBuffer, text: &mut TextEngine) -> ForgeResult<()> {
        let (w, h) = dims(buf);
        let mut s = Surface::new(buf)?;
        s.translate(Vec2::new(w / 2.0, h / 2.0));
        s.rotate(-std::f64::consts::PI / 6.0);
        let style = TextStyle::new(FontFace::SansBold, 50.0, Rgba8::with_alpha_f32(0, 0, 0, 0.05))
            .aligned(TextAlign::Center);
        s.draw_text(
            text,
            &self.spec.watermark_title.to_uppercase(),
            Point::ORIGIN,
            &style,
        )?;
        s.finish()
    }

    pub fn draw_header_band(&self, buf: &mut PixelBuffer) -> ForgeResult<()> {
        let (w, _) = dims(buf);
        let mut s = Surface::new(buf)?;
        s.fill_polygon(
            &[
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, 100.0),
                Point::new(0.0, 120.0),
            ],
            self.spec.primary,
        );
        s.finish()
    }

    pub fn draw_assets(&self, buf: &mut PixelBuffer) -> ForgeResult<()> {
        let (w, _) = dims(buf);
        let mut s = Surface::new(buf)?;
        if let Some(logo) = &self.assets.logo {
            let x = w - LOGO_RECT_RIGHT;
            s.draw_image(logo, Rect::new(x, 20.0, x + LOGO_SIZE, 20.0 + LOGO_SIZE));
        }
        s.fill_rect(rect(FRAME), FRAME_COLOR);
        let portrait_rect = rect(PORTRAIT);
        match &self.assets.portrait {
            Some(portrait) => s.draw_image(portrait, portrait_rect),
            None => draw_silhouette(&mut s, portrait_rect),
        }
        s.finish()
    }

    pub fn draw_text(&self, buf: &mut PixelBuffer, text: &mut TextEngine) -> ForgeResult<()> {
        let spec = self.spec;
        let mut s = Surface::new(buf)?;

        let header = TextStyle::new(FontFace::SansBold, 26.0, Rgba8::WHITE);
        s.draw_text(text, &spec.institution_name, Point::new(20.0, 50.0), &header)?;
        let address = TextStyle::new(FontFace::Sans, 18.0, ADDRESS_COLOR);
        s.draw_text(text, &spec.address, Point::new(20.0, 80.0), &address)?;

        let label = TextStyle::new(FontFace::Sans, 16.0, LABEL_COLOR);
        let display_name = spec.display_name.to_uppercase();
        let rows = [
            (
                "Name:",
                display_name.as_str(),
                TextStyle::new(FontFace::SansBold, 22.0, Rgba8::BLACK),
            ),
            (
                "ID No:",
                spec.id_code.as_str(),
                TextStyle::new(FontFace::MonoBold, 22.0, ACCENT_COLOR),
            ),
            (
                "Session:",
                spec.session.as_str(),
                TextStyle::new(FontFace::Sans, 18.0, Rgba8::BLACK),
            ),
            (
                "Program:",
                spec.program.as_str(),
                TextStyle::new(FontFace::Sans, 18.0, Rgba8::BLACK),
            ),
        ];
        for (i, (name, value, value_style)) in rows.iter().enumerate() {
            let y = FIRST_ROW_Y + ROW_STEP * i as f64;
            s.draw_text(text, name, Point::new(LABEL_X, y), &label)?;
            s.draw_text(text, value, Point::new(VALUE_X, y), value_style)?;
        }
        s.finish()
    }

    pub fn draw_footer(&self, buf: &mut PixelBuffer, text: &mut TextEngine) -> ForgeResult<()> {
        let (w, h) = dims(buf);
        let mut s = Surface::new(buf)?;
        s.fill_rect(Rect::new(0.0, h - FOOTER_HEIGHT, w, h), self.spec.primary);
        let style = TextStyle::new(FontFace::Sans, 12.0, Rgba8::WHITE).aligned(TextAlign::Center);
        s.draw_text(text, DISCLAIMER, Point::new(w / 2.0, h - 10.0), &style)?;
        s.finish()
    }

    /// Rainbow seal blended with overlay.
    pub fn apply_hologram(&self, buf: &mut PixelBuffer) -> ForgeResult<()> {
        let p = &self.params.hologram;
        let center = self.hologram_center(buf);
        let rainbow = hologram_gradient(p.alpha)?;
        fill_gradient(
            buf,
            &GradientPaint::radial(center, p.radius, rainbow),
            FillRegion::Circle {
                center,
                radius: p.radius,
            },
            BlendMode::Overlay,
        );
        Ok(())
    }

    /// Seal label in the primary colour, centred on the seal. Skipped when the label is empty.
    pub fn draw_hologram_label(
        &self,
        buf: &mut PixelBuffer,
        text: &mut TextEngine,
    ) -> ForgeResult<()> {
        let p = &self.params.hologram;
        if p.label.is_empty() {
            return Ok(());
        }
        let center = self.hologram_center(buf);
        let mut s = Surface::new(buf)?;
        let style = TextStyle::new(
            FontFace::SansBold,
            p.label_size,
            self.spec.primary.fade(SEAL_LABEL_ALPHA),
        )
        .aligned(TextAlign::Center);
        let baseline = center.y + f64::from(p.label_size) / 3.0;
        s.draw_text(text, &p.label, Point::new(center.x, baseline), &style)?;
        s.finish()
    }

    fn hologram_center(&self, buf: &PixelBuffer) -> Point {
        let (w, h) = dims(buf);
        let p = &self.params.hologram;
        Point::new(w - p.inset_right, h - p.inset_bottom)
    }

    /// Short low-alpha white strokes blended with soft light.
    pub fn apply_scratches<R: Rng>(&self, buf: &mut PixelBuffer, rng: &mut R) -> ForgeResult<()> {
        let p = &self.params.scratches;
        if p.count == 0 {
            return Ok(());
        }
        let (w, h) = dims(buf);
        let color = Rgba8::WHITE.fade(p.alpha);
        let max_offset = p.max_offset.max(0.0);
        let mut s = Surface::new(buf)?;
        s.set_blend_mode(BlendMode::SoftLight)?;
        for _ in 0..p.count {
            let start = Point::new(rng.random_range(0.0..w), rng.random_range(0.0..h));
            let end = start
                + Vec2::new(
                    rng.random_range(-max_offset..=max_offset),
                    rng.random_range(-max_offset..=max_offset),
                );
            s.stroke_line(start, end, p.width, color);
        }
        s.finish()
    }

    /// Tinted grain of a cheap printer. Skipped when disabled.
    pub fn apply_print_grain<R: Rng>(&self, buf: &mut PixelBuffer, rng: &mut R) {
        if let Some(amount) = self.params.print_grain {
            apply_noise(buf, amount, NoiseFlavor::Tinted, rng);
        }
    }
}

fn rect([x0, y0, x1, y1]: [f64; 4]) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

fn dims(buf: &PixelBuffer) -> (f64, f64) {
    (f64::from(buf.width()), f64::from(buf.height()))
}

fn hologram_gradient(alpha: f32) -> ForgeResult<Gradient> {
    let stops = [
        (0.0, 255, 0, 0),
        (0.2, 255, 255, 0),
        (0.4, 0, 255, 0),
        (0.6, 0, 255, 255),
        (0.8, 0, 0, 255),
        (1.0, 255, 0, 255),
    ]
    .into_iter()
    .map(|(offset, r, g, b)| GradientStop::new(offset, Rgba8::with_alpha_f32(r, g, b, alpha)))
    .collect();
    Gradient::new(stops)
}

/// Neutral head-and-shoulders placeholder filling `area`.
fn draw_silhouette(s: &mut Surface<'_>, area: Rect) {
    s.fill_rect(area, Rgba8::rgb(0xC8, 0xC8, 0xC8));
    let figure = Rgba8::rgb(0x9E, 0x9E, 0x9E);
    let cx = area.center().x;
    let head_r = area.width() * 0.22;
    let head_cy = area.y0 + area.height() * 0.38;
    s.fill_path(&Circle::new((cx, head_cy), head_r).to_path(0.1), figure);

    let shoulders_top = head_cy + head_r * 1.25;
    let half = area.width() * 0.42;
    let mut body = BezPath::new();
    body.move_to((cx - half, area.y1));
    body.curve_to(
        (cx - half, shoulders_top),
        (cx + half, shoulders_top),
        (cx + half, area.y1),
    );
    body.close_path();
    s.fill_path(&body, figure);
}
