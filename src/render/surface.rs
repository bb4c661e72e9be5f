//! 2D drawing surface over a [`PixelBuffer`].
//!
//! Primitives are recorded into a `vello_cpu` context and rasterized into a transparent layer.
//! The layer is blended onto the buffer with the active [`BlendMode`] whenever the mode changes,
//! on [`Surface::flush`], and on [`Surface::finish`]. Primitives recorded between two flushes
//! composite among themselves with source-over first.

use std::sync::Arc;

use crate::effects::blend::{BlendMode, blend_premul_layer};
use crate::effects::blur::{BlurKernel, CoverageMask, PixelRegion};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::premul_px;
use crate::render::text::{TextAlign, TextEngine, TextStyle};

/// Decoded raster ready to be used as an image paint.
#[derive(Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    paint: vello_cpu::Image,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterImage {
    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> ForgeResult<Self> {
        let (w, h) = pixmap_dims(width, height)?;
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return Err(ForgeError::render("image byte len mismatch"));
        }
        let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = rgba
            .chunks_exact(4)
            .map(|px| {
                vello_cpu::peniko::color::PremulRgba8::from_u8_array(premul_px([
                    px[0], px[1], px[2], px[3],
                ]))
            })
            .collect();
        let opaque = rgba.chunks_exact(4).all(|px| px[3] == 255);
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, opaque);
        Ok(Self::from_pixmap(width, height, pixmap))
    }

    fn from_pixmap(width: u32, height: u32, pixmap: vello_cpu::Pixmap) -> Self {
        Self {
            width,
            height,
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        }
    }

    /// Build from premultiplied RGBA8 bytes, as produced by the SVG rasterizer.
    pub fn from_premul_rgba8(width: u32, height: u32, premul: &[u8]) -> ForgeResult<Self> {
        let (w, h) = pixmap_dims(width, height)?;
        if premul.len() != (width as usize) * (height as usize) * 4 {
            return Err(ForgeError::render("image byte len mismatch"));
        }
        let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = premul
            .chunks_exact(4)
            .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
            .collect();
        let opaque = premul.chunks_exact(4).all(|px| px[3] == 255);
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, opaque);
        Ok(Self::from_pixmap(width, height, pixmap))
    }

    pub fn from_buffer(buffer: &PixelBuffer) -> ForgeResult<Self> {
        Self::from_rgba8(buffer.width(), buffer.height(), buffer.as_bytes())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Canvas-style drop shadow: offset in device space, Gaussian blur length as in `shadowBlur`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Rgba8,
    pub offset: Vec2,
    pub blur: f32,
}

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Affine,
    blend: BlendMode,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            blend: BlendMode::Normal,
        }
    }
}

pub struct Surface<'a> {
    buffer: &'a mut PixelBuffer,
    ctx: vello_cpu::RenderContext,
    layer: vello_cpu::Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    pending: bool,
}

impl<'a> Surface<'a> {
    pub fn new(buffer: &'a mut PixelBuffer) -> ForgeResult<Self> {
        let (w, h) = pixmap_dims(buffer.width(), buffer.height())?;
        Ok(Self {
            buffer,
            ctx: vello_cpu::RenderContext::new(w, h),
            layer: vello_cpu::Pixmap::new(w, h),
            state: DrawState::default(),
            stack: Vec::new(),
            pending: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    pub fn restore(&mut self) -> ForgeResult<()> {
        let Some(prev) = self.stack.pop() else {
            return Err(ForgeError::render("restore without matching save"));
        };
        if prev.blend != self.state.blend {
            self.flush()?;
        }
        self.state = prev;
        Ok(())
    }

    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.state.transform *= Affine::translate(offset);
    }

    pub fn rotate(&mut self, radians: f64) {
        self.state.transform *= Affine::rotate(radians);
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) -> ForgeResult<()> {
        if mode != self.state.blend {
            self.flush()?;
            self.state.blend = mode;
        }
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.begin(self.state.transform);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_rect(&to_cpu_rect(rect));
    }

    /// Fill the closed polygon through `points`. Fewer than three points draw nothing.
    pub fn fill_polygon(&mut self, points: &[Point], color: Rgba8) {
        if points.len() < 3 {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for &p in &points[1..] {
            path.line_to(p);
        }
        path.close_path();
        self.fill_path(&path, color);
    }

    pub fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.begin(self.state.transform);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        self.stroke_path(&path, width, color);
    }

    pub fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) {
        self.begin(self.state.transform);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.stroke_path(&bezpath_to_cpu(path));
    }

    /// Draw `image` scaled to cover `dest` under the current transform.
    pub fn draw_image(&mut self, image: &RasterImage, dest: Rect) {
        if image.width == 0 || image.height == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let fit = Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(
                dest.width() / f64::from(image.width),
                dest.height() / f64::from(image.height),
            );
        self.begin(self.state.transform * fit);
        self.ctx.set_paint(image.paint.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
    }

    /// Draw a single line of text whose baseline passes through `origin`.
    ///
    /// `style.align` anchors `origin` at the left edge, centre or right edge of the line.
    pub fn draw_text(
        &mut self,
        engine: &mut TextEngine,
        text: &str,
        origin: Point,
        style: &TextStyle,
    ) -> ForgeResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let shaped = engine.shape(text, style)?;
        let dx = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -f64::from(shaped.width) / 2.0,
            TextAlign::Right => -f64::from(shaped.width),
        };
        let local = Affine::translate((origin.x + dx, origin.y - f64::from(shaped.baseline)));
        self.begin(self.state.transform * local);
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(to_cpu_color(brush));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&shaped.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    /// Rasterize the coverage of `rect` offset by the shadow offset, blur it, and composite it
    /// tinted with the shadow colour. Pending primitives are flushed first.
    pub fn fill_rect_shadow(&mut self, rect: Rect, shadow: Shadow) -> ForgeResult<()> {
        self.flush()?;
        let transform = Affine::translate(shadow.offset) * self.state.transform;
        let kernel = BlurKernel::from_shadow_blur(shadow.blur);
        let Some(region) = PixelRegion::around(
            transform.transform_rect_bbox(rect),
            kernel.radius,
            self.buffer.width(),
            self.buffer.height(),
        ) else {
            return Ok(());
        };

        self.begin(transform);
        self.ctx.set_paint(to_cpu_color(Rgba8::BLACK));
        self.ctx.fill_rect(&to_cpu_rect(rect));
        self.rasterize_pending();
        self.pending = false;

        let mut mask =
            CoverageMask::from_layer_alpha(self.layer.data_as_u8_slice(), self.buffer.width(), region)?;
        mask.blur(kernel);
        mask.tint_into(self.buffer, shadow.color)
    }

    /// Composite pending primitives onto the buffer.
    pub fn flush(&mut self) -> ForgeResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.rasterize_pending();
        self.pending = false;
        blend_premul_layer(self.buffer, self.layer.data_as_u8_slice(), self.state.blend)
    }

    /// Flush and hand back raw pixel access.
    pub fn pixels(&mut self) -> ForgeResult<&mut PixelBuffer> {
        self.flush()?;
        Ok(self.buffer)
    }

    pub fn finish(mut self) -> ForgeResult<()> {
        self.flush()
    }

    fn begin(&mut self, transform: Affine) {
        if !self.pending {
            self.ctx.reset();
            self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            self.pending = true;
        }
        self.ctx.set_transform(affine_to_cpu(transform));
    }

    fn rasterize_pending(&mut self) {
        self.layer.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.layer);
        self.ctx.reset();
    }
}

fn pixmap_dims(width: u32, height: u32) -> ForgeResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ForgeError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ForgeError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ForgeError::render("surface size must be non-zero"));
    }
    Ok((w, h))
}

fn to_cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_cpu_rect(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
