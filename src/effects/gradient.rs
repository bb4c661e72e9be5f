//! Linear and radial gradient sampling, and gradient fills blended onto a [`PixelBuffer`].

use crate::effects::blend::{BlendMode, blend_unit};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::lerp;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f32,
    pub color: Rgba8,
}

impl GradientStop {
    pub fn new(offset: f32, color: Rgba8) -> Self {
        Self { offset, color }
    }
}

/// Ordered colour ramp with strictly increasing stop offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(stops: Vec<GradientStop>) -> ForgeResult<Self> {
        if stops.is_empty() {
            return Err(ForgeError::validation("gradient needs at least one stop"));
        }
        for s in &stops {
            if !s.offset.is_finite() || !(0.0..=1.0).contains(&s.offset) {
                return Err(ForgeError::validation(format!(
                    "gradient stop offset {} is outside [0, 1]",
                    s.offset
                )));
            }
        }
        if stops.windows(2).any(|w| w[1].offset <= w[0].offset) {
            return Err(ForgeError::validation(
                "gradient stop offsets must be strictly increasing",
            ));
        }
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Sample at `t`, clamped to the first/last stop outside their offsets.
    pub fn sample(&self, t: f32) -> [f32; 4] {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if t.is_nan() || t <= first.offset {
            return first.color.to_unit();
        }
        if t >= last.offset {
            return last.color.to_unit();
        }
        for w in self.stops.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t <= b.offset {
                let k = ((t - a.offset) / (b.offset - a.offset)).clamp(0.0, 1.0);
                let ca = a.color.to_unit();
                let cb = b.color.to_unit();
                return [
                    lerp(ca[0], cb[0], k),
                    lerp(ca[1], cb[1], k),
                    lerp(ca[2], cb[2], k),
                    lerp(ca[3], cb[3], k),
                ];
            }
        }
        last.color.to_unit()
    }

    pub fn sample_rgba8(&self, t: f32) -> Rgba8 {
        Rgba8::from_unit(self.sample(t))
    }
}

/// Where a gradient is evaluated and how a pixel maps to a ramp position.
#[derive(Clone, Debug, PartialEq)]
pub enum GradientPaint {
    /// Projection onto `start -> end`, normalized to `[0, 1]`.
    Linear {
        start: Point,
        end: Point,
        gradient: Gradient,
    },
    /// `(distance - inner) / (outer - inner)` from `center`.
    Radial {
        center: Point,
        inner: f64,
        outer: f64,
        gradient: Gradient,
    },
}

impl GradientPaint {
    pub fn linear(start: Point, end: Point, gradient: Gradient) -> Self {
        Self::Linear {
            start,
            end,
            gradient,
        }
    }

    /// Radial ramp normalized by `outer` alone.
    pub fn radial(center: Point, outer: f64, gradient: Gradient) -> Self {
        Self::Radial {
            center,
            inner: 0.0,
            outer,
            gradient,
        }
    }

    /// Ramp position for a point, in `[0, 1]`.
    pub fn position(&self, p: Point) -> f32 {
        match self {
            Self::Linear { start, end, .. } => {
                let dir = *end - *start;
                let len2 = dir.hypot2();
                if len2 <= f64::EPSILON {
                    return 0.0;
                }
                ((p - *start).dot(dir) / len2).clamp(0.0, 1.0) as f32
            }
            Self::Radial {
                center,
                inner,
                outer,
                ..
            } => {
                let span = outer - inner;
                let dist = (p - *center).hypot();
                if span <= f64::EPSILON {
                    return if dist < *outer { 0.0 } else { 1.0 };
                }
                ((dist - inner) / span).clamp(0.0, 1.0) as f32
            }
        }
    }

    pub fn gradient(&self) -> &Gradient {
        match self {
            Self::Linear { gradient, .. } | Self::Radial { gradient, .. } => gradient,
        }
    }

    pub fn sample_at(&self, p: Point) -> [f32; 4] {
        self.gradient().sample(self.position(p))
    }
}

/// Pixels a gradient fill touches. Pixel centres decide membership.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillRegion {
    Full,
    Rect(Rect),
    Circle { center: Point, radius: f64 },
}

impl FillRegion {
    fn contains(&self, p: Point) -> bool {
        match self {
            Self::Full => true,
            Self::Rect(r) => p.x >= r.x0 && p.x < r.x1 && p.y >= r.y0 && p.y < r.y1,
            Self::Circle { center, radius } => (p - *center).hypot2() <= radius * radius,
        }
    }

    fn bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clamp_x = |v: f64| v.floor().clamp(0.0, f64::from(width)) as u32;
        let clamp_y = |v: f64| v.floor().clamp(0.0, f64::from(height)) as u32;
        match self {
            Self::Full => (0, 0, width, height),
            Self::Rect(r) => (
                clamp_x(r.x0),
                clamp_y(r.y0),
                clamp_x(r.x1.ceil()),
                clamp_y(r.y1.ceil()),
            ),
            Self::Circle { center, radius } => (
                clamp_x(center.x - radius),
                clamp_y(center.y - radius),
                clamp_x((center.x + radius).ceil() + 1.0),
                clamp_y((center.y + radius).ceil() + 1.0),
            ),
        }
    }
}

/// Blend a gradient onto every pixel of `region` with `mode`.
pub fn fill_gradient(
    buffer: &mut PixelBuffer,
    paint: &GradientPaint,
    region: FillRegion,
    mode: BlendMode,
) {
    let (w, h) = (buffer.width(), buffer.height());
    let (x0, y0, x1, y1) = region.bounds(w, h);
    let data = buffer.as_bytes_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if !region.contains(p) {
                continue;
            }
            let src = paint.sample_at(p);
            if src[3] <= 0.0 {
                continue;
            }
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            let dst = Rgba8::from_array([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
            let out = Rgba8::from_unit(blend_unit(mode, dst.to_unit(), src));
            data[idx..idx + 4].copy_from_slice(&out.to_array());
        }
    }
}
