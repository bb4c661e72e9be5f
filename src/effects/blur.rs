//! Drop-shadow blur.
//!
//! A shadow is one flat colour, so only its coverage is blurred. Coverage lives in a
//! [`CoverageMask`] cut to the shadow's footprint plus the kernel radius; the mask is tinted
//! with the shadow colour when it is composited.

use crate::effects::blend::{BlendMode, blend};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::core::Rect;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Gaussian parameters derived from a CSS-style `shadowBlur` length.
///
/// A blur length `b` maps to `sigma = b / 2` and a kernel radius of `3 * sigma`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurKernel {
    pub radius: u32,
    pub sigma: f32,
}

impl BlurKernel {
    pub fn from_shadow_blur(blur: f32) -> Self {
        if !blur.is_finite() || blur <= 0.0 {
            return Self {
                radius: 0,
                sigma: 1.0,
            };
        }
        let sigma = blur / 2.0;
        Self {
            radius: (sigma * 3.0).ceil() as u32,
            sigma,
        }
    }

    /// Normalized taps, `2 * radius + 1` long, summing to one.
    pub fn taps(&self) -> Vec<f32> {
        let r = self.radius as i32;
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        let raw: Vec<f32> = (-r..=r)
            .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
            .collect();
        let total: f32 = raw.iter().sum();
        raw.into_iter().map(|t| t / total).collect()
    }
}

/// Half-open pixel rectangle inside a raster of known size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRegion {
    /// Pixels covered by `bounds` grown by `pad` on every side, clipped to `width × height`.
    /// `None` when nothing is left.
    pub fn around(bounds: Rect, pad: u32, width: u32, height: u32) -> Option<Self> {
        let pad = f64::from(pad);
        let clip = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
        let region = Self {
            x0: clip((bounds.x0 - pad).floor(), width),
            y0: clip((bounds.y0 - pad).floor(), height),
            x1: clip((bounds.x1 + pad).ceil(), width),
            y1: clip((bounds.y1 + pad).ceil(), height),
        };
        (region.x0 < region.x1 && region.y0 < region.y1).then_some(region)
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Single-channel coverage in `[0, 1]` over a [`PixelRegion`] of a larger raster.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageMask {
    region: PixelRegion,
    data: Vec<f32>,
}

impl CoverageMask {
    /// Read the alpha channel of a premultiplied RGBA8 layer `layer_width` pixels wide.
    pub fn from_layer_alpha(
        layer: &[u8],
        layer_width: u32,
        region: PixelRegion,
    ) -> ForgeResult<Self> {
        let stride = layer_width as usize * 4;
        let rows = layer.len() / stride.max(1);
        if region.x1 > layer_width || region.y1 as usize > rows {
            return Err(ForgeError::render("coverage region exceeds layer"));
        }
        let mut data = Vec::with_capacity(region.width() as usize * region.height() as usize);
        for y in region.y0..region.y1 {
            let row = &layer[y as usize * stride..(y as usize + 1) * stride];
            data.extend(
                row.chunks_exact(4)
                    .skip(region.x0 as usize)
                    .take(region.width() as usize)
                    .map(|px| f32::from(px[3]) / 255.0),
            );
        }
        Ok(Self { region, data })
    }

    pub fn region(&self) -> PixelRegion {
        self.region
    }

    /// Coverage at absolute raster coordinates; zero outside the region.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        let r = self.region;
        if x < r.x0 || x >= r.x1 || y < r.y0 || y >= r.y1 {
            return 0.0;
        }
        self.data[((y - r.y0) * r.width() + (x - r.x0)) as usize]
    }

    /// Separable Gaussian blur. Each pass filters rows and writes them transposed, so two
    /// passes cover both axes and restore the layout. Samples past the region edge clamp.
    pub fn blur(&mut self, kernel: BlurKernel) {
        if kernel.radius == 0 {
            return;
        }
        let taps = kernel.taps();
        let (w, h) = (self.region.width() as usize, self.region.height() as usize);
        let across = blur_rows_transposed(&self.data, w, h, &taps);
        self.data = blur_rows_transposed(&across, h, w, &taps);
    }

    /// Composite `color` with normal blending, its alpha scaled by coverage.
    pub fn tint_into(&self, buffer: &mut PixelBuffer, color: Rgba8) -> ForgeResult<()> {
        let r = self.region;
        if r.x1 > buffer.width() || r.y1 > buffer.height() {
            return Err(ForgeError::render("coverage region exceeds buffer"));
        }
        let base_alpha = f32::from(color.a) / 255.0;
        let stride = buffer.width() as usize * 4;
        let bytes = buffer.as_bytes_mut();
        for (row_idx, row) in self.data.chunks_exact(r.width() as usize).enumerate() {
            let start = (r.y0 as usize + row_idx) * stride + r.x0 as usize * 4;
            for (cov, px) in row.iter().zip(bytes[start..].chunks_exact_mut(4)) {
                let src = color.fade(base_alpha * cov.clamp(0.0, 1.0));
                if src.a == 0 {
                    continue;
                }
                let dst = Rgba8::from_array([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&blend(dst, src, BlendMode::Normal).to_array());
            }
        }
        Ok(())
    }
}

fn blur_rows_transposed(src: &[f32], width: usize, height: usize, taps: &[f32]) -> Vec<f32> {
    let radius = taps.len() / 2;
    let mut out = vec![0.0; src.len()];
    for (y, row) in src.chunks_exact(width).enumerate() {
        for x in 0..width {
            let sum: f32 = taps
                .iter()
                .enumerate()
                .map(|(k, t)| t * row[(x + k).saturating_sub(radius).min(width - 1)])
                .sum();
            out[x * height + y] = sum;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(size: u32, lit: std::ops::Range<u32>) -> CoverageMask {
        let mut layer = vec![0u8; (size * size * 4) as usize];
        for y in lit.clone() {
            for x in lit.clone() {
                layer[((y * size + x) * 4 + 3) as usize] = 255;
            }
        }
        let region = PixelRegion::around(Rect::new(0.0, 0.0, 64.0, 64.0), 0, size, size).unwrap();
        CoverageMask::from_layer_alpha(&layer, size, region).unwrap()
    }

    #[test]
    fn shadow_blur_maps_to_three_sigma_radius() {
        assert_eq!(
            BlurKernel::from_shadow_blur(20.0),
            BlurKernel {
                radius: 30,
                sigma: 10.0
            }
        );
        assert_eq!(BlurKernel::from_shadow_blur(0.0).radius, 0);
        assert_eq!(BlurKernel::from_shadow_blur(f32::NAN).radius, 0);
    }

    #[test]
    fn taps_are_symmetric_and_normalized() {
        let taps = BlurKernel::from_shadow_blur(4.0).taps();
        assert_eq!(taps.len(), 13);
        assert!((taps.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(taps[0], taps[12]);
        assert!(taps[6] > taps[5]);
    }

    #[test]
    fn region_is_padded_and_clipped() {
        let r = PixelRegion::around(Rect::new(10.2, 5.0, 20.0, 30.5), 4, 100, 32).unwrap();
        assert_eq!(r, PixelRegion { x0: 6, y0: 1, x1: 24, y1: 32 });
        assert!(PixelRegion::around(Rect::new(-50.0, 0.0, -20.0, 5.0), 4, 100, 32).is_none());
    }

    #[test]
    fn blur_keeps_mass_and_softens_edges() {
        let mut mask = square_mask(24, 8..16);
        let before: f32 = mask.data.iter().sum();
        mask.blur(BlurKernel::from_shadow_blur(3.0));
        let after: f32 = mask.data.iter().sum();
        assert!((before - after).abs() < 0.5, "{before} vs {after}");
        assert!(mask.coverage(12, 12) > 0.9);
        let edge = mask.coverage(7, 12);
        assert!(edge > 0.05 && edge < 0.6, "{edge}");
    }

    #[test]
    fn flat_coverage_is_unchanged_by_blur() {
        let mut mask = square_mask(10, 0..10);
        mask.blur(BlurKernel::from_shadow_blur(6.0));
        assert!(mask.data.iter().all(|&c| (c - 1.0).abs() < 1e-4));
    }

    #[test]
    fn tint_touches_only_the_region() {
        let layer = [0u8, 0, 0, 255].repeat(16);
        let region = PixelRegion { x0: 1, y0: 1, x1: 3, y1: 3 };
        let mask = CoverageMask::from_layer_alpha(&layer, 4, region).unwrap();
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        mask.tint_into(&mut buf, Rgba8::with_alpha_f32(0, 0, 0, 0.5)).unwrap();
        assert_eq!(buf.get(0, 0).unwrap(), Rgba8::WHITE);
        assert_eq!(buf.get(3, 3).unwrap(), Rgba8::WHITE);
        let inside = buf.get(2, 2).unwrap();
        assert!((i32::from(inside.r) - 127).abs() <= 1, "{inside:?}");
        assert_eq!(mask.coverage(0, 0), 0.0);
    }

    #[test]
    fn region_outside_layer_is_rejected() {
        let region = PixelRegion { x0: 0, y0: 0, x1: 5, y1: 1 };
        assert!(CoverageMask::from_layer_alpha(&[0; 16], 4, region).is_err());
    }
}
