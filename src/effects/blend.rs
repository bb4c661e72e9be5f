use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::unpremul_unit;

/// Per-pixel compositing formula applied when a source is drawn onto the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Overlay,
    Screen,
    SoftLight,
}

/// Blend one normalized channel. `d` is the destination, `s` the source, both in `[0, 1]`.
///
/// The result is not yet weighted by source alpha; see [`blend`].
pub fn blend_channel(mode: BlendMode, d: f32, s: f32) -> f32 {
    match mode {
        BlendMode::Normal => s,
        BlendMode::Overlay => {
            if d < 0.5 {
                2.0 * d * s
            } else {
                1.0 - 2.0 * (1.0 - d) * (1.0 - s)
            }
        }
        BlendMode::Screen => 1.0 - (1.0 - d) * (1.0 - s),
        BlendMode::SoftLight => {
            if s < 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d < 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }
    }
}

/// Blend normalized straight-alpha samples: `out = B(d, s) * sa + d * (1 - sa)`.
///
/// Alpha follows source-over: `sa + da * (1 - sa)`. Nothing is clamped here.
pub fn blend_unit(mode: BlendMode, d: [f32; 4], s: [f32; 4]) -> [f32; 4] {
    let sa = s[3];
    let inv = 1.0 - sa;
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        out[i] = blend_channel(mode, d[i], s[i]) * sa + d[i] * inv;
    }
    out[3] = sa + d[3] * inv;
    out
}

/// Blend an 8-bit source sample onto an 8-bit destination sample.
pub fn blend(d: Rgba8, s: Rgba8, mode: BlendMode) -> Rgba8 {
    if s.a == 0 {
        return d;
    }
    Rgba8::from_unit(blend_unit(mode, d.to_unit(), s.to_unit()))
}

/// Blend a premultiplied RGBA8 layer covering the whole buffer onto it.
///
/// Layer pixels with zero alpha leave the destination untouched.
pub fn blend_premul_layer(dst: &mut PixelBuffer, layer: &[u8], mode: BlendMode) -> ForgeResult<()> {
    if layer.len() != dst.as_bytes().len() {
        return Err(ForgeError::render(
            "blend_premul_layer expects a layer matching the buffer size",
        ));
    }
    for (d, s) in dst.as_bytes_mut().chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let src = unpremul_unit([s[0], s[1], s[2], s[3]]);
        let dst_px = Rgba8::from_array([d[0], d[1], d[2], d[3]]);
        let out = Rgba8::from_unit(blend_unit(mode, dst_px.to_unit(), src));
        d.copy_from_slice(&out.to_array());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [BlendMode; 4] = [
        BlendMode::Normal,
        BlendMode::Overlay,
        BlendMode::Screen,
        BlendMode::SoftLight,
    ];

    #[test]
    fn transparent_source_is_identity_for_every_mode() {
        let d = Rgba8::rgba(12, 200, 77, 255);
        let s = Rgba8::rgba(250, 3, 99, 0);
        for mode in MODES {
            assert_eq!(blend(d, s, mode), d, "{mode:?}");
            assert_eq!(blend(blend(d, s, mode), s, mode), d, "{mode:?}");
        }
    }

    #[test]
    fn blend_is_deterministic() {
        let d = Rgba8::rgba(40, 90, 160, 255);
        let s = Rgba8::rgba(200, 30, 10, 128);
        for mode in MODES {
            assert_eq!(blend(d, s, mode), blend(d, s, mode));
        }
    }

    #[test]
    fn overlay_on_mid_gray_returns_source() {
        for i in 0..=20 {
            let s = i as f32 / 20.0;
            let out = blend_channel(BlendMode::Overlay, 0.5, s);
            assert!((out - s).abs() < 1e-6, "s={s} out={out}");
        }
    }

    #[test]
    fn screen_is_commutative() {
        for i in 0..=10 {
            for j in 0..=10 {
                let a = i as f32 / 10.0;
                let b = j as f32 / 10.0;
                assert_eq!(
                    blend_channel(BlendMode::Screen, a, b),
                    blend_channel(BlendMode::Screen, b, a)
                );
            }
        }
    }

    #[test]
    fn soft_light_with_half_source_is_identity() {
        for i in 0..=20 {
            let d = i as f32 / 20.0;
            let out = blend_channel(BlendMode::SoftLight, d, 0.5);
            assert!((out - d).abs() < 1e-6, "d={d} out={out}");
        }
    }

    #[test]
    fn soft_light_uses_polynomial_below_quarter() {
        let d = 0.2f32;
        let expected = ((16.0 * d - 12.0) * d + 4.0) * d;
        let out = blend_channel(BlendMode::SoftLight, d, 1.0);
        assert!((out - expected).abs() < 1e-6);
    }

    #[test]
    fn opaque_normal_replaces_destination() {
        let d = Rgba8::rgb(1, 2, 3);
        let s = Rgba8::rgb(200, 100, 50);
        assert_eq!(blend(d, s, BlendMode::Normal), s);
    }

    #[test]
    fn half_alpha_normal_mixes_evenly() {
        let d = Rgba8::rgb(0, 0, 0);
        let s = Rgba8::rgba(255, 255, 255, 128);
        let out = blend(d, s, BlendMode::Normal);
        assert_eq!(out, Rgba8::rgb(128, 128, 128));
    }

    #[test]
    fn premul_layer_skips_transparent_pixels() {
        let mut buf = PixelBuffer::filled(2, 1, Rgba8::rgb(10, 20, 30)).unwrap();
        let layer = [0, 0, 0, 0, 255, 0, 0, 255];
        blend_premul_layer(&mut buf, &layer, BlendMode::Normal).unwrap();
        assert_eq!(buf.get(0, 0).unwrap(), Rgba8::rgb(10, 20, 30));
        assert_eq!(buf.get(1, 0).unwrap(), Rgba8::rgb(255, 0, 0));
    }

    #[test]
    fn premul_layer_rejects_size_mismatch() {
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        assert!(blend_premul_layer(&mut buf, &[0; 4], BlendMode::Screen).is_err());
    }
}
