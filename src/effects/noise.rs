use rand::Rng;

use crate::foundation::buffer::PixelBuffer;

/// Per-channel bias of the tinted flavor: warm red, neutral green, reduced blue.
const TINT_BIAS: [f32; 3] = [5.0, 0.0, -5.0];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseFlavor {
    /// Same offset on R, G and B (sensor grain).
    #[default]
    Neutral,
    /// Offset plus a fixed warm cast (cheap print).
    Tinted,
}

/// Additive luminance noise: one sample per pixel in `[-0.5, 0.5) * amount * 255`.
///
/// `amount` is a fraction of the full channel range. Alpha is never touched.
pub fn apply_noise<R: Rng>(
    buffer: &mut PixelBuffer,
    amount: f32,
    flavor: NoiseFlavor,
    rng: &mut R,
) {
    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    let bias = match flavor {
        NoiseFlavor::Neutral => [0.0; 3],
        NoiseFlavor::Tinted => TINT_BIAS,
    };
    if amount == 0.0 && flavor == NoiseFlavor::Neutral {
        return;
    }

    let scale = amount * 255.0;
    for px in buffer.as_bytes_mut().chunks_exact_mut(4) {
        let n = (rng.random::<f32>() - 0.5) * scale;
        for c in 0..3 {
            let v = f32::from(px[c]) + n + bias[c];
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}
