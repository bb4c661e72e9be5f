use crate::foundation::error::{ForgeError, ForgeResult};

const MAX_DIM: u32 = 4_096;

/// Raster size for drawing `tree` into a `dest_w` x `dest_h` box.
///
/// Rasterizing at the destination size avoids blurry upscaling of small logos.
pub fn svg_raster_size(tree: &usvg::Tree, dest_w: f64, dest_h: f64) -> ForgeResult<(u32, u32)> {
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || !size.height().is_finite() || size.height() <= 0.0 {
        return Err(ForgeError::render("svg has invalid width/height"));
    }
    let pick = |dest: f64, intrinsic: f32| -> u32 {
        let v = if dest.is_finite() && dest > 0.0 {
            dest
        } else {
            f64::from(intrinsic)
        };
        (v.ceil() as u32).max(1)
    };
    let w = pick(dest_w, size.width());
    let h = pick(dest_h, size.height());
    if w > MAX_DIM || h > MAX_DIM {
        return Err(ForgeError::render(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

/// Rasterize `tree` stretched to `width` x `height`. Output is premultiplied RGBA8.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> ForgeResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ForgeError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}
