use anyhow::Context;

use crate::assets::svg_raster::{rasterize_svg_to_premul_rgba8, svg_raster_size};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::error::ForgeResult;
use crate::render::surface::RasterImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Raster,
    Svg,
}

/// Guess the asset kind from its leading bytes. Anything that is not SVG markup is raster.
pub fn sniff(bytes: &[u8]) -> AssetKind {
    let head = &bytes[..bytes.len().min(512)];
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
        AssetKind::Svg
    } else {
        AssetKind::Raster
    }
}

/// Decode PNG/JPEG/GIF/WebP bytes into a straight-alpha buffer.
pub fn decode_image(bytes: &[u8]) -> ForgeResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_rgba8(width, height, rgba.into_raw())
}

pub fn parse_svg(bytes: &[u8]) -> ForgeResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Decode an asset for drawing into a `dest_w` x `dest_h` box.
///
/// Raster images keep their own resolution; SVG is rasterized at the box size.
pub fn decode_asset(bytes: &[u8], dest_w: f64, dest_h: f64) -> ForgeResult<RasterImage> {
    match sniff(bytes) {
        AssetKind::Raster => {
            let buffer = decode_image(bytes)?;
            RasterImage::from_buffer(&buffer)
        }
        AssetKind::Svg => {
            let tree = parse_svg(bytes)?;
            let (w, h) = svg_raster_size(&tree, dest_w, dest_h)?;
            let premul = rasterize_svg_to_premul_rgba8(&tree, w, h)?;
            RasterImage::from_premul_rgba8(w, h, &premul)
        }
    }
}
