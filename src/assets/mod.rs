//! Asset loading: fetch, decode, SVG rasterization and font registration.

pub mod decode;
pub mod fetch;
pub mod fonts;
pub mod svg_raster;
