//! cardforge renders synthetic identity cards and photographs them on a surface.
//!
//! The pipeline is fixed:
//!
//! - a [`ContentProvider`] picks the card content
//! - [`DocumentCompositor`] draws the card and ages it (hologram seal, scratches, print grain)
//! - [`SceneCompositor`] places it under a random tilt with shadow, glare, vignette and sensor noise
//! - [`encode`] turns the scene into JPEG or PNG bytes
//!
//! [`Pipeline`] wires these together for one request and [`dispatch::handle`] maps the result to
//! a response value.
#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod effects;
pub mod encode;
pub mod foundation;
pub mod pipeline;
pub mod render;

pub use crate::assets::fetch::{AssetFetcher, DefaultFetcher, MemoryFetcher};
pub use crate::compose::document::{DocumentAssets, DocumentCompositor, PortraitPolicy};
pub use crate::compose::scene::SceneCompositor;
pub use crate::config::ForgeConfig;
pub use crate::content::{Catalog, CatalogProvider, ContentProvider, DocumentSpec};
pub use crate::effects::blend::BlendMode;
pub use crate::encode::{OutputFormat, encode};
pub use crate::foundation::buffer::PixelBuffer;
pub use crate::foundation::color::Rgba8;
pub use crate::foundation::core::{Affine, Placement, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{ForgeError, ForgeResult};
pub use crate::pipeline::{Pipeline, RenderOutput};
