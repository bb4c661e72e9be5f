//! Pixel storage, colour, geometry and error types shared by every stage.

pub mod buffer;
pub mod color;
pub mod core;
pub mod error;
pub(crate) mod math;
