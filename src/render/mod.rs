//! Drawing surface over a pixel buffer, backed by `vello_cpu` and `parley`.

pub mod surface;
pub mod text;
