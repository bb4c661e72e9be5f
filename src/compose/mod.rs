//! Card and scene compositing stages.

pub mod document;
pub mod scene;
