//! Per-pixel effects: blend modes, gradients, noise and blur.

pub mod blend;
pub mod blur;
pub mod gradient;
pub mod noise;
