use crate::foundation::error::{ForgeError, ForgeResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Pixel dimensions of a buffer or canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a validated size with both dimensions non-zero.
    pub fn new(width: u32, height: u32) -> ForgeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ForgeError::validation(format!(
                "size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Scale both dimensions, rounding up so the result always covers the scaled area.
    pub fn scaled_ceil(self, factor: f64) -> Self {
        Self {
            width: ((f64::from(self.width) * factor).ceil() as u32).max(1),
            height: ((f64::from(self.height) * factor).ceil() as u32).max(1),
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Rotation about a pivot followed by a translation: `translate(t) * rotate(angle) * translate(-pivot)`.
///
/// Used only to place the finished card into the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Where the pivot lands in the destination space.
    pub translation: Vec2,
    /// Rotation in radians, positive is clockwise in y-down pixel space.
    pub angle: f64,
    /// Pivot in source (card) space.
    pub pivot: Point,
}

impl Placement {
    /// Centre a `source` sized object inside `target`, rotated about its own centre.
    pub fn centered(source: Size, target: Size, angle: f64) -> Self {
        Self {
            translation: Vec2::new(
                f64::from(target.width) / 2.0,
                f64::from(target.height) / 2.0,
            ),
            angle,
            pivot: Point::new(
                f64::from(source.width) / 2.0,
                f64::from(source.height) / 2.0,
            ),
        }
    }

    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translation)
            * Affine::rotate(self.angle)
            * Affine::translate(-self.pivot.to_vec2())
    }
}
