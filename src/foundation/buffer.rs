use crate::foundation::color::Rgba8;
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Straight-alpha RGBA8 raster, row-major, fixed size for its whole lifetime.
///
/// Every effect takes `&mut PixelBuffer` and mutates it in place. Stages hand buffers
/// downstream by value, never by clone.
#[derive(Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate an opaque white buffer.
    pub fn new(width: u32, height: u32) -> ForgeResult<Self> {
        Self::filled(width, height, Rgba8::WHITE)
    }

    /// Allocate a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> ForgeResult<Self> {
        let size = Size::new(width, height)?;
        let len = byte_len(size.width, size.height)?;
        let mut data = vec![0u8; len];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_array());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap existing straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ForgeResult<Self> {
        Size::new(width, height)?;
        if data.len() != byte_len(width, height)? {
            return Err(ForgeError::validation(
                "from_rgba8 expects data matching width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn get(&self, x: u32, y: u32) -> ForgeResult<Rgba8> {
        let idx = self.index(x, y)?;
        Ok(Rgba8::from_array([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgba8) -> ForgeResult<()> {
        let idx = self.index(x, y)?;
        self.data[idx..idx + 4].copy_from_slice(&color.to_array());
        Ok(())
    }

    pub fn fill(&mut self, color: Rgba8) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Raw RGBA8 bytes, four per pixel.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA8 bytes for passes that scan every pixel.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Iterate pixels as `(x, y, rgba)` in row-major order.
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut [u8])> {
        let w = self.width;
        self.data
            .chunks_exact_mut(4)
            .enumerate()
            .map(move |(i, px)| ((i as u32) % w, (i as u32) / w, px))
    }

    fn index(&self, x: u32, y: u32) -> ForgeResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(ForgeError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(((y as usize) * (self.width as usize) + (x as usize)) * 4)
    }
}

fn byte_len(width: u32, height: u32) -> ForgeResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ForgeError::validation("pixel buffer size overflow"))
}
