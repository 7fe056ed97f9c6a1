use crate::gb::ppu::misc::ColoredPixel;
use crate::gb::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Frame buffer to store the current screen state.
/// Holds one shade per pixel, row-major with the origin at the top left.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    buffer: Vec<ColoredPixel>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            buffer: vec![ColoredPixel::White; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl FrameBuffer {
    /// Returns the width of the frame buffer image in pixels.
    #[inline(always)]
    pub const fn width(&self) -> usize {
        SCREEN_WIDTH
    }

    /// Returns the height of the frame buffer image in pixels.
    #[inline(always)]
    pub const fn height(&self) -> usize {
        SCREEN_HEIGHT
    }

    /// Writes a colored pixel to the buffer, coordinates outside the screen are ignored.
    #[inline]
    pub fn write_pixel(&mut self, x: usize, y: usize, color: ColoredPixel) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            self.buffer[y * SCREEN_WIDTH + x] = color;
        }
    }

    /// Returns the pixel at the given coordinates.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<ColoredPixel> {
        match x < SCREEN_WIDTH {
            true => self.buffer.get(y * SCREEN_WIDTH + x).copied(),
            false => None,
        }
    }

    /// Returns a single row of the frame.
    #[inline]
    pub fn line(&self, y: usize) -> &[ColoredPixel] {
        &self.buffer[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    /// Returns the 2-bit shades of all pixels.
    pub fn shades(&self) -> Vec<u8> {
        self.buffer.iter().map(|pixel| u8::from(*pixel)).collect()
    }

    /// Clears the frame to white.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.fill(ColoredPixel::White);
    }
}
