use crate::ImageError;

/// RGBA8 pixels in row-major order, origin top-left.
///
/// Decoding is someone else's job; this type only guarantees that the byte
/// count matches the dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    pub const BYTES_PER_PIXEL: usize = 4;

    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A `size`x`size` checkerboard of `cell`-pixel squares alternating `a` and `b`,
    /// starting with `a` in the top-left corner.
    pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * Self::BYTES_PER_PIXEL);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * Self::BYTES_PER_PIXEL as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_pixel_data() {
        let err = Image::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            ImageError::SizeMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15,
            }
        );
    }

    #[test]
    fn checkerboard_alternates() {
        let white = [255, 255, 255, 255];
        let black = [0, 0, 0, 255];
        let img = Image::checkerboard(2, 1, white, black);
        assert_eq!(img.width(), 2);
        assert_eq!(img.bytes_per_row(), 8);
        assert_eq!(&img.pixels()[0..4], &white);
        assert_eq!(&img.pixels()[4..8], &black);
        assert_eq!(&img.pixels()[8..12], &black);
        assert_eq!(&img.pixels()[12..16], &white);
    }
}
