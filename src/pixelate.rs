use image::RgbImage;
use rayon::prelude::*;
use crate::{Color, Image, MosaicError, Result};

// ====================
// PUBLIC STRUCTS
// ====================

/// Average colors of the blocks of an image, stored row by row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    colors: Vec<Color>
}

impl PixelGrid {
    pub fn from_colors(width: u32, height: u32, colors: Vec<Color>) -> Result<Self> {
        if colors.len() as u64 != width as u64 * height as u64 {
            return Err(MosaicError::InvalidConfig("grid size does not match the number of colors"));
        }

        Ok(PixelGrid { width, height, colors })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Panics if `x` or `y` is outside the grid.
    pub fn color(&self, x: u32, y: u32) -> Color {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) is outside a {}x{} grid", self.width, self.height);
        self.colors[y as usize * self.width as usize + x as usize]
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// One pixel per cell.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| self.color(x, y).into())
    }
}

// ====================
// PUBLIC FUNCTIONS
// ====================

/// Reduces an image to the average colors of its `block_size` by `block_size` blocks. Blocks
/// along the right and bottom edges may be smaller and are averaged over the pixels they hold.
pub fn pixelate<I: Image + Sync>(image: I, block_size: u32) -> Result<PixelGrid> {
    if block_size == 0 {
        return Err(MosaicError::InvalidConfig("block size must be positive"));
    }

    let image_width = image.width();
    let image_height = image.height();
    if image_width == 0 || image_height == 0 {
        return Err(MosaicError::unreadable("target image", "image has no pixels"));
    }

    let width = image_width.div_ceil(block_size);
    let height = image_height.div_ceil(block_size);
    let cells = width as usize * height as usize;

    let image = &image;
    let colors: Option<Vec<Color>> = (0..cells).into_par_iter()
        .map(|cell| {
            let x = (cell % width as usize) as u32 * block_size;
            let y = (cell / width as usize) as u32 * block_size;
            let block = image.view(
                x,
                y,
                block_size.min(image_width - x),
                block_size.min(image_height - y)
            );
            average_color(block)
        })
        .collect();

    let colors = colors.ok_or_else(|| MosaicError::unreadable("target image", "empty block"))?;
    Ok(PixelGrid { width, height, colors })
}

/// Truncated mean of each channel over every pixel of the image, or `None` if it has no pixels.
pub fn average_color<I: Image>(image: I) -> Option<Color> {
    let width = image.width();
    let height = image.height();
    let count = width as u64 * height as u64;
    if count == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for y in 0..height {
        for x in 0..width {
            let color = image.pixel(x, y);
            sums[0] += color.red as u64;
            sums[1] += color.green as u64;
            sums[2] += color.blue as u64;
        }
    }

    // Means of u8 values always fit in a u8
    Some(Color::new(
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8
    ))
}
