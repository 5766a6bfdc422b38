mod config;
#[cfg(feature = "distance")]
mod distance;
mod error;
pub mod heif;
mod kdtree;
mod mosaic;
mod palette;
mod pixelate;
pub mod preprocess;
mod source;
mod view;

pub use config::{MosaicConfig, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_OPEN_FILES, DEFAULT_TILE_SIZE};
#[cfg(feature = "distance")]
pub use distance::BulkColorIndex;
pub use error::{MosaicError, Result};
pub use kdtree::ColorIndex;
pub use mosaic::{generate, MosaicAssembler};
pub use palette::{PaletteBuilder, Tile, TilePalette};
pub use pixelate::{average_color, pixelate, PixelGrid};
pub use source::{load_image, FileTile, MemoryTile, TileSource};
pub use view::View;

// ====================
// PUBLIC TRAITS
// ====================

/// Read-only pixel access used by the pixelation and averaging code. Implemented for references
/// to any `image` crate view with 8-bit channels.
pub trait Image {
    type SubImage: Image;

    fn pixel(&self, x: u32, y: u32) -> Color;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn view(&self, x: u32, y: u32, width: u32, height: u32) -> Self::SubImage;
}

/// A set of colors that can be searched for the color closest to a given one.
pub trait Palette {

    /// Returns `None` only when the palette holds no colors.
    fn nearest(&self, color: Color) -> Option<Color>;

}

// ====================
// PUBLIC STRUCTS
// ====================

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }

    /// Channel by k-d tree axis: 0 is red, 1 is green, 2 is blue.
    pub fn channel(&self, axis: usize) -> u8 {
        match axis % 3 {
            0 => self.red,
            1 => self.green,
            _ => self.blue
        }
    }

    pub fn distance_squared(&self, other: Color) -> u32 {

        // u8 squared -> u16 needed, u16 x 3 -> u32 needed
        // Ex: 255^2 * 3 = 195075
        component_distance_squared(self.red, other.red)
            + component_distance_squared(self.green, other.green)
            + component_distance_squared(self.blue, other.blue)

    }
}

impl From<[u8; 3]> for Color {
    fn from(channels: [u8; 3]) -> Self {
        Color::new(channels[0], channels[1], channels[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.red, color.green, color.blue]
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

pub(crate) fn component_distance_squared(component1: u8, component2: u8) -> u32 {
    let distance = component1.abs_diff(component2) as u32;
    distance * distance
}
