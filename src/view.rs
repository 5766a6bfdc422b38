use image::{GenericImageView, Pixel, Rgb};
use crate::{Color, Image};

fn convert_color<P: Pixel<Subpixel=u8>>(pixel: P) -> Color {
    let rgb = pixel.to_rgb();
    let channels = rgb.channels();

    // Alpha, if any, does not take part in matching
    Color::new(channels[0], channels[1], channels[2])
}

/// A rectangular window into an image. Coordinates are relative to the window's top-left corner.
pub struct View<'a, I> {
    image: &'a I,
    x: u32,
    y: u32,
    width: u32,
    height: u32
}

impl<I> Image for View<'_, I> where I: GenericImageView, I::Pixel: Pixel<Subpixel=u8> {
    type SubImage = Self;

    fn pixel(&self, x: u32, y: u32) -> Color {
        convert_color(self.image.get_pixel(self.x + x, self.y + y))
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn view(&self, x: u32, y: u32, width: u32, height: u32) -> Self::SubImage {
        View {
            image: self.image,
            x: self.x + x,
            y: self.y + y,
            width,
            height
        }
    }
}

impl<'a, I> Image for &'a I where I: GenericImageView, I::Pixel: Pixel<Subpixel=u8> {
    type SubImage = View<'a, I>;

    fn pixel(&self, x: u32, y: u32) -> Color {
        convert_color(self.get_pixel(x, y))
    }

    fn width(&self) -> u32 {
        I::width(self)
    }

    fn height(&self) -> u32 {
        I::height(self)
    }

    fn view(&self, x: u32, y: u32, width: u32, height: u32) -> Self::SubImage {
        View {
            image: *self,
            x,
            y,
            width,
            height
        }
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        Color::from(pixel.0)
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb(color.into())
    }
}
