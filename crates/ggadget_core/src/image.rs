//! Image boundary
//!
//! Decoding and file lookup live with the host. Elements only see the
//! [`Image`] trait and ask an [`ImageLoader`] for images by name; a missing
//! image is `None` and the element simply draws nothing.

use std::rc::Rc;

use image::{Rgba, RgbaImage};
use rustc_hash::FxHashMap;

use crate::draw::{Canvas, Color};

/// A drawable image with readable pixels
pub trait Image {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Color and opacity of the pixel under `(x, y)`, `None` outside the image
    fn point_value(&self, x: f64, y: f64) -> Option<(Color, f64)>;

    /// Draw the image stretched to the rectangle
    fn draw(&self, canvas: &mut dyn Canvas, x: f64, y: f64, width: f64, height: f64);
}

/// Resolves image names to images
pub trait ImageLoader {
    fn load_image(&self, name: &str, is_mask: bool) -> Option<Rc<dyn Image>>;
}

/// In-memory RGBA bitmap
#[derive(Clone, Debug)]
pub struct BitmapImage {
    pixels: RgbaImage,
}

impl BitmapImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// A bitmap filled with a single color
    pub fn filled(width: u32, height: u32, color: Color, opacity: f64) -> Self {
        let pixel = Rgba([
            channel(color.red),
            channel(color.green),
            channel(color.blue),
            channel(opacity),
        ]);
        Self::new(RgbaImage::from_pixel(width, height, pixel))
    }

    /// Decode an encoded image (PNG)
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match image::load_from_memory(bytes) {
            Ok(decoded) => Some(Self::new(decoded.to_rgba8())),
            Err(err) => {
                tracing::debug!("Failed to decode image: {}", err);
                None
            }
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Image for BitmapImage {
    fn width(&self) -> f64 {
        f64::from(self.pixels.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.pixels.height())
    }

    fn point_value(&self, x: f64, y: f64) -> Option<(Color, f64)> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let Rgba([r, g, b, a]) = *self.pixels.get_pixel_checked(x as u32, y as u32)?;
        Some((Color::from_rgb8(r, g, b), f64::from(a) / 255.0))
    }

    fn draw(&self, canvas: &mut dyn Canvas, x: f64, y: f64, width: f64, height: f64) {
        canvas.draw_image(x, y, width, height, self);
    }
}

/// Loader backed by a name table
#[derive(Default)]
pub struct MemoryImageLoader {
    images: FxHashMap<String, Rc<dyn Image>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, image: Rc<dyn Image>) {
        self.images.insert(name.into(), image);
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load_image(&self, name: &str, _is_mask: bool) -> Option<Rc<dyn Image>> {
        let image = self.images.get(name).cloned();
        if image.is_none() {
            tracing::debug!("Image not found: {}", name);
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_value_reads_pixels() {
        let mut bitmap = BitmapImage::filled(4, 2, Color::WHITE, 1.0);
        bitmap.pixels_mut().put_pixel(1, 1, Rgba([0, 0, 0, 255]));

        let (color, opacity) = bitmap.point_value(0.5, 0.5).expect("inside");
        assert_eq!(color, Color::WHITE);
        assert_eq!(opacity, 1.0);
        assert!(bitmap.point_value(1.9, 1.2).expect("inside").0.is_black());
        assert!(bitmap.point_value(4.0, 0.0).is_none());
        assert!(bitmap.point_value(-0.5, 0.0).is_none());
    }

    #[test]
    fn test_memory_loader() {
        let mut loader = MemoryImageLoader::new();
        loader.insert("mask.png", Rc::new(BitmapImage::filled(2, 2, Color::BLACK, 1.0)));
        assert!(loader.load_image("mask.png", true).is_some());
        assert!(loader.load_image("missing.png", false).is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(BitmapImage::decode(b"not an image").is_none());
    }
}
