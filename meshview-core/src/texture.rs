/// Decoded surface textures
use std::path::Path;

use log::info;
use nalgebra::{Point2, Point3};

use crate::error::{RenderError, Result};
use crate::surface::Color;

/// A decoded RGBA8 image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Wrap raw RGBA bytes; the length must be exactly `width * height * 4`
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::TextureSize {
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

    /// Decode an encoded image (PNG or JPEG)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Load and decode an image file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        info!("Loaded texture {} ({}x{})", path.display(), width, height);
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// A texture filled with one colour
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let pixels = [color.r, color.g, color.b, color.a].repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at (x, y); coordinates are clamped to the image
    pub fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match self.pixels.get(idx..idx + 4) {
            Some(p) => Color::rgba(p[0], p[1], p[2], p[3]),
            None => Color::TRANSPARENT,
        }
    }

    pub fn set_texel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y as usize * self.width as usize + x as usize) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Texture pixel coordinate for an object-space position.
    ///
    /// Object x in [-1, 1] maps left to right; object y is flipped because
    /// image rows grow downwards while object y grows upwards.
    pub fn pixel_coordinate(&self, object: &Point3<f32>) -> Point2<f32> {
        let u = (object.x + 1.0) / 2.0;
        let v = (1.0 - object.y) / 2.0;
        Point2::new(u * self.width as f32, v * self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Texture::from_rgba(2, 2, vec![0; 16]).is_ok());
        match Texture::from_rgba(2, 2, vec![0; 15]) {
            Err(RenderError::TextureSize {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (16, 15)),
            other => panic!("expected TextureSize, got {:?}", other),
        }
    }

    #[test]
    fn test_pixel_coordinate_flips_y() {
        let texture = Texture::solid(200, 100, Color::WHITE);
        let top_left = texture.pixel_coordinate(&Point3::new(-1.0, 1.0, 0.3));
        let bottom_right = texture.pixel_coordinate(&Point3::new(1.0, -1.0, -0.3));
        let centre = texture.pixel_coordinate(&Point3::origin());
        assert_eq!(top_left, Point2::new(0.0, 0.0));
        assert_eq!(bottom_right, Point2::new(200.0, 100.0));
        assert_eq!(centre, Point2::new(100.0, 50.0));
    }

    #[test]
    fn test_texel_is_clamped() {
        let mut texture = Texture::solid(2, 2, Color::WHITE);
        texture.set_texel(1, 1, Color::rgb(1, 2, 3));
        assert_eq!(texture.texel(5, 9), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let texture = Texture::from_bytes(&png).unwrap();
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(texture.texel(2, 1), Color::rgb(9, 8, 7));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            Texture::from_bytes(b"not an image"),
            Err(RenderError::TextureDecode(_))
        ));
    }
}
