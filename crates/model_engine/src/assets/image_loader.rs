//! Image loading utilities for texture data

use std::path::Path;

use crate::assets::ModelError;

/// Loaded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Tightly packed RGBA8 pixels, top row first
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        log::debug!("Loading image from: {:?}", path);

        let img = image::open(path).map_err(|e| ModelError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("Loaded image {}x{} from {:?}", width, height, path);
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let img = image::load_from_memory(bytes).map_err(|e| ModelError::Image {
            path: "<memory>".into(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Single-color image, used as the fallback texture
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            data: color.repeat(pixels),
            width,
            height,
        }
    }

    /// Size of the pixel data in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color() {
        let image = ImageData::solid_color(2, 3, [255, 0, 128, 255]);
        assert_eq!(image.byte_len(), 2 * 3 * 4);
        assert!(image.data.chunks(4).all(|px| px == [255, 0, 128, 255]));
    }

    #[test]
    fn test_from_bytes_png() {
        let mut png = Vec::new();
        let source = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let image = ImageData::from_bytes(&png).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(&image.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_file_is_image_error() {
        let result = ImageData::from_file("definitely/not/here.png");
        assert!(matches!(result, Err(ModelError::Image { .. })));
    }
}
