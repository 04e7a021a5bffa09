use crate::error::AssetError;

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Colour data is stored sRGB-encoded; masks and glyph coverage are not.
    pub srgb: bool,
}

impl ImageData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self { width: 1, height: 1, pixels: rgba.to_vec(), srgb: true }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Texture files shown on the info panels, keyed by file stem.
pub const PANEL_IMAGES: &[&str] = &[
    "bg",
    "car",
    "back",
    "about_page",
    "about",
    "exp_page",
    "experience",
    "skills_page",
    "skills",
    "github",
    "twitter",
    "mail",
    "linkedin",
    "credits_h",
    "credits_l",
    "screen",
];

pub fn image_path(key: &str) -> String {
    format!("images/{key}.png")
}

pub fn decode_image(path: &str, bytes: &[u8]) -> Result<ImageData, AssetError> {
    let img = image::load_from_memory(bytes).map_err(|source| AssetError::Image {
        path: path.to_string(),
        source,
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path, width, height, "decoded image");
    Ok(ImageData { width, height, pixels: rgba.into_raw(), srgb: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_rgb_png_into_rgba() {
        let image = decode_image("images/test.png", &png_bytes()).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 3 * 2 * 4);
        assert_eq!(&image.pixels[..4], &[255, 0, 0, 255]);
        assert!((image.aspect() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn garbage_reports_the_path() {
        let err = decode_image("images/broken.png", b"not a png").unwrap_err();
        assert_eq!(err.path(), "images/broken.png");
    }
}
