//! Title lettering: glyphs rasterised with fontdue into a coverage texture that is shown on
//! a plane in the scene.

use fontdue::{Font, FontSettings};

use crate::assets::texture::ImageData;
use crate::error::AssetError;

/// Rasterisation size in pixels per em.
pub const TEXT_RASTER_PX: f32 = 128.0;
const PAD: usize = 4;

pub fn parse_font(path: &str, bytes: &[u8]) -> Result<Font, AssetError> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| AssetError::Font {
        path: path.to_string(),
        reason: reason.to_string(),
    })
}

/// White glyphs with coverage in alpha, plus where the baseline falls.
#[derive(Debug, Clone)]
pub struct TextRaster {
    pub image: ImageData,
    /// Distance from the top edge to the baseline, in pixels.
    pub baseline_px: f32,
    /// Pixels per em used while rasterising.
    pub px_per_em: f32,
}

impl TextRaster {
    /// Plane size in world units when one em spans `em_size` units.
    pub fn world_size(&self, em_size: f32) -> (f32, f32) {
        let scale = em_size / self.px_per_em;
        (self.image.width as f32 * scale, self.image.height as f32 * scale)
    }
}

pub fn rasterize_text(font: &Font, text: &str, px: f32) -> TextRaster {
    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map(|m| (m.ascent, m.descent))
        .unwrap_or((px, -px * 0.25));

    let mut glyphs = Vec::new();
    let mut pen = 0.0f32;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(kern) = prev.and_then(|p| font.horizontal_kern(p, c, px)) {
            pen += kern;
        }
        let (metrics, coverage) = font.rasterize(c, px);
        glyphs.push((pen, metrics, coverage));
        pen += metrics.advance_width;
        prev = Some(c);
    }

    let width = pen.ceil().max(1.0) as usize + PAD * 2;
    let height = (ascent - descent).ceil().max(1.0) as usize + PAD * 2;
    let baseline = PAD as f32 + ascent;

    let mut pixels = vec![0u8; width * height * 4];
    for (x, metrics, coverage) in &glyphs {
        let left = PAD as i32 + (*x + metrics.xmin as f32).round() as i32;
        let top = baseline.round() as i32 - (metrics.ymin + metrics.height as i32);
        blit_coverage(&mut pixels, width, height, left, top, metrics.width, coverage);
    }

    tracing::debug!(text, width, height, "text rasterised");
    TextRaster {
        image: ImageData { width: width as u32, height: height as u32, pixels, srgb: false },
        baseline_px: baseline,
        px_per_em: px,
    }
}

/// Max-blend a glyph coverage bitmap into an RGBA canvas at (`left`, `top`), clipping at the
/// edges.
fn blit_coverage(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    left: i32,
    top: i32,
    glyph_width: usize,
    coverage: &[u8],
) {
    if glyph_width == 0 {
        return;
    }
    for (row, line) in coverage.chunks_exact(glyph_width).enumerate() {
        let y = top + row as i32;
        if y < 0 || y >= height as i32 {
            continue;
        }
        for (col, &alpha) in line.iter().enumerate() {
            let x = left + col as i32;
            if x < 0 || x >= width as i32 {
                continue;
            }
            let i = (y as usize * width + x as usize) * 4;
            pixels[i..i + 3].copy_from_slice(&[255, 255, 255]);
            pixels[i + 3] = pixels[i + 3].max(alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_font_is_an_error() {
        let err = parse_font("fonts/broken.ttf", &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, AssetError::Font { .. }));
        assert_eq!(err.path(), "fonts/broken.ttf");
    }

    #[test]
    fn blit_clips_and_keeps_max_coverage() {
        let (w, h) = (4, 3);
        let mut pixels = vec![0u8; w * h * 4];
        // 2x2 glyph hanging off the right edge
        blit_coverage(&mut pixels, w, h, 3, 1, 2, &[200, 90, 50, 10]);
        assert_eq!(pixels[(w + 3) * 4 + 3], 200);
        assert_eq!(pixels[(2 * w + 3) * 4 + 3], 50);
        blit_coverage(&mut pixels, w, h, 3, 1, 1, &[100]);
        assert_eq!(pixels[(w + 3) * 4 + 3], 200, "lower coverage does not erase");
        assert_eq!(pixels[3], 0);
    }

    #[test]
    fn world_size_follows_em() {
        let raster = TextRaster {
            image: ImageData { width: 256, height: 64, pixels: vec![0; 256 * 64 * 4], srgb: false },
            baseline_px: 48.0,
            px_per_em: 32.0,
        };
        assert_eq!(raster.world_size(1.0), (8.0, 2.0));
    }
}
