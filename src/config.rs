//! Fixed scene constants and the runtime-tunable settings edited from the
//! debug panel.

use glam::Vec3;

pub const CAMERA_FOV_DEG: f32 = 65.0;
pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 2000.0;

pub const HOME_EYE: Vec3 = Vec3::new(10.0, 0.0, 110.0);
pub const HOME_TARGET: Vec3 = Vec3::ZERO;

/// Browsers report ratios above 2 on dense screens; rendering at those is not worth it.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

pub const FOG_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
pub const FOG_NEAR: f32 = 50.0;
pub const FOG_FAR: f32 = 200.0;

pub const AMBIENT_INTENSITY: f32 = 1.0;
pub const SUN_INTENSITY: f32 = 4.0;
/// The sun sits straight overhead and shines towards the origin.
pub const SUN_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

pub const MIRROR_HEIGHT: f32 = -15.85;
pub const MIRROR_SIZE: f32 = 500.0;
pub const MIRROR_TINT: u32 = 0xb5b5b5;
pub const FLOOR_HEIGHT: f32 = -15.8;
pub const FLOOR_SIZE: f32 = 600.0;
pub const FLOOR_OPACITY: f32 = 0.8;

pub const HOLOGRAM_SAMPLES_PER_MESH: usize = 7000;
pub const HOLOGRAM_POINT_COLOR: u32 = 0x00ffff;
pub const HOLOGRAM_POINT_SIZE: f32 = 0.03;
pub const HOLOGRAM_SPIN_PER_FRAME: f32 = 0.01;
pub const HOLOGRAM_SCATTER_SECS: f32 = 2.0;
pub const HOLOGRAM_RETURN_SECS: f32 = 1.0;

/// Pointer travel (in CSS/logical pixels) beyond which a press becomes a drag.
pub const CLICK_SLOP_PX: f32 = 5.0;

pub const TITLE_FONT_PATH: &str = "fonts/NotoSerif-Italic.ttf";
pub const TITLE_TEXT_SIZE: f32 = 1.7;

pub const LINKEDIN_URL: &str = "https://www.linkedin.com/in/manikanta-bala-varma-seeram-3282ab24b/";
pub const GITHUB_URL: &str = "https://github.com/SMBalaVarma";
pub const MAIL_URL: &str = "mailto:manikanta.seeram111@gmail.com";
pub const TWITTER_URL: &str = "https://x.com/Varma00600037";

/// Where assets are read from. On the web this is relative to the page; natively it can be
/// overridden with `RAMEN_ASSET_ROOT`.
pub fn asset_root() -> String {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var("RAMEN_ASSET_ROOT").unwrap_or_else(|_| "assets".to_string())
    }
    #[cfg(target_arch = "wasm32")]
    {
        "assets".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            strength: 0.09,
            radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorMaterial {
    /// sRGB colour as edited in the colour picker.
    pub color: [u8; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
}

impl Default for FloorMaterial {
    fn default() -> Self {
        Self {
            color: [0x4a, 0x4a, 0x4a],
            metalness: 0.813,
            roughness: 0.321,
            clearcoat: 0.63,
            clearcoat_roughness: 0.076,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bloom: BloomParams,
    pub exposure: f32,
    pub mirror_blur: f32,
    pub floor: FloorMaterial,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bloom: BloomParams::default(),
            exposure: 1.2,
            mirror_blur: 0.9,
            floor: FloorMaterial::default(),
        }
    }
}

impl Settings {
    /// Exposure handed to the tone mapper; the slider works on its fourth root.
    pub fn tone_mapping_exposure(&self) -> f32 {
        self.exposure.powi(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_is_raised_to_the_fourth() {
        let settings = Settings { exposure: 2.0, ..Settings::default() };
        assert_eq!(settings.tone_mapping_exposure(), 16.0);
    }

    #[test]
    fn defaults_match_scene_tuning() {
        let settings = Settings::default();
        assert_eq!(settings.bloom.strength, 0.09);
        assert_eq!(settings.floor.color, [0x4a, 0x4a, 0x4a]);
    }
}
