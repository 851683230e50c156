use super::Enhancer;
use crate::config::Enhance;
use crate::error::EnhanceError;
use image::{DynamicImage, RgbImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::{median_filter, sharpen3x3};

/// Grayscale, median denoise, adaptive threshold, then an optional 3x3 sharpen.
#[derive(Debug, Clone)]
pub struct ScanCleanup {
    denoise_radius: u32,
    block_radius: u32,
    sharpen: bool,
}

impl ScanCleanup {
    pub fn new(cfg: &Enhance) -> Self {
        Self {
            denoise_radius: cfg.denoise_radius,
            block_radius: cfg.threshold_block_radius,
            sharpen: cfg.sharpen,
        }
    }
}

impl Enhancer for ScanCleanup {
    fn name(&self) -> &str {
        "scan_cleanup"
    }

    fn enhance(&self, img: &RgbImage) -> Result<RgbImage, EnhanceError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(EnhanceError::Failed("empty image".into()));
        }
        if self.block_radius == 0 {
            return Err(EnhanceError::Failed("threshold_block_radius must be > 0".into()));
        }

        let gray = DynamicImage::ImageRgb8(img.clone()).to_luma8();
        let denoised = if self.denoise_radius > 0 {
            median_filter(&gray, self.denoise_radius, self.denoise_radius)
        } else {
            gray
        };
        let binary = adaptive_threshold(&denoised, self.block_radius);
        let out = if self.sharpen {
            sharpen3x3(&binary)
        } else {
            binary
        };
        Ok(DynamicImage::ImageLuma8(out).to_rgb8())
    }
}
