pub mod scan;

use crate::config::Config;
use crate::error::EnhanceError;
use image::RgbImage;
use tracing::warn;

pub use scan::ScanCleanup;

/// Image cleanup applied before layout. Output must keep the input dimensions.
pub trait Enhancer {
    fn name(&self) -> &str;
    fn enhance(&self, img: &RgbImage) -> Result<RgbImage, EnhanceError>;
}

/// Leaves images untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Enhancer for Passthrough {
    fn name(&self) -> &str {
        "none"
    }

    fn enhance(&self, img: &RgbImage) -> Result<RgbImage, EnhanceError> {
        Ok(img.clone())
    }
}

/// Builds the enhancer named by `enhance.mode`.
pub fn from_config(cfg: &Config) -> Box<dyn Enhancer> {
    match cfg.enhance.mode.as_str() {
        "scan_cleanup" => Box::new(ScanCleanup::new(&cfg.enhance)),
        "none" => Box::new(Passthrough),
        other => {
            warn!("unknown enhance.mode {other:?}; images are left unenhanced");
            Box::new(Passthrough)
        }
    }
}

impl<E: Enhancer + ?Sized> Enhancer for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn enhance(&self, img: &RgbImage) -> Result<RgbImage, EnhanceError> {
        (**self).enhance(img)
    }
}

/// Runs `enhancer`, falling back to the original image on error or on a
/// dimension change.
pub fn enhance_or_original<E: Enhancer + ?Sized>(enhancer: &E, file: &str, img: RgbImage) -> RgbImage {
    let result = enhancer.enhance(&img).and_then(|out| {
        if out.dimensions() == img.dimensions() {
            Ok(out)
        } else {
            Err(EnhanceError::DimensionMismatch {
                from: img.dimensions(),
                to: out.dimensions(),
            })
        }
    });
    match result {
        Ok(out) => out,
        Err(err) => {
            warn!("{file}: {} enhancement skipped: {err}", enhancer.name());
            img
        }
    }
}
