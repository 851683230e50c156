use crate::{
    config::{Config, StripRule},
    error::{LayoutError, Result},
    range,
};
use image::{RgbImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::collections::BTreeMap;

pub const MAX_STRIP_RULES: usize = 3;

const WHITE: image::Rgb<u8> = image::Rgb([255, 255, 255]);

/// Display number → fraction of image width to blank (document) or cut (export).
#[derive(Debug, Clone, Default)]
pub struct StripPolicy {
    fractions: BTreeMap<u32, f64>,
}

impl StripPolicy {
    /// Rules are applied in declared order; a later rule wins on overlap.
    pub fn from_rules(rules: &[StripRule]) -> Result<Self> {
        if rules.len() > MAX_STRIP_RULES {
            return Err(LayoutError::Config(format!(
                "at most {MAX_STRIP_RULES} strip rules are supported, got {}",
                rules.len()
            )));
        }

        let mut fractions = BTreeMap::new();
        for (i, rule) in rules.iter().enumerate() {
            if rule.questions.trim().is_empty() {
                continue;
            }
            let field = format!("strip[{i}]");
            let questions = range::parse_range(&rule.questions)
                .map_err(|e| LayoutError::parse(format!("{field}.questions"), e))?;
            let ratio = range::parse_ratio(&rule.ratio)
                .map_err(|e| LayoutError::parse(format!("{field}.ratio"), e))?;
            for q in questions {
                fractions.insert(q, ratio);
            }
        }
        Ok(Self { fractions })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::from_rules(&cfg.strip)
    }

    pub fn fraction_for(&self, number: u32) -> Option<f64> {
        self.fractions.get(&number).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}

/// Width in pixels of the strip for a given image width.
pub fn strip_width(width: u32, fraction: f64) -> u32 {
    ((width as f64 * fraction) as u32).min(width)
}

/// Paints the left strip white in place. Returns the painted width.
pub fn redact(img: &mut RgbImage, fraction: f64) -> u32 {
    let w = strip_width(img.width(), fraction);
    if w > 0 && img.height() > 0 {
        draw_filled_rect_mut(img, Rect::at(0, 0).of_size(w, img.height()), WHITE);
    }
    w
}

/// Removes the left strip, keeping at least one column.
pub fn crop(img: &RgbImage, fraction: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    if fraction <= 0.0 || width == 0 {
        return img.clone();
    }
    let keep = ((width as f64 * (1.0 - fraction)) as u32).clamp(1, width);
    imageops::crop_imm(img, width - keep, 0, keep, height).to_image()
}
