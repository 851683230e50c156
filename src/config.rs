use crate::{
    error::LayoutError,
    range,
    strip::{MAX_STRIP_RULES, StripPolicy},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exam: Exam,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub fonts: Fonts,
    #[serde(default)]
    pub decoration: Decoration,
    #[serde(default)]
    pub numbering: Numbering,
    #[serde(default)]
    pub strip: Vec<StripRule>,
    #[serde(default)]
    pub enhance: Enhance,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }

    /// Rejects configurations the layout engine cannot honour.
    pub fn validate(&self) -> std::result::Result<(), LayoutError> {
        let l = &self.layout;
        if l.page_width == 0 || l.page_height == 0 {
            return Err(LayoutError::Config("page size must be non-zero".into()));
        }
        let usable = l
            .page_height
            .saturating_sub(l.top_margin_subsequent_pages)
            .saturating_sub(l.bottom_margin);
        if usable <= l.overlap_pixels {
            return Err(LayoutError::Config(format!(
                "usable page height {usable} must exceed overlap_pixels {}",
                l.overlap_pixels
            )));
        }
        if l.top_margin_first_page + l.bottom_margin >= l.page_height {
            return Err(LayoutError::Config(
                "first page margins leave no room for content".into(),
            ));
        }
        if !(l.content_width_ratio > 0.0 && l.content_width_ratio <= 1.0) {
            return Err(LayoutError::Config(format!(
                "content_width_ratio must be in (0, 1], got {}",
                l.content_width_ratio
            )));
        }
        if 2 * l.side_margin >= l.page_width {
            return Err(LayoutError::Config("side_margin too large".into()));
        }
        if !(l.resolution_dpi > 0.0 && l.resolution_dpi.is_finite()) {
            return Err(LayoutError::Config("resolution_dpi must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.decoration.watermark_opacity) {
            return Err(LayoutError::Config(
                "watermark_opacity must be in [0, 1]".into(),
            ));
        }
        if self.strip.len() > MAX_STRIP_RULES {
            return Err(LayoutError::Config(format!(
                "at most {MAX_STRIP_RULES} strip rules are supported"
            )));
        }
        StripPolicy::from_rules(&self.strip)?;
        range::parse_skip(&self.numbering.skip)
            .map_err(|e| LayoutError::parse("numbering.skip", e))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Exam {
    pub institution: String,
    pub exam_type: String,
    pub exam_date: String,
}
impl Default for Exam {
    fn default() -> Self {
        Self {
            institution: "LITTLE FLOWER JUNIOR COLLEGE, UPPAL, HYD-39".into(),
            exam_type: "".into(),
            exam_date: "".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Center,
    Left,
    Right,
}

/// Page geometry, in pixels of the rendered page canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub alignment: Alignment,
    pub page_width: u32,
    pub page_height: u32,
    pub top_margin_first_page: u32,
    pub top_margin_subsequent_pages: u32,
    pub bottom_margin: u32,
    pub gap_between_images: u32,
    pub overlap_pixels: u32,
    pub side_margin: u32,
    pub content_width_ratio: f64,
    pub label_margin: u32,
    pub resolution_dpi: f32,
}
impl Default for Layout {
    fn default() -> Self {
        Self {
            alignment: Alignment::Center,
            // A4 at 300 dpi
            page_width: 2481,
            page_height: 3507,
            top_margin_first_page: 125,
            top_margin_subsequent_pages: 110,
            bottom_margin: 105,
            gap_between_images: 20,
            overlap_pixels: 25,
            side_margin: 50,
            content_width_ratio: 0.9,
            label_margin: 10,
            resolution_dpi: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub header_px: f32,
    pub subheader_px: f32,
    pub question_px: f32,
    pub page_number_px: f32,
    pub watermark_px: f32,
    pub candidates: Vec<String>,
}
impl Default for Fonts {
    fn default() -> Self {
        Self {
            header_px: 60.0,
            subheader_px: 45.0,
            question_px: 40.0,
            page_number_px: 30.0,
            watermark_px: 800.0,
            candidates: vec![
                "arial.ttf".into(),
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Decoration {
    pub watermark_text: String,
    pub watermark_opacity: f32,
    pub watermark_color: [u8; 3],
    pub page_number_bottom_offset: u32,
    pub number_first_page: bool,
}
impl Default for Decoration {
    fn default() -> Self {
        Self {
            watermark_text: "LFJC".into(),
            watermark_opacity: 0.20,
            watermark_color: [200, 200, 200],
            page_number_bottom_offset: 50,
            number_first_page: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Numbering {
    /// `"1-5:1, 6-10:41"`: image positions → starting display number.
    pub overrides: String,
    /// `"2,4-5,7"`: image positions left out of numbering and output.
    pub skip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripRule {
    pub questions: String,
    /// `"1/8"` or a decimal such as `"0.125"`.
    pub ratio: String,
}
impl Default for StripRule {
    fn default() -> Self {
        Self {
            questions: "".into(),
            ratio: "1/5".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Enhance {
    pub mode: String,
    pub denoise_radius: u32,
    pub threshold_block_radius: u32,
    pub sharpen: bool,
}
impl Default for Enhance {
    fn default() -> Self {
        Self {
            mode: "scan_cleanup".into(),
            denoise_radius: 1,
            threshold_block_radius: 14,
            sharpen: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_pdf: bool,
    pub write_archive: bool,
    pub write_report_json: bool,
    pub write_index_json: bool,
    pub pdf_jpeg_quality: u8,
    pub archive_name_prefix: String,
    pub archive_number_width: usize,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_pdf: true,
            write_archive: true,
            write_report_json: true,
            write_index_json: true,
            pdf_jpeg_quality: 90,
            archive_name_prefix: "Q".into(),
            archive_number_width: 3,
            report_filename: "report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_images: usize,
    pub max_image_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_images: 500,
            max_image_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            dump_effective_config: true,
        }
    }
}
