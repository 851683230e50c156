use crate::{
    config::Config,
    error::{LayoutError, Result},
    report::ImageIssue,
};
use image::RgbImage;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));

/// One uploaded answer-sheet image: original filename plus encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn decode(&self) -> Result<RgbImage> {
        image::load_from_memory(&self.bytes)
            .map(|img| img.to_rgb8())
            .map_err(|source| LayoutError::Decode {
                file: self.name.clone(),
                source,
            })
    }
}

/// Ordered input images for one run, plus the inputs left out while loading.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    images: Vec<InputImage>,
    skipped: Vec<ImageIssue>,
}

impl Batch {
    /// Builds a batch, keeping the first image for each repeated filename.
    pub fn new(images: Vec<InputImage>) -> Self {
        Self::with_skipped(images, Vec::new())
    }

    fn with_skipped(images: Vec<InputImage>, skipped: Vec<ImageIssue>) -> Self {
        let mut batch = Self {
            images: Vec::new(),
            skipped,
        };
        for img in images {
            let name = img.name.clone();
            if !batch.push(img) {
                batch.skipped.push(ImageIssue {
                    file: name,
                    message: "repeated filename ignored".into(),
                });
            }
        }
        batch
    }

    /// Reads every png/jpg/jpeg file directly under `dir`.
    pub fn from_dir(cfg: &Config, dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| LayoutError::io(dir, e))?;

        let mut images = Vec::new();
        let mut skipped = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LayoutError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                skipped.push(ImageIssue {
                    file: path.display().to_string(),
                    message: "filename is not valid UTF-8".into(),
                });
                continue;
            };
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if len > cfg.limits.max_image_bytes {
                skipped.push(ImageIssue {
                    file: name.to_string(),
                    message: format!(
                        "{len} bytes exceeds max_image_bytes {}",
                        cfg.limits.max_image_bytes
                    ),
                });
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| LayoutError::io(&path, e))?;
            images.push(InputImage::new(name, bytes));
        }
        // read_dir order is platform dependent; natural-sort ties must not be.
        images.sort_by(|a, b| a.name.cmp(&b.name));
        skipped.sort_by(|a, b| a.file.cmp(&b.file));
        let batch = Batch::with_skipped(images, skipped);

        if batch.len() > cfg.limits.max_images {
            return Err(LayoutError::Config(format!(
                "batch has {} images, max_images is {}",
                batch.len(),
                cfg.limits.max_images
            )));
        }
        debug!("loaded {} images from {}", batch.len(), dir.display());
        Ok(batch)
    }

    /// Adds an image unless one with the same name is already queued.
    pub fn push(&mut self, img: InputImage) -> bool {
        if self.images.iter().any(|i| i.name == img.name) {
            return false;
        }
        self.images.push(img);
        true
    }

    /// Inputs that were not admitted, with the reason.
    pub fn skipped(&self) -> &[ImageIssue] {
        &self.skipped
    }

    /// Images in insertion order.
    pub fn images(&self) -> &[InputImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Images in natural filename order. Ties keep insertion order.
    pub fn sorted(&self) -> Vec<InputImage> {
        let mut out = self.images.clone();
        out.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        out
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Text(String),
    // (significant digit count, digits without leading zeros)
    Number(usize, String),
}

/// Splits a name into alternating text / digit-run parts, text lowercased.
fn natural_key(s: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in DIGIT_RUN.find_iter(s) {
        parts.push(KeyPart::Text(s[last..m.start()].to_lowercase()));
        let digits = m.as_str().trim_start_matches('0');
        parts.push(KeyPart::Number(digits.len(), digits.to_string()));
        last = m.end();
    }
    parts.push(KeyPart::Text(s[last..].to_lowercase()));
    parts
}

/// Compares names with digit runs taken as integers: `img2` < `img10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Sorts names in natural order.
pub fn natural_sort(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}
