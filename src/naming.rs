use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// Keeps word chars, whitespace, '.', '-', Latin-extended/Greek, and the CJK/Hangul blocks.
static UNSAFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\x{C0}-\x{1FFF}\x{2C00}-\x{D7FF}\x{F900}-\x{FDCF}\w\s.\-]").expect("static regex")
});
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Turns free-text exam metadata into a filesystem-safe token.
pub fn sanitize_filename(name: &str) -> String {
    let normalized: String = name.nfkc().collect();
    let cleaned = UNSAFE.replace_all(&normalized, "_");
    let cleaned = SPACES.replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

fn stem(exam_type: &str, exam_date: &str) -> String {
    format!(
        "{}_{}",
        sanitize_filename(exam_type),
        sanitize_filename(exam_date)
    )
}

pub fn document_filename(exam_type: &str, exam_date: &str) -> String {
    format!("{}_processed.pdf", stem(exam_type, exam_date))
}

pub fn archive_filename(exam_type: &str, exam_date: &str) -> String {
    format!("{}_processed_images.zip", stem(exam_type, exam_date))
}

/// `Q007.png` style entry name for one exported question image.
pub fn question_filename(prefix: &str, width: usize, number: u32) -> String {
    format!("{prefix}{number:0width$}.png")
}
