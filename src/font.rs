//! Font loading and text stamping.
//!
//! Loading always succeeds: configured candidates are tried first, then common
//! system locations, then a built-in 5x7 bitmap face. Measuring text can fail
//! (a glyph the face lacks); drawing cannot.

use crate::error::RenderError;
use ab_glyph::{Font, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

enum Face {
    Outline { source: String, font: FontVec },
    Builtin,
}

/// The face shared by every text role in a run.
#[derive(Clone)]
pub struct FontBook {
    face: Arc<Face>,
}

impl FontBook {
    pub fn load(candidates: &[String]) -> Self {
        let system = SYSTEM_FONTS.iter().map(|s| s.to_string());
        for path in candidates.iter().cloned().chain(system) {
            if let Some(face) = load_outline(&path) {
                info!("loaded font: {path}");
                return Self {
                    face: Arc::new(face),
                };
            }
        }
        debug!("no outline font found, using built-in bitmap face");
        Self::builtin()
    }

    pub fn builtin() -> Self {
        Self {
            face: Arc::new(Face::Builtin),
        }
    }

    pub fn face(&self, px: f32) -> FontHandle {
        FontHandle {
            face: Arc::clone(&self.face),
            px: px.max(1.0),
        }
    }

    /// Font file path, or `"builtin"`.
    pub fn source(&self) -> &str {
        match self.face.as_ref() {
            Face::Outline { source, .. } => source,
            Face::Builtin => "builtin",
        }
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("source", &self.source())
            .finish()
    }
}

fn load_outline(path: &str) -> Option<Face> {
    let data = std::fs::read(Path::new(path)).ok()?;
    let font = FontVec::try_from_vec(data).ok()?;
    Some(Face::Outline {
        source: path.to_string(),
        font,
    })
}

/// A face at one pixel size.
#[derive(Clone)]
pub struct FontHandle {
    face: Arc<Face>,
    px: f32,
}

impl FontHandle {
    /// Width and height of the rendered text.
    pub fn measure(&self, text: &str) -> Result<(u32, u32), RenderError> {
        if text.is_empty() {
            return Err(RenderError::EmptyText);
        }
        match self.face.as_ref() {
            Face::Outline { font, .. } => {
                if let Some(c) = text
                    .chars()
                    .find(|c| !c.is_whitespace() && font.glyph_id(*c).0 == 0)
                {
                    return Err(RenderError::MissingGlyph(c));
                }
                Ok(text_size(PxScale::from(self.px), font, text))
            }
            Face::Builtin => {
                if let Some(c) = text.chars().find(|c| bitmap::glyph(*c).is_none()) {
                    return Err(RenderError::MissingGlyph(c));
                }
                let m = bitmap::module(self.px);
                let n = text.chars().count() as u32;
                Ok((n * bitmap::ADVANCE * m - m, bitmap::ROWS * m))
            }
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`, clipped to the canvas.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        match self.face.as_ref() {
            Face::Outline { font, .. } => {
                draw_text_mut(canvas, color, x, y, PxScale::from(self.px), font, text)
            }
            Face::Builtin => bitmap::draw(canvas, color, x, y, self.px, text),
        }
    }
}

mod bitmap {
    use super::*;

    pub const ROWS: u32 = 7;
    pub const ADVANCE: u32 = 6;

    /// Side of one bitmap cell in pixels for a nominal font size.
    pub fn module(px: f32) -> u32 {
        ((px / 8.0).round() as u32).max(1)
    }

    pub fn draw(canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str) {
        let m = module(px);
        let mut pen = x;
        for c in text.chars() {
            if let Some(rows) = glyph(c) {
                for (r, bits) in rows.iter().enumerate() {
                    for col in 0..5u32 {
                        if bits & (0x10 >> col) != 0 {
                            let cell = Rect::at(pen + (col * m) as i32, y + (r as u32 * m) as i32)
                                .of_size(m, m);
                            draw_filled_rect_mut(canvas, cell, color);
                        }
                    }
                }
            }
            pen += (ADVANCE * m) as i32;
        }
    }

    pub fn glyph(c: char) -> Option<[u8; 7]> {
        let g = match c.to_ascii_uppercase() {
            ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
            '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
            '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
            '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
            '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
            '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
            '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
            '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
            '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
            '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
            'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
            'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
            'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
            'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
            'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
            'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
            'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
            'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
            'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
            'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
            'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
            'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
            'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
            'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
            'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
            'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
            'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
            'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
            'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
            'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
            'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
            'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
            '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
            ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
            '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
            '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
            ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
            '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
            '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
            ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
            '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
            '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
            _ => return None,
        };
        Some(g)
    }
}
