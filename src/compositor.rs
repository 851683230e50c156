//! Page compositor: places scaled images on fixed-size pages, splitting them
//! across page breaks with a band of duplicated rows.

use crate::{
    config::{Alignment, Layout},
    error::RenderError,
    font::FontHandle,
    strip,
};
use image::{Rgb, RgbImage, imageops, imageops::FilterType};
use serde::Serialize;
use tracing::debug;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A page canvas and its vertical write cursor.
#[derive(Debug, Clone)]
struct Page {
    canvas: RgbImage,
    cursor: u32,
}

impl Page {
    fn blank(layout: &Layout, top_margin: u32) -> Self {
        Self {
            canvas: RgbImage::from_pixel(layout.page_width, layout.page_height, WHITE),
            cursor: top_margin,
        }
    }
}

/// Where one fragment of a source image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentPlacement {
    pub page_index: usize,
    pub x: i64,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// First row of the fragment within the scaled source image.
    pub source_top: u32,
    pub first: bool,
}

/// Layout inputs for one image.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceRequest {
    pub number: Option<u32>,
    pub strip_fraction: Option<f64>,
}

pub struct Compositor {
    layout: Layout,
    label_font: FontHandle,
    finished: Vec<Page>,
    current: Page,
}

impl Compositor {
    /// Starts with an empty first page, cursor at the first-page top margin.
    pub fn new(layout: &Layout, label_font: FontHandle) -> Self {
        Self {
            current: Page::blank(layout, layout.top_margin_first_page),
            layout: layout.clone(),
            label_font,
            finished: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cursor(&self) -> u32 {
        self.current.cursor
    }

    /// Moves the cursor down, e.g. past a title block.
    pub fn advance(&mut self, rows: u32) {
        self.current.cursor = self.current.cursor.saturating_add(rows);
    }

    pub fn current_canvas_mut(&mut self) -> &mut RgbImage {
        &mut self.current.canvas
    }

    /// Index of the page currently being filled.
    pub fn page_index(&self) -> usize {
        self.finished.len()
    }

    /// Uniform scale that makes an image `width` pixels wide fill the content area.
    pub fn scale_for(&self, width: u32) -> f64 {
        let l = &self.layout;
        let avail = match l.alignment {
            Alignment::Center => l.page_width as f64,
            Alignment::Left | Alignment::Right => l.page_width.saturating_sub(l.side_margin) as f64,
        };
        avail * l.content_width_ratio / width.max(1) as f64
    }

    fn remaining_space(&self) -> i64 {
        self.layout.page_height as i64 - self.current.cursor as i64 - self.layout.bottom_margin as i64
    }

    fn x_for(&self, fragment_width: u32) -> i64 {
        let l = &self.layout;
        let (page_w, frag_w, margin) = (l.page_width as i64, fragment_width as i64, l.side_margin as i64);
        match l.alignment {
            Alignment::Center => (page_w - frag_w) / 2,
            Alignment::Left => margin,
            Alignment::Right => page_w - frag_w - margin,
        }
    }

    fn break_page(&mut self) {
        let next = Page::blank(&self.layout, self.layout.top_margin_subsequent_pages);
        let done = std::mem::replace(&mut self.current, next);
        self.finished.push(done);
        debug!("page break -> page {}", self.finished.len() + 1);
    }

    /// Scales `img` to the content width and lays it out from the cursor,
    /// continuing on new pages as needed.
    pub fn place(&mut self, img: &RgbImage, req: PlaceRequest) -> Vec<FragmentPlacement> {
        let scale = self.scale_for(img.width());
        let w = ((img.width() as f64 * scale) as u32).max(1);
        let h = ((img.height() as f64 * scale) as u32).max(1);
        let scaled = if (w, h) == img.dimensions() {
            img.clone()
        } else {
            imageops::resize(img, w, h, FilterType::Lanczos3)
        };

        let overlap = self.layout.overlap_pixels;
        let mut placements = Vec::new();
        let mut top = 0u32;
        let mut first = true;

        loop {
            let space = self.remaining_space();
            if space <= 0 {
                // cursor already inside the bottom margin
                self.break_page();
                continue;
            }
            let space = space as u32;
            let rest = h - top;
            let (frag_h, last) = if rest <= space {
                (rest, true)
            } else {
                ((space + overlap).min(rest), false)
            };

            let mut fragment = imageops::crop_imm(&scaled, 0, top, w, frag_h).to_image();
            let strip_w = req
                .strip_fraction
                .map(|f| strip::redact(&mut fragment, f));
            if first {
                if let Some(n) = req.number {
                    self.stamp_label(&mut fragment, n, strip_w);
                }
            }

            let x = self.x_for(w);
            let y = self.current.cursor;
            imageops::replace(&mut self.current.canvas, &fragment, x, y as i64);
            placements.push(FragmentPlacement {
                page_index: self.page_index(),
                x,
                y,
                width: w,
                height: frag_h,
                source_top: top,
                first,
            });
            self.current.cursor = y + frag_h + self.layout.gap_between_images;
            first = false;

            if last {
                break;
            }
            top += space;
            self.break_page();
        }

        placements
    }

    /// Draws `"{n}."` near the top of a fragment: right of the blanked strip
    /// when one exists, else at the left edge.
    fn stamp_label(&self, fragment: &mut RgbImage, n: u32, strip_w: Option<u32>) {
        let text = format!("{n}.");
        let pad = self.layout.label_margin as i32;
        let x = match strip_w {
            None => pad,
            Some(sw) => label_x(sw, self.label_font.measure(&text), fragment.width(), pad),
        };
        self.label_font.draw(fragment, BLACK, x, pad, &text);
    }

    /// Closes the in-progress page (even if empty) and returns all pages.
    pub fn into_pages(mut self) -> Vec<RgbImage> {
        self.finished.push(self.current);
        self.finished.into_iter().map(|p| p.canvas).collect()
    }
}

/// Label x inside a fragment whose left `strip_w` columns are blanked.
fn label_x(strip_w: u32, measured: Result<(u32, u32), RenderError>, fragment_w: u32, pad: i32) -> i32 {
    match measured {
        Ok((tw, _)) => {
            let beside = strip_w as i32 + pad;
            if beside + tw as i32 <= fragment_w as i32 {
                beside
            } else {
                // strip covers (almost) everything; right-align inside it
                (strip_w as i32 - tw as i32 - pad).max(0)
            }
        }
        Err(err) => {
            debug!("label: {err}; using fixed offset");
            pad
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_sits_beside_strip_when_it_fits() {
        assert_eq!(label_x(50, Ok((22, 14)), 200, 4), 54);
    }

    #[test]
    fn label_moves_inside_full_width_strip() {
        assert_eq!(label_x(200, Ok((22, 14)), 200, 4), 174);
        assert_eq!(label_x(10, Ok((22, 14)), 20, 4), 0);
    }

    #[test]
    fn unmeasurable_label_uses_margin() {
        assert_eq!(label_x(50, Err(RenderError::MissingGlyph('7')), 200, 4), 4);
        assert_eq!(label_x(200, Err(RenderError::EmptyText), 200, 4), 4);
    }
}
