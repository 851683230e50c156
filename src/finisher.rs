use crate::{
    compositor::Compositor,
    config::{Config, Decoration, Exam, Fonts},
    error::Result,
    font::{FontBook, FontHandle},
    pdf,
};
use image::{Rgb, RgbImage};
use tracing::debug;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Finished, decorated pages in output order.
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<RgbImage>,
}

impl Document {
    pub fn pages(&self) -> &[RgbImage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_pdf(&self, cfg: &Config) -> Result<Vec<u8>> {
        pdf::write_pdf(
            &self.pages,
            cfg.layout.resolution_dpi,
            cfg.output.pdf_jpeg_quality,
        )
    }
}

/// Draws the institution line and the exam line centred at the top of page 1
/// and moves the cursor below them.
pub fn render_title_block(compositor: &mut Compositor, book: &FontBook, fonts: &Fonts, exam: &Exam) {
    let page_w = compositor.layout().page_width;

    let header = book.face(fonts.header_px);
    let advance = draw_centred_line(compositor, &header, &exam.institution, page_w / 4, 10, 80);
    compositor.advance(advance);

    let sub = book.face(fonts.subheader_px);
    let line = format!("{}   {}", exam.exam_type, exam.exam_date);
    let advance = draw_centred_line(compositor, &sub, &line, page_w / 3, 40, 60);
    compositor.advance(advance);
}

/// Returns the rows consumed: measured height plus `spacing`, or
/// `fallback_advance` when the text could not be measured.
fn draw_centred_line(
    compositor: &mut Compositor,
    font: &FontHandle,
    text: &str,
    fallback_x: u32,
    spacing: u32,
    fallback_advance: u32,
) -> u32 {
    let page_w = compositor.layout().page_width;
    let y = compositor.cursor() as i32;
    match font.measure(text) {
        Ok((tw, th)) => {
            let x = (page_w as i32 - tw as i32) / 2;
            font.draw(compositor.current_canvas_mut(), BLACK, x, y, text);
            th + spacing
        }
        Err(err) => {
            debug!("title line {text:?}: {err}; using fixed offset");
            font.draw(compositor.current_canvas_mut(), BLACK, fallback_x as i32, y, text);
            fallback_advance
        }
    }
}

/// Closes the last page and stamps watermark and page numbers on every page.
pub fn finish(compositor: Compositor, book: &FontBook, cfg: &Config) -> Document {
    let mut pages = compositor.into_pages();
    let watermark = book.face(cfg.fonts.watermark_px);
    let numbers = book.face(cfg.fonts.page_number_px);

    for (i, page) in pages.iter_mut().enumerate() {
        if !cfg.decoration.watermark_text.is_empty() && cfg.decoration.watermark_opacity > 0.0 {
            stamp_watermark(page, &watermark, &cfg.decoration);
        }
        if i > 0 || cfg.decoration.number_first_page {
            stamp_page_number(page, &numbers, i + 1, &cfg.decoration);
        }
    }
    debug!("document finished with {} pages", pages.len());
    Document { pages }
}

/// Blends the watermark text over the page at (width/3, height/2).
fn stamp_watermark(page: &mut RgbImage, font: &FontHandle, deco: &Decoration) {
    let (w, h) = page.dimensions();
    let (ax, ay) = (w / 3, h / 2);

    // Coverage mask: text drawn black on white, limited to the text box when measurable.
    let (lw, lh) = match font.measure(&deco.watermark_text) {
        Ok((tw, th)) => (tw.min(w - ax), th.min(h - ay)),
        Err(_) => (w - ax, h - ay),
    };
    if lw == 0 || lh == 0 {
        return;
    }
    let mut mask = RgbImage::from_pixel(lw, lh, WHITE);
    font.draw(&mut mask, BLACK, 0, 0, &deco.watermark_text);

    let [cr, cg, cb] = deco.watermark_color;
    for (x, y, m) in mask.enumerate_pixels() {
        let coverage = 255 - m.0[0];
        if coverage == 0 {
            continue;
        }
        let a = deco.watermark_opacity * coverage as f32 / 255.0;
        let p = page.get_pixel_mut(ax + x, ay + y);
        for (c, target) in p.0.iter_mut().zip([cr, cg, cb]) {
            *c = (*c as f32 * (1.0 - a) + target as f32 * a).round() as u8;
        }
    }
}

fn stamp_page_number(page: &mut RgbImage, font: &FontHandle, number: usize, deco: &Decoration) {
    let (w, h) = page.dimensions();
    let text = number.to_string();
    let y = h.saturating_sub(deco.page_number_bottom_offset) as i32;
    let x = match font.measure(&text) {
        Ok((tw, _)) => w as i32 / 2 - tw as i32 / 2,
        Err(_) => w as i32 / 2,
    };
    font.draw(page, BLACK, x, y, &text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_lightens_only_covered_pixels() {
        let mut page = RgbImage::from_pixel(300, 200, Rgb([0, 0, 0]));
        let deco = Decoration {
            watermark_text: "L".into(),
            ..Decoration::default()
        };
        stamp_watermark(&mut page, &FontBook::builtin().face(40.0), &deco);
        assert_eq!(page.get_pixel(0, 0).0, [0, 0, 0]);
        // 'L' has its left column set: first cell at the anchor
        assert_eq!(page.get_pixel(100, 100).0, [40, 40, 40]);
    }
}
