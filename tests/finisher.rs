use image::{Rgb, RgbImage};
use sheetbinder::{
    batch::Batch,
    compositor::{Compositor, PlaceRequest},
    config::Config,
    enhance::Passthrough,
    finisher,
    font::FontBook,
    pipeline::Pipeline,
};

fn small_config() -> Config {
    let mut cfg = Config::default();
    cfg.exam.exam_type = "Unit Test".into();
    cfg.exam.exam_date = "2024-07-15".into();
    cfg.layout.page_width = 200;
    cfg.layout.page_height = 300;
    cfg.layout.top_margin_first_page = 10;
    cfg.layout.top_margin_subsequent_pages = 10;
    cfg.layout.bottom_margin = 10;
    cfg.layout.side_margin = 10;
    cfg.layout.content_width_ratio = 1.0;
    cfg.fonts.page_number_px = 16.0;
    cfg.decoration.watermark_text = String::new();
    cfg
}

fn has_ink(page: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .any(|(x, y)| page.get_pixel(x, y).0 != [255, 255, 255])
}

#[test]
fn empty_batch_yields_single_title_page() {
    let cfg = small_config();
    let pipeline = Pipeline::new(&cfg, FontBook::builtin(), Passthrough);
    let out = pipeline.build_document(&Batch::default()).unwrap();
    assert_eq!(out.document.page_count(), 1);
    assert_eq!(out.report.page_count, 1);
    assert!(out.report.images.is_empty());
    // title block was drawn near the top
    assert!(has_ink(&out.document.pages()[0], 0..200, 10..60));
}

#[test]
fn page_numbers_start_on_second_page() {
    let cfg = small_config();
    let book = FontBook::builtin();
    let mut c = Compositor::new(&cfg.layout, book.face(cfg.fonts.question_px));
    let white = RgbImage::from_pixel(200, 400, Rgb([255, 255, 255]));
    c.place(&white, PlaceRequest::default());

    let doc = finisher::finish(c, &book, &cfg);
    assert_eq!(doc.page_count(), 2);
    // number sits at page_height - 50
    assert!(!has_ink(&doc.pages()[0], 80..120, 250..270));
    assert!(has_ink(&doc.pages()[1], 80..120, 250..270));
}

#[test]
fn first_page_can_be_numbered() {
    let mut cfg = small_config();
    cfg.decoration.number_first_page = true;
    let book = FontBook::builtin();
    let c = Compositor::new(&cfg.layout, book.face(cfg.fonts.question_px));
    let doc = finisher::finish(c, &book, &cfg);
    assert!(has_ink(&doc.pages()[0], 80..120, 250..270));
}

#[test]
fn watermark_tints_every_page() {
    let mut cfg = small_config();
    cfg.decoration.watermark_text = "LFJC".into();
    cfg.fonts.watermark_px = 40.0;
    let book = FontBook::builtin();
    let c = Compositor::new(&cfg.layout, book.face(cfg.fonts.question_px));
    let doc = finisher::finish(c, &book, &cfg);
    // 'L' left column starts at (width/3, height/2)
    let p = doc.pages()[0].get_pixel(66, 150).0;
    assert!(p[0] < 255 && p[0] >= 200);
}
