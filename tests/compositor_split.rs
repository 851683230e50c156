use image::{Rgb, RgbImage};
use sheetbinder::{
    compositor::{Compositor, PlaceRequest},
    config::{Alignment, Layout},
    font::FontBook,
};

fn small_layout() -> Layout {
    Layout {
        alignment: Alignment::Center,
        page_width: 200,
        page_height: 300,
        top_margin_first_page: 10,
        top_margin_subsequent_pages: 10,
        bottom_margin: 10,
        gap_between_images: 0,
        overlap_pixels: 5,
        side_margin: 20,
        content_width_ratio: 1.0,
        label_margin: 4,
        resolution_dpi: 100.0,
    }
}

fn compositor(layout: &Layout) -> Compositor {
    Compositor::new(layout, FontBook::builtin().face(16.0))
}

/// Each row carries its own index so duplicated rows can be recognised.
fn row_coded(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |_, y| Rgb([(y % 256) as u8, (y / 256) as u8, 7]))
}

#[test]
fn tall_image_splits_with_overlap() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let frags = c.place(&row_coded(200, 600), PlaceRequest::default());

    // usable height 280: fragments start at source rows 0, 280, 560
    assert_eq!(frags.len(), 3);
    let tops: Vec<_> = frags.iter().map(|f| f.source_top).collect();
    assert_eq!(tops, [0, 280, 560]);
    let heights: Vec<_> = frags.iter().map(|f| f.height).collect();
    assert_eq!(heights, [285, 285, 40]);
    assert!(frags[0].first && !frags[1].first);
    assert_eq!(frags.iter().map(|f| f.page_index).collect::<Vec<_>>(), [0, 1, 2]);

    let pages = c.into_pages();
    assert_eq!(pages.len(), 3);
    // source row 280 appears at the bottom of page 1 and the top of page 2
    assert_eq!(pages[0].get_pixel(100, 10 + 280).0, row_coded(1, 600).get_pixel(0, 280).0);
    assert_eq!(pages[1].get_pixel(100, 10).0, pages[0].get_pixel(100, 290).0);
    // bottom margin stays blank on the first page
    assert_eq!(pages[0].get_pixel(100, 296).0, [255, 255, 255]);
}

#[test]
fn short_image_is_not_split() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let frags = c.place(&row_coded(200, 100), PlaceRequest::default());
    assert_eq!(frags.len(), 1);
    assert_eq!(frags[0].y, 10);
    assert_eq!(c.cursor(), 110);
}

#[test]
fn cursor_in_bottom_margin_starts_new_page() {
    let layout = Layout {
        gap_between_images: 20,
        ..small_layout()
    };
    let mut c = compositor(&layout);
    c.place(&row_coded(200, 275), PlaceRequest::default());
    let frags = c.place(&row_coded(200, 50), PlaceRequest::default());
    assert_eq!(frags.len(), 1);
    assert_eq!(frags[0].page_index, 1);
    assert_eq!(frags[0].y, 10);
}

#[test]
fn alignment_positions() {
    let img = RgbImage::new(100, 20);
    let at = |alignment| {
        let layout = Layout {
            alignment,
            content_width_ratio: 0.5,
            ..small_layout()
        };
        let frag = compositor(&layout).place(&img, PlaceRequest::default()).remove(0);
        (frag.x, frag.width)
    };
    assert_eq!(at(Alignment::Center), (50, 100));
    assert_eq!(at(Alignment::Left), (20, 90));
    assert_eq!(at(Alignment::Right), (90, 90));
}

#[test]
fn strip_is_blanked_and_label_drawn_beside_it() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let black = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
    c.place(
        &black,
        PlaceRequest {
            number: Some(12),
            strip_fraction: Some(0.25),
        },
    );
    let page = c.into_pages().remove(0);
    // strip occupies x 0..50 of the fragment, fragment starts at y 10
    assert_eq!(page.get_pixel(10, 80).0, [255, 255, 255]);
    assert_eq!(page.get_pixel(120, 80).0, [0, 0, 0]);
}

#[test]
fn label_is_drawn_on_first_fragment() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let white = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
    c.place(
        &white,
        PlaceRequest {
            number: Some(3),
            strip_fraction: None,
        },
    );
    let page = c.into_pages().remove(0);
    // builtin face at 16px: 2px cells, label at (4, 4) inside the fragment
    let inked = (14..30)
        .flat_map(|y| (4..20).map(move |x| (x, y)))
        .any(|(x, y)| page.get_pixel(x, y).0 == [0, 0, 0]);
    assert!(inked);
}

/// The fragment region of page 1 for an image placed at the first-page margin.
fn first_fragment(page: &RgbImage, w: u32, h: u32) -> RgbImage {
    image::imageops::crop_imm(page, 0, 10, w, h).to_image()
}

fn label_only(w: u32, h: u32, x: i32, text: &str) -> RgbImage {
    let mut expected = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
    FontBook::builtin()
        .face(16.0)
        .draw(&mut expected, Rgb([0, 0, 0]), x, 4, text);
    expected
}

#[test]
fn full_strip_leaves_only_the_label() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let black = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
    c.place(
        &black,
        PlaceRequest {
            number: Some(7),
            strip_fraction: Some(1.0),
        },
    );
    let page = c.into_pages().remove(0);

    // "7." is 22px wide at 16px; it no longer fits beside the strip, so it
    // is right-aligned inside it: 200 - 22 - 4
    let got = first_fragment(&page, 200, 100);
    assert_eq!(got, label_only(200, 100, 174, "7."));
    assert!(got.pixels().any(|p| p.0 == [0, 0, 0]));
}

#[test]
fn zero_strip_blanks_nothing() {
    let layout = small_layout();
    let mut c = compositor(&layout);
    let white = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
    c.place(
        &white,
        PlaceRequest {
            number: Some(7),
            strip_fraction: Some(0.0),
        },
    );
    let black = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
    c.place(
        &black,
        PlaceRequest {
            number: None,
            strip_fraction: Some(0.0),
        },
    );
    let page = c.into_pages().remove(0);

    assert_eq!(first_fragment(&page, 200, 100), label_only(200, 100, 4, "7."));
    // second image starts right below the first, nothing blanked
    assert!((110..210).all(|y| page.get_pixel(0, y).0 == [0, 0, 0]));
}
