//! Multi-page PDF output: one full-page JPEG image per page.

use crate::error::{LayoutError, Result};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

/// Writes `pages` in order, each page sized `pixels * 72 / dpi` points.
pub fn write_pdf(pages: &[RgbImage], dpi: f32, jpeg_quality: u8) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(LayoutError::Serialization("document has no pages".into()));
    }
    if !(dpi > 0.0 && dpi.is_finite()) {
        return Err(LayoutError::Serialization(format!("invalid resolution {dpi}")));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        let (w, h) = page.dimensions();
        let jpeg = encode_jpeg(page, jpeg_quality)
            .map_err(|e| LayoutError::Serialization(format!("page {}: {e}", i + 1)))?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(w as i64),
                "Height" => Object::Integer(h as i64),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let pt_w = w as f32 * 72.0 / dpi;
        let pt_h = h as f32 * 72.0 / dpi;
        let content = format!("q {pt_w:.4} 0 0 {pt_h:.4} 0 0 cm /Im0 Do Q");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(pt_w),
                Object::Real(pt_h),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| LayoutError::Serialization(format!("writing PDF: {e}")))?;
    debug!("pdf: {} pages, {} bytes", pages.len(), buf.len());
    Ok(buf)
}

fn encode_jpeg(page: &RgbImage, quality: u8) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(page)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_resolution() {
        let pages = [RgbImage::new(2, 2)];
        assert!(write_pdf(&pages, f32::NAN, 90).is_err());
        assert!(write_pdf(&pages, 0.0, 90).is_err());
        assert!(write_pdf(&pages, 100.0, 90).is_ok());
    }
}
