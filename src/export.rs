use crate::{
    batch::InputImage,
    config::Config,
    enhance::{Enhancer, enhance_or_original},
    error::{LayoutError, Result},
    naming,
    numbering::NumberingPlan,
    report::{ArchiveReport, ImageIssue},
    strip,
};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub struct ArchiveOutput {
    pub bytes: Vec<u8>,
    pub report: ArchiveReport,
}

/// Writes one cropped PNG per numbered image into a flat ZIP.
///
/// `images` must be the natural-sorted batch the plan was built from. Files are
/// staged in a temporary directory that is removed when this returns.
pub fn build_archive<E: Enhancer + ?Sized>(
    cfg: &Config,
    images: &[InputImage],
    plan: &NumberingPlan,
    enhancer: &E,
) -> Result<ArchiveOutput> {
    let staging = tempfile::tempdir()
        .map_err(|e| LayoutError::io(std::env::temp_dir(), e))?;
    debug!("export staging dir {}", staging.path().display());

    let mut entries: Vec<String> = Vec::new();
    let mut issues = Vec::new();

    for (entry, number) in plan.numbered() {
        let Some(input) = images.get(entry.position as usize - 1) else {
            continue;
        };
        let img = match input.decode() {
            Ok(img) => img,
            Err(err) => {
                warn!("{err}");
                issues.push(ImageIssue {
                    file: input.name.clone(),
                    message: err.to_string(),
                });
                continue;
            }
        };
        let img = enhance_or_original(enhancer, &input.name, img);
        let img = match entry.strip_fraction {
            Some(f) if f > 0.0 => strip::crop(&img, f),
            _ => img,
        };

        let name = naming::question_filename(
            &cfg.output.archive_name_prefix,
            cfg.output.archive_number_width,
            number,
        );
        let path = staging.path().join(&name);
        if let Err(err) = img.save_with_format(&path, image::ImageFormat::Png) {
            warn!("{}: cannot write {name}: {err}", input.name);
            issues.push(ImageIssue {
                file: input.name.clone(),
                message: format!("cannot write {name}: {err}"),
            });
            continue;
        }
        if entries.contains(&name) {
            warn!("{}: {name} replaces an earlier image with the same number", input.name);
            issues.push(ImageIssue {
                file: input.name.clone(),
                message: format!("{name} replaced an earlier image with the same number"),
            });
        } else {
            entries.push(name);
        }
    }

    let bytes = zip_dir(staging.path(), &entries)?;
    info!("archive: {} images, {} bytes", entries.len(), bytes.len());
    Ok(ArchiveOutput {
        bytes,
        report: ArchiveReport { entries, issues },
    })
}

fn zip_dir(dir: &Path, entries: &[String]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for name in entries {
        let path = dir.join(name);
        let data = std::fs::read(&path).map_err(|e| LayoutError::io(&path, e))?;
        zip.start_file(name.as_str(), options)
            .map_err(archive_error)?;
        zip.write_all(&data).map_err(archive_error)?;
    }
    let cursor = zip.finish().map_err(archive_error)?;
    Ok(cursor.into_inner())
}

fn archive_error(e: impl std::fmt::Display) -> LayoutError {
    LayoutError::Serialization(format!("writing archive: {e}"))
}
