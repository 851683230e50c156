use crate::{
    batch::{Batch, InputImage},
    compositor::{Compositor, PlaceRequest},
    config::Config,
    enhance::{Enhancer, enhance_or_original},
    error::Result,
    export::{self, ArchiveOutput},
    finisher::{self, Document},
    font::FontBook,
    numbering::{NumberingPlan, NumberingResolver},
    report::{DocumentReport, ImageIssue, ImageReport},
    strip::StripPolicy,
};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Pipeline<E: Enhancer> {
    cfg: Config,
    fonts: FontBook,
    enhancer: E,
}

pub struct DocumentOutput {
    pub document: Document,
    pub pdf: Vec<u8>,
    pub report: DocumentReport,
}

impl<E: Enhancer> Pipeline<E> {
    pub fn new(cfg: &Config, fonts: FontBook, enhancer: E) -> Self {
        Self {
            cfg: cfg.clone(),
            fonts,
            enhancer,
        }
    }

    /// Sorts the batch and resolves every position's display number.
    /// Fails on malformed skip or strip expressions.
    pub fn plan(&self, batch: &Batch) -> Result<(Vec<InputImage>, NumberingPlan)> {
        let images = batch.sorted();
        let strip = StripPolicy::from_config(&self.cfg)?;
        let mut resolver = NumberingResolver::from_config(&self.cfg)?;
        let plan = NumberingPlan::build(&mut resolver, &strip, &images);
        for e in &plan.entries {
            debug!(
                "position {} {} -> {:?} strip={:?}",
                e.position, e.file, e.numbering, e.strip_fraction
            );
        }
        Ok((images, plan))
    }

    /// Lays the batch out on pages and serialises the PDF.
    pub fn build_document(&self, batch: &Batch) -> Result<DocumentOutput> {
        let started = Instant::now();
        self.cfg.validate()?;
        let (images, plan) = self.plan(batch)?;
        info!("document: {} images, {} numbered", images.len(), plan.numbered().count());

        let layout = &self.cfg.layout;
        let mut compositor = Compositor::new(layout, self.fonts.face(self.cfg.fonts.question_px));
        finisher::render_title_block(&mut compositor, &self.fonts, &self.cfg.fonts, &self.cfg.exam);

        let mut report = DocumentReport::default();
        for (entry, number) in plan.numbered() {
            let input = &images[entry.position as usize - 1];
            let img = match input.decode() {
                Ok(img) => img,
                Err(err) => {
                    warn!("{err}");
                    report.issues.push(ImageIssue {
                        file: input.name.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            let img = enhance_or_original(&self.enhancer, &input.name, img);

            let fragments = compositor.place(
                &img,
                PlaceRequest {
                    number: Some(number),
                    strip_fraction: entry.strip_fraction,
                },
            );
            debug!("{} placed as {} fragment(s)", input.name, fragments.len());
            report.images.push(ImageReport {
                position: entry.position,
                file: input.name.clone(),
                numbering: entry.numbering,
                strip_fraction: entry.strip_fraction,
                fragments,
            });
        }

        let document = finisher::finish(compositor, &self.fonts, &self.cfg);
        report.page_count = document.page_count();
        let pdf = document.to_pdf(&self.cfg)?;
        info!(
            "document: {} pages, {} bytes in {:?}",
            report.page_count,
            pdf.len(),
            started.elapsed()
        );

        Ok(DocumentOutput {
            document,
            pdf,
            report,
        })
    }

    /// Builds the flat archive of cropped question images.
    pub fn build_archive(&self, batch: &Batch) -> Result<ArchiveOutput> {
        self.cfg.validate()?;
        let (images, plan) = self.plan(batch)?;
        export::build_archive(&self.cfg, &images, &plan, &self.enhancer)
    }
}
