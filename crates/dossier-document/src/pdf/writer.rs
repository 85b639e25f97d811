// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: create single-page PDFs from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use dossier_core::PaperSize;
use dossier_core::error::{DossierError, Result};
use dossier_core::types::POINTS_PER_INCH;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Resolution at which image pixels map to points before fitting.
const IMAGE_DPI: f32 = 150.0;

/// Where an image lands on the page, in points from the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Factor applied to the image's natural size at [`IMAGE_DPI`].
    pub scale: f32,
}

/// Fit an image of `img_w_pt` x `img_h_pt` inside the page minus `margin_pt`
/// on every side, preserving aspect ratio and centring on both axes. Images
/// are scaled up as well as down.
pub fn fit_image(
    page_w_pt: f32,
    page_h_pt: f32,
    margin_pt: f32,
    img_w_pt: f32,
    img_h_pt: f32,
) -> ImagePlacement {
    let usable_w = (page_w_pt - 2.0 * margin_pt).max(1.0);
    let usable_h = (page_h_pt - 2.0 * margin_pt).max(1.0);

    let scale = (usable_w / img_w_pt).min(usable_h / img_h_pt);
    let width = img_w_pt * scale;
    let height = img_h_pt * scale;

    ImagePlacement {
        x: (page_w_pt - width) / 2.0,
        y: (page_h_pt - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Creates new PDF documents from raster images.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Clear margin around the image on every side, in points.
    margin_pt: f32,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size and margin (inches).
    pub fn new(paper_size: PaperSize, margin_in: f32) -> Self {
        Self {
            paper_size,
            margin_pt: margin_in * POINTS_PER_INCH,
        }
    }

    /// A4 with a one-inch margin.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4, 1.0)
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Create a single-page PDF containing the given encoded image (JPEG, PNG).
    /// `title` goes into the document metadata.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len()))]
    pub fn create_from_image(&self, image_bytes: &[u8], title: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();

        info!(paper = ?self.paper_size, title, "Creating image PDF");

        let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
            DossierError::ImageError(format!("failed to decode image for PDF: {}", err))
        })?;

        let img_width = dynamic_image.width() as usize;
        let img_height = dynamic_image.height() as usize;
        if img_width == 0 || img_height == 0 {
            return Err(DossierError::ImageError("image has no pixels".into()));
        }

        // Convert to RGB8 for printpdf.
        let rgb_image = dynamic_image.to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb_image.into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let placement = fit_image(
            page_w.into_pt().0,
            page_h.into_pt().0,
            self.margin_pt,
            img_width as f32 / IMAGE_DPI * POINTS_PER_INCH,
            img_height as f32 / IMAGE_DPI * POINTS_PER_INCH,
        );

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.scale),
                scale_y: Some(placement.scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        debug!(
            rendered_w_pt = placement.width,
            rendered_h_pt = placement.height,
            scale = placement.scale,
            "Image placed on page"
        );

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        Ok(output)
    }

    /// Create an image PDF and write it directly to a file.
    pub fn write_image_to_file(
        &self,
        image_bytes: &[u8],
        title: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.create_from_image(image_bytes, title)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote image PDF to {}", path.as_ref().display());
        Ok(())
    }
}
