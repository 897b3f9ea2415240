// PDF drawing: the page composer, the cell renderer and the top-level report
// renderer. All geometry decisions come from `layout`; this module only puts
// ink on pages.

use ::image::{DynamicImage, Rgba, RgbImage};
use printpdf::*;

use crate::error::ReportError;
use crate::layout::{
    body_line_height_mm, column_width_mm, continuation_capacity_mm, forced_break, measure_entry,
    split_segments, table_width_mm, CellContent, LayoutCursor, RemarksContent, RowMeasure,
};
use crate::measure::{line_height_mm, string_width_mm, wrap, PT_TO_MM};
use crate::model::{
    column_specs, format_date, ColumnGroup, ColumnSpec, Entry, ReportDocument,
};
use crate::signature::{load_image, preload, ImageStore, SignatureCache};
use crate::{
    BODY_FONT_SIZE, CELL_PAD_X_MM, COLUMN_HEADER_HEIGHT_MM, CONTENT_BOTTOM_MM,
    FOOTER_BASELINE_MM, FOOTER_FONT_SIZE, GROUP_HEADER_HEIGHT_MM, HEADER_BLOCK_HEIGHT_MM,
    HEADER_FONT_SIZE, LINE_GAP_PT, LOGO_MAX_HEIGHT_MM, LOGO_MAX_WIDTH_MM, MARGIN_MM,
    MIN_ROW_HEIGHT_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, REMARKS_V_PAD_MM, SIGNATURE_GAP_MM,
    SIGNATURE_IMAGE_HEIGHT_MM, SMALL_FONT_SIZE, TABLE_HEADER_HEIGHT_MM, TITLE_FONT_SIZE,
};

/// Baseline sits roughly three quarters of the font size below a line's top.
const ASCENT_RATIO: f32 = 0.75;

// ============================================================================
// Public API
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Hard ceiling on produced pages; runaway free-text input aborts the
    /// render instead of silently producing an unbounded document.
    pub max_pages: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { max_pages: 100 }
    }
}

#[derive(Debug)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Render a hydrated report record into a finished PDF byte buffer.
///
/// Signatures are resolved up front; the fixed header block is drawn once;
/// every entry then flows through the row layout engine in order; finally the
/// footer is stamped on every produced page. Degraded paths (signature fetch,
/// image embed, primary font) are absorbed with fallbacks; any other
/// drawing-stage failure aborts the whole render with no partial output.
pub fn render_report(
    report: &ReportDocument,
    store: &dyn ImageStore,
    options: &RenderOptions,
) -> Result<RenderOutput, ReportError> {
    let columns = column_specs(report.include_office_columns);
    let cache = preload(&report.entries, store);
    let logo = report
        .logo_ref
        .as_deref()
        .and_then(|key| load_image(store, key));

    let (doc, page1, layer1) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc)?;

    let mut composer = PageComposer::new(&doc, &fonts, columns, (page1, layer1), options.max_pages);
    let first_layer = composer.layer();
    composer.cursor.y = draw_report_header(&first_layer, &fonts, report, logo.as_ref());
    composer.draw_table_header();

    if report.entries.is_empty() {
        draw_no_entries_row(&mut composer);
    } else {
        for entry in &report.entries {
            layout_entry(&mut composer, columns, entry, &cache)?;
        }
    }

    composer.stamp_footers(report.footer.as_deref());
    let pages = composer.page_count();

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    Ok(RenderOutput { bytes, pages })
}

// ============================================================================
// Fonts
// ============================================================================

pub struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        Ok(Self {
            regular: builtin_or_fallback(doc, BuiltinFont::Helvetica, BuiltinFont::Courier)?,
            bold: builtin_or_fallback(doc, BuiltinFont::HelveticaBold, BuiltinFont::CourierBold)?,
        })
    }
}

fn builtin_or_fallback(
    doc: &PdfDocumentReference,
    primary: BuiltinFont,
    fallback: BuiltinFont,
) -> Result<IndirectFontRef, ReportError> {
    match doc.add_builtin_font(primary) {
        Ok(font) => Ok(font),
        Err(e) => {
            log::warn!("Font {primary:?} unavailable ({e}), falling back to {fallback:?}");
            doc.add_builtin_font(fallback)
                .map_err(|e| ReportError::Pdf(e.to_string()))
        }
    }
}

// ============================================================================
// Page Composer
// ============================================================================

/// Tracks the current page and vertical cursor, creates continuation pages
/// (redrawing the two-tier table header on each), and stamps footers once the
/// page count is final.
struct PageComposer<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a Fonts,
    columns: &'static [ColumnSpec],
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    cursor: LayoutCursor,
    max_pages: usize,
}

impl<'a> PageComposer<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        fonts: &'a Fonts,
        columns: &'static [ColumnSpec],
        first_page: (PdfPageIndex, PdfLayerIndex),
        max_pages: usize,
    ) -> Self {
        Self {
            doc,
            fonts,
            columns,
            pages: vec![first_page],
            cursor: LayoutCursor {
                page: 0,
                y: PAGE_HEIGHT_MM - MARGIN_MM,
            },
            max_pages,
        }
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.cursor.page];
        self.doc.get_page(page).get_layer(layer)
    }

    fn available(&self) -> f32 {
        self.cursor.y - CONTENT_BOTTOM_MM
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn new_page(&mut self) -> Result<(), ReportError> {
        if self.pages.len() >= self.max_pages {
            return Err(ReportError::PageLimit(self.max_pages));
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.pages.push((page, layer));
        self.cursor.page = self.pages.len() - 1;
        self.cursor.y = PAGE_HEIGHT_MM - MARGIN_MM;
        self.draw_table_header();
        Ok(())
    }

    /// Two-tier table header: the group band ("SHIP STAFF" / "OFFICE")
    /// followed by the column-label row. Drawn identically on every page.
    fn draw_table_header(&mut self) {
        let layer = self.layer();
        let y = self.cursor.y;
        let x0 = MARGIN_MM;
        let tw = table_width_mm();
        let staff_w: f32 = self
            .columns
            .iter()
            .filter(|c| c.group == ColumnGroup::ShipStaff)
            .map(column_width_mm)
            .sum();

        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(0.5);

        // Group band
        let band_bottom = y - GROUP_HEADER_HEIGHT_MM;
        draw_line(&layer, x0, y, x0 + tw, y);
        draw_line(&layer, x0, y, x0, band_bottom);
        draw_line(&layer, x0 + staff_w, y, x0 + staff_w, band_bottom);
        draw_line(&layer, x0 + tw, y, x0 + tw, band_bottom);

        let band_baseline = y - GROUP_HEADER_HEIGHT_MM / 2.0 - 1.2;
        layer.use_text(
            "SHIP STAFF",
            SMALL_FONT_SIZE,
            Mm(centered_x(x0, staff_w, "SHIP STAFF", SMALL_FONT_SIZE)),
            Mm(band_baseline),
            &self.fonts.bold,
        );
        layer.use_text(
            "OFFICE",
            SMALL_FONT_SIZE,
            Mm(centered_x(x0 + staff_w, tw - staff_w, "OFFICE", SMALL_FONT_SIZE)),
            Mm(band_baseline),
            &self.fonts.bold,
        );

        // Column-label row
        let row_top = band_bottom;
        let row_bottom = row_top - COLUMN_HEADER_HEIGHT_MM;
        draw_line(&layer, x0, row_top, x0 + tw, row_top);
        draw_line(&layer, x0, row_bottom, x0 + tw, row_bottom);

        let label_line_h = line_height_mm(SMALL_FONT_SIZE, LINE_GAP_PT);
        let mut x = x0;
        draw_line(&layer, x, row_top, x, row_bottom);
        for spec in self.columns {
            let width = column_width_mm(spec);
            let lines = wrap(spec.label, width - 2.0 * CELL_PAD_X_MM, SMALL_FONT_SIZE);
            let mut line_top = row_top - 1.0;
            for line in &lines {
                let baseline = line_top - ASCENT_RATIO * SMALL_FONT_SIZE * PT_TO_MM;
                layer.use_text(
                    line.as_str(),
                    SMALL_FONT_SIZE,
                    Mm(x + CELL_PAD_X_MM),
                    Mm(baseline),
                    &self.fonts.bold,
                );
                line_top -= label_line_h;
            }
            x += width;
            draw_line(&layer, x, row_top, x, row_bottom);
        }

        self.cursor.y -= TABLE_HEADER_HEIGHT_MM;
    }

    /// Final pass, strictly after row layout: one identical footer string at
    /// a fixed offset above the bottom of every produced page.
    fn stamp_footers(&self, footer: Option<&str>) {
        let Some(text) = footer else {
            return;
        };
        for (page, layer) in &self.pages {
            let layer = self.doc.get_page(*page).get_layer(*layer);
            layer.use_text(
                text,
                FOOTER_FONT_SIZE,
                Mm(MARGIN_MM),
                Mm(FOOTER_BASELINE_MM),
                &self.fonts.regular,
            );
        }
    }
}

// ============================================================================
// Report header block
// ============================================================================

/// Fixed, non-paginated top block on page 1: title, vessel, file numbers,
/// inspection date, optional logo top-right. Returns the y where the table
/// starts.
fn draw_report_header(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    report: &ReportDocument,
    logo: Option<&DynamicImage>,
) -> f32 {
    let y = PAGE_HEIGHT_MM - MARGIN_MM;

    layer.use_text(
        report.title.as_str(),
        TITLE_FONT_SIZE,
        Mm(centered_x(MARGIN_MM, table_width_mm(), &report.title, TITLE_FONT_SIZE)),
        Mm(y - 6.0),
        &fonts.bold,
    );
    layer.use_text(
        format!("Vessel: {}", report.vessel_name),
        HEADER_FONT_SIZE,
        Mm(MARGIN_MM),
        Mm(y - 14.0),
        &fonts.bold,
    );
    layer.use_text(
        format!(
            "File No: {}    Rev No: {}    Form No: {}",
            report.file_no, report.revision_no, report.form_no
        ),
        BODY_FONT_SIZE,
        Mm(MARGIN_MM),
        Mm(y - 20.0),
        &fonts.regular,
    );
    layer.use_text(
        format!("Inspection Date: {}", format_date(&report.inspection_date)),
        BODY_FONT_SIZE,
        Mm(MARGIN_MM),
        Mm(y - 26.0),
        &fonts.regular,
    );

    if let Some(img) = logo {
        let (w_mm, h_mm) = fit_box(img.width(), img.height(), LOGO_MAX_WIDTH_MM, LOGO_MAX_HEIGHT_MM);
        let x = MARGIN_MM + table_width_mm() - w_mm;
        if let Err(e) = embed_image(layer, img, x, y, w_mm, h_mm) {
            log::warn!("Logo embed failed: {e}");
        }
    }

    y - HEADER_BLOCK_HEIGHT_MM
}

// ============================================================================
// Row Layout Engine (drawing side)
// ============================================================================

/// Lay out one entry: measure, decide fits-or-splits, draw. A fitting row is
/// drawn as one atomic block; an overflowing row is drawn as a sequence of
/// page segments whose heights sum back to the measured height.
fn layout_entry(
    composer: &mut PageComposer,
    columns: &[ColumnSpec],
    entry: &Entry,
    cache: &SignatureCache,
) -> Result<(), ReportError> {
    let measure = measure_entry(entry, columns, cache);
    let line_h = body_line_height_mm();

    let mut available = composer.available();
    if forced_break(available) {
        composer.new_page()?;
        available = composer.available();
    }

    if measure.row_height <= available + 1e-3 {
        let layer = composer.layer();
        let y = composer.cursor.y;
        draw_row_segment(
            &layer, composer.fonts, columns, &measure, entry, cache, y,
            measure.row_height, 0.0, true,
        );
        composer.cursor.y -= measure.row_height;
        return Ok(());
    }

    let segments = split_segments(
        measure.row_height,
        available,
        continuation_capacity_mm(),
        line_h,
    );
    let mut offset = 0.0;
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            composer.new_page()?;
        }
        let layer = composer.layer();
        let y = composer.cursor.y;
        draw_row_segment(
            &layer, composer.fonts, columns, &measure, entry, cache, y, *seg, offset, i == 0,
        );
        composer.cursor.y -= *seg;
        offset += *seg;
    }
    Ok(())
}

/// Draw one page-bounded segment of a row: the grid at the segment height,
/// each text column's lines that fall inside the segment window (text flows
/// continuously across pages), and - on the first segment only - the atomic
/// remarks cell.
#[allow(clippy::too_many_arguments)]
fn draw_row_segment(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    columns: &[ColumnSpec],
    measure: &RowMeasure,
    entry: &Entry,
    cache: &SignatureCache,
    y_top: f32,
    seg_height: f32,
    offset_mm: f32,
    first_segment: bool,
) {
    let line_h = body_line_height_mm();
    let y_bottom = y_top - seg_height;

    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(0.4);

    let mut x = MARGIN_MM;
    draw_line(layer, x, y_top, x, y_bottom);
    for spec in columns {
        x += column_width_mm(spec);
        draw_line(layer, x, y_top, x, y_bottom);
    }
    draw_line(layer, MARGIN_MM, y_bottom, MARGIN_MM + table_width_mm(), y_bottom);

    let mut x = MARGIN_MM;
    for (spec, cell) in columns.iter().zip(&measure.cells) {
        let width = column_width_mm(spec);
        match cell {
            CellContent::Text { lines } => {
                // Segment boundaries are line multiples, so the window below
                // selects whole lines only.
                let first_line = ((offset_mm / line_h) + 0.5) as usize;
                let last_line = (((offset_mm + seg_height + 0.01) / line_h).floor()) as usize;
                for i in first_line..last_line.min(lines.len()) {
                    let line_top = y_top - (i as f32 * line_h - offset_mm);
                    let baseline = line_top - ASCENT_RATIO * BODY_FONT_SIZE * PT_TO_MM;
                    layer.use_text(
                        lines[i].as_str(),
                        BODY_FONT_SIZE,
                        Mm(x + CELL_PAD_X_MM),
                        Mm(baseline),
                        &fonts.regular,
                    );
                }
            }
            CellContent::Remarks(remarks) => {
                if first_segment {
                    draw_remarks_cell(
                        layer, fonts, remarks, entry, cache, x, y_top, width, seg_height,
                    );
                }
            }
        }
        x += width;
    }
}

// ============================================================================
// Remarks cell
// ============================================================================

/// Composite remarks cell, vertically centered as a group: status label, then
/// signature image with signer name and sign date below it. When no image is
/// available - absent from the cache, or failing to embed at draw time - the
/// text block alone is the fallback and the render carries on.
#[allow(clippy::too_many_arguments)]
fn draw_remarks_cell(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    remarks: &RemarksContent,
    entry: &Entry,
    cache: &SignatureCache,
    x: f32,
    y_top: f32,
    width: f32,
    span_height: f32,
) {
    let line_h = body_line_height_mm();
    let centering = ((span_height - remarks.height) / 2.0).max(0.0);
    // The measured height is capped, so drawing clips to the same window:
    // a line is painted only if it lands entirely above the cell floor.
    let cell_floor = y_top - centering - remarks.height + REMARKS_V_PAD_MM;
    let mut y = y_top - centering - REMARKS_V_PAD_MM;

    for line in &remarks.status_lines {
        if y - line_h < cell_floor - 1e-3 {
            return;
        }
        let baseline = y - ASCENT_RATIO * BODY_FONT_SIZE * PT_TO_MM;
        layer.use_text(
            line.as_str(),
            BODY_FONT_SIZE,
            Mm(centered_x(x, width, line, BODY_FONT_SIZE)),
            Mm(baseline),
            &fonts.bold,
        );
        y -= line_h;
    }

    if remarks.has_signature {
        let embedded = match entry.signed_by.as_deref().and_then(|s| cache.get(s)) {
            Some(img) => {
                let (w_mm, h_mm) = fit_box(
                    img.width(),
                    img.height(),
                    width - 2.0 * CELL_PAD_X_MM,
                    SIGNATURE_IMAGE_HEIGHT_MM,
                );
                let x_img = x + (width - w_mm) / 2.0;
                embed_image(layer, img, x_img, y, w_mm, h_mm)
            }
            None => Err("signer image missing from cache at draw time".to_string()),
        };
        if let Err(e) = embedded {
            log::warn!("Signature embed failed for {:?}: {e}", entry.signed_by);
        }
        // The measured slot is consumed either way so name and date keep
        // their positions.
        y -= SIGNATURE_IMAGE_HEIGHT_MM + SIGNATURE_GAP_MM;
    }

    for line in &remarks.name_lines {
        if y - line_h < cell_floor - 1e-3 {
            return;
        }
        let baseline = y - ASCENT_RATIO * BODY_FONT_SIZE * PT_TO_MM;
        layer.use_text(
            line.as_str(),
            BODY_FONT_SIZE,
            Mm(centered_x(x, width, line, BODY_FONT_SIZE)),
            Mm(baseline),
            &fonts.regular,
        );
        y -= line_h;
    }
    if let Some(date) = &remarks.date_line {
        if y - line_h < cell_floor - 1e-3 {
            return;
        }
        let baseline = y - ASCENT_RATIO * BODY_FONT_SIZE * PT_TO_MM;
        layer.use_text(
            date.as_str(),
            BODY_FONT_SIZE,
            Mm(centered_x(x, width, date, BODY_FONT_SIZE)),
            Mm(baseline),
            &fonts.regular,
        );
    }
}

// ============================================================================
// Empty state
// ============================================================================

fn draw_no_entries_row(composer: &mut PageComposer) {
    let layer = composer.layer();
    let y_top = composer.cursor.y;
    let height = MIN_ROW_HEIGHT_MM * 1.5;
    let y_bottom = y_top - height;
    let x0 = MARGIN_MM;
    let x1 = MARGIN_MM + table_width_mm();

    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(0.4);
    draw_line(&layer, x0, y_top, x0, y_bottom);
    draw_line(&layer, x1, y_top, x1, y_bottom);
    draw_line(&layer, x0, y_bottom, x1, y_bottom);

    let text = "No entries found";
    layer.use_text(
        text,
        BODY_FONT_SIZE,
        Mm(centered_x(x0, table_width_mm(), text, BODY_FONT_SIZE)),
        Mm(y_top - height / 2.0 - 1.2),
        &composer.fonts.regular,
    );
    composer.cursor.y -= height;
}

// ============================================================================
// Drawing utilities
// ============================================================================

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

fn centered_x(x: f32, width: f32, text: &str, font_size_pt: f32) -> f32 {
    x + (width - string_width_mm(text, font_size_pt)).max(0.0) / 2.0
}

/// Aspect-preserving fit of a pixel image into a mm box.
fn fit_box(px_w: u32, px_h: u32, max_w_mm: f32, max_h_mm: f32) -> (f32, f32) {
    let aspect = px_w.max(1) as f32 / px_h.max(1) as f32;
    if max_w_mm / max_h_mm > aspect {
        (max_h_mm * aspect, max_h_mm)
    } else {
        (max_w_mm, max_w_mm / aspect)
    }
}

/// Embed an image with its top-left corner at (x, top_y), composited against
/// white to flatten transparency.
fn embed_image(
    layer: &PdfLayerReference,
    img: &DynamicImage,
    x: f32,
    top_y: f32,
    width_mm: f32,
    height_mm: f32,
) -> Result<(), String> {
    let rgba = img.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err("image has a zero dimension".to_string());
    }
    if width_mm <= 0.0 || height_mm <= 0.0 {
        return Err("image box has a zero extent".to_string());
    }

    let mut rgb = RgbImage::new(width_px, height_px);
    for (px, py, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
        rgb.put_pixel(px, py, ::image::Rgb([out_r, out_g, out_b]));
    }
    let raw_pixels = rgb.into_raw();

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: raw_pixels,
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI chosen so the pixel width lands on the requested physical width.
    let dpi = width_px as f32 / (width_mm / 25.4);
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(top_y - height_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_box_preserves_aspect_ratio() {
        let (w, h) = fit_box(200, 100, 40.0, 40.0);
        assert!((w / h - 2.0).abs() < 1e-4);
        assert!(w <= 40.0 + 1e-4 && h <= 40.0 + 1e-4);
    }

    #[test]
    fn fit_box_height_constrained() {
        let (w, h) = fit_box(100, 100, 40.0, 12.0);
        assert!((h - 12.0).abs() < 1e-4);
        assert!((w - 12.0).abs() < 1e-4);
    }

    #[test]
    fn default_options_cap_pages() {
        assert_eq!(RenderOptions::default().max_pages, 100);
    }
}
