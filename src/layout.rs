// Row layout: measure a logical row across all columns and plan how it lands
// on pages. Everything here is pure geometry so page-break decisions can be
// tested without touching a PDF document.

use crate::measure::{line_height_mm, wrap};
use crate::model::{format_date, ColumnKind, ColumnSpec, Entry};
use crate::signature::SignatureCache;
use crate::{
    BODY_FONT_SIZE, CELL_PAD_X_MM, CONTENT_BOTTOM_MM, LINE_GAP_PT, MARGIN_MM, MIN_ROW_HEIGHT_MM,
    PAGE_HEIGHT_MM, PAGE_WIDTH_MM, REMARKS_MAX_HEIGHT_MM, REMARKS_V_PAD_MM,
    SIGNATURE_GAP_MM, SIGNATURE_IMAGE_HEIGHT_MM, TABLE_HEADER_HEIGHT_MM,
};

// ============================================================================
// Cursor and page geometry
// ============================================================================

/// Per-render drawing position: current page index and vertical offset in mm
/// (measured from the page bottom, as the PDF coordinate system does).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
}

/// Body line height shared by measurement and drawing.
pub fn body_line_height_mm() -> f32 {
    line_height_mm(BODY_FONT_SIZE, LINE_GAP_PT)
}

/// Full table width between the margins.
pub fn table_width_mm() -> f32 {
    PAGE_WIDTH_MM - 2.0 * MARGIN_MM
}

/// Physical width of one column.
pub fn column_width_mm(spec: &ColumnSpec) -> f32 {
    spec.width * table_width_mm()
}

/// Row capacity of a continuation page, below its repeated table header.
pub fn continuation_capacity_mm() -> f32 {
    PAGE_HEIGHT_MM - MARGIN_MM - TABLE_HEADER_HEIGHT_MM - CONTENT_BOTTOM_MM
}

/// A cramped one-line fragment at the very bottom of a page is worse than a
/// slightly early break, so anything under roughly two baseline rows forces
/// a new page before the fits decision.
pub fn forced_break(available_mm: f32) -> bool {
    available_mm < 2.0 * MIN_ROW_HEIGHT_MM
}

// ============================================================================
// Row measurement
// ============================================================================

/// Measured content of one cell, produced once per row and reused by every
/// segment so measurement and drawing can never disagree.
#[derive(Debug, Clone)]
pub enum CellContent {
    Text { lines: Vec<String> },
    Remarks(RemarksContent),
}

/// The composite remarks cell: status, optional signature image, signer name,
/// sign date. Atomic: drawn only on a row's first segment, never split.
#[derive(Debug, Clone)]
pub struct RemarksContent {
    pub status_lines: Vec<String>,
    pub name_lines: Vec<String>,
    pub date_line: Option<String>,
    pub has_signature: bool,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct RowMeasure {
    pub cells: Vec<CellContent>,
    pub row_height: f32,
}

fn measure_remarks(entry: &Entry, width_mm: f32, has_signature: bool) -> RemarksContent {
    let inner = width_mm - 2.0 * CELL_PAD_X_MM;
    let line_h = body_line_height_mm();

    let status_lines = wrap(entry.status.label(), inner, BODY_FONT_SIZE);
    let name_lines = entry
        .signed_by
        .as_deref()
        .map(|name| wrap(name, inner, BODY_FONT_SIZE))
        .unwrap_or_default();
    let date_line = entry.sign_date.as_ref().map(format_date);

    let mut height = status_lines.len().max(1) as f32 * line_h;
    if has_signature {
        height += SIGNATURE_IMAGE_HEIGHT_MM + SIGNATURE_GAP_MM;
    }
    height += name_lines.len() as f32 * line_h;
    if date_line.is_some() {
        height += line_h;
    }
    height += 2.0 * REMARKS_V_PAD_MM;
    height = height.min(REMARKS_MAX_HEIGHT_MM);

    RemarksContent {
        status_lines,
        name_lines,
        date_line,
        has_signature,
        height,
    }
}

/// Measure a row across all columns: wrapped text per column, composite
/// formula for the remarks column, max across columns floored at the
/// single-line minimum.
pub fn measure_entry(
    entry: &Entry,
    columns: &[ColumnSpec],
    cache: &SignatureCache,
) -> RowMeasure {
    let line_h = body_line_height_mm();
    let mut cells = Vec::with_capacity(columns.len());
    let mut row_height = MIN_ROW_HEIGHT_MM;

    for spec in columns {
        let width = column_width_mm(spec);
        match spec.kind {
            ColumnKind::Text | ColumnKind::Date => {
                let text = entry.text_for(spec.key);
                let lines = wrap(&text, width - 2.0 * CELL_PAD_X_MM, BODY_FONT_SIZE);
                let height = lines.len().max(1) as f32 * line_h;
                row_height = row_height.max(height);
                cells.push(CellContent::Text { lines });
            }
            ColumnKind::Remarks => {
                let has_signature = entry
                    .signed_by
                    .as_deref()
                    .map(|s| cache.contains_key(s))
                    .unwrap_or(false);
                let remarks = measure_remarks(entry, width, has_signature);
                row_height = row_height.max(remarks.height);
                cells.push(CellContent::Remarks(remarks));
            }
        }
    }

    debug_assert!(
        row_height.is_finite() && row_height >= 0.0,
        "measured row height must be a non-negative finite number"
    );

    RowMeasure { cells, row_height }
}

// ============================================================================
// Page splitting
// ============================================================================

/// Split a row that overflows its page into per-page segment heights. Every
/// non-final segment is the available space snapped down to a whole multiple
/// of the line height, so a boundary never cuts a line of text; the final
/// segment is the exact remainder, so the segment heights sum back to the
/// single measured row height.
pub fn split_segments(
    total: f32,
    first_available: f32,
    page_available: f32,
    line_h: f32,
) -> Vec<f32> {
    const EPS: f32 = 1e-3;
    debug_assert!(line_h > 0.0);

    let mut segments = Vec::new();
    let mut remaining = total;
    let mut available = first_available;

    while remaining > available + EPS {
        // Snap down to a line boundary; always make at least one line of
        // progress so the loop terminates even for pathological inputs.
        let snapped = ((available / line_h).floor() * line_h).max(line_h);
        segments.push(snapped);
        remaining -= snapped;
        available = page_available;
    }
    segments.push(remaining);
    segments
}
