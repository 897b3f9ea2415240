// deficiency-report-pdf: render vessel deficiency inspection records as
// paginated landscape PDF reports.

pub mod error;
pub mod layout;
pub mod measure;
pub mod model;
pub mod render;
pub mod signature;

pub use error::ReportError;
pub use render::{render_report, RenderOptions, RenderOutput};

// ============================================================================
// Constants
// ============================================================================

/// A4 landscape dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;

/// Margins
pub const MARGIN_MM: f32 = 10.0;

/// Table content never descends below this line; the footer sits under it
pub const CONTENT_BOTTOM_MM: f32 = 14.0;

/// Footer baseline, measured from the page bottom
pub const FOOTER_BASELINE_MM: f32 = 8.0;

/// Height of the fixed report header block on page 1
pub const HEADER_BLOCK_HEIGHT_MM: f32 = 34.0;

/// Two-tier table header: group band plus column-label row
pub const GROUP_HEADER_HEIGHT_MM: f32 = 6.0;
pub const COLUMN_HEADER_HEIGHT_MM: f32 = 10.0;
pub const TABLE_HEADER_HEIGHT_MM: f32 = GROUP_HEADER_HEIGHT_MM + COLUMN_HEADER_HEIGHT_MM;

/// Font sizes in points
pub const TITLE_FONT_SIZE: f32 = 14.0;
pub const HEADER_FONT_SIZE: f32 = 10.0;
pub const BODY_FONT_SIZE: f32 = 9.0;
pub const SMALL_FONT_SIZE: f32 = 8.0;
pub const FOOTER_FONT_SIZE: f32 = 7.0;

/// Gap between text lines in points; line height = font size + gap
pub const LINE_GAP_PT: f32 = 2.0;

/// Horizontal padding inside every cell
pub const CELL_PAD_X_MM: f32 = 1.5;

/// Minimum height of a rendered row (floors empty or one-line rows)
pub const MIN_ROW_HEIGHT_MM: f32 = 6.0;

/// Signature image box inside the remarks cell
pub const SIGNATURE_IMAGE_HEIGHT_MM: f32 = 12.0;
pub const SIGNATURE_GAP_MM: f32 = 2.0;

/// Vertical padding around the remarks group
pub const REMARKS_V_PAD_MM: f32 = 1.0;

/// The remarks cell is atomic: its measured height is capped here so it
/// always fits a fresh page and never needs splitting
pub const REMARKS_MAX_HEIGHT_MM: f32 = 60.0;

/// Logo box in the report header, top-right
pub const LOGO_MAX_WIDTH_MM: f32 = 40.0;
pub const LOGO_MAX_HEIGHT_MM: f32 = 20.0;
