use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    ReportNotFound(String),
    #[error("Invalid report record: {0}")]
    InvalidReport(String),
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("Render exceeded the page limit of {0}")]
    PageLimit(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
