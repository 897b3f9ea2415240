// deficiency-report-pdf: render vessel deficiency inspection records as PDFs

use clap::Parser;

use deficiency_report_pdf::model::ReportDocument;
use deficiency_report_pdf::signature::LocalRemoteStore;
use deficiency_report_pdf::{render_report, RenderOptions, ReportError};

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Render vessel deficiency inspection reports as PDFs")]
struct Args {
    /// Report record (JSON file)
    #[arg(short, long)]
    report: String,

    /// Output filename (defaults to <vessel>-deficiency-report.pdf)
    #[arg(short, long)]
    output: Option<String>,

    /// Logo image (file path or URL), overrides the record's logo reference
    #[arg(long)]
    logo: Option<String>,

    /// Maximum number of pages before the render aborts
    #[arg(long, default_value = "100")]
    max_pages: usize,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ReportError> {
    let args = Args::parse();

    let mut report = load_report(&args.report)?;
    if args.logo.is_some() {
        report.logo_ref = args.logo.clone();
    }

    let output_file = args.output.unwrap_or_else(|| {
        let sanitized_vessel = report
            .vessel_name
            .to_lowercase()
            .replace(' ', "-")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .collect::<String>();
        format!("{}-deficiency-report.pdf", sanitized_vessel)
    });

    let options = RenderOptions {
        max_pages: args.max_pages,
    };
    let rendered = render_report(&report, &LocalRemoteStore, &options)?;
    std::fs::write(&output_file, &rendered.bytes)?;

    println!("✓ Generated: {}", output_file);
    println!("  Vessel: {}", report.vessel_name);
    println!("  Entries: {}", report.entries.len());
    println!("  Pages: {}", rendered.pages);

    Ok(())
}

/// A missing record is a definite not-found condition, surfaced before any
/// drawing starts.
fn load_report(path: &str) -> Result<ReportDocument, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReportError::ReportNotFound(path.to_string())
        } else {
            ReportError::Io(e)
        }
    })?;
    serde_json::from_str(&content).map_err(|e| ReportError::InvalidReport(e.to_string()))
}
