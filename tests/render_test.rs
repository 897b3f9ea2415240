use std::collections::HashMap;

use deficiency_report_pdf::layout::{
    body_line_height_mm, continuation_capacity_mm, forced_break, measure_entry, split_segments,
};
use deficiency_report_pdf::model::{column_specs, Entry, ReportDocument};
use deficiency_report_pdf::signature::{preload, ImageStore, SignatureCache};
use deficiency_report_pdf::{
    render_report, RenderOptions, ReportError, CONTENT_BOTTOM_MM, HEADER_BLOCK_HEIGHT_MM,
    MARGIN_MM, PAGE_HEIGHT_MM, TABLE_HEADER_HEIGHT_MM,
};

// ============================================================================
// Fixtures
// ============================================================================

struct MockStore {
    images: HashMap<String, Vec<u8>>,
}

impl MockStore {
    fn empty() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    fn with(key: &str, bytes: Vec<u8>) -> Self {
        Self {
            images: HashMap::from([(key.to_string(), bytes)]),
        }
    }
}

impl ImageStore for MockStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, String> {
        self.images
            .get(key)
            .cloned()
            .ok_or_else(|| format!("{key}: not found"))
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(60, 24, image::Rgb([40, 40, 120]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn entry(value: serde_json::Value) -> Entry {
    serde_json::from_value(value).unwrap()
}

fn report(entries: Vec<Entry>) -> ReportDocument {
    serde_json::from_value(serde_json::json!({
        "title": "VESSEL DEFICIENCY REPORT",
        "vessel_name": "MV Coral Trader",
        "file_no": "DR-114",
        "revision_no": "02",
        "form_no": "F-041",
        "inspection_date": "2026-03-14",
        "footer": "Uncontrolled when printed",
        "entries": [],
    }))
    .map(|mut r: ReportDocument| {
        r.entries = entries;
        r
    })
    .unwrap()
}

fn short_entry(serial: &str) -> Entry {
    entry(serde_json::json!({
        "serial_no": serial,
        "deficiency": "Bridge wing repeater out of alignment",
        "cause_analysis": "Gyro transmission fault",
        "corrective_action": "Repeater realigned and verified against master gyro",
        "status": "CLOSED_SATISFACTORILY",
    }))
}

fn long_entry(serial: &str) -> Entry {
    let sentence = "Heavy weather damage noted on forward breakwater plating with set-in \
                    of approximately forty millimetres and cracked welds along three \
                    stiffeners which require cropping and part renewal at the next \
                    available repair opportunity. ";
    entry(serde_json::json!({
        "serial_no": serial,
        "deficiency": sentence.repeat(18),
        "cause_analysis": "Green seas shipped over the bow during passage",
        "status": "FURTHER_ACTION_NEEDED",
    }))
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Decodes every hex string operand (`<...>`) in the PDF, yielding the text
/// strings the pages actually paint. Spans that are not valid hex (dictionary
/// delimiters, binary stream data) are skipped without consuming anything.
fn decoded_strings(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < pdf.len() {
        if pdf[i] != b'<' || pdf.get(i + 1) == Some(&b'<') {
            i += 1;
            continue;
        }
        let Some(len) = pdf[i + 1..].iter().position(|&b| b == b'>') else {
            break;
        };
        let digits: Vec<u8> = pdf[i + 1..i + 1 + len]
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
            i += 1;
            continue;
        }
        let decoded = digits
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16).unwrap() as u8;
                // A trailing odd digit reads as if followed by zero.
                let lo = pair.get(1).map_or(0, |&d| (d as char).to_digit(16).unwrap() as u8);
                (hi << 4) | lo
            })
            .collect();
        out.push(decoded);
        i += len + 2;
    }
    out
}

/// Number of painted text strings containing the needle. `use_text` writes
/// each line as one hex string, so matching decoded strings counts draws.
fn text_occurrences(pdf: &[u8], needle: &[u8]) -> usize {
    decoded_strings(pdf)
        .iter()
        .filter(|s| contains_bytes(s, needle))
        .count()
}

/// Replays the fits/split decisions with the library's own pure layout
/// primitives, giving the page count the composer must agree with.
fn expected_pages(report: &ReportDocument, cache: &SignatureCache) -> usize {
    let columns = column_specs(report.include_office_columns);
    let line_h = body_line_height_mm();
    let mut pages = 1;
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM - HEADER_BLOCK_HEIGHT_MM - TABLE_HEADER_HEIGHT_MM;

    for entry in &report.entries {
        let measure = measure_entry(entry, columns, cache);
        let mut available = y - CONTENT_BOTTOM_MM;
        if forced_break(available) {
            pages += 1;
            y = PAGE_HEIGHT_MM - MARGIN_MM - TABLE_HEADER_HEIGHT_MM;
            available = y - CONTENT_BOTTOM_MM;
        }
        if measure.row_height <= available + 1e-3 {
            y -= measure.row_height;
        } else {
            let segments =
                split_segments(measure.row_height, available, continuation_capacity_mm(), line_h);
            pages += segments.len() - 1;
            y = PAGE_HEIGHT_MM - MARGIN_MM - TABLE_HEADER_HEIGHT_MM - segments.last().unwrap();
        }
    }
    pages
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn renders_single_page_report() {
    let doc = report(vec![short_entry("1"), short_entry("2")]);
    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();

    assert_eq!(out.pages, 1);
    assert_eq!(&out.bytes[0..5], b"%PDF-");
    assert!(out.bytes.len() > 1000, "PDF is too small, likely empty");
}

#[test]
fn rendering_twice_is_deterministic() {
    let doc = report(vec![short_entry("1"), long_entry("2")]);
    let store = MockStore::empty();

    let a = render_report(&doc, &store, &RenderOptions::default()).unwrap();
    let b = render_report(&doc, &store, &RenderOptions::default()).unwrap();
    assert_eq!(a.pages, b.pages);

    let cache = SignatureCache::new();
    let columns = column_specs(false);
    for entry in &doc.entries {
        let first = measure_entry(entry, columns, &cache).row_height;
        let second = measure_entry(entry, columns, &cache).row_height;
        assert_eq!(first, second);
    }
}

#[test]
fn empty_report_renders_no_entries_marker() {
    let doc = report(vec![]);
    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();

    assert_eq!(out.pages, 1);
    assert_eq!(text_occurrences(&out.bytes, b"No entries found"), 1);
}

#[test]
fn oversized_row_splits_and_conserves_height() {
    let doc = report(vec![long_entry("1")]);
    let cache = SignatureCache::new();
    let columns = column_specs(false);
    let line_h = body_line_height_mm();

    let measure = measure_entry(&doc.entries[0], columns, &cache);
    let first_available = PAGE_HEIGHT_MM
        - MARGIN_MM
        - HEADER_BLOCK_HEIGHT_MM
        - TABLE_HEADER_HEIGHT_MM
        - CONTENT_BOTTOM_MM;
    let segments = split_segments(
        measure.row_height,
        first_available,
        continuation_capacity_mm(),
        line_h,
    );
    assert!(segments.len() >= 2, "fixture must actually overflow a page");

    // Height conservation and line-boundary invariant.
    let sum: f32 = segments.iter().sum();
    assert!((sum - measure.row_height).abs() < 1e-3);
    for seg in &segments[..segments.len() - 1] {
        let lines = seg / line_h;
        assert!((lines - lines.round()).abs() < 1e-3);
    }

    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, segments.len());

    // The two-tier header repeats on every page.
    assert_eq!(text_occurrences(&out.bytes, b"SHIP STAFF"), out.pages);
    assert_eq!(text_occurrences(&out.bytes, b"Sr No"), out.pages);
}

#[test]
fn corrupt_signature_falls_back_to_text_and_render_succeeds() {
    let signed = entry(serde_json::json!({
        "serial_no": "1",
        "deficiency": "Fire damper seized in open position",
        "status": "OPEN",
        "signed_by": "Master",
        "signature_ref": "sig/master.png",
        "sign_date": "2026-03-20",
    }));
    let doc = report(vec![signed]);
    let store = MockStore::with("sig/master.png", vec![0xde, 0xad, 0xbe, 0xef]);

    let out = render_report(&doc, &store, &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, 1);
    // Status, name and date still render as the text fallback.
    assert!(text_occurrences(&out.bytes, b"Master") >= 1);
    assert!(text_occurrences(&out.bytes, b"20-Mar-2026") >= 1);
}

#[test]
fn overlong_signer_name_is_clipped_to_the_remarks_cell() {
    let name = format!("{}OMEGA-END", "Very Long Signer Name ".repeat(14));
    let signed = entry(serde_json::json!({
        "serial_no": "1",
        "deficiency": "Anchor windlass brake lining worn",
        "status": "OPEN",
        "signed_by": name,
        "sign_date": "2026-01-15",
    }));
    let doc = report(vec![signed]);

    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, 1);
    // Leading lines are painted; everything past the height cap is dropped,
    // including the date below the clipped name.
    assert!(text_occurrences(&out.bytes, b"Very Long Signer") >= 1);
    assert_eq!(text_occurrences(&out.bytes, b"OMEGA-END"), 0);
    assert_eq!(text_occurrences(&out.bytes, b"15-Jan-2026"), 0);
}

#[test]
fn cached_signature_is_embedded_as_an_image() {
    let signed = entry(serde_json::json!({
        "serial_no": "1",
        "deficiency": "Hydraulic leak on no. 2 crane slewing motor",
        "status": "CLOSED_SATISFACTORILY",
        "signed_by": "Chief Engineer",
        "signature_ref": "sig/ce.png",
        "sign_date": "2026-04-02",
    }));
    let doc = report(vec![signed]);
    let store = MockStore::with("sig/ce.png", png_bytes());

    let cache = preload(&doc.entries, &store);
    assert!(cache.contains_key("Chief Engineer"));

    let out = render_report(&doc, &store, &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, 1);
    assert!(contains_bytes(&out.bytes, b"XObject"));
}

#[test]
fn three_entry_scenario_matches_planned_page_count() {
    let signed = entry(serde_json::json!({
        "serial_no": "3",
        "deficiency": "Emergency generator failed to start on second attempt",
        "corrective_action": "Starter battery bank renewed",
        "status": "CLOSED_SATISFACTORILY",
        "signed_by": "Chief Engineer",
        "signature_ref": "sig/ce.png",
        "sign_date": "2026-04-02",
    }));
    let doc = report(vec![short_entry("1"), long_entry("2"), signed]);
    let store = MockStore::with("sig/ce.png", png_bytes());

    let cache = preload(&doc.entries, &store);
    let planned = expected_pages(&doc, &cache);
    assert!(planned >= 3, "fixture must force a multi-segment split");

    let out = render_report(&doc, &store, &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, planned);
    assert!(contains_bytes(&out.bytes, b"XObject"));
    assert_eq!(text_occurrences(&out.bytes, b"SHIP STAFF"), out.pages);
}

#[test]
fn footer_is_stamped_on_every_page() {
    let doc = report(vec![long_entry("1")]);
    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();

    assert!(out.pages >= 2);
    assert_eq!(
        text_occurrences(&out.bytes, b"Uncontrolled when printed"),
        out.pages
    );
}

#[test]
fn page_limit_aborts_oversized_renders() {
    let doc = report(vec![long_entry("1"), long_entry("2")]);
    let result = render_report(
        &doc,
        &MockStore::empty(),
        &RenderOptions { max_pages: 1 },
    );
    assert!(matches!(result, Err(ReportError::PageLimit(1))));
}

#[test]
fn office_variant_renders_company_analysis_column() {
    let mut doc = report(vec![short_entry("1")]);
    doc.include_office_columns = true;
    doc.entries[0].company_analysis = Some("Fleet circular issued".to_string());

    let out = render_report(&doc, &MockStore::empty(), &RenderOptions::default()).unwrap();
    assert_eq!(out.pages, 1);
    assert!(text_occurrences(&out.bytes, b"Company Analysis") >= 1);
    assert!(text_occurrences(&out.bytes, b"Fleet circular issued") >= 1);
}
