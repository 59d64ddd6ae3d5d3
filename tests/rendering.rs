use chrono::{NaiveDate, NaiveDateTime};
use research_report::assembler::{
    ADVISER_SECTION, DEPARTMENT_FOOTER_END, DEPARTMENT_SECTION, DEPARTMENT_TABLE_END,
    SUMMARY_SECTION,
};
use research_report::output::DEFAULT_FILE_NAME;
use research_report::{fonts, generate_report, render_report, Payload, RenderedReport, ReportOptions};
use serde_json::json;
use sha2::{Digest, Sha256};

const SKIP_MESSAGE: &str =
    "no usable fonts found. Set REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 31)
        .and_then(|date| date.and_hms_opt(14, 30, 0))
        .expect("valid timestamp")
}

fn options() -> ReportOptions {
    ReportOptions::new()
        .with_generated_at(generated_at())
        .with_logo_path("/__research_report_missing_logo__.png")
}

fn payload_with_departments(rows: usize) -> Payload {
    let departments: Vec<_> = (0..rows)
        .map(|index| {
            json!({
                "name": format!("Department number {index}"),
                "count": index,
                "percentage": 100.0 / rows as f64,
            })
        })
        .collect();

    let value = json!({
        "account_name": "Registrar",
        "semester": "1st Semester",
        "year": 2024,
        "summary": {
            "totalResearch": rows,
            "mostActiveDepartment": "Nursing, Criminology",
            "mostActiveAdviser": "jane doe"
        },
        "departments": departments,
        "advisers": [
            {"name": "jane doe", "count": 5, "percentage": "12.5"},
            {"name": "john roe", "count": 1, "percentage": "N/A"}
        ]
    });
    Payload::from_json_str(&value.to_string()).expect("payload parses")
}

fn render(payload: &Payload) -> Option<RenderedReport> {
    if !fonts::default_fonts_available() {
        return None;
    }
    Some(render_report(payload, &options()).expect("render report"))
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    for tag in [
        "xmp:CreateDate",
        "xmp:ModifyDate",
        "xmp:MetadataDate",
        "xmpMM:DocumentID",
        "xmpMM:InstanceID",
        "xmpMM:VersionID",
    ] {
        let start = format!("<{tag}>");
        let end = format!("</{tag}>");
        scrub_xml(&mut normalized, start.as_bytes(), end.as_bytes());
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_three_sections_on_separate_pages() {
    let Some(report) = render(&payload_with_departments(3)) else {
        eprintln!("Skipping renders_three_sections_on_separate_pages: {SKIP_MESSAGE}");
        return;
    };

    assert!(report.bytes.starts_with(b"%PDF"));
    assert_eq!(report.page_of(SUMMARY_SECTION), Some(1));
    assert_eq!(report.page_of(DEPARTMENT_SECTION), Some(2));
    assert_eq!(report.page_of(ADVISER_SECTION), Some(3));
    assert_eq!(report.page_count, 3);
    assert_eq!(report.file_name, "Research_Statistics_1st_Semester_2024.pdf");
}

#[test]
fn empty_payload_still_renders() {
    let Some(report) = render(&Payload::from_json_str("").expect("empty input")) else {
        eprintln!("Skipping empty_payload_still_renders: {SKIP_MESSAGE}");
        return;
    };

    assert!(!report.bytes.is_empty());
    assert_eq!(report.page_count, 3);
    assert_eq!(report.file_name, "Research_Statistics_All_Semesters_All_Years.pdf");
}

#[test]
fn short_department_table_stays_with_its_footer() {
    let Some(report) = render(&payload_with_departments(15)) else {
        eprintln!("Skipping short_department_table_stays_with_its_footer: {SKIP_MESSAGE}");
        return;
    };

    let section = report.page_of(DEPARTMENT_SECTION);
    assert_eq!(report.page_of(DEPARTMENT_TABLE_END), section);
    assert_eq!(report.page_of(DEPARTMENT_FOOTER_END), section);
}

#[test]
fn department_footer_never_separates_from_the_table() {
    for rows in [30, 40, 55, 120, 300] {
        let Some(report) = render(&payload_with_departments(rows)) else {
            eprintln!("Skipping department_footer_never_separates_from_the_table: {SKIP_MESSAGE}");
            return;
        };

        let table_end = report.page_of(DEPARTMENT_TABLE_END).expect("table end recorded");
        let footer_end = report.page_of(DEPARTMENT_FOOTER_END).expect("footer end recorded");
        assert_eq!(table_end, footer_end, "{rows} rows split the table from its footer");
        assert!(report.page_of(ADVISER_SECTION) > Some(footer_end));
    }
}

#[test]
fn long_department_table_spans_several_pages() {
    let Some(report) = render(&payload_with_departments(300)) else {
        eprintln!("Skipping long_department_table_spans_several_pages: {SKIP_MESSAGE}");
        return;
    };

    let start = report.page_of(DEPARTMENT_SECTION).expect("section recorded");
    let end = report.page_of(DEPARTMENT_TABLE_END).expect("table end recorded");
    assert!(end > start + 1, "300 rows should need more than two pages");
    assert_eq!(report.page_count, end + 1);
}

#[test]
fn rendering_is_deterministic() {
    let payload = payload_with_departments(12);
    let (Some(first), Some(second)) = (render(&payload), render(&payload)) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_MESSAGE}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn generate_report_writes_the_pdf() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping generate_report_writes_the_pdf: {SKIP_MESSAGE}");
        return;
    }

    let directory = tempfile::tempdir().expect("temp dir");
    let options = options().with_output_dir(directory.path());
    let path = generate_report(&payload_with_departments(5), &options).expect("generate report");

    assert!(path.is_absolute());
    assert_eq!(path, directory.path().join(DEFAULT_FILE_NAME));
    let bytes = std::fs::read(&path).expect("read report");
    assert!(bytes.starts_with(b"%PDF"));
}

#[cfg(feature = "bookmarks")]
#[test]
fn outline_points_at_each_section_start() {
    use lopdf::{Document, Object};

    let Some(report) = render(&payload_with_departments(3)) else {
        eprintln!("Skipping outline_points_at_each_section_start: {SKIP_MESSAGE}");
        return;
    };

    let document = Document::load_mem(&report.bytes).expect("load rendered pdf");
    let pages = document.get_pages();
    let outlines = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|id| document.get_object(id))
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
        .and_then(|id| document.get_object(id))
        .and_then(Object::as_dict)
        .expect("outlines dictionary");

    let mut targets = Vec::new();
    let mut next = outlines.get(b"First").and_then(Object::as_reference).ok();
    while let Some(id) = next {
        let entry = document
            .get_object(id)
            .and_then(Object::as_dict)
            .expect("outline entry");
        let destination = entry
            .get(b"Dest")
            .and_then(Object::as_array)
            .expect("entry destination");
        targets.push(destination[0].as_reference().expect("page reference"));
        next = entry.get(b"Next").and_then(Object::as_reference).ok();
    }

    assert_eq!(targets, [pages[&1], pages[&2], pages[&3]]);
}
