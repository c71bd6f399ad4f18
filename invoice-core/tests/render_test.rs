use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::NaiveDate;
use invoice_core::{
    FontSource, InvoiceConfig, InvoiceError, InvoiceHeader, InvoiceRenderer, Labels, Ledger,
    PassthroughShaper, TextShaper, ValidationError,
};
use rust_decimal_macros::dec;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn english_labels() -> Labels {
    Labels {
        title: "Tax Invoice".into(),
        date: "Date:".into(),
        invoice_number: "Invoice No:".into(),
        company: "Company:".into(),
        customer: "Customer:".into(),
        columns: [
            "Total".into(),
            "Qty".into(),
            "Unit Price".into(),
            "Product".into(),
        ],
        subtotal: "Subtotal:".into(),
        tax: "Tax".into(),
        grand_total: "Grand Total:".into(),
        notes: "Notes:".into(),
        footer: "Generated by the invoicing system".into(),
        currency: "SAR".into(),
    }
}

fn english_config() -> InvoiceConfig {
    InvoiceConfig {
        labels: english_labels(),
        ..InvoiceConfig::uncompressed()
    }
}

fn renderer() -> InvoiceRenderer {
    InvoiceRenderer::new(&english_config())
        .unwrap()
        .with_shaper(PassthroughShaper)
}

fn header() -> InvoiceHeader {
    InvoiceHeader::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        .with_company("Acme Trading")
        .with_customer("Sara")
}

fn pen_and_notebook() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_item("Pen", dec!(2.00), 3).unwrap();
    ledger.add_item("Notebook", dec!(15.50), 2).unwrap();
    ledger
}

fn render_bytes(header: &InvoiceHeader, ledger: &Ledger) -> Vec<u8> {
    renderer()
        .render_to_vec(header, ledger.items(), &ledger.totals())
        .unwrap()
}

fn write_png(path: &Path, width: u32, height: u32) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = png::Encoder::new(file, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer
        .write_image_data(&vec![200u8; (width * height * 3) as usize])
        .unwrap();
}

#[test]
fn document_has_title_header_rows_and_totals() {
    let bytes = render_bytes(&header(), &pen_and_notebook());

    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(contains(&bytes, b"%%EOF"));
    assert!(contains(&bytes, b"(Tax Invoice) Tj"));
    assert!(contains(&bytes, b"(Date: 2024-03-01) Tj"));
    assert!(contains(&bytes, b"(Company: Acme Trading) Tj"));
    assert!(contains(&bytes, b"(Customer: Sara) Tj"));

    for cell in ["Total", "Qty", "Unit Price", "Product"] {
        assert!(contains(&bytes, format!("({}) Tj", cell).as_bytes()), "{}", cell);
    }
    for cell in ["Pen", "6.00", "3", "2.00", "Notebook", "31.00", "2", "15.50"] {
        assert!(contains(&bytes, format!("({}) Tj", cell).as_bytes()), "{}", cell);
    }

    assert!(contains(&bytes, b"(Subtotal: 37.00 SAR) Tj"));
    assert!(contains(&bytes, b"(Tax \\(15%\\): 5.55 SAR) Tj"));
    assert!(contains(&bytes, b"(Grand Total: 42.55 SAR) Tj"));
    assert!(contains(&bytes, b"(Generated by the invoicing system) Tj"));
}

#[test]
fn header_row_and_grand_total_use_accent_colour() {
    let bytes = render_bytes(&header(), &pen_and_notebook());
    let text = String::from_utf8_lossy(&bytes);
    // Header fill, then the white header text.
    assert!(text.contains("0.3098 0.2745 0.898 rg"));
    assert!(text.contains("1 1 1 rg"));
    let grand = text.find("(Grand Total: 42.55 SAR) Tj").unwrap();
    let colour = text[..grand].rfind(" rg").unwrap();
    assert!(text[..colour].ends_with("0.3098 0.2745 0.898"));
}

#[test]
fn optional_fields_are_printed_when_present() {
    let header = header()
        .with_invoice_number("INV-0042")
        .with_notes("Payment due in 30 days\nThank you");
    let bytes = render_bytes(&header, &pen_and_notebook());
    assert!(contains(&bytes, b"(Invoice No: INV-0042) Tj"));
    assert!(contains(&bytes, b"(Notes:) Tj"));
    assert!(contains(&bytes, b"(Payment due in 30 days) Tj"));
    assert!(contains(&bytes, b"(Thank you) Tj"));
    assert!(contains(&bytes, b"/Title (Invoice INV-0042)"));
}

#[test]
fn optional_fields_are_skipped_when_absent() {
    let bytes = render_bytes(&header(), &pen_and_notebook());
    assert!(!contains(&bytes, b"Invoice No:"));
    assert!(!contains(&bytes, b"(Notes:) Tj"));
}

#[test]
fn empty_company_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    let ledger = pen_and_notebook();
    let header = header().with_company("  ");

    let err = renderer()
        .render(&header, ledger.items(), &ledger.totals(), &dest)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::MissingCompanyName));
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn empty_ledger_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    let ledger = Ledger::new();
    let err = renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::NoLineItems));
    assert!(!dest.exists());
}

#[test]
fn render_writes_file_and_reports_size() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    let ledger = pen_and_notebook();
    let receipt = renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap();
    assert_eq!(receipt.path, dest);
    let written = fs::read(&dest).unwrap();
    assert_eq!(receipt.bytes_written, written.len() as u64);
    assert!(contains(&written, b"(Pen) Tj"));
    // Only the final file remains in the directory.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn same_inputs_give_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    let ledger = pen_and_notebook();
    let header = header().with_invoice_number("INV-1");
    // Default compression on, to cover the deflated streams too.
    let renderer = InvoiceRenderer::new(&InvoiceConfig {
        labels: english_labels(),
        ..InvoiceConfig::default()
    })
    .unwrap();
    renderer.render(&header, ledger.items(), &ledger.totals(), &a).unwrap();
    renderer.render(&header, ledger.items(), &ledger.totals(), &b).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn existing_file_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    fs::write(&dest, b"old contents").unwrap();
    let ledger = pen_and_notebook();
    renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap();
    assert!(fs::read(&dest).unwrap().starts_with(b"%PDF-1.7"));
}

#[test]
fn missing_directory_is_an_export_error() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("no-such-dir").join("invoice.pdf");
    let ledger = pen_and_notebook();
    let err = renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap_err();
    assert!(err.is_io());
    match err {
        InvoiceError::Export { path, .. } => assert_eq!(path, dest),
        other => panic!("expected export error, got {:?}", other),
    }
    assert!(!dest.exists());
}

#[test]
fn corrupt_logo_is_a_logo_error() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    fs::write(&logo, b"this is not an image").unwrap();
    let dest = dir.path().join("invoice.pdf");
    let ledger = pen_and_notebook();

    let err = renderer()
        .render(&header().with_logo(&logo), ledger.items(), &ledger.totals(), &dest)
        .unwrap_err();
    assert!(matches!(err, InvoiceError::Logo { ref path, .. } if *path == logo));
    assert!(!dest.exists());
}

#[test]
fn missing_logo_is_a_read_error() {
    let ledger = pen_and_notebook();
    let header = header().with_logo(PathBuf::from("/definitely/not/here.png"));
    let err = renderer()
        .render_to_vec(&header, ledger.items(), &ledger.totals())
        .unwrap_err();
    assert!(matches!(err, InvoiceError::LogoRead { .. }));
    assert!(err.is_io());
}

#[test]
fn logo_is_embedded_and_placed() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    write_png(&logo, 60, 30);
    let ledger = pen_and_notebook();
    let bytes = render_bytes(&header().with_logo(&logo), &ledger);
    assert!(contains(&bytes, b"/Subtype /Image"));
    assert!(contains(&bytes, b"/Width 60"));
    assert!(contains(&bytes, b"/Im1 Do"));
    // 30 mm wide, 15 mm tall by aspect ratio, top edge 25 mm from the top.
    assert!(contains(&bytes, b"85.0394 0 0 42.5197 28.3465 728.5039 cm"));
}

#[test]
fn every_text_run_goes_through_the_shaper() {
    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl TextShaper for Recorder {
        fn shape(&self, text: &str) -> String {
            self.0.borrow_mut().push(text.to_string());
            text.to_uppercase()
        }
    }

    let recorder = Recorder::default();
    let renderer = InvoiceRenderer::new(&english_config())
        .unwrap()
        .with_shaper(recorder.clone());
    let ledger = pen_and_notebook();
    let bytes = renderer
        .render_to_vec(&header(), ledger.items(), &ledger.totals())
        .unwrap();

    let seen = recorder.0.borrow();
    for text in [
        "Tax Invoice",
        "Company: Acme Trading",
        "Product",
        "Pen",
        "31.00",
        "Subtotal: 37.00 SAR",
        "Generated by the invoicing system",
    ] {
        assert!(seen.iter().any(|s| s == text), "{} not shaped", text);
    }
    // The shaped form is what gets drawn.
    assert!(contains(&bytes, b"(NOTEBOOK) Tj"));
    assert!(!contains(&bytes, b"(Notebook) Tj"));
}

#[test]
fn arabic_default_labels_render_with_builtin_fonts() {
    let config = InvoiceConfig::uncompressed();
    let renderer = InvoiceRenderer::new(&config).unwrap();
    let ledger = pen_and_notebook();
    let bytes = renderer
        .render_to_vec(&header(), ledger.items(), &ledger.totals())
        .unwrap();
    // Latin and digits survive; Arabic falls back to '?' in Helvetica.
    assert!(contains(&bytes, b"(Pen) Tj"));
    assert!(contains(&bytes, b"(31.00) Tj"));
    assert!(contains(&bytes, b"(?????? ??????) Tj"));
}

#[test]
fn missing_font_file_fails_construction() {
    let config = InvoiceConfig {
        font: FontSource::TrueType {
            regular: PathBuf::from("/definitely/not/a/font.ttf"),
            bold: None,
        },
        ..InvoiceConfig::default()
    };
    let err = InvoiceRenderer::new(&config).err().unwrap();
    assert!(matches!(err, InvoiceError::FontRead { .. }));
}

#[test]
fn invalid_font_file_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let font = dir.path().join("broken.ttf");
    fs::write(&font, b"not a font").unwrap();
    let config = InvoiceConfig {
        font: FontSource::TrueType {
            regular: font,
            bold: None,
        },
        ..InvoiceConfig::default()
    };
    let err = InvoiceRenderer::new(&config).err().unwrap();
    assert!(matches!(err, InvoiceError::Font { .. }));
}

#[test]
fn truetype_font_is_embedded() {
    let font = PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
    if !font.exists() {
        eprintln!("skipping: {} not installed", font.display());
        return;
    }
    let config = InvoiceConfig {
        font: FontSource::TrueType {
            regular: font,
            bold: None,
        },
        ..InvoiceConfig::uncompressed()
    };
    let renderer = InvoiceRenderer::new(&config).unwrap();
    let ledger = pen_and_notebook();
    let bytes = renderer
        .render_to_vec(&header(), ledger.items(), &ledger.totals())
        .unwrap();
    assert!(contains(&bytes, b"/Subtype /Type0"));
    assert!(contains(&bytes, b"/Encoding /Identity-H"));
    assert!(contains(&bytes, b"/ToUnicode"));
    assert!(contains(&bytes, b"/F3 12 Tf"));
    // Glyph IDs are written as hex strings.
    assert!(contains(&bytes, b"> Tj"));
}

#[cfg(unix)]
#[test]
fn new_file_gets_the_same_mode_as_a_plain_write() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    let plain = dir.path().join("plain.pdf");
    let ledger = pen_and_notebook();
    renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap();
    fs::write(&plain, b"%PDF").unwrap();

    let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&dest), mode(&plain));
}

#[cfg(unix)]
#[test]
fn overwritten_file_keeps_its_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("invoice.pdf");
    fs::write(&dest, b"old contents").unwrap();
    fs::set_permissions(&dest, fs::Permissions::from_mode(0o640)).unwrap();
    let ledger = pen_and_notebook();
    renderer()
        .render(&header(), ledger.items(), &ledger.totals(), &dest)
        .unwrap();
    assert!(fs::read(&dest).unwrap().starts_with(b"%PDF-1.7"));
    assert_eq!(fs::metadata(&dest).unwrap().permissions().mode() & 0o777, 0o640);
}
