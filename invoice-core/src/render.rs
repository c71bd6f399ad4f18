//! Single-page invoice layout.
//!
//! Positions are given in millimetres from the top-left corner of an A4
//! page, like a form designer would measure them, and converted to PDF
//! points (bottom-left origin) at the last moment.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::config::{FontSource, InvoiceConfig, Labels, Palette};
use crate::document::PdfDocument;
use crate::error::{InvoiceError, ValidationError};
use crate::fonts::{BuiltinFont, FontRef, TextStyle};
use crate::graphics::Color;
use crate::header::InvoiceHeader;
use crate::images::{load_image, ImageData};
use crate::ledger::{InvoiceTotals, LineItem};
use crate::money::{format_amount, format_percent};
use crate::shaping::{ArabicShaper, TextShaper};
use crate::tables::{Cell, CellStyle, Row, Table, TableCursor, TextAlign, TextBox};
use crate::truetype::TrueTypeFont;

const PT_PER_MM: f64 = 72.0 / 25.4;
const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 10.0;
const CONTENT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const TITLE_TOP_MM: f64 = 10.0;
const HEADER_TOP_MM: f64 = 30.0;
const HEADER_LINE_MM: f64 = 8.0;
const LOGO_X_MM: f64 = 10.0;
const LOGO_Y_MM: f64 = 25.0;
const LOGO_WIDTH_MM: f64 = 30.0;
const TABLE_GAP_MM: f64 = 20.0;
/// Total, quantity, unit price, product.
const COLUMNS_MM: [f64; 4] = [40.0, 30.0, 40.0, 80.0];
const ROW_MM: f64 = 10.0;
const NOTES_LINE_MM: f64 = 6.0;
const FOOTER_TOP_MM: f64 = 280.0;
const FOOTER_HEIGHT_MM: f64 = 8.0;
/// Hairline borders, 0.2 mm.
const BORDER_PT: f64 = 0.567;

const ARABIC_ALEF: char = '\u{0627}';

fn pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

/// A box measured from the top-left of the page, in millimetres.
fn mm_box(x: f64, top: f64, width: f64, height: f64) -> TextBox {
    TextBox {
        x: pt(x),
        y: pt(PAGE_HEIGHT_MM - top - height),
        width: pt(width),
        height: pt(height),
    }
}

/// Where a written invoice ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub bytes_written: u64,
}

struct FontFile {
    path: PathBuf,
    data: Vec<u8>,
}

struct FontFiles {
    regular: FontFile,
    bold: Option<FontFile>,
}

/// Turns a header, a ledger snapshot and totals into PDF bytes.
pub struct InvoiceRenderer {
    labels: Labels,
    palette: Palette,
    compress: bool,
    fonts: Option<FontFiles>,
    shaper: Box<dyn TextShaper>,
}

impl InvoiceRenderer {
    /// Reads and checks the configured fonts once, so a bad font path
    /// surfaces at startup rather than at the first export.
    pub fn new(config: &InvoiceConfig) -> Result<Self, InvoiceError> {
        config.tax.validate()?;
        let fonts = match &config.font {
            FontSource::Builtin => {
                warn!("no TrueType font configured; Arabic text will print as '?'");
                None
            }
            FontSource::TrueType { regular, bold } => {
                let regular = read_font(regular)?;
                let bold = bold.as_deref().map(read_font).transpose()?;
                Some(FontFiles { regular, bold })
            }
        };

        Ok(InvoiceRenderer {
            labels: config.labels.clone(),
            palette: config.palette,
            compress: config.compress,
            fonts,
            shaper: Box::new(ArabicShaper::default()),
        })
    }

    /// Replace the default Arabic shaper.
    pub fn with_shaper(mut self, shaper: impl TextShaper + 'static) -> Self {
        self.shaper = Box::new(shaper);
        self
    }

    /// Validate, lay out and atomically write the invoice to
    /// `destination`. An existing file is replaced only on success.
    pub fn render(
        &self,
        header: &InvoiceHeader,
        items: &[LineItem],
        totals: &InvoiceTotals,
        destination: &Path,
    ) -> Result<ExportReceipt, InvoiceError> {
        let bytes = self.compose(header, items, totals, destination)?;
        write_atomically(destination, &bytes).map_err(|source| InvoiceError::Export {
            path: destination.to_path_buf(),
            source,
        })?;
        let receipt = ExportReceipt {
            path: destination.to_path_buf(),
            bytes_written: bytes.len() as u64,
        };
        info!(
            path = %receipt.path.display(),
            bytes = receipt.bytes_written,
            items = items.len(),
            "invoice exported"
        );
        Ok(receipt)
    }

    /// Same document as `render`, kept in memory.
    pub fn render_to_vec(
        &self,
        header: &InvoiceHeader,
        items: &[LineItem],
        totals: &InvoiceTotals,
    ) -> Result<Vec<u8>, InvoiceError> {
        self.compose(header, items, totals, Path::new(""))
    }

    fn compose(
        &self,
        header: &InvoiceHeader,
        items: &[LineItem],
        totals: &InvoiceTotals,
        destination: &Path,
    ) -> Result<Vec<u8>, InvoiceError> {
        header.validate()?;
        if items.is_empty() {
            return Err(ValidationError::NoLineItems.into());
        }
        let logo = header.logo.as_deref().map(read_logo).transpose()?;

        let export_err = |source: io::Error| InvoiceError::Export {
            path: destination.to_path_buf(),
            source,
        };

        let mut doc = PdfDocument::new(Vec::new()).map_err(export_err)?;
        doc.set_compression(self.compress);
        doc.set_info("Producer", "invoice-core");
        if let Some(number) = header.invoice_number_text().filter(|n| n.is_ascii()) {
            doc.set_info("Title", &format!("Invoice {}", number));
        }

        let (regular, bold) = self.load_fonts(&mut doc)?;
        let mut page = PageLayout {
            doc: &mut doc,
            shaper: self.shaper.as_ref(),
            labels: &self.labels,
            regular,
            bold,
            body: Palette::color(self.palette.body_text),
        };
        page.doc.begin_page(pt(PAGE_WIDTH_MM), pt(PAGE_HEIGHT_MM));

        let logo_image = match &logo {
            Some(image) => Some(page.doc.add_image(image).map_err(export_err)?),
            None => None,
        };

        page.title().map_err(export_err)?;
        let mut y = page.header_block(header).map_err(export_err)?;
        if let Some((id, dims)) = logo_image {
            let height = dims.height_for_width(LOGO_WIDTH_MM);
            page.doc
                .place_image(
                    id,
                    pt(LOGO_X_MM),
                    pt(PAGE_HEIGHT_MM - LOGO_Y_MM - height),
                    pt(LOGO_WIDTH_MM),
                    pt(height),
                )
                .map_err(export_err)?;
        }

        y += TABLE_GAP_MM;
        y = page.item_table(y, items, &self.palette).map_err(export_err)?;
        y += ROW_MM;
        y = page
            .summary(y, totals, Palette::color(self.palette.accent))
            .map_err(export_err)?;
        if let Some(notes) = header.notes_text() {
            page.notes(y, notes).map_err(export_err)?;
        }
        page.footer(Palette::color(self.palette.muted)).map_err(export_err)?;

        doc.end_page().map_err(export_err)?;
        doc.end_document().map_err(export_err)
    }

    fn load_fonts(&self, doc: &mut PdfDocument<Vec<u8>>) -> Result<(FontRef, FontRef), InvoiceError> {
        let Some(files) = &self.fonts else {
            return Ok((BuiltinFont::Helvetica.into(), BuiltinFont::HelveticaBold.into()));
        };
        let load = |doc: &mut PdfDocument<Vec<u8>>, file: &FontFile| {
            doc.load_font_bytes(file.data.clone())
                .map_err(|source| InvoiceError::Font {
                    path: file.path.clone(),
                    source,
                })
        };
        let regular = load(doc, &files.regular)?;
        let bold = match &files.bold {
            Some(file) => load(doc, file)?,
            None => regular,
        };
        Ok((regular, bold))
    }
}

struct PageLayout<'a> {
    doc: &'a mut PdfDocument<Vec<u8>>,
    shaper: &'a dyn TextShaper,
    labels: &'a Labels,
    regular: FontRef,
    bold: FontRef,
    body: Color,
}

impl PageLayout<'_> {
    fn style(&self, font: FontRef, size: f64, color: Color, align: TextAlign) -> CellStyle {
        CellStyle {
            text: TextStyle::new(font, size),
            text_color: color,
            align,
            ..CellStyle::default()
        }
    }

    /// Shape `text` and draw it as one line in a millimetre box.
    fn line(&mut self, text: &str, bounds: TextBox, style: &CellStyle) -> io::Result<()> {
        let shaped = self.shaper.shape(text);
        self.doc.place_text_in_box(&shaped, &bounds, style)
    }

    fn title(&mut self) -> io::Result<()> {
        let style = self.style(self.bold, 20.0, self.body, TextAlign::Center);
        let title = self.labels.title.clone();
        self.line(&title, mm_box(MARGIN_MM, TITLE_TOP_MM, CONTENT_WIDTH_MM, ROW_MM), &style)
    }

    /// Date, invoice number, company and customer lines. Returns the top
    /// of the last line.
    fn header_block(&mut self, header: &InvoiceHeader) -> io::Result<f64> {
        let style = self.style(self.regular, 12.0, self.body, TextAlign::Right);
        let mut lines = vec![labelled(&self.labels.date, &header.issue_date.format("%Y-%m-%d").to_string())];
        if let Some(number) = header.invoice_number_text() {
            lines.push(labelled(&self.labels.invoice_number, number));
        }
        lines.push(labelled(&self.labels.company, header.company_name.trim()));
        lines.push(labelled(&self.labels.customer, header.customer_name.trim()));

        let mut y = HEADER_TOP_MM;
        for (i, text) in lines.iter().enumerate() {
            if i > 0 {
                y += HEADER_LINE_MM;
            }
            self.line(text, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, ROW_MM), &style)?;
        }
        Ok(y)
    }

    /// Header row plus one row per item, starting at `top`. Returns the
    /// top of the line after the table.
    fn item_table(&mut self, top: f64, items: &[LineItem], palette: &Palette) -> io::Result<f64> {
        let mut table = Table::new(COLUMNS_MM.iter().map(|w| pt(*w)).collect(), pt(ROW_MM));
        table.border_color = Palette::color(palette.border);
        table.border_width = BORDER_PT;
        let mut cursor = TableCursor::new(pt(MARGIN_MM), pt(PAGE_HEIGHT_MM - top));

        let head_style = CellStyle {
            background_color: Some(Palette::color(palette.accent)),
            ..self.style(self.regular, 12.0, Palette::color(palette.header_text), TextAlign::Center)
        };
        let head = Row::new(
            self.labels
                .columns
                .iter()
                .map(|label| Cell::new(self.shaper.shape(label), head_style))
                .collect(),
        );
        self.doc.fit_row(&table, &head, &mut cursor)?;

        let numeric = self.style(self.regular, 12.0, self.body, TextAlign::Center);
        let name = self.style(self.regular, 12.0, self.body, TextAlign::Right);
        let bottom_limit = pt(MARGIN_MM);
        let mut overflow = 0usize;
        for item in items {
            let row = Row::new(vec![
                Cell::new(self.shaper.shape(&format_amount(item.line_total())), numeric),
                Cell::new(self.shaper.shape(&item.quantity().to_string()), numeric),
                Cell::new(self.shaper.shape(&format_amount(item.unit_price())), numeric),
                Cell::new(self.shaper.shape(item.name()), name),
            ]);
            self.doc.fit_row(&table, &row, &mut cursor)?;
            if cursor.current_y() < bottom_limit {
                overflow += 1;
            }
        }
        if overflow > 0 {
            warn!(
                rows = overflow,
                "invoice table runs past the bottom margin; rows are clipped by the page"
            );
        }
        debug!(rows = cursor.rows_placed(), "item table laid out");

        Ok(top + ROW_MM * cursor.rows_placed() as f64)
    }

    /// Subtotal, tax and grand total. Returns the top of the line after
    /// the block.
    fn summary(&mut self, top: f64, totals: &InvoiceTotals, accent: Color) -> io::Result<f64> {
        let plain = self.style(self.bold, 14.0, self.body, TextAlign::Left);
        let highlight = self.style(self.bold, 14.0, accent, TextAlign::Left);
        let currency = self.labels.currency.clone();
        let amount = |value| format!("{} {}", format_amount(value), currency);

        let subtotal = labelled(&self.labels.subtotal, &amount(totals.subtotal));
        let tax_label = format!("{} ({}):", self.labels.tax, format_percent(totals.tax_rate));
        let tax = labelled(&tax_label, &amount(totals.tax_amount));
        let grand = labelled(&self.labels.grand_total, &amount(totals.grand_total));

        let mut y = top;
        self.line(&subtotal, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, ROW_MM), &plain)?;
        y += 8.0;
        self.line(&tax, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, ROW_MM), &plain)?;
        y += 10.0;
        self.line(&grand, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, ROW_MM), &highlight)?;
        Ok(y + ROW_MM)
    }

    fn notes(&mut self, top: f64, notes: &str) -> io::Result<()> {
        let heading = self.style(self.bold, 12.0, self.body, TextAlign::Right);
        let body = self.style(self.regular, 11.0, self.body, TextAlign::Right);
        let mut y = top + 4.0;
        let label = self.labels.notes.clone();
        self.line(&label, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, 8.0), &heading)?;
        y += 8.0;
        for text in notes.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.line(text, mm_box(MARGIN_MM, y, CONTENT_WIDTH_MM, NOTES_LINE_MM), &body)?;
            y += NOTES_LINE_MM;
        }
        Ok(())
    }

    fn footer(&mut self, muted: Color) -> io::Result<()> {
        let style = self.style(self.regular, 9.0, muted, TextAlign::Center);
        let footer = self.labels.footer.clone();
        if footer.trim().is_empty() {
            return Ok(());
        }
        self.line(
            &footer,
            mm_box(MARGIN_MM, FOOTER_TOP_MM, CONTENT_WIDTH_MM, FOOTER_HEIGHT_MM),
            &style,
        )
    }
}

/// `"label value"`, or just the label when the value is blank.
fn labelled(label: &str, value: &str) -> String {
    if value.is_empty() {
        label.to_string()
    } else {
        format!("{} {}", label, value)
    }
}

fn read_font(path: &Path) -> Result<FontFile, InvoiceError> {
    let data = fs::read(path).map_err(|source| InvoiceError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    let font = TrueTypeFont::from_bytes(data.clone(), String::new()).map_err(|source| InvoiceError::Font {
        path: path.to_path_buf(),
        source,
    })?;
    if !font.has_glyph(ARABIC_ALEF) {
        warn!(path = %path.display(), "font has no Arabic glyphs; Arabic text will not render");
    }
    Ok(FontFile {
        path: path.to_path_buf(),
        data,
    })
}

pub(crate) fn read_logo(path: &Path) -> Result<ImageData, InvoiceError> {
    let data = fs::read(path).map_err(|source| InvoiceError::LogoRead {
        path: path.to_path_buf(),
        source,
    })?;
    load_image(data).map_err(|source| InvoiceError::Logo {
        path: path.to_path_buf(),
        source,
    })
}

/// 0666 before the umask, the mode `fs::write` creates files with.
#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    Builder::new()
}

/// Write through a temp file in the same directory, then rename over
/// `path`. Either the whole document lands or nothing does.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_builder().tempfile_in(dir)?;
    // Replacing a file keeps its mode, as an in-place write would.
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
