use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::InvoiceConfig;
use crate::error::InvoiceError;
use crate::header::InvoiceHeader;
use crate::images::thumbnail_size;
use crate::ledger::Ledger;
use crate::render::{read_logo, ExportReceipt, InvoiceRenderer};
use crate::shaping::TextShaper;

/// Largest preview edge, in pixels.
pub const THUMBNAIL_BOUND: u32 = 100;

/// Preview size for an attached logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPreview {
    pub width: u32,
    pub height: u32,
    /// Full pixel size of the file.
    pub source_width: u32,
    pub source_height: u32,
}

/// One invoice being edited: header fields, line items and the renderer
/// that exports them.
pub struct InvoiceSession {
    header: InvoiceHeader,
    ledger: Ledger,
    renderer: InvoiceRenderer,
}

impl InvoiceSession {
    pub fn new(issue_date: NaiveDate, config: &InvoiceConfig) -> Result<Self, InvoiceError> {
        Ok(InvoiceSession {
            header: InvoiceHeader::new(issue_date),
            ledger: Ledger::with_tax_policy(config.tax),
            renderer: InvoiceRenderer::new(config)?,
        })
    }

    pub fn with_shaper(mut self, shaper: impl TextShaper + 'static) -> Self {
        self.renderer = self.renderer.with_shaper(shaper);
        self
    }

    pub fn header(&self) -> &InvoiceHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut InvoiceHeader {
        &mut self.header
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Decode the image at `path` and remember it as the logo. A file that
    /// cannot be read or decoded leaves the current logo in place.
    pub fn attach_logo(&mut self, path: impl AsRef<Path>) -> Result<LogoPreview, InvoiceError> {
        let path = path.as_ref();
        let image = read_logo(path)?;
        let (width, height) = thumbnail_size(image.width, image.height, THUMBNAIL_BOUND);
        self.header.logo = Some(path.to_path_buf());
        debug!(path = %path.display(), width = image.width, height = image.height, "logo attached");
        Ok(LogoPreview {
            width,
            height,
            source_width: image.width,
            source_height: image.height,
        })
    }

    pub fn clear_logo(&mut self) {
        self.header.logo = None;
    }

    /// Render the current state to `path`. Nothing in the session changes,
    /// whether or not the export succeeds.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<ExportReceipt, InvoiceError> {
        self.renderer.render(
            &self.header,
            self.ledger.items(),
            &self.ledger.totals(),
            path.as_ref(),
        )
    }

    /// In-memory export.
    pub fn export_to_vec(&self) -> Result<Vec<u8>, InvoiceError> {
        self.renderer
            .render_to_vec(&self.header, self.ledger.items(), &self.ledger.totals())
    }
}
