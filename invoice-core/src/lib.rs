pub mod objects;
pub mod writer;
pub mod document;
pub mod fonts;
pub mod truetype;
pub mod images;
pub mod graphics;
pub mod tables;
pub mod shaping;
pub mod error;
pub mod money;
pub mod ledger;
pub mod header;
pub mod config;
pub mod render;
pub mod session;

pub use config::{FontSource, InvoiceConfig, Labels, Palette};
pub use document::{ImageDims, PdfDocument};
pub use error::{InvoiceError, ValidationError};
pub use fonts::{BuiltinFont, FontRef, TextStyle};
pub use graphics::Color;
pub use header::InvoiceHeader;
pub use images::{ImageData, ImageError, ImageFormat};
pub use ledger::{InvoiceTotals, ItemId, Ledger, LineItem, TaxPolicy};
pub use render::{ExportReceipt, InvoiceRenderer};
pub use session::{InvoiceSession, LogoPreview};
pub use shaping::{ArabicShaper, PassthroughShaper, TextShaper};
pub use tables::{Cell, CellStyle, Row, Table, TableCursor, TextAlign, TextBox};
pub use truetype::FontError;
