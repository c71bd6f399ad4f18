//! Renderer configuration.
//!
//! Every field has a default, so an empty JSON object (or
//! `InvoiceConfig::default()`) yields the stock Arabic invoice with a 15%
//! tax and builtin fonts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::graphics::Color;
use crate::ledger::TaxPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    pub tax: TaxPolicy,
    pub labels: Labels,
    pub palette: Palette,
    pub font: FontSource,
    /// FlateDecode page content. Turn off to inspect the raw operators.
    pub compress: bool,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        InvoiceConfig {
            tax: TaxPolicy::default(),
            labels: Labels::default(),
            palette: Palette::default(),
            font: FontSource::default(),
            compress: true,
        }
    }
}

impl InvoiceConfig {
    /// Default config with content compression disabled.
    pub fn uncompressed() -> Self {
        InvoiceConfig {
            compress: false,
            ..InvoiceConfig::default()
        }
    }
}

/// Where glyphs come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// Helvetica from the standard 14. Latin-1 only; Arabic prints as `?`.
    #[default]
    Builtin,
    /// A TrueType file with Arabic coverage, embedded as a subset-free
    /// Type0 font. `bold` falls back to `regular` when absent.
    TrueType {
        regular: PathBuf,
        #[serde(default)]
        bold: Option<PathBuf>,
    },
}

/// Every piece of fixed text on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: String,
    pub date: String,
    pub invoice_number: String,
    pub company: String,
    pub customer: String,
    /// Table header cells, left to right: total, quantity, unit price, product.
    pub columns: [String; 4],
    pub subtotal: String,
    pub tax: String,
    pub grand_total: String,
    pub notes: String,
    pub footer: String,
    pub currency: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            title: "فاتورة ضريبية".into(),
            date: "التاريخ:".into(),
            invoice_number: "رقم الفاتورة:".into(),
            company: "اسم الشركة:".into(),
            customer: "اسم العميل:".into(),
            columns: [
                "المجموع".into(),
                "الكمية".into(),
                "سعر الوحدة".into(),
                "المنتج".into(),
            ],
            subtotal: "المجموع الفرعي:".into(),
            tax: "الضريبة".into(),
            grand_total: "الإجمالي النهائي:".into(),
            notes: "ملاحظات:".into(),
            footer: "تم إنشاء هذه الفاتورة بواسطة نظام الفواتير الذكي".into(),
            currency: "ريال".into(),
        }
    }
}

/// Colours as 8-bit RGB triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Table header fill and the grand total line.
    pub accent: [u8; 3],
    pub header_text: [u8; 3],
    pub body_text: [u8; 3],
    /// Footer.
    pub muted: [u8; 3],
    pub border: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            accent: [79, 70, 229],
            header_text: [255, 255, 255],
            body_text: [0, 0, 0],
            muted: [128, 128, 128],
            border: [0, 0, 0],
        }
    }
}

impl Palette {
    pub(crate) fn color(rgb: [u8; 3]) -> Color {
        Color::from_rgb8(rgb[0], rgb[1], rgb[2])
    }
}
