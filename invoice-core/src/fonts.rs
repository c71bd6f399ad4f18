use crate::truetype::TrueTypeFont;

/// Index into the document's list of embedded TrueType fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrueTypeFontId(pub usize);

/// Either a standard PDF font or an embedded TrueType font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontRef {
    Builtin(BuiltinFont),
    TrueType(TrueTypeFontId),
}

impl From<BuiltinFont> for FontRef {
    fn from(font: BuiltinFont) -> Self {
        FontRef::Builtin(font)
    }
}

/// The two standard fonts an invoice uses. They are never embedded, so
/// they only cover Latin-1; Arabic needs a TrueType font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    pub const ALL: [BuiltinFont; 2] = [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold];

    /// Resource name used in content streams.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
        }
    }

    pub fn pdf_base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn char_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        if !(32..=126).contains(&code) {
            return FALLBACK_WIDTH;
        }
        let idx = (code - 32) as usize;
        match self {
            BuiltinFont::Helvetica => HELVETICA_WIDTHS[idx],
            BuiltinFont::HelveticaBold => HELVETICA_BOLD_WIDTHS[idx],
        }
    }
}

/// Font and size for one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontRef,
    pub font_size: f64,
}

impl TextStyle {
    pub fn new(font: impl Into<FontRef>, font_size: f64) -> Self {
        TextStyle {
            font: font.into(),
            font_size,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle::new(BuiltinFont::Helvetica, 12.0)
    }
}

/// Width used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

// Adobe AFM advance widths for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Encode text for a standard font under WinAnsiEncoding. Latin-1 maps
/// through unchanged; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
            0x20AC => 0x80,
            _ => b'?',
        })
        .collect()
}

/// Width of `text` in points for the given style.
pub fn measure_text(text: &str, style: &TextStyle, tt_fonts: &[TrueTypeFont]) -> f64 {
    match style.font {
        FontRef::Builtin(b) => {
            let units: u32 = text.chars().map(|ch| b.char_width(ch) as u32).sum();
            units as f64 * style.font_size / 1000.0
        }
        FontRef::TrueType(id) => tt_fonts
            .get(id.0)
            .map_or(0.0, |f| f.measure_text(text, style.font_size)),
    }
}

/// Resource name for a font reference.
pub fn resource_name(font: FontRef, tt_fonts: &[TrueTypeFont]) -> String {
    match font {
        FontRef::Builtin(b) => b.pdf_name().to_string(),
        FontRef::TrueType(id) => tt_fonts
            .get(id.0)
            .map_or_else(|| BuiltinFont::Helvetica.pdf_name().to_string(), |f| f.pdf_name.clone()),
    }
}
