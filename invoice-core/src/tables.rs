use crate::fonts::{encode_win_ansi, measure_text, resource_name, FontRef, TextStyle};
use crate::graphics::Color;
use crate::truetype::TrueTypeFont;
use crate::writer::{escape_literal, format_coord};

/// Horizontal placement of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Style for one table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub text: TextStyle,
    pub text_color: Color,
    pub background_color: Option<Color>,
    pub align: TextAlign,
    /// Horizontal inset for left/right aligned text, in points.
    pub padding: f64,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            text: TextStyle::default(),
            text_color: Color::BLACK,
            background_color: None,
            align: TextAlign::Left,
            padding: 2.835,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(text: impl Into<String>, style: CellStyle) -> Self {
        Cell {
            text: text.into(),
            style,
        }
    }
}

/// One table row; cells map to columns by position.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row { cells }
    }
}

/// Fixed-height table layout: column widths, row height and border.
/// Rows are supplied one at a time to `PdfDocument::fit_row`.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column widths in points, left to right.
    pub columns: Vec<f64>,
    pub row_height: f64,
    pub border_color: Color,
    /// Zero disables borders.
    pub border_width: f64,
}

impl Table {
    pub fn new(columns: Vec<f64>, row_height: f64) -> Self {
        Table {
            columns,
            row_height,
            border_color: Color::BLACK,
            border_width: 0.5,
        }
    }

    /// Content stream bytes for one row whose top edge is at
    /// `cursor.current_y`. Advances the cursor by one row.
    pub(crate) fn row_ops(
        &self,
        row: &Row,
        cursor: &mut TableCursor,
        tt_fonts: &mut [TrueTypeFont],
    ) -> Vec<u8> {
        let top = cursor.current_y;
        let bottom = top - self.row_height;
        let mut out = Vec::new();

        let mut x = cursor.x;
        for (col, &width) in self.columns.iter().enumerate() {
            if let Some(cell) = row.cells.get(col) {
                if let Some(bg) = cell.style.background_color {
                    out.extend_from_slice(bg.fill_op().as_bytes());
                    out.extend_from_slice(rect_op(x, bottom, width, self.row_height, "f").as_bytes());
                }
                let bounds = TextBox {
                    x,
                    y: bottom,
                    width,
                    height: self.row_height,
                };
                out.extend_from_slice(&text_in_box(&cell.text, &cell.style, &bounds, tt_fonts));
            }
            x += width;
        }

        if self.border_width > 0.0 {
            out.extend_from_slice(b"q\n");
            out.extend_from_slice(self.border_color.stroke_op().as_bytes());
            out.extend_from_slice(format!("{} w\n", format_coord(self.border_width)).as_bytes());
            let mut x = cursor.x;
            for &width in &self.columns {
                out.extend_from_slice(rect_op(x, bottom, width, self.row_height, "S").as_bytes());
                x += width;
            }
            out.extend_from_slice(b"Q\n");
        }

        cursor.current_y = bottom;
        cursor.rows_placed += 1;
        out
    }
}

/// Where the next row goes, in PDF coordinates (bottom-left origin).
#[derive(Debug, Clone, Copy)]
pub struct TableCursor {
    pub(crate) x: f64,
    pub(crate) current_y: f64,
    pub(crate) rows_placed: usize,
}

impl TableCursor {
    /// `top` is the top edge of the first row.
    pub fn new(x: f64, top: f64) -> Self {
        TableCursor {
            x,
            current_y: top,
            rows_placed: 0,
        }
    }

    /// Bottom edge of the last placed row.
    pub fn current_y(&self) -> f64 {
        self.current_y
    }

    pub fn rows_placed(&self) -> usize {
        self.rows_placed
    }
}

/// An axis-aligned box in PDF coordinates; `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn rect_op(x: f64, y: f64, w: f64, h: f64, paint: &str) -> String {
    format!(
        "{} {} {} {} re\n{}\n",
        format_coord(x),
        format_coord(y),
        format_coord(w),
        format_coord(h),
        paint
    )
}

/// Draw one line of text vertically centred in `bounds`, clipped to it.
pub(crate) fn text_in_box(
    text: &str,
    style: &CellStyle,
    bounds: &TextBox,
    tt_fonts: &mut [TrueTypeFont],
) -> Vec<u8> {
    if text.is_empty() {
        return Vec::new();
    }
    let size = style.text.font_size;
    let width = measure_text(text, &style.text, tt_fonts);
    let x = match style.align {
        TextAlign::Left => bounds.x + style.padding,
        TextAlign::Center => bounds.x + (bounds.width - width) / 2.0,
        TextAlign::Right => bounds.x + bounds.width - style.padding - width,
    };
    // Baseline sits 0.3 em below the box centre.
    let baseline = bounds.y + bounds.height / 2.0 - 0.3 * size;

    let mut out = Vec::new();
    out.extend_from_slice(b"q\n");
    out.extend_from_slice(rect_op(bounds.x, bounds.y, bounds.width, bounds.height, "W n").as_bytes());
    out.extend_from_slice(b"BT\n");
    out.extend_from_slice(style.text_color.fill_op().as_bytes());
    out.extend_from_slice(
        format!(
            "/{} {} Tf\n{} {} Td\n",
            resource_name(style.text.font, tt_fonts),
            format_coord(size),
            format_coord(x),
            format_coord(baseline)
        )
        .as_bytes(),
    );
    out.extend_from_slice(&show_text_op(text, style.text.font, tt_fonts));
    out.extend_from_slice(b"ET\nQ\n");
    out
}

/// `Tj` operator with the encoding the font needs.
fn show_text_op(text: &str, font: FontRef, tt_fonts: &mut [TrueTypeFont]) -> Vec<u8> {
    let mut out = Vec::new();
    match font {
        FontRef::TrueType(id) if id.0 < tt_fonts.len() => {
            out.extend_from_slice(tt_fonts[id.0].encode_hex(text).as_bytes());
        }
        _ => {
            out.push(b'(');
            out.extend_from_slice(&escape_literal(&encode_win_ansi(text)));
            out.push(b')');
        }
    }
    out.extend_from_slice(b" Tj\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::BuiltinFont;

    fn text(ops: &[u8]) -> String {
        String::from_utf8_lossy(ops).into_owned()
    }

    #[test]
    fn row_advances_cursor_by_fixed_height() {
        let table = Table::new(vec![100.0, 50.0], 28.0);
        let mut cursor = TableCursor::new(28.0, 700.0);
        let row = Row::new(vec![
            Cell::new("A", CellStyle::default()),
            Cell::new("B", CellStyle::default()),
        ]);
        let ops = table.row_ops(&row, &mut cursor, &mut []);
        assert_eq!(cursor.current_y(), 672.0);
        assert_eq!(cursor.rows_placed(), 1);
        let s = text(&ops);
        assert!(s.contains("(A) Tj"));
        assert!(s.contains("(B) Tj"));
        assert!(s.contains("28 672 100 28 re\nS"));
        assert!(s.contains("128 672 50 28 re\nS"));
    }

    #[test]
    fn background_is_filled_before_text() {
        let table = Table::new(vec![40.0], 10.0);
        let mut cursor = TableCursor::new(0.0, 100.0);
        let style = CellStyle {
            background_color: Some(Color::rgb(1.0, 0.0, 0.0)),
            text_color: Color::WHITE,
            ..CellStyle::default()
        };
        let ops = text(&table.row_ops(&Row::new(vec![Cell::new("X", style)]), &mut cursor, &mut []));
        let fill = ops.find("0 90 40 10 re\nf").unwrap();
        let glyphs = ops.find("(X) Tj").unwrap();
        assert!(fill < glyphs);
        assert!(ops.contains("1 1 1 rg"));
    }

    #[test]
    fn right_alignment_ends_at_padding() {
        let style = CellStyle {
            text: TextStyle::new(BuiltinFont::Helvetica, 10.0),
            align: TextAlign::Right,
            padding: 2.0,
            ..CellStyle::default()
        };
        let bounds = TextBox {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 20.0,
        };
        // "0" is 5.56pt wide at 10pt.
        let s = text(&text_in_box("0", &style, &bounds, &mut []));
        assert!(s.contains("92.44 7 Td"), "{}", s);
    }

    #[test]
    fn empty_text_emits_nothing() {
        let bounds = TextBox {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(text_in_box("", &CellStyle::default(), &bounds, &mut []).is_empty());
    }
}
