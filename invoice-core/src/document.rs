use std::io::{self, Write};

use crate::fonts::{BuiltinFont, FontRef, TrueTypeFontId};
use crate::images::{ImageData, ImageId};
use crate::objects::{Dict, ObjId, PdfObject};
use crate::tables::{text_in_box, CellStyle, Row, Table, TableCursor, TextBox};
use crate::truetype::{deflate, FontError, TrueTypeFont};
use crate::writer::{format_coord, PdfWriter};

const CATALOG_OBJ: ObjId = ObjId(1, 0);
const PAGES_OBJ: ObjId = ObjId(2, 0);
const FIRST_FREE_OBJ: u32 = 3;

/// Single-pass PDF builder.
///
/// Generic over `Write`; the invoice renderer builds into a `Vec<u8>` so
/// nothing touches the filesystem until the whole document succeeded.
/// Pages are flushed on `end_page`; fonts are written at the end because
/// their width tables depend on the glyphs actually drawn.
pub struct PdfDocument<W: Write> {
    writer: PdfWriter<W>,
    info: Vec<(String, String)>,
    builtin_ids: Vec<(BuiltinFont, ObjId)>,
    tt_fonts: Vec<TrueTypeFont>,
    tt_ids: Vec<ObjId>,
    image_ids: Vec<ObjId>,
    page_ids: Vec<ObjId>,
    current_page: Option<PageBuilder>,
    next_obj: u32,
    compress: bool,
}

struct PageBuilder {
    width: f64,
    height: f64,
    ops: Vec<u8>,
}

impl<W: Write> PdfDocument<W> {
    /// Write the header and the standard font dictionaries.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = PdfWriter::new(writer);
        writer.write_header()?;

        let mut next_obj = FIRST_FREE_OBJ;
        let mut builtin_ids = Vec::new();
        for font in BuiltinFont::ALL {
            let id = ObjId::new(next_obj);
            next_obj += 1;
            let dict = Dict::typed("Font")
                .with("Subtype", PdfObject::name("Type1"))
                .with("BaseFont", PdfObject::name(font.pdf_base_name()))
                .with("Encoding", PdfObject::name("WinAnsiEncoding"));
            writer.write_object(id, &dict.into())?;
            builtin_ids.push((font, id));
        }

        Ok(PdfDocument {
            writer,
            info: Vec::new(),
            builtin_ids,
            tt_fonts: Vec::new(),
            tt_ids: Vec::new(),
            image_ids: Vec::new(),
            page_ids: Vec::new(),
            current_page: None,
            next_obj,
            compress: true,
        })
    }

    fn alloc(&mut self) -> ObjId {
        let id = ObjId::new(self.next_obj);
        self.next_obj += 1;
        id
    }

    /// FlateDecode page content streams (default on).
    pub fn set_compression(&mut self, enabled: bool) -> &mut Self {
        self.compress = enabled;
        self
    }

    /// Document Info entry such as "Title" or "Creator". Values are
    /// written as literal strings, so keep them Latin-1.
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Register a TrueType font for embedding.
    pub fn load_font_bytes(&mut self, data: Vec<u8>) -> Result<FontRef, FontError> {
        let pdf_name = format!("F{}", BuiltinFont::ALL.len() + self.tt_fonts.len() + 1);
        let font = TrueTypeFont::from_bytes(data, pdf_name)?;
        let id = self.alloc();
        self.tt_fonts.push(font);
        self.tt_ids.push(id);
        Ok(FontRef::TrueType(TrueTypeFontId(self.tt_fonts.len() - 1)))
    }

    /// Write a decoded image's XObject immediately.
    pub fn add_image(&mut self, image: &ImageData) -> io::Result<(ImageId, ImageDims)> {
        let id = self.alloc();
        let smask_id = if image.alpha.is_some() {
            self.alloc()
        } else {
            id
        };
        for (obj_id, obj) in image.xobjects(id, smask_id) {
            self.writer.write_object(obj_id, &obj)?;
        }
        self.image_ids.push(id);
        Ok((
            ImageId(self.image_ids.len() - 1),
            ImageDims {
                width: image.width,
                height: image.height,
            },
        ))
    }

    pub fn begin_page(&mut self, width: f64, height: f64) -> &mut Self {
        self.current_page = Some(PageBuilder {
            width,
            height,
            ops: Vec::new(),
        });
        self
    }

    fn ops(&mut self) -> io::Result<&mut Vec<u8>> {
        self.current_page
            .as_mut()
            .map(|p| &mut p.ops)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no open page"))
    }

    /// Append raw content stream operators to the open page.
    fn push_ops(&mut self, bytes: &[u8]) -> io::Result<&mut Self> {
        self.ops()?.extend_from_slice(bytes);
        Ok(self)
    }

    /// One line of text aligned inside a box.
    pub fn place_text_in_box(&mut self, text: &str, bounds: &TextBox, style: &CellStyle) -> io::Result<()> {
        let ops = text_in_box(text, style, bounds, &mut self.tt_fonts);
        self.push_ops(&ops).map(|_| ())
    }

    /// Paint an image with its bottom-left corner at (x, y).
    pub fn place_image(&mut self, image: ImageId, x: f64, y: f64, width: f64, height: f64) -> io::Result<()> {
        let ops = format!(
            "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
            format_coord(width),
            format_coord(height),
            format_coord(x),
            format_coord(y),
            image.0 + 1
        );
        self.push_ops(ops.as_bytes()).map(|_| ())
    }

    /// Draw one table row at the cursor and move the cursor down.
    pub fn fit_row(&mut self, table: &Table, row: &Row, cursor: &mut TableCursor) -> io::Result<()> {
        let ops = table.row_ops(row, cursor, &mut self.tt_fonts);
        self.push_ops(&ops).map(|_| ())
    }

    fn resources(&self) -> Dict {
        let mut fonts = Dict::new();
        for (font, id) in &self.builtin_ids {
            fonts.set(font.pdf_name(), *id);
        }
        for (font, id) in self.tt_fonts.iter().zip(&self.tt_ids) {
            fonts.set(&font.pdf_name, *id);
        }
        let mut resources = Dict::new().with("Font", fonts);
        if !self.image_ids.is_empty() {
            let mut xobjects = Dict::new();
            for (i, id) in self.image_ids.iter().enumerate() {
                xobjects.set(&format!("Im{}", i + 1), *id);
            }
            resources.set("XObject", xobjects);
        }
        resources
    }

    /// Flush the open page: its content stream and page dictionary.
    pub fn end_page(&mut self) -> io::Result<()> {
        let page = self
            .current_page
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "end_page without open page"))?;

        let content_id = self.alloc();
        let page_id = self.alloc();

        let content = if self.compress {
            PdfObject::stream(
                Dict::new().with("Filter", PdfObject::name("FlateDecode")),
                deflate(&page.ops),
            )
        } else {
            PdfObject::stream(Dict::new(), page.ops)
        };
        self.writer.write_object(content_id, &content)?;

        let page_dict = Dict::typed("Page")
            .with("Parent", PAGES_OBJ)
            .with(
                "MediaBox",
                PdfObject::array(vec![
                    PdfObject::Integer(0),
                    PdfObject::Integer(0),
                    PdfObject::Real(page.width),
                    PdfObject::Real(page.height),
                ]),
            )
            .with("Contents", content_id)
            .with("Resources", self.resources());
        self.writer.write_object(page_id, &page_dict.into())?;
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Write fonts, info, page tree, catalog and trailer; returns the
    /// inner writer.
    pub fn end_document(mut self) -> io::Result<W> {
        if self.current_page.is_some() {
            self.end_page()?;
        }

        let mut next = self.next_obj;
        let mut font_objects = Vec::new();
        for (font, &id) in self.tt_fonts.iter().zip(&self.tt_ids) {
            let (objects, after) = font.embed_objects(id, next);
            font_objects.extend(objects);
            next = after;
        }
        for (id, obj) in &font_objects {
            self.writer.write_object(*id, obj)?;
        }
        self.next_obj = next;

        let info_id = if self.info.is_empty() {
            None
        } else {
            let id = self.alloc();
            let mut dict = Dict::new();
            for (k, v) in &self.info {
                dict.set(k, PdfObject::string(v));
            }
            self.writer.write_object(id, &dict.into())?;
            Some(id)
        };

        let kids: Vec<PdfObject> = self.page_ids.iter().map(|&id| id.into()).collect();
        let pages = Dict::typed("Pages")
            .with("Kids", PdfObject::Array(kids))
            .with("Count", self.page_ids.len() as i64);
        self.writer.write_object(PAGES_OBJ, &pages.into())?;

        let catalog = Dict::typed("Catalog").with("Pages", PAGES_OBJ);
        self.writer.write_object(CATALOG_OBJ, &catalog.into())?;

        self.writer.finish(CATALOG_OBJ, info_id)?;
        Ok(self.writer.into_inner())
    }
}

/// Pixel dimensions of a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    pub fn height_for_width(&self, width: f64) -> f64 {
        width * self.height as f64 / self.width as f64
    }
}
