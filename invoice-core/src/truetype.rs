use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::objects::{Dict, ObjId, PdfObject};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to parse TrueType data: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),

    #[error("font has no Unicode cmap subtable")]
    NoUnicodeCmap,

    #[error("font has a zero units-per-em value")]
    BadUnitsPerEm,
}

/// A parsed TrueType font ready to be embedded as a Type0 /
/// CIDFontType2 composite font with Identity-H encoding.
pub struct TrueTypeFont {
    pub(crate) postscript_name: String,
    font_data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    cap_height: i16,
    italic_angle: f64,
    flags: u32,
    stem_v: i16,
    /// Unicode code point to glyph ID.
    cmap: BTreeMap<u32, u16>,
    /// Indexed by glyph ID, in font units.
    advances: Vec<u16>,
    /// Glyphs drawn so far; drives the /W array and ToUnicode map.
    used_glyphs: BTreeMap<u16, char>,
    /// Resource name, e.g. "F3".
    pub(crate) pdf_name: String,
}

impl TrueTypeFont {
    pub fn from_bytes(data: Vec<u8>, pdf_name: String) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&data, 0)?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(FontError::BadUnitsPerEm);
        }
        let ascent = face.ascender();
        let descent = face.descender();
        let bbox = face.global_bounding_box();

        let mut cmap = BTreeMap::new();
        let tables = face.tables().cmap.ok_or(FontError::NoUnicodeCmap)?;
        for subtable in tables.subtables.into_iter().filter(|s| s.is_unicode()) {
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    cmap.entry(cp).or_insert(gid.0);
                }
            });
        }
        if cmap.is_empty() {
            return Err(FontError::NoUnicodeCmap);
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
            .and_then(|n| n.to_string())
            .map(|n| n.replace(' ', ""))
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        // Nonsymbolic (32), plus FixedPitch (1) and Italic (64) when set.
        let mut flags = 32u32;
        if face.is_monospaced() {
            flags |= 1;
        }
        if face.is_italic() {
            flags |= 64;
        }
        let weight = face.weight().to_number() as f64 / 1000.0;

        Ok(TrueTypeFont {
            postscript_name,
            units_per_em,
            ascent,
            descent,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cap_height: face.capital_height().unwrap_or(ascent),
            italic_angle: face.italic_angle() as f64,
            flags,
            stem_v: (10.0 + 220.0 * weight * weight) as i16,
            cmap,
            advances,
            used_glyphs: BTreeMap::new(),
            font_data: data,
            pdf_name,
        })
    }

    fn glyph_for(&self, ch: char) -> u16 {
        self.cmap.get(&(ch as u32)).copied().unwrap_or(0)
    }

    fn to_pdf_units(&self, value: i32) -> i64 {
        value as i64 * 1000 / self.units_per_em as i64
    }

    fn advance_pdf(&self, gid: u16) -> i64 {
        let raw = self
            .advances
            .get(gid as usize)
            .or_else(|| self.advances.first())
            .copied()
            .unwrap_or(0);
        self.to_pdf_units(raw as i32)
    }

    /// Whether the font maps `ch` to a real glyph.
    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyph_for(ch) != 0
    }

    /// Text width in points.
    pub fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        let units: i64 = text.chars().map(|ch| self.advance_pdf(self.glyph_for(ch))).sum();
        units as f64 * font_size / 1000.0
    }

    /// Encode text as a hex string of 2-byte glyph IDs and record the
    /// glyphs as used.
    pub fn encode_hex(&mut self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for ch in text.chars() {
            let gid = self.glyph_for(ch);
            self.used_glyphs.entry(gid).or_insert(ch);
            hex.push_str(&format!("{:04X}", gid));
        }
        hex.push('>');
        hex
    }

    /// `/W` array grouping consecutive glyph IDs: `[c [w1 w2] c [w] ...]`.
    pub fn width_array(&self) -> Vec<PdfObject> {
        let mut out = Vec::new();
        let mut run: Vec<PdfObject> = Vec::new();
        let mut run_start = 0u16;
        let mut prev: Option<u16> = None;

        for &gid in self.used_glyphs.keys() {
            if starts_run(prev, gid) {
                if !run.is_empty() {
                    out.push(PdfObject::Integer(run_start as i64));
                    out.push(PdfObject::Array(std::mem::take(&mut run)));
                }
                run_start = gid;
            }
            run.push(PdfObject::Integer(self.advance_pdf(gid)));
            prev = Some(gid);
        }
        if !run.is_empty() {
            out.push(PdfObject::Integer(run_start as i64));
            out.push(PdfObject::Array(run));
        }
        out
    }

    /// ToUnicode CMap so copied text maps back to the drawn characters.
    pub fn to_unicode_cmap(&self) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let mappings: Vec<(u16, char)> = self
            .used_glyphs
            .iter()
            .filter(|(&gid, _)| gid != 0)
            .map(|(&gid, &ch)| (gid, ch))
            .collect();
        // At most 100 entries per bfchar block.
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, ch) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap.into_bytes()
    }

    /// All objects needed to embed this font. `type0_id` is the ID the
    /// page resources already point at; the four dependent objects take
    /// `first_free` onward. Returns the objects and the next free number.
    pub(crate) fn embed_objects(
        &self,
        type0_id: ObjId,
        first_free: u32,
    ) -> (Vec<(ObjId, PdfObject)>, u32) {
        let cid_id = ObjId::new(first_free);
        let descriptor_id = ObjId::new(first_free + 1);
        let file_id = ObjId::new(first_free + 2);
        let tounicode_id = ObjId::new(first_free + 3);

        let type0 = Dict::typed("Font")
            .with("Subtype", PdfObject::name("Type0"))
            .with("BaseFont", PdfObject::name(&self.postscript_name))
            .with("Encoding", PdfObject::name("Identity-H"))
            .with("DescendantFonts", PdfObject::array(vec![cid_id.into()]))
            .with("ToUnicode", tounicode_id);

        let system_info = Dict::new()
            .with("Registry", PdfObject::string("Adobe"))
            .with("Ordering", PdfObject::string("Identity"))
            .with("Supplement", 0i64);
        let cid_font = Dict::typed("Font")
            .with("Subtype", PdfObject::name("CIDFontType2"))
            .with("BaseFont", PdfObject::name(&self.postscript_name))
            .with("CIDSystemInfo", system_info)
            .with("FontDescriptor", descriptor_id)
            .with("DW", self.advance_pdf(0))
            .with("W", PdfObject::Array(self.width_array()))
            .with("CIDToGIDMap", PdfObject::name("Identity"));

        let bbox = self
            .bbox
            .iter()
            .map(|&v| PdfObject::Integer(self.to_pdf_units(v as i32)))
            .collect();
        let descriptor = Dict::typed("FontDescriptor")
            .with("FontName", PdfObject::name(&self.postscript_name))
            .with("Flags", self.flags)
            .with("FontBBox", PdfObject::Array(bbox))
            .with("ItalicAngle", self.italic_angle)
            .with("Ascent", self.to_pdf_units(self.ascent as i32))
            .with("Descent", self.to_pdf_units(self.descent as i32))
            .with("CapHeight", self.to_pdf_units(self.cap_height as i32))
            .with("StemV", self.stem_v as i64)
            .with("FontFile2", file_id);

        let file_stream = PdfObject::stream(
            Dict::new()
                .with("Length1", self.font_data.len() as i64)
                .with("Filter", PdfObject::name("FlateDecode")),
            deflate(&self.font_data),
        );

        let objects = vec![
            (type0_id, type0.into()),
            (cid_id, cid_font.into()),
            (descriptor_id, descriptor.into()),
            (file_id, file_stream),
            (
                tounicode_id,
                PdfObject::stream(Dict::new(), self.to_unicode_cmap()),
            ),
        ];
        (objects, first_free + 4)
    }
}

/// zlib-compress bytes for a FlateDecode stream.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail.
    let _ = enc.write_all(data);
    enc.finish().unwrap_or_default()
}

/// True unless `gid` directly follows `prev`.
fn starts_run(prev: Option<u16>, gid: u16) -> bool {
    prev.and_then(|p| p.checked_add(1)) != Some(gid)
}
