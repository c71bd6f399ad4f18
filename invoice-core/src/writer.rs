use std::io::{self, Write};

use crate::objects::{Dict, ObjId, PdfObject};

/// Serializes indirect objects to a `Write` target while recording the
/// byte offset of each one for the cross-reference table.
pub struct PdfWriter<W: Write> {
    inner: W,
    offset: usize,
    /// Indexed by object number; `None` marks a free slot.
    offsets: Vec<Option<usize>>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(inner: W) -> Self {
        PdfWriter {
            inner,
            offset: 0,
            offsets: Vec::new(),
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.offset += bytes.len();
        Ok(())
    }

    /// `%PDF-1.7` plus a comment of high-bit bytes so transfer tools
    /// treat the file as binary.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.emit(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n")
    }

    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        let slot = id.0 as usize;
        if self.offsets.len() <= slot {
            self.offsets.resize(slot + 1, None);
        }
        self.offsets[slot] = Some(self.offset);

        let mut buf = format!("{} {} obj\n", id.0, id.1).into_bytes();
        encode_object(obj, &mut buf);
        buf.extend_from_slice(b"\nendobj\n");
        self.emit(&buf)
    }

    /// Write the xref table, trailer, `startxref` and `%%EOF`.
    pub fn finish(&mut self, root: ObjId, info: Option<ObjId>) -> io::Result<()> {
        let xref_start = self.offset;
        let size = self.offsets.len().max(1);

        let mut buf = format!("xref\n0 {}\n", size).into_bytes();
        // Each entry is exactly 20 bytes including the CRLF.
        buf.extend_from_slice(b"0000000000 65535 f\r\n");
        for slot in self.offsets.iter().skip(1) {
            match slot {
                Some(off) => buf.extend_from_slice(format!("{:010} 00000 n\r\n", off).as_bytes()),
                None => buf.extend_from_slice(b"0000000000 00000 f\r\n"),
            }
        }

        let mut trailer = Dict::new().with("Size", size as i64).with("Root", root);
        if let Some(info) = info {
            trailer.set("Info", info);
        }
        buf.extend_from_slice(b"trailer\n");
        encode_object(&PdfObject::Dictionary(trailer), &mut buf);
        buf.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_start).as_bytes());
        self.emit(&buf)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn encode_dict_body(dict: &Dict, out: &mut Vec<u8>) {
    for (key, val) in dict.iter() {
        out.extend_from_slice(b" /");
        out.extend_from_slice(key.as_bytes());
        out.push(b' ');
        encode_object(val, out);
    }
}

/// Append the textual PDF form of `obj` to `out`.
pub fn encode_object(obj: &PdfObject, out: &mut Vec<u8>) {
    match obj {
        PdfObject::Null => out.extend_from_slice(b"null"),
        PdfObject::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        PdfObject::Integer(n) => out.extend_from_slice(n.to_string().as_bytes()),
        PdfObject::Real(f) => out.extend_from_slice(format_real(*f).as_bytes()),
        PdfObject::Name(name) => {
            out.push(b'/');
            out.extend_from_slice(name.as_bytes());
        }
        PdfObject::LiteralString(bytes) => {
            out.push(b'(');
            out.extend_from_slice(&escape_literal(bytes));
            out.push(b')');
        }
        PdfObject::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                encode_object(item, out);
            }
            out.push(b']');
        }
        PdfObject::Dictionary(dict) => {
            out.extend_from_slice(b"<<");
            encode_dict_body(dict, out);
            out.extend_from_slice(b" >>");
        }
        PdfObject::Stream { dict, data } => {
            out.extend_from_slice(b"<<");
            encode_dict_body(dict, out);
            out.extend_from_slice(format!(" /Length {} >>\nstream\n", data.len()).as_bytes());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
        PdfObject::Reference(id) => {
            out.extend_from_slice(format!("{} {} R", id.0, id.1).as_bytes());
        }
    }
}

/// Escape `\`, `(` and `)` in literal string bytes.
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if matches!(b, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

/// Reals keep one decimal when integral and otherwise up to six,
/// never scientific notation.
fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Coordinates in content streams: integers without a decimal point,
/// otherwise at most four decimals.
pub fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}
