/// Object identifier: (object_number, generation_number).
/// Generation is always 0 since documents are written in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32, pub u16);

impl ObjId {
    pub fn new(num: u32) -> Self {
        ObjId(num, 0)
    }
}

/// PDF object model (PDF 32000-1:2008 Section 7.3), restricted to
/// what an invoice document needs.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Name object, stored without the leading `/`.
    Name(String),
    /// Literal string, stored as raw bytes without the enclosing parens.
    LiteralString(Vec<u8>),
    Array(Vec<PdfObject>),
    Dictionary(Dict),
    Stream { dict: Dict, data: Vec<u8> },
    Reference(ObjId),
}

impl PdfObject {
    pub fn name(s: &str) -> Self {
        PdfObject::Name(s.to_string())
    }

    pub fn string(s: &str) -> Self {
        PdfObject::LiteralString(s.as_bytes().to_vec())
    }

    pub fn array(items: Vec<PdfObject>) -> Self {
        PdfObject::Array(items)
    }

    pub fn stream(dict: Dict, data: Vec<u8>) -> Self {
        PdfObject::Stream { dict, data }
    }
}

impl From<ObjId> for PdfObject {
    fn from(id: ObjId) -> Self {
        PdfObject::Reference(id)
    }
}

impl From<i64> for PdfObject {
    fn from(n: i64) -> Self {
        PdfObject::Integer(n)
    }
}

impl From<u32> for PdfObject {
    fn from(n: u32) -> Self {
        PdfObject::Integer(n as i64)
    }
}

impl From<f64> for PdfObject {
    fn from(f: f64) -> Self {
        PdfObject::Real(f)
    }
}

impl From<Dict> for PdfObject {
    fn from(d: Dict) -> Self {
        PdfObject::Dictionary(d)
    }
}

/// Dictionary with insertion-ordered keys, so serialized output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, PdfObject)>,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    /// Start a dictionary with `/Type /<type_name>`.
    pub fn typed(type_name: &str) -> Self {
        Dict::new().with("Type", PdfObject::name(type_name))
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<PdfObject>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a key, keeping the original position on replace.
    pub fn set(&mut self, key: &str, value: impl Into<PdfObject>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PdfObject)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
