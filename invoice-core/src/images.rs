use thiserror::Error;

use crate::objects::{Dict, ObjId, PdfObject};
use crate::truetype::deflate;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data too short to identify")]
    TooShort,

    #[error("unsupported image format (expected PNG or JPEG)")]
    UnsupportedFormat,

    #[error("malformed JPEG: {0}")]
    Jpeg(&'static str),

    #[error("unsupported JPEG component count {0}")]
    JpegComponents(u8),

    #[error("PNG decode error: {0}")]
    Png(#[from] png::DecodingError),

    #[error("unsupported PNG color type {0:?}")]
    PngColorType(png::ColorType),

    #[error("image has zero width or height")]
    Empty,
}

/// Opaque handle to an image registered with a `PdfDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// Decoded (PNG) or pass-through (JPEG) image data.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub color_space: ColorSpace,
    /// 8-bit samples for PNG, the original file for JPEG.
    pub data: Vec<u8>,
    /// Alpha channel as 8-bit gray samples.
    pub alpha: Option<Vec<u8>>,
}

impl ImageData {
    /// Image XObject plus optional soft mask. `smask_id` is only used
    /// when the image carries alpha.
    pub(crate) fn xobjects(&self, id: ObjId, smask_id: ObjId) -> Vec<(ObjId, PdfObject)> {
        let mut dict = Dict::typed("XObject")
            .with("Subtype", PdfObject::name("Image"))
            .with("Width", self.width)
            .with("Height", self.height)
            .with("ColorSpace", PdfObject::name(self.color_space.pdf_name()))
            .with("BitsPerComponent", 8i64);

        let mut out = Vec::with_capacity(2);
        let body = match self.format {
            ImageFormat::Jpeg => {
                dict.set("Filter", PdfObject::name("DCTDecode"));
                self.data.clone()
            }
            ImageFormat::Png => {
                dict.set("Filter", PdfObject::name("FlateDecode"));
                deflate(&self.data)
            }
        };
        if let Some(alpha) = &self.alpha {
            dict.set("SMask", smask_id);
            let mask = Dict::typed("XObject")
                .with("Subtype", PdfObject::name("Image"))
                .with("Width", self.width)
                .with("Height", self.height)
                .with("ColorSpace", PdfObject::name("DeviceGray"))
                .with("BitsPerComponent", 8i64)
                .with("Filter", PdfObject::name("FlateDecode"));
            out.push((smask_id, PdfObject::stream(mask, deflate(alpha))));
        }
        out.insert(0, (id, PdfObject::stream(dict, body)));
        out
    }
}

pub fn detect_format(data: &[u8]) -> Result<ImageFormat, ImageError> {
    match data {
        [0xFF, 0xD8, ..] if data.len() >= 4 => Ok(ImageFormat::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        _ if data.len() < 4 => Err(ImageError::TooShort),
        _ => Err(ImageError::UnsupportedFormat),
    }
}

pub fn load_image(data: Vec<u8>) -> Result<ImageData, ImageError> {
    let image = match detect_format(&data)? {
        ImageFormat::Jpeg => parse_jpeg(data)?,
        ImageFormat::Png => parse_png(&data)?,
    };
    if image.width == 0 || image.height == 0 {
        return Err(ImageError::Empty);
    }
    Ok(image)
}

fn parse_jpeg(data: Vec<u8>) -> Result<ImageData, ImageError> {
    let (width, height, components) = jpeg_frame(&data)?;
    let color_space = match components {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRGB,
        n => return Err(ImageError::JpegComponents(n)),
    };
    Ok(ImageData {
        width,
        height,
        format: ImageFormat::Jpeg,
        color_space,
        data,
        alpha: None,
    })
}

/// Walk JPEG segments until a SOF0..SOF3 frame header and read its
/// dimensions and component count.
fn jpeg_frame(data: &[u8]) -> Result<(u32, u32, u8), ImageError> {
    let mut i = 2;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        match marker {
            0xC0..=0xC3 => {
                let frame = data
                    .get(i + 5..i + 10)
                    .ok_or(ImageError::Jpeg("truncated frame header"))?;
                let height = u16::from_be_bytes([frame[0], frame[1]]) as u32;
                let width = u16::from_be_bytes([frame[2], frame[3]]) as u32;
                return Ok((width, height, frame[4]));
            }
            // Fill bytes and standalone markers carry no length.
            0xFF | 0x00 => i += 1,
            0xD0..=0xD9 | 0x01 => i += 2,
            _ => {
                let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                i += 2 + len;
            }
        }
    }
    Err(ImageError::Jpeg("no frame header found"))
}

fn parse_png(data: &[u8]) -> Result<ImageData, ImageError> {
    let mut decoder = png::Decoder::new(data);
    // Expand palettes and sub-byte depths, strip 16-bit to 8.
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let split = |stride: usize| {
        let mut color = Vec::with_capacity(buf.len() / stride * (stride - 1));
        let mut alpha = Vec::with_capacity(buf.len() / stride);
        for px in buf.chunks_exact(stride) {
            color.extend_from_slice(&px[..stride - 1]);
            alpha.push(px[stride - 1]);
        }
        (color, Some(alpha))
    };

    let (color_space, data, alpha) = match info.color_type {
        png::ColorType::Rgb => (ColorSpace::DeviceRGB, buf.clone(), None),
        png::ColorType::Grayscale => (ColorSpace::DeviceGray, buf.clone(), None),
        png::ColorType::Rgba => {
            let (c, a) = split(4);
            (ColorSpace::DeviceRGB, c, a)
        }
        png::ColorType::GrayscaleAlpha => {
            let (c, a) = split(2);
            (ColorSpace::DeviceGray, c, a)
        }
        other => return Err(ImageError::PngColorType(other)),
    };

    Ok(ImageData {
        width: info.width,
        height: info.height,
        format: ImageFormat::Png,
        color_space,
        data,
        alpha,
    })
}

/// Scale `(width, height)` down to fit inside `bound × bound`, keeping
/// the aspect ratio. Images already inside the bound keep their size.
pub fn thumbnail_size(width: u32, height: u32, bound: u32) -> (u32, u32) {
    if width <= bound && height <= bound {
        return (width, height);
    }
    let scale = (bound as f64 / width as f64).min(bound as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, bound);
    let h = ((height as f64 * scale).round() as u32).clamp(1, bound);
    (w, h)
}
