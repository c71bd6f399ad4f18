use invoice_core::images::{load_image, thumbnail_size, ColorSpace};
use invoice_core::{ImageError, ImageFormat, PdfDocument};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn encode_png(width: u32, height: u32, color: png::ColorType, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(pixels).unwrap();
    }
    out
}

/// SOI, SOF0 with the given geometry, EOI.
fn jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08];
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(components);
    data.extend_from_slice(&[0u8; 9]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

#[test]
fn rgb_png_is_decoded() {
    let png = encode_png(2, 2, png::ColorType::Rgb, &[10; 12]);
    let image = load_image(png).unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.color_space, ColorSpace::DeviceRGB);
    assert_eq!(image.data.len(), 12);
    assert!(image.alpha.is_none());
}

#[test]
fn rgba_png_splits_alpha() {
    let pixels = [1, 2, 3, 255, 4, 5, 6, 0];
    let image = load_image(encode_png(2, 1, png::ColorType::Rgba, &pixels)).unwrap();
    assert_eq!(image.data, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(image.alpha, Some(vec![255, 0]));
}

#[test]
fn gray_png_uses_device_gray() {
    let image = load_image(encode_png(3, 1, png::ColorType::Grayscale, &[0, 128, 255])).unwrap();
    assert_eq!(image.color_space, ColorSpace::DeviceGray);
    assert_eq!(image.data, vec![0, 128, 255]);
}

#[test]
fn jpeg_is_passed_through() {
    let data = jpeg(640, 480, 3);
    let image = load_image(data.clone()).unwrap();
    assert_eq!(image.format, ImageFormat::Jpeg);
    assert_eq!((image.width, image.height), (640, 480));
    assert_eq!(image.data, data);
}

#[test]
fn cmyk_jpeg_is_rejected() {
    assert!(matches!(
        load_image(jpeg(10, 10, 4)),
        Err(ImageError::JpegComponents(4))
    ));
}

#[test]
fn zero_sized_jpeg_is_rejected() {
    assert!(matches!(load_image(jpeg(0, 10, 3)), Err(ImageError::Empty)));
}

#[test]
fn truncated_png_is_a_decode_error() {
    let mut png = encode_png(4, 4, png::ColorType::Rgb, &[0; 48]);
    png.truncate(20);
    assert!(matches!(load_image(png), Err(ImageError::Png(_))));
}

#[test]
fn garbage_is_rejected() {
    assert!(matches!(
        load_image(b"not an image at all".to_vec()),
        Err(ImageError::UnsupportedFormat)
    ));
    assert!(matches!(load_image(vec![0xFF]), Err(ImageError::TooShort)));
}

#[test]
fn thumbnail_never_enlarges() {
    assert_eq!(thumbnail_size(1000, 500, 100), (100, 50));
    assert_eq!(thumbnail_size(20, 10, 100), (20, 10));
    assert_eq!(thumbnail_size(1, 5000, 100), (1, 100));
}

#[test]
fn image_with_alpha_gets_soft_mask() {
    let pixels = [255u8, 0, 0, 128];
    let image = load_image(encode_png(1, 1, png::ColorType::Rgba, &pixels)).unwrap();
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.set_compression(false);
    let (id, dims) = doc.add_image(&image).unwrap();
    assert_eq!((dims.width, dims.height), (1, 1));
    doc.begin_page(100.0, 100.0);
    doc.place_image(id, 10.0, 10.0, 50.0, 50.0).unwrap();
    doc.end_page().unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/SMask 6 0 R"));
    assert!(contains(&bytes, b"/ColorSpace /DeviceGray"));
    assert!(contains(&bytes, b"/XObject << /Im1 5 0 R >>"));
    assert!(contains(&bytes, b"50 0 0 50 10 10 cm\n/Im1 Do"));
}

#[test]
fn jpeg_xobject_uses_dct() {
    let image = load_image(jpeg(8, 8, 1)).unwrap();
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.add_image(&image).unwrap();
    doc.begin_page(100.0, 100.0);
    doc.end_page().unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/Filter /DCTDecode"));
    assert!(contains(&bytes, b"/ColorSpace /DeviceGray"));
}
