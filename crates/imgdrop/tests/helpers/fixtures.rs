//! Test fixtures: generated images and plain files.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgdrop::RawFile;
use std::io::Cursor;

/// PNG of the given size, left half red and right half blue.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    }));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    buffer
}

pub fn png_file(name: &str, width: u32, height: u32) -> RawFile {
    RawFile::from_bytes(name, "image/png", create_test_png(width, height))
}

pub fn text_file(name: &str, size: usize) -> RawFile {
    RawFile::from_bytes(name, "text/plain", vec![b'x'; size])
}

pub fn pdf_file(name: &str) -> RawFile {
    RawFile::from_bytes(name, "application/pdf", b"%PDF-1.4\n%%EOF\n".to_vec())
}

/// Dimensions of an encoded image.
pub fn dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("Failed to decode image");
    (img.width(), img.height())
}
