use image::{imageops, DynamicImage};
use std::io::Cursor;

/// EXIF orientation handling (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag (1-8). Returns 1 (normal) when the data
    /// carries no EXIF block or no orientation field.
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(_) => return 1,
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .filter(|v| (1..=8).contains(v))
            .map(|v| v as u8)
            .unwrap_or(1)
    }

    /// Rotation and flips needed for an EXIF orientation value.
    /// Returns (rotate_angle, flip_horizontal, flip_vertical)
    pub fn transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),
            2 => (None, true, false),
            3 => (Some(180), false, false),
            4 => (None, false, true),
            5 => (Some(90), true, false),
            6 => (Some(90), false, false),
            7 => (Some(270), true, false),
            8 => (Some(270), false, false),
            _ => (None, false, false),
        }
    }

    /// Apply the EXIF orientation found in `data` to the decoded image
    pub fn apply_exif_orientation(img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        Self::apply(img, orientation)
    }

    pub fn apply(mut img: DynamicImage, orientation: u8) -> DynamicImage {
        let (rotate, flip_h, flip_v) = Self::transforms(orientation);
        if orientation != 1 {
            tracing::debug!(
                orientation = orientation,
                rotate = ?rotate,
                flip_horizontal = flip_h,
                flip_vertical = flip_v,
                "Applying EXIF orientation"
            );
        }

        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }
        if flip_h {
            img = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
        }
        if flip_v {
            img = DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()));
        }

        img
    }

    /// Rotate clockwise by 90, 180 or 270 degrees
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_no_exif_is_normal() {
        assert_eq!(ImageOrientation::read_exif_orientation(b""), 1);
        assert_eq!(ImageOrientation::read_exif_orientation(b"not an image"), 1);
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255])));

        assert_eq!(ImageOrientation::apply(img.clone(), 6).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::apply(img.clone(), 8).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::apply(img.clone(), 3).dimensions(), (4, 2));
        assert_eq!(ImageOrientation::apply(img, 1).dimensions(), (4, 2));
    }

    #[test]
    fn test_flip_horizontal_moves_pixels() {
        let mut buf = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        buf.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let img = DynamicImage::ImageRgba8(buf);

        let flipped = ImageOrientation::apply(img, 2);
        assert_eq!(flipped.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(flipped.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_invalid_orientation_is_identity() {
        for value in [0u8, 9, 255] {
            assert_eq!(ImageOrientation::transforms(value), (None, false, false));
        }
    }
}
