use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Largest size that fits inside the optional bounds while keeping the
    /// aspect ratio. Never upscales.
    pub fn fit_within(
        orig_width: u32,
        orig_height: u32,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> (u32, u32) {
        if orig_width == 0 || orig_height == 0 {
            return (orig_width, orig_height);
        }

        let width_scale = max_width
            .map(|w| w as f64 / orig_width as f64)
            .unwrap_or(1.0);
        let height_scale = max_height
            .map(|h| h as f64 / orig_height as f64)
            .unwrap_or(1.0);
        let scale = width_scale.min(height_scale).min(1.0);

        if scale >= 1.0 {
            return (orig_width, orig_height);
        }

        let width = ((orig_width as f64 * scale).round() as u32).max(1);
        let height = ((orig_height as f64 * scale).round() as u32).max(1);
        (width, height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Scale the image down into the bounds. Returns `None` when it already fits.
    pub fn shrink_to_fit(
        img: &DynamicImage,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Option<DynamicImage> {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::fit_within(orig_width, orig_height, max_width, max_height);
        if (width, height) == (orig_width, orig_height) {
            return None;
        }

        tracing::debug!(
            from_width = orig_width,
            from_height = orig_height,
            to_width = width,
            to_height = height,
            "Downscaling image"
        );
        Some(Self::resize_image(img, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_fit_within_keeps_aspect_ratio() {
        assert_eq!(
            ImageResize::fit_within(4000, 3000, Some(1920), Some(1080)),
            (1440, 1080)
        );
        assert_eq!(
            ImageResize::fit_within(3000, 1000, Some(1920), Some(1080)),
            (1920, 640)
        );
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(
            ImageResize::fit_within(100, 50, Some(1920), Some(1080)),
            (100, 50)
        );
        assert_eq!(ImageResize::fit_within(100, 50, None, None), (100, 50));
    }

    #[test]
    fn test_fit_within_single_bound() {
        assert_eq!(ImageResize::fit_within(1000, 500, Some(100), None), (100, 50));
        assert_eq!(ImageResize::fit_within(1000, 500, None, Some(100)), (200, 100));
    }

    #[test]
    fn test_fit_within_tiny_result_is_at_least_one_pixel() {
        assert_eq!(ImageResize::fit_within(10_000, 1, Some(10), None), (10, 1));
    }

    #[test]
    fn test_select_filter() {
        assert_eq!(ImageResize::select_filter(1000, 1000, 100, 100), FilterType::Triangle);
        assert_eq!(ImageResize::select_filter(1000, 1000, 600, 600), FilterType::CatmullRom);
        assert_eq!(ImageResize::select_filter(1000, 1000, 900, 900), FilterType::Lanczos3);
    }

    #[test]
    fn test_shrink_to_fit() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([1, 2, 3, 255])));
        assert!(ImageResize::shrink_to_fit(&img, Some(400), Some(400)).is_none());

        let shrunk = ImageResize::shrink_to_fit(&img, Some(50), None).unwrap();
        assert_eq!(shrunk.dimensions(), (50, 25));
    }
}
