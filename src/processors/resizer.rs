// photoprep/src/processors/resizer.rs
use image::{imageops::FilterType, DynamicImage, GenericImageView};

pub struct Resizer {
    filter: FilterType,
}

impl Resizer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Proportional resize. Each side becomes `floor(side * percent / 100)`,
    /// never less than one pixel.
    pub fn resize_percent(&self, image: &DynamicImage, percent: u8) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();
        let (width, height) = scaled_dimensions(orig_width, orig_height, percent);

        if width == orig_width && height == orig_height {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            orig_width,
            orig_height,
            width,
            height
        );

        image.resize_exact(width, height, self.filter)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn scaled_dimensions(width: u32, height: u32, percent: u8) -> (u32, u32) {
    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(percent) / 100;
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient;

    #[test]
    fn test_scaled_dimensions_truncate() {
        assert_eq!(scaled_dimensions(200, 100, 50), (100, 50));
        assert_eq!(scaled_dimensions(199, 99, 50), (99, 49));
        assert_eq!(scaled_dimensions(640, 480, 100), (640, 480));
    }

    #[test]
    fn test_scaled_dimensions_never_zero() {
        assert_eq!(scaled_dimensions(10, 3, 1), (1, 1));
    }

    #[test]
    fn test_resize_percent() {
        let resized = Resizer::new().resize_percent(&gradient(200, 100), 50);
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_full_size_is_unchanged() {
        let resized = Resizer::new()
            .with_filter(FilterType::Nearest)
            .resize_percent(&gradient(30, 20), 100);
        assert_eq!(resized.dimensions(), (30, 20));
    }
}
