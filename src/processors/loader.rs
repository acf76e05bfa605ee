// photoprep/src/processors/loader.rs
use super::metadata::{MetadataProcessor, MetadataTable};
use crate::core::{Result, SweepError};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// A decoded standard-format image together with its EXIF table.
pub struct LoadedImage {
    pub image: DynamicImage,
    pub metadata: MetadataTable,
    pub file_size: u64,
}

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    /// Reads the file once and decodes both pixels and metadata from the
    /// same buffer.
    pub fn load(&self, path: &Path) -> Result<LoadedImage> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let bytes = std::fs::read(path)?;
        let image = self.decode(&bytes)?;
        let metadata = MetadataProcessor::new().table_from_bytes(&bytes, path);

        let (width, height) = image.dimensions();
        log::debug!(
            "Loaded image: {}x{} pixels, {} EXIF field(s)",
            width,
            height,
            metadata.len()
        );

        Ok(LoadedImage {
            image,
            metadata,
            file_size: bytes.len() as u64,
        })
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| SweepError::ProcessingError(format!("Failed to decode image: {}", e)))?;

        if let Some((max_w, max_h)) = self.max_dimensions {
            let (width, height) = image.dimensions();
            if width > max_w || height > max_h {
                return Err(SweepError::ProcessingError(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        Ok(image)
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(SweepError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let metadata = path.metadata()?;
        if metadata.len() == 0 {
            return Err(SweepError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
