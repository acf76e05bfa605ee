// photoprep/src/processors/compressor.rs
use super::metadata::MetadataTable;
use crate::core::{Result, SweepError};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::path::Path;

/// JPEG encoder that carries an explicit EXIF table into its output.
pub struct Compressor {
    quality: u8,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Writes `image` to `path`, returning the number of bytes written.
    pub fn save(&self, image: &DynamicImage, metadata: &MetadataTable, path: &Path) -> Result<u64> {
        log::debug!(
            "Saving image to {} with quality {} and {} EXIF field(s)",
            path.display(),
            self.quality,
            metadata.len()
        );

        let bytes = self.compress_to_bytes(image, metadata)?;
        std::fs::write(path, &bytes)?;

        let file_size = bytes.len() as u64;
        log::debug!("Saved image: {} ({} bytes)", path.display(), file_size);
        Ok(file_size)
    }

    pub fn compress_to_bytes(&self, image: &DynamicImage, metadata: &MetadataTable) -> Result<Vec<u8>> {
        let mut jpeg_bytes = Vec::new();
        let rgb = image.to_rgb8();
        JpegEncoder::new_with_quality(&mut jpeg_bytes, self.quality).encode_image(&rgb)?;

        match metadata.to_tiff_bytes()? {
            Some(tiff) => embed_exif(jpeg_bytes, tiff),
            None => Ok(jpeg_bytes),
        }
    }
}

fn embed_exif(jpeg_bytes: Vec<u8>, tiff: Vec<u8>) -> Result<Vec<u8>> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(jpeg_bytes))
        .map_err(|e| SweepError::Container(format!("Failed to parse encoded JPEG: {}", e)))?;

    jpeg.set_exif(Some(Bytes::from(tiff)));

    let mut output = Vec::new();
    jpeg.encoder().write_to(&mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient, read_table, sample_fields};
    use exif::{In, Tag};
    use tempfile::TempDir;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(Compressor::new(0).quality(), 1);
        assert_eq!(Compressor::new(200).quality(), 100);
        assert_eq!(Compressor::new(50).quality(), 50);
    }

    #[test]
    fn test_output_is_decodable_jpeg() {
        let bytes = Compressor::new(60)
            .compress_to_bytes(&gradient(32, 16), &MetadataTable::new())
            .unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_metadata_is_embedded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tagged.jpg");
        let table = MetadataTable::from_fields(sample_fields(Some("2024:03:05 09:05:00"), false));

        let written = Compressor::new(80).save(&gradient(8, 8), &table, &path).unwrap();

        assert_eq!(written, std::fs::metadata(&path).unwrap().len());
        let reread = read_table(&path);
        assert!(reread.get(Tag::Make, In::PRIMARY).is_some());
        assert!(reread.get(Tag::DateTimeOriginal, In::PRIMARY).is_some());
    }

    #[test]
    fn test_rgba_input_is_flattened() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        assert!(Compressor::new(75)
            .compress_to_bytes(&rgba, &MetadataTable::new())
            .is_ok());
    }
}
