// photoprep/src/processors/batch.rs
use super::compressor::Compressor;
use super::loader::Loader;
use super::metadata::MetadataProcessor;
use super::resizer::Resizer;
use crate::core::{validate_percent, validate_quality, ProcessingStats, Result, SweepConfig};
use crate::utils::{file_name_string, list_files_with_extension};
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use std::path::{Path, PathBuf};

/// One transform applied to every standard-format image, written to the
/// output folder under the same file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Compress { quality: u8 },
    Resize { percent: u8 },
}

pub struct BatchProcessor {
    folder: PathBuf,
    output_dir: PathBuf,
    extension: String,
    default_quality: u8,
    loader: Loader,
    metadata: MetadataProcessor,
    resizer: Resizer,
}

impl BatchProcessor {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            output_dir: config.output_dir(),
            extension: config.standard_extension.clone(),
            default_quality: config.default_quality,
            loader: Loader::new(),
            metadata: MetadataProcessor::new(),
            resizer: Resizer::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compress(&self, quality: u8) -> Result<ProcessingStats> {
        validate_quality(quality)?;
        self.process_directory(Transform::Compress { quality })
    }

    pub fn resize(&self, percent: u8) -> Result<ProcessingStats> {
        validate_percent(percent)?;
        self.process_directory(Transform::Resize { percent })
    }

    fn process_directory(&self, transform: Transform) -> Result<ProcessingStats> {
        let image_paths = list_files_with_extension(&self.folder, &self.extension)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let mut stats = ProcessingStats::default();
        if image_paths.is_empty() {
            log::warn!("No image files found in {}", self.folder.display());
            return Ok(stats);
        }

        log::info!(
            "Applying {:?} to {} image(s) from {}",
            transform,
            image_paths.len(),
            self.folder.display()
        );

        let compressor = match transform {
            Transform::Compress { quality } => Compressor::new(quality),
            Transform::Resize { .. } => Compressor::new(self.default_quality),
        };

        let pb = create_progress_bar(image_paths.len());
        for input_path in image_paths.iter().progress_with(pb.clone()) {
            match self.process_single_image(input_path, transform, &compressor) {
                Ok((before, after)) => {
                    stats.processed_count += 1;
                    stats.total_size_before += before;
                    stats.total_size_after += after;
                }
                Err(e) => stats.record_failure(input_path, &e),
            }
        }

        pb.finish_with_message(format!(
            "Processed {} images ({:.1}% size reduction)",
            stats.processed_count,
            stats.savings_percent()
        ));

        Ok(stats)
    }

    fn process_single_image(
        &self,
        input_path: &Path,
        transform: Transform,
        compressor: &Compressor,
    ) -> Result<(u64, u64)> {
        let output_path = self.output_dir.join(file_name_string(input_path)?);

        let loaded = self.loader.load(input_path)?;
        let metadata = self.metadata.strip_metadata(loaded.metadata);

        let image: DynamicImage = match transform {
            Transform::Compress { .. } => loaded.image,
            Transform::Resize { percent } => self.resizer.resize_percent(&loaded.image, percent),
        };

        let written = compressor.save(&image, &metadata, &output_path)?;
        Ok((loaded.file_size, written))
    }
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Action;
    use crate::test_helpers::{read_table, sample_fields, write_jpeg};
    use exif::{In, Tag};
    use tempfile::TempDir;

    fn batch(dir: &Path) -> BatchProcessor {
        BatchProcessor::new(&SweepConfig::new(dir, Action::Info))
    }

    #[test]
    fn test_compress_writes_stripped_copies_to_thumbs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_jpeg(&root.join("a.jpg"), 64, 32, sample_fields(Some("2024:03:05 09:05:00"), true));
        write_jpeg(&root.join("b.jpg"), 16, 16, sample_fields(None, false));

        let stats = batch(root).compress(50).unwrap();

        assert_eq!(stats.processed_count, 2);
        assert!(stats.total_size_before > 0);
        for name in ["a.jpg", "b.jpg"] {
            let out = root.join("thumbs").join(name);
            assert!(image::open(&out).is_ok());
            assert!(!read_table(&out).has_location());
        }
        assert!(read_table(&root.join("thumbs/a.jpg"))
            .get(Tag::DateTimeOriginal, In::PRIMARY)
            .is_some());
        // the working copy is left alone
        assert!(read_table(&root.join("a.jpg")).has_location());
    }

    #[test]
    fn test_resize_halves_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_jpeg(&root.join("wide.jpg"), 200, 100, sample_fields(None, true));

        let stats = batch(root).resize(50).unwrap();

        assert_eq!(stats.processed_count, 1);
        let out = root.join("thumbs/wide.jpg");
        assert_eq!(image::image_dimensions(&out).unwrap(), (100, 50));
        assert!(!read_table(&out).has_location());
    }

    #[test]
    fn test_existing_output_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_jpeg(&root.join("a.jpg"), 40, 40, Vec::new());
        std::fs::create_dir(root.join("thumbs")).unwrap();
        std::fs::write(root.join("thumbs/a.jpg"), b"stale").unwrap();

        batch(root).resize(25).unwrap();

        assert_eq!(image::image_dimensions(root.join("thumbs/a.jpg")).unwrap(), (10, 10));
    }

    #[test]
    fn test_out_of_range_parameters_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(batch(temp_dir.path()).compress(96).is_err());
        assert!(batch(temp_dir.path()).resize(0).is_err());
        assert!(!temp_dir.path().join("thumbs").exists());
    }

    #[test]
    fn test_unreadable_image_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("bad.jpg"), b"nope").unwrap();
        write_jpeg(&root.join("good.jpg"), 8, 8, Vec::new());

        let stats = batch(root).compress(80).unwrap();

        assert_eq!(stats.processed_count, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(root.join("thumbs/good.jpg").exists());
    }
}
