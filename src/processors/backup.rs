// photoprep/src/processors/backup.rs
use super::compressor::Compressor;
use super::loader::Loader;
use super::metadata::MetadataProcessor;
use crate::core::{ProcessingStats, Result, SweepConfig, SweepError};
use crate::utils::{file_name_string, list_files_with_extension};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum BackupOutcome {
    /// The backup folder was already there; nothing was touched.
    AlreadyBackedUp,
    Completed(ProcessingStats),
}

impl BackupOutcome {
    pub fn stats(&self) -> Option<&ProcessingStats> {
        match self {
            BackupOutcome::AlreadyBackedUp => None,
            BackupOutcome::Completed(stats) => Some(stats),
        }
    }
}

/// Moves every standard-format image into the backup folder and writes a
/// location-free copy back in its place. Runs at most once per folder: the
/// existence of the backup folder is the only state.
pub struct BackupStripper {
    folder: PathBuf,
    backup_dir: PathBuf,
    extension: String,
    loader: Loader,
    metadata: MetadataProcessor,
    compressor: Compressor,
}

impl BackupStripper {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            backup_dir: config.backup_dir(),
            extension: config.standard_extension.clone(),
            loader: Loader::new(),
            metadata: MetadataProcessor::new(),
            compressor: Compressor::new(config.default_quality),
        }
    }

    pub fn is_backed_up(&self) -> bool {
        self.backup_dir.exists()
    }

    pub fn run(&self) -> Result<BackupOutcome> {
        if self.is_backed_up() {
            log::info!(
                "{} already exists in {}, skipping backup",
                self.backup_dir.display(),
                self.folder.display()
            );
            return Ok(BackupOutcome::AlreadyBackedUp);
        }

        let images = list_files_with_extension(&self.folder, &self.extension)?;
        std::fs::create_dir_all(&self.backup_dir)?;

        log::info!(
            "Backing up {} image(s) to {}",
            images.len(),
            self.backup_dir.display()
        );

        let mut stats = ProcessingStats::default();
        for image_path in images {
            match self.backup_one(&image_path) {
                Ok(()) => stats.processed_count += 1,
                Err(e) => stats.record_failure(&image_path, &e),
            }
        }

        Ok(BackupOutcome::Completed(stats))
    }

    fn backup_one(&self, image_path: &Path) -> Result<()> {
        let backup_path = self.backup_dir.join(file_name_string(image_path)?);
        if backup_path.exists() {
            return Err(SweepError::ProcessingError(format!(
                "Backup already holds {}",
                backup_path.display()
            )));
        }

        std::fs::rename(image_path, &backup_path)?;

        let loaded = self.loader.load(&backup_path)?;
        let stripped = self.metadata.strip_metadata(loaded.metadata);
        self.compressor.save(&loaded.image, &stripped, image_path)?;

        log::debug!(
            "Stripped {} (original kept at {})",
            image_path.display(),
            backup_path.display()
        );
        Ok(())
    }
}
