// photoprep/src/core/mod.rs
pub mod processor;

use crate::processors::DateStyle;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RAW_EXTENSION: &str = "cr2";
pub const STANDARD_EXTENSION: &str = "jpg";
pub const BACKUP_DIR_NAME: &str = "Original";
pub const OUTPUT_DIR_NAME: &str = "thumbs";
pub const MANIFEST_FILE_NAME: &str = "info.json";
pub const DEFAULT_QUALITY: u8 = 75;

pub const MAX_COMPRESS_QUALITY: u8 = 95;
pub const MAX_RESIZE_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Compress { quality: u8 },
    Resize { percent: u8 },
    Info,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Compress { .. } => "compress",
            Action::Resize { .. } => "resize",
            Action::Info => "info",
        }
    }
}

/// Everything a run needs, resolved up front so no step touches a prompt or
/// probes the platform on its own.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub folder: PathBuf,
    pub action: Action,
    pub date_style: DateStyle,
    pub raw_extension: String,
    pub standard_extension: String,
    pub backup_dir_name: String,
    pub output_dir_name: String,
    pub manifest_name: String,
    pub default_quality: u8,
}

impl SweepConfig {
    pub fn new(folder: impl Into<PathBuf>, action: Action) -> Self {
        Self {
            folder: folder.into(),
            action,
            date_style: DateStyle::Auto,
            raw_extension: RAW_EXTENSION.to_string(),
            standard_extension: STANDARD_EXTENSION.to_string(),
            backup_dir_name: BACKUP_DIR_NAME.to_string(),
            output_dir_name: OUTPUT_DIR_NAME.to_string(),
            manifest_name: MANIFEST_FILE_NAME.to_string(),
            default_quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_date_style(mut self, style: DateStyle) -> Self {
        self.date_style = style;
        self
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.folder.join(&self.backup_dir_name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.folder.join(&self.output_dir_name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.folder.join(&self.manifest_name)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.folder.exists() {
            return Err(SweepError::InvalidParameter(format!(
                "Folder does not exist: {}",
                self.folder.display()
            )));
        }

        if !self.folder.is_dir() {
            return Err(SweepError::InvalidParameter(format!(
                "Not a directory: {}",
                self.folder.display()
            )));
        }

        match self.action {
            Action::Compress { quality } => validate_quality(quality)?,
            Action::Resize { percent } => validate_percent(percent)?,
            Action::Info => {}
        }

        if self.default_quality == 0 || self.default_quality > 100 {
            return Err(SweepError::InvalidParameter(
                "Default quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

pub fn validate_quality(quality: u8) -> Result<()> {
    if quality == 0 || quality > MAX_COMPRESS_QUALITY {
        return Err(SweepError::InvalidParameter(format!(
            "Quality must be between 1 and {}, got {}",
            MAX_COMPRESS_QUALITY, quality
        )));
    }
    Ok(())
}

pub fn validate_percent(percent: u8) -> Result<()> {
    if percent == 0 || percent > MAX_RESIZE_PERCENT {
        return Err(SweepError::InvalidParameter(format!(
            "Resize percent must be between 1 and {}, got {}",
            MAX_RESIZE_PERCENT, percent
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub processed_count: usize,
    pub skipped_count: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub errors: Vec<FileFailure>,
}

impl ProcessingStats {
    pub fn record_failure(&mut self, path: &Path, error: &SweepError) {
        log::warn!("Failed to process {}: {}", path.display(), error);
        self.errors.push(FileFailure {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Percentage of bytes saved, clamped to 0..=100.
    pub fn savings_percent(&self) -> f64 {
        if self.total_size_before == 0 {
            return 0.0;
        }

        let savings = (self.total_size_before as f64 - self.total_size_after as f64)
            / self.total_size_before as f64
            * 100.0;
        savings.clamp(0.0, 100.0)
    }
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("JPEG container error: {0}")]
    Container(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Raw decode error: {0}")]
    RawDecode(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

pub type Result<T> = std::result::Result<T, SweepError>;
