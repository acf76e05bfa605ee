pub mod cli;
mod core;
mod processors;
mod utils;

#[cfg(test)]
mod test_helpers;

pub use crate::cli::{prompt_in_range, Cli, Commands};
pub use crate::core::processor::{ActionReport, FolderProcessor, RunReport};
pub use crate::core::{
    validate_percent, validate_quality, Action, FileFailure, ProcessingStats, Result,
    SweepConfig, SweepError, BACKUP_DIR_NAME, DEFAULT_QUALITY, MANIFEST_FILE_NAME,
    OUTPUT_DIR_NAME, RAW_EXTENSION, STANDARD_EXTENSION,
};
pub use crate::processors::{
    manifest_to_json, parse_exif_datetime, read_manifest, scaled_dimensions, write_manifest,
    BackupOutcome, BackupStripper, BatchProcessor, CatalogBuilder, CatalogOutcome, Compressor,
    DateFormatter, DateResolver, DateSource, DateStyle, LoadedImage, Loader, Manifest,
    ManifestEntry, MetadataProcessor, MetadataTable, RawConverter, RawDecoder, Resizer,
    ResolvedDate, SensorDecoder, Transform, LOCATION_TAG,
};
pub use crate::utils::{file_title, format_file_size, has_extension, list_files_with_extension};

pub mod prelude {
    pub use crate::processors::prelude::*;
    pub use crate::{Action, FolderProcessor, SweepConfig};
}

// Re-export commonly used types
pub use image::DynamicImage;
