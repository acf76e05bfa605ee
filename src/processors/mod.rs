// photoprep/src/processors/mod.rs
mod backup;
mod batch;
mod catalog;
mod compressor;
mod dates;
mod loader;
mod metadata;
mod raw;
mod resizer;

pub use backup::{BackupOutcome, BackupStripper};
pub use batch::{BatchProcessor, Transform};
pub use catalog::{
    manifest_to_json, read_manifest, write_manifest, CatalogBuilder, CatalogOutcome, Manifest,
    ManifestEntry,
};
pub use compressor::Compressor;
pub use dates::{
    parse_exif_datetime, DateFormatter, DateResolver, DateSource, DateStyle, ResolvedDate,
};
pub use loader::{LoadedImage, Loader};
pub use metadata::{MetadataProcessor, MetadataTable, LOCATION_TAG};
pub use raw::{RawConverter, RawDecoder, SensorDecoder};
pub use resizer::{scaled_dimensions, Resizer};

pub mod prelude {
    pub use super::{
        BackupStripper, BatchProcessor, CatalogBuilder, Compressor, Loader, MetadataProcessor,
        RawConverter, Resizer,
    };
}
