// photoprep/src/processors/catalog.rs
use super::dates::{DateFormatter, DateResolver};
use super::raw::RawConverter;
use crate::core::{ProcessingStats, Result, SweepConfig};
use crate::utils::{file_name_string, file_title, list_files_with_extension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub title: String,
    pub date: String,
}

/// File name -> entry, kept sorted so the written manifest is stable.
pub type Manifest = BTreeMap<String, ManifestEntry>;

#[derive(Debug)]
pub struct CatalogOutcome {
    pub raw_conversion: ProcessingStats,
    pub entries: ProcessingStats,
    pub manifest: Manifest,
}

pub struct CatalogBuilder {
    folder: PathBuf,
    manifest_path: PathBuf,
    extension: String,
    resolver: DateResolver,
}

impl CatalogBuilder {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            manifest_path: config.manifest_path(),
            extension: config.standard_extension.clone(),
            resolver: DateResolver::new(DateFormatter::select(config.date_style)),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Converts pending raw files, then rewrites the manifest from scratch.
    pub fn build(&self, raw_converter: &RawConverter) -> Result<CatalogOutcome> {
        let raw_conversion = raw_converter.convert_missing()?;

        let mut entries = ProcessingStats::default();
        let mut manifest = Manifest::new();

        for image_path in list_files_with_extension(&self.folder, &self.extension)? {
            match file_name_string(&image_path) {
                Ok(name) => {
                    let entry = ManifestEntry {
                        title: file_title(&image_path),
                        date: self.resolver.resolve_formatted(&image_path),
                    };
                    manifest.insert(name, entry);
                    entries.processed_count += 1;
                }
                Err(e) => entries.record_failure(&image_path, &e),
            }
        }

        write_manifest(&manifest, &self.manifest_path)?;
        log::info!(
            "{} created with {} entries",
            self.manifest_path.display(),
            manifest.len()
        );

        Ok(CatalogOutcome {
            raw_conversion,
            entries,
            manifest,
        })
    }
}

/// Pretty JSON with four-space indentation.
pub fn manifest_to_json(manifest: &Manifest) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    manifest.serialize(&mut serializer)?;

    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    std::fs::write(path, manifest_to_json(manifest)?)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
