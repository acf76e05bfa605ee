// photoprep/src/utils/mod.rs
use crate::core::{Result, SweepError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Regular files directly inside `folder` whose extension matches `extension`
/// case-insensitively, in file-name order.
pub fn list_files_with_extension(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            SweepError::ProcessingError(format!("Failed to list {}: {}", folder.display(), e))
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// File name without its last extension: `IMG_0001.jpg` -> `IMG_0001`.
pub fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_name_string(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SweepError::InvalidParameter(format!("Invalid file name: {}", path.display()))
        })
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}
