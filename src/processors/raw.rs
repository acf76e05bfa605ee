// photoprep/src/processors/raw.rs
//! Camera raw conversion.
//!
//! Raw files are developed from sensor data: black/white level
//! normalisation, as-shot white balance, a 2x2 CFA block demosaic at full
//! resolution, then sRGB gamma. Files rawloader cannot read fall back to the
//! largest JPEG preview the camera embedded in the container.

use super::compressor::Compressor;
use super::metadata::MetadataTable;
use crate::core::{ProcessingStats, Result, SweepConfig, SweepError};
use crate::utils::{file_title, list_files_with_extension};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

/// Turns a raw file into pixels.
pub trait RawDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;
}

pub struct SensorDecoder;

impl SensorDecoder {
    pub fn new() -> Self {
        Self
    }

    fn decode_sensor(&self, path: &Path) -> Result<DynamicImage> {
        let loader = rawloader::RawLoader::new();
        let raw = loader
            .decode_file(path)
            .map_err(|e| SweepError::RawDecode(format!("{:?}", e)))?;

        log::debug!(
            "Decoded sensor data from {} ({} {}, {}x{}, cpp {})",
            path.display(),
            raw.clean_make,
            raw.clean_model,
            raw.width,
            raw.height,
            raw.cpp
        );

        develop(&raw).map(DynamicImage::ImageRgb8)
    }

    fn decode_embedded_preview(&self, path: &Path) -> Result<DynamicImage> {
        let data = std::fs::read(path)?;
        largest_embedded_jpeg(&data).ok_or_else(|| {
            SweepError::RawDecode(format!("No usable preview in {}", path.display()))
        })
    }
}

impl Default for SensorDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RawDecoder for SensorDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        match self.decode_sensor(path) {
            Ok(image) => Ok(image),
            Err(sensor_error) => {
                log::debug!(
                    "Sensor decode failed for {} ({}), trying embedded preview",
                    path.display(),
                    sensor_error
                );
                self.decode_embedded_preview(path).map_err(|_| sensor_error)
            }
        }
    }
}

/// Per-colour black level and usable range of the sensor.
struct Levels {
    black: [f32; 4],
    range: [f32; 4],
}

impl Levels {
    fn new(raw: &rawloader::RawImage) -> Self {
        let mut black = [0.0; 4];
        let mut range = [1.0; 4];
        for i in 0..4 {
            black[i] = f32::from(raw.blacklevels[i]);
            range[i] = (f32::from(raw.whitelevels[i]) - black[i]).max(1.0);
        }
        Self { black, range }
    }

    fn normalize(&self, value: f32, color: usize) -> f32 {
        let color = color.min(3);
        ((value - self.black[color]) / self.range[color]).clamp(0.0, 1.0)
    }
}

fn develop(raw: &rawloader::RawImage) -> Result<RgbImage> {
    let [top, right, bottom, left] = raw.crops;
    let width = raw.width.saturating_sub(left + right);
    let height = raw.height.saturating_sub(top + bottom);

    if width < 2 || height < 2 {
        return Err(SweepError::RawDecode(format!(
            "Unusable sensor area {}x{}",
            width, height
        )));
    }

    let sample = |row: usize, col: usize, channel: usize| -> f32 {
        let index = (row * raw.width + col) * raw.cpp + channel;
        match &raw.data {
            rawloader::RawImageData::Integer(values) => {
                values.get(index).copied().map(f32::from).unwrap_or(0.0)
            }
            rawloader::RawImageData::Float(values) => values.get(index).copied().unwrap_or(0.0),
        }
    };

    let levels = match &raw.data {
        rawloader::RawImageData::Integer(_) => Levels::new(raw),
        rawloader::RawImageData::Float(_) => Levels {
            black: [0.0; 4],
            range: [1.0; 4],
        },
    };

    let mut pixels = vec![0u8; width * height * 3];
    let mut put = |x: usize, y: usize, rgb: [f32; 3]| {
        let offset = (y * width + x) * 3;
        for (channel, value) in rgb.iter().enumerate() {
            pixels[offset + channel] = encode_srgb(*value);
        }
    };

    match raw.cpp {
        1 => {
            let wb = white_balance(&raw.wb_coeffs);
            for by in (0..height).step_by(2) {
                for bx in (0..width).step_by(2) {
                    let mut sums = [0.0f32; 3];
                    let mut counts = [0u32; 3];

                    for dy in 0..2 {
                        for dx in 0..2 {
                            let (y, x) = ((by + dy).min(height - 1), (bx + dx).min(width - 1));
                            let (row, col) = (y + top, x + left);
                            let color = raw.cfa.color_at(row, col);
                            let slot = if color == 3 { 1 } else { color.min(2) };
                            sums[slot] += levels.normalize(sample(row, col, 0), color);
                            counts[slot] += 1;
                        }
                    }

                    let mut rgb = [0.0f32; 3];
                    for c in 0..3 {
                        let mean = if counts[c] > 0 {
                            sums[c] / counts[c] as f32
                        } else {
                            sums[1] / counts[1].max(1) as f32
                        };
                        rgb[c] = (mean * wb[c]).clamp(0.0, 1.0);
                    }

                    for dy in 0..2 {
                        for dx in 0..2 {
                            let (y, x) = (by + dy, bx + dx);
                            if y < height && x < width {
                                put(x, y, rgb);
                            }
                        }
                    }
                }
            }
        }
        3 => {
            for y in 0..height {
                for x in 0..width {
                    let (row, col) = (y + top, x + left);
                    let rgb = [0, 1, 2].map(|c| levels.normalize(sample(row, col, c), c));
                    put(x, y, rgb);
                }
            }
        }
        other => {
            return Err(SweepError::RawDecode(format!(
                "Unsupported component count {}",
                other
            )));
        }
    }

    RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| SweepError::RawDecode("Pixel buffer size mismatch".to_string()))
}

/// As-shot multipliers normalised so green is 1.0.
fn white_balance(coeffs: &[f32; 4]) -> [f32; 3] {
    let usable = |v: f32| v.is_finite() && v > 0.0;
    if !coeffs[..3].iter().all(|v| usable(*v)) {
        return [1.0; 3];
    }
    let green = coeffs[1];
    [coeffs[0] / green, 1.0, coeffs[2] / green]
}

fn encode_srgb(linear: f32) -> u8 {
    let v = if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Largest decodable JPEG stream found inside `data`.
fn largest_embedded_jpeg(data: &[u8]) -> Option<DynamicImage> {
    const SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
    const EOI: [u8; 2] = [0xFF, 0xD9];

    let mut candidates = Vec::new();
    for (i, window) in data.windows(3).enumerate() {
        if window != SOI {
            continue;
        }
        if let Some(end_offset) = data[i..].windows(2).position(|w| w == EOI) {
            candidates.push(&data[i..i + end_offset + 2]);
        }
    }

    candidates.sort_by(|a, b| b.len().cmp(&a.len()));
    candidates
        .into_iter()
        .find_map(|candidate| image::load_from_memory_with_format(candidate, ImageFormat::Jpeg).ok())
}

/// Creates a standard-format sibling for every raw file that lacks one.
pub struct RawConverter {
    folder: PathBuf,
    raw_extension: String,
    standard_extension: String,
    decoder: Box<dyn RawDecoder>,
    compressor: Compressor,
}

impl RawConverter {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            raw_extension: config.raw_extension.clone(),
            standard_extension: config.standard_extension.clone(),
            decoder: Box::new(SensorDecoder::new()),
            compressor: Compressor::new(config.default_quality),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn RawDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Converts every raw file without a sibling. A file that fails to
    /// decode is recorded and the rest are still converted.
    pub fn convert_missing(&self) -> Result<ProcessingStats> {
        let raw_files = list_files_with_extension(&self.folder, &self.raw_extension)?;
        let mut stats = ProcessingStats::default();

        if raw_files.is_empty() {
            return Ok(stats);
        }

        let mut existing: Vec<String> = list_files_with_extension(&self.folder, &self.standard_extension)?
            .iter()
            .map(|path| file_title(path))
            .collect();

        for raw_path in raw_files {
            let title = file_title(&raw_path);
            if existing.contains(&title) {
                log::debug!("{} already has a converted sibling", raw_path.display());
                stats.skipped_count += 1;
                continue;
            }

            let target = self
                .folder
                .join(format!("{}.{}", title, self.standard_extension));

            match self.convert_one(&raw_path, &target) {
                Ok(()) => {
                    log::info!("Converted {} -> {}", raw_path.display(), target.display());
                    stats.processed_count += 1;
                    existing.push(title);
                }
                Err(e) => stats.record_failure(&raw_path, &e),
            }
        }

        Ok(stats)
    }

    fn convert_one(&self, raw_path: &Path, target: &Path) -> Result<()> {
        let image = self.decoder.decode(raw_path)?;
        self.compressor.save(&image, &MetadataTable::new(), target)?;
        Ok(())
    }
}
