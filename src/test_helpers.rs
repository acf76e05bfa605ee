//! Fixture builders shared by unit tests.

use crate::processors::{Compressor, MetadataProcessor, MetadataTable};
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;

pub fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

pub fn gps_fields() -> Vec<Field> {
    vec![
        Field {
            tag: Tag::GPSVersionID,
            ifd_num: In::PRIMARY,
            value: Value::Byte(vec![2, 3, 0, 0]),
        },
        ascii_field(Tag::GPSLatitudeRef, "N"),
        Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![
                Rational { num: 52, denom: 1 },
                Rational { num: 22, denom: 1 },
                Rational { num: 1234, denom: 100 },
            ]),
        },
        ascii_field(Tag::GPSLongitudeRef, "E"),
        Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![
                Rational { num: 4, denom: 1 },
                Rational { num: 53, denom: 1 },
                Rational { num: 4200, denom: 100 },
            ]),
        },
    ]
}

/// Camera fields, an optional capture date, and optionally a GPS block.
pub fn sample_fields(date_time_original: Option<&str>, with_gps: bool) -> Vec<Field> {
    let mut fields = vec![
        ascii_field(Tag::Make, "Canon"),
        ascii_field(Tag::Model, "Canon EOS 5D Mark III"),
    ];

    if let Some(date) = date_time_original {
        fields.push(ascii_field(Tag::DateTimeOriginal, date));
    }

    if with_gps {
        fields.extend(gps_fields());
    }

    fields
}

pub fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn write_jpeg(path: &Path, width: u32, height: u32, fields: Vec<Field>) {
    let table = MetadataTable::from_fields(fields);
    Compressor::new(90)
        .save(&gradient(width, height), &table, path)
        .unwrap();
}

pub fn read_table(path: &Path) -> MetadataTable {
    MetadataProcessor::new()
        .read_metadata(path)
        .unwrap()
        .map(|exif| MetadataTable::from_exif(&exif))
        .unwrap_or_default()
}
