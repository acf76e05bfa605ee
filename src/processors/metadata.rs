// photoprep/src/processors/metadata.rs
use crate::core::{Result, SweepError};
use exif::{Context, Exif, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// The tag whose presence marks a table as carrying a location. Removing it
/// drops the whole GPS IFD it points to.
pub const LOCATION_TAG: Tag = Tag::GPSInfoIFDPointer;

/// EXIF fields attached to one image, in the order they were read.
#[derive(Debug, Default)]
pub struct MetadataTable {
    fields: Vec<Field>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn from_exif(exif: &Exif) -> Self {
        Self {
            fields: exif.fields().map(copy_field).collect(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, tag: Tag, ifd_num: In) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.tag == tag && field.ifd_num == ifd_num)
    }

    pub fn has_location(&self) -> bool {
        self.fields.iter().any(is_location_field)
    }

    /// Removes the location tag and everything that lives under it. Every
    /// other field keeps its position and value.
    pub fn strip_location(mut self) -> Self {
        let before = self.fields.len();
        self.fields.retain(|field| !is_location_field(field));

        let removed = before - self.fields.len();
        if removed > 0 {
            log::debug!("Stripped {} location field(s)", removed);
        }
        self
    }

    /// Serializes the table as a TIFF structure suitable for an APP1 EXIF
    /// segment. Returns `None` when there is nothing to write.
    pub fn to_tiff_bytes(&self) -> Result<Option<Vec<u8>>> {
        let writable: Vec<&Field> = self
            .fields
            .iter()
            .filter(|field| {
                let ok = !matches!(field.value, Value::Unknown(..));
                if !ok {
                    log::debug!("Skipping unserializable EXIF field {}", field.tag);
                }
                ok
            })
            .collect();

        if writable.is_empty() {
            return Ok(None);
        }

        let mut writer = exif::experimental::Writer::new();
        for field in writable {
            writer.push_field(field);
        }

        let mut buffer = Cursor::new(Vec::new());
        writer.write(&mut buffer, false)?;

        Ok(Some(buffer.into_inner()))
    }
}

fn is_location_field(field: &Field) -> bool {
    field.tag == LOCATION_TAG || field.tag.context() == Context::Gps
}

fn copy_field(field: &Field) -> Field {
    Field {
        tag: field.tag,
        ifd_num: field.ifd_num,
        value: field.value.clone(),
    }
}

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);
        parse_exif(&mut bufreader, path)
    }

    /// Table for an already-loaded file. A damaged EXIF block cannot be
    /// carried over, so it yields an empty table instead of an error.
    pub fn table_from_bytes(&self, bytes: &[u8], path: &Path) -> MetadataTable {
        match parse_exif(&mut Cursor::new(bytes), path) {
            Ok(Some(exif)) => MetadataTable::from_exif(&exif),
            Ok(None) => MetadataTable::new(),
            Err(e) => {
                log::warn!("Dropping unreadable EXIF in {}: {}", path.display(), e);
                MetadataTable::new()
            }
        }
    }

    pub fn strip_metadata(&self, table: MetadataTable) -> MetadataTable {
        table.strip_location()
    }
}

fn parse_exif<R: std::io::BufRead + std::io::Seek>(
    reader: &mut R,
    path: &Path,
) -> Result<Option<Exif>> {
    match Reader::new().read_from_container(reader) {
        Ok(exif) => {
            log::debug!("Found EXIF data in {}", path.display());
            Ok(Some(exif))
        }
        Err(exif::Error::NotFound(_)) => {
            log::debug!("No EXIF data found in {}", path.display());
            Ok(None)
        }
        Err(e) => Err(SweepError::Exif(e)),
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ascii_field, gps_fields, sample_fields};

    fn snapshot(table: &MetadataTable) -> Vec<(Tag, In, String)> {
        table
            .fields()
            .iter()
            .map(|f| (f.tag, f.ifd_num, format!("{:?}", f.value)))
            .collect()
    }

    #[test]
    fn test_strip_removes_location_and_keeps_the_rest() {
        let table = MetadataTable::from_fields(sample_fields(Some("2024:03:05 09:05:00"), true));
        assert!(table.has_location());

        let expected: Vec<_> = snapshot(&table)
            .into_iter()
            .filter(|(tag, _, _)| tag.context() != Context::Gps && *tag != LOCATION_TAG)
            .collect();

        let stripped = table.strip_location();

        assert!(!stripped.has_location());
        assert_eq!(snapshot(&stripped), expected);
        assert!(stripped.get(Tag::Make, In::PRIMARY).is_some());
        assert!(stripped.get(Tag::DateTimeOriginal, In::PRIMARY).is_some());
    }

    #[test]
    fn test_strip_without_location_is_identity() {
        let table = MetadataTable::from_fields(sample_fields(Some("2024:03:05 09:05:00"), false));
        let before = snapshot(&table);

        let stripped = MetadataProcessor::new().strip_metadata(table);

        assert_eq!(snapshot(&stripped), before);
    }

    #[test]
    fn test_strip_empty_table() {
        let stripped = MetadataTable::new().strip_location();
        assert!(stripped.is_empty());
    }

    #[test]
    fn test_strip_removes_pointer_only_table() {
        let mut fields = vec![ascii_field(Tag::Make, "Canon")];
        fields.push(Field {
            tag: Tag::GPSInfoIFDPointer,
            ifd_num: In::PRIMARY,
            value: Value::Long(vec![1234]),
        });

        let stripped = MetadataTable::from_fields(fields).strip_location();

        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.fields()[0].tag, Tag::Make);
    }

    #[test]
    fn test_tiff_bytes_round_trip_through_reader() {
        let table = MetadataTable::from_fields(sample_fields(Some("2024:12:25 00:00:00"), true));
        let bytes = table.to_tiff_bytes().unwrap().unwrap();

        let exif = Reader::new().read_raw(bytes).unwrap();
        let reread = MetadataTable::from_exif(&exif);

        assert!(reread.has_location());
        assert!(reread.get(Tag::Model, In::PRIMARY).is_some());
        assert_eq!(
            reread
                .fields()
                .iter()
                .filter(|f| f.tag.context() == Context::Gps)
                .count(),
            gps_fields().len()
        );
    }

    #[test]
    fn test_empty_table_has_no_tiff_bytes() {
        assert!(MetadataTable::new().to_tiff_bytes().unwrap().is_none());
    }

    #[test]
    fn test_table_from_garbage_bytes_is_empty() {
        let table = MetadataProcessor::new().table_from_bytes(b"not an image", Path::new("x.jpg"));
        assert!(table.is_empty());
    }
}
