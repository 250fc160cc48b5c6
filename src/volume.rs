// Sources:
// - https://github.com/libyal/libscca/blob/main/documentation/Windows%20Prefetch%20File%20(PF)%20format.asciidoc

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{PrefetchError, Result};
use crate::filetime::{filetime_to_datetime, filetime_to_rfc3339};
use crate::offset::{Base, RelativeOffset, clamp, non_negative};
use crate::records::{FixedRecord, MftReference, Records};
use crate::strings::{decode_length_prefixed, utf16_le};

/// Volume information entry (40 bytes in version 17).
///
/// Every offset in here is relative to the start of the volume information
/// section, not to the descriptor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct VolumeDescriptor {
    pub device_name_offset: i32,  // 0x00
    pub device_name_chars: i32,   // 0x04
    pub creation_time: i64,       // 0x08
    pub serial_number: u32,       // 0x10
    pub file_refs_offset: i32,    // 0x14
    pub file_refs_size: i32,      // 0x18
    pub dir_strings_offset: i32,  // 0x1C
    pub dir_strings_count: i32,   // 0x20
}

impl FixedRecord for VolumeDescriptor {
    const WIDTH: usize = 40;

    fn from_bytes(raw: &[u8]) -> Self {
        Self {
            device_name_offset: LittleEndian::read_i32(&raw[0..4]),
            device_name_chars: LittleEndian::read_i32(&raw[4..8]),
            creation_time: LittleEndian::read_i64(&raw[8..16]),
            serial_number: LittleEndian::read_u32(&raw[16..20]),
            file_refs_offset: LittleEndian::read_i32(&raw[20..24]),
            file_refs_size: LittleEndian::read_i32(&raw[24..28]),
            dir_strings_offset: LittleEndian::read_i32(&raw[28..32]),
            dir_strings_count: LittleEndian::read_i32(&raw[32..36]),
        }
    }
}

impl VolumeDescriptor {
    pub fn device_name(&self, volumes_at: usize) -> RelativeOffset {
        RelativeOffset::new(Base::VolumeTable(volumes_at), self.device_name_offset)
    }

    pub fn file_refs(&self, volumes_at: usize) -> RelativeOffset {
        RelativeOffset::new(Base::VolumeTable(volumes_at), self.file_refs_offset)
    }

    pub fn dir_strings(&self, volumes_at: usize) -> RelativeOffset {
        RelativeOffset::new(Base::VolumeTable(volumes_at), self.dir_strings_offset)
    }
}

/// File references (MFT entries) table of one volume.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileReferences {
    pub version: u32,
    pub declared_count: u32,
    pub entries: Vec<MftReference>,
}

impl FileReferences {
    const HEADER_SIZE: i32 = 8;

    /// Decode the table at `at`, whose declared byte size is `size`.
    ///
    /// At most `declared_count` entries are read and never more than fit in
    /// the table (clamped to the buffer end).
    pub fn decode(raw: &[u8], at: RelativeOffset, size: usize) -> Result<Self> {
        let start = at.resolve(raw.len(), "file reference table")?;
        let table = clamp(raw, start, size);
        if table.len() < Self::HEADER_SIZE as usize {
            return Err(PrefetchError::InconsistentCount {
                what: "file reference table",
                count: size as i64,
                available: table.len(),
            });
        }
        let version = LittleEndian::read_u32(&table[0..4]);
        let declared_count = LittleEndian::read_u32(&table[4..8]);

        let entries_at = RelativeOffset::new(Base::FileReferenceTable(start), Self::HEADER_SIZE)
            .resolve(raw.len(), "file reference entries")?;
        let region = &raw[entries_at..start + table.len()];
        let entries: Vec<MftReference> =
            Records::<MftReference>::new(region, declared_count as usize).collect();

        if entries.len() < declared_count as usize {
            warn!(
                "File reference table at 0x{:X} declares {} entries, only {} fit.",
                start,
                declared_count,
                entries.len()
            );
        }

        Ok(Self {
            version,
            declared_count,
            entries,
        })
    }
}

/// A volume referenced by the executable during its recorded run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Volume {
    pub device_name_offset: i32,
    pub device_name_chars: i32,
    pub creation_time_raw: i64,
    pub creation_time: Option<DateTime<Utc>>,
    pub serial_number: String,
    pub device_name: String,
    pub file_references: FileReferences,
    pub directory_names: Vec<String>,
}

impl Volume {
    /// Decode the volume described by `desc`. `volumes_at` is the absolute
    /// start of the volume information section.
    pub fn decode(raw: &[u8], volumes_at: usize, desc: &VolumeDescriptor) -> Result<Self> {
        let name_at = desc.device_name(volumes_at).resolve(raw.len(), "device name")?;
        let name_len = non_negative("device name length", desc.device_name_chars);
        let device_name = utf16_le(
            clamp(raw, name_at, name_len.saturating_mul(2)),
            "device name",
            name_at,
        )?;

        let refs_size = non_negative("file reference table size", desc.file_refs_size);
        let file_references = FileReferences::decode(raw, desc.file_refs(volumes_at), refs_size)?;

        let dirs_at = desc
            .dir_strings(volumes_at)
            .resolve(raw.len(), "directory strings")?;
        let dirs_count = non_negative("directory strings", desc.dir_strings_count);
        let (directory_names, _) = decode_length_prefixed(raw, dirs_at, dirs_count)?;

        Ok(Self {
            device_name_offset: desc.device_name_offset,
            device_name_chars: desc.device_name_chars,
            creation_time_raw: desc.creation_time,
            creation_time: filetime_to_datetime(desc.creation_time),
            serial_number: format!("{:X}", desc.serial_number),
            device_name,
            file_references,
            directory_names,
        })
    }

    pub fn to_string(&self) -> String {
        let mut t = Table::new();
        t.add_row(row!["Volume", self.device_name]);
        t.add_row(row![b -> "Serial Number", self.serial_number]);
        t.add_row(row![b -> "Created", filetime_to_rfc3339(self.creation_time_raw)]);
        t.add_row(row![b -> "File References", self.file_references.entries.len()]);
        t.add_row(row![b -> "Directories", self.directory_names.len()]);
        for name in &self.directory_names {
            t.add_row(row!["", name]);
        }
        t.to_string()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "device_name": self.device_name,
            "device_name_offset": self.device_name_offset,
            "serial_number": self.serial_number,
            "creation_time": self.creation_time,
            "creation_time_raw": self.creation_time_raw,
            "file_references_version": self.file_references.version,
            "file_references": self.file_references.entries.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
            "directory_names": self.directory_names,
        })
    }
}

/// Decode `count` volume descriptors at `volumes_at` and everything they
/// point to, in descriptor order.
pub fn decode_volumes(
    raw: &[u8],
    volumes_at: usize,
    volumes_size: usize,
    count: usize,
) -> Result<Vec<Volume>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let region = clamp(raw, volumes_at, volumes_size);
    if count.saturating_mul(VolumeDescriptor::WIDTH) > region.len() {
        return Err(PrefetchError::InconsistentCount {
            what: "volume descriptors",
            count: count as i64,
            available: region.len(),
        });
    }

    Records::<VolumeDescriptor>::new(region, count)
        .enumerate()
        .map(|(i, desc)| {
            debug!("Decoding volume #{} ({:?}).", i, desc);
            Volume::decode(raw, volumes_at, &desc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_i32(buf: &mut [u8], at: usize, v: i32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn descriptor_layout() {
        let mut raw = [0u8; 40];
        put_i32(&mut raw, 0, 0x68);
        put_i32(&mut raw, 4, 22);
        raw[8..16].copy_from_slice(&0x01C4_0000_0000_0000i64.to_le_bytes());
        raw[16..20].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        put_i32(&mut raw, 20, 0x98);
        put_i32(&mut raw, 24, 24);
        put_i32(&mut raw, 28, 0xB0);
        put_i32(&mut raw, 32, 3);

        let d = VolumeDescriptor::from_bytes(&raw);
        assert_eq!(d.device_name_offset, 0x68);
        assert_eq!(d.device_name_chars, 22);
        assert_eq!(d.creation_time, 0x01C4_0000_0000_0000);
        assert_eq!(d.serial_number, 0xDEAD_BEEF);
        assert_eq!(d.file_refs_offset, 0x98);
        assert_eq!(d.file_refs_size, 24);
        assert_eq!(d.dir_strings_offset, 0xB0);
        assert_eq!(d.dir_strings_count, 3);
        assert_eq!(d.device_name(0x200).resolve(0x400, "x").unwrap(), 0x268);
    }

    #[test]
    fn header_only_file_reference_table() {
        let mut raw = vec![0u8; 32];
        put_i32(&mut raw, 16, 1);
        put_i32(&mut raw, 20, 0);
        let refs = FileReferences::decode(&raw, RelativeOffset::from_file(16), 8).unwrap();
        assert_eq!(refs.version, 1);
        assert!(refs.entries.is_empty());
    }

    #[test]
    fn corrupt_declared_count_yields_what_fits() {
        let mut raw = vec![0u8; 8 + 3 * 8];
        put_i32(&mut raw, 0, 1);
        put_i32(&mut raw, 4, 1000);
        raw[8..16].copy_from_slice(&5u64.to_le_bytes());
        let refs = FileReferences::decode(&raw, RelativeOffset::from_file(0), 1000 * 8).unwrap();
        assert_eq!(refs.declared_count, 1000);
        assert_eq!(refs.entries.len(), 3);
        assert_eq!(refs.entries[0].entry(), 5);
    }

    #[test]
    fn declared_count_limits_entries() {
        let mut raw = vec![0u8; 8 + 4 * 8];
        put_i32(&mut raw, 4, 2);
        let refs = FileReferences::decode(&raw, RelativeOffset::from_file(0), raw.len()).unwrap();
        assert_eq!(refs.entries.len(), 2);
    }

    #[test]
    fn table_smaller_than_its_header_is_rejected() {
        let raw = vec![0u8; 16];
        assert!(matches!(
            FileReferences::decode(&raw, RelativeOffset::from_file(12), 8),
            Err(PrefetchError::InconsistentCount { available: 4, .. })
        ));
    }

    #[test]
    fn volume_count_larger_than_section() {
        let raw = vec![0u8; 200];
        assert!(matches!(
            decode_volumes(&raw, 100, 40, 2),
            Err(PrefetchError::InconsistentCount { count: 2, available: 40, .. })
        ));
    }

    #[test]
    fn no_volumes() {
        assert!(decode_volumes(&[], 0, 0, 0).unwrap().is_empty());
    }
}
