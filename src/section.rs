use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Seek, SeekFrom};

use crate::error::{PrefetchError, Result};
use crate::header::Header;
use crate::offset::RelativeOffset;

/// File information block following the header (68 bytes in version 17).
/// Every offset is relative to the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SectionTable {
    pub file_metrics_offset: i32, // 0x00
    pub file_metrics_count: i32,  // 0x04
    pub trace_chains_offset: i32, // 0x08
    pub trace_chains_count: i32,  // 0x0C
    pub filenames_offset: i32,    // 0x10
    pub filenames_size: i32,      // 0x14
    pub volumes_offset: i32,      // 0x18
    pub volume_count: i32,        // 0x1C
    pub volumes_size: i32,        // 0x20
    pub last_run_time: i64,       // 0x24
    pub run_count: i32,           // 0x3C
}

impl SectionTable {
    pub const OFFSET: usize = Header::SIZE;
    pub const SIZE: usize = 68;

    /// Parse the section table of a whole prefetch buffer.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let end = Self::OFFSET + Self::SIZE;
        if raw.len() < end {
            return Err(PrefetchError::Bounds {
                what: "section table",
                offset: end as i64,
                len: raw.len(),
            });
        }
        let mut c = Cursor::new(&raw[Self::OFFSET..end]);

        let file_metrics_offset = c.read_i32::<LittleEndian>()?;
        let file_metrics_count = c.read_i32::<LittleEndian>()?;
        let trace_chains_offset = c.read_i32::<LittleEndian>()?;
        let trace_chains_count = c.read_i32::<LittleEndian>()?;
        let filenames_offset = c.read_i32::<LittleEndian>()?;
        let filenames_size = c.read_i32::<LittleEndian>()?;
        let volumes_offset = c.read_i32::<LittleEndian>()?;
        let volume_count = c.read_i32::<LittleEndian>()?;
        let volumes_size = c.read_i32::<LittleEndian>()?;
        let last_run_time = c.read_i64::<LittleEndian>()?;
        c.seek(SeekFrom::Start(60))?;
        let run_count = c.read_i32::<LittleEndian>()?;

        Ok(Self {
            file_metrics_offset,
            file_metrics_count,
            trace_chains_offset,
            trace_chains_count,
            filenames_offset,
            filenames_size,
            volumes_offset,
            volume_count,
            volumes_size,
            last_run_time,
            run_count,
        })
    }

    pub fn file_metrics(&self) -> RelativeOffset {
        RelativeOffset::from_file(self.file_metrics_offset)
    }

    pub fn trace_chains(&self) -> RelativeOffset {
        RelativeOffset::from_file(self.trace_chains_offset)
    }

    pub fn filenames(&self) -> RelativeOffset {
        RelativeOffset::from_file(self.filenames_offset)
    }

    pub fn volumes(&self) -> RelativeOffset {
        RelativeOffset::from_file(self.volumes_offset)
    }
}
