//! Offsets read from a prefetch file are relative, and the base they are
//! relative to changes with the section being decoded. Every offset is
//! carried together with its base so that resolving it is explicit.

use log::warn;

use crate::error::{PrefetchError, Result};

/// The origin an offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// Start of the whole buffer (section table entries).
    File,
    /// Start of the volume information section (`volumes_offset`), used by
    /// every offset stored inside a volume descriptor.
    VolumeTable(usize),
    /// Start of one volume's file-reference table.
    FileReferenceTable(usize),
}

impl Base {
    /// Absolute position of the base inside the buffer.
    pub fn origin(&self) -> usize {
        match *self {
            Base::File => 0,
            Base::VolumeTable(start) | Base::FileReferenceTable(start) => start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeOffset {
    pub base: Base,
    pub value: i32,
}

impl RelativeOffset {
    pub fn new(base: Base, value: i32) -> Self {
        Self { base, value }
    }

    pub fn from_file(value: i32) -> Self {
        Self::new(Base::File, value)
    }

    /// Resolve to an absolute buffer position.
    ///
    /// The result may equal `buf_len` (an empty region at the very end);
    /// anything negative or further out is a `Bounds` error.
    pub fn resolve(&self, buf_len: usize, what: &'static str) -> Result<usize> {
        let absolute = self.base.origin() as i64 + i64::from(self.value);
        if absolute < 0 || absolute > buf_len as i64 {
            return Err(PrefetchError::Bounds {
                what,
                offset: absolute,
                len: buf_len,
            });
        }
        Ok(absolute as usize)
    }
}

/// Slice `len` bytes at `start`, clamped to the end of `raw`.
pub(crate) fn clamp(raw: &[u8], start: usize, len: usize) -> &[u8] {
    let start = start.min(raw.len());
    let end = start.saturating_add(len).min(raw.len());
    &raw[start..end]
}

/// Convert a signed count or size read from the artefact into a length.
/// Negative values describe an empty region.
pub(crate) fn non_negative(what: &'static str, value: i32) -> usize {
    usize::try_from(value).unwrap_or_else(|_| {
        warn!("{} is negative ({}), treating it as empty.", what, value);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_base_is_absolute() {
        assert_eq!(RelativeOffset::from_file(152).resolve(200, "x").unwrap(), 152);
    }

    #[test]
    fn volume_base_shifts_the_origin() {
        let off = RelativeOffset::new(Base::VolumeTable(100), 40);
        assert_eq!(off.resolve(200, "device name").unwrap(), 140);
    }

    #[test]
    fn end_of_buffer_is_allowed() {
        assert_eq!(RelativeOffset::from_file(64).resolve(64, "x").unwrap(), 64);
    }

    #[test]
    fn negative_and_past_end_are_rejected() {
        let neg = RelativeOffset::new(Base::VolumeTable(10), -11).resolve(64, "neg");
        assert!(matches!(neg, Err(PrefetchError::Bounds { offset: -1, .. })));

        let past = RelativeOffset::new(Base::FileReferenceTable(60), 5).resolve(64, "past");
        assert!(matches!(past, Err(PrefetchError::Bounds { offset: 65, len: 64, .. })));
    }

    #[test]
    fn clamp_never_runs_past_the_buffer() {
        let raw = [1u8, 2, 3, 4];
        assert_eq!(clamp(&raw, 2, 10), &[3u8, 4]);
        assert_eq!(clamp(&raw, 9, 1), &[] as &[u8]);
        assert_eq!(clamp(&raw, 1, usize::MAX), &[2u8, 3, 4]);
    }

    #[test]
    fn negative_counts_are_empty() {
        assert_eq!(non_negative("count", -1), 0);
        assert_eq!(non_negative("count", i32::MIN), 0);
        assert_eq!(non_negative("count", 7), 7);
    }
}
