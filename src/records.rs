// Sources:
// - https://github.com/libyal/libscca/blob/main/documentation/Windows%20Prefetch%20File%20(PF)%20format.asciidoc

//! Fixed-width records of the version 17 prefetch format.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::marker::PhantomData;

/// A record with a fixed on-disk width.
///
/// `from_bytes` is total: it is only ever handed exactly `WIDTH` bytes and
/// every bit pattern is a valid record.
pub trait FixedRecord: Sized {
    const WIDTH: usize;

    fn from_bytes(raw: &[u8]) -> Self;
}

/// Lazy sequence of fixed-width records over a byte region.
///
/// Stops after `count` records or when fewer than `R::WIDTH` bytes remain,
/// whichever comes first. Trailing bytes are never decoded. Cloning the
/// iterator restarts from the same cursor.
#[derive(Debug)]
pub struct Records<'a, R> {
    data: &'a [u8],
    remaining: usize,
    _record: PhantomData<R>,
}

impl<R> Clone for Records<'_, R> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            remaining: self.remaining,
            _record: PhantomData,
        }
    }
}

impl<'a, R: FixedRecord> Records<'a, R> {
    pub fn new(data: &'a [u8], count: usize) -> Self {
        Self {
            data,
            remaining: count,
            _record: PhantomData,
        }
    }

    /// Bytes the iterator has not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        self.data
    }
}

impl<R: FixedRecord> Iterator for Records<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        if self.remaining == 0 || self.data.len() < R::WIDTH {
            return None;
        }
        let (head, tail) = self.data.split_at(R::WIDTH);
        self.data = tail;
        self.remaining -= 1;
        Some(R::from_bytes(head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.min(self.data.len() / R::WIDTH);
        (n, Some(n))
    }
}

/// One file metrics array entry (20 bytes in version 17).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileMetric {
    pub raw: [u8; 20],
}

impl FileMetric {
    /// Index of the first trace chain entry for this file.
    pub fn start_index(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[0..4])
    }

    /// Number of trace chain entries.
    pub fn duration(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[4..8])
    }

    /// Offset of the file name, relative to the filename strings section.
    pub fn filename_offset(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[8..12])
    }

    /// Length of the file name in UTF-16 characters, without the NUL.
    pub fn filename_chars(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[12..16])
    }

    pub fn flags(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[16..20])
    }

    pub fn to_json(&self) -> Value {
        json!({
            "start_index": self.start_index(),
            "duration": self.duration(),
            "filename_offset": self.filename_offset(),
            "filename_chars": self.filename_chars(),
            "flags": self.flags(),
        })
    }
}

impl FixedRecord for FileMetric {
    const WIDTH: usize = 20;

    fn from_bytes(raw: &[u8]) -> Self {
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&raw[..Self::WIDTH]);
        Self { raw: buf }
    }
}

/// One trace chain array entry (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TraceChain {
    pub raw: [u8; 12],
}

impl TraceChain {
    /// Index of the next entry in the chain, `0xFFFFFFFF` ends it.
    pub fn next_index(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[0..4])
    }

    pub fn block_load_count(&self) -> u32 {
        LittleEndian::read_u32(&self.raw[4..8])
    }

    pub fn is_last(&self) -> bool {
        self.next_index() == u32::MAX
    }

    pub fn to_json(&self) -> Value {
        json!({
            "next_index": self.next_index(),
            "block_load_count": self.block_load_count(),
        })
    }
}

impl FixedRecord for TraceChain {
    const WIDTH: usize = 12;

    fn from_bytes(raw: &[u8]) -> Self {
        let mut buf = [0u8; 12];
        buf.copy_from_slice(&raw[..Self::WIDTH]);
        Self { raw: buf }
    }
}

/// NTFS file reference: 48-bit MFT entry number + 16-bit sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct MftReference {
    pub raw: [u8; 8],
}

impl MftReference {
    pub fn value(&self) -> u64 {
        LittleEndian::read_u64(&self.raw)
    }

    pub fn entry(&self) -> u64 {
        self.value() & 0x0000_FFFF_FFFF_FFFF
    }

    pub fn sequence(&self) -> u16 {
        ((self.value() >> 48) & 0xFFFF) as u16
    }

    pub fn to_json(&self) -> Value {
        json!({ "entry": self.entry(), "sequence": self.sequence() })
    }
}

impl FixedRecord for MftReference {
    const WIDTH: usize = 8;

    fn from_bytes(raw: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&raw[..Self::WIDTH]);
        Self { raw: buf }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_metric_fields() {
        let mut raw = [0u8; 20];
        raw[0..4].copy_from_slice(&3u32.to_le_bytes());
        raw[4..8].copy_from_slice(&7u32.to_le_bytes());
        raw[8..12].copy_from_slice(&0x40u32.to_le_bytes());
        raw[12..16].copy_from_slice(&12u32.to_le_bytes());
        raw[16..20].copy_from_slice(&0x200u32.to_le_bytes());

        let m = FileMetric::from_bytes(&raw);
        assert_eq!(m.raw, raw);
        assert_eq!(m.start_index(), 3);
        assert_eq!(m.duration(), 7);
        assert_eq!(m.filename_offset(), 0x40);
        assert_eq!(m.filename_chars(), 12);
        assert_eq!(m.flags(), 0x200);
    }

    #[test]
    fn mft_reference_splits_entry_and_sequence() {
        let value: u64 = (0x0005u64 << 48) | 0x1234;
        let r = MftReference::from_bytes(&value.to_le_bytes());
        assert_eq!(r.entry(), 0x1234);
        assert_eq!(r.sequence(), 5);
    }

    #[test]
    fn records_stop_at_count() {
        let data = [0xAAu8; 12 * 4];
        let chains: Vec<TraceChain> = Records::<TraceChain>::new(&data, 2).collect();
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn records_drop_trailing_partial_record() {
        let data = [0u8; 12 * 2 + 5];
        let mut it = Records::<TraceChain>::new(&data, 10);
        assert_eq!(it.size_hint(), (2, Some(2)));
        assert!(it.next().is_some());
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert_eq!(it.rest().len(), 5);
    }

    #[test]
    fn records_are_restartable() {
        let mut data = Vec::new();
        for i in 0u32..3 {
            let mut e = [0u8; 12];
            e[0..4].copy_from_slice(&i.to_le_bytes());
            data.extend_from_slice(&e);
        }
        let it = Records::<TraceChain>::new(&data, 3);
        let first: Vec<u32> = it.clone().map(|c| c.next_index()).collect();
        let second: Vec<u32> = it.map(|c| c.next_index()).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }
}
