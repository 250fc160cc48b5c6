// Sources:
// - https://github.com/libyal/libscca/blob/main/documentation/Windows%20Prefetch%20File%20(PF)%20format.asciidoc
// - https://forensics.wiki/prefetch/

use byteorder::{ByteOrder, LittleEndian};
use log::{error, info};
use std::io::Read;

pub mod error;
pub mod filetime;
pub mod header;
pub mod offset;
pub mod records;
pub mod section;
pub mod strings;
pub mod v17;
pub mod volume;

pub use error::{PrefetchError, Result};
pub use v17::TraceArtifact;

/// Something able to turn a raw prefetch buffer into a `TraceArtifact`.
pub trait PrefetchDecoder {
    fn decode(&self, raw: &[u8]) -> Result<TraceArtifact>;
}

/// Prefetch format versions with a decoder, keyed by the header version field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Windows XP and Server 2003.
    WinXp,
}

impl FormatVersion {
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            v17::VERSION => Ok(FormatVersion::WinXp),
            other => Err(PrefetchError::UnsupportedVersion(other)),
        }
    }

    /// Read the version field at the start of `raw`.
    pub fn detect(raw: &[u8]) -> Result<Self> {
        if raw.len() < 4 {
            return Err(PrefetchError::Bounds {
                what: "format version",
                offset: 4,
                len: raw.len(),
            });
        }
        Self::from_version(LittleEndian::read_u32(&raw[0..4]))
    }

    pub fn number(&self) -> u32 {
        match self {
            FormatVersion::WinXp => v17::VERSION,
        }
    }
}

impl PrefetchDecoder for FormatVersion {
    fn decode(&self, raw: &[u8]) -> Result<TraceArtifact> {
        match self {
            FormatVersion::WinXp => v17::decode(raw),
        }
    }
}

/// Decode a prefetch buffer with the decoder matching its version field.
pub fn parse(raw: &[u8]) -> Result<TraceArtifact> {
    let version = FormatVersion::detect(raw).inspect_err(|e| error!("{}", e))?;
    info!("Prefetch format version {} ({:?}).", version.number(), version);
    version.decode(raw)
}

/// Read the whole stream, then decode it.
pub fn from_reader<R: Read>(mut body: R) -> Result<TraceArtifact> {
    let mut raw = Vec::new();
    body.read_to_end(&mut raw)?;
    parse(&raw)
}
