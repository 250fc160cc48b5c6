use thiserror::Error;

/// Errors raised while decoding a prefetch artefact.
#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A computed absolute offset is negative or lies past the end of the buffer.
    #[error("{what} at offset {offset} is outside the buffer ({len} bytes)")]
    Bounds {
        what: &'static str,
        offset: i64,
        len: usize,
    },

    /// A declared count or size cannot be satisfied by its region.
    #[error("{what}: declared count {count} does not fit in {available} bytes")]
    InconsistentCount {
        what: &'static str,
        count: i64,
        available: usize,
    },

    /// A UTF-16 region holds an unpaired surrogate.
    #[error("{what} at offset {offset} is not valid UTF-16")]
    Encoding { what: &'static str, offset: usize },

    #[error("invalid prefetch signature {0:?}, expected \"SCCA\"")]
    InvalidSignature([u8; 4]),

    #[error("unsupported prefetch format version {0}")]
    UnsupportedVersion(u32),
}

pub type Result<T> = std::result::Result<T, PrefetchError>;

