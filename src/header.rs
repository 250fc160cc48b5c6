// Sources:
// - https://github.com/libyal/libscca/blob/main/documentation/Windows%20Prefetch%20File%20(PF)%20format.asciidoc

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{Cursor, Read};

use crate::error::{PrefetchError, Result};
use crate::strings::utf16_le;

/// File header shared by every uncompressed prefetch version (84 bytes).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Header {
    pub version: u32,            // 0x00
    pub signature: [u8; 4],      // 0x04 "SCCA"
    pub unknown1: u32,           // 0x08
    pub file_size: u32,          // 0x0C
    pub executable_name: String, // 0x10, 60 bytes UTF-16
    pub hash: u32,               // 0x4C
    pub unknown2: u32,           // 0x50
}

impl Header {
    pub const SIZE: usize = 84;
    pub const SIGNATURE: [u8; 4] = *b"SCCA";

    /// Parse the first 84 bytes of a prefetch file.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(PrefetchError::Bounds {
                what: "file header",
                offset: Self::SIZE as i64,
                len: buf.len(),
            });
        }
        let mut c = Cursor::new(&buf[..Self::SIZE]);

        let version = c.read_u32::<LittleEndian>()?;
        let mut signature = [0u8; 4];
        c.read_exact(&mut signature)?;
        if signature != Self::SIGNATURE {
            return Err(PrefetchError::InvalidSignature(signature));
        }
        let unknown1 = c.read_u32::<LittleEndian>()?;
        let file_size = c.read_u32::<LittleEndian>()?;

        let mut name_raw = [0u8; 60];
        c.read_exact(&mut name_raw)?;
        let executable_name = utf16_le(&name_raw, "executable name", 0x10)?
            .split('\0')
            .next()
            .unwrap_or_default()
            .to_string();

        let hash = c.read_u32::<LittleEndian>()?;
        let unknown2 = c.read_u32::<LittleEndian>()?;

        Ok(Self {
            version,
            signature,
            unknown1,
            file_size,
            executable_name,
            hash,
            unknown2,
        })
    }

    pub fn hash_hex(&self) -> String {
        format!("{:08X}", self.hash)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "version": self.version,
            "signature": String::from_utf8_lossy(&self.signature),
            "file_size": self.file_size,
            "executable_name": self.executable_name,
            "hash": self.hash_hex(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(sig: &[u8; 4]) -> Vec<u8> {
        let mut buf = vec![0u8; Header::SIZE];
        buf[0..4].copy_from_slice(&17u32.to_le_bytes());
        buf[4..8].copy_from_slice(sig);
        buf[12..16].copy_from_slice(&4096u32.to_le_bytes());
        let name: Vec<u8> = "NOTEPAD.EXE"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        buf[16..16 + name.len()].copy_from_slice(&name);
        buf[76..80].copy_from_slice(&0x0A1B2C3Du32.to_le_bytes());
        buf
    }

    #[test]
    fn parses_header() {
        let h = Header::from_bytes(&header_bytes(b"SCCA")).unwrap();
        assert_eq!(h.version, 17);
        assert_eq!(h.file_size, 4096);
        assert_eq!(h.executable_name, "NOTEPAD.EXE");
        assert_eq!(h.hash_hex(), "0A1B2C3D");
    }

    #[test]
    fn rejects_bad_signature() {
        assert!(matches!(
            Header::from_bytes(&header_bytes(b"MAM\x04")),
            Err(PrefetchError::InvalidSignature(_))
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Header::from_bytes(&[0u8; 40]),
            Err(PrefetchError::Bounds { len: 40, .. })
        ));
    }
}
