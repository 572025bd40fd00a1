//! Adler-32 checksums and their sidecar encoding.
//!
//! Every document on disk is paired with a `.hash` file holding the Adler-32
//! of the document's exact bytes as four little-endian bytes. A document is
//! trusted only if the recomputed checksum equals the stored one.

use std::path::Path;

use crate::error::{KvsError, Result};
use crate::logging::{error, trace};

/// Size of an encoded checksum sidecar.
pub const CHECKSUM_LEN: usize = 4;

/// Adler-32 of a complete buffer.
pub fn adler32(bytes: &[u8]) -> u32 {
    let mut hasher = adler2::Adler32::new();
    hasher.write_slice(bytes);
    hasher.checksum()
}

/// Encode a checksum into its sidecar representation.
pub fn encode(checksum: u32) -> [u8; CHECKSUM_LEN] {
    checksum.to_le_bytes()
}

/// Decode a sidecar. Returns `None` unless the buffer is exactly four bytes.
pub fn decode(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; CHECKSUM_LEN] = bytes.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// Check `content` (read from `path`) against a sidecar's raw bytes.
pub fn verify(path: &Path, content: &[u8], sidecar: &[u8]) -> Result<()> {
    let stored = decode(sidecar).ok_or_else(|| KvsError::MalformedChecksum {
        path: path.to_path_buf(),
        len: sidecar.len(),
    })?;
    let computed = adler32(content);
    trace!(path = %path.display(), stored, computed, "verifying checksum");

    if stored != computed {
        error!(path = %path.display(), stored, computed, "checksum mismatch");
        return Err(KvsError::Corruption {
            path: path.to_path_buf(),
            stored,
            computed,
        });
    }
    Ok(())
}
