//! Hash calculation utilities.

use crate::core::error::{Error, Result};
use crate::core::types::HASH_UNAVAILABLE;
use md5::{Digest, Md5};
use sha2::Sha256;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for reading files (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Hash calculator for files.
pub struct HashCalculator;

impl HashCalculator {
    /// Calculate SHA256 hash of a whole file.
    pub fn sha256_file(path: &Path) -> Result<String> {
        Self::sha256_prefix(path, u64::MAX)
    }

    /// Calculate SHA256 over at most `limit` leading bytes of a file.
    pub fn sha256_prefix(path: &Path, limit: u64) -> Result<String> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file).take(limit);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| Error::file_read(path, e))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Fingerprint used in file records; degrades to the sentinel on I/O errors.
    pub fn fingerprint(path: &Path, limit: u64) -> String {
        match Self::sha256_prefix(path, limit) {
            Ok(hash) => hash,
            Err(e) => {
                log::trace!("Hash unavailable for {:?}: {}", path, e);
                HASH_UNAVAILABLE.to_string()
            }
        }
    }

    /// Calculate SHA256 hash of bytes.
    pub fn sha256_bytes(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Calculate MD5 hash of bytes.
    pub fn md5_bytes(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Stable identifier for a path, as used by front ends to address list rows.
    pub fn path_id(path: &Path) -> String {
        Self::md5_bytes(path.to_string_lossy().as_bytes())
    }

    /// Verify a file matches an expected SHA256 hash.
    pub fn verify_sha256(path: &Path, expected: &str) -> Result<bool> {
        let actual = Self::sha256_file(path)?;
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}
