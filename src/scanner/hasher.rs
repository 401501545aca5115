//! Comparison keys: byte size, prefix digest and whole-file digest.
//!
//! Each extractor is a plain function of a path. Keys from different
//! extractors are never compared with each other; the pipeline runs one
//! extractor per stage.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::scanner::{full_digest_key, size_key, HashAlgorithm};
//! use std::path::Path;
//!
//! let path = Path::new("photo.jpg");
//! let size = size_key(path)?;
//! let digest = full_digest_key(path, HashAlgorithm::Blake3)?;
//! println!("{size} bytes, {digest}");
//! # Ok::<(), dupsift::scanner::AccessError>(())
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::AccessError;

/// Prefix length used when the filesystem does not report a block size.
pub const PARTIAL_FALLBACK_SIZE: u64 = 4096;

/// Read buffer for whole-file hashing.
pub const FULL_CHUNK_SIZE: usize = 64 * 1024;

/// Digest function used by both digest stages.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase name used in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 256-bit content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write as _;
        self.0.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Incremental state for either algorithm.
enum Engine {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl Engine {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(data);
            }
            Self::Sha256(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Blake3(hasher) => Digest(*hasher.finalize().as_bytes()),
            Self::Sha256(hasher) => Digest(hasher.finalize().into()),
        }
    }
}

/// Byte length of the file at `path`.
///
/// # Errors
///
/// Returns an [`AccessError`] if the file is unreadable or has vanished.
pub fn size_key(path: &Path) -> Result<u64, AccessError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| AccessError::from_io(path, e))
}

/// Digest of the first filesystem block of the file.
///
/// Only a pre-filter: files sharing a prefix are re-checked by
/// [`full_digest_key`].
///
/// # Errors
///
/// Returns an [`AccessError`] if the file cannot be opened or read.
pub fn partial_digest_key(path: &Path, algorithm: HashAlgorithm) -> Result<Digest, AccessError> {
    let file = File::open(path).map_err(|e| AccessError::from_io(path, e))?;
    let prefix_len = file
        .metadata()
        .map(|meta| block_size(&meta))
        .unwrap_or(PARTIAL_FALLBACK_SIZE);

    let mut buffer = Vec::with_capacity(usize::try_from(prefix_len).unwrap_or(4096));
    file.take(prefix_len)
        .read_to_end(&mut buffer)
        .map_err(|e| AccessError::from_io(path, e))?;

    let mut engine = Engine::new(algorithm);
    engine.update(&buffer);
    Ok(engine.finalize())
}

/// Digest of the whole file, read in [`FULL_CHUNK_SIZE`] chunks.
///
/// # Errors
///
/// Returns an [`AccessError`] if the file cannot be opened or a read fails.
pub fn full_digest_key(path: &Path, algorithm: HashAlgorithm) -> Result<Digest, AccessError> {
    let mut file = File::open(path).map_err(|e| AccessError::from_io(path, e))?;
    let mut engine = Engine::new(algorithm);
    let mut buffer = vec![0u8; FULL_CHUNK_SIZE];

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AccessError::from_io(path, e)),
        };
        engine.update(&buffer[..read]);
    }

    Ok(engine.finalize())
}

#[cfg(unix)]
fn block_size(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    match meta.blksize() {
        0 => PARTIAL_FALLBACK_SIZE,
        size => size,
    }
}

#[cfg(not(unix))]
fn block_size(_meta: &fs::Metadata) -> u64 {
    PARTIAL_FALLBACK_SIZE
}
