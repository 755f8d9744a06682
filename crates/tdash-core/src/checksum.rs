//! Checksum computation for finished transfers (MD5 and SHA-256).
//!
//! Digests are computed on demand, never inline with the transfer path, and
//! always outside the dashboard lock.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const BUF_SIZE: usize = 64 * 1024;

/// Digest algorithm. MD5 is kept for legacy mirrors that only publish MD5 sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    Md5,
    Sha256,
}

impl ChecksumKind {
    pub fn label(self) -> &'static str {
        match self {
            ChecksumKind::Md5 => "MD5",
            ChecksumKind::Sha256 => "SHA256",
        }
    }

    /// Length of the lowercase hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            ChecksumKind::Md5 => 32,
            ChecksumKind::Sha256 => 64,
        }
    }

    /// Guess the kind from a hex digest's length.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(ChecksumKind::Md5),
            64 => Some(ChecksumKind::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChecksumKind {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(ChecksumKind::Md5),
            "sha256" | "sha-256" => Ok(ChecksumKind::Sha256),
            other => Err(ChecksumError::UnsupportedKind(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("unsupported checksum kind: {0}")]
    UnsupportedKind(String),
    #[error("open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Pluggable hash primitive. The dashboard and the verification workflow only
/// see this trait, so tests can substitute failing or canned digesters.
pub trait Digester: Send + Sync {
    fn digest(&self, kind: ChecksumKind, path: &Path) -> Result<String, ChecksumError>;
}

/// Streams files from disk through the selected hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDigester;

impl Digester for FileDigester {
    fn digest(&self, kind: ChecksumKind, path: &Path) -> Result<String, ChecksumError> {
        digest_path(kind, path)
    }
}

/// Compute the digest of a file and return it as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn digest_path(kind: ChecksumKind, path: &Path) -> Result<String, ChecksumError> {
    match kind {
        ChecksumKind::Md5 => hash_file::<Md5>(path),
        ChecksumKind::Sha256 => hash_file::<Sha256>(path),
    }
}

fn hash_file<D: Digest>(path: &Path) -> Result<String, ChecksumError> {
    let mut f = File::open(path).map_err(|source| ChecksumError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = D::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(|source| ChecksumError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Case-insensitive digest comparison; surrounding whitespace is ignored.
pub fn digests_match(computed: &str, expected: &str) -> bool {
    computed.trim().eq_ignore_ascii_case(expected.trim())
}
