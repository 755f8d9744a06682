//! Checksum command: compute the digest of a file.

use anyhow::Result;
use std::path::Path;
use tdash_core::checksum::{self, ChecksumKind};

/// Compute and print the digest of the given file, `sha256sum` style.
pub fn run_checksum(path: &Path, kind: ChecksumKind) -> Result<()> {
    let digest = checksum::digest_path(kind, path)?;
    tracing::debug!(path = %path.display(), %kind, "checksum computed");
    println!("{}  {}", digest, path.display());
    Ok(())
}
