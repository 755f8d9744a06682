//! Registry of finished output files awaiting optional verification.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::checksum::{self, ChecksumError, ChecksumKind};
use crate::verify::{VerifyError, VerifyState};

/// Final artifact of one or more transfers. Unlike a progress entry it
/// survives slot recycling and is what the verification workflow walks.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedFile {
    pub display_name: String,
    pub path: PathBuf,
    pub kind: Option<ChecksumKind>,
    pub digest: Option<String>,
    pub expected_digest: Option<String>,
    pub computed: bool,
    pub verified: bool,
    pub state: VerifyState,
}

impl CompletedFile {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
            kind: None,
            digest: None,
            expected_digest: None,
            computed: false,
            verified: false,
            state: VerifyState::NotRequested,
        }
    }

    pub fn start_calculation(&mut self, kind: ChecksumKind) -> Result<(), VerifyError> {
        self.state = self.state.clone().begin()?;
        self.kind = Some(kind);
        Ok(())
    }

    /// Store the outcome of the digest computation.
    pub fn record_digest(&mut self, result: Result<String, ChecksumError>) -> Result<(), VerifyError> {
        match result {
            Ok(digest) => {
                self.state = self.state.clone().calculated()?;
                self.digest = Some(digest);
                self.computed = true;
            }
            Err(e) => {
                self.state = self.state.clone().failed(e.to_string())?;
                self.digest = None;
                self.computed = false;
            }
        }
        Ok(())
    }

    /// Compare against the user's expected value; empty input skips the comparison.
    pub fn resolve(&mut self, expected: &str) -> Result<(), VerifyError> {
        let expected = expected.trim();
        if expected.is_empty() {
            self.state = self.state.clone().skipped()?;
            return Ok(());
        }
        let matched = self
            .digest
            .as_deref()
            .map(|d| checksum::digests_match(d, expected))
            .unwrap_or(false);
        self.state = self.state.clone().compared(matched)?;
        self.expected_digest = Some(expected.to_string());
        self.verified = matched;
        Ok(())
    }
}

/// Completed files in registration order, deduplicated by path.
#[derive(Debug, Default)]
pub struct CompletedFiles {
    files: Vec<CompletedFile>,
}

impl CompletedFiles {
    /// Returns false (and changes nothing) if the path is already registered.
    pub fn register(&mut self, file: CompletedFile) -> bool {
        if self.contains(&file.path) {
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn to_vec(&self) -> Vec<CompletedFile> {
        self.files.clone()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}
