//! Post-transfer checksum verification.
//!
//! Walks the completed files one by one: ask which digest to compute, compute
//! it, ask for the expected value, compare. A failed computation or a mismatch
//! is recorded and the walk moves on; only the user can stop it early.

mod prompt;
mod state;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::checksum::{ChecksumKind, Digester};
use crate::dashboard::CompletedFile;

pub use prompt::{KindChoice, Prompter, TerminalPrompter};
pub use state::{VerifyError, VerifyState};

/// Counts over processed files. Calculation failures and mismatches both count as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub verified: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl VerifySummary {
    pub fn from_files(files: &[CompletedFile]) -> Self {
        let mut summary = Self::default();
        for file in files {
            match file.state {
                VerifyState::Verified => summary.verified += 1,
                VerifyState::Failed(_) | VerifyState::Mismatch => summary.failed += 1,
                VerifyState::Skipped => summary.skipped += 1,
                VerifyState::NotRequested | VerifyState::Calculating | VerifyState::Calculated => {}
            }
        }
        summary
    }
}

impl fmt::Display for VerifySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verified: {}, failed: {}, skipped: {}",
            self.verified, self.failed, self.skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// The user said no before any file was touched.
    Declined,
    /// Stopped at a prompt; files after that point were left alone.
    Aborted,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    pub status: WorkflowStatus,
    pub summary: VerifySummary,
    pub files: Vec<CompletedFile>,
}

impl WorkflowOutcome {
    fn new(status: WorkflowStatus, files: Vec<CompletedFile>) -> Self {
        Self {
            status,
            summary: VerifySummary::from_files(&files),
            files,
        }
    }

    /// Write the outcome as pretty JSON (creates the parent dir if needed).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize verification report")?;
        std::fs::write(path, json)
            .with_context(|| format!("write verification report: {}", path.display()))?;
        Ok(())
    }
}

/// Drive the workflow over `files`. Files that arrive with an expected digest
/// are compared against it without asking.
pub fn run_workflow(
    mut files: Vec<CompletedFile>,
    prompter: &mut dyn Prompter,
    digester: &dyn Digester,
) -> Result<WorkflowOutcome> {
    if files.is_empty() {
        return Ok(WorkflowOutcome::new(WorkflowStatus::Completed, files));
    }
    if prompter.confirm_start(files.len())? != Some(true) {
        tracing::info!("checksum verification declined");
        return Ok(WorkflowOutcome::new(WorkflowStatus::Declined, files));
    }

    let total = files.len();
    for index in 0..total {
        let kind = match prompter.choose_kind(&files[index], index, total)? {
            KindChoice::Kind(kind) => kind,
            KindChoice::Abort => {
                tracing::info!(index, "checksum verification aborted at kind selection");
                return Ok(WorkflowOutcome::new(WorkflowStatus::Aborted, files));
            }
        };

        let file = &mut files[index];
        if !verify_file(file, kind, prompter, digester)? {
            tracing::info!(index, "checksum verification aborted at expected digest");
            return Ok(WorkflowOutcome::new(WorkflowStatus::Aborted, files));
        }
        prompter.report(file)?;
    }

    let outcome = WorkflowOutcome::new(WorkflowStatus::Completed, files);
    tracing::info!(summary = %outcome.summary, "checksum verification finished");
    prompter.summary(&outcome.summary)?;
    Ok(outcome)
}

/// Returns false if the user cancelled the expected-digest prompt.
fn verify_file(
    file: &mut CompletedFile,
    kind: ChecksumKind,
    prompter: &mut dyn Prompter,
    digester: &dyn Digester,
) -> Result<bool> {
    file.start_calculation(kind)?;
    prompter.calculating(file, kind)?;
    let result = digester.digest(kind, &file.path);
    if let Err(e) = &result {
        tracing::warn!(path = %file.path.display(), %kind, "checksum failed: {}", e);
    }
    file.record_digest(result)?;
    if !file.computed {
        return Ok(true);
    }

    let expected = match file.expected_digest.clone() {
        Some(expected) => expected,
        None => match prompter.expected_digest(file)? {
            Some(input) => input,
            None => return Ok(false),
        },
    };
    file.resolve(&expected)?;
    Ok(true)
}
