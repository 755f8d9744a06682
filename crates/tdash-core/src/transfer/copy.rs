//! Single-file copy reported through the dashboard.
//!
//! Data goes to `<dest>.part` first and is renamed into place only after the
//! last byte is synced, so a cancelled copy never leaves a truncated file
//! under the final name.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::checksum::ChecksumKind;
use crate::dashboard::{Dashboard, EntryHandle, Flow};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

#[derive(Debug, Clone)]
pub struct CopyJob {
    pub source: PathBuf,
    pub dest_dir: PathBuf,
    pub checksum: Option<ChecksumKind>,
    /// Digest supplied up front; compared on finish and reused by verification.
    pub expected: Option<String>,
}

impl CopyJob {
    /// Where the copy lands: `dest_dir` joined with the source's file name.
    pub fn destination(&self) -> Option<PathBuf> {
        self.source.file_name().map(|name| self.dest_dir.join(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Completed(PathBuf),
    Cancelled,
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Copy one file, updating its dashboard entry per chunk.
pub fn copy_file(dashboard: &Dashboard, job: &CopyJob, buffer_bytes: usize) -> Result<CopyOutcome> {
    let file_name = job
        .source
        .file_name()
        .with_context(|| format!("source has no file name: {}", job.source.display()))?
        .to_os_string();
    let display_name = file_name.to_string_lossy().into_owned();
    let final_path = job.dest_dir.join(&file_name);
    let part_path = temp_path(&final_path);

    let mut src = File::open(&job.source)
        .with_context(|| format!("open source: {}", job.source.display()))?;
    let total = src
        .metadata()
        .with_context(|| format!("stat source: {}", job.source.display()))?
        .len();
    let dst = File::create(&part_path)
        .with_context(|| format!("failed to create temp file: {}", part_path.display()))?;

    let handle = dashboard.create_with_checksum(
        &display_name,
        Some(&final_path),
        0,
        total,
        job.checksum,
        job.expected.as_deref(),
    );
    tracing::info!(src = %job.source.display(), dest = %final_path.display(), total, "copy started");

    let flow = match pump(dashboard, handle, &mut src, dst, &part_path, buffer_bytes) {
        Ok(flow) => flow,
        Err(e) => {
            let _ = std::fs::remove_file(&part_path);
            dashboard.stop(handle, "Failed");
            return Err(e).with_context(|| format!("copy {}", job.source.display()));
        }
    };
    if flow == Flow::Cancelled {
        let _ = std::fs::remove_file(&part_path);
        dashboard.stop(handle, "Cancelled");
        tracing::info!(src = %job.source.display(), "copy cancelled");
        return Ok(CopyOutcome::Cancelled);
    }
    if let Err(e) = std::fs::rename(&part_path, &final_path) {
        let _ = std::fs::remove_file(&part_path);
        dashboard.stop(handle, "Failed");
        return Err(e).with_context(|| {
            format!(
                "failed to rename {} to {}",
                part_path.display(),
                final_path.display()
            )
        });
    }

    if job.checksum.is_some() {
        dashboard.finish_with_checksum(handle);
    } else {
        dashboard.finish(handle);
    }
    dashboard.register_completed_file_expecting(&display_name, &final_path, job.expected.as_deref());
    tracing::info!(dest = %final_path.display(), "copy finished");
    Ok(CopyOutcome::Completed(final_path))
}

/// Move bytes until EOF or cancellation, reporting each chunk. The temp file
/// is synced and closed before returning `Continue`.
fn pump(
    dashboard: &Dashboard,
    handle: EntryHandle,
    src: &mut File,
    mut dst: File,
    part_path: &Path,
    buffer_bytes: usize,
) -> Result<Flow> {
    let started = Instant::now();
    let mut buf = vec![0u8; buffer_bytes.max(1)];
    loop {
        if dashboard.wait_while_paused() == Flow::Cancelled {
            return Ok(Flow::Cancelled);
        }
        let n = src.read(&mut buf).context("read source")?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])
            .with_context(|| format!("write {}", part_path.display()))?;
        dashboard.update(handle, n as u64, started.elapsed().as_secs_f64());
        dashboard.draw();
    }
    dst.sync_all().context("storage sync failed")?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("file.iso"));
        assert_eq!(p.to_string_lossy(), "file.iso.part");
        let p2 = temp_path(Path::new("/tmp/archive.zip"));
        assert_eq!(p2.to_string_lossy(), "/tmp/archive.zip.part");
    }

    #[test]
    fn destination_joins_source_name() {
        let job = CopyJob {
            source: PathBuf::from("/data/a/same.bin"),
            dest_dir: PathBuf::from("/out"),
            checksum: None,
            expected: None,
        };
        assert_eq!(job.destination(), Some(PathBuf::from("/out/same.bin")));

        let job = CopyJob {
            source: PathBuf::from("/"),
            ..job
        };
        assert_eq!(job.destination(), None);
    }
}
