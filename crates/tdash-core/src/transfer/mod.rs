//! Local file copies as dashboard producers.
//!
//! Each worker thread runs one copy at a time and reports through the shared
//! [`Dashboard`]; up to `max_concurrent` copies are in flight. Workers stop
//! picking up new jobs once the dashboard is cancelled. A job whose
//! destination an earlier job already claims is refused without touching disk.

mod copy;

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::dashboard::Dashboard;

pub use copy::{copy_file, temp_path, CopyJob, CopyOutcome, TEMP_SUFFIX};

/// Run all `jobs` with at most `max_concurrent` in flight. Results come back
/// in job order; jobs never started because of cancellation report `Cancelled`.
/// When two jobs share a destination only the first runs, the rest fail.
pub fn copy_all(
    dashboard: &Dashboard,
    jobs: &[CopyJob],
    max_concurrent: usize,
    buffer_bytes: usize,
) -> Vec<Result<CopyOutcome>> {
    let workers = max_concurrent.max(1).min(jobs.len().max(1));
    let next = AtomicUsize::new(0);
    let conflicts = duplicate_destinations(jobs);
    let conflicts = conflicts.as_slice();

    let mut results: Vec<(usize, Result<CopyOutcome>)> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(|| run_worker(dashboard, jobs, conflicts, &next, buffer_bytes)));
        }
        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(_) => {
                    tracing::error!("copy worker panicked");
                    Vec::new()
                }
            })
            .collect()
    });

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, r)| r).collect()
}

/// For each job, the destination it shares with an earlier job, if any.
pub fn duplicate_destinations(jobs: &[CopyJob]) -> Vec<Option<PathBuf>> {
    let mut seen = HashSet::new();
    jobs.iter()
        .map(|job| {
            let dest = job.destination()?;
            if seen.insert(dest.clone()) {
                None
            } else {
                Some(dest)
            }
        })
        .collect()
}

fn run_worker(
    dashboard: &Dashboard,
    jobs: &[CopyJob],
    conflicts: &[Option<PathBuf>],
    next: &AtomicUsize,
    buffer_bytes: usize,
) -> Vec<(usize, Result<CopyOutcome>)> {
    let mut done = Vec::new();
    loop {
        let index = next.fetch_add(1, Ordering::Relaxed);
        let Some(job) = jobs.get(index) else {
            break;
        };
        let result = if let Some(Some(dest)) = conflicts.get(index) {
            Err(anyhow!(
                "{} is already the destination of another source",
                dest.display()
            ))
        } else if dashboard.is_cancelled() {
            Ok(CopyOutcome::Cancelled)
        } else {
            copy_file(dashboard, job, buffer_bytes)
        };
        if let Err(e) = &result {
            tracing::warn!(src = %job.source.display(), "copy failed: {:#}", e);
        }
        done.push((index, result));
    }
    done
}
