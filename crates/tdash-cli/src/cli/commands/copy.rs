//! Copy command: run the copies under the dashboard, then verify.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tdash_core::batch::{self, BatchList, BatchOutcome};
use tdash_core::checksum::{ChecksumKind, Digester, FileDigester};
use tdash_core::config::DashConfig;
use tdash_core::dashboard::Session;
use tdash_core::terminal::{CrosstermKeys, CrosstermSurface};
use tdash_core::transfer::{self, CopyJob, CopyOutcome};
use tdash_core::verify::{WorkflowOutcome, WorkflowStatus};

#[derive(Debug)]
pub struct CopyArgs {
    pub sources: Vec<PathBuf>,
    pub interactive: bool,
    pub dest: PathBuf,
    pub jobs: Option<usize>,
    pub checksum: Option<ChecksumKind>,
    pub expect: Vec<String>,
    pub no_verify: bool,
    pub report: Option<PathBuf>,
}

pub fn run_copy(cfg: &DashConfig, mut args: CopyArgs) -> Result<()> {
    let mut terminal = None;
    if args.interactive {
        let mut surface = CrosstermSurface::enter().context("failed to take over the terminal")?;
        let mut keys = CrosstermKeys::new();
        let list = BatchList::with_items(args.sources.iter().map(|p| p.display().to_string()));
        match batch::run_batch_entry(list, &mut surface, &mut keys).context("batch entry screen")? {
            BatchOutcome::Quit => {
                drop(surface);
                println!("nothing copied");
                return Ok(());
            }
            BatchOutcome::Start(items) => {
                args.sources = items.into_iter().map(PathBuf::from).collect();
            }
        }
        terminal = Some((surface, keys));
    }

    let jobs = build_jobs(cfg, &args)?;
    std::fs::create_dir_all(&args.dest)
        .with_context(|| format!("create destination: {}", args.dest.display()))?;
    let max_concurrent = args.jobs.unwrap_or(cfg.max_concurrent_transfers);

    let (surface, keys) = match terminal {
        Some(terminal) => terminal,
        None => (
            CrosstermSurface::enter().context("failed to take over the terminal")?,
            CrosstermKeys::new(),
        ),
    };
    let digester: Arc<dyn Digester> = Arc::new(FileDigester);
    let mut session = Session::start(cfg.clone(), Box::new(surface), Box::new(keys), digester)?;

    let results = transfer::copy_all(session.dashboard(), &jobs, max_concurrent, cfg.copy_buffer_bytes);

    let outcome = if session.dashboard().is_cancelled() {
        None
    } else {
        session.wait_for_completion()?;
        if args.no_verify {
            None
        } else {
            Some(session.verify()?)
        }
    };
    session.shutdown();

    let failed = print_results(&jobs, &results);
    if let Some(outcome) = &outcome {
        print_verification(outcome);
        if let Some(path) = &args.report {
            outcome.save_to_path(path)?;
            println!("report written to {}", path.display());
        }
    }

    if failed > 0 {
        bail!("{} of {} copies failed", failed, jobs.len());
    }
    Ok(())
}

/// One job per source. `--expect` values pair with sources by position; the
/// digest kind comes from `--checksum`, then the config, then the digest length.
/// Two sources that would land on the same destination are an error.
pub(crate) fn build_jobs(cfg: &DashConfig, args: &CopyArgs) -> Result<Vec<CopyJob>> {
    if args.expect.len() > args.sources.len() {
        bail!(
            "{} --expect values given for {} sources",
            args.expect.len(),
            args.sources.len()
        );
    }
    let default_kind = args.checksum.or(cfg.default_checksum);

    let jobs = args
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let expected = args
                .expect
                .get(i)
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty());
            let checksum = match (&expected, default_kind) {
                (_, Some(kind)) => Some(kind),
                (Some(e), None) => match ChecksumKind::from_hex_len(e.len()) {
                    Some(kind) => Some(kind),
                    None => bail!(
                        "cannot tell the checksum kind of {:?} for {}; pass --checksum",
                        e,
                        source.display()
                    ),
                },
                (None, None) => None,
            };
            Ok(CopyJob {
                source: source.clone(),
                dest_dir: args.dest.clone(),
                checksum,
                expected,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(dest) = transfer::duplicate_destinations(&jobs).into_iter().flatten().next() {
        bail!("two sources would both be copied to {}", dest.display());
    }
    Ok(jobs)
}

/// Print one line per job; returns how many failed.
fn print_results(jobs: &[CopyJob], results: &[Result<CopyOutcome>]) -> usize {
    let mut failed = 0;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(CopyOutcome::Completed(path)) => println!("copied     {}", path.display()),
            Ok(CopyOutcome::Cancelled) => println!("cancelled  {}", job.source.display()),
            Err(e) => {
                failed += 1;
                eprintln!("failed     {}: {:#}", job.source.display(), e);
            }
        }
    }
    failed
}

fn print_verification(outcome: &WorkflowOutcome) {
    match outcome.status {
        WorkflowStatus::Declined => {
            println!("verification skipped");
            return;
        }
        WorkflowStatus::Aborted => println!("verification stopped early"),
        WorkflowStatus::Completed => {}
    }
    for file in outcome.files.iter().filter(|f| f.state.is_final()) {
        println!(
            "{:<10} {}  {}",
            file.state.name(),
            file.digest.as_deref().unwrap_or("-"),
            file.path.display()
        );
    }
    println!("{}", outcome.summary);
}
