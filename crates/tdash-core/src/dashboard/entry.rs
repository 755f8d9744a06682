//! One tracked transfer and the handle producers use to address it.

use std::path::PathBuf;
use std::time::Instant;

use crate::checksum::ChecksumKind;

/// Opaque reference to an entry: the slot it lives in plus the generation of
/// the entry that was allocated there. Once the slot is recycled, operations
/// through an older handle are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
}

impl EntryHandle {
    /// Handle returned when no slot could be allocated; every call through it is a no-op.
    pub const DETACHED: EntryHandle = EntryHandle {
        slot: usize::MAX,
        generation: 0,
    };

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_detached(&self) -> bool {
        self.generation == 0
    }
}

/// Progress of one transfer. Owned by the registry and only mutated under
/// the dashboard lock.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub slot: usize,
    pub(crate) generation: u64,
    pub filename: String,
    pub filepath: Option<PathBuf>,
    /// Expected size in bytes; 0 means unknown.
    pub total_bytes: u64,
    pub current_bytes: u64,
    pub start_time: Instant,
    /// Latest elapsed time reported by the producer, in seconds.
    pub elapsed_hint: Option<f64>,
    pub active: bool,
    pub checksum_kind: Option<ChecksumKind>,
    pub digest: Option<String>,
    pub expected_digest: Option<String>,
    pub verified: bool,
    pub digest_computed: bool,
    pub digest_error: Option<String>,
    /// Set when the producer gave up before the last byte (cancel or I/O error).
    pub stopped: Option<String>,
}

impl ProgressEntry {
    pub(crate) fn new(
        slot: usize,
        generation: u64,
        filename: &str,
        initial: u64,
        total: u64,
        now: Instant,
    ) -> Self {
        Self {
            slot,
            generation,
            filename: filename.to_string(),
            filepath: None,
            total_bytes: total,
            current_bytes: initial,
            start_time: now,
            elapsed_hint: None,
            active: true,
            checksum_kind: None,
            digest: None,
            expected_digest: None,
            verified: false,
            digest_computed: false,
            digest_error: None,
            stopped: None,
        }
    }

    /// Fraction complete in [0.0, 1.0]; an unknown total counts as 0.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.current_bytes as f64 / self.total_bytes as f64).min(1.0)
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Seconds since start: the producer's hint when it gave a positive one,
    /// wall clock otherwise.
    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        match self.elapsed_hint {
            Some(hint) if hint > 0.0 => hint,
            _ => now.saturating_duration_since(self.start_time).as_secs_f64(),
        }
    }

    /// Transfer rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self, now: Instant) -> f64 {
        let elapsed = self.elapsed_secs(now);
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.current_bytes as f64 / elapsed
    }

    /// Estimated seconds remaining; `None` when the rate or the total is unknown.
    pub fn eta_secs(&self, now: Instant) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let rate = self.bytes_per_sec(now);
        if rate <= 0.0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.current_bytes);
        Some(remaining as f64 / rate)
    }

    pub(crate) fn matches(&self, handle: EntryHandle) -> bool {
        self.generation == handle.generation
    }
}
