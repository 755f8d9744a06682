//! The producer-facing dashboard handle.
//!
//! All shared state sits behind one mutex. Every operation holds it only for
//! the O(1) mutation it needs; redraws re-acquire it afterwards and digest
//! computation runs with it released.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::completed::CompletedFile;
use super::compositor;
use super::entry::{EntryHandle, ProgressEntry};
use super::state::DashState;
use crate::checksum::{self, ChecksumKind, Digester};
use crate::config::DashConfig;
use crate::terminal::{Key, Surface};

/// What a producer should do after checking the pause/cancel flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Cancelled,
}

pub(crate) struct Shared {
    pub(crate) state: DashState,
    pub(crate) surface: Box<dyn Surface>,
    last_draw: Option<Instant>,
    initialized: bool,
}

struct Inner {
    shared: Mutex<Shared>,
    /// Signalled whenever pause is lifted or cancel is requested.
    resumed: Condvar,
    digester: Arc<dyn Digester>,
    redraw_interval: Duration,
}

/// Cloneable handle shared by producers, the control channel and the session.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl Dashboard {
    pub fn new(surface: Box<dyn Surface>, digester: Arc<dyn Digester>, cfg: &DashConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    state: DashState::new(),
                    surface,
                    last_draw: None,
                    initialized: true,
                }),
                resumed: Condvar::new(),
                digester,
                redraw_interval: cfg.redraw_interval(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---- entry registry -------------------------------------------------

    /// Start tracking a transfer. `total` of 0 means the size is unknown.
    pub fn create(&self, filename: &str, initial: u64, total: u64) -> EntryHandle {
        let handle = self.lock().state.allocate(filename, initial, total, Instant::now());
        if handle.is_detached() {
            tracing::warn!(filename, "no free dashboard slot; entry not tracked");
        } else {
            tracing::debug!(slot = handle.slot, filename, total, "entry created");
        }
        self.redraw(true);
        handle
    }

    /// Like [`create`](Self::create), and remember which digest to compute on finish.
    pub fn create_with_checksum(
        &self,
        filename: &str,
        filepath: Option<&Path>,
        initial: u64,
        total: u64,
        kind: Option<ChecksumKind>,
        expected_digest: Option<&str>,
    ) -> EntryHandle {
        let handle = {
            let mut shared = self.lock();
            let handle = shared.state.allocate(filename, initial, total, Instant::now());
            if let Some(entry) = shared.state.entry_mut(handle) {
                entry.filepath = filepath.map(Path::to_path_buf);
                entry.checksum_kind = kind;
                entry.expected_digest = expected_digest
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
            }
            handle
        };
        tracing::debug!(slot = handle.slot, filename, ?kind, "entry created with checksum");
        self.redraw(true);
        handle
    }

    pub fn set_filepath(&self, handle: EntryHandle, path: impl Into<PathBuf>) {
        if let Some(entry) = self.lock().state.entry_mut(handle) {
            entry.filepath = Some(path.into());
        }
    }

    /// Add `delta` transferred bytes. Does not redraw; call [`draw`](Self::draw).
    pub fn update(&self, handle: EntryHandle, delta: u64, elapsed_hint: f64) {
        if let Some(entry) = self.lock().state.entry_mut(handle) {
            entry.current_bytes = entry.current_bytes.saturating_add(delta);
            if elapsed_hint > 0.0 {
                entry.elapsed_hint = Some(elapsed_hint);
            }
        }
    }

    /// Producer-driven redraw, throttled by `redraw_interval_ms`.
    pub fn draw(&self) {
        self.redraw(false);
    }

    /// Mark the entry done and show it as complete.
    pub fn finish(&self, handle: EntryHandle) {
        self.mark_finished(handle);
        self.redraw(true);
    }

    /// Finish, then compute and check the digest the entry was created with.
    /// The digest is computed with the lock released.
    pub fn finish_with_checksum(&self, handle: EntryHandle) {
        self.finish(handle);

        let job = {
            let shared = self.lock();
            shared
                .state
                .entry(handle)
                .and_then(|e| Some((e.checksum_kind?, e.filepath.clone()?)))
        };
        let Some((kind, path)) = job else {
            return;
        };

        let result = self.inner.digester.digest(kind, &path);

        {
            let mut shared = self.lock();
            let Some(entry) = shared.state.entry_mut(handle) else {
                return;
            };
            match result {
                Ok(digest) => {
                    entry.verified = entry
                        .expected_digest
                        .as_deref()
                        .map(|expected| checksum::digests_match(&digest, expected))
                        .unwrap_or(false);
                    entry.digest_computed = true;
                    entry.digest_error = None;
                    tracing::info!(
                        slot = handle.slot,
                        path = %path.display(),
                        %kind,
                        verified = entry.verified,
                        "digest computed"
                    );
                    entry.digest = Some(digest);
                }
                Err(e) => {
                    tracing::warn!(slot = handle.slot, path = %path.display(), %kind, "digest failed: {}", e);
                    entry.digest_computed = false;
                    entry.digest = None;
                    entry.digest_error = Some(e.to_string());
                }
            }
        }
        self.redraw(true);
    }

    /// End an entry that will not complete. The slot becomes reusable and the
    /// byte count is left where the producer stopped.
    pub fn stop(&self, handle: EntryHandle, reason: &str) {
        {
            let mut shared = self.lock();
            let Some(entry) = shared.state.entry_mut(handle) else {
                return;
            };
            entry.active = false;
            entry.stopped = Some(reason.to_string());
            tracing::debug!(slot = handle.slot, bytes = entry.current_bytes, reason, "entry stopped");
        }
        self.redraw(true);
    }

    fn mark_finished(&self, handle: EntryHandle) {
        if let Some(entry) = self.lock().state.entry_mut(handle) {
            entry.active = false;
            if entry.total_bytes == 0 {
                entry.total_bytes = entry.current_bytes;
            } else {
                entry.current_bytes = entry.total_bytes;
            }
            tracing::debug!(slot = handle.slot, bytes = entry.current_bytes, "entry finished");
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().state.active_count()
    }

    pub fn entry_count(&self) -> usize {
        self.lock().state.entry_count()
    }

    /// True while the dashboard is initialized and tracks at least one entry,
    /// finished or not.
    pub fn is_active(&self) -> bool {
        let shared = self.lock();
        shared.initialized && shared.state.entry_count() > 0
    }

    pub fn snapshot(&self, handle: EntryHandle) -> Option<ProgressEntry> {
        self.lock().state.entry(handle).cloned()
    }

    pub fn checksum(&self, handle: EntryHandle) -> Option<String> {
        self.lock().state.entry(handle).and_then(|e| e.digest.clone())
    }

    pub fn is_checksum_verified(&self, handle: EntryHandle) -> bool {
        self.lock()
            .state
            .entry(handle)
            .map(|e| e.verified)
            .unwrap_or(false)
    }

    // ---- completed files ------------------------------------------------

    /// Returns false if the path was already registered.
    pub fn register_completed_file(&self, name: &str, path: impl Into<PathBuf>) -> bool {
        self.register_completed_file_expecting(name, path, None)
    }

    /// Register with a digest supplied up front; verification compares
    /// against it instead of asking.
    pub fn register_completed_file_expecting(
        &self,
        name: &str,
        path: impl Into<PathBuf>,
        expected: Option<&str>,
    ) -> bool {
        let mut file = CompletedFile::new(name, path);
        file.expected_digest = expected
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let path = file.path.clone();
        let added = self.lock().state.completed.register(file);
        if added {
            tracing::debug!(path = %path.display(), "completed file registered");
        }
        added
    }

    pub fn completed_file_count(&self) -> usize {
        self.lock().state.completed.len()
    }

    pub fn completed_files(&self) -> Vec<CompletedFile> {
        self.lock().state.completed.to_vec()
    }

    // ---- control flags --------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.lock().state.ui().paused
    }

    /// Cancellation is cooperative: producers must check this (or use
    /// [`wait_while_paused`](Self::wait_while_paused)) between writes and stop
    /// issuing work once it is set.
    pub fn is_cancelled(&self) -> bool {
        self.lock().state.ui().cancelled
    }

    pub fn scroll_offset(&self) -> usize {
        self.lock().state.ui().scroll_offset
    }

    pub fn visible_capacity(&self) -> usize {
        self.lock().state.ui().visible_capacity
    }

    /// Block while the dashboard is paused. Returns [`Flow::Cancelled`] as
    /// soon as cancellation is requested.
    pub fn wait_while_paused(&self) -> Flow {
        let mut shared = self.lock();
        while shared.state.ui().paused && !shared.state.ui().cancelled {
            shared = self
                .inner
                .resumed
                .wait(shared)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if shared.state.ui().cancelled {
            Flow::Cancelled
        } else {
            Flow::Continue
        }
    }

    pub fn toggle_pause(&self) {
        self.handle_key(Key::Char('p'));
    }

    pub fn cancel(&self) {
        self.handle_key(Key::Char('c'));
    }

    /// Apply a control key; redraws and wakes paused producers if it changed anything.
    pub fn handle_key(&self, key: Key) -> bool {
        let changed = {
            let mut shared = self.lock();
            let changed = shared.state.apply_key(key);
            if changed {
                let ui = shared.state.ui();
                tracing::debug!(?key, paused = ui.paused, cancelled = ui.cancelled, "control key");
            }
            changed
        };
        if changed {
            self.inner.resumed.notify_all();
            self.redraw(true);
        }
        changed
    }

    // ---- drawing --------------------------------------------------------

    /// Render the current state. Unforced redraws within `redraw_interval`
    /// of the previous one are skipped.
    pub(crate) fn redraw(&self, force: bool) {
        let mut guard = self.lock();
        if !guard.initialized {
            return;
        }
        let now = Instant::now();
        if !force && !self.inner.redraw_interval.is_zero() {
            if let Some(last) = guard.last_draw {
                if now.duration_since(last) < self.inner.redraw_interval {
                    return;
                }
            }
        }
        guard.last_draw = Some(now);
        let Shared { state, surface, .. } = &mut *guard;
        if let Err(e) = compositor::render(state, surface.as_mut(), now) {
            tracing::debug!("render failed: {}", e);
        }
    }

    /// Run `f` against the surface under the dashboard lock. Used by prompts
    /// drawn on top of the dashboard.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut dyn Surface) -> R) -> R {
        let mut guard = self.lock();
        f(guard.surface.as_mut())
    }

    /// Clear every registry and flag, then give the terminal back. Wakes any
    /// producer still parked in `wait_while_paused`.
    pub(crate) fn teardown(&self) {
        {
            let mut shared = self.lock();
            if shared.initialized {
                shared.initialized = false;
                shared.state.clear();
                shared.state.cancel();
                if let Err(e) = shared.surface.release() {
                    tracing::warn!("restoring terminal failed: {}", e);
                }
                tracing::debug!("dashboard torn down");
            }
        }
        self.inner.resumed.notify_all();
    }
}
