//! Shared dashboard state: the entry arena, completed files and UI flags.
//!
//! Everything here is plain data guarded by the single dashboard lock; no
//! method blocks or does I/O.

use std::time::Instant;

use super::completed::CompletedFiles;
use super::entry::{EntryHandle, ProgressEntry};
use crate::terminal::Key;

/// Upper bound on tracked entries; creates beyond it get a detached handle.
pub const MAX_ENTRIES: usize = 1024;

/// Pause/cancel/scroll flags read by the compositor and producers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub paused: bool,
    pub cancelled: bool,
    pub scroll_offset: usize,
    /// Entries that fit on screen; recomputed by every render.
    pub visible_capacity: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            paused: false,
            cancelled: false,
            scroll_offset: 0,
            visible_capacity: 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct DashState {
    pub(crate) slots: Vec<Option<ProgressEntry>>,
    pub(crate) completed: CompletedFiles,
    pub(crate) ui: UiState,
    next_generation: u64,
}

impl DashState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new entry in the first empty or inactive slot, appending when
    /// every slot is busy. A recycled slot's previous entry is dropped whole.
    pub fn allocate(&mut self, filename: &str, initial: u64, total: u64, now: Instant) -> EntryHandle {
        let reusable = self
            .slots
            .iter()
            .position(|s| s.as_ref().map_or(true, |e| !e.active));
        let slot = match reusable {
            Some(slot) => slot,
            None if self.slots.len() < MAX_ENTRIES => {
                self.slots.push(None);
                self.slots.len() - 1
            }
            None => return EntryHandle::DETACHED,
        };
        self.next_generation += 1;
        let generation = self.next_generation;
        self.slots[slot] = Some(ProgressEntry::new(slot, generation, filename, initial, total, now));
        EntryHandle { slot, generation }
    }

    pub fn entry(&self, handle: EntryHandle) -> Option<&ProgressEntry> {
        self.slots
            .get(handle.slot)?
            .as_ref()
            .filter(|e| e.matches(handle))
    }

    pub fn entry_mut(&mut self, handle: EntryHandle) -> Option<&mut ProgressEntry> {
        self.slots
            .get_mut(handle.slot)?
            .as_mut()
            .filter(|e| e.matches(handle))
    }

    /// Occupied slots in slot order; this is the list the compositor scrolls over.
    pub fn entries(&self) -> impl Iterator<Item = &ProgressEntry> {
        self.slots.iter().flatten()
    }

    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    pub fn active_count(&self) -> usize {
        self.entries().filter(|e| e.active).count()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn completed(&self) -> &CompletedFiles {
        &self.completed
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_scroll(&self) -> usize {
        self.entry_count().saturating_sub(self.ui.visible_capacity)
    }

    pub fn clamp_scroll(&mut self) {
        self.ui.scroll_offset = self.ui.scroll_offset.min(self.max_scroll());
    }

    pub fn toggle_pause(&mut self) {
        self.ui.paused = !self.ui.paused;
    }

    /// Cancellation is never masked by a pause.
    pub fn cancel(&mut self) {
        self.ui.cancelled = true;
        self.ui.paused = false;
    }

    pub fn scroll_down(&mut self) -> bool {
        if self.ui.scroll_offset + self.ui.visible_capacity < self.entry_count() {
            self.ui.scroll_offset += 1;
            true
        } else {
            false
        }
    }

    pub fn scroll_up(&mut self) -> bool {
        if self.ui.scroll_offset > 0 {
            self.ui.scroll_offset -= 1;
            true
        } else {
            false
        }
    }

    /// Apply a control key. Returns true if anything visible changed.
    pub fn apply_key(&mut self, key: Key) -> bool {
        match key {
            Key::Char('p') | Key::Char('P') => {
                self.toggle_pause();
                true
            }
            Key::Char('c') | Key::Char('C') | Key::Esc => {
                self.cancel();
                true
            }
            Key::Char('j') | Key::Char('J') | Key::Down => self.scroll_down(),
            Key::Char('k') | Key::Char('K') | Key::Up => self.scroll_up(),
            _ => false,
        }
    }

    /// Drop every entry, completed file and flag.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.completed.clear();
        self.ui = UiState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish(state: &mut DashState, h: EntryHandle) {
        state.entry_mut(h).unwrap().active = false;
    }

    #[test]
    fn allocate_appends_then_reuses_first_inactive() {
        let mut state = DashState::new();
        let now = Instant::now();
        let a = state.allocate("a", 0, 10, now);
        let b = state.allocate("b", 0, 10, now);
        let c = state.allocate("c", 0, 10, now);
        assert_eq!((a.slot(), b.slot(), c.slot()), (0, 1, 2));

        finish(&mut state, b);
        finish(&mut state, a);
        let d = state.allocate("d", 0, 10, now);
        assert_eq!(d.slot(), 0, "first inactive slot wins");
        assert_eq!(state.entry(d).unwrap().filename, "d");
        assert!(state.entry(a).is_none(), "old handle is stale after reuse");
        assert_eq!(state.entry_count(), 3);
        assert_eq!(state.active_count(), 2);
    }

    #[test]
    fn recycled_slot_forgets_previous_identity() {
        let mut state = DashState::new();
        let now = Instant::now();
        let a = state.allocate("a", 0, 10, now);
        {
            let e = state.entry_mut(a).unwrap();
            e.digest = Some("abcd".into());
            e.filepath = Some("/tmp/a".into());
            e.active = false;
        }
        let b = state.allocate("b", 5, 20, now);
        let e = state.entry(b).unwrap();
        assert_eq!(e.slot, 0);
        assert!(e.digest.is_none());
        assert!(e.filepath.is_none());
        assert_eq!(e.current_bytes, 5);
    }

    #[test]
    fn no_two_active_entries_share_a_slot() {
        let mut state = DashState::new();
        let now = Instant::now();
        let mut live: Vec<EntryHandle> = Vec::new();
        for round in 0..50usize {
            if round % 3 == 2 && !live.is_empty() {
                let h = live.remove(round % live.len());
                finish(&mut state, h);
            } else {
                live.push(state.allocate("x", 0, 1, now));
            }
            let mut slots: Vec<usize> = live.iter().map(|h| h.slot()).collect();
            slots.sort_unstable();
            slots.dedup();
            assert_eq!(slots.len(), live.len());
            assert_eq!(state.active_count(), live.len());
        }
    }

    #[test]
    fn cancel_clears_pause() {
        let mut state = DashState::new();
        assert!(state.apply_key(Key::Char('p')));
        assert!(state.ui().paused);
        assert!(state.apply_key(Key::Esc));
        assert!(state.ui().cancelled);
        assert!(!state.ui().paused);
    }

    #[test]
    fn scroll_keys_respect_bounds() {
        let mut state = DashState::new();
        let now = Instant::now();
        for _ in 0..5 {
            state.allocate("x", 0, 1, now);
        }
        state.ui.visible_capacity = 3;
        assert!(!state.apply_key(Key::Char('k')));
        assert!(state.apply_key(Key::Char('j')));
        assert!(state.apply_key(Key::Down));
        assert!(!state.apply_key(Key::Char('J')));
        assert_eq!(state.ui().scroll_offset, 2);
        assert!(state.apply_key(Key::Up));
        assert_eq!(state.ui().scroll_offset, 1);
        assert!(!state.apply_key(Key::Char('x')));
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = DashState::new();
        state.allocate("x", 0, 1, Instant::now());
        state.cancel();
        state.clear();
        assert_eq!(state.entry_count(), 0);
        assert_eq!(*state.ui(), UiState::default());
    }
}
