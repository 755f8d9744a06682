//! In-memory terminal: a character grid and a scripted key queue.
//!
//! Both types are cheap handles over shared state, so a test can keep a clone
//! and inspect (or feed) what the dashboard owns.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::{Key, KeyInput, Surface, Tone};

#[derive(Debug)]
struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Vec<char>>,
    flushes: usize,
    released: bool,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    grid: Arc<Mutex<Grid>>,
}

impl MemorySurface {
    pub fn new(width: u16, height: u16) -> Self {
        let cells = vec![vec![' '; usize::from(width)]; usize::from(height)];
        Self {
            grid: Arc::new(Mutex::new(Grid {
                width,
                height,
                cells,
                flushes: 0,
                released: false,
            })),
        }
    }

    fn grid(&self) -> std::sync::MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Text of one row with trailing blanks removed.
    pub fn row_text(&self, row: u16) -> String {
        let grid = self.grid();
        grid.cells
            .get(usize::from(row))
            .map(|r| r.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Every row joined with newlines.
    pub fn contents(&self) -> String {
        let height = self.grid().height;
        (0..height)
            .map(|r| self.row_text(r))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First row containing `needle`.
    pub fn find_row(&self, needle: &str) -> Option<u16> {
        let height = self.grid().height;
        (0..height).find(|&r| self.row_text(r).contains(needle))
    }

    pub fn flush_count(&self) -> usize {
        self.grid().flushes
    }

    pub fn is_released(&self) -> bool {
        self.grid().released
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (u16, u16) {
        let grid = self.grid();
        (grid.width, grid.height)
    }

    fn put(&mut self, row: u16, col: u16, text: &str, _tone: Tone) {
        let mut grid = self.grid();
        let width = usize::from(grid.width);
        let Some(line) = grid.cells.get_mut(usize::from(row)) else {
            return;
        };
        for (i, ch) in text.chars().enumerate() {
            let x = usize::from(col) + i;
            if x >= width {
                break;
            }
            line[x] = ch;
        }
    }

    fn clear_rows(&mut self, top: u16, bottom: u16) {
        let mut grid = self.grid();
        for row in top..bottom {
            if let Some(line) = grid.cells.get_mut(usize::from(row)) {
                line.fill(' ');
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.grid().flushes += 1;
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        self.grid().released = true;
        Ok(())
    }
}

/// Keys served in order; once the queue is empty `poll_key` reports no key and
/// `read_key` reports closed input.
///
/// An empty poll sleeps for its timeout, capped at [`IDLE_POLL_CAP`], the way a
/// real terminal would block.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    queue: Arc<Mutex<VecDeque<Key>>>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(keys.into_iter().collect())),
        }
    }

    /// `'\n'` becomes [`Key::Enter`], `'\x1b'` [`Key::Esc`], everything else a char.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.chars().map(|c| match c {
            '\n' => Key::Enter,
            '\x1b' => Key::Esc,
            c => Key::Char(c),
        }))
    }

    pub fn push(&self, key: Key) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(key);
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn pop(&self) -> Option<Key> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Longest sleep an empty [`ScriptedKeys::poll_key`] takes, so tests that push
/// keys late are not held up by long poll timeouts.
pub const IDLE_POLL_CAP: Duration = Duration::from_millis(10);

impl KeyInput for ScriptedKeys {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        let key = self.pop();
        if key.is_none() && !timeout.is_zero() {
            thread::sleep(timeout.min(IDLE_POLL_CAP));
            return Ok(self.pop());
        }
        Ok(key)
    }

    fn read_key(&mut self) -> io::Result<Option<Key>> {
        Ok(self.pop())
    }
}
