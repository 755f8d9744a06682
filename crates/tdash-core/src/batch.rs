//! Batch entry screen: build the list of sources before any transfer starts.
//!
//! The list holds at most [`MAX_SOURCES`] paths. `[a]` adds one through a
//! line prompt, `[d]` drops the last, `[s]` starts (only with a non-empty
//! list) and `[q]`/Esc leaves without starting anything.

use std::io;

use crate::terminal::{self, Key, KeyInput, Surface, Tone};

pub const MAX_SOURCES: usize = 10;

const LIST_TOP: u16 = 3;
const CONTROLS_ROW: u16 = LIST_TOP + MAX_SOURCES as u16 + 2;
const INPUT_ROW: u16 = CONTROLS_ROW + 2;
const CONTROLS: &str = "Controls: [a] Add  [d] Delete Last  [s] Start  [q] Quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Start(Vec<String>),
    Quit,
}

/// Sources queued on the batch screen, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchList {
    items: Vec<String>,
}

impl BatchList {
    /// Start from `items`; blank ones are dropped and the rest cut at [`MAX_SOURCES`].
    pub fn with_items(items: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self::default();
        for item in items {
            list.push(&item);
        }
        list
    }

    /// Append a trimmed, non-empty entry. Returns false when nothing was added.
    pub fn push(&mut self, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() || self.is_full() {
            return false;
        }
        self.items.push(item.to_string());
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        self.items.pop()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_SOURCES
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

/// Run the screen until the user starts or quits. Closed input counts as quit.
pub fn run_batch_entry(
    mut list: BatchList,
    surface: &mut dyn Surface,
    keys: &mut dyn KeyInput,
) -> io::Result<BatchOutcome> {
    let mut notice: Option<&str> = None;
    loop {
        draw(&list, notice.take(), surface)?;
        match keys.read_key()? {
            None | Some(Key::Esc) | Some(Key::Char('q')) => return Ok(BatchOutcome::Quit),
            Some(Key::Char('a')) => {
                if list.is_full() {
                    notice = Some("List is full");
                    continue;
                }
                surface.put(INPUT_ROW, 2, "Enter path: ", Tone::Info);
                surface.flush()?;
                let line = terminal::read_line(keys, |buf| {
                    surface.clear_rows(INPUT_ROW, INPUT_ROW + 1);
                    surface.put(INPUT_ROW, 2, &format!("Enter path: {}", buf), Tone::Info);
                    surface.flush()
                })?;
                if let Some(line) = line {
                    list.push(&line);
                }
            }
            Some(Key::Char('d')) => {
                list.pop();
            }
            Some(Key::Char('s')) => {
                if list.items().is_empty() {
                    notice = Some("Add at least one path first");
                    continue;
                }
                tracing::debug!(count = list.items().len(), "batch started");
                return Ok(BatchOutcome::Start(list.items));
            }
            Some(_) => {}
        }
    }
}

fn draw(list: &BatchList, notice: Option<&str>, surface: &mut dyn Surface) -> io::Result<()> {
    let (_, height) = surface.size();
    surface.clear_rows(0, height);
    surface.put(1, 2, " tdash batch copy ", Tone::Header);
    surface.put(LIST_TOP - 1, 2, "Sources:", Tone::Plain);
    for i in 0..MAX_SOURCES {
        let row = LIST_TOP + i as u16;
        match list.items().get(i) {
            Some(item) => surface.put(row, 4, &format!("{}. {}", i + 1, item), Tone::Plain),
            None => surface.put(row, 4, "-", Tone::Plain),
        }
    }
    surface.put(CONTROLS_ROW, 2, CONTROLS, Tone::Info);
    if let Some(notice) = notice {
        surface.put(INPUT_ROW, 2, notice, Tone::Warning);
    }
    surface.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{MemorySurface, ScriptedKeys};

    fn run(list: BatchList, text: &str) -> (BatchOutcome, MemorySurface) {
        let surface = MemorySurface::new(80, 24);
        let mut keys = ScriptedKeys::from_text(text);
        let outcome = run_batch_entry(list, &mut surface.clone(), &mut keys).unwrap();
        (outcome, surface)
    }

    #[test]
    fn add_delete_and_start() {
        let (outcome, surface) = run(
            BatchList::default(),
            "a/srv/a.iso\na  /srv/b.iso \na/srv/c.iso\nds",
        );
        assert_eq!(
            outcome,
            BatchOutcome::Start(vec!["/srv/a.iso".to_string(), "/srv/b.iso".to_string()])
        );
        assert_eq!(surface.row_text(LIST_TOP).trim(), "1. /srv/a.iso");
        assert_eq!(surface.row_text(LIST_TOP + 2).trim(), "-");
        assert!(surface.row_text(CONTROLS_ROW).contains("[s] Start"));
    }

    #[test]
    fn start_needs_a_non_empty_list() {
        let (outcome, surface) = run(BatchList::default(), "sa\nsq");
        assert_eq!(outcome, BatchOutcome::Quit);
        assert!(surface.contents().contains("Add at least one path first"));
    }

    #[test]
    fn quit_escape_and_closed_input_leave() {
        let prefilled = BatchList::with_items(["x.bin".to_string()]);
        assert_eq!(run(prefilled.clone(), "q").0, BatchOutcome::Quit);
        assert_eq!(run(prefilled.clone(), "\x1b").0, BatchOutcome::Quit);
        assert_eq!(run(prefilled.clone(), "").0, BatchOutcome::Quit);
        // Esc inside the path prompt only cancels that entry.
        assert_eq!(
            run(prefilled, "aabc\x1bs").0,
            BatchOutcome::Start(vec!["x.bin".to_string()])
        );
    }

    #[test]
    fn list_stops_at_ten() {
        let full = BatchList::with_items((0..12).map(|i| format!("f{i}")));
        assert!(full.is_full());
        assert_eq!(full.items().len(), MAX_SOURCES);
        assert_eq!(full.items()[9], "f9");

        let (outcome, surface) = run(full, "aextra\ns");
        let BatchOutcome::Start(items) = outcome else {
            panic!("expected start");
        };
        assert_eq!(items.len(), MAX_SOURCES);
        assert!(!items.contains(&"extra".to_string()));
        assert!(surface.row_text(LIST_TOP + 9).contains("10. f9"));
    }

    #[test]
    fn blank_entries_are_not_added() {
        let mut list = BatchList::default();
        assert!(!list.push("   "));
        assert!(list.push("a"));
        assert_eq!(list.pop().as_deref(), Some("a"));
        assert_eq!(list.pop(), None);
    }
}
