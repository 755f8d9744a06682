//! Terminal seams used by the dashboard.
//!
//! The compositor only writes text into rows of a [`Surface`]; the control
//! channel and the verification prompts only read [`Key`]s from a
//! [`KeyInput`]. `crossterm_backend` drives a real terminal, `memory` backs
//! tests.

mod crossterm_backend;
mod memory;

use std::io;
use std::time::Duration;

pub use crossterm_backend::{CrosstermKeys, CrosstermSurface};
pub use memory::{MemorySurface, ScriptedKeys};

/// Key press, reduced to what the dashboard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Esc,
    Enter,
    Backspace,
    Other,
}

/// Colour role for a piece of text; backends map it to whatever they can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Header,
    Info,
    Bar,
    Warning,
    Success,
    Error,
}

/// Row/column addressed drawing target. Text past the right edge and rows past
/// the bottom are clipped by the implementation.
pub trait Surface: Send {
    /// `(width, height)` in cells.
    fn size(&self) -> (u16, u16);

    fn put(&mut self, row: u16, col: u16, text: &str, tone: Tone);

    /// Blank rows `top..bottom`.
    fn clear_rows(&mut self, top: u16, bottom: u16);

    fn flush(&mut self) -> io::Result<()>;

    /// Give the terminal back (leave raw mode, show the cursor). Idempotent.
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Source of key presses.
pub trait KeyInput: Send {
    /// Wait at most `timeout` for a key. `Duration::ZERO` never blocks.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<Key>>;

    /// Block until a key arrives. `None` means the input is closed.
    fn read_key(&mut self) -> io::Result<Option<Key>>;
}

/// Read a line of text key by key, calling `echo` with the buffer after every
/// edit. Returns `None` when the user presses escape or input closes.
pub fn read_line(
    keys: &mut dyn KeyInput,
    mut echo: impl FnMut(&str) -> io::Result<()>,
) -> io::Result<Option<String>> {
    let mut buf = String::new();
    loop {
        match keys.read_key()? {
            None | Some(Key::Esc) => return Ok(None),
            Some(Key::Enter) => return Ok(Some(buf)),
            Some(Key::Backspace) => {
                buf.pop();
            }
            Some(Key::Char(c)) if !c.is_control() => buf.push(c),
            Some(_) => continue,
        }
        echo(&buf)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_line_collects_until_enter() {
        let mut keys = ScriptedKeys::from_text("abc\n");
        let mut echoed = Vec::new();
        let line = read_line(&mut keys, |s| {
            echoed.push(s.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(line.as_deref(), Some("abc"));
        assert_eq!(echoed, vec!["a", "ab", "abc"]);
    }

    #[test]
    fn read_line_handles_backspace() {
        let mut keys = ScriptedKeys::new([
            Key::Char('a'),
            Key::Char('x'),
            Key::Backspace,
            Key::Char('b'),
            Key::Enter,
        ]);
        let line = read_line(&mut keys, |_| Ok(())).unwrap();
        assert_eq!(line.as_deref(), Some("ab"));
    }

    #[test]
    fn read_line_escape_and_closed_input_cancel() {
        let mut keys = ScriptedKeys::new([Key::Char('a'), Key::Esc]);
        assert_eq!(read_line(&mut keys, |_| Ok(())).unwrap(), None);

        let mut keys = ScriptedKeys::from_text("abc");
        assert_eq!(read_line(&mut keys, |_| Ok(())).unwrap(), None);
    }
}
