//! Real terminal backend on top of crossterm: alternate screen, raw mode,
//! hidden cursor.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::time::Duration;

use super::{Key, KeyInput, Surface, Tone};

const FALLBACK_SIZE: (u16, u16) = (80, 24);
const READ_SLICE: Duration = Duration::from_millis(250);

pub struct CrosstermSurface {
    out: Stdout,
    active: bool,
}

impl CrosstermSurface {
    /// Switch the terminal into dashboard mode.
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self { out, active: true })
    }

    fn write_at(&mut self, row: u16, col: u16, text: &str, tone: Tone) -> io::Result<()> {
        queue!(self.out, MoveTo(col, row))?;
        match Self::color(tone) {
            Some(color) => {
                queue!(self.out, SetForegroundColor(color))?;
                if matches!(tone, Tone::Header | Tone::Warning) {
                    queue!(self.out, SetAttribute(Attribute::Bold))?;
                }
                queue!(
                    self.out,
                    Print(text),
                    SetAttribute(Attribute::Reset),
                    ResetColor
                )
            }
            None => queue!(self.out, Print(text)),
        }
    }

    fn color(tone: Tone) -> Option<Color> {
        match tone {
            Tone::Plain => None,
            Tone::Header => Some(Color::White),
            Tone::Info => Some(Color::Cyan),
            Tone::Bar => Some(Color::Green),
            Tone::Warning => Some(Color::Yellow),
            Tone::Success => Some(Color::Green),
            Tone::Error => Some(Color::Red),
        }
    }
}

impl Surface for CrosstermSurface {
    fn size(&self) -> (u16, u16) {
        terminal::size().unwrap_or(FALLBACK_SIZE)
    }

    fn put(&mut self, row: u16, col: u16, text: &str, tone: Tone) {
        let (width, height) = self.size();
        if row >= height || col >= width {
            return;
        }
        let room = usize::from(width - col);
        let clipped: String = text.chars().take(room).collect();
        if let Err(e) = self.write_at(row, col, &clipped, tone) {
            tracing::debug!("terminal write failed: {}", e);
        }
    }

    fn clear_rows(&mut self, top: u16, bottom: u16) {
        for row in top..bottom {
            if let Err(e) = queue!(self.out, MoveTo(0, row), Clear(ClearType::CurrentLine)) {
                tracing::debug!("terminal clear failed: {}", e);
                return;
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let res = execute!(self.out, Show, LeaveAlternateScreen);
        terminal::disable_raw_mode()?;
        res
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Key reader over crossterm's global event queue.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl CrosstermKeys {
    pub fn new() -> Self {
        Self
    }

    fn map(code: KeyCode, modifiers: KeyModifiers) -> Key {
        match code {
            // Raw mode swallows SIGINT; treat ctrl-c like escape.
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Key::Esc,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Esc => Key::Esc,
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            _ => Key::Other,
        }
    }
}

impl KeyInput for CrosstermKeys {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                Ok(Some(Self::map(k.code, k.modifiers)))
            }
            _ => Ok(None),
        }
    }

    fn read_key(&mut self) -> io::Result<Option<Key>> {
        loop {
            if let Some(key) = self.poll_key(READ_SLICE)? {
                return Ok(Some(key));
            }
        }
    }
}
