//! Prompts used by the verification workflow, and their terminal rendering.

use std::io;

use super::{VerifyState, VerifySummary};
use crate::checksum::ChecksumKind;
use crate::dashboard::compositor::{FOOTER_ROWS, HEADER_ROWS};
use crate::dashboard::{CompletedFile, Dashboard};
use crate::terminal::{self, Key, KeyInput, Tone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindChoice {
    Kind(ChecksumKind),
    Abort,
}

/// Questions the workflow asks. Every method that waits for the user may
/// return a cancel (`None` / [`KindChoice::Abort`]); the workflow stops there.
pub trait Prompter {
    /// `Some(true)` to go ahead, `Some(false)` to decline, `None` if cancelled.
    fn confirm_start(&mut self, file_count: usize) -> io::Result<Option<bool>>;

    fn choose_kind(&mut self, file: &CompletedFile, index: usize, total: usize) -> io::Result<KindChoice>;

    /// Shown while the digest is being computed.
    fn calculating(&mut self, file: &CompletedFile, kind: ChecksumKind) -> io::Result<()>;

    /// Expected digest; an empty string skips the comparison.
    fn expected_digest(&mut self, file: &CompletedFile) -> io::Result<Option<String>>;

    fn report(&mut self, file: &CompletedFile) -> io::Result<()>;

    fn summary(&mut self, summary: &VerifySummary) -> io::Result<()>;
}

/// Draws prompts in the dashboard body and reads answers key by key.
pub struct TerminalPrompter<'a> {
    dashboard: &'a Dashboard,
    keys: &'a mut dyn KeyInput,
    last_result: Option<(String, Tone)>,
}

impl<'a> TerminalPrompter<'a> {
    pub fn new(dashboard: &'a Dashboard, keys: &'a mut dyn KeyInput) -> Self {
        Self {
            dashboard,
            keys,
            last_result: None,
        }
    }

    /// Replace the body and footer with `lines` and a key hint.
    fn panel(&self, lines: &[(String, Tone)], hint: &str) -> io::Result<u16> {
        let last = self.last_result.clone();
        self.dashboard.with_surface(|s| {
            let (_, height) = s.size();
            s.clear_rows(HEADER_ROWS, height);
            s.put(HEADER_ROWS, 2, "Checksum verification", Tone::Header);
            let mut row = HEADER_ROWS + 2;
            if let Some((text, tone)) = &last {
                s.put(row, 2, text, *tone);
                row += 2;
            }
            for (text, tone) in lines {
                s.put(row, 2, text, *tone);
                row += 1;
            }
            if height > FOOTER_ROWS {
                s.put(height - 1, 2, hint, Tone::Plain);
            }
            s.flush()?;
            Ok(row)
        })
    }

    fn result_line(file: &CompletedFile) -> (String, Tone) {
        let name = &file.display_name;
        match &file.state {
            VerifyState::Verified => (format!("{}: checksum VERIFIED", name), Tone::Success),
            VerifyState::Mismatch => (format!("{}: checksum MISMATCH", name), Tone::Error),
            VerifyState::Failed(reason) => (format!("{}: checksum failed ({})", name, reason), Tone::Error),
            VerifyState::Skipped => (format!("{}: comparison skipped", name), Tone::Warning),
            other => (format!("{}: {}", name, other.name()), Tone::Plain),
        }
    }
}

impl Prompter for TerminalPrompter<'_> {
    fn confirm_start(&mut self, file_count: usize) -> io::Result<Option<bool>> {
        let question = format!("{} file(s) completed. Verify checksums? [y/N]", file_count);
        self.panel(&[(question, Tone::Info)], "[y] Yes   [n] No")?;
        Ok(match self.keys.read_key()? {
            None | Some(Key::Esc) => None,
            Some(Key::Char('y')) | Some(Key::Char('Y')) => Some(true),
            Some(_) => Some(false),
        })
    }

    fn choose_kind(&mut self, file: &CompletedFile, index: usize, total: usize) -> io::Result<KindChoice> {
        let lines = [
            (format!("File {} of {}: {}", index + 1, total, file.display_name), Tone::Plain),
            (format!("Path: {}", file.path.display()), Tone::Plain),
            (String::new(), Tone::Plain),
            ("Select checksum type:".to_string(), Tone::Info),
            ("  1) MD5".to_string(), Tone::Plain),
            ("  2) SHA256".to_string(), Tone::Plain),
            ("  q) Stop verifying".to_string(), Tone::Plain),
        ];
        self.panel(&lines, "[1] MD5   [2] SHA256   [q] Quit")?;
        loop {
            match self.keys.read_key()? {
                Some(Key::Char('1')) => return Ok(KindChoice::Kind(ChecksumKind::Md5)),
                Some(Key::Char('2')) => return Ok(KindChoice::Kind(ChecksumKind::Sha256)),
                None | Some(Key::Esc) | Some(Key::Char('q')) | Some(Key::Char('Q')) => {
                    return Ok(KindChoice::Abort)
                }
                Some(_) => continue,
            }
        }
    }

    fn calculating(&mut self, file: &CompletedFile, kind: ChecksumKind) -> io::Result<()> {
        let line = format!("Calculating {} for {} ...", kind, file.display_name);
        self.panel(&[(line, Tone::Warning)], "please wait")?;
        Ok(())
    }

    fn expected_digest(&mut self, file: &CompletedFile) -> io::Result<Option<String>> {
        let kind = file.kind.map(ChecksumKind::label).unwrap_or("digest");
        let digest = file.digest.clone().unwrap_or_default();
        let lines = [
            (file.display_name.clone(), Tone::Plain),
            (format!("{}: {}", kind, digest), Tone::Success),
            (String::new(), Tone::Plain),
            ("Expected checksum (Enter to skip):".to_string(), Tone::Info),
        ];
        let input_row = self.panel(&lines, "[Enter] Confirm   [Esc] Stop")?;
        let dashboard = self.dashboard;
        terminal::read_line(&mut *self.keys, |buf| {
            dashboard.with_surface(|s| {
                s.clear_rows(input_row, input_row + 1);
                s.put(input_row, 2, &format!("> {}", buf), Tone::Plain);
                s.flush()
            })
        })
    }

    fn report(&mut self, file: &CompletedFile) -> io::Result<()> {
        self.last_result = Some(Self::result_line(file));
        Ok(())
    }

    fn summary(&mut self, summary: &VerifySummary) -> io::Result<()> {
        let lines = [
            ("Verification summary".to_string(), Tone::Info),
            (format!("  Verified: {}", summary.verified), Tone::Success),
            (format!("  Failed:   {}", summary.failed), Tone::Error),
            (format!("  Skipped:  {}", summary.skipped), Tone::Warning),
        ];
        self.panel(&lines, "Press any key to exit")?;
        self.keys.read_key()?;
        Ok(())
    }
}
