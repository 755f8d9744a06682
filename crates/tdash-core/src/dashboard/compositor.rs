//! Frame composition: header, scrollable entry list, footer.
//!
//! `render` reads the shared state and the surface geometry only, so calling
//! it twice without a state change draws the same frame (apart from the rate
//! column, which moves with the clock).

use std::io;
use std::time::Instant;

use super::entry::ProgressEntry;
use super::state::DashState;
use crate::terminal::{Surface, Tone};

pub const HEADER_ROWS: u16 = 3;
pub const FOOTER_ROWS: u16 = 2;
pub const ROWS_PER_ENTRY: u16 = 4;

const TITLE: &str = " tdash - Transfer Dashboard ";
const MARGIN: u16 = 2;
const MIN_BAR_WIDTH: usize = 10;

/// Entries that fit between header and footer (at least one).
pub fn visible_capacity(height: u16) -> usize {
    let body = height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);
    usize::from(body / ROWS_PER_ENTRY).max(1)
}

/// Draw the full frame and flush it.
pub fn render(state: &mut DashState, surface: &mut dyn Surface, now: Instant) -> io::Result<()> {
    let (width, height) = surface.size();
    state.ui.visible_capacity = visible_capacity(height);
    state.clamp_scroll();

    draw_header(state, surface, width);
    draw_footer(state, surface, width, height);

    let body_bottom = height.saturating_sub(FOOTER_ROWS);
    surface.clear_rows(HEADER_ROWS, body_bottom);
    let visible = state
        .entries()
        .skip(state.ui.scroll_offset)
        .take(state.ui.visible_capacity);
    for (i, entry) in visible.enumerate() {
        let top = HEADER_ROWS + (i as u16) * ROWS_PER_ENTRY;
        if entry.active {
            draw_progress(entry, surface, top, width, now);
        } else {
            draw_done(entry, surface, top);
        }
    }

    surface.flush()
}

fn draw_header(state: &DashState, surface: &mut dyn Surface, width: u16) {
    surface.clear_rows(0, HEADER_ROWS);
    surface.put(0, 0, &pad(TITLE, width), Tone::Header);

    let ui = state.ui();
    let (badge, tone) = if ui.cancelled {
        ("CANCELLING...", Tone::Error)
    } else if ui.paused {
        ("PAUSED", Tone::Warning)
    } else {
        ("RUNNING", Tone::Success)
    };
    let status = format!("Active: {}", state.active_count());
    surface.put(1, MARGIN, &status, Tone::Info);
    let badge_col = MARGIN + status.len() as u16 + 3;
    surface.put(1, badge_col, badge, tone);

    let count = state.entry_count();
    if count > ui.visible_capacity {
        let first = ui.scroll_offset + 1;
        let last = (ui.scroll_offset + ui.visible_capacity).min(count);
        let indicator = format!("[{}-{} of {}]", first, last, count);
        surface.put(1, badge_col + badge.len() as u16 + 3, &indicator, Tone::Plain);
    }

    surface.put(2, 0, &"-".repeat(usize::from(width)), Tone::Plain);
}

fn draw_footer(state: &DashState, surface: &mut dyn Surface, width: u16, height: u16) {
    if height < FOOTER_ROWS {
        return;
    }
    let top = height - FOOTER_ROWS;
    surface.clear_rows(top, height);
    surface.put(top, 0, &"-".repeat(usize::from(width)), Tone::Plain);
    let legend = if state.ui().paused {
        "[p] Resume   [c/Esc] Cancel   [j/k] Scroll"
    } else {
        "[p] Pause   [c/Esc] Cancel   [j/k] Scroll"
    };
    surface.put(top + 1, MARGIN, legend, Tone::Plain);
}

fn draw_progress(entry: &ProgressEntry, surface: &mut dyn Surface, top: u16, width: u16, now: Instant) {
    surface.put(top, MARGIN, &entry_title(entry), Tone::Plain);

    let bar_width = usize::from(width.saturating_sub(MARGIN * 2)).max(MIN_BAR_WIDTH);
    surface.put(top + 1, MARGIN, &progress_bar(entry.fraction(), bar_width), Tone::Bar);

    let rate = entry.bytes_per_sec(now);
    let mut stats = format!(
        "{:5.1}%   {} / {}   {}",
        entry.percent(),
        format_bytes(entry.current_bytes),
        if entry.total_bytes > 0 {
            format_bytes(entry.total_bytes)
        } else {
            "?".to_string()
        },
        format_rate(rate)
    );
    if let Some(eta) = entry.eta_secs(now) {
        stats.push_str("   ETA ");
        stats.push_str(&format_eta(eta));
    }
    surface.put(top + 2, MARGIN, &stats, Tone::Info);
}

fn draw_done(entry: &ProgressEntry, surface: &mut dyn Surface, top: u16) {
    surface.put(top, MARGIN, &entry_title(entry), Tone::Plain);
    if let Some(reason) = &entry.stopped {
        surface.put(top + 1, MARGIN, "STOPPED", Tone::Warning);
        let line = format!("{}   {}", reason, format_bytes(entry.current_bytes));
        surface.put(top + 2, MARGIN, &line, Tone::Warning);
        return;
    }
    surface.put(top + 1, MARGIN, "DONE", Tone::Success);
    let complete = format!("Download Complete   {}", format_bytes(entry.current_bytes));
    surface.put(top + 2, MARGIN, &complete, Tone::Success);
    if let Some((line, tone)) = checksum_line(entry) {
        surface.put(top + 3, MARGIN, &line, tone);
    }
}

fn entry_title(entry: &ProgressEntry) -> String {
    format!("{} ({})", entry.filename, entry.slot)
}

fn checksum_line(entry: &ProgressEntry) -> Option<(String, Tone)> {
    let kind = entry.checksum_kind?;
    if let Some(err) = &entry.digest_error {
        return Some((format!("{}: checksum failed ({})", kind, err), Tone::Error));
    }
    let digest = entry.digest.as_deref()?;
    let line = match (&entry.expected_digest, entry.verified) {
        (Some(_), true) => (format!("{}: {} [VERIFIED]", kind, digest), Tone::Success),
        (Some(_), false) => (format!("{}: {} [MISMATCH]", kind, digest), Tone::Error),
        (None, _) => (format!("{}: {}", kind, digest), Tone::Info),
    };
    Some(line)
}

fn pad(text: &str, width: u16) -> String {
    format!("{:<w$}", text, w = usize::from(width))
}

/// `[####    ]` with `width` cells in total, brackets included.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let inner = width.saturating_sub(2);
    let filled = ((fraction.clamp(0.0, 1.0)) * inner as f64) as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(inner - filled))
}

/// `HH:MM:SS`; hours keep growing past 99.
pub fn format_eta(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: [(&str, f64); 4] = [
        ("B/s", 1.0),
        ("KiB/s", 1024.0),
        ("MiB/s", 1024.0 * 1024.0),
        ("GiB/s", 1024.0 * 1024.0 * 1024.0),
    ];
    let mut value = bytes_per_sec;
    let mut unit = "B/s";
    for (label, threshold) in UNITS.iter() {
        if bytes_per_sec >= *threshold {
            value = bytes_per_sec / *threshold;
            unit = label;
        } else {
            break;
        }
    }
    format!("{value:.2} {unit}")
}

pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB * KIB {
        format!("{:.2} GiB", b / (KIB * KIB * KIB))
    } else if b >= KIB * KIB {
        format!("{:.2} MiB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}
