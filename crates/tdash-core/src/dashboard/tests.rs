use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::checksum::{ChecksumError, ChecksumKind, Digester, FileDigester};
use crate::config::DashConfig;
use crate::terminal::{Key, MemorySurface};

const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

fn dashboard_with(cfg: &DashConfig, width: u16, height: u16) -> (Dashboard, MemorySurface) {
    let surface = MemorySurface::new(width, height);
    let dash = Dashboard::new(Box::new(surface.clone()), Arc::new(FileDigester), cfg);
    (dash, surface)
}

fn dashboard() -> (Dashboard, MemorySurface) {
    dashboard_with(&DashConfig::default(), 80, 24)
}

struct BrokenDigester;

impl Digester for BrokenDigester {
    fn digest(&self, _kind: ChecksumKind, path: &Path) -> Result<String, ChecksumError> {
        Err(ChecksumError::Open {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}

#[test]
fn updates_accumulate_and_finish_completes() {
    let (dash, surface) = dashboard();
    let h = dash.create("ubuntu.iso", 0, 1000);
    for delta in [300, 300, 400] {
        dash.update(h, delta, 0.0);
        dash.draw();
    }
    assert_eq!(dash.snapshot(h).unwrap().current_bytes, 1000);

    dash.finish(h);
    let entry = dash.snapshot(h).unwrap();
    assert!(!entry.active);
    assert_eq!(entry.current_bytes, 1000);
    assert_eq!(entry.percent(), 100.0);
    assert_eq!(dash.active_count(), 0);
    assert!(surface.contents().contains("Download Complete"));
}

#[test]
fn finish_with_unknown_total_takes_current() {
    let (dash, _surface) = dashboard();
    let h = dash.create("stream.bin", 0, 0);
    dash.update(h, 4096, 0.0);
    dash.finish(h);
    let entry = dash.snapshot(h).unwrap();
    assert_eq!(entry.total_bytes, 4096);
    assert_eq!(entry.current_bytes, 4096);
}

#[test]
fn scrolling_twelve_entries() {
    let (dash, surface) = dashboard_with(&DashConfig::default(), 80, 21);
    for i in 0..12 {
        dash.create(&format!("file-{i:02}.bin"), 0, 100);
    }
    assert_eq!(dash.visible_capacity(), 4);
    assert!(surface.row_text(1).contains("[1-4 of 12]"));
    assert!(surface.contents().contains("file-00.bin"));
    assert!(!surface.contents().contains("file-04.bin"));

    for _ in 0..20 {
        dash.handle_key(Key::Down);
    }
    assert_eq!(dash.scroll_offset(), 8);
    assert!(surface.row_text(1).contains("[9-12 of 12]"));
    assert!(surface.contents().contains("file-11.bin"));

    assert!(dash.handle_key(Key::Char('k')));
    assert_eq!(dash.scroll_offset(), 7);
}

#[test]
fn cancel_clears_pause_and_shows_badge() {
    let (dash, surface) = dashboard();
    dash.create("a", 0, 10);
    dash.toggle_pause();
    assert!(dash.is_paused());
    assert!(surface.row_text(1).contains("PAUSED"));

    dash.cancel();
    assert!(dash.is_cancelled());
    assert!(!dash.is_paused());
    assert!(surface.row_text(1).contains("CANCELLING..."));
}

#[test]
fn duplicate_completed_path_counts_once() {
    let (dash, _surface) = dashboard();
    assert!(dash.register_completed_file("a.iso", "/srv/a.iso"));
    assert!(!dash.register_completed_file("a.iso", "/srv/a.iso"));
    assert_eq!(dash.completed_file_count(), 1);
}

#[test]
fn finish_with_checksum_verifies_ignoring_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.txt");
    std::fs::write(&path, b"hello\n").unwrap();

    let (dash, surface) = dashboard_with(&DashConfig::default(), 120, 24);
    let expected = HELLO_SHA256.to_uppercase();
    let h = dash.create_with_checksum(
        "hello.txt",
        Some(&path),
        0,
        6,
        Some(ChecksumKind::Sha256),
        Some(&expected),
    );
    dash.update(h, 6, 0.0);
    dash.finish_with_checksum(h);

    assert_eq!(dash.checksum(h).as_deref(), Some(HELLO_SHA256));
    assert!(dash.is_checksum_verified(h));
    assert!(surface.contents().contains("[VERIFIED]"));
}

#[test]
fn finish_with_checksum_records_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.txt");
    std::fs::write(&path, b"hello\n").unwrap();

    let (dash, surface) = dashboard_with(&DashConfig::default(), 120, 24);
    let h = dash.create_with_checksum(
        "hello.txt",
        Some(&path),
        0,
        6,
        Some(ChecksumKind::Sha256),
        Some("00ff"),
    );
    dash.finish_with_checksum(h);
    assert!(!dash.is_checksum_verified(h));
    assert!(dash.snapshot(h).unwrap().digest_computed);
    assert!(surface.contents().contains("[MISMATCH]"));
}

#[test]
fn digest_failure_is_recorded_not_fatal() {
    let surface = MemorySurface::new(80, 24);
    let dash = Dashboard::new(
        Box::new(surface.clone()),
        Arc::new(BrokenDigester),
        &DashConfig::default(),
    );
    let h = dash.create_with_checksum(
        "secret.bin",
        Some(Path::new("/nonexistent/secret.bin")),
        0,
        10,
        Some(ChecksumKind::Md5),
        None,
    );
    dash.finish_with_checksum(h);

    let entry = dash.snapshot(h).unwrap();
    assert!(!entry.digest_computed);
    assert!(entry.digest_error.is_some());
    assert!(dash.checksum(h).is_none());
    assert!(!dash.is_checksum_verified(h));
    assert!(surface.contents().contains("checksum failed"));
}

#[test]
fn finish_with_checksum_without_kind_only_finishes() {
    let (dash, _surface) = dashboard();
    let h = dash.create("plain", 0, 5);
    dash.finish_with_checksum(h);
    assert!(!dash.snapshot(h).unwrap().active);
    assert!(dash.checksum(h).is_none());
}

#[test]
fn stale_handle_is_ignored() {
    let (dash, _surface) = dashboard();
    let old = dash.create("first", 0, 10);
    dash.finish(old);
    let new = dash.create("second", 0, 10);
    assert_eq!(old.slot(), new.slot());

    dash.update(old, 5, 0.0);
    dash.finish(old);
    let entry = dash.snapshot(new).unwrap();
    assert_eq!(entry.filename, "second");
    assert_eq!(entry.current_bytes, 0);
    assert!(entry.active);
    assert!(dash.snapshot(old).is_none());
}

#[test]
fn detached_handle_is_a_noop() {
    let (dash, _surface) = dashboard();
    let h = EntryHandle::DETACHED;
    dash.update(h, 10, 0.0);
    dash.finish(h);
    assert!(dash.snapshot(h).is_none());
    assert_eq!(dash.entry_count(), 0);
}

#[test]
fn is_active_tracks_entries_until_teardown() {
    let (dash, surface) = dashboard();
    assert!(!dash.is_active());
    let h = dash.create("a", 0, 1);
    assert!(dash.is_active());
    dash.finish(h);
    assert!(dash.is_active());

    dash.teardown();
    assert!(!dash.is_active());
    assert_eq!(dash.entry_count(), 0);
    assert!(surface.is_released());
}

#[test]
fn wait_while_paused_wakes_on_resume_and_cancel() {
    let (dash, _surface) = dashboard();
    assert_eq!(dash.wait_while_paused(), Flow::Continue);

    dash.toggle_pause();
    let waiter = {
        let dash = dash.clone();
        thread::spawn(move || dash.wait_while_paused())
    };
    thread::sleep(Duration::from_millis(20));
    dash.toggle_pause();
    assert_eq!(waiter.join().unwrap(), Flow::Continue);

    dash.toggle_pause();
    let waiter = {
        let dash = dash.clone();
        thread::spawn(move || dash.wait_while_paused())
    };
    thread::sleep(Duration::from_millis(20));
    dash.cancel();
    assert_eq!(waiter.join().unwrap(), Flow::Cancelled);
}

#[test]
fn teardown_wakes_paused_producers() {
    let (dash, _surface) = dashboard();
    dash.toggle_pause();
    let waiter = {
        let dash = dash.clone();
        thread::spawn(move || dash.wait_while_paused())
    };
    thread::sleep(Duration::from_millis(20));
    dash.teardown();
    assert_eq!(waiter.join().unwrap(), Flow::Cancelled);
}

#[test]
fn concurrent_producers_lose_no_updates() {
    let (dash, _surface) = dashboard();
    let handles: Vec<EntryHandle> = (0..8)
        .map(|i| dash.create(&format!("part-{i}"), 0, 1000))
        .collect();
    let mut slots: Vec<usize> = handles.iter().map(|h| h.slot()).collect();
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), 8);

    let producers: Vec<_> = handles
        .iter()
        .map(|&h| {
            let dash = dash.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    dash.update(h, 10, 0.0);
                    dash.draw();
                }
            })
        })
        .collect();
    for t in producers {
        t.join().unwrap();
    }

    for &h in &handles {
        assert_eq!(dash.snapshot(h).unwrap().current_bytes, 1000);
        dash.finish(h);
    }
    assert_eq!(dash.active_count(), 0);
}

#[test]
fn unforced_draws_are_throttled() {
    let cfg = DashConfig {
        redraw_interval_ms: 60_000,
        ..DashConfig::default()
    };
    let (dash, surface) = dashboard_with(&cfg, 80, 24);
    let h = dash.create("a", 0, 100);
    let after_create = surface.flush_count();

    dash.update(h, 10, 0.0);
    dash.draw();
    assert_eq!(surface.flush_count(), after_create);

    dash.finish(h);
    assert_eq!(surface.flush_count(), after_create + 1);
}

#[test]
fn unthrottled_draw_always_renders() {
    let (dash, surface) = dashboard();
    let h = dash.create("a", 0, 100);
    let before = surface.flush_count();
    dash.update(h, 10, 0.0);
    dash.draw();
    dash.draw();
    assert_eq!(surface.flush_count(), before + 2);
}

#[test]
fn elapsed_hint_drives_rate() {
    let (dash, _surface) = dashboard();
    let h = dash.create("a", 0, 1000);
    dash.update(h, 500, 2.0);
    let entry = dash.snapshot(h).unwrap();
    let now = Instant::now();
    assert_eq!(entry.bytes_per_sec(now), 250.0);
    assert_eq!(entry.eta_secs(now), Some(2.0));
}

#[test]
fn unknown_keys_change_nothing() {
    let (dash, surface) = dashboard();
    dash.create("a", 0, 1);
    let before = surface.flush_count();
    assert!(!dash.handle_key(Key::Char('x')));
    assert!(!dash.handle_key(Key::Up));
    assert_eq!(surface.flush_count(), before);
}

#[test]
fn filepath_set_after_create_is_hashed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.txt");
    std::fs::write(&path, b"hello\n").unwrap();

    let (dash, _surface) = dashboard();
    let h = dash.create_with_checksum("late.txt", None, 0, 6, Some(ChecksumKind::Sha256), None);
    dash.set_filepath(h, &path);
    dash.set_filepath(h, &path);
    dash.finish_with_checksum(h);

    assert_eq!(dash.checksum(h).as_deref(), Some(HELLO_SHA256));
    assert!(!dash.is_checksum_verified(h));
}

#[test]
fn stopped_entry_is_inactive_and_keeps_its_bytes() {
    let (dash, surface) = dashboard();
    let h = dash.create("partial.bin", 0, 1000);
    dash.update(h, 300, 0.0);
    dash.stop(h, "Cancelled");

    let entry = dash.snapshot(h).unwrap();
    assert!(!entry.active);
    assert_eq!(entry.current_bytes, 300);
    assert_eq!(entry.total_bytes, 1000);
    assert_eq!(dash.active_count(), 0);
    assert!(surface.row_text(1).contains("Active: 0"));
    assert!(surface.contents().contains("STOPPED"));
    assert!(!surface.contents().contains("Download Complete"));

    let next = dash.create("next.bin", 0, 10);
    assert_eq!(next.slot(), h.slot());
    dash.stop(h, "Failed");
    assert!(dash.snapshot(next).unwrap().active);
}
