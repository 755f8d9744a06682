//! Shared fixtures: source files on disk and an in-memory session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tdash_core::checksum::FileDigester;
use tdash_core::config::DashConfig;
use tdash_core::dashboard::Session;
use tdash_core::terminal::{MemorySurface, ScriptedKeys};

pub fn write_source(dir: &Path, name: &str, len: usize) -> PathBuf {
    let body: Vec<u8> = (0u8..251).cycle().take(len).collect();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

pub fn test_config() -> DashConfig {
    DashConfig {
        control_poll_ms: 1,
        completion_wait_secs: 0,
        copy_buffer_bytes: 4096,
        ..DashConfig::default()
    }
}

pub fn start_session(cfg: DashConfig) -> (Session, MemorySurface, ScriptedKeys) {
    let surface = MemorySurface::new(120, 40);
    let keys = ScriptedKeys::default();
    let session = Session::start(
        cfg,
        Box::new(surface.clone()),
        Box::new(keys.clone()),
        Arc::new(FileDigester),
    )
    .expect("session starts");
    (session, surface, keys)
}

pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
