//! Control channel: a background thread turning key presses into
//! pause/cancel/scroll changes.
//!
//! The loop never blocks on input: each tick it takes at most one pending key
//! and then sleeps for the poll interval. Stopping clears the running flag and
//! joins the thread, so nothing reads shared state after `stop` returns.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::registry::Dashboard;
use crate::terminal::KeyInput;

pub struct ControlChannel {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Box<dyn KeyInput>>>,
}

impl ControlChannel {
    /// Spawn the polling thread. The key source is handed back by [`stop`](Self::stop).
    pub fn start(
        dashboard: Dashboard,
        keys: Box<dyn KeyInput>,
        interval: Duration,
    ) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("tdash-control".to_string())
            .spawn(move || run_loop(dashboard, keys, flag, interval))?;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "control channel started");
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the thread and wait for it to exit. Returns the key source, or
    /// `None` if the thread panicked.
    pub fn stop(mut self) -> Option<Box<dyn KeyInput>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Box<dyn KeyInput>> {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(keys) => {
                tracing::debug!("control channel stopped");
                Some(keys)
            }
            Err(_) => {
                tracing::error!("control channel thread panicked");
                None
            }
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run_loop(
    dashboard: Dashboard,
    mut keys: Box<dyn KeyInput>,
    running: Arc<AtomicBool>,
    interval: Duration,
) -> Box<dyn KeyInput> {
    let mut input_failed = false;
    while running.load(Ordering::Acquire) {
        match keys.poll_key(Duration::ZERO) {
            Ok(Some(key)) => {
                dashboard.handle_key(key);
            }
            Ok(None) => {}
            Err(e) => {
                if !input_failed {
                    tracing::warn!("control input error: {}", e);
                    input_failed = true;
                }
            }
        }
        thread::sleep(interval);
    }
    keys
}
