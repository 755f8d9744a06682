//! Dashboard lifecycle: start, wait for the user, verify, shut down.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::control::ControlChannel;
use super::registry::Dashboard;
use crate::checksum::Digester;
use crate::config::DashConfig;
use crate::terminal::{KeyInput, Tone};
use crate::verify::{self, TerminalPrompter, WorkflowOutcome};

/// Owns the control channel and the key source for one dashboard run.
/// Producers only ever see the [`Dashboard`] handle.
pub struct Session {
    dashboard: Dashboard,
    digester: Arc<dyn Digester>,
    control: Option<ControlChannel>,
    keys: Option<Box<dyn KeyInput>>,
    config: DashConfig,
    closed: bool,
}

impl Session {
    pub fn start(
        config: DashConfig,
        surface: Box<dyn crate::terminal::Surface>,
        keys: Box<dyn KeyInput>,
        digester: Arc<dyn Digester>,
    ) -> Result<Self> {
        let dashboard = Dashboard::new(surface, Arc::clone(&digester), &config);
        dashboard.redraw(true);
        let control = ControlChannel::start(dashboard.clone(), keys, config.control_poll_interval())
            .context("spawn control channel")?;
        tracing::info!("dashboard session started");
        Ok(Self {
            dashboard,
            digester,
            control: Some(control),
            keys: None,
            config,
            closed: false,
        })
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Stop the control channel (if running) and take the key source back.
    fn stop_control(&mut self) {
        if let Some(control) = self.control.take() {
            self.keys = control.stop();
        }
    }

    /// Show the completion banner and wait up to `completion_wait_secs` for a
    /// key. Returns true if a key was pressed, false if the wait expired.
    pub fn wait_for_completion(&mut self) -> Result<bool> {
        self.stop_control();
        let wait = self.config.completion_wait();
        self.dashboard.redraw(true);
        let message = format!(
            "All transfers finished. Press any key to continue (auto in {}s)",
            wait.as_secs()
        );
        self.dashboard.with_surface(|s| {
            let (_, height) = s.size();
            let row = height.saturating_sub(1);
            s.clear_rows(row, row + 1);
            s.put(row, 2, &message, Tone::Warning);
            s.flush()
        })?;

        let Some(keys) = self.keys.as_mut() else {
            return Ok(false);
        };
        let deadline = Instant::now() + wait;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                tracing::debug!("completion wait expired");
                return Ok(false);
            }
            if keys.poll_key(left.min(Duration::from_millis(250)))?.is_some() {
                return Ok(true);
            }
        }
    }

    /// Run the interactive checksum workflow over the completed files.
    pub fn verify(&mut self) -> Result<WorkflowOutcome> {
        self.stop_control();
        let files = self.dashboard.completed_files();
        let Some(keys) = self.keys.as_mut() else {
            anyhow::bail!("no key input available for verification prompts");
        };
        let mut prompter = TerminalPrompter::new(&self.dashboard, keys.as_mut());
        let outcome = verify::run_workflow(files, &mut prompter, self.digester.as_ref())?;
        Ok(outcome)
    }

    /// Stop the control channel, clear all state, restore the terminal.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stop_control();
        self.dashboard.teardown();
        tracing::info!("dashboard session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
