//! Live multi-transfer dashboard.
//!
//! Producers (one thread per transfer) call the registry operations on a
//! shared [`Dashboard`]; every structural change redraws the whole frame via
//! the compositor. A [`ControlChannel`] thread turns key presses into
//! pause/cancel/scroll changes, and a [`Session`] ties the pieces together and
//! tears them down in order:
//! control channel first (outside the lock), then state, then the terminal.

mod completed;
pub mod compositor;
mod control;
mod entry;
mod registry;
mod session;
mod state;

pub use completed::{CompletedFile, CompletedFiles};
pub use control::ControlChannel;
pub use entry::{EntryHandle, ProgressEntry};
pub use registry::{Dashboard, Flow};
pub use session::Session;
pub use state::{DashState, UiState, MAX_ENTRIES};

#[cfg(test)]
mod tests;
