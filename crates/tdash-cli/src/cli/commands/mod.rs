//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod copy;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use copy::{run_copy, CopyArgs};
