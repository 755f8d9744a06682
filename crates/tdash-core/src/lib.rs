//! Terminal dashboard for concurrent file transfers with post-transfer
//! checksum verification.

pub mod batch;
pub mod checksum;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod terminal;
pub mod transfer;
pub mod verify;
