//! CLI command implementations.

pub mod list;
pub mod pending;
pub mod update;
pub mod watch;
