//! Data models.

pub mod backup;
pub mod config;
pub mod list;
pub mod locator;
