//! Plugin Updater Library
//!
//! A library for keeping server plugin jars up to date from Spigot, GitHub,
//! Jenkins and other artifact hosts, with automatic rollback on failure.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod sources;
pub mod utils;

pub use error::{Error, Result};
