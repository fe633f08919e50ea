//! Core business logic modules.

pub mod builder;
pub mod fetcher;
pub mod jitpack;
pub mod rollback;
pub mod updater;
