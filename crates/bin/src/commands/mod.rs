//! Subcommand implementations.

pub mod heads;
pub mod history;
pub mod merge;
pub mod new;
pub mod show;
