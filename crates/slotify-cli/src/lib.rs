//! Meeting slot planner CLI library.
//!
//! This crate provides the command implementations behind the `slotify`
//! binary.

mod cli;
pub mod commands;
mod config;
pub mod render;

pub use cli::{Cli, Commands};
pub use config::Config;
