//! CLI components for the pollster survey platform.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod workspace;
