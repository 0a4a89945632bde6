//! Command-line surface of the console

pub mod commands;
pub mod session;
