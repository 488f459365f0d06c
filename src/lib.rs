//! qvm library exports.
//!
//! The binary in `main.rs` is a thin clap front end over these modules;
//! integration tests drive them directly.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod launch;
pub mod port;
pub mod process;
pub mod provision;
