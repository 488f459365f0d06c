//! Start command - boot an installed image.

use anyhow::Result;

use crate::config::Config;
use crate::launch::{self, LaunchOptions, StartOutcome};

/// Execute `start`.
pub fn cmd_start(config: &Config, opts: &LaunchOptions) -> Result<StartOutcome> {
    launch::start_vm(config, opts)
}

/// Split the raw `--qemu_extra_args` value into argv tokens.
///
/// Splits on whitespace only; quotes are not interpreted.
pub fn split_extra_args(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
