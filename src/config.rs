//! Configuration management for qvm.
//!
//! Reads configuration from environment variables. `main` loads a `.env`
//! file first (via dotenvy), so values there act as defaults that real
//! environment variables override.

use std::collections::HashMap;
use std::path::PathBuf;

/// Default hypervisor binary.
pub const DEFAULT_QEMU: &str = "qemu-system-x86_64";
/// Default disk-image tool.
pub const DEFAULT_QEMU_IMG: &str = "qemu-img";
/// Default HTTP downloader. Invoked as `<downloader> <url> -O <file>`.
pub const DEFAULT_DOWNLOADER: &str = "wget";
/// Highest port the free-port search will try.
pub const DEFAULT_PORT_LIMIT: u16 = u16::MAX;

/// qvm configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hypervisor program (QVM_QEMU)
    pub qemu: String,
    /// Disk-image program (QVM_QEMU_IMG)
    pub qemu_img: String,
    /// Downloader program (QVM_DOWNLOADER)
    pub downloader: String,
    /// Directory holding ISOs and created disks (QVM_WORK_DIR)
    pub work_dir: PathBuf,
    /// Upper bound for the free-port search (QVM_PORT_LIMIT)
    pub port_limit: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qemu: DEFAULT_QEMU.to_string(),
            qemu_img: DEFAULT_QEMU_IMG.to_string(),
            downloader: DEFAULT_DOWNLOADER.to_string(),
            work_dir: PathBuf::from("."),
            port_limit: DEFAULT_PORT_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build a config from an explicit variable map, falling back to defaults.
    pub fn from_vars(env_vars: HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            env_vars
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let port_limit = match get("QVM_PORT_LIMIT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = raw, "ignoring invalid QVM_PORT_LIMIT");
                defaults.port_limit
            }),
            None => defaults.port_limit,
        };

        Self {
            qemu: get("QVM_QEMU").map(str::to_string).unwrap_or(defaults.qemu),
            qemu_img: get("QVM_QEMU_IMG")
                .map(str::to_string)
                .unwrap_or(defaults.qemu_img),
            downloader: get("QVM_DOWNLOADER")
                .map(str::to_string)
                .unwrap_or(defaults.downloader),
            work_dir: get("QVM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            port_limit,
        }
    }

    /// Log the resolved configuration.
    pub fn print(&self) {
        tracing::debug!(
            qemu = %self.qemu,
            qemu_img = %self.qemu_img,
            downloader = %self.downloader,
            work_dir = %self.work_dir.display(),
            port_limit = self.port_limit,
            "configuration"
        );
    }
}
