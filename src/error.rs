//! Typed error conditions surfaced by the library.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QvmError {
    #[error("Distribution not supported")]
    UnsupportedDistribution { name: String },

    #[error("no free port in range {start}..={end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("ssh port {ssh_port} leaves no room for a VNC port")]
    VncPortOverflow { ssh_port: u16 },
}
