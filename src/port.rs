//! Free local TCP port lookup.
//!
//! Not used when starting a VM (the VNC port is derived from the SSH
//! port), kept for scripting around qvm.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};

use crate::config::Config;
use crate::error::QvmError;

/// First port tried by [`get_available_port`].
pub const BASE_PORT: u16 = 3132;

/// Scan upward from [`BASE_PORT`] to `limit` (inclusive) and return the
/// first port nothing on 127.0.0.1 accepts connections on.
pub fn get_available_port(limit: u16) -> Result<u16, QvmError> {
    for port in BASE_PORT..=limit {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        if TcpStream::connect(addr).is_ok() {
            tracing::debug!(port, "port is already in use");
            continue;
        }
        tracing::debug!(port, "port is available");
        return Ok(port);
    }
    Err(QvmError::NoFreePort {
        start: BASE_PORT,
        end: limit,
    })
}

/// [`get_available_port`] bounded by the configured port limit.
pub fn available_port(config: &Config) -> Result<u16, QvmError> {
    get_available_port(config.port_limit)
}
