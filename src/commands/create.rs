//! Create commands - allocate a disk and boot an installer.

use anyhow::Result;
use std::path::Path;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::provision::{CreateReport, Provisioner};

/// Execute `create_from_iso`.
pub fn cmd_create_from_iso(
    config: &Config,
    catalog: &Catalog,
    name: &str,
    size: u32,
    iso_path: &Path,
) -> Result<CreateReport> {
    let report = Provisioner::new(config, catalog).create_vm_from_iso(name, size, iso_path)?;
    log_report(&report);
    Ok(report)
}

/// Execute `create`.
pub fn cmd_create(
    config: &Config,
    catalog: &Catalog,
    name: &str,
    size: u32,
    distrib: &str,
) -> Result<Option<CreateReport>> {
    let report = Provisioner::new(config, catalog).create_vm(name, size, distrib)?;
    if let Some(report) = &report {
        log_report(report);
    }
    Ok(report)
}

fn log_report(report: &CreateReport) {
    tracing::info!(
        image = %report.image.display(),
        download = ?report.download.and_then(|s| s.code()),
        disk = ?report.disk.code(),
        install = ?report.install.code(),
        success = report.success(),
        "create finished"
    );
}
