//! Install-image provisioning.
//!
//! Resolves a distribution to its cached installer ISO (downloading it
//! when absent), allocates a qcow2 disk with `qemu-img` and boots the
//! installer in QEMU with that disk attached.
//!
//! Exit statuses of the tools are handed back to the caller but never
//! stop the flow: an installer session that ends with a non-zero status
//! is common and not treated as a failure here.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::catalog::{Catalog, CatalogEntry, Distribution};
use crate::config::Config;
use crate::error::QvmError;
use crate::process::Cmd;

/// Memory given to the installer VM, in MB.
pub const INSTALL_MEM_MB: u32 = 4000;

/// Printed when a distribution name is not in the catalog.
pub const UNSUPPORTED_MSG: &str = "Distribution not supported";

/// Filename of the disk created for a VM.
pub fn image_filename(name: &str, size_gb: u32) -> String {
    format!("{}.size{}G.qcow2", name, size_gb)
}

/// Exit statuses of the steps of a create flow.
#[derive(Debug, Clone)]
pub struct CreateReport {
    /// Path of the created qcow2 disk.
    pub image: PathBuf,
    /// Downloader status, `None` when no download ran.
    pub download: Option<ExitStatus>,
    /// `qemu-img create` status.
    pub disk: ExitStatus,
    /// Installer session status.
    pub install: ExitStatus,
}

impl CreateReport {
    pub fn success(&self) -> bool {
        let downloaded = self.download.map_or(true, |s| s.success());
        downloaded && self.disk.success() && self.install.success()
    }
}

/// Drives the downloader, `qemu-img` and the installer boot.
pub struct Provisioner<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
}

impl<'a> Provisioner<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self { config, catalog }
    }

    /// Where the cached ISO for a catalog entry lives.
    pub fn iso_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.config.work_dir.join(entry.filename)
    }

    fn resolve(&self, dist: &str) -> Option<(Distribution, &'a CatalogEntry)> {
        match self.catalog.lookup(dist) {
            Ok(found) => Some(found),
            Err(err) => {
                if let QvmError::UnsupportedDistribution { name } = &err {
                    tracing::info!(%name, "distribution not in catalog");
                }
                None
            }
        }
    }

    /// True iff the cached ISO for `dist` is on disk.
    pub fn iso_exists(&self, dist: &str) -> bool {
        match self.resolve(dist) {
            Some((_, entry)) => self.iso_path(entry).exists(),
            None => false,
        }
    }

    /// Download the ISO for `dist` into the work directory.
    ///
    /// Returns `None` (after printing a notice) if `dist` is unsupported.
    pub fn download_iso(&self, dist: &str) -> Result<Option<ExitStatus>> {
        let Some((dist, entry)) = self.resolve(dist) else {
            println!("{}", UNSUPPORTED_MSG);
            return Ok(None);
        };
        self.download(dist, entry).map(Some)
    }

    fn download(&self, dist: Distribution, entry: &CatalogEntry) -> Result<ExitStatus> {
        let iso_path = self.iso_path(entry);
        println!("Downloading {} installer...", dist);
        println!("URL: {}", entry.url);

        let status = Cmd::new(&self.config.downloader)
            .arg(entry.url)
            .arg("-O")
            .arg_path(&iso_path)
            .allow_fail()
            .run_interactive()?;

        if !status.success() {
            tracing::warn!(%dist, code = ?status.code(), "download exited non-zero");
        }
        Ok(status)
    }

    /// Create a disk named after `name`/`size_gb` and boot the installer
    /// from `iso_path`. Blocks until the installer VM exits.
    pub fn create_vm_from_iso(
        &self,
        name: &str,
        size_gb: u32,
        iso_path: &Path,
    ) -> Result<CreateReport> {
        let image = self.config.work_dir.join(image_filename(name, size_gb));

        let disk = Cmd::new(&self.config.qemu_img)
            .args(["create", "-f", "qcow2"])
            .arg_path(&image)
            .arg(format!("{}G", size_gb))
            .allow_fail()
            .run_interactive()?;
        if !disk.success() {
            tracing::warn!(
                image = %image.display(),
                code = ?disk.code(),
                "qemu-img exited non-zero"
            );
        }

        let install = installer_command(&self.config.qemu, &image, iso_path)
            .allow_fail()
            .run_interactive()?;
        if !install.success() {
            tracing::warn!(code = ?install.code(), "installer session exited non-zero");
        }

        Ok(CreateReport {
            image,
            download: None,
            disk,
            install,
        })
    }

    /// Create a VM from a catalog distribution, downloading its ISO first
    /// if it is not cached.
    ///
    /// Returns `None` (after printing a notice) if `dist` is unsupported.
    pub fn create_vm(
        &self,
        name: &str,
        size_gb: u32,
        dist: &str,
    ) -> Result<Option<CreateReport>> {
        let Some((dist, entry)) = self.resolve(dist) else {
            println!("{}", UNSUPPORTED_MSG);
            return Ok(None);
        };

        let iso_path = self.iso_path(entry);
        let download = if iso_path.exists() {
            tracing::info!(iso = %iso_path.display(), "using cached ISO");
            None
        } else {
            Some(self.download(dist, entry)?)
        };

        let mut report = self.create_vm_from_iso(name, size_gb, &iso_path)?;
        report.download = download;
        Ok(Some(report))
    }
}

/// QEMU invocation booting `iso_path` as CD-ROM with `image` as first disk.
pub fn installer_command(qemu: &str, image: &Path, iso_path: &Path) -> Cmd {
    Cmd::new(qemu)
        .arg("-enable-kvm")
        .arg("-hda")
        .arg_path(image)
        .arg("-cdrom")
        .arg_path(iso_path)
        .args(["-m", &INSTALL_MEM_MB.to_string()])
        .args(["-boot", "d"])
        .args(["-net", "user"])
        .args(["-net", "nic,model=ne2k_pci"])
        .arg("-enable-kvm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_filename() {
        assert_eq!(image_filename("test", 10), "test.size10G.qcow2");
        assert_eq!(image_filename("build-box", 256), "build-box.size256G.qcow2");
    }

    #[test]
    fn test_installer_command_order() {
        let cmd = installer_command(
            "qemu-system-x86_64",
            Path::new("test.size10G.qcow2"),
            Path::new("debian.iso"),
        );
        assert_eq!(
            cmd.display(),
            "qemu-system-x86_64 -enable-kvm -hda test.size10G.qcow2 -cdrom debian.iso \
             -m 4000 -boot d -net user -net nic,model=ne2k_pci -enable-kvm"
        );
    }
}
