//! Starting an installed VM image under QEMU.
//!
//! [`LaunchPlan`] is the pure part: it turns [`LaunchOptions`] into the
//! hypervisor argv. [`start_vm`] runs that argv and reports the outcome.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::config::Config;
use crate::error::QvmError;
use crate::process::Cmd;

pub const DEFAULT_SSH_PORT: u16 = 2222;
pub const DEFAULT_MEM_MB: u32 = 4000;

/// Guest port the SSH host-forward points at.
const GUEST_SSH_PORT: u16 = 22;
const NETDEV_ID: &str = "user.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub img_path: PathBuf,
    pub ssh_port: u16,
    pub mem_size: u32,
    /// Second virtio disk, attached at index 1.
    pub disk: Option<PathBuf>,
    /// Appended to the QEMU command line verbatim. Trusted input: nothing
    /// here is validated or escaped.
    pub qemu_extra_args: Vec<String>,
    pub daemonize: bool,
    pub sudo: bool,
    /// Open a local display window instead of listening for VNC.
    pub graphical: bool,
    /// Defaults to half the host's logical CPUs.
    pub ncpus: Option<u32>,
    /// Echo the assembled command line before running it.
    pub verbose: bool,
}

impl LaunchOptions {
    pub fn new(img_path: impl Into<PathBuf>) -> Self {
        Self {
            img_path: img_path.into(),
            ssh_port: DEFAULT_SSH_PORT,
            mem_size: DEFAULT_MEM_MB,
            disk: None,
            qemu_extra_args: Vec::new(),
            daemonize: false,
            sudo: false,
            graphical: false,
            ncpus: None,
            verbose: false,
        }
    }
}

/// VNC display port derived from the SSH port.
///
/// Probing for a free port does not see a VNC listener reliably, so the
/// port is taken as `ssh_port + 1` instead.
pub fn vnc_port(ssh_port: u16) -> Result<u16, QvmError> {
    ssh_port
        .checked_add(1)
        .ok_or(QvmError::VncPortOverflow { ssh_port })
}

/// Half the host's logical CPUs, never less than one.
pub fn default_ncpus(host_cpus: usize) -> u32 {
    u32::try_from(host_cpus / 2).unwrap_or(u32::MAX).max(1)
}

/// Number of logical CPUs on this host.
pub fn host_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not query CPU count, assuming 1");
            1
        })
}

fn virtio_drive(path: &std::path::Path, index: u8) -> String {
    format!(
        "file={},if=virtio,index={},cache=writeback,discard=ignore,format=qcow2",
        path.display(),
        index
    )
}

/// Fully resolved hypervisor invocation.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub ncpus: u32,
    /// `None` when running graphical.
    pub vnc_port: Option<u16>,
    pub ssh_port: u16,
    pub command: Cmd,
}

impl LaunchPlan {
    pub fn new(qemu: &str, opts: &LaunchOptions, host_cpus: usize) -> Result<Self, QvmError> {
        let vnc_port = if opts.graphical {
            None
        } else {
            Some(vnc_port(opts.ssh_port)?)
        };
        let ncpus = opts.ncpus.unwrap_or_else(|| default_ncpus(host_cpus));

        let mut cmd = if opts.sudo {
            Cmd::new("sudo").arg(qemu)
        } else {
            Cmd::new(qemu)
        };

        if let Some(port) = vnc_port {
            cmd = cmd.args(["-vnc", &format!("127.0.0.1:{}", port)]);
        }
        cmd = cmd
            .args(["-smp", &ncpus.to_string()])
            .args(["-cpu", "host"])
            .args(["-device", &format!("virtio-net,netdev={}", NETDEV_ID)])
            .args(["-m", &opts.mem_size.to_string()])
            .args(["-drive", &virtio_drive(&opts.img_path, 0)])
            .args(["-machine", "type=pc,accel=kvm"])
            .args([
                "-netdev",
                &format!(
                    "user,id={},hostfwd=tcp::{}-:{}",
                    NETDEV_ID, opts.ssh_port, GUEST_SSH_PORT
                ),
            ]);

        if opts.daemonize {
            cmd = cmd.arg("--daemonize");
        }
        if let Some(disk) = &opts.disk {
            cmd = cmd.args(["-drive", &virtio_drive(disk, 1)]);
        }
        cmd = cmd.args(&opts.qemu_extra_args);

        Ok(Self {
            ncpus,
            vnc_port,
            ssh_port: opts.ssh_port,
            command: cmd,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { ssh_port: u16 },
    Failed { status: ExitStatus },
}

/// Start the VM described by `opts` and print how to reach it.
pub fn start_vm(config: &Config, opts: &LaunchOptions) -> Result<StartOutcome> {
    let plan = LaunchPlan::new(&config.qemu, opts, host_cpus())?;
    tracing::info!(
        ncpus = plan.ncpus,
        vnc_port = ?plan.vnc_port,
        ssh_port = plan.ssh_port,
        "starting VM"
    );

    if opts.verbose {
        println!("{}", plan.command.display());
    }

    let status = plan
        .command
        .allow_fail()
        .run_interactive()
        .context("Failed to start VM")?;

    if status.success() {
        println!(
            "vm started wih ssh port {} on localhost connect with \nssh -p {} {{USER}}@localhost",
            plan.ssh_port, plan.ssh_port
        );
        Ok(StartOutcome::Started {
            ssh_port: plan.ssh_port,
        })
    } else {
        println!("vm failed to start");
        Ok(StartOutcome::Failed { status })
    }
}
