//! qvm - QEMU virtual machine management tool.
//!
//! - `create_from_iso` / `create`: allocate a qcow2 disk and boot an installer
//! - `start`: boot an installed image with SSH forwarded to the host

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use qvm::catalog::Catalog;
use qvm::commands;
use qvm::config::Config;
use qvm::launch::{LaunchOptions, DEFAULT_MEM_MB, DEFAULT_SSH_PORT};

#[derive(Parser)]
#[command(name = "qvm")]
#[command(about = "QEMU Virtual Machine Management Tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new virtual machine from an ISO file
    #[command(name = "create_from_iso")]
    CreateFromIso {
        /// Name of the virtual machine
        name: String,
        /// Size of the virtual machine disk in GB
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,
        /// Path to the ISO file
        iso_path: PathBuf,
    },

    /// Create a new virtual machine
    Create {
        /// Name of the virtual machine
        name: String,
        /// Size of the virtual machine disk in GB
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,
        /// Distribution of the virtual machine (debian, ubuntu)
        distrib: String,
    },

    /// Start a virtual machine
    Start {
        /// Path to the virtual machine image
        img_path: PathBuf,
        /// SSH port for the virtual machine
        #[arg(long = "ssh_port", default_value_t = DEFAULT_SSH_PORT)]
        ssh_port: u16,
        /// Memory size for the virtual machine in MB
        #[arg(long = "mem_size", default_value_t = DEFAULT_MEM_MB)]
        mem_size: u32,
        /// Attach an additional disk to the virtual machine
        #[arg(long)]
        disk: Option<PathBuf>,
        /// Extra arguments for qemu
        #[arg(long = "qemu_extra_args", allow_hyphen_values = true)]
        qemu_extra_args: Option<String>,
        /// run with sudo
        #[arg(long)]
        sudo: bool,
        /// run with graphical interface
        #[arg(long)]
        graphical: bool,
        /// Number of virtual CPU
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        ncpus: Option<u32>,
        /// daemonize virtual machine
        #[arg(long)]
        daemonize: bool,
        /// verbose
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present, before RUST_LOG is read
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Config::load();
    config.print();
    let catalog = Catalog::builtin();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::CreateFromIso {
            name,
            size,
            iso_path,
        } => {
            commands::cmd_create_from_iso(&config, &catalog, &name, size, &iso_path)?;
        }

        Commands::Create {
            name,
            size,
            distrib,
        } => {
            commands::cmd_create(&config, &catalog, &name, size, &distrib)?;
        }

        Commands::Start {
            img_path,
            ssh_port,
            mem_size,
            disk,
            qemu_extra_args,
            sudo,
            graphical,
            ncpus,
            daemonize,
            verbose,
        } => {
            let opts = LaunchOptions {
                img_path,
                ssh_port,
                mem_size,
                disk,
                qemu_extra_args: commands::start::split_extra_args(qemu_extra_args.as_deref()),
                daemonize,
                sudo,
                graphical,
                ncpus,
                verbose,
            };
            commands::cmd_start(&config, &opts)?;
        }
    }

    Ok(())
}
