//! Shared test utilities for qvm tests.
//!
//! Real QEMU and network access are never needed: tools are replaced by
//! small shell scripts that append their argv to a shared call log.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use qvm::config::Config;

/// Test environment with a work directory and a directory of fake tools.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Where ISOs and disks are looked up and created
    pub work_dir: PathBuf,
    /// Fake tool scripts
    pub bin_dir: PathBuf,
    /// Call log the fake tools append to
    pub log: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let work_dir = base.join("work");
        let bin_dir = base.join("bin");
        let log = base.join("calls.log");

        fs::create_dir_all(&work_dir).expect("Failed to create work dir");
        fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");

        Self {
            _temp_dir: temp_dir,
            work_dir,
            bin_dir,
            log,
        }
    }

    /// Write a fake tool that logs `<name> <args...>` and exits with `code`.
    pub fn fake_tool(&self, name: &str, code: i32) -> String {
        self.write_script(
            name,
            &format!(
                "#!/bin/sh\necho \"{} $*\" >> '{}'\nexit {}\n",
                name,
                self.log.display(),
                code
            ),
        )
    }

    /// Write a fake downloader that logs its call and creates the `-O` file.
    pub fn fake_downloader(&self) -> String {
        self.write_script(
            "wget",
            &format!(
                "#!/bin/sh\necho \"wget $*\" >> '{}'\n: > \"$3\"\n",
                self.log.display()
            ),
        )
    }

    /// Config whose tools are all successful fakes.
    pub fn config(&self) -> Config {
        Config {
            qemu: self.fake_tool("qemu-system-x86_64", 0),
            qemu_img: self.fake_tool("qemu-img", 0),
            downloader: self.fake_downloader(),
            work_dir: self.work_dir.clone(),
            ..Config::default()
        }
    }

    /// Lines recorded by the fake tools, in call order.
    pub fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Entries currently in the work directory.
    pub fn work_dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.work_dir)
            .expect("Failed to read work dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn write_script(&self, name: &str, body: &str) -> String {
        let path = self.bin_dir.join(name);
        create_mock_binary(&path, body);
        path.to_string_lossy().into_owned()
    }
}

/// Create an executable script file.
pub fn create_mock_binary(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for binary");
    }
    fs::write(path, body).expect("Failed to create mock binary");

    let mut perms = fs::metadata(path).expect("Failed to get metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file at {}", path.display());
}
