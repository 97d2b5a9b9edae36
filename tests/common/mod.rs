//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding image requests and an isolated
/// global config directory.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Config directory used instead of the user's
    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join(".config")
    }

    /// Create a file in the test project
    #[allow(dead_code)]
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Write the global config file
    #[allow(dead_code)]
    pub fn create_global_config(&self, content: &str) {
        std::fs::create_dir_all(self.config_dir()).expect("Failed to create config directory");
        std::fs::write(self.config_dir().join("config.toml"), content)
            .expect("Failed to write global config");
    }

    /// Check if a file exists in the test project
    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    #[allow(dead_code)]
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run treecompose inside the project
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_treecompose"))
            .current_dir(self.path())
            .env("TREECOMPOSE_CONFIG_DIR", self.config_dir())
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute treecompose")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Commit checksum used by the sample requests
#[allow(dead_code)]
pub const SAMPLE_CHECKSUM: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Sample image request TOML for testing
///
/// Raw format without compression; tests rewrite the `image_format` and
/// `compression` lines to cover other topologies.
#[allow(dead_code)]
pub const SAMPLE_REQUEST: &str = r#"
[image]
filename = "fedora-iot.img"
os_name = "fedora-iot"
compression = ""
kernel_options_append = ["console=ttyS0"]
keyboard = "us"
locale = "en_US.UTF-8"

[platform]
arch = "x86_64"
image_format = "raw"
firmware = "hybrid"
qcow2_compat = "1.1"
bios_platform = "i386-pc"
uefi_vendor = "fedora"

[commit]
ref = "fedora/38/x86_64/iot"
url = "https://ostree.example.com/repo"
checksum = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"

[remote]
name = "fedora-iot"
url = "https://ostree.example.com/repo"

[[users]]
name = "core"
key = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5"
groups = ["wheel"]

[[groups]]
name = "wheel"
gid = 10

[partition_table]
type = "gpt"
size = 4294967296

[[partition_table.partitions]]
start = 1048576
size = 524288000
type = "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"

[partition_table.partitions.filesystem]
type = "vfat"
label = "EFI-SYSTEM"
mountpoint = "/boot/efi"
fstab_options = "umask=0077,shortname=winnt"

[[partition_table.partitions]]
start = 525336576
size = 3221225472
type = "0FC63DAF-8483-4772-8E79-3D69D8477DE4"

[partition_table.partitions.filesystem]
type = "xfs"
label = "root"
mountpoint = "/"

[[repos]]
name = "fedora"
base_urls = ["https://mirror.example.com/fedora/38/Everything/x86_64/os"]
"#;

/// `SAMPLE_REQUEST` with a different format and compression
#[allow(dead_code)]
pub fn request_with(format: &str, compression: &str) -> String {
    SAMPLE_REQUEST
        .replace(
            "image_format = \"raw\"",
            &format!("image_format = \"{format}\""),
        )
        .replace(
            "compression = \"\"",
            &format!("compression = \"{compression}\""),
        )
}
