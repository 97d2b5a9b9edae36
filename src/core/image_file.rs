//! Image request files
//!
//! An image request is a TOML file describing one [`OstreeImage`] together
//! with the repositories and runner its build environment uses. Format,
//! compression and runner are read as plain strings and parsed into their
//! typed forms here, so a bad value surfaces as a [`SpecError`] naming the
//! offending field instead of reaching the compiler. Unknown keys are
//! rejected in every table.
//!
//! ```toml
//! runner = "fedora-38"
//! seed = 7
//!
//! [image]
//! filename = "fedora-iot.raw.xz"
//! os_name = "fedora-iot"
//! compression = "xz"
//!
//! [platform]
//! arch = "x86_64"
//! image_format = "raw"
//!
//! [commit]
//! ref = "fedora/38/x86_64/iot"
//! url = "https://ostree.example.com/repo"
//! checksum = "..."
//! ```

use serde::Deserialize;

use crate::core::disk::PartitionTable;
use crate::core::image::OstreeImage;
use crate::core::ostree::{CommitSpec, Remote};
use crate::core::platform::{Arch, Firmware, ImageFormat, Platform};
use crate::core::policy::Compression;
use crate::core::repos::RepoConfig;
use crate::core::runner::Runner;
use crate::core::users::{Group, User};
use crate::core::workload::Workload;
use crate::error::SpecError;

/// Image request file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageFile {
    /// Runner descriptor (e.g. "fedora-38"); falls back to the global config
    #[serde(default)]
    pub runner: Option<String>,

    /// Seed for generated partition and filesystem ids
    #[serde(default)]
    pub seed: Option<u64>,

    /// Output and boot settings
    pub image: ImageSection,

    /// Target platform
    pub platform: PlatformSection,

    /// Commit to deploy
    pub commit: CommitSpec,

    #[serde(default)]
    pub remote: Option<Remote>,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub partition_table: Option<PartitionTable>,

    #[serde(default)]
    pub workload: Workload,

    /// Package sources for the build environment
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

/// `[image]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    /// Name of the exported file
    pub filename: String,

    /// Stateroot name
    pub os_name: String,

    /// Compression tag; empty for none
    #[serde(default)]
    pub compression: String,

    #[serde(default)]
    pub sysroot_read_only: bool,

    #[serde(default)]
    pub kernel_options_append: Vec<String>,

    #[serde(default)]
    pub keyboard: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub ignition: bool,

    #[serde(default)]
    pub ignition_platform: Option<String>,
}

/// `[platform]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformSection {
    #[serde(default)]
    pub arch: Arch,

    /// Output format name (raw, qcow2, vhd, vmdk, gce)
    #[serde(default)]
    pub image_format: String,

    #[serde(default)]
    pub firmware: Firmware,

    #[serde(default)]
    pub qcow2_compat: Option<String>,

    #[serde(default)]
    pub bios_platform: Option<String>,

    #[serde(default)]
    pub uefi_vendor: Option<String>,
}

/// A validated image request
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub image: OstreeImage,
    pub repos: Vec<RepoConfig>,
    /// Runner named by the request, if any
    pub runner: Option<Runner>,
    /// Seed named by the request, if any
    pub seed: Option<u64>,
}

impl PlatformSection {
    fn into_platform(self) -> Result<Platform, SpecError> {
        let format: ImageFormat = self.image_format.parse()?;
        Ok(Platform {
            arch: self.arch,
            image_format: format,
            firmware: self.firmware,
            qcow2_compat: self.qcow2_compat,
            bios_platform: self.bios_platform,
            uefi_vendor: self.uefi_vendor,
        })
    }
}

impl ImageFile {
    /// Parse an image request from TOML
    pub fn from_toml(content: &str) -> Result<Self, SpecError> {
        toml::from_str(content).map_err(|e| SpecError::Parse(e.to_string()))
    }

    /// Convert into a validated request
    pub fn into_request(self) -> Result<ImageRequest, SpecError> {
        let compression: Compression = self.image.compression.parse()?;
        let runner = self
            .runner
            .as_deref()
            .map(str::parse::<Runner>)
            .transpose()?;
        let platform = self.platform.into_platform()?;

        let image = OstreeImage {
            platform,
            workload: self.workload,
            partition_table: self.partition_table,
            users: self.users,
            groups: self.groups,
            commit: self.commit,
            sysroot_read_only: self.image.sysroot_read_only,
            remote: self.remote,
            os_name: self.image.os_name,
            kernel_options_append: self.image.kernel_options_append,
            keyboard: self.image.keyboard,
            locale: self.image.locale,
            filename: self.image.filename,
            ignition: self.image.ignition,
            ignition_platform: self.image.ignition_platform,
            compression,
        };
        image.validate()?;

        Ok(ImageRequest {
            image,
            repos: self.repos,
            runner,
            seed: self.seed,
        })
    }
}
