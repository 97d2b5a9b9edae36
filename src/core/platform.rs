//! Platform profiles
//!
//! A platform describes the CPU architecture, firmware, and virtualization
//! target of an image. The compiler only asks it two things: which output
//! format to shape the disk into, and which qcow2 compatibility level to use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpecError;

/// CPU architecture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    X86_64,
    Aarch64,
    Ppc64le,
    S390x,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        };
        f.write_str(name)
    }
}

/// Disk image formats a platform may declare
///
/// `Vhd`, `Vmdk` and `Gce` are recognized so that platform profiles can name
/// them, but ostree disk images cannot be shaped into them yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Unset,
    Raw,
    Qcow2,
    Vhd,
    Vmdk,
    Gce,
}

impl ImageFormat {
    /// Every format a platform can name
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Raw,
        ImageFormat::Qcow2,
        ImageFormat::Vhd,
        ImageFormat::Vmdk,
        ImageFormat::Gce,
    ];

    /// Lowercase name used in request files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Raw => "raw",
            Self::Qcow2 => "qcow2",
            Self::Vhd => "vhd",
            Self::Vmdk => "vmdk",
            Self::Gce => "gce",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "qcow2" => Ok(Self::Qcow2),
            "vhd" => Ok(Self::Vhd),
            "vmdk" => Ok(Self::Vmdk),
            "gce" => Ok(Self::Gce),
            "" | "unset" => Err(SpecError::FormatUnset),
            _ => Err(SpecError::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Boot firmware
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Firmware {
    /// Legacy BIOS boot
    Bios,
    /// UEFI boot
    #[default]
    Uefi,
    /// Both BIOS and UEFI boot paths installed
    Hybrid,
}

impl Firmware {
    /// Whether a BIOS boot loader is installed
    pub fn has_bios(self) -> bool {
        matches!(self, Self::Bios | Self::Hybrid)
    }

    /// Whether a UEFI boot loader is installed
    pub fn has_uefi(self) -> bool {
        matches!(self, Self::Uefi | Self::Hybrid)
    }
}

/// Target platform profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// CPU architecture
    #[serde(default)]
    pub arch: Arch,

    /// Output disk format
    #[serde(default)]
    pub image_format: ImageFormat,

    /// Boot firmware
    #[serde(default)]
    pub firmware: Firmware,

    /// qcow2 compatibility level (e.g. "0.10", "1.1")
    #[serde(default)]
    pub qcow2_compat: Option<String>,

    /// grub2 BIOS platform (e.g. "i386-pc")
    #[serde(default)]
    pub bios_platform: Option<String>,

    /// EFI vendor directory (e.g. "fedora")
    #[serde(default)]
    pub uefi_vendor: Option<String>,
}

impl Platform {
    /// Create a platform profile for an architecture and output format
    pub fn new(arch: Arch, image_format: ImageFormat) -> Self {
        Self {
            arch,
            image_format,
            ..Self::default()
        }
    }

    /// Set the boot firmware
    #[must_use]
    pub fn with_firmware(mut self, firmware: Firmware) -> Self {
        self.firmware = firmware;
        self
    }

    /// Set the qcow2 compatibility level
    #[must_use]
    pub fn with_qcow2_compat(mut self, compat: impl Into<String>) -> Self {
        self.qcow2_compat = Some(compat.into());
        self
    }

    /// Set the grub2 BIOS platform
    #[must_use]
    pub fn with_bios_platform(mut self, platform: impl Into<String>) -> Self {
        self.bios_platform = Some(platform.into());
        self
    }

    /// Set the EFI vendor
    #[must_use]
    pub fn with_uefi_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.uefi_vendor = Some(vendor.into());
        self
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    pub fn qcow2_compat(&self) -> Option<&str> {
        self.qcow2_compat.as_deref()
    }

    /// BIOS platform, only when the firmware boots through BIOS
    pub fn bios_platform(&self) -> Option<&str> {
        if self.firmware.has_bios() {
            self.bios_platform.as_deref()
        } else {
            None
        }
    }

    /// EFI vendor, only when the firmware boots through UEFI
    pub fn uefi_vendor(&self) -> Option<&str> {
        if self.firmware.has_uefi() {
            self.uefi_vendor.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_parses_case_insensitively() {
        assert_eq!("RAW".parse::<ImageFormat>(), Ok(ImageFormat::Raw));
        assert_eq!("qcow2".parse::<ImageFormat>(), Ok(ImageFormat::Qcow2));
        assert_eq!(" vmdk ".parse::<ImageFormat>(), Ok(ImageFormat::Vmdk));
    }

    #[test]
    fn test_image_format_rejects_unknown_names() {
        assert_eq!(
            "iso".parse::<ImageFormat>(),
            Err(SpecError::UnknownFormat {
                value: "iso".to_string()
            })
        );
        assert_eq!("".parse::<ImageFormat>(), Err(SpecError::FormatUnset));
    }

    #[test]
    fn test_image_format_display_round_trips() {
        for format in ImageFormat::ALL {
            assert_eq!(format.to_string().parse::<ImageFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_firmware_gates_boot_loader_settings() {
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw)
            .with_bios_platform("i386-pc")
            .with_uefi_vendor("fedora");

        assert_eq!(platform.bios_platform(), None);
        assert_eq!(platform.uefi_vendor(), Some("fedora"));

        let hybrid = platform.with_firmware(Firmware::Hybrid);
        assert_eq!(hybrid.bios_platform(), Some("i386-pc"));
        assert_eq!(hybrid.uefi_vendor(), Some("fedora"));
    }

    #[test]
    fn test_platform_parses_from_toml() {
        let platform: Platform = toml::from_str(
            r#"
arch = "aarch64"
image_format = "qcow2"
firmware = "uefi"
qcow2_compat = "1.1"
uefi_vendor = "fedora"
"#,
        )
        .expect("Failed to parse platform");

        assert_eq!(platform.arch(), Arch::Aarch64);
        assert_eq!(platform.image_format(), ImageFormat::Qcow2);
        assert_eq!(platform.qcow2_compat(), Some("1.1"));
    }

    #[test]
    fn test_platform_defaults_to_unset_format() {
        let platform: Platform = toml::from_str("arch = \"x86_64\"").expect("Failed to parse");
        assert_eq!(platform.image_format(), ImageFormat::Unset);
    }
}
