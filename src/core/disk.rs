//! Partition table descriptors
//!
//! The layout itself (offsets, sizes) is computed by the caller. This module
//! only carries it and fills in identifiers the caller left blank.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Partition table label type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionTableType {
    #[default]
    Gpt,
    Dos,
}

impl PartitionTableType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Dos => "dos",
        }
    }
}

/// Disk layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionTable {
    /// Label type
    #[serde(default, rename = "type")]
    pub pt_type: PartitionTableType,

    /// Disk identifier (GUID for gpt, 32-bit hex for dos)
    #[serde(default)]
    pub uuid: Option<String>,

    /// Total image size in bytes
    pub size: u64,

    /// Partitions in on-disk order
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

/// A partition entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Partition {
    /// Start offset in bytes
    pub start: u64,

    /// Size in bytes
    pub size: u64,

    /// Partition type GUID (gpt) or id (dos)
    #[serde(default, rename = "type")]
    pub part_type: String,

    /// Partition GUID (gpt only)
    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub bootable: bool,

    /// Filesystem created on the partition, if any
    #[serde(default)]
    pub filesystem: Option<Filesystem>,
}

/// A filesystem payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filesystem {
    /// Filesystem type (xfs, ext4, vfat)
    #[serde(rename = "type")]
    pub fs_type: String,

    #[serde(default)]
    pub label: Option<String>,

    /// Mount point inside the deployment
    pub mountpoint: String,

    /// Filesystem UUID (volume id for vfat)
    #[serde(default)]
    pub uuid: Option<String>,

    /// fstab mount options
    #[serde(default = "default_fstab_options")]
    pub fstab_options: String,
}

fn default_fstab_options() -> String {
    "defaults".to_string()
}

impl PartitionTable {
    /// Fill every missing identifier from `rng`
    ///
    /// Identifiers already present are left untouched, so a fully specified
    /// table comes out unchanged.
    pub fn generate_uuids<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.uuid.is_none() {
            self.uuid = Some(match self.pt_type {
                PartitionTableType::Gpt => random_uuid(rng).to_string(),
                PartitionTableType::Dos => format!("{:08x}", rng.gen::<u32>()),
            });
        }

        for partition in &mut self.partitions {
            if self.pt_type == PartitionTableType::Gpt && partition.uuid.is_none() {
                partition.uuid = Some(random_uuid(rng).to_string());
            }
            if let Some(fs) = partition.filesystem.as_mut() {
                if fs.uuid.is_none() {
                    fs.uuid = Some(if fs.fs_type == "vfat" {
                        vfat_volume_id(rng.gen())
                    } else {
                        random_uuid(rng).to_string()
                    });
                }
            }
        }
    }

    /// Filesystems in on-disk order
    pub fn filesystems(&self) -> impl Iterator<Item = &Filesystem> {
        self.partitions.iter().filter_map(|p| p.filesystem.as_ref())
    }

    /// Mount points other than the root, sorted so parents come first
    pub fn mountpoints(&self) -> Vec<String> {
        let mut mounts: Vec<String> = self
            .filesystems()
            .map(|fs| fs.mountpoint.clone())
            .filter(|m| m != "/")
            .collect();
        mounts.sort();
        mounts
    }

    /// Filesystem mounted at `/`
    pub fn root_filesystem(&self) -> Option<&Filesystem> {
        self.filesystems().find(|fs| fs.mountpoint == "/")
    }
}

fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn vfat_volume_id(id: u32) -> String {
    let hex = format!("{id:08X}");
    format!("{}-{}", &hex[..4], &hex[4..])
}
