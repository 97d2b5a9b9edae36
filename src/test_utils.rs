//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::config::defaults::{QCOW2_FILENAME, RAW_IMAGE_FILENAME, XZ_FILENAME};
    use crate::core::disk::{Filesystem, Partition, PartitionTable, PartitionTableType};
    use crate::core::platform::ImageFormat;
    use crate::core::policy::Compression;
    use crate::core::users::{Group, User};

    /// Generate an output filename that differs from every default name
    pub fn filename() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,20}\\.(raw|img|qcow2|xz)".prop_filter(
            "Filename must not collide with a default output name",
            |name| ![RAW_IMAGE_FILENAME, QCOW2_FILENAME, XZ_FILENAME].contains(&name.as_str()),
        )
    }

    /// Generate a stateroot name
    pub fn os_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    /// Generate a valid SHA256 hash (64 hex characters)
    pub fn sha256_hash() -> impl Strategy<Value = String> {
        "[0-9a-f]{64}"
    }

    /// Generate a valid ostree ref
    pub fn ostree_ref() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z0-9][a-z0-9._-]{0,10}", 1..4).prop_map(|parts| parts.join("/"))
    }

    /// Generate a format the compiler can shape
    pub fn supported_format() -> impl Strategy<Value = ImageFormat> {
        prop_oneof![Just(ImageFormat::Raw), Just(ImageFormat::Qcow2)]
    }

    /// Generate a compression setting
    pub fn compression() -> impl Strategy<Value = Compression> {
        prop_oneof![Just(Compression::None), Just(Compression::Xz)]
    }

    /// Generate a user record with a random subset of optional fields
    pub fn user() -> impl Strategy<Value = User> {
        (
            "[a-z][a-z0-9]{0,10}",
            proptest::option::of("ssh-ed25519 [A-Za-z0-9]{16}"),
            proptest::option::of(1000u32..60000),
            prop::collection::vec("[a-z]{3,8}", 0..3),
        )
            .prop_map(|(name, key, uid, groups)| User {
                key,
                uid,
                groups,
                ..User::new(name)
            })
    }

    /// Generate an ordered list of users
    pub fn users() -> impl Strategy<Value = Vec<User>> {
        prop::collection::vec(user(), 0..4)
    }

    /// Generate an ordered list of groups
    pub fn groups() -> impl Strategy<Value = Vec<Group>> {
        prop::collection::vec(
            ("[a-z]{3,8}", proptest::option::of(100u32..2000))
                .prop_map(|(name, gid)| Group::new(name, gid)),
            0..4,
        )
    }

    /// Generate extra kernel arguments
    pub fn kernel_options() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{2,8}(=[a-z0-9]{1,6})?", 0..4)
    }

    /// Two-partition gpt layout with an EFI system partition and an xfs root
    pub fn sample_partition_table() -> PartitionTable {
        PartitionTable {
            pt_type: PartitionTableType::Gpt,
            uuid: None,
            size: 4 * 1024 * 1024 * 1024,
            partitions: vec![
                Partition {
                    start: 1024 * 1024,
                    size: 500 * 1024 * 1024,
                    part_type: "C12A7328-F81F-11D2-BA4B-00A0C93EC93B".to_string(),
                    filesystem: Some(Filesystem {
                        fs_type: "vfat".to_string(),
                        label: Some("EFI-SYSTEM".to_string()),
                        mountpoint: "/boot/efi".to_string(),
                        uuid: None,
                        fstab_options: "umask=0077,shortname=winnt".to_string(),
                    }),
                    ..Partition::default()
                },
                Partition {
                    start: 501 * 1024 * 1024,
                    size: 3 * 1024 * 1024 * 1024,
                    part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".to_string(),
                    filesystem: Some(Filesystem {
                        fs_type: "xfs".to_string(),
                        label: Some("root".to_string()),
                        mountpoint: "/".to_string(),
                        uuid: None,
                        fstab_options: "defaults".to_string(),
                    }),
                    ..Partition::default()
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::core::ostree::{verify_checksum, verify_ref};
    use crate::core::image::validate_filename;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_filename_generator(name in filename()) {
            prop_assert!(validate_filename(&name).is_ok());
        }

        #[test]
        fn test_sha256_hash_generator(hash in sha256_hash()) {
            prop_assert!(verify_checksum(&hash).is_ok());
        }

        #[test]
        fn test_ostree_ref_generator(value in ostree_ref()) {
            prop_assert!(verify_ref(&value).is_ok());
        }

        #[test]
        fn test_os_name_generator(name in os_name()) {
            prop_assert!(!name.is_empty());
        }
    }
}
