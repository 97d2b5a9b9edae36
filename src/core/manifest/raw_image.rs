//! Raw disk image pipeline
//!
//! Lays the deployed tree out onto the deployment's partition table.

use serde_json::{json, Value};

use super::stage::{tree_input, Stage};
use super::{Manifest, PipelineId, PipelineKind};
use crate::config::defaults::{RAW_IMAGE_FILENAME, RAW_IMAGE_PIPELINE};
use crate::core::disk::PartitionTable;
use crate::core::platform::Platform;
use crate::error::ManifestError;

/// Uncompressed disk image of an ostree deployment
#[derive(Debug, Clone, PartialEq)]
pub struct RawOstreeImage {
    name: String,
    build: PipelineId,
    build_name: String,
    deployment: PipelineId,
    deployment_name: String,
    platform: Platform,
    partition_table: Option<PartitionTable>,
    filename: String,
}

impl RawOstreeImage {
    /// Create a raw image of `deployment`
    ///
    /// `filename` overrides the default output name.
    pub fn new(
        manifest: &Manifest,
        build: PipelineId,
        platform: &Platform,
        deployment: PipelineId,
        filename: Option<String>,
    ) -> Result<Self, ManifestError> {
        let build_name = manifest.expect_kind(build, PipelineKind::Build)?.name().to_string();
        let tree = manifest.deployment(deployment)?;

        Ok(Self {
            name: RAW_IMAGE_PIPELINE.to_string(),
            build,
            build_name,
            deployment,
            deployment_name: tree.name().to_string(),
            platform: platform.clone(),
            partition_table: tree.partition_table().cloned(),
            filename: filename.unwrap_or_else(|| RAW_IMAGE_FILENAME.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self) -> PipelineId {
        self.build
    }

    pub(super) fn build_name(&self) -> &str {
        &self.build_name
    }

    pub fn deployment(&self) -> PipelineId {
        self.deployment
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn partition_table(&self) -> Option<&PartitionTable> {
        self.partition_table.as_ref()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub(super) fn stages(&self) -> Vec<Stage> {
        let copy = Stage::new(
            "org.osbuild.copy",
            json!({
                "paths": [{ "from": "input://root-tree/", "to": "mount://-/" }]
            }),
        )
        .with_inputs(json!({ "root-tree": tree_input(&self.deployment_name) }));

        let Some(pt) = &self.partition_table else {
            return vec![copy];
        };

        let partitions: Vec<Value> = pt
            .partitions
            .iter()
            .map(|p| {
                json!({
                    "start": p.start,
                    "size": p.size,
                    "type": p.part_type,
                    "uuid": p.uuid,
                    "bootable": p.bootable,
                })
            })
            .collect();

        let mut stages = vec![
            Stage::new(
                "org.osbuild.truncate",
                json!({ "filename": self.filename, "size": pt.size.to_string() }),
            ),
            Stage::new(
                "org.osbuild.sfdisk",
                json!({
                    "label": pt.pt_type.as_str(),
                    "uuid": pt.uuid,
                    "partitions": partitions,
                }),
            ),
        ];

        for (index, partition) in pt.partitions.iter().enumerate() {
            if let Some(fs) = &partition.filesystem {
                stages.push(Stage::new(
                    format!("org.osbuild.mkfs.{}", fs.fs_type),
                    json!({ "partition": index, "uuid": fs.uuid, "label": fs.label }),
                ));
            }
        }

        stages.push(copy);

        if let Some(platform) = self.platform.bios_platform() {
            stages.push(Stage::new(
                "org.osbuild.grub2.inst",
                json!({ "filename": self.filename, "platform": platform }),
            ));
        }

        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::disk::{Filesystem, Partition, PartitionTableType};
    use crate::core::manifest::{Build, DeploymentOptions, OstreeDeployment};
    use crate::core::platform::{Arch, Firmware, ImageFormat};
    use crate::core::runner::Runner;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> PartitionTable {
        PartitionTable {
            pt_type: PartitionTableType::Gpt,
            uuid: None,
            size: 2 * 1024 * 1024 * 1024,
            partitions: vec![Partition {
                start: 1024 * 1024,
                size: 1024 * 1024 * 1024,
                part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".to_string(),
                filesystem: Some(Filesystem {
                    fs_type: "xfs".to_string(),
                    label: Some("root".to_string()),
                    mountpoint: "/".to_string(),
                    uuid: None,
                    fstab_options: "defaults".to_string(),
                }),
                ..Partition::default()
            }],
        }
    }

    fn image(pt: Option<PartitionTable>, platform: &Platform) -> RawOstreeImage {
        let mut manifest = Manifest::new();
        let build = manifest.add(Build::new(&Runner::Linux, &[])).unwrap();
        let options = DeploymentOptions {
            os_name: "iot".to_string(),
            partition_table: pt,
            platform: platform.clone(),
            ..DeploymentOptions::default()
        };
        let deployment = OstreeDeployment::new(&manifest, build, options, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let deployment = manifest.add(deployment).unwrap();
        RawOstreeImage::new(&manifest, build, platform, deployment, None).unwrap()
    }

    #[test]
    fn test_default_filename() {
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw);
        assert_eq!(image(None, &platform).filename(), RAW_IMAGE_FILENAME);
    }

    #[test]
    fn test_uses_deployment_partition_table() {
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw);
        let raw = image(Some(table()), &platform);
        let pt = raw.partition_table().unwrap();
        // ids were filled in by the deployment, not left blank
        assert!(pt.uuid.is_some());
        assert!(pt.partitions[0].uuid.is_some());
    }

    #[test]
    fn test_stages_without_partition_table() {
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw);
        let stages = image(None, &platform).stages();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].stage_type, "org.osbuild.copy");
    }

    #[test]
    fn test_stages_with_partition_table_and_bios() {
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw)
            .with_firmware(Firmware::Bios)
            .with_bios_platform("i386-pc");
        let types: Vec<String> = image(Some(table()), &platform)
            .stages()
            .into_iter()
            .map(|s| s.stage_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "org.osbuild.truncate",
                "org.osbuild.sfdisk",
                "org.osbuild.mkfs.xfs",
                "org.osbuild.copy",
                "org.osbuild.grub2.inst",
            ]
        );
    }

    #[test]
    fn test_rejects_non_deployment_source() {
        let mut manifest = Manifest::new();
        let build = manifest.add(Build::new(&Runner::Linux, &[])).unwrap();
        let platform = Platform::new(Arch::X86_64, ImageFormat::Raw);
        let err = RawOstreeImage::new(&manifest, build, &platform, build, None).unwrap_err();
        assert!(matches!(err, ManifestError::WrongPipelineKind { .. }));
    }
}
