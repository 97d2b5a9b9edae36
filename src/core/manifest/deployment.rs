//! OSTree deployment pipeline
//!
//! Pulls the commit into a fresh sysroot, deploys it under the requested
//! stateroot and applies the boot and identity configuration.

use rand::Rng;
use serde_json::{json, Map, Value};

use super::stage::{commit_input, strip_nulls, Stage};
use super::{Manifest, PipelineId, PipelineKind};
use crate::config::defaults::{DEPLOYMENT_PIPELINE, OSTREE_REPO_PATH, ROOTFS_LABEL};
use crate::core::disk::PartitionTable;
use crate::core::ostree::{CommitSpec, Remote};
use crate::core::platform::Platform;
use crate::core::users::{Group, User};
use crate::error::ManifestError;

/// Everything a deployment pipeline is configured with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentOptions {
    pub commit: CommitSpec,
    pub os_name: String,
    pub ignition: bool,
    pub ignition_platform: Option<String>,
    pub platform: Platform,
    pub partition_table: Option<PartitionTable>,
    pub remote: Option<Remote>,
    pub kernel_options_append: Vec<String>,
    pub keyboard: Option<String>,
    pub locale: Option<String>,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub sysroot_read_only: bool,
}

/// Deployed and configured root filesystem tree
#[derive(Debug, Clone, PartialEq)]
pub struct OstreeDeployment {
    name: String,
    build: PipelineId,
    build_name: String,
    options: DeploymentOptions,
}

impl OstreeDeployment {
    /// Create a deployment running inside `build`
    ///
    /// Partition, partition-table and filesystem ids missing from the
    /// options are drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        manifest: &Manifest,
        build: PipelineId,
        mut options: DeploymentOptions,
        rng: &mut R,
    ) -> Result<Self, ManifestError> {
        let build_name = manifest.expect_kind(build, PipelineKind::Build)?.name().to_string();

        if let Some(pt) = options.partition_table.as_mut() {
            pt.generate_uuids(rng);
        }

        Ok(Self {
            name: DEPLOYMENT_PIPELINE.to_string(),
            build,
            build_name,
            options,
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

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    pub fn partition_table(&self) -> Option<&PartitionTable> {
        self.options.partition_table.as_ref()
    }

    /// Kernel command line written into the boot entry
    pub fn kernel_options(&self) -> Vec<String> {
        let mut opts = vec!["rw".to_string()];
        if self.options.ignition {
            opts.push("$ignition_firstboot".to_string());
            if let Some(platform) = &self.options.ignition_platform {
                opts.push(format!("ignition.platform.id={platform}"));
            }
        }
        opts.extend(self.options.kernel_options_append.iter().cloned());
        opts
    }

    fn remote_name(&self) -> Option<&str> {
        self.options.remote.as_ref().map(|r| r.name.as_str())
    }

    fn deployment_ref(&self) -> Value {
        json!({
            "osname": self.options.os_name,
            "ref": self.options.commit.ref_,
        })
    }

    pub(super) fn stages(&self) -> Vec<Stage> {
        let opts = &self.options;
        let commit = &opts.commit;
        let mut stages = vec![
            Stage::new("org.osbuild.ostree.init-fs", Value::Null),
            Stage::new(
                "org.osbuild.ostree.pull",
                json!({ "repo": OSTREE_REPO_PATH, "remote": self.remote_name() }),
            )
            .with_inputs(json!({ "commits": commit_input(&commit.checksum, &commit.ref_) })),
            Stage::new("org.osbuild.ostree.os-init", json!({ "osname": opts.os_name })),
            Stage::new(
                "org.osbuild.ostree.config",
                json!({
                    "repo": OSTREE_REPO_PATH,
                    "config": {
                        "sysroot": {
                            "readonly": opts.sysroot_read_only,
                            "bootloader": "none",
                        }
                    }
                }),
            ),
            Stage::new(
                "org.osbuild.ostree.deploy",
                json!({
                    "osname": opts.os_name,
                    "ref": commit.ref_,
                    "remote": self.remote_name(),
                    "mounts": opts
                        .partition_table
                        .as_ref()
                        .map(PartitionTable::mountpoints)
                        .unwrap_or_default(),
                    "rootfs": { "label": ROOTFS_LABEL },
                    "kernel_opts": self.kernel_options(),
                }),
            ),
        ];

        if let Some(remote) = &opts.remote {
            stages.push(Stage::new(
                "org.osbuild.ostree.remotes",
                json!({
                    "repo": OSTREE_REPO_PATH,
                    "remotes": [{
                        "name": remote.name,
                        "url": remote.url,
                        "contenturl": remote.content_url,
                        "gpgkeys": remote.gpg_keys,
                    }]
                }),
            ));
        }

        stages.push(Stage::new(
            "org.osbuild.ostree.fillvar",
            json!({ "deployment": self.deployment_ref() }),
        ));

        if !opts.users.is_empty() {
            stages.push(Stage::new("org.osbuild.users", json!({ "users": users_map(&opts.users) })));
        }
        if !opts.groups.is_empty() {
            let groups: Map<String, Value> = opts
                .groups
                .iter()
                .map(|g| (g.name.clone(), strip_nulls(json!({ "gid": g.gid }))))
                .collect();
            stages.push(Stage::new("org.osbuild.groups", json!({ "groups": groups })));
        }
        if let Some(keymap) = &opts.keyboard {
            stages.push(Stage::new("org.osbuild.keymap", json!({ "keymap": keymap })));
        }
        if let Some(language) = &opts.locale {
            stages.push(Stage::new("org.osbuild.locale", json!({ "language": language })));
        }

        if let Some(pt) = &opts.partition_table {
            let filesystems: Vec<Value> = pt
                .filesystems()
                .map(|fs| {
                    json!({
                        "uuid": fs.uuid,
                        "vfs_type": fs.fs_type,
                        "path": fs.mountpoint,
                        "options": fs.fstab_options,
                    })
                })
                .collect();
            stages.push(Stage::new(
                "org.osbuild.fstab",
                json!({ "filesystems": filesystems, "deployment": self.deployment_ref() }),
            ));
        }

        let bios = opts.platform.bios_platform();
        let uefi = opts.platform.uefi_vendor();
        if bios.is_some() || uefi.is_some() {
            stages.push(Stage::new(
                "org.osbuild.grub2",
                json!({
                    "rootfs": { "label": ROOTFS_LABEL },
                    "bios": bios,
                    "uefi": uefi.map(|vendor| json!({ "vendor": vendor })),
                    "ignition": opts.ignition,
                    "write_defaults": false,
                }),
            ));
        }

        stages.push(Stage::new(
            "org.osbuild.ostree.selinux",
            json!({ "deployment": self.deployment_ref() }),
        ));

        stages
    }
}

fn users_map(users: &[User]) -> Map<String, Value> {
    users
        .iter()
        .map(|u| {
            let groups = if u.groups.is_empty() {
                Value::Null
            } else {
                json!(u.groups)
            };
            let entry = json!({
                "description": u.description,
                "password": u.password,
                "key": u.key,
                "home": u.home,
                "shell": u.shell,
                "groups": groups,
                "uid": u.uid,
                "gid": u.gid,
                "expiredate": u.expire_date,
            });
            (u.name.clone(), strip_nulls(entry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Build;
    use crate::core::platform::{Arch, Firmware, ImageFormat};
    use crate::core::runner::Runner;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CHECKSUM: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn options() -> DeploymentOptions {
        DeploymentOptions {
            commit: CommitSpec::new("fedora/38/x86_64/iot", "https://example.com/repo", CHECKSUM),
            os_name: "fedora-iot".to_string(),
            platform: Platform::new(Arch::X86_64, ImageFormat::Raw),
            ..DeploymentOptions::default()
        }
    }

    fn deploy(options: DeploymentOptions) -> OstreeDeployment {
        let mut manifest = Manifest::new();
        let build = manifest.add(Build::new(&Runner::Linux, &[])).unwrap();
        OstreeDeployment::new(&manifest, build, options, &mut StdRng::seed_from_u64(0)).unwrap()
    }

    fn stage_types(deployment: &OstreeDeployment) -> Vec<String> {
        deployment.stages().into_iter().map(|s| s.stage_type).collect()
    }

    #[test]
    fn test_requires_build_pipeline() {
        let mut manifest = Manifest::new();
        let build = manifest.add(Build::new(&Runner::Linux, &[])).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let deployment = OstreeDeployment::new(&manifest, build, options(), &mut rng).unwrap();
        let deployment_id = manifest.add(deployment).unwrap();

        let err = OstreeDeployment::new(&manifest, deployment_id, options(), &mut rng).unwrap_err();
        assert!(matches!(err, ManifestError::WrongPipelineKind { .. }));
    }

    #[test]
    fn test_minimal_deployment_stages() {
        let deployment = deploy(options());
        assert_eq!(
            stage_types(&deployment),
            vec![
                "org.osbuild.ostree.init-fs",
                "org.osbuild.ostree.pull",
                "org.osbuild.ostree.os-init",
                "org.osbuild.ostree.config",
                "org.osbuild.ostree.deploy",
                "org.osbuild.ostree.fillvar",
                "org.osbuild.ostree.selinux",
            ]
        );
    }

    #[test]
    fn test_optional_configuration_adds_stages() {
        let mut opts = options();
        opts.remote = Some(Remote::new("fedora-iot", "https://example.com/repo"));
        opts.users = vec![User::new("core")];
        opts.groups = vec![Group::new("wheel", Some(10))];
        opts.keyboard = Some("us".to_string());
        opts.locale = Some("en_US.UTF-8".to_string());
        opts.platform = opts
            .platform
            .with_firmware(Firmware::Hybrid)
            .with_bios_platform("i386-pc")
            .with_uefi_vendor("fedora");

        let types = stage_types(&deploy(opts));
        for expected in [
            "org.osbuild.ostree.remotes",
            "org.osbuild.users",
            "org.osbuild.groups",
            "org.osbuild.keymap",
            "org.osbuild.locale",
            "org.osbuild.grub2",
        ] {
            assert!(types.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_kernel_options_order() {
        let mut opts = options();
        opts.ignition = true;
        opts.ignition_platform = Some("metal".to_string());
        opts.kernel_options_append = vec!["console=ttyS0".to_string(), "quiet".to_string()];

        assert_eq!(
            deploy(opts).kernel_options(),
            vec![
                "rw",
                "$ignition_firstboot",
                "ignition.platform.id=metal",
                "console=ttyS0",
                "quiet"
            ]
        );
    }

    #[test]
    fn test_ignition_platform_ignored_without_ignition() {
        let mut opts = options();
        opts.ignition_platform = Some("metal".to_string());
        assert_eq!(deploy(opts).kernel_options(), vec!["rw"]);
    }

    #[test]
    fn test_pull_stage_references_commit() {
        let stages = deploy(options()).stages();
        let pull = &stages[1];
        let inputs = pull.inputs.as_ref().unwrap();
        assert_eq!(
            inputs["commits"]["references"][CHECKSUM]["ref"],
            "fedora/38/x86_64/iot"
        );
        assert!(pull.options.get("remote").is_none());
    }

    #[test]
    fn test_user_entries_omit_unset_fields() {
        let mut opts = options();
        let mut user = User::new("core");
        user.key = Some("ssh-ed25519 AAAA".to_string());
        opts.users = vec![user];

        let stages = deploy(opts).stages();
        let users = stages
            .iter()
            .find(|s| s.stage_type == "org.osbuild.users")
            .unwrap();
        assert_eq!(users.options["users"]["core"], json!({ "key": "ssh-ed25519 AAAA" }));
    }
}
