//! OSTree disk image compiler
//!
//! [`OstreeImage`] describes one disk image built from an ostree commit.
//! Compiling it appends a straight chain of pipelines to a [`Manifest`]:
//!
//! ```text
//! build -> ostree-deployment -> image -> [qcow2] -> [xz]
//! ```
//!
//! The format and compression decision tables live in
//! [`crate::core::policy`]; this module wires the chain and decides which
//! pipeline receives the requested filename.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::core::disk::PartitionTable;
use crate::core::manifest::{
    Artifact, Build, DeploymentOptions, Manifest, OstreeDeployment, PipelineId, Qcow2,
    Qcow2Options, RawOstreeImage, Xz,
};
use crate::core::ostree::{CommitSpec, Remote};
use crate::core::platform::{ImageFormat, Platform};
use crate::core::policy::{Compression, ExportShape, Topology};
use crate::core::repos::RepoConfig;
use crate::core::runner::Runner;
use crate::core::users::{Group, User};
use crate::core::workload::Workload;
use crate::error::{CompileError, SpecError};

/// Longest output filename accepted
const MAX_FILENAME_LEN: usize = 255;

/// An ostree-based disk image request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OstreeImage {
    /// Target platform profile
    pub platform: Platform,

    /// Post-boot customizations, carried but not compiled
    pub workload: Workload,

    /// Disk layout; without one no partitioning stages are emitted
    pub partition_table: Option<PartitionTable>,

    pub users: Vec<User>,
    pub groups: Vec<Group>,

    /// Commit to deploy
    pub commit: CommitSpec,

    /// Mount the deployed sysroot read-only
    pub sysroot_read_only: bool,

    /// Remote registered in the deployed repository
    pub remote: Option<Remote>,

    /// Stateroot name
    pub os_name: String,

    /// Extra kernel arguments, appended after the generated ones
    pub kernel_options_append: Vec<String>,

    pub keyboard: Option<String>,
    pub locale: Option<String>,

    /// Name of the final exported file
    pub filename: String,

    /// Enable first-boot provisioning with Ignition
    pub ignition: bool,

    /// Ignition platform id (e.g. "metal", "qemu")
    pub ignition_platform: Option<String>,

    /// Compression wrapped around the shaped image
    pub compression: Compression,
}

/// Pipelines shared by every topology
struct BasePipelines {
    build: PipelineId,
    deployment: PipelineId,
    raw_image: PipelineId,
}

impl OstreeImage {
    /// Create an image request with empty customization
    pub fn new(commit: CommitSpec, platform: Platform, filename: impl Into<String>) -> Self {
        Self {
            commit,
            platform,
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Check the request before compiling it
    ///
    /// Everything an image request file can get wrong is reported here, so
    /// the compiler only ever sees formats it can either shape or report as
    /// not implemented.
    pub fn validate(&self) -> Result<(), SpecError> {
        validate_filename(&self.filename)?;

        if self.os_name.is_empty() {
            return Err(SpecError::EmptyOsName);
        }
        if self.platform.image_format() == ImageFormat::Unset {
            return Err(SpecError::FormatUnset);
        }
        if self.ignition && self.ignition_platform.as_deref().unwrap_or("").is_empty() {
            return Err(SpecError::MissingIgnitionPlatform);
        }

        self.commit.validate()?;
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        Ok(())
    }

    /// Compile the image into `manifest` and export the final pipeline
    ///
    /// Formats that cannot be shaped yet are reported before any pipeline is
    /// added, leaving `manifest` untouched.
    ///
    /// # Panics
    ///
    /// Panics when the platform's image format is [`ImageFormat::Unset`];
    /// [`OstreeImage::validate`] rejects such requests.
    pub fn compile<R: Rng + ?Sized>(
        &self,
        manifest: &mut Manifest,
        repos: &[RepoConfig],
        runner: &Runner,
        rng: &mut R,
    ) -> Result<Artifact, CompileError> {
        let topology = Topology::select(self.platform.image_format(), self.compression)?;
        info!(
            "Compiling {} image with {} compression into '{}'",
            self.platform.image_format(),
            topology.compression(),
            self.filename
        );

        let passthrough = topology
            .passes_filename_through()
            .then(|| self.filename.clone());

        let raw_filename = match topology.shape() {
            ExportShape::Raw => passthrough.clone(),
            ExportShape::Qcow2 => None,
        };
        let base = self.base_pipelines(manifest, repos, runner, rng, raw_filename)?;

        let shaped = match topology.shape() {
            ExportShape::Raw => base.raw_image,
            ExportShape::Qcow2 => {
                let options = Qcow2Options {
                    filename: passthrough,
                    compat: self.platform.qcow2_compat().map(str::to_string),
                };
                let qcow2 = Qcow2::new(manifest, base.build, base.raw_image, options)?;
                manifest.add(qcow2)?
            }
        };

        let exported = match topology.compression() {
            Compression::None => shaped,
            Compression::Xz => {
                let xz = Xz::new(manifest, base.build, shaped, Some(self.filename.clone()))?;
                manifest.add(xz)?
            }
        };

        let artifact = manifest.export(exported)?;
        info!(
            "Exporting '{}' from pipeline '{}'",
            artifact.filename(),
            artifact.pipeline()
        );
        Ok(artifact)
    }

    /// Compile a raw image wrapped in xz, ignoring the platform format
    ///
    /// Returns the xz pipeline without exporting it, so the caller can keep
    /// composing on top of it. The build, deployment and raw image pipelines
    /// are wired exactly as in [`OstreeImage::compile`].
    pub fn compile_compressed_raw<R: Rng + ?Sized>(
        &self,
        manifest: &mut Manifest,
        repos: &[RepoConfig],
        runner: &Runner,
        rng: &mut R,
    ) -> Result<PipelineId, CompileError> {
        let base = self.base_pipelines(manifest, repos, runner, rng, None)?;
        let xz = Xz::new(manifest, base.build, base.raw_image, Some(self.filename.clone()))?;
        Ok(manifest.add(xz)?)
    }

    fn base_pipelines<R: Rng + ?Sized>(
        &self,
        manifest: &mut Manifest,
        repos: &[RepoConfig],
        runner: &Runner,
        rng: &mut R,
        raw_filename: Option<String>,
    ) -> Result<BasePipelines, CompileError> {
        let build = Build::new(runner, repos).checkpointed();
        debug!("Build checkpoint key: {}", build.checkpoint_key());
        let build = manifest.add(build)?;

        let deployment = OstreeDeployment::new(manifest, build, self.deployment_options(), rng)?;
        let deployment = manifest.add(deployment)?;

        let raw_image =
            RawOstreeImage::new(manifest, build, &self.platform, deployment, raw_filename)?;
        let raw_image = manifest.add(raw_image)?;

        Ok(BasePipelines {
            build,
            deployment,
            raw_image,
        })
    }

    fn deployment_options(&self) -> DeploymentOptions {
        if !self.ignition && self.ignition_platform.is_some() {
            warn!("Ignition platform is set but ignition is disabled; ignoring it");
        }
        if self.partition_table.is_none() {
            warn!("No partition table given; the image will not be partitioned");
        }

        DeploymentOptions {
            commit: self.commit.clone(),
            os_name: self.os_name.clone(),
            ignition: self.ignition,
            ignition_platform: self.ignition_platform.clone(),
            platform: self.platform.clone(),
            partition_table: self.partition_table.clone(),
            remote: self.remote.clone(),
            kernel_options_append: self.kernel_options_append.clone(),
            keyboard: self.keyboard.clone(),
            locale: self.locale.clone(),
            users: self.users.clone(),
            groups: self.groups.clone(),
            sysroot_read_only: self.sysroot_read_only,
        }
    }
}

/// Check that `filename` names a single file
pub fn validate_filename(filename: &str) -> Result<(), SpecError> {
    let reason = if filename.is_empty() {
        Some("must not be empty")
    } else if filename == "." || filename == ".." {
        Some("must not be a directory reference")
    } else if filename.contains('/') {
        Some("must not contain '/'")
    } else if filename.contains('\0') {
        Some("must not contain NUL")
    } else if filename.len() > MAX_FILENAME_LEN {
        Some("must be at most 255 bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SpecError::InvalidFilename {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
