//! Pipeline graph primitives
//!
//! A [`Manifest`] owns every pipeline created while compiling one image.
//! Pipelines refer to each other by [`PipelineId`]; each one is fully
//! configured when it is constructed and never changes after it has been
//! added. The finished manifest serializes to the JSON document handed to
//! the execution engine.
//!
//! # Submodules
//!
//! - [`build`] - Build environment pipeline
//! - [`deployment`] - OSTree deployment pipeline
//! - [`raw_image`] - Raw disk image pipeline
//! - [`qcow2`] - qcow2 conversion pipeline
//! - [`xz`] - xz compression pipeline
//! - [`stage`] - Stage records and input references

pub mod build;
pub mod deployment;
pub mod qcow2;
pub mod raw_image;
pub mod stage;
pub mod xz;

pub use build::Build;
pub use deployment::{DeploymentOptions, OstreeDeployment};
pub use qcow2::{Qcow2, Qcow2Options};
pub use raw_image::RawOstreeImage;
pub use stage::Stage;
pub use xz::Xz;

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

use crate::config::defaults::{
    BUILD_PIPELINE, DEPLOYMENT_PIPELINE, MANIFEST_VERSION, QCOW2_PIPELINE, RAW_IMAGE_PIPELINE,
    XZ_PIPELINE,
};
use crate::error::ManifestError;

/// Handle to a pipeline inside one [`Manifest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(usize);

/// Kind of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    Build,
    OstreeDeployment,
    RawOstreeImage,
    Qcow2,
    Xz,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::OstreeDeployment => "ostree-deployment",
            Self::RawOstreeImage => "raw-ostree-image",
            Self::Qcow2 => "qcow2",
            Self::Xz => "xz",
        };
        f.write_str(name)
    }
}

impl PipelineKind {
    /// Name a pipeline of this kind carries in the manifest
    pub fn pipeline_name(self) -> &'static str {
        match self {
            Self::Build => BUILD_PIPELINE,
            Self::OstreeDeployment => DEPLOYMENT_PIPELINE,
            Self::RawOstreeImage => RAW_IMAGE_PIPELINE,
            Self::Qcow2 => QCOW2_PIPELINE,
            Self::Xz => XZ_PIPELINE,
        }
    }
}

/// A pipeline node
#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
    Build(Build),
    OstreeDeployment(OstreeDeployment),
    RawOstreeImage(RawOstreeImage),
    Qcow2(Qcow2),
    Xz(Xz),
}

impl Pipeline {
    pub fn name(&self) -> &str {
        match self {
            Self::Build(p) => p.name(),
            Self::OstreeDeployment(p) => p.name(),
            Self::RawOstreeImage(p) => p.name(),
            Self::Qcow2(p) => p.name(),
            Self::Xz(p) => p.name(),
        }
    }

    pub fn kind(&self) -> PipelineKind {
        match self {
            Self::Build(_) => PipelineKind::Build,
            Self::OstreeDeployment(_) => PipelineKind::OstreeDeployment,
            Self::RawOstreeImage(_) => PipelineKind::RawOstreeImage,
            Self::Qcow2(_) => PipelineKind::Qcow2,
            Self::Xz(_) => PipelineKind::Xz,
        }
    }

    /// Pipeline whose output this one consumes
    ///
    /// The deployment's parent is the build root itself.
    pub fn parent(&self) -> Option<PipelineId> {
        match self {
            Self::Build(_) => None,
            Self::OstreeDeployment(p) => Some(p.build()),
            Self::RawOstreeImage(p) => Some(p.deployment()),
            Self::Qcow2(p) => Some(p.source()),
            Self::Xz(p) => Some(p.source()),
        }
    }

    /// Build root the pipeline's stages run in
    pub fn build(&self) -> Option<PipelineId> {
        match self {
            Self::Build(_) => None,
            Self::OstreeDeployment(p) => Some(p.build()),
            Self::RawOstreeImage(p) => Some(p.build()),
            Self::Qcow2(p) => Some(p.build()),
            Self::Xz(p) => Some(p.build()),
        }
    }

    /// Output filename, for pipelines that produce a single file
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Build(_) | Self::OstreeDeployment(_) => None,
            Self::RawOstreeImage(p) => Some(p.filename()),
            Self::Qcow2(p) => Some(p.filename()),
            Self::Xz(p) => Some(p.filename()),
        }
    }

    fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Build(_) | Self::OstreeDeployment(_) => None,
            Self::RawOstreeImage(_) => Some("application/octet-stream"),
            Self::Qcow2(_) => Some("application/x-qemu-disk"),
            Self::Xz(_) => Some("application/xz"),
        }
    }

    fn build_name(&self) -> Option<&str> {
        match self {
            Self::Build(_) => None,
            Self::OstreeDeployment(p) => Some(p.build_name()),
            Self::RawOstreeImage(p) => Some(p.build_name()),
            Self::Qcow2(p) => Some(p.build_name()),
            Self::Xz(p) => Some(p.build_name()),
        }
    }

    /// Stages in execution order
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            Self::Build(p) => p.stages(),
            Self::OstreeDeployment(p) => p.stages(),
            Self::RawOstreeImage(p) => p.stages(),
            Self::Qcow2(p) => p.stages(),
            Self::Xz(p) => p.stages(),
        }
    }

    pub fn as_build(&self) -> Option<&Build> {
        match self {
            Self::Build(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_deployment(&self) -> Option<&OstreeDeployment> {
        match self {
            Self::OstreeDeployment(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_raw_image(&self) -> Option<&RawOstreeImage> {
        match self {
            Self::RawOstreeImage(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_qcow2(&self) -> Option<&Qcow2> {
        match self {
            Self::Qcow2(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_xz(&self) -> Option<&Xz> {
        match self {
            Self::Xz(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Build> for Pipeline {
    fn from(p: Build) -> Self {
        Self::Build(p)
    }
}

impl From<OstreeDeployment> for Pipeline {
    fn from(p: OstreeDeployment) -> Self {
        Self::OstreeDeployment(p)
    }
}

impl From<RawOstreeImage> for Pipeline {
    fn from(p: RawOstreeImage) -> Self {
        Self::RawOstreeImage(p)
    }
}

impl From<Qcow2> for Pipeline {
    fn from(p: Qcow2) -> Self {
        Self::Qcow2(p)
    }
}

impl From<Xz> for Pipeline {
    fn from(p: Xz) -> Self {
        Self::Xz(p)
    }
}

/// Final named output of a compiled manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pipeline: String,
    filename: String,
    mime_type: String,
}

impl Artifact {
    /// Name of the pipeline that produces the file
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Ordered collection of pipelines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pipelines: Vec<Pipeline>,
    exports: Vec<PipelineId>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pipeline
    ///
    /// Pipeline names must be unique within a manifest.
    pub fn add(&mut self, pipeline: impl Into<Pipeline>) -> Result<PipelineId, ManifestError> {
        let pipeline = pipeline.into();
        if self.pipelines.iter().any(|p| p.name() == pipeline.name()) {
            return Err(ManifestError::DuplicatePipeline {
                name: pipeline.name().to_string(),
            });
        }

        tracing::debug!("Adding {} pipeline '{}'", pipeline.kind(), pipeline.name());
        self.pipelines.push(pipeline);
        Ok(PipelineId(self.pipelines.len() - 1))
    }

    pub fn get(&self, id: PipelineId) -> Result<&Pipeline, ManifestError> {
        self.pipelines
            .get(id.0)
            .ok_or(ManifestError::UnknownPipeline { index: id.0 })
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub(crate) fn expect_kind(
        &self,
        id: PipelineId,
        expected: PipelineKind,
    ) -> Result<&Pipeline, ManifestError> {
        let pipeline = self.get(id)?;
        if pipeline.kind() == expected {
            Ok(pipeline)
        } else {
            Err(ManifestError::WrongPipelineKind {
                name: pipeline.name().to_string(),
                expected: expected.to_string(),
                actual: pipeline.kind().to_string(),
            })
        }
    }

    pub(crate) fn deployment(&self, id: PipelineId) -> Result<&OstreeDeployment, ManifestError> {
        let pipeline = self.expect_kind(id, PipelineKind::OstreeDeployment)?;
        pipeline
            .as_deployment()
            .ok_or(ManifestError::UnknownPipeline { index: id.0 })
    }

    /// Name and output file of a file-producing pipeline
    pub(crate) fn file_source(&self, id: PipelineId) -> Result<(String, String), ManifestError> {
        let pipeline = self.get(id)?;
        match pipeline.filename() {
            Some(file) => Ok((pipeline.name().to_string(), file.to_string())),
            None => Err(ManifestError::WrongPipelineKind {
                name: pipeline.name().to_string(),
                expected: "file-producing".to_string(),
                actual: pipeline.kind().to_string(),
            }),
        }
    }

    /// Mark a pipeline's file as an output of the manifest
    pub fn export(&mut self, id: PipelineId) -> Result<Artifact, ManifestError> {
        let pipeline = self.get(id)?;
        let (Some(filename), Some(mime_type)) = (pipeline.filename(), pipeline.mime_type()) else {
            return Err(ManifestError::WrongPipelineKind {
                name: pipeline.name().to_string(),
                expected: "file-producing".to_string(),
                actual: pipeline.kind().to_string(),
            });
        };

        let artifact = Artifact {
            pipeline: pipeline.name().to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
        };
        if !self.exports.contains(&id) {
            self.exports.push(id);
        }
        Ok(artifact)
    }

    /// Pipelines marked as outputs
    pub fn exports(&self) -> &[PipelineId] {
        &self.exports
    }

    /// Pipelines from the build root down to `id`, following parent links
    pub fn chain(&self, id: PipelineId) -> Result<Vec<&Pipeline>, ManifestError> {
        let mut chain = Vec::new();
        let mut next = Some(id);
        while let Some(current) = next {
            let pipeline = self.get(current)?;
            chain.push(pipeline);
            next = pipeline.parent();
        }
        chain.reverse();
        Ok(chain)
    }

    /// Names of pipelines whose output the engine may cache between builds
    pub fn checkpoints(&self) -> Vec<&str> {
        self.pipelines
            .iter()
            .filter_map(Pipeline::as_build)
            .filter(|b| b.is_checkpoint())
            .map(Build::name)
            .collect()
    }

    /// Serialize the manifest for the execution engine
    pub fn to_json(&self) -> Result<Value, ManifestError> {
        let mut pipelines = Vec::with_capacity(self.pipelines.len());
        for pipeline in &self.pipelines {
            let stages = serde_json::to_value(pipeline.stages())
                .map_err(|e| ManifestError::Serialize(e.to_string()))?;
            let mut entry = Map::new();
            entry.insert("name".to_string(), json!(pipeline.name()));
            if let Some(build) = pipeline.build_name() {
                entry.insert("build".to_string(), json!(format!("name:{build}")));
            }
            if let Pipeline::Build(build) = pipeline {
                entry.insert("runner".to_string(), json!(build.runner().name()));
            }
            entry.insert("stages".to_string(), stages);
            pipelines.push(Value::Object(entry));
        }

        let mut commits = Map::new();
        for deployment in self.pipelines.iter().filter_map(Pipeline::as_deployment) {
            let commit = &deployment.options().commit;
            commits.insert(
                commit.checksum.clone(),
                stage::strip_nulls(json!({
                    "remote": {
                        "url": commit.url,
                        "contenturl": commit.content_url,
                        "secrets": commit.secrets.as_ref().map(|name| json!({ "name": name })),
                    }
                })),
            );
        }

        let mut document = json!({
            "version": MANIFEST_VERSION,
            "pipelines": pipelines,
        });
        if !commits.is_empty() {
            document["sources"] = json!({ "org.osbuild.ostree": { "items": commits } });
        }
        Ok(document)
    }

    /// Render the manifest as a JSON string
    pub fn render(&self, pretty: bool) -> Result<String, ManifestError> {
        let document = self.to_json()?;
        let rendered = if pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.map_err(|e| ManifestError::Serialize(e.to_string()))
    }
}
