//! xz compression pipeline

use serde_json::json;

use super::stage::{file_input, Stage};
use super::{Manifest, PipelineId, PipelineKind};
use crate::config::defaults::{XZ_FILENAME, XZ_PIPELINE};
use crate::error::ManifestError;

/// Compresses the file exported by another pipeline with xz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xz {
    name: String,
    build: PipelineId,
    build_name: String,
    source: PipelineId,
    source_name: String,
    source_file: String,
    filename: String,
}

impl Xz {
    /// Create an archive of the file `source` exports
    pub fn new(
        manifest: &Manifest,
        build: PipelineId,
        source: PipelineId,
        filename: Option<String>,
    ) -> Result<Self, ManifestError> {
        let build_name = manifest.expect_kind(build, PipelineKind::Build)?.name().to_string();
        let (source_name, source_file) = manifest.file_source(source)?;

        Ok(Self {
            name: XZ_PIPELINE.to_string(),
            build,
            build_name,
            source,
            source_name,
            source_file,
            filename: filename.unwrap_or_else(|| XZ_FILENAME.to_string()),
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

    pub fn source(&self) -> PipelineId {
        self.source
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub(super) fn stages(&self) -> Vec<Stage> {
        vec![Stage::new("org.osbuild.xz", json!({ "filename": self.filename }))
            .with_inputs(json!({ "file": file_input(&self.source_name, &self.source_file) }))]
    }
}
