//! qcow2 conversion pipeline

use serde_json::json;

use super::stage::{file_input, Stage};
use super::{Manifest, PipelineId, PipelineKind};
use crate::config::defaults::{QCOW2_FILENAME, QCOW2_PIPELINE};
use crate::error::ManifestError;

/// Settings for a qcow2 conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qcow2Options {
    /// Output filename; the default name is used when unset
    pub filename: Option<String>,
    /// qcow2 compatibility level
    pub compat: Option<String>,
}

/// Converts the file exported by another pipeline into qcow2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qcow2 {
    name: String,
    build: PipelineId,
    build_name: String,
    source: PipelineId,
    source_name: String,
    source_file: String,
    filename: String,
    compat: Option<String>,
}

impl Qcow2 {
    /// Create a conversion of the file `source` exports
    pub fn new(
        manifest: &Manifest,
        build: PipelineId,
        source: PipelineId,
        options: Qcow2Options,
    ) -> Result<Self, ManifestError> {
        let build_name = manifest.expect_kind(build, PipelineKind::Build)?.name().to_string();
        let (source_name, source_file) = manifest.file_source(source)?;

        Ok(Self {
            name: QCOW2_PIPELINE.to_string(),
            build,
            build_name,
            source,
            source_name,
            source_file,
            filename: options.filename.unwrap_or_else(|| QCOW2_FILENAME.to_string()),
            compat: options.compat,
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

    /// Name of the file read from the source pipeline
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn compat(&self) -> Option<&str> {
        self.compat.as_deref()
    }

    pub(super) fn stages(&self) -> Vec<Stage> {
        vec![Stage::new(
            "org.osbuild.qemu",
            json!({
                "filename": self.filename,
                "format": { "type": "qcow2", "compat": self.compat },
            }),
        )
        .with_inputs(json!({ "image": file_input(&self.source_name, &self.source_file) }))]
    }
}
