//! Check command implementation
//!
//! Implements `treecompose check` to validate an image request without
//! compiling it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::load_request;
use crate::cli::output::{self, status};
use crate::core::policy::Topology;

#[derive(Debug, Serialize)]
struct CheckReport {
    format: String,
    compression: String,
    pipelines: Vec<String>,
    exported: String,
    filename: String,
    partitioned: bool,
    users: usize,
    groups: usize,
}

/// Execute the check command
pub async fn execute(file: &Path) -> Result<()> {
    let request = load_request(file)?;
    let image = &request.image;

    tracing::info!("Checking image request: {}", file.display());

    let topology = Topology::select(image.platform.image_format(), image.compression)
        .with_context(|| format!("Cannot compile {}", file.display()))?;

    let report = CheckReport {
        format: image.platform.image_format().to_string(),
        compression: topology.compression().to_string(),
        pipelines: topology
            .stage_kinds()
            .into_iter()
            .map(|kind| kind.pipeline_name().to_string())
            .collect(),
        exported: topology.named_kind().pipeline_name().to_string(),
        filename: image.filename.clone(),
        partitioned: image.partition_table.is_some(),
        users: image.users.len(),
        groups: image.groups.len(),
    };

    if output::config().json {
        return output::print_json(&report);
    }

    output::print_status(status::SUCCESS, "Image request is valid");
    output::print_status(
        status::INFO,
        &format!(
            "Format: {}, compression: {}",
            report.format, report.compression
        ),
    );
    output::print_status(
        status::INFO,
        &format!("Pipelines: {}", report.pipelines.join(" -> ")),
    );
    output::print_status(
        status::INFO,
        &format!("Exports '{}' from the {} pipeline", report.filename, report.exported),
    );
    if !report.partitioned {
        output::print_status(status::WARNING, "No partition table; the image will not be partitioned");
    }
    Ok(())
}
