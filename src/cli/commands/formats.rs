//! Formats command implementation
//!
//! Implements `treecompose formats` to list the image formats platforms can
//! name and the compression tags image requests accept.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{self, status};
use crate::core::platform::ImageFormat;
use crate::core::policy::{format_support, Compression};

#[derive(Debug, Serialize)]
struct FormatEntry {
    name: &'static str,
    supported: bool,
}

#[derive(Debug, Serialize)]
struct FormatsReport {
    formats: Vec<FormatEntry>,
    compression: Vec<&'static str>,
}

/// Execute the formats command
pub async fn execute() -> Result<()> {
    let report = FormatsReport {
        formats: ImageFormat::ALL
            .iter()
            .map(|format| FormatEntry {
                name: format.as_str(),
                supported: format_support(*format).is_ok(),
            })
            .collect(),
        compression: Compression::SUPPORTED_TAGS.to_vec(),
    };

    if output::config().json {
        return output::print_json(&report);
    }

    output::print_status(status::INFO, "Image formats:");
    for entry in &report.formats {
        let prefix = if entry.supported {
            status::SUCCESS
        } else {
            status::ERROR
        };
        let note = if entry.supported { "" } else { " (not implemented)" };
        output::print_status(&format!("  {prefix}"), &format!("{}{note}", entry.name));
    }

    output::print_status(status::INFO, "Compression types:");
    output::print_status(&format!("  {}", status::SUCCESS), "none (empty)");
    for tag in &report.compression {
        output::print_status(&format!("  {}", status::SUCCESS), tag);
    }
    Ok(())
}
