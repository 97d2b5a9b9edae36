//! Format and compression policy
//!
//! Decides which export-shaping and wrapping pipelines an ostree disk image
//! gets, and which of them receives the requested output filename. Both
//! tables are exhaustive matches over closed enums: an unknown compression
//! tag is rejected while parsing and can never reach the compiler.

use std::fmt;
use std::str::FromStr;

use crate::core::manifest::PipelineKind;
use crate::core::platform::ImageFormat;
use crate::error::{CompileError, SpecError};

/// Compression wrapped around the exported image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Export the shaped image as is
    #[default]
    None,
    /// Wrap the shaped image in an xz archive
    Xz,
}

impl Compression {
    /// Tags accepted in image requests, besides the empty string
    pub const SUPPORTED_TAGS: [&'static str; 1] = ["xz"];

    /// Tag as written in image requests
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Xz => "xz",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Xz => f.write_str("xz"),
        }
    }
}

impl FromStr for Compression {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "xz" => Ok(Self::Xz),
            other => Err(SpecError::UnsupportedCompression {
                value: other.to_string(),
                supported: Self::SUPPORTED_TAGS
                    .iter()
                    .map(|t| (*t).to_string())
                    .collect(),
            }),
        }
    }
}

/// Pipeline whose output is the shaped (pre-compression) disk image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    /// The raw image pipeline is exported directly
    Raw,
    /// A qcow2 conversion follows the raw image
    Qcow2,
}

/// Whether the compiler can shape an image into `format`
pub fn format_support(format: ImageFormat) -> Result<ExportShape, CompileError> {
    match format {
        ImageFormat::Raw => Ok(ExportShape::Raw),
        ImageFormat::Qcow2 => Ok(ExportShape::Qcow2),
        ImageFormat::Vhd | ImageFormat::Vmdk | ImageFormat::Gce => {
            Err(CompileError::FormatNotImplemented {
                format: format.to_string(),
            })
        }
        // Request validation rejects an unset format, so reaching this arm
        // means a caller built an image by hand and skipped validation.
        ImageFormat::Unset => panic!("invalid image format for image kind: format is unset"),
    }
}

/// Stage plan selected for one format/compression pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    shape: ExportShape,
    compression: Compression,
}

impl Topology {
    /// Select the topology for a format and compression
    ///
    /// # Panics
    ///
    /// Panics when `format` is [`ImageFormat::Unset`].
    pub fn select(format: ImageFormat, compression: Compression) -> Result<Self, CompileError> {
        Ok(Self {
            shape: format_support(format)?,
            compression,
        })
    }

    pub fn shape(&self) -> ExportShape {
        self.shape
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Whether the requested filename goes straight onto the shaped image
    ///
    /// With compression the archive takes the name instead, and the shaped
    /// image keeps its default.
    pub fn passes_filename_through(&self) -> bool {
        self.compression == Compression::None
    }

    /// Pipeline kinds in chain order, from the build root to the export
    pub fn stage_kinds(&self) -> Vec<PipelineKind> {
        let mut kinds = vec![
            PipelineKind::Build,
            PipelineKind::OstreeDeployment,
            PipelineKind::RawOstreeImage,
        ];
        if self.shape == ExportShape::Qcow2 {
            kinds.push(PipelineKind::Qcow2);
        }
        if self.compression == Compression::Xz {
            kinds.push(PipelineKind::Xz);
        }
        kinds
    }

    /// Kind of the pipeline that receives the requested filename
    pub fn named_kind(&self) -> PipelineKind {
        match (self.compression, self.shape) {
            (Compression::Xz, _) => PipelineKind::Xz,
            (Compression::None, ExportShape::Qcow2) => PipelineKind::Qcow2,
            (Compression::None, ExportShape::Raw) => PipelineKind::RawOstreeImage,
        }
    }
}
